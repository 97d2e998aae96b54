use std::{future::Future, sync::Arc, time::Duration};

use rust_decimal_macros::dec;
use schooldesk::{
    seed::{self, Notification},
    AppError, AppStore, CollectionKind, FeedState, StoreOptions,
};
use schooldesk_core::{
    AuthError, DataValue, Document, DocumentStore, ExpenseUpdate, InvoiceUpdate, NewExpense,
    NewInvoice, NewStudent, NewTeacher, StoreError, StudentUpdate, TeacherUpdate,
};
use schooldesk_memory::{InMemoryAuthProvider, InMemoryDocumentStore};
use time::{Date, Month};

async fn setup() -> (Arc<InMemoryDocumentStore>, Arc<InMemoryAuthProvider>, AppStore) {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let auth = Arc::new(InMemoryAuthProvider::new());
    let store = AppStore::open(documents.clone(), auth.clone(), StoreOptions::default()).await;
    (documents, auth, store)
}

async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("Timed out waiting for the store")
}

fn new_student(name: &str, class: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        class: class.to_string(),
        parent: "Parent".to_string(),
        phone: "9845000000".to_string(),
        status: "Active".to_string(),
    }
}

fn new_invoice(student: &str, class: &str) -> NewInvoice {
    NewInvoice {
        student: student.to_string(),
        amount: dec!(5000),
        paid_amount: dec!(2000),
        date: Date::from_calendar_date(2024, Month::June, 1).ok(),
        status: "Partial".to_string(),
        invoice_type: "Tuition Fee".to_string(),
        student_class: class.to_string(),
        ..Default::default()
    }
}

fn expect_remote_write(result: Result<(), AppError>, collection: &str, operation: &str) {
    match result {
        Err(AppError::RemoteWrite {
            collection: c,
            operation: o,
            ..
        }) => {
            assert_eq!(c, collection);
            assert_eq!(o, operation);
        }
        other => panic!("Expected RemoteWrite, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (_, _, store) = setup().await;

    let state = within(store.session().ready()).await;
    assert!(!state.loading);
    assert!(!store.is_loading());
    assert_eq!(store.current_user(), None);

    let session = store.register("office@school.test", "secret1").await.unwrap();
    let user = within(store.session().wait_signed_in(true)).await;
    assert_eq!(user.map(|u| u.uid), Some(session.uid.clone()));

    store.logout().await.unwrap();
    assert_eq!(within(store.session().wait_signed_in(false)).await, None);

    store.login("office@school.test", "secret1").await.unwrap();
    let user = within(store.session().wait_signed_in(true)).await;
    assert_eq!(user.map(|u| u.email.to_string()), Some("office@school.test".to_string()));
}

#[tokio::test]
async fn test_login_failure_is_surfaced() {
    let (_, _, store) = setup().await;
    store.register("office@school.test", "secret1").await.unwrap();
    store.logout().await.unwrap();

    match store.login("office@school.test", "wrong-password").await {
        Err(AppError::Auth(AuthError::InvalidCredentials)) => {}
        other => panic!("Expected invalid credentials, got {:?}", other),
    }
    match store.register("office@school.test", "another1").await {
        Err(AppError::Auth(AuthError::EmailAlreadyInUse(_))) => {}
        other => panic!("Expected duplicate account, got {:?}", other),
    }
}

#[tokio::test]
async fn test_student_crud_echoes_into_mirror() {
    let (_, _, store) = setup().await;

    let id = store.add_student(new_student("Asha Rao", "UKG")).await.unwrap();
    let students = within(store.students().wait_for(|s| s.len() == 1)).await;
    assert_eq!(students[0].id, id.to_string());
    assert_eq!(students[0].name, "Asha Rao");
    assert!(students[0].created_at.is_some());

    store
        .update_student(
            &id,
            StudentUpdate {
                status: Some("Inactive".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let students = within(store.students().wait_for(|s| s.iter().any(|st| st.status == "Inactive"))).await;
    assert_eq!(students[0].name, "Asha Rao");

    store.delete_student(&id).await.unwrap();
    within(store.students().wait_for(|s| s.is_empty())).await;
    assert!(store.feed_state(CollectionKind::Students).is_live());
}

#[tokio::test]
async fn test_delete_student_without_id_never_reaches_backend() {
    let (documents, _, store) = setup().await;
    store.add_student(new_student("Asha Rao", "UKG")).await.unwrap();
    // Offline: any remote call would come back as a RemoteWrite error
    documents.set_offline(true);

    for id in ["", "   "] {
        match store.delete_student(id).await {
            Err(e) => assert!(e.is_validation(), "unexpected error {:?}", e),
            Ok(()) => panic!("Expected validation error"),
        }
    }
    assert_eq!(documents.documents("students").len(), 1);
}

#[tokio::test]
async fn test_remote_failures_surface_for_every_collection() {
    let (documents, _, store) = setup().await;
    documents.set_offline(true);

    expect_remote_write(store.delete_student("missing").await, "students", "delete");
    expect_remote_write(
        store.add_teacher(NewTeacher::default()).await.map(|_| ()),
        "teachers",
        "add",
    );
    expect_remote_write(
        store.update_teacher("t1", TeacherUpdate::default()).await,
        "teachers",
        "update",
    );
    expect_remote_write(
        store.add_expense(NewExpense::default()).await.map(|_| ()),
        "expenses",
        "add",
    );
    expect_remote_write(
        store.update_expense("e1", ExpenseUpdate::default()).await,
        "expenses",
        "update",
    );
    expect_remote_write(store.delete_expense("e1").await, "expenses", "delete");
    expect_remote_write(
        store.add_invoice(new_invoice("Asha", "UKG")).await.map(|_| ()),
        "invoices",
        "add",
    );
}

#[tokio::test]
async fn test_missing_document_is_a_remote_write_error() {
    let (_, _, store) = setup().await;
    match store.delete_teacher("no-such-teacher").await {
        Err(AppError::RemoteWrite {
            source: StoreError::NotFound { .. },
            ..
        }) => {}
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invoice_ids_are_sequential_before_echo() {
    let (_, _, store) = setup().await;

    let first = store.add_invoice(new_invoice("Aarav", "Pre-KG")).await.unwrap();
    // No waiting for the snapshot: the mirror may still be empty here
    let second = store.add_invoice(new_invoice("Ishaan", "PKG")).await.unwrap();
    let other = store.add_invoice(new_invoice("Diya", "LKG")).await.unwrap();

    assert_eq!(first.display_id, "APSPR001");
    assert_eq!(second.display_id, "APSPR002");
    assert_eq!(other.display_id, "APSLK001");

    let invoices = within(store.invoices().wait_for(|i| i.len() == 3)).await;
    assert_eq!(invoices[1].display_id, "APSPR002");
    assert_eq!(store.next_invoice_id("Pre-KG").await.unwrap(), "APSPR003");
}

#[tokio::test]
async fn test_concurrent_invoice_creation_never_collides() {
    let (_, _, store) = setup().await;

    let (a, b, c) = tokio::join!(
        store.add_invoice(new_invoice("A", "UKG")),
        store.add_invoice(new_invoice("B", "UKG")),
        store.add_invoice(new_invoice("C", "UKG")),
    );
    let mut ids = vec![a.unwrap().display_id, b.unwrap().display_id, c.unwrap().display_id];
    ids.sort();
    assert_eq!(ids, vec!["APSUK001", "APSUK002", "APSUK003"]);
}

#[tokio::test]
async fn test_supplied_invoice_id_is_kept_and_continued() {
    let (_, _, store) = setup().await;
    let created = store
        .add_invoice(NewInvoice {
            display_id: Some("APSC1041".to_string()),
            ..new_invoice("Ananya", "Class 1")
        })
        .await
        .unwrap();
    assert_eq!(created.display_id, "APSC1041");

    let next = store.add_invoice(new_invoice("Rohan", "Class 1")).await.unwrap();
    assert_eq!(next.display_id, "APSC1042");
}

#[tokio::test]
async fn test_failed_invoice_write_does_not_consume_a_number() {
    let (documents, _, store) = setup().await;
    documents.set_offline(true);
    assert!(store.add_invoice(new_invoice("Asha", "UKG")).await.is_err());
    documents.set_offline(false);

    let created = store.add_invoice(new_invoice("Asha", "UKG")).await.unwrap();
    assert_eq!(created.display_id, "APSUK001");
}

#[tokio::test]
async fn test_update_assigns_missing_invoice_id() {
    let (documents, _, store) = setup().await;

    // Legacy invoice written without a display id
    let mut legacy = Document::new();
    legacy.insert(Arc::from("student"), DataValue::from("Meera"));
    legacy.insert(Arc::from("studentClass"), DataValue::from("LKG"));
    legacy.insert(Arc::from("paidAmount"), DataValue::from("abc"));
    let id = documents.insert("invoices", legacy).await.unwrap();
    within(store.invoices().wait_for(|i| i.len() == 1)).await;

    store
        .update_invoice(
            &id,
            InvoiceUpdate {
                status: Some("Paid".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let invoices = within(store.invoices().wait_for(|i| !i[0].display_id.is_empty())).await;
    // The legacy invoice itself counts toward LKG
    assert_eq!(invoices[0].display_id, "APSLK002");
    assert_eq!(invoices[0].status, "Paid");
}

#[tokio::test]
async fn test_update_keeps_existing_invoice_id() {
    let (_, _, store) = setup().await;
    let created = store.add_invoice(new_invoice("Kabir", "Class 2")).await.unwrap();
    within(store.invoices().wait_for(|i| i.len() == 1)).await;

    store
        .update_invoice(
            &created.id,
            InvoiceUpdate {
                paid_amount: Some(dec!(5000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let invoices = within(store.invoices().wait_for(|i| i[0].paid_amount == dec!(5000))).await;
    assert_eq!(invoices[0].display_id, "APSC2001");
}

fn stored_display_id(documents: &InMemoryDocumentStore, id: &str) -> Option<DataValue> {
    documents
        .documents("invoices")
        .into_iter()
        .find(|(doc_id, _)| doc_id.as_ref() == id)
        .and_then(|(_, document)| document.get("invoiceId").cloned())
}

#[tokio::test]
async fn test_update_before_echo_keeps_invoice_id() {
    let (documents, _, store) = setup().await;
    let created = store.add_invoice(new_invoice("Aarav", "Pre-KG")).await.unwrap();

    // No waiting: the mirror may not hold the invoice yet
    store
        .update_invoice(
            &created.id,
            InvoiceUpdate {
                status: Some("Paid".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stored_display_id(&documents, &created.id), Some(DataValue::from("APSPR001")));

    // A blank id in the update does not clear the stored one either
    store
        .update_invoice(
            &created.id,
            InvoiceUpdate {
                display_id: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stored_display_id(&documents, &created.id), Some(DataValue::from("APSPR001")));

    within(store.invoices().wait_for(|i| i.len() == 1 && i[0].status == "Paid")).await;
    let invoice = store.invoices().find(&created.id).unwrap();
    assert_eq!(invoice.display_id, created.display_id);
}

#[tokio::test]
async fn test_update_changing_class_assigns_id_for_new_class() {
    let (documents, _, store) = setup().await;
    store.add_invoice(new_invoice("Vihaan", "UKG")).await.unwrap();

    let mut legacy = Document::new();
    legacy.insert(Arc::from("student"), DataValue::from("Meera"));
    legacy.insert(Arc::from("studentClass"), DataValue::from("LKG"));
    let id = documents.insert("invoices", legacy).await.unwrap();

    store
        .update_invoice(
            &id,
            InvoiceUpdate {
                student_class: Some("UKG".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stored_display_id(&documents, &id), Some(DataValue::from("APSUK002")));

    let next = store.add_invoice(new_invoice("Kabir", "UKG")).await.unwrap();
    assert_eq!(next.display_id, "APSUK003");
}

#[tokio::test]
async fn test_update_without_any_class_uses_fallback_code() {
    let (documents, _, store) = setup().await;
    let mut legacy = Document::new();
    legacy.insert(Arc::from("student"), DataValue::from("Meera"));
    let id = documents.insert("invoices", legacy).await.unwrap();

    store
        .update_invoice(
            &id,
            InvoiceUpdate {
                status: Some("Paid".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stored_display_id(&documents, &id), Some(DataValue::from("APSINV001")));
}

#[tokio::test]
async fn test_exhausted_sequence_is_a_validation_error() {
    let (documents, _, store) = setup().await;
    store
        .add_invoice(NewInvoice {
            display_id: Some("APSPR4294967295".to_string()),
            ..new_invoice("Aarav", "Pre-KG")
        })
        .await
        .unwrap();

    let error = store.add_invoice(new_invoice("Ishaan", "Pre-KG")).await.unwrap_err();
    assert!(error.is_validation(), "unexpected error {:?}", error);
    assert!(store.next_invoice_id("Pre-KG").await.unwrap_err().is_validation());
    assert_eq!(documents.documents("invoices").len(), 1);

    // Other classes keep working
    let other = store.add_invoice(new_invoice("Diya", "LKG")).await.unwrap();
    assert_eq!(other.display_id, "APSLK001");
}

#[tokio::test]
async fn test_invoice_update_and_delete_require_id() {
    let (_, _, store) = setup().await;
    assert!(store.update_invoice("", InvoiceUpdate::default()).await.unwrap_err().is_validation());
    assert!(store.delete_invoice(" ").await.unwrap_err().is_validation());
    assert!(store.update_student("", StudentUpdate::default()).await.unwrap_err().is_validation());
    assert!(store.delete_teacher("").await.unwrap_err().is_validation());
    assert!(store.delete_expense("").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_feed_error_keeps_stale_records() {
    let (documents, _, store) = setup().await;
    store.add_student(new_student("Asha Rao", "UKG")).await.unwrap();
    store.add_teacher(NewTeacher::default()).await.unwrap();
    within(store.students().wait_for(|s| s.len() == 1)).await;
    within(store.teachers().wait_for(|t| t.len() == 1)).await;

    documents.break_feeds("students", "permission denied");
    let state = within(store.students().wait_for_feed(FeedState::is_stale)).await;
    match state {
        FeedState::Stale(AppError::Subscription { collection, .. }) => assert_eq!(collection, "students"),
        other => panic!("Expected stale students feed, got {:?}", other),
    }

    assert_eq!(store.students().len(), 1);
    assert!(store.feed_state(CollectionKind::Teachers).is_live());
    assert!(store.feed_state(CollectionKind::Invoices).is_live());

    // The next snapshot brings the feed back
    store.add_student(new_student("Ravi", "LKG")).await.unwrap();
    within(store.students().wait_for(|s| s.len() == 2)).await;
    assert!(store.feed_state(CollectionKind::Students).is_live());
}

#[tokio::test]
async fn test_seed_and_dashboard() {
    let (_, _, store) = setup().await;

    let result = seed::seed_database(&store).await;
    let notification = Notification::from_seed(&result);
    assert!(notification.is_success(), "{}", notification);
    let summary = result.unwrap();
    assert_eq!(summary.students, 6);
    assert_eq!(summary.invoices, 7);

    within(store.students().wait_for(|s| s.len() == summary.students)).await;
    within(store.teachers().wait_for(|t| t.len() == summary.teachers)).await;
    within(store.invoices().wait_for(|i| i.len() == summary.invoices)).await;
    within(store.expenses().wait_for(|e| e.len() == summary.expenses)).await;

    let codes: Vec<String> = store.invoices().records().iter().map(|i| i.display_id.clone()).collect();
    assert_eq!(
        codes,
        ["APSPR001", "APSLK001", "APSUK001", "APSC1001", "APSC2001", "APSLK002", "APSLK003"]
    );

    let stats = store.stats();
    assert_eq!(stats.total_students, 6);
    assert_eq!(stats.total_teachers, 3);
    assert_eq!(stats.total_fees_collected, dec!(28500));
    assert_eq!(stats.total_expenses, dec!(17700));
    assert_eq!(stats.monthly_fees.len(), 6);
    assert_eq!(stats.monthly_fees[0].label, "Feb 2024");
    assert_eq!(stats.monthly_fees[5].label, "Jul 2024");
    assert_eq!(stats.recent_admissions.len(), 5);
    assert!(stats.recent_admissions[0].created_at >= stats.recent_admissions[4].created_at);
}

#[tokio::test]
async fn test_seeding_twice_duplicates_records() {
    let (_, _, store) = setup().await;
    seed::seed_database(&store).await.unwrap();
    let summary = seed::seed_database(&store).await.unwrap();

    let invoices = within(store.invoices().wait_for(|i| i.len() == summary.invoices * 2)).await;
    let lkg = invoices.iter().filter(|i| i.display_id.starts_with("APSLK")).count();
    assert_eq!(lkg, 6);
    assert_eq!(invoices.last().map(|i| i.display_id.as_str()), Some("APSLK006"));
    within(store.students().wait_for(|s| s.len() == 12)).await;
}

#[tokio::test]
async fn test_seed_failure_notification() {
    let (documents, _, store) = setup().await;
    documents.set_offline(true);
    let result = seed::seed_database(&store).await;
    match Notification::from_seed(&result) {
        Notification::Error(message) => assert!(message.contains("students")),
        other => panic!("Expected error notification, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_releases_subscriptions() {
    let (documents, _, mut store) = setup().await;
    assert_eq!(documents.subscriber_count("students"), 1);

    store.shutdown();
    within(async {
        while CollectionKind::ALL
            .iter()
            .any(|kind| documents.subscriber_count(kind.name()) > 0)
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}
