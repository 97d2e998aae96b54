//! The application state store: session, mirrored collections, write-through
//! CRUD and derived dashboard figures.

use std::{fmt::Display, sync::Arc};

use time::OffsetDateTime;
use tokio::sync::Mutex;

use schooldesk_core::{
    AuthProvider, Document, DocumentId, DocumentStore, Expense, ExpenseUpdate, Invoice,
    InvoiceUpdate, NewExpense, NewInvoice, NewStudent, NewTeacher, Record, Session, StoreError,
    Student, StudentUpdate, Teacher, TeacherUpdate,
};

use crate::{
    display_id::{SequenceAllocator, DEFAULT_ORGANIZATION_CODE},
    error::AppError,
    mirror::{CollectionMirror, FeedState},
    session::SessionManager,
    stats::{DashboardStats, StatsOptions},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub organization_code: String,
    pub stats: StatsOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            organization_code: DEFAULT_ORGANIZATION_CODE.to_string(),
            stats: StatsOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Students,
    Teachers,
    Invoices,
    Expenses,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Students,
        CollectionKind::Teachers,
        CollectionKind::Invoices,
        CollectionKind::Expenses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Students => Student::COLLECTION,
            CollectionKind::Teachers => Teacher::COLLECTION,
            CollectionKind::Invoices => Invoice::COLLECTION,
            CollectionKind::Expenses => Expense::COLLECTION,
        }
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of creating an invoice: the backend id and the display code it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedInvoice {
    pub id: DocumentId,
    pub display_id: String,
}

pub struct AppStore {
    documents: Arc<dyn DocumentStore>,
    session: SessionManager,
    students: CollectionMirror<Student>,
    teachers: CollectionMirror<Teacher>,
    invoices: CollectionMirror<Invoice>,
    expenses: CollectionMirror<Expense>,
    sequences: Mutex<SequenceAllocator>,
    options: StoreOptions,
}

fn require_id<'a>(collection: &str, id: &'a str) -> Result<&'a str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        tracing::warn!(collection, "Rejected write without an id");
        return Err(AppError::missing_id(collection));
    }
    Ok(id)
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

impl AppStore {
    /// Subscribes to the session and to all four collections. Subscription
    /// failures leave the affected feed stale rather than failing the store.
    pub async fn open(
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        options: StoreOptions,
    ) -> Self {
        let session = SessionManager::start(auth);
        let students = CollectionMirror::open(documents.as_ref()).await;
        let teachers = CollectionMirror::open(documents.as_ref()).await;
        let invoices = CollectionMirror::open(documents.as_ref()).await;
        let expenses = CollectionMirror::open(documents.as_ref()).await;

        tracing::info!(organization = %options.organization_code, "Store opened");
        Self {
            documents,
            session,
            students,
            teachers,
            invoices,
            expenses,
            sequences: Mutex::new(SequenceAllocator::new(options.organization_code.clone())),
            options,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn current_user(&self) -> Option<Session> {
        self.session.current_user()
    }

    /// True until the auth provider has reported the session for the first time.
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.session.login(email, password).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.session.register(email, password).await
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.logout().await
    }

    pub fn students(&self) -> &CollectionMirror<Student> {
        &self.students
    }

    pub fn teachers(&self) -> &CollectionMirror<Teacher> {
        &self.teachers
    }

    pub fn invoices(&self) -> &CollectionMirror<Invoice> {
        &self.invoices
    }

    pub fn expenses(&self) -> &CollectionMirror<Expense> {
        &self.expenses
    }

    pub fn feed_state(&self, kind: CollectionKind) -> FeedState {
        match kind {
            CollectionKind::Students => self.students.feed_state(),
            CollectionKind::Teachers => self.teachers.feed_state(),
            CollectionKind::Invoices => self.invoices.feed_state(),
            CollectionKind::Expenses => self.expenses.feed_state(),
        }
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(
            &self.students.records(),
            &self.teachers.records(),
            &self.invoices.records(),
            &self.expenses.records(),
            &self.options.stats,
        )
    }

    /// Display id the next invoice for `class_name` would receive.
    pub async fn next_invoice_id(&self, class_name: &str) -> Result<String, AppError> {
        let sequences = self.sequences.lock().await;
        sequences.peek(class_name, &self.invoices.records())
    }

    /// Stops every subscription. The mirrors keep their last records.
    pub fn shutdown(&mut self) {
        self.session.close();
        self.students.close();
        self.teachers.close();
        self.invoices.close();
        self.expenses.close();
        tracing::info!("Store closed");
    }

    fn record_write<T>(
        &self,
        collection: &'static str,
        operation: &'static str,
        result: Result<T, StoreError>,
    ) -> Result<T, AppError> {
        metrics::increment_counter!(
            "schooldesk_remote_writes_total",
            "collection" => collection,
            "operation" => operation
        );
        result.map_err(|source| {
            metrics::increment_counter!(
                "schooldesk_remote_write_failures_total",
                "collection" => collection,
                "operation" => operation
            );
            let error = AppError::RemoteWrite {
                collection,
                operation,
                source,
            };
            tracing::error!(%error, "Remote write failed");
            error
        })
    }

    async fn insert(&self, collection: &'static str, document: Document) -> Result<DocumentId, AppError> {
        let result = self.documents.insert(collection, document).await;
        let id = self.record_write(collection, "add", result)?;
        tracing::debug!(collection, id = %id, "Added");
        Ok(id)
    }

    async fn update(&self, collection: &'static str, id: &str, fields: Document) -> Result<(), AppError> {
        let id = require_id(collection, id)?;
        let result = self.documents.update(collection, id, fields).await;
        self.record_write(collection, "update", result)?;
        tracing::debug!(collection, id, "Updated");
        Ok(())
    }

    async fn remove(&self, collection: &'static str, id: &str) -> Result<(), AppError> {
        let id = require_id(collection, id)?;
        let result = self.documents.remove(collection, id).await;
        self.record_write(collection, "delete", result)?;
        tracing::debug!(collection, id, "Deleted");
        Ok(())
    }

    // Students

    pub async fn add_student(&self, student: NewStudent) -> Result<DocumentId, AppError> {
        let document = student.to_document(OffsetDateTime::now_utc());
        self.insert(Student::COLLECTION, document).await
    }

    pub async fn update_student(&self, id: &str, update: StudentUpdate) -> Result<(), AppError> {
        self.update(Student::COLLECTION, id, update.to_document()).await
    }

    pub async fn delete_student(&self, id: &str) -> Result<(), AppError> {
        self.remove(Student::COLLECTION, id).await
    }

    // Teachers

    pub async fn add_teacher(&self, teacher: NewTeacher) -> Result<DocumentId, AppError> {
        let document = teacher.to_document(OffsetDateTime::now_utc());
        self.insert(Teacher::COLLECTION, document).await
    }

    pub async fn update_teacher(&self, id: &str, update: TeacherUpdate) -> Result<(), AppError> {
        self.update(Teacher::COLLECTION, id, update.to_document()).await
    }

    pub async fn delete_teacher(&self, id: &str) -> Result<(), AppError> {
        self.remove(Teacher::COLLECTION, id).await
    }

    // Invoices

    /// Creates an invoice, assigning the next display id for its class when
    /// none is supplied. Invoice writes are serialized so two creations for
    /// the same class never receive the same code.
    pub async fn add_invoice(&self, invoice: NewInvoice) -> Result<CreatedInvoice, AppError> {
        let mut sequences = self.sequences.lock().await;
        let display_id = match invoice.display_id.as_deref().and_then(non_empty) {
            Some(supplied) => supplied.to_string(),
            None => sequences.peek(&invoice.student_class, &self.invoices.records())?,
        };

        let document = invoice.to_document(&display_id, OffsetDateTime::now_utc());
        let id = self.insert(Invoice::COLLECTION, document).await?;
        sequences.observe(&invoice.student_class, &display_id);

        Ok(CreatedInvoice { id, display_id })
    }

    /// Applies a partial update. When neither the update nor the stored
    /// invoice carries a display id, one is generated for the invoice's class.
    ///
    /// The stored invoice is read from the backend: the mirror may not have
    /// seen it yet. An invoice with no class anywhere gets an `INV` code.
    pub async fn update_invoice(&self, id: &str, mut update: InvoiceUpdate) -> Result<(), AppError> {
        let id = require_id(Invoice::COLLECTION, id)?;

        let mut sequences = self.sequences.lock().await;
        let stored = match self.documents.get(Invoice::COLLECTION, id).await {
            Ok(document) => document.map(|document| Invoice::from_document(id, &document)),
            Err(source) => return self.record_write(Invoice::COLLECTION, "update", Err(source)),
        };

        // A blank id in the update must not clear the stored one
        let supplied = update.display_id().map(str::to_string);
        update.display_id = supplied;

        let class_name = update
            .student_class
            .as_deref()
            .and_then(non_empty)
            .or_else(|| {
                stored
                    .as_ref()
                    .and_then(|i| i.student_class.as_deref())
                    .and_then(non_empty)
            })
            .unwrap_or_default()
            .to_string();
        let missing_code = update.display_id.is_none()
            && stored
                .as_ref()
                .is_some_and(|i| non_empty(&i.display_id).is_none());

        if missing_code {
            let generated = sequences.peek(&class_name, &self.invoices.records())?;
            tracing::debug!(id, display_id = %generated, "Assigning missing display id");
            update.display_id = Some(generated);
        }

        self.update(Invoice::COLLECTION, id, update.to_document()).await?;
        if let Some(display_id) = update.display_id.as_deref() {
            sequences.observe(&class_name, display_id);
        }
        Ok(())
    }

    pub async fn delete_invoice(&self, id: &str) -> Result<(), AppError> {
        self.remove(Invoice::COLLECTION, id).await
    }

    // Expenses

    pub async fn add_expense(&self, expense: NewExpense) -> Result<DocumentId, AppError> {
        self.insert(Expense::COLLECTION, expense.to_document()).await
    }

    pub async fn update_expense(&self, id: &str, update: ExpenseUpdate) -> Result<(), AppError> {
        self.update(Expense::COLLECTION, id, update.to_document()).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), AppError> {
        self.remove(Expense::COLLECTION, id).await
    }
}
