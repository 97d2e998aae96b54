use std::sync::Arc;

use clap::Parser;
use schooldesk::{
    config::{CliArgs, Command, Config},
    logging,
    seed::{self, Notification, SeedSummary},
    AppError, AppStore,
};
use schooldesk_memory::{InMemoryAuthProvider, InMemoryDocumentStore};

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    logging::init(&config.logging);

    let documents = Arc::new(InMemoryDocumentStore::new());
    let auth = Arc::new(InMemoryAuthProvider::new());
    let mut store = AppStore::open(documents, auth, config.store_options()).await;

    let outcome = run(&cli, &config, &store).await;
    store.shutdown();

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &CliArgs, config: &Config, store: &AppStore) -> Result<(), AppError> {
    store.session().ready().await;
    store
        .register(&config.seed.admin_email, &config.seed.admin_password)
        .await?;
    store.session().wait_signed_in(true).await;

    match &cli.command {
        Command::Seed => {
            let result = seed::seed_database(store).await;
            println!("{}", Notification::from_seed(&result));
            result?;
        }
        Command::Dashboard => {
            let summary = seed::seed_database(store).await?;
            wait_for_echo(store, &summary).await;
            let stats = store.stats();
            if cli.json {
                match serde_json::to_string_pretty(&stats) {
                    Ok(json) => println!("{}", json),
                    Err(e) => tracing::error!(error = %e, "Could not serialize dashboard"),
                }
            } else {
                println!("{}", stats);
            }
        }
        Command::NextId { class } => {
            let summary = seed::seed_database(store).await?;
            wait_for_echo(store, &summary).await;
            println!("{}", store.next_invoice_id(class).await?);
        }
    }

    Ok(())
}

/// Writes land in the mirrors only once the backend echoes them.
async fn wait_for_echo(store: &AppStore, summary: &SeedSummary) {
    store.students().wait_for(|r| r.len() >= summary.students).await;
    store.teachers().wait_for(|r| r.len() >= summary.teachers).await;
    store.invoices().wait_for(|r| r.len() >= summary.invoices).await;
    store.expenses().wait_for(|r| r.len() >= summary.expenses).await;
}
