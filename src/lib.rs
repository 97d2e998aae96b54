//! SchoolDesk application state store.
//!
//! Mirrors the students, teachers, invoices and expenses collections of a
//! hosted document store, writes changes through to it, tracks the signed-in
//! user and derives the dashboard figures.

pub mod config;
pub mod display_id;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod seed;
pub mod session;
pub mod stats;
pub mod store;

pub use error::AppError;
pub use mirror::{CollectionMirror, FeedState};
pub use store::{AppStore, CollectionKind, CreatedInvoice, StoreOptions};
