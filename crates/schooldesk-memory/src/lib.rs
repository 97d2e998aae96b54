//! In-process backend for SchoolDesk.
//!
//! `InMemoryDocumentStore` and `InMemoryAuthProvider` stand in for the hosted
//! document database and authentication service. Both can be switched into a
//! failing mode so callers can exercise their error paths.

mod auth;
mod documents;

pub use auth::InMemoryAuthProvider;
pub use documents::InMemoryDocumentStore;
