pub mod backend;
pub mod client;
pub mod models;
pub mod query_builder;
pub mod session;

pub use backend::{Backend, PgBackend};
pub use client::{DatabaseClient, DatabaseError};
pub use session::{RequestClaims, SessionClient};
