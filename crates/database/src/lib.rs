//! # Shiftboard Database Crate
//!
//! The persistence layer of the scheduling backend: shifts, the employee
//! roster, the configuration document, and weekend-priority snapshots.
//!
//! ## Architectural Principles
//!
//! - **Swappable backend:** The HTTP layer talks to the `ScheduleStore` trait,
//!   never to a concrete pool. `DbRepository` is the PostgreSQL implementation;
//!   `MemoryStore` keeps everything in process memory for tests and demos.
//! - **Typed JSON columns:** JSONB columns are decoded into `core-types` structs,
//!   so a malformed document fails at the boundary.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a `PgPool`.
//!   Multi-statement writes run inside a single transaction.
//!
//! ## Public API
//!
//! - `connect`: builds the (lazy) database connection pool from the settings.
//! - `initialize_database`: applies migrations and seeds the default roster and configuration.
//! - `ScheduleStore`: the storage contract used by the web server.
//! - `DbRepository` / `MemoryStore`: the two implementations.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, initialize_database, run_migrations, seed_defaults};
pub use error::DbError;
pub use memory::MemoryStore;
pub use repository::DbRepository;
pub use store::ScheduleStore;
