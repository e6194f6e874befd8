//! Pre-launch waitlist.
//!
//! # Data Flow
//! ```text
//! POST /api/waitlist        → handlers::join    → WaitlistStore::insert (idempotent)
//! GET  /api/admin/waitlist  → handlers::list    → WaitlistStore::list   (admin key)
//! GET  /api/health/db       → handlers::db_health → WaitlistStore::now
//! ```

pub mod handlers;
pub mod store;

pub use store::{MemoryWaitlist, PgWaitlist, StoreError, WaitlistEntry, WaitlistStore};
