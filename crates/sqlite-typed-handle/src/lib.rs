//! # sqlite-typed-handle
//!
//! Exclusive-ownership wrappers around the raw handles of the SQLite C API.
//!
//! Every `unsafe` call into the engine lives in this crate. The typed layer
//! built on top of it (`sqlite-typed`) contains no FFI of its own.
//!
//! ## Core Types
//!
//! - **[`DbHandle`]**: owns one `sqlite3` connection; closes it exactly once
//! - **[`StmtHandle`]**: owns one `sqlite3_stmt`, borrowed from its [`DbHandle`];
//!   finalizes it exactly once
//! - **[`NativeValue`]**: a column's engine-native `sqlite3_value`, valid until the next step
//! - **[`OpenConfig`]**: flags and busy timeout applied on open
//! - **[`Error`]**: engine status codes and messages, carried verbatim
//!
//! ## Usage
//!
//! ```
//! use sqlite_typed_handle::{DbHandle, OpenConfig, Step, StmtHandle};
//!
//! # fn main() -> sqlite_typed_handle::Result<()> {
//! let db = DbHandle::open(":memory:", &OpenConfig::default())?;
//!
//! let mut stmt = StmtHandle::prepare(&db, "SELECT ? + 1")?;
//! stmt.bind_int64(1, 41)?;
//! assert_eq!(stmt.step()?, Step::Row);
//! assert_eq!(stmt.column_int64(0), 42);
//! assert_eq!(stmt.step()?, Step::Done);
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! - A failed open releases whatever partial handle the engine produced before
//!   the error is returned
//! - Close and finalize are idempotent and run on drop
//! - A statement borrows its connection, so the connection cannot be closed or
//!   dropped while a statement is alive
//!
mod config;
mod database;
mod error;
mod statement;
mod value;

// Re-export public types
pub use config::OpenConfig;
pub use database::DbHandle;
pub use error::Error;
pub use statement::{Step, StmtHandle};
pub use value::{NativeValue, OwnedNativeValue, StorageClass};

/// Engine status codes, re-exported for callers inspecting [`Error::code`].
pub mod status {
   pub use libsqlite3_sys::{
      SQLITE_BUSY, SQLITE_CANTOPEN, SQLITE_CONSTRAINT, SQLITE_DONE, SQLITE_ERROR, SQLITE_LOCKED, SQLITE_MISMATCH,
      SQLITE_MISUSE, SQLITE_OK, SQLITE_RANGE, SQLITE_READONLY, SQLITE_ROW, SQLITE_TOOBIG,
   };
}

/// Version number of the linked engine, e.g. `3046000` for 3.46.0.
pub fn engine_version() -> i32 {
   unsafe { libsqlite3_sys::sqlite3_libversion_number() }
}

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
