//! # sqlite-typed
//!
//! A typed, ownership-safe layer over an embedded SQLite database.
//!
//! Values are bound to `?` placeholders and read back out of result rows
//! according to their Rust type, with no per-type boilerplate at the call site.
//! Handles are released exactly once on every exit path, and every engine
//! failure surfaces as a [`Result`] carrying the engine's code and message.
//!
//! ## Core Types
//!
//! - **[`Database`]**: an open database; prepares, executes and batches SQL
//! - **[`Statement`]**: a prepared statement borrowed from its [`Database`]
//! - **[`Bind`] / [`Params`]**: types and tuples that bind to placeholders
//! - **[`Column`] / [`FromRow`]**: types and tuples read from result columns
//! - **[`Rows`]**: iterator over the remaining rows of a statement
//! - **[`Value`]**: a dynamically typed column value
//!
//! ## Usage
//!
//! ```
//! use sqlite_typed::{Database, Null};
//!
//! # fn main() -> sqlite_typed::Result<()> {
//! let db = Database::open_in_memory()?;
//! db.execute_batch(
//!    "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, avatar BLOB);",
//! )?;
//!
//! db.execute("INSERT INTO users (name, avatar) VALUES (?, ?)", ("alice", &b"\x89PNG"[..]))?;
//! db.execute("INSERT INTO users (name, avatar) VALUES (?, ?)", ("bob", Null))?;
//!
//! let mut stmt = db.prepare("SELECT id, name, avatar FROM users ORDER BY id")?;
//! for row in stmt.rows::<(i64, String, Option<Vec<u8>>)>() {
//!    let (id, name, avatar) = row?;
//!    println!("{id} {name} has avatar: {}", avatar.is_some());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Statement lifecycle
//!
//! - Bind, step, read columns, then reset and/or clear bindings before binding again
//! - Stepping a finished statement keeps reporting done until it is reset
//! - Columns can only be read while the most recent step produced a row
//!
mod bind;
mod column;
mod database;
mod error;
mod rows;
mod statement;
mod value;

// Re-export public types
pub use bind::{Bind, Null, Params, Utf16};
pub use column::{Column, FromRow, ReadTargets};
pub use database::Database;
pub use error::{Error, Result};
pub use rows::Rows;
pub use sqlite_typed_handle::{NativeValue, OpenConfig, OwnedNativeValue, StorageClass, engine_version, status};
pub use statement::{State, Statement, Step};
pub use value::Value;
