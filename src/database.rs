//! SQLite database facade: open/close plus prepare, execute and executemany.

use std::path::Path;

use sqlite_typed_handle::{DbHandle, OpenConfig, StmtHandle};
use tracing::{debug, trace};

use crate::Result;
use crate::bind::Params;
use crate::error::Error;
use crate::statement::{Statement, Step};

/// An open SQLite database.
///
/// Statements borrow the database they were prepared against, so the
/// database outlives every statement derived from it and cannot be closed
/// while any of them is alive.
///
/// # Example
///
/// ```
/// use sqlite_typed::Database;
///
/// # fn main() -> sqlite_typed::Result<()> {
/// let db = Database::open_in_memory()?;
///
/// db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, value TEXT)", ())?;
/// db.execute("INSERT INTO t (value) VALUES (?)", ("hello",))?;
/// db.execute_many("INSERT INTO t (value) VALUES (?)", [("a",), ("b",)])?;
///
/// let mut stmt = db.execute("SELECT * FROM t", ())?;
/// let rows: Vec<(i64, String)> = stmt.rows().collect::<Result<_, _>>()?;
/// assert_eq!(rows.len(), 3);
/// assert_eq!(rows[0], (1, "hello".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Database {
   handle: DbHandle,
}

impl Database {
   /// Opens (creating if missing) the database at `path` with default settings.
   pub fn open(path: impl AsRef<Path>) -> Result<Self> {
      Self::open_with(path, &OpenConfig::default())
   }

   /// Opens the database at `path` with a custom configuration.
   ///
   /// # Errors
   ///
   /// If the engine rejects the path, flags or permissions, any partially
   /// opened handle is released and the engine's open error is returned.
   ///
   /// ```
   /// use sqlite_typed::{Database, OpenConfig};
   ///
   /// # fn main() -> sqlite_typed::Result<()> {
   /// let config = OpenConfig {
   ///    busy_timeout_ms: Some(1_000),
   ///    ..Default::default()
   /// };
   /// let db = Database::open_with(":memory:", &config)?;
   /// assert!(db.is_open());
   /// # Ok(())
   /// # }
   /// ```
   pub fn open_with(path: impl AsRef<Path>, config: &OpenConfig) -> Result<Self> {
      let path = path.as_ref();
      let path = path
         .to_str()
         .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;

      Ok(Self {
         handle: DbHandle::open(path, config)?,
      })
   }

   /// Opens a private in-memory database.
   pub fn open_in_memory() -> Result<Self> {
      Self::open(":memory:")
   }

   /// Path the database was opened with.
   pub fn path(&self) -> &str {
      self.handle.path()
   }

   /// Whether the database is still open.
   pub fn is_open(&self) -> bool {
      self.handle.is_open()
   }

   /// Closes the database. Closing an already closed database is a no-op.
   ///
   /// Dropping the database closes it too. After close, every operation
   /// returns `DatabaseClosed`.
   pub fn close(&mut self) -> Result<()> {
      Ok(self.handle.close()?)
   }

   /// The most recent engine error recorded on this connection, if any.
   pub fn last_error(&self) -> Option<Error> {
      self.handle.last_error().map(Error::from)
   }

   /// Rowid of the most recent successful INSERT.
   pub fn last_insert_rowid(&self) -> Result<i64> {
      Ok(self.handle.last_insert_rowid()?)
   }

   /// Rows modified by the most recently completed INSERT, UPDATE or DELETE.
   pub fn changes(&self) -> Result<u64> {
      Ok(self.handle.changes()?)
   }

   /// Compiles `sql` into a statement without binding or stepping it.
   ///
   /// Only the first statement in `sql` is compiled.
   ///
   /// # Errors
   ///
   /// Fails when the engine rejects the SQL text; no statement exists then.
   pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
      Ok(Statement::new(StmtHandle::prepare(&self.handle, sql)?))
   }

   /// Prepares `sql`, binds `params` from position 1 and performs one step.
   ///
   /// After the step, a statement with an immediate effect (DDL, a single
   /// INSERT/UPDATE/DELETE) has run to completion. For a query the first row
   /// is current, and the returned statement can be read, stepped further or
   /// iterated with [`Statement::rows`]. Pass `()` when there are no
   /// parameters.
   pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<Statement<'_>> {
      let mut stmt = self.prepare(sql)?;
      stmt.bind_from(1, params)?;
      let step = stmt.step()?;
      trace!(sql, ?step, "Executed statement");
      Ok(stmt)
   }

   /// Prepares `sql` once and applies it to each parameter tuple in order.
   ///
   /// Each tuple is bound from position 1 and stepped exactly once, then the
   /// bindings are cleared and the statement reset before the next tuple.
   /// Returns the number of tuples applied.
   ///
   /// # Errors
   ///
   /// Stops at the first tuple that fails to bind or step. Tuples applied
   /// before it stay applied; wrap the call in a transaction for
   /// all-or-nothing behaviour.
   pub fn execute_many<I>(&self, sql: &str, rows: I) -> Result<usize>
   where
      I: IntoIterator,
      I::Item: Params,
   {
      let mut stmt = self.prepare(sql)?;
      let mut applied = 0;

      for params in rows {
         if let Err(e) = apply_once(&mut stmt, &params) {
            // Leave the statement bindable; the failure is what gets reported.
            let _ = stmt.reset();
            let _ = stmt.clear_bindings();
            return Err(e);
         }
         applied += 1;
         trace!(sql, row = applied, "Applied parameter tuple");
      }

      debug!(sql, rows = applied, "execute_many finished");
      Ok(applied)
   }

   /// Runs every statement in `sql`, in order, stepping each to completion.
   ///
   /// Rows produced by queries in the batch are discarded. Useful for schema
   /// scripts; statements needing parameters belong in [`execute`](Self::execute).
   pub fn execute_batch(&self, sql: &str) -> Result<()> {
      let mut rest = sql;
      let mut count = 0_usize;

      while !rest.trim().is_empty() {
         let (handle, tail) = StmtHandle::prepare_next(&self.handle, rest)?;
         let progressed = tail.len() < rest.len();
         rest = tail;

         let Some(handle) = handle else {
            if progressed {
               continue;
            }
            break;
         };
         let mut stmt = Statement::new(handle);
         while stmt.step()? == Step::Row {}
         count += 1;
      }

      debug!(statements = count, "Executed batch");
      Ok(())
   }
}

fn apply_once<P: Params + ?Sized>(stmt: &mut Statement<'_>, params: &P) -> Result<()> {
   stmt.bind_from(1, params)?;
   stmt.step()?;
   stmt.clear_bindings()?;
   stmt.reset()
}
