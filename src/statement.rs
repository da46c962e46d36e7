//! Prepared statements with typed binding, typed reads and a tracked cursor.

use std::ffi::c_int;

use indexmap::IndexMap;
use sqlite_typed_handle::{StmtHandle, StorageClass};
use tracing::trace;

pub use sqlite_typed_handle::Step;

use crate::Result;
use crate::bind::{Bind, Params};
use crate::column::{Column, FromRow, ReadTargets};
use crate::error::Error;
use crate::rows::Rows;
use crate::value::Value;

/// Position of a statement's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
   /// Prepared or reset; no step has run since.
   NotStarted,
   /// The most recent step produced a row, which can be read.
   HasRow,
   /// The statement ran to completion. Only [`Statement::reset`] restarts it.
   Done,
}

/// A prepared statement borrowed from the [`Database`](crate::Database) it was
/// prepared against.
///
/// The statement is finalized when dropped, on every exit path. Call
/// [`finalize`](Self::finalize) to observe the engine's final status instead.
///
/// Within one statement the order is: bind, step, read columns, then reset
/// and/or clear bindings before binding again. Reads borrow the statement, so
/// anything read as a borrowed view must be dropped before the next step.
#[derive(Debug)]
pub struct Statement<'db> {
   handle: StmtHandle<'db>,
   state: State,
}

impl<'db> Statement<'db> {
   pub(crate) fn new(handle: StmtHandle<'db>) -> Self {
      Self {
         handle,
         state: State::NotStarted,
      }
   }

   pub(crate) fn handle_mut(&mut self) -> &mut StmtHandle<'db> {
      &mut self.handle
   }

   /// The raw handle, once `index` is known to be a column of a current row.
   pub(crate) fn current_row(&self, index: usize) -> Result<&StmtHandle<'db>> {
      if self.state != State::HasRow {
         return Err(Error::NoRow);
      }
      let count = self.handle.column_count();
      if index >= count {
         return Err(Error::ColumnOutOfRange { index, count });
      }
      Ok(&self.handle)
   }

   /// The SQL text this statement was compiled from.
   pub fn sql(&self) -> &str {
      self.handle.sql().unwrap_or_default()
   }

   pub fn state(&self) -> State {
      self.state
   }

   /// Whether the statement has run to completion.
   pub fn is_done(&self) -> bool {
      self.state == State::Done
   }

   /// The engine status code of the most recent step (`SQLITE_OK` before any).
   pub fn last_status(&self) -> c_int {
      self.handle.last_status()
   }

   pub fn parameter_count(&self) -> usize {
      self.handle.parameter_count()
   }

   pub fn column_count(&self) -> usize {
      self.handle.column_count()
   }

   pub fn column_name(&self, index: usize) -> Option<&str> {
      self.handle.column_name(index)
   }

   /// Names of all result columns, in order.
   pub fn column_names(&self) -> Vec<&str> {
      (0..self.column_count())
         .map(|i| self.handle.column_name(i).unwrap_or_default())
         .collect()
   }

   /// Storage class of a column in the current row.
   pub fn column_type(&self, index: usize) -> Result<StorageClass> {
      Ok(self.current_row(index)?.column_type(index))
   }

   /// Size in bytes of a column's current representation.
   pub fn column_bytes(&self, index: usize) -> Result<usize> {
      Ok(self.current_row(index)?.column_bytes(index))
   }

   /// Binds one value at a 1-based parameter position.
   ///
   /// # Example
   ///
   /// ```
   /// use sqlite_typed::Database;
   ///
   /// # fn main() -> sqlite_typed::Result<()> {
   /// let db = Database::open_in_memory()?;
   /// let mut stmt = db.prepare("SELECT ?, ?")?;
   /// stmt.bind(1, 42)?;
   /// stmt.bind(2, "answer")?;
   /// stmt.step()?;
   ///
   /// let (n, s): (i64, &str) = stmt.read_row()?;
   /// assert_eq!((n, s), (42, "answer"));
   /// # Ok(())
   /// # }
   /// ```
   pub fn bind<T: Bind>(&mut self, index: usize, value: T) -> Result<()> {
      value.bind_to(self, index)
   }

   /// Binds a sequence of values at consecutive positions starting at `index`.
   ///
   /// `bind_from(1, (a, b, c))` binds `a` at 1, `b` at 2 and `c` at 3.
   /// An empty tuple binds nothing.
   pub fn bind_from<P: Params>(&mut self, index: usize, params: P) -> Result<()> {
      params.bind_params(self, index)
   }

   /// Advances the statement by one step.
   ///
   /// Once the statement has reported [`Step::Done`] it keeps reporting it
   /// without running again until [`reset`](Self::reset) is called. Busy and
   /// error statuses are returned as errors carrying the engine code.
   pub fn step(&mut self) -> Result<Step> {
      if self.state == State::Done {
         return Ok(Step::Done);
      }

      match self.handle.step() {
         Ok(step) => {
            self.state = match step {
               Step::Row => State::HasRow,
               Step::Done => State::Done,
            };
            Ok(step)
         }
         Err(e) => {
            // Whatever row was current is gone after a failed step.
            self.state = State::NotStarted;
            Err(e.into())
         }
      }
   }

   /// Rewinds the statement so it can be stepped again. Bindings are kept.
   ///
   /// If the most recent step failed, the engine reports that failure again
   /// here; the statement is rewound either way.
   pub fn reset(&mut self) -> Result<()> {
      self.state = State::NotStarted;
      let result = self.handle.reset();
      trace!(sql = self.sql(), "Reset statement");
      Ok(result?)
   }

   /// Sets every parameter back to NULL.
   pub fn clear_bindings(&mut self) -> Result<()> {
      Ok(self.handle.clear_bindings()?)
   }

   /// Reads one column of the current row.
   ///
   /// The statement stays borrowed for as long as the returned value lives,
   /// which is what keeps borrowed views (`&str`, `&[u8]`) valid.
   pub fn read<'s, T: Column<'s>>(&'s mut self, index: usize) -> Result<T> {
      T::read_column(self, index)
   }

   /// Reads a tuple from columns `0..N` of the current row.
   pub fn read_row<'s, T: FromRow<'s>>(&'s mut self) -> Result<T> {
      T::from_row(self, 0)
   }

   /// Reads a tuple from consecutive columns starting at `start`.
   pub fn read_row_at<'s, T: FromRow<'s>>(&'s mut self, start: usize) -> Result<T> {
      T::from_row(self, start)
   }

   /// Writes consecutive columns starting at `start` into `targets`.
   ///
   /// # Example
   ///
   /// ```
   /// use sqlite_typed::Database;
   ///
   /// # fn main() -> sqlite_typed::Result<()> {
   /// let db = Database::open_in_memory()?;
   /// let mut stmt = db.execute("SELECT 1, 2.5, 'three'", ())?;
   ///
   /// let (mut a, mut b, mut c) = (0_i64, 0.0_f64, String::new());
   /// stmt.read_into(0, (&mut a, &mut b, &mut c))?;
   /// assert_eq!((a, b, c.as_str()), (1, 2.5, "three"));
   /// # Ok(())
   /// # }
   /// ```
   pub fn read_into<'s, R: ReadTargets<'s>>(&'s mut self, start: usize, targets: R) -> Result<()> {
      targets.read_targets(self, start)
   }

   /// Reads the current row as a map of column name to value, in column order.
   pub fn read_map(&mut self) -> Result<IndexMap<String, Value>> {
      let count = self.column_count();
      let mut row = IndexMap::with_capacity(count);
      for index in 0..count {
         let name = self.column_name(index).unwrap_or_default().to_string();
         row.insert(name, Value::read_column(self, index)?);
      }
      Ok(row)
   }

   /// Lazily iterates the remaining rows as owned tuples.
   ///
   /// If the statement currently holds a row that has not been stepped past
   /// (as after [`Database::execute`](crate::Database::execute) on a query),
   /// that row comes first. Each further element costs exactly one step. The
   /// sequence is single-pass: once it ends, iterating again yields nothing
   /// until the statement is [`reset`](Self::reset).
   pub fn rows<T>(&mut self) -> Rows<'_, 'db, T>
   where
      T: for<'r> FromRow<'r>,
   {
      Rows::new(self)
   }

   /// Finalizes the statement and reports the engine's status.
   ///
   /// Dropping the statement finalizes it too, discarding the status.
   pub fn finalize(mut self) -> Result<()> {
      Ok(self.handle.finalize()?)
   }
}
