//! Exclusive owner of a raw `sqlite3_stmt` prepared-statement handle

use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use libsqlite3_sys::{self as ffi, sqlite3_stmt};
use tracing::trace;

use crate::Result;
use crate::database::DbHandle;
use crate::error::{Error, errstr, message_for};
use crate::value::{NativeValue, StorageClass};

// libsqlite3-sys skips the UTF-16 API when generating bindings; the engine
// still exports it.
unsafe extern "C" {
   fn sqlite3_bind_text16(
      stmt: *mut sqlite3_stmt,
      index: c_int,
      value: *const c_void,
      len: c_int,
      destructor: ffi::sqlite3_destructor_type,
   ) -> c_int;
}

/// Outcome of one successful `sqlite3_step`.
///
/// Busy and error statuses are reported as [`Error`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
   /// A result row is available.
   Row,
   /// The statement has run to completion.
   Done,
}

/// Owns one prepared statement handle, borrowed from the [`DbHandle`] it was
/// prepared against.
///
/// The borrow makes the connection outlive the statement. The statement is
/// finalized exactly once: by [`finalize`](Self::finalize) or on drop.
///
/// Column accessors hand out views into engine-owned buffers. They borrow the
/// handle, so a step or reset (both `&mut self`) cannot run while a view is
/// alive. Every text, blob or C-string view of a column points into the same
/// NUL-terminated buffer: the first view converts the value once, and later
/// reads of that column in any form leave the buffer where it is.
///
/// Storage classes are recorded when a row is produced, so
/// [`column_type`](Self::column_type) does not change after a column has been
/// read as text.
#[derive(Debug)]
pub struct StmtHandle<'db> {
   raw: *mut sqlite3_stmt,
   db: &'db DbHandle,
   last_status: c_int,
   row_types: Vec<StorageClass>,
}

impl<'db> StmtHandle<'db> {
   /// Compiles the first statement in `sql`.
   ///
   /// Any text after the first statement is ignored.
   ///
   /// # Errors
   ///
   /// Returns [`Error::Prepare`] when the engine rejects the text or when `sql`
   /// contains no statement, and [`Error::DatabaseClosed`] when `db` is closed.
   pub fn prepare(db: &'db DbHandle, sql: &str) -> Result<Self> {
      match Self::prepare_next(db, sql)? {
         (Some(stmt), _) => Ok(stmt),
         (None, _) => Err(Error::Prepare {
            sql: sql.to_string(),
            code: ffi::SQLITE_MISUSE,
            message: "no SQL statement to prepare".to_string(),
         }),
      }
   }

   /// Compiles the first statement in `sql` and returns it with the remaining text.
   ///
   /// The statement is `None` when `sql` holds only whitespace or comments.
   pub fn prepare_next<'a>(db: &'db DbHandle, sql: &'a str) -> Result<(Option<Self>, &'a str)> {
      let conn = db.as_ptr()?;
      let len = c_int::try_from(sql.len()).map_err(|_| Error::Prepare {
         sql: sql.to_string(),
         code: ffi::SQLITE_TOOBIG,
         message: errstr(ffi::SQLITE_TOOBIG),
      })?;

      let mut raw: *mut sqlite3_stmt = ptr::null_mut();
      let mut tail: *const c_char = ptr::null();

      // SAFETY: conn is open, sql is valid for len bytes, and both out
      // pointers are valid. The engine reads at most len bytes.
      let rc = unsafe {
         ffi::sqlite3_prepare_v2(conn, sql.as_ptr() as *const c_char, len, &mut raw, &mut tail)
      };

      // Owned from here on so a non-null handle is finalized on every path.
      let handle = Self {
         raw,
         db,
         last_status: ffi::SQLITE_OK,
         row_types: Vec::new(),
      };

      if rc != ffi::SQLITE_OK {
         let message = unsafe { message_for(conn, rc) };
         return Err(Error::Prepare {
            sql: sql.to_string(),
            code: rc,
            message,
         });
      }

      let rest = if tail.is_null() {
         ""
      } else {
         // tail points into sql, at or before its end.
         let offset = (tail as usize).saturating_sub(sql.as_ptr() as usize);
         sql.get(offset..).unwrap_or("")
      };

      if handle.raw.is_null() {
         return Ok((None, rest));
      }

      trace!(sql = handle.sql().unwrap_or_default(), "Prepared statement");
      Ok((Some(handle), rest))
   }

   /// The connection this statement was prepared against.
   pub fn database(&self) -> &'db DbHandle {
      self.db
   }

   /// Whether the handle has not been finalized yet.
   pub fn is_live(&self) -> bool {
      !self.raw.is_null()
   }

   /// The SQL text the statement was compiled from.
   pub fn sql(&self) -> Option<&str> {
      if self.raw.is_null() {
         return None;
      }
      // SAFETY: the returned string lives as long as the statement.
      let ptr = unsafe { ffi::sqlite3_sql(self.raw) };
      if ptr.is_null() {
         return None;
      }
      unsafe { CStr::from_ptr(ptr) }.to_str().ok()
   }

   /// The status code returned by the most recent step.
   ///
   /// `SQLITE_OK` before the first step.
   pub fn last_status(&self) -> c_int {
      self.last_status
   }

   /// Advances the statement by one step.
   pub fn step(&mut self) -> Result<Step> {
      let raw = self.live()?;
      // SAFETY: raw is a live statement owned by self.
      let rc = unsafe { ffi::sqlite3_step(raw) };
      self.last_status = rc;
      self.row_types.clear();
      match rc {
         ffi::SQLITE_ROW => {
            self.record_row_types(raw);
            Ok(Step::Row)
         }
         ffi::SQLITE_DONE => Ok(Step::Done),
         _ => Err(self.error(rc)),
      }
   }

   /// Returns the statement to its initial state. Bindings are kept.
   ///
   /// If the most recent step failed, the engine reports that failure again here.
   pub fn reset(&mut self) -> Result<()> {
      let raw = self.live()?;
      let rc = unsafe { ffi::sqlite3_reset(raw) };
      self.last_status = ffi::SQLITE_OK;
      self.row_types.clear();
      self.check(rc)
   }

   /// Sets every parameter back to NULL.
   pub fn clear_bindings(&mut self) -> Result<()> {
      let raw = self.live()?;
      let rc = unsafe { ffi::sqlite3_clear_bindings(raw) };
      self.check(rc)
   }

   /// Finalizes the statement. Further calls are no-ops.
   ///
   /// If the most recent step failed, the engine reports that failure again here.
   pub fn finalize(&mut self) -> Result<()> {
      if self.raw.is_null() {
         return Ok(());
      }
      // SAFETY: raw is live and is nulled right after, so it is released once.
      let rc = unsafe { ffi::sqlite3_finalize(self.raw) };
      self.raw = ptr::null_mut();
      self.row_types.clear();
      trace!("Finalized statement");
      if rc == ffi::SQLITE_OK {
         Ok(())
      } else {
         Err(unsafe { Error::from_connection(self.db.as_ptr().unwrap_or(ptr::null_mut()), rc) })
      }
   }

   /// Number of `?` parameters in the statement.
   pub fn parameter_count(&self) -> usize {
      if self.raw.is_null() {
         return 0;
      }
      unsafe { ffi::sqlite3_bind_parameter_count(self.raw) }.max(0) as usize
   }

   pub fn bind_int(&mut self, index: usize, value: i32) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let rc = unsafe { ffi::sqlite3_bind_int(raw, index, value) };
      self.check(rc)
   }

   pub fn bind_int64(&mut self, index: usize, value: i64) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let rc = unsafe { ffi::sqlite3_bind_int64(raw, index, value) };
      self.check(rc)
   }

   pub fn bind_double(&mut self, index: usize, value: f64) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let rc = unsafe { ffi::sqlite3_bind_double(raw, index, value) };
      self.check(rc)
   }

   pub fn bind_null(&mut self, index: usize) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let rc = unsafe { ffi::sqlite3_bind_null(raw, index) };
      self.check(rc)
   }

   /// Binds UTF-8 text. The engine keeps its own copy.
   pub fn bind_text(&mut self, index: usize, value: &[u8]) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let len = byte_len(value.len())?;
      // SAFETY: value is valid for len bytes for the duration of the call and
      // SQLITE_TRANSIENT makes the engine copy it before returning.
      let rc = unsafe {
         ffi::sqlite3_bind_text(
            raw,
            index,
            value.as_ptr() as *const c_char,
            len,
            ffi::SQLITE_TRANSIENT(),
         )
      };
      self.check(rc)
   }

   /// Binds a NUL-terminated string as UTF-8 text.
   pub fn bind_cstr(&mut self, index: usize, value: &CStr) -> Result<()> {
      self.bind_text(index, value.to_bytes())
   }

   /// Binds UTF-16 text in native byte order.
   pub fn bind_text16(&mut self, index: usize, value: &[u16]) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let len = byte_len(value.len().saturating_mul(2))?;
      // SAFETY: value is valid for len bytes for the duration of the call and
      // SQLITE_TRANSIENT makes the engine copy it before returning.
      let rc = unsafe {
         sqlite3_bind_text16(
            raw,
            index,
            value.as_ptr() as *const c_void,
            len,
            ffi::SQLITE_TRANSIENT(),
         )
      };
      self.check(rc)
   }

   /// Binds a blob. An empty slice binds a zero-length blob, not NULL.
   pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<()> {
      let (raw, index) = self.bind_target(index)?;
      let rc = if value.is_empty() {
         unsafe { ffi::sqlite3_bind_zeroblob(raw, index, 0) }
      } else {
         let len = byte_len(value.len())?;
         unsafe {
            ffi::sqlite3_bind_blob(
               raw,
               index,
               value.as_ptr() as *const c_void,
               len,
               ffi::SQLITE_TRANSIENT(),
            )
         }
      };
      self.check(rc)
   }

   /// Binds a copy of an engine-native value, keeping its storage class.
   pub fn bind_value(&mut self, index: usize, value: NativeValue<'_>) -> Result<()> {
      if value.blob_read_as_text() {
         let owned = value.duplicate()?;
         return self.bind_blob(index, owned.blob());
      }
      let (raw, index) = self.bind_target(index)?;
      let rc = unsafe { ffi::sqlite3_bind_value(raw, index, value.as_ptr()) };
      self.check(rc)
   }

   /// Number of columns in the statement's result set.
   pub fn column_count(&self) -> usize {
      if self.raw.is_null() {
         return 0;
      }
      unsafe { ffi::sqlite3_column_count(self.raw) }.max(0) as usize
   }

   pub fn column_name(&self, index: usize) -> Option<&str> {
      let col = self.column_index(index)?;
      // SAFETY: the name stays valid until the statement is finalized.
      let ptr = unsafe { ffi::sqlite3_column_name(self.raw, col) };
      if ptr.is_null() {
         return None;
      }
      unsafe { CStr::from_ptr(ptr) }.to_str().ok()
   }

   /// Storage class of a column in the current row, as produced by the step.
   ///
   /// `Null` when out of range or when there is no current row.
   pub fn column_type(&self, index: usize) -> StorageClass {
      self.row_types.get(index).copied().unwrap_or(StorageClass::Null)
   }

   pub fn column_int(&self, index: usize) -> i32 {
      match self.column_index(index) {
         Some(col) => unsafe { ffi::sqlite3_column_int(self.raw, col) },
         None => 0,
      }
   }

   pub fn column_int64(&self, index: usize) -> i64 {
      match self.column_index(index) {
         Some(col) => unsafe { ffi::sqlite3_column_int64(self.raw, col) },
         None => 0,
      }
   }

   pub fn column_double(&self, index: usize) -> f64 {
      match self.column_index(index) {
         Some(col) => unsafe { ffi::sqlite3_column_double(self.raw, col) },
         None => 0.0,
      }
   }

   /// The column as UTF-8 text bytes without the terminator. `None` for NULL.
   pub fn column_text(&self, index: usize) -> Option<&[u8]> {
      let col = self.column_index(index)?;
      let ptr = self.text_ptr(col);
      if ptr.is_null() {
         return None;
      }
      // SAFETY: text is fetched before bytes so the length matches the UTF-8
      // form. The buffer is valid until the next step/reset/finalize, all of
      // which need &mut self.
      let len = unsafe { ffi::sqlite3_column_bytes(self.raw, col) }.max(0) as usize;
      Some(unsafe { std::slice::from_raw_parts(ptr, len) })
   }

   /// The column as NUL-terminated text. `None` for NULL.
   pub fn column_cstr(&self, index: usize) -> Option<&CStr> {
      let col = self.column_index(index)?;
      let ptr = self.text_ptr(col);
      if ptr.is_null() {
         return None;
      }
      // SAFETY: the engine always NUL-terminates text it returns.
      Some(unsafe { CStr::from_ptr(ptr as *const c_char) })
   }

   /// The column as bytes. NULL and zero-length blobs both yield an empty slice.
   pub fn column_blob(&self, index: usize) -> &[u8] {
      let Some(col) = self.column_index(index) else {
         return &[];
      };
      if self.text_ptr(col).is_null() {
         return &[];
      }
      // Already in text form, so this returns the same buffer without moving it.
      let ptr = unsafe { ffi::sqlite3_column_blob(self.raw, col) };
      let len = unsafe { ffi::sqlite3_column_bytes(self.raw, col) }.max(0) as usize;
      if ptr.is_null() || len == 0 {
         return &[];
      }
      // SAFETY: ptr is non-null and len bytes stay valid while self is borrowed.
      unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }
   }

   /// Size in bytes of the column's current representation.
   pub fn column_bytes(&self, index: usize) -> usize {
      match self.column_index(index) {
         Some(col) => unsafe { ffi::sqlite3_column_bytes(self.raw, col) }.max(0) as usize,
         None => 0,
      }
   }

   /// The column's engine-native value.
   pub fn column_value(&self, index: usize) -> Option<NativeValue<'_>> {
      let col = self.column_index(index)?;
      let ptr = unsafe { ffi::sqlite3_column_value(self.raw, col) };
      // SAFETY: the value lives until the next step/reset/finalize, which the
      // returned borrow of self rules out.
      NonNull::new(ptr).map(|raw| unsafe { NativeValue::from_raw(raw, self.column_type(index)) })
   }

   /// Converts a column to NUL-terminated UTF-8 text in place and returns it.
   ///
   /// The conversion may reallocate the column's buffer, but only the first
   /// time. A blob or text read after it returns the same pointer, so views
   /// handed out earlier stay valid. Null for NULL columns.
   fn text_ptr(&self, col: c_int) -> *const u8 {
      // SAFETY: col was range checked by column_index on a live statement.
      unsafe { ffi::sqlite3_column_text(self.raw, col) }
   }

   fn record_row_types(&mut self, raw: *mut sqlite3_stmt) {
      let count = self.column_count();
      self.row_types.reserve(count);
      for col in 0..count {
         // SAFETY: raw has a current row and col < column_count.
         let code = unsafe { ffi::sqlite3_column_type(raw, col as c_int) };
         self.row_types.push(StorageClass::from_raw(code));
      }
   }

   fn column_index(&self, index: usize) -> Option<c_int> {
      if index < self.column_count() {
         c_int::try_from(index).ok()
      } else {
         None
      }
   }

   fn bind_target(&self, index: usize) -> Result<(*mut sqlite3_stmt, c_int)> {
      let raw = self.live()?;
      let index = c_int::try_from(index).map_err(|_| Error::IndexOverflow(index))?;
      Ok((raw, index))
   }

   fn live(&self) -> Result<*mut sqlite3_stmt> {
      if self.raw.is_null() {
         return Err(Error::from_code(ffi::SQLITE_MISUSE));
      }
      Ok(self.raw)
   }

   fn check(&self, rc: c_int) -> Result<()> {
      if rc == ffi::SQLITE_OK {
         Ok(())
      } else {
         Err(self.error(rc))
      }
   }

   fn error(&self, rc: c_int) -> Error {
      // SAFETY: the connection outlives self through the 'db borrow.
      unsafe { Error::from_connection(self.db.as_ptr().unwrap_or(ptr::null_mut()), rc) }
   }
}

impl Drop for StmtHandle<'_> {
   fn drop(&mut self) {
      // A non-OK status here repeats the last failed step, which the caller
      // has already been given.
      if let Err(e) = self.finalize() {
         trace!(error = %e, "Finalize reported status of the last step");
      }
   }
}

fn byte_len(len: usize) -> Result<c_int> {
   c_int::try_from(len).map_err(|_| Error::from_code(ffi::SQLITE_TOOBIG))
}
