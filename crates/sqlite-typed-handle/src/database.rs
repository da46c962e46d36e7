//! Exclusive owner of a raw `sqlite3` connection handle

use std::ffi::{CString, c_int};
use std::ptr;

use libsqlite3_sys::{self as ffi, sqlite3};
use tracing::{debug, error, trace};

use crate::Result;
use crate::config::OpenConfig;
use crate::error::{Error, message_for};

/// Owns one `sqlite3` connection handle and releases it exactly once.
///
/// The handle is either open or null. Construction never exposes a
/// half-initialized handle: if the engine reports a failure while opening,
/// whatever partial handle it produced is closed before the error is returned.
///
/// [`close`](Self::close) is idempotent and also runs on drop.
#[derive(Debug)]
pub struct DbHandle {
   raw: *mut sqlite3,
   path: String,
}

// SAFETY: open refuses to run against an engine built with
// SQLITE_THREADSAFE=0, and in both remaining modes a connection may be moved to
// and used from another thread as long as only one thread uses it at a time.
// DbHandle is not Sync, so that holds.
unsafe impl Send for DbHandle {}

impl DbHandle {
   /// Opens the database at `path` with the given configuration.
   ///
   /// `":memory:"` opens a private in-memory database.
   ///
   /// # Errors
   ///
   /// Returns [`Error::Open`] when the engine rejects the path, flags or
   /// permissions, or was built without thread safety, and [`Error::Nul`] when
   /// `path` contains a NUL byte.
   pub fn open(path: &str, config: &OpenConfig) -> Result<Self> {
      // SAFETY: reports a compile-time option and touches no state.
      if unsafe { ffi::sqlite3_threadsafe() } == 0 {
         return Err(Error::Open {
            path: path.to_string(),
            code: ffi::SQLITE_MISUSE,
            message: "SQLite was built with SQLITE_THREADSAFE=0".to_string(),
         });
      }

      let c_path = CString::new(path)?;
      let mut raw: *mut sqlite3 = ptr::null_mut();

      // SAFETY: c_path is a valid NUL-terminated string and raw is a valid out
      // pointer. A null VFS name selects the default VFS.
      let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut raw, config.flags(), ptr::null()) };

      // Take ownership immediately so every exit path below releases the handle,
      // including the failure paths.
      let mut handle = Self {
         raw,
         path: path.to_string(),
      };

      if rc != ffi::SQLITE_OK {
         // SAFETY: raw is null or a connection the engine allocated for us.
         let message = unsafe { message_for(handle.raw, rc) };
         handle.release_after_failure();
         return Err(Error::Open {
            path: path.to_string(),
            code: rc,
            message,
         });
      }

      if let Some(timeout) = config.busy_timeout_ms {
         let timeout = c_int::try_from(timeout).unwrap_or(c_int::MAX);
         // SAFETY: handle.raw is an open connection.
         let rc = unsafe { ffi::sqlite3_busy_timeout(handle.raw, timeout) };
         if rc != ffi::SQLITE_OK {
            let message = unsafe { message_for(handle.raw, rc) };
            handle.release_after_failure();
            return Err(Error::Open {
               path: path.to_string(),
               code: rc,
               message,
            });
         }
      }

      debug!(path, read_only = config.read_only, "Opened SQLite database");
      Ok(handle)
   }

   /// The path this handle was opened with.
   pub fn path(&self) -> &str {
      &self.path
   }

   /// Whether the handle is still open.
   pub fn is_open(&self) -> bool {
      !self.raw.is_null()
   }

   /// The raw connection pointer.
   ///
   /// # Errors
   ///
   /// Returns [`Error::DatabaseClosed`] once the handle has been closed.
   pub fn as_ptr(&self) -> Result<*mut sqlite3> {
      if self.raw.is_null() {
         return Err(Error::DatabaseClosed);
      }
      Ok(self.raw)
   }

   /// Closes the connection.
   ///
   /// Calling this on an already closed handle is a no-op. If the engine
   /// refuses to close (for example because statements are still alive), the
   /// handle stays open so the close can be retried.
   pub fn close(&mut self) -> Result<()> {
      if self.raw.is_null() {
         return Ok(());
      }

      // SAFETY: raw is an open connection owned by this handle.
      let rc = unsafe { ffi::sqlite3_close(self.raw) };
      if rc != ffi::SQLITE_OK {
         return Err(unsafe { Error::from_connection(self.raw, rc) });
      }

      self.raw = ptr::null_mut();
      debug!(path = %self.path, "Closed SQLite database");
      Ok(())
   }

   /// The most recent engine error recorded on this connection, if any.
   pub fn last_error(&self) -> Option<Error> {
      if self.raw.is_null() {
         return None;
      }

      // SAFETY: raw is an open connection.
      let code = unsafe { ffi::sqlite3_extended_errcode(self.raw) };
      if matches!(code, ffi::SQLITE_OK | ffi::SQLITE_ROW | ffi::SQLITE_DONE) {
         return None;
      }
      Some(unsafe { Error::from_connection(self.raw, code) })
   }

   /// Rowid of the most recent successful INSERT on this connection.
   pub fn last_insert_rowid(&self) -> Result<i64> {
      let raw = self.as_ptr()?;
      Ok(unsafe { ffi::sqlite3_last_insert_rowid(raw) })
   }

   /// Rows modified by the most recently completed INSERT, UPDATE or DELETE.
   pub fn changes(&self) -> Result<u64> {
      let raw = self.as_ptr()?;
      let changes = unsafe { ffi::sqlite3_changes(raw) };
      Ok(changes.max(0) as u64)
   }

   fn release_after_failure(&mut self) {
      if self.raw.is_null() {
         return;
      }
      // SAFETY: raw was allocated by sqlite3_open_v2 and no statements exist yet.
      unsafe { ffi::sqlite3_close(self.raw) };
      self.raw = ptr::null_mut();
      trace!(path = %self.path, "Released partial handle after failed open");
   }
}

impl Drop for DbHandle {
   fn drop(&mut self) {
      if let Err(e) = self.close() {
         error!(path = %self.path, error = %e, "Failed to close SQLite database");
      }
   }
}
