//! Error types for sqlite-typed-handle

use std::ffi::{CStr, c_int};

use libsqlite3_sys::{self as ffi, sqlite3};
use thiserror::Error;

/// Errors that may occur when working with raw SQLite handles.
///
/// Engine status codes are carried verbatim (including extended codes when the
/// engine reports them); [`Error::code`] narrows them to the primary code.
#[derive(Error, Debug)]
pub enum Error {
   /// The engine rejected opening the database. The partial handle has already
   /// been released when this is returned.
   #[error("unable to open database '{path}': {message} (code {code})")]
   Open {
      path: String,
      code: c_int,
      message: String,
   },

   /// The engine rejected the SQL text. No statement handle exists.
   #[error("unable to prepare statement `{sql}`: {message} (code {code})")]
   Prepare {
      sql: String,
      code: c_int,
      message: String,
   },

   /// A bind, step, reset, clear-bindings, finalize or close call returned a
   /// status other than OK, ROW or DONE.
   #[error("{message} (code {code})")]
   Sqlite { code: c_int, message: String },

   /// Database has been closed and cannot be used
   #[error("Database has been closed")]
   DatabaseClosed,

   /// A path contained an interior NUL byte
   #[error("invalid path: {0}")]
   Nul(#[from] std::ffi::NulError),

   /// A parameter or column index larger than the engine's `int`
   #[error("index {0} is out of the engine's range")]
   IndexOverflow(usize),
}

impl Error {
   /// The primary engine result code, when the error came from the engine.
   pub fn code(&self) -> Option<c_int> {
      match self {
         Error::Open { code, .. } | Error::Prepare { code, .. } | Error::Sqlite { code, .. } => {
            Some(code & 0xff)
         }
         _ => None,
      }
   }

   /// The code exactly as the engine reported it, possibly extended.
   pub fn extended_code(&self) -> Option<c_int> {
      match self {
         Error::Open { code, .. } | Error::Prepare { code, .. } | Error::Sqlite { code, .. } => {
            Some(*code)
         }
         _ => None,
      }
   }

   /// Whether the engine reported the database as busy or locked.
   ///
   /// These are the only engine conditions a caller can meaningfully retry.
   pub fn is_busy(&self) -> bool {
      matches!(self.code(), Some(ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED))
   }

   /// Machine-readable error code, e.g. `SQLITE_BUSY` or `DATABASE_CLOSED`.
   pub fn error_code(&self) -> String {
      match self.code() {
         Some(code) => match code_name(code) {
            Some(name) => format!("SQLITE_{}", name),
            None => format!("SQLITE_{}", code),
         },
         None => match self {
            Error::DatabaseClosed => "DATABASE_CLOSED".to_string(),
            Error::Nul(_) => "INVALID_PATH".to_string(),
            Error::IndexOverflow(_) => "INDEX_OVERFLOW".to_string(),
            _ => "ERROR".to_string(),
         },
      }
   }

   /// Builds an [`Error::Sqlite`] from a status code and the connection's
   /// current error message.
   ///
   /// # Safety
   ///
   /// `db` must be null or a valid, open connection.
   pub(crate) unsafe fn from_connection(db: *mut sqlite3, code: c_int) -> Self {
      Error::Sqlite {
         code,
         message: unsafe { message_for(db, code) },
      }
   }

   /// Builds an [`Error::Sqlite`] using only the engine's static description of `code`.
   pub(crate) fn from_code(code: c_int) -> Self {
      Error::Sqlite {
         code,
         message: errstr(code),
      }
   }
}

/// Returns the most recent error message of `db`, falling back to the static
/// description of `code` when no connection is available.
///
/// # Safety
///
/// `db` must be null or a valid connection pointer.
pub(crate) unsafe fn message_for(db: *mut sqlite3, code: c_int) -> String {
   if db.is_null() {
      return errstr(code);
   }

   // SAFETY: db is a valid connection (guaranteed by caller). The returned
   // string is owned by SQLite and valid until the next API call on db, so it
   // is copied out immediately.
   let msg = unsafe { ffi::sqlite3_errmsg(db) };
   if msg.is_null() {
      return errstr(code);
   }
   unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

/// The engine's static English description of a result code.
pub(crate) fn errstr(code: c_int) -> String {
   // SAFETY: sqlite3_errstr returns a pointer to a static string for any code.
   let msg = unsafe { ffi::sqlite3_errstr(code) };
   if msg.is_null() {
      return format!("unknown error code {}", code);
   }
   unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

fn code_name(code: c_int) -> Option<&'static str> {
   let name = match code {
      ffi::SQLITE_ERROR => "ERROR",
      ffi::SQLITE_INTERNAL => "INTERNAL",
      ffi::SQLITE_PERM => "PERM",
      ffi::SQLITE_ABORT => "ABORT",
      ffi::SQLITE_BUSY => "BUSY",
      ffi::SQLITE_LOCKED => "LOCKED",
      ffi::SQLITE_NOMEM => "NOMEM",
      ffi::SQLITE_READONLY => "READONLY",
      ffi::SQLITE_INTERRUPT => "INTERRUPT",
      ffi::SQLITE_IOERR => "IOERR",
      ffi::SQLITE_CORRUPT => "CORRUPT",
      ffi::SQLITE_NOTFOUND => "NOTFOUND",
      ffi::SQLITE_FULL => "FULL",
      ffi::SQLITE_CANTOPEN => "CANTOPEN",
      ffi::SQLITE_PROTOCOL => "PROTOCOL",
      ffi::SQLITE_SCHEMA => "SCHEMA",
      ffi::SQLITE_TOOBIG => "TOOBIG",
      ffi::SQLITE_CONSTRAINT => "CONSTRAINT",
      ffi::SQLITE_MISMATCH => "MISMATCH",
      ffi::SQLITE_MISUSE => "MISUSE",
      ffi::SQLITE_NOLFS => "NOLFS",
      ffi::SQLITE_AUTH => "AUTH",
      ffi::SQLITE_FORMAT => "FORMAT",
      ffi::SQLITE_RANGE => "RANGE",
      ffi::SQLITE_NOTADB => "NOTADB",
      _ => return None,
   };
   Some(name)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_uses_primary_code() {
      // SQLITE_BUSY_SNAPSHOT is an extended form of SQLITE_BUSY
      let err = Error::from_code(ffi::SQLITE_BUSY | (2 << 8));
      assert_eq!(err.code(), Some(ffi::SQLITE_BUSY));
      assert_eq!(err.error_code(), "SQLITE_BUSY");
      assert!(err.is_busy());
   }

   #[test]
   fn test_error_code_non_engine() {
      assert_eq!(Error::DatabaseClosed.error_code(), "DATABASE_CLOSED");
      assert_eq!(Error::DatabaseClosed.code(), None);
      assert_eq!(Error::IndexOverflow(usize::MAX).error_code(), "INDEX_OVERFLOW");
   }

   #[test]
   fn test_error_code_unknown() {
      let err = Error::Sqlite {
         code: 250,
         message: "strange".into(),
      };
      assert_eq!(err.error_code(), "SQLITE_250");
      assert_eq!(err.to_string(), "strange (code 250)");
   }

   #[test]
   fn test_errstr_describes_code() {
      assert_eq!(errstr(ffi::SQLITE_RANGE), "column index out of range");
   }

   #[test]
   fn test_message_for_null_connection() {
      let message = unsafe { message_for(std::ptr::null_mut(), ffi::SQLITE_MISUSE) };
      assert_eq!(message, errstr(ffi::SQLITE_MISUSE));
   }
}
