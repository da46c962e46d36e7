use std::ffi::c_int;

/// Result type alias for typed SQLite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the typed SQLite layer.
///
/// Engine failures (open, prepare, bind, step, reset, finalize, close) arrive
/// through [`Error::Handle`] with the engine's status code and message intact.
/// The remaining variants are checks this layer makes before touching the
/// engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error reported by the engine or the handle layer.
   #[error(transparent)]
   Handle(#[from] sqlite_typed_handle::Error),

   /// Database path that cannot be passed to the engine.
   #[error("invalid database path: {0}")]
   InvalidPath(String),

   /// Column index past the end of the result row.
   #[error("column {index} is out of range for a row of {count} columns")]
   ColumnOutOfRange { index: usize, count: usize },

   /// Column read while the statement has no current row.
   #[error("no current row: the statement must report a row before columns are read")]
   NoRow,

   /// Text column that is not valid UTF-8.
   #[error("column {index} is not valid UTF-8: {source}")]
   Utf8 {
      index: usize,
      #[source]
      source: std::str::Utf8Error,
   },
}

impl Error {
   /// The primary engine result code, when the error came from the engine.
   pub fn code(&self) -> Option<c_int> {
      match self {
         Error::Handle(e) => e.code(),
         _ => None,
      }
   }

   /// Whether the engine reported the database as busy or locked.
   pub fn is_busy(&self) -> bool {
      matches!(self, Error::Handle(e) if e.is_busy())
   }

   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Handle(e) => e.error_code(),
         Error::InvalidPath(_) => "INVALID_PATH".to_string(),
         Error::ColumnOutOfRange { .. } => "COLUMN_OUT_OF_RANGE".to_string(),
         Error::NoRow => "NO_ROW".to_string(),
         Error::Utf8 { .. } => "INVALID_UTF8".to_string(),
      }
   }
}
