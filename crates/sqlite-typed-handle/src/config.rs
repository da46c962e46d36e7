//! Configuration for opening SQLite database handles

use std::ffi::c_int;

use libsqlite3_sys as ffi;
use serde::{Deserialize, Serialize};

/// Configuration applied when a database handle is opened
///
/// # Examples
///
/// ```
/// use sqlite_typed_handle::OpenConfig;
///
/// // Use defaults (read-write, created when missing)
/// let config = OpenConfig::default();
///
/// // Override just the fields you care about
/// let config = OpenConfig {
///     read_only: true,
///     busy_timeout_ms: Some(250),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenConfig {
   /// Open the database read-only
   ///
   /// Default: false
   pub read_only: bool,

   /// Create the database file when it does not exist
   ///
   /// Ignored when `read_only` is set, since the engine cannot create a file
   /// through a read-only handle.
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// Interpret the path as a `file:` URI
   ///
   /// Default: false
   pub uri: bool,

   /// How long a step waits on a locked database before reporting busy
   ///
   /// `None` leaves the engine default, which reports busy immediately.
   ///
   /// Default: None
   pub busy_timeout_ms: Option<u32>,
}

impl Default for OpenConfig {
   fn default() -> Self {
      Self {
         read_only: false,
         create_if_missing: true,
         uri: false,
         busy_timeout_ms: None,
      }
   }
}

impl OpenConfig {
   /// The `sqlite3_open_v2` flags for this configuration.
   pub fn flags(&self) -> c_int {
      let mut flags = if self.read_only {
         ffi::SQLITE_OPEN_READONLY
      } else if self.create_if_missing {
         ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
      } else {
         ffi::SQLITE_OPEN_READWRITE
      };
      if self.uri {
         flags |= ffi::SQLITE_OPEN_URI;
      }
      flags
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_default_flags() {
      let flags = OpenConfig::default().flags();
      assert_eq!(flags, ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE);
   }

   #[test]
   fn test_read_only_ignores_create() {
      let config = OpenConfig {
         read_only: true,
         create_if_missing: true,
         ..Default::default()
      };
      assert_eq!(config.flags(), ffi::SQLITE_OPEN_READONLY);
   }

   #[test]
   fn test_uri_flag() {
      let config = OpenConfig {
         uri: true,
         create_if_missing: false,
         ..Default::default()
      };
      assert_eq!(config.flags(), ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_URI);
   }

   #[test]
   fn test_deserialize_partial() {
      let config: OpenConfig = serde_json::from_str(r#"{"busy_timeout_ms": 500}"#).unwrap();
      assert_eq!(
         config,
         OpenConfig {
            busy_timeout_ms: Some(500),
            ..Default::default()
         }
      );
   }
}
