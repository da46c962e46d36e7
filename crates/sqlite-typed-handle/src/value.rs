//! Engine-native values (`sqlite3_value`).

use std::ffi::c_int;
use std::marker::PhantomData;
use std::ptr::NonNull;

use libsqlite3_sys::{self as ffi, sqlite3_value};

use crate::Result;
use crate::error::Error;

/// Storage class of a column or value, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
   Integer,
   Real,
   Text,
   Blob,
   Null,
}

impl StorageClass {
   pub(crate) fn from_raw(code: c_int) -> Self {
      match code {
         ffi::SQLITE_INTEGER => StorageClass::Integer,
         ffi::SQLITE_FLOAT => StorageClass::Real,
         ffi::SQLITE_TEXT => StorageClass::Text,
         ffi::SQLITE_BLOB => StorageClass::Blob,
         _ => StorageClass::Null,
      }
   }

   /// The name SQLite uses for this storage class.
   pub fn name(&self) -> &'static str {
      match self {
         StorageClass::Integer => "INTEGER",
         StorageClass::Real => "REAL",
         StorageClass::Text => "TEXT",
         StorageClass::Blob => "BLOB",
         StorageClass::Null => "NULL",
      }
   }
}

/// A column's engine-native value, borrowed from the statement that produced it.
///
/// This is an unprotected `sqlite3_value`: it is only valid until the next
/// step, reset or finalize of its statement (enforced by the `'s` borrow), and
/// the engine only allows it to be bound elsewhere or duplicated. Use
/// [`duplicate`](Self::duplicate) to inspect its contents.
///
/// The storage class is the one the column had when its row was produced,
/// even if a text view of the column has since been taken.
#[derive(Debug, Clone, Copy)]
pub struct NativeValue<'s> {
   raw: NonNull<sqlite3_value>,
   class: StorageClass,
   _statement: PhantomData<&'s ()>,
}

impl<'s> NativeValue<'s> {
   /// # Safety
   ///
   /// `raw` must stay valid for `'s`.
   pub(crate) unsafe fn from_raw(raw: NonNull<sqlite3_value>, class: StorageClass) -> Self {
      Self {
         raw,
         class,
         _statement: PhantomData,
      }
   }

   pub(crate) fn as_ptr(&self) -> *const sqlite3_value {
      self.raw.as_ptr()
   }

   pub fn storage_class(&self) -> StorageClass {
      self.class
   }

   /// Whether the engine now holds a blob of this value in text form.
   ///
   /// Binding such a value directly would bind it as TEXT.
   pub(crate) fn blob_read_as_text(&self) -> bool {
      // SAFETY: reading the type only inspects the value's flags.
      self.class == StorageClass::Blob
         && unsafe { ffi::sqlite3_value_type(self.raw.as_ptr()) } != ffi::SQLITE_BLOB
   }

   /// Copies the value into a protected, independently owned value.
   ///
   /// # Errors
   ///
   /// Returns `SQLITE_NOMEM` if the engine cannot allocate the copy.
   pub fn duplicate(&self) -> Result<OwnedNativeValue> {
      // SAFETY: raw is valid for 's; sqlite3_value_dup accepts unprotected values.
      let copy = unsafe { ffi::sqlite3_value_dup(self.raw.as_ptr()) };
      match NonNull::new(copy) {
         Some(raw) => Ok(OwnedNativeValue { raw, class: self.class }),
         None => Err(Error::from_code(ffi::SQLITE_NOMEM)),
      }
   }
}

/// A protected copy of an engine-native value, freed on drop.
///
/// [`text`](Self::text) and [`blob`](Self::blob) share one buffer, so views of
/// both can be held at the same time.
#[derive(Debug)]
pub struct OwnedNativeValue {
   raw: NonNull<sqlite3_value>,
   class: StorageClass,
}

// SAFETY: a value produced by sqlite3_value_dup is not tied to any connection.
unsafe impl Send for OwnedNativeValue {}

impl OwnedNativeValue {
   /// Borrows this value so it can be bound like a column's native value.
   pub fn as_native(&self) -> NativeValue<'_> {
      // SAFETY: raw lives as long as self.
      unsafe { NativeValue::from_raw(self.raw, self.class) }
   }

   pub fn storage_class(&self) -> StorageClass {
      self.class
   }

   pub fn int64(&self) -> i64 {
      unsafe { ffi::sqlite3_value_int64(self.raw.as_ptr()) }
   }

   pub fn double(&self) -> f64 {
      unsafe { ffi::sqlite3_value_double(self.raw.as_ptr()) }
   }

   /// The value as UTF-8 text bytes, without the NUL terminator.
   ///
   /// `None` when the value is NULL.
   pub fn text(&self) -> Option<&[u8]> {
      // SAFETY: text must be fetched before bytes so the length describes the
      // UTF-8 representation. Once converted, the buffer does not move again
      // for text or blob reads, and it stays valid while self is borrowed.
      let ptr = unsafe { ffi::sqlite3_value_text(self.raw.as_ptr()) };
      if ptr.is_null() {
         return None;
      }
      let len = unsafe { ffi::sqlite3_value_bytes(self.raw.as_ptr()) }.max(0) as usize;
      Some(unsafe { std::slice::from_raw_parts(ptr, len) })
   }

   /// The value as bytes. NULL and a zero-length blob yield an empty slice.
   pub fn blob(&self) -> &[u8] {
      // Same buffer as the text form, so a live text view is not invalidated.
      if self.text().is_none() {
         return &[];
      }
      let ptr = unsafe { ffi::sqlite3_value_blob(self.raw.as_ptr()) };
      let len = unsafe { ffi::sqlite3_value_bytes(self.raw.as_ptr()) }.max(0) as usize;
      if ptr.is_null() || len == 0 {
         return &[];
      }
      // SAFETY: ptr is non-null and len bytes are valid while self is borrowed.
      unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }
   }
}

impl Drop for OwnedNativeValue {
   fn drop(&mut self) {
      // SAFETY: raw was produced by sqlite3_value_dup and is freed exactly once.
      unsafe { ffi::sqlite3_value_free(self.raw.as_ptr()) };
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_storage_class_from_raw() {
      assert_eq!(StorageClass::from_raw(ffi::SQLITE_INTEGER), StorageClass::Integer);
      assert_eq!(StorageClass::from_raw(ffi::SQLITE_FLOAT), StorageClass::Real);
      assert_eq!(StorageClass::from_raw(ffi::SQLITE_NULL), StorageClass::Null);
      assert_eq!(StorageClass::Blob.name(), "BLOB");
   }
}
