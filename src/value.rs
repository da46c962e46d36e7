//! Owned, dynamically typed SQLite values.

use serde_json::Value as JsonValue;
use sqlite_typed_handle::{NativeValue, OwnedNativeValue, StorageClass};

use crate::Result;

/// A column or parameter value with its SQLite storage class.
///
/// Used where the type is only known at runtime: reading a column of any
/// storage class, binding a runtime-typed parameter list, or rendering a row
/// as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
   Null,
   Integer(i64),
   Real(f64),
   Text(String),
   Blob(Vec<u8>),
}

impl Value {
   /// Copies an engine-native value out of its statement.
   pub fn from_native(value: NativeValue<'_>) -> Result<Self> {
      Ok(Self::from_owned_native(&value.duplicate()?))
   }

   pub(crate) fn from_owned_native(value: &OwnedNativeValue) -> Self {
      match value.storage_class() {
         StorageClass::Null => Value::Null,
         StorageClass::Integer => Value::Integer(value.int64()),
         StorageClass::Real => Value::Real(value.double()),
         StorageClass::Text => match value.text() {
            Some(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            None => Value::Null,
         },
         StorageClass::Blob => Value::Blob(value.blob().to_vec()),
      }
   }

   /// Returns true if this value is null.
   pub fn is_null(&self) -> bool {
      matches!(self, Value::Null)
   }

   /// The storage class this value binds as.
   pub fn storage_class(&self) -> StorageClass {
      match self {
         Value::Null => StorageClass::Null,
         Value::Integer(_) => StorageClass::Integer,
         Value::Real(_) => StorageClass::Real,
         Value::Text(_) => StorageClass::Text,
         Value::Blob(_) => StorageClass::Blob,
      }
   }

   /// Attempts to get this value as an integer.
   pub fn as_integer(&self) -> Option<i64> {
      match self {
         Value::Integer(i) => Some(*i),
         _ => None,
      }
   }

   /// Attempts to get this value as a float.
   pub fn as_real(&self) -> Option<f64> {
      match self {
         Value::Real(r) => Some(*r),
         _ => None,
      }
   }

   /// Attempts to get this value as a string reference.
   pub fn as_text(&self) -> Option<&str> {
      match self {
         Value::Text(s) => Some(s),
         _ => None,
      }
   }

   /// Attempts to get this value as a blob reference.
   pub fn as_blob(&self) -> Option<&[u8]> {
      match self {
         Value::Blob(b) => Some(b),
         _ => None,
      }
   }

   /// Convert to a JSON value.
   ///
   /// BLOB values become base64-encoded strings since JSON has no binary
   /// type. Non-finite reals become `null`.
   pub fn to_json(&self) -> JsonValue {
      match self {
         Value::Null => JsonValue::Null,
         Value::Integer(i) => JsonValue::Number((*i).into()),
         Value::Real(r) => JsonValue::from(*r),
         Value::Text(s) => JsonValue::String(s.clone()),
         Value::Blob(b) => JsonValue::String(base64_encode(b)),
      }
   }
}

impl From<i64> for Value {
   fn from(value: i64) -> Self {
      Value::Integer(value)
   }
}

impl From<i32> for Value {
   fn from(value: i32) -> Self {
      Value::Integer(value.into())
   }
}

impl From<f64> for Value {
   fn from(value: f64) -> Self {
      Value::Real(value)
   }
}

impl From<String> for Value {
   fn from(value: String) -> Self {
      Value::Text(value)
   }
}

impl From<&str> for Value {
   fn from(value: &str) -> Self {
      Value::Text(value.to_string())
   }
}

impl From<Vec<u8>> for Value {
   fn from(value: Vec<u8>) -> Self {
      Value::Blob(value)
   }
}

impl<T: Into<Value>> From<Option<T>> for Value {
   fn from(value: Option<T>) -> Self {
      value.map_or(Value::Null, Into::into)
   }
}

fn base64_encode(data: &[u8]) -> String {
   use base64::Engine;
   base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn test_to_json_scalars() {
      assert_eq!(Value::Null.to_json(), JsonValue::Null);
      assert_eq!(Value::Integer(-7).to_json(), json!(-7));
      assert_eq!(Value::Real(1.5).to_json(), json!(1.5));
      assert_eq!(Value::Text("hi".into()).to_json(), json!("hi"));
   }

   #[test]
   fn test_to_json_non_finite_real() {
      assert_eq!(Value::Real(f64::NAN).to_json(), JsonValue::Null);
   }

   #[test]
   fn test_to_json_blob_is_base64() {
      assert_eq!(Value::Blob(b"hello".to_vec()).to_json(), json!("aGVsbG8="));
      assert_eq!(Value::Blob(vec![0, 0, 0]).to_json(), json!("AAAA"));
      assert_eq!(Value::Blob(Vec::new()).to_json(), json!(""));
   }

   #[test]
   fn test_accessors() {
      let value = Value::from("text");
      assert_eq!(value.as_text(), Some("text"));
      assert_eq!(value.as_integer(), None);
      assert_eq!(value.storage_class(), StorageClass::Text);

      assert!(Value::from(None::<i64>).is_null());
      assert_eq!(Value::from(Some(3_i32)).as_integer(), Some(3));
      assert_eq!(Value::from(vec![1_u8]).as_blob(), Some(&[1_u8][..]));
      assert_eq!(Value::from(2.0).as_real(), Some(2.0));
   }
}
