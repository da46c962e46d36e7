//! Typed column extraction.
//!
//! [`Column`] reads one column of the current row as a static type.
//! [`FromRow`] reads a tuple of columns at consecutive indices and
//! [`ReadTargets`] writes them through `&mut` references.
//!
//! Borrowed forms (`&str`, `&[u8]`, `&CStr`, [`NativeValue`]) are windows into
//! engine-owned buffers and are never copied. They borrow the statement, so
//! they cannot outlive the next step or reset. Reading a column as a type that
//! does not match its storage class uses the engine's own conversion rules
//! (for example TEXT `'12'` read as `i64` yields `12`, NULL read as `&str`
//! yields `""`); only `Option<T>` distinguishes NULL.

use std::ffi::CStr;

use sqlite_typed_handle::{NativeValue, StorageClass};

use crate::Result;
use crate::error::Error;
use crate::statement::Statement;
use crate::value::Value;

/// A type that can be read from one column of the current row.
///
/// The same column can be read any number of times and in any form while the
/// row is current: borrowed text, blob and C-string views of one column all
/// share a single engine buffer that later reads do not move.
pub trait Column<'s>: Sized {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self>;
}

impl<'s> Column<'s> for i32 {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_int(index))
   }
}

impl<'s> Column<'s> for i64 {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_int64(index))
   }
}

impl<'s> Column<'s> for f64 {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_double(index))
   }
}

impl<'s> Column<'s> for bool {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_int64(index) != 0)
   }
}

impl<'s> Column<'s> for &'s str {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      let bytes = stmt.current_row(index)?.column_text(index).unwrap_or_default();
      std::str::from_utf8(bytes).map_err(|source| Error::Utf8 { index, source })
   }
}

impl<'s> Column<'s> for String {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      <&str>::read_column(stmt, index).map(str::to_owned)
   }
}

impl<'s> Column<'s> for &'s CStr {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_cstr(index).unwrap_or_default())
   }
}

impl<'s> Column<'s> for &'s [u8] {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      Ok(stmt.current_row(index)?.column_blob(index))
   }
}

impl<'s> Column<'s> for Vec<u8> {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      <&[u8]>::read_column(stmt, index).map(<[u8]>::to_vec)
   }
}

impl<'s> Column<'s> for NativeValue<'s> {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      let count = stmt.column_count();
      stmt
         .current_row(index)?
         .column_value(index)
         .ok_or(Error::ColumnOutOfRange { index, count })
   }
}

impl<'s> Column<'s> for Value {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      let row = stmt.current_row(index)?;
      let value = match row.column_type(index) {
         StorageClass::Null => Value::Null,
         StorageClass::Integer => Value::Integer(row.column_int64(index)),
         StorageClass::Real => Value::Real(row.column_double(index)),
         StorageClass::Text => {
            let bytes = row.column_text(index).unwrap_or_default();
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
         }
         StorageClass::Blob => Value::Blob(row.column_blob(index).to_vec()),
      };
      Ok(value)
   }
}

impl<'s, T: Column<'s>> Column<'s> for Option<T> {
   fn read_column(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
      if stmt.current_row(index)?.column_type(index) == StorageClass::Null {
         return Ok(None);
      }
      T::read_column(stmt, index).map(Some)
   }
}

/// A tuple of column types read from consecutive indices.
///
/// `from_row(stmt, start)` reads the first element from column `start`, the
/// next from `start + 1`, and so on. Callers request types matching the
/// statement's result columns positionally.
pub trait FromRow<'s>: Sized {
   fn from_row(stmt: &'s Statement<'_>, start: usize) -> Result<Self>;
}

/// `&mut` output locations filled from consecutive columns.
///
/// Either a single `&mut T` or a tuple of them.
pub trait ReadTargets<'s> {
   fn read_targets(self, stmt: &'s Statement<'_>, start: usize) -> Result<()>;
}

impl<'s, T: Column<'s>> ReadTargets<'s> for &mut T {
   fn read_targets(self, stmt: &'s Statement<'_>, start: usize) -> Result<()> {
      *self = T::read_column(stmt, start)?;
      Ok(())
   }
}

macro_rules! tuple_columns {
   ($($name:ident : $offset:tt),+) => {
      impl<'s, $($name: Column<'s>),+> FromRow<'s> for ($($name,)+) {
         fn from_row(stmt: &'s Statement<'_>, start: usize) -> Result<Self> {
            Ok(($($name::read_column(stmt, start + $offset)?,)+))
         }
      }

      impl<'s, $($name: Column<'s>),+> ReadTargets<'s> for ($(&mut $name,)+) {
         fn read_targets(self, stmt: &'s Statement<'_>, start: usize) -> Result<()> {
            $(*self.$offset = $name::read_column(stmt, start + $offset)?;)+
            Ok(())
         }
      }
   };
}

tuple_columns!(A: 0);
tuple_columns!(A: 0, B: 1);
tuple_columns!(A: 0, B: 1, C: 2);
tuple_columns!(A: 0, B: 1, C: 2, D: 3);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
tuple_columns!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
