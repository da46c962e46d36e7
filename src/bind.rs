//! Typed positional parameter binding.
//!
//! [`Bind`] maps one value kind to the engine's matching bind primitive.
//! [`Params`] binds a heterogeneous sequence of values at consecutive
//! positions: tuples for a fixed mix of types, slices, arrays and vectors for a
//! runtime-length list of one type (including `&dyn Bind` and [`Value`]).
//!
//! Text and blob values are copied by the engine during the bind call, so the
//! caller's buffer may be dropped or reused as soon as the bind returns.

use std::ffi::{CStr, CString};

use sqlite_typed_handle::NativeValue;

use crate::Result;
use crate::statement::Statement;
use crate::value::Value;

/// A value that can be bound to one positional (1-based) parameter.
///
/// Engine rejections, such as an index past the last parameter, come back
/// as the engine's own status code.
pub trait Bind {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()>;
}

/// SQL NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// UTF-16 text in native byte order, bound through the engine's text16 primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf16<'a>(pub &'a [u16]);

impl Bind for i32 {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_int(index, *self)?)
   }
}

impl Bind for i64 {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_int64(index, *self)?)
   }
}

impl Bind for f64 {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_double(index, *self)?)
   }
}

// SQLite has no boolean storage class; booleans are stored as INTEGER 0/1.
impl Bind for bool {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_int(index, i32::from(*self))?)
   }
}

impl Bind for str {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_text(index, self.as_bytes())?)
   }
}

impl Bind for String {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      self.as_str().bind_to(stmt, index)
   }
}

impl Bind for CStr {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_cstr(index, self)?)
   }
}

impl Bind for CString {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      self.as_c_str().bind_to(stmt, index)
   }
}

impl Bind for [u8] {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_blob(index, self)?)
   }
}

impl<const N: usize> Bind for [u8; N] {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      self.as_slice().bind_to(stmt, index)
   }
}

impl Bind for Vec<u8> {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      self.as_slice().bind_to(stmt, index)
   }
}

impl Bind for Utf16<'_> {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_text16(index, self.0)?)
   }
}

impl Bind for NativeValue<'_> {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_value(index, *self)?)
   }
}

impl Bind for Null {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      Ok(stmt.handle_mut().bind_null(index)?)
   }
}

impl<T: Bind> Bind for Option<T> {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      match self {
         Some(value) => value.bind_to(stmt, index),
         None => Null.bind_to(stmt, index),
      }
   }
}

impl Bind for Value {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      match self {
         Value::Null => Null.bind_to(stmt, index),
         Value::Integer(i) => i.bind_to(stmt, index),
         Value::Real(r) => r.bind_to(stmt, index),
         Value::Text(s) => s.bind_to(stmt, index),
         Value::Blob(b) => b.bind_to(stmt, index),
      }
   }
}

impl<T: Bind + ?Sized> Bind for &T {
   fn bind_to(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
      (**self).bind_to(stmt, index)
   }
}

/// A sequence of values bound at consecutive positions.
///
/// `bind_params(stmt, start)` binds the first value at `start`, the next at
/// `start + 1`, and so on. The empty tuple binds nothing.
pub trait Params {
   fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()>;
}

impl Params for () {
   fn bind_params(&self, _stmt: &mut Statement<'_>, _start: usize) -> Result<()> {
      Ok(())
   }
}

impl<T: Bind> Params for [T] {
   fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()> {
      for (offset, value) in self.iter().enumerate() {
         value.bind_to(stmt, start + offset)?;
      }
      Ok(())
   }
}

impl<T: Bind, const N: usize> Params for [T; N] {
   fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()> {
      self.as_slice().bind_params(stmt, start)
   }
}

impl<T: Bind> Params for Vec<T> {
   fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()> {
      self.as_slice().bind_params(stmt, start)
   }
}

impl<P: Params + ?Sized> Params for &P {
   fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()> {
      (**self).bind_params(stmt, start)
   }
}

macro_rules! tuple_params {
   ($($name:ident : $offset:tt),+) => {
      impl<$($name: Bind),+> Params for ($($name,)+) {
         fn bind_params(&self, stmt: &mut Statement<'_>, start: usize) -> Result<()> {
            $(self.$offset.bind_to(stmt, start + $offset)?;)+
            Ok(())
         }
      }
   };
}

tuple_params!(A: 0);
tuple_params!(A: 0, B: 1);
tuple_params!(A: 0, B: 1, C: 2);
tuple_params!(A: 0, B: 1, C: 2, D: 3);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
tuple_params!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
