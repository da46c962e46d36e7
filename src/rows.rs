//! Lazy, single-pass iteration over a statement's result rows.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::Result;
use crate::column::FromRow;
use crate::statement::{State, Statement, Step};

/// Iterator over a statement's rows, decoded as `T`.
///
/// Created by [`Statement::rows`]. Holds the statement's cursor exclusively
/// while alive, so only one sequence can run over a statement at a time.
///
/// Stepping errors are yielded once and end the sequence. Decoding errors
/// (for example invalid UTF-8) are yielded for that row only.
#[derive(Debug)]
pub struct Rows<'s, 'db, T> {
   stmt: &'s mut Statement<'db>,
   pending: bool,
   failed: bool,
   _row: PhantomData<fn() -> T>,
}

impl<'s, 'db, T> Rows<'s, 'db, T> {
   pub(crate) fn new(stmt: &'s mut Statement<'db>) -> Self {
      let pending = stmt.state() == State::HasRow;
      Self {
         stmt,
         pending,
         failed: false,
         _row: PhantomData,
      }
   }
}

impl<T> Iterator for Rows<'_, '_, T>
where
   T: for<'r> FromRow<'r>,
{
   type Item = Result<T>;

   fn next(&mut self) -> Option<Self::Item> {
      if self.failed {
         return None;
      }

      if self.pending {
         self.pending = false;
      } else {
         match self.stmt.step() {
            Ok(Step::Row) => {}
            Ok(Step::Done) => return None,
            Err(e) => {
               self.failed = true;
               return Some(Err(e));
            }
         }
      }

      Some(self.stmt.read_row::<T>())
   }
}

impl<T> FusedIterator for Rows<'_, '_, T> where T: for<'r> FromRow<'r> {}
