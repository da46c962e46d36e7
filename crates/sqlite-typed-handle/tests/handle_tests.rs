use sqlite_typed_handle::{DbHandle, Error, OpenConfig, Step, StmtHandle, StorageClass, status};
use tempfile::TempDir;

fn memory_db() -> DbHandle {
   DbHandle::open(":memory:", &OpenConfig::default()).expect("Failed to open in-memory database")
}

// ============================================================================
// Open / close
// ============================================================================

#[test]
fn test_open_creates_file() {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("created.db");
   let path = path.to_str().unwrap();

   let mut db = DbHandle::open(path, &OpenConfig::default()).unwrap();
   assert!(db.is_open());
   assert_eq!(db.path(), path);
   db.close().unwrap();

   assert!(std::path::Path::new(path).exists());
}

#[test]
fn test_open_missing_file_without_create_fails() {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("missing.db");

   let config = OpenConfig {
      create_if_missing: false,
      ..Default::default()
   };
   let err = DbHandle::open(path.to_str().unwrap(), &config).unwrap_err();

   match &err {
      Error::Open { path: p, code, .. } => {
         assert!(p.ends_with("missing.db"));
         assert_eq!(*code & 0xff, status::SQLITE_CANTOPEN);
      }
      other => panic!("expected Error::Open, got {:?}", other),
   }
   assert_eq!(err.error_code(), "SQLITE_CANTOPEN");
   assert!(!path.exists());
}

#[test]
fn test_open_in_missing_directory_fails() {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("no").join("such").join("dir.db");

   let result = DbHandle::open(path.to_str().unwrap(), &OpenConfig::default());
   assert!(matches!(result, Err(Error::Open { .. })));
}

#[test]
fn test_read_only_rejects_writes() {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("ro.db");
   let path = path.to_str().unwrap();

   {
      let db = DbHandle::open(path, &OpenConfig::default()).unwrap();
      let mut stmt = StmtHandle::prepare(&db, "CREATE TABLE t (x INTEGER)").unwrap();
      assert_eq!(stmt.step().unwrap(), Step::Done);
   }

   let config = OpenConfig {
      read_only: true,
      ..Default::default()
   };
   let db = DbHandle::open(path, &config).unwrap();
   let mut stmt = StmtHandle::prepare(&db, "INSERT INTO t VALUES (1)").unwrap();
   let err = stmt.step().unwrap_err();
   assert_eq!(err.code(), Some(status::SQLITE_READONLY));
   assert_eq!(stmt.last_status() & 0xff, status::SQLITE_READONLY);
}

#[test]
fn test_prepare_on_closed_database() {
   let mut db = memory_db();
   db.close().unwrap();

   let result = StmtHandle::prepare(&db, "SELECT 1");
   assert!(matches!(result, Err(Error::DatabaseClosed)));
}

// ============================================================================
// Prepare
// ============================================================================

#[test]
fn test_prepare_invalid_sql() {
   let db = memory_db();

   let err = StmtHandle::prepare(&db, "SELEKT 1").unwrap_err();
   match &err {
      Error::Prepare { sql, code, message } => {
         assert_eq!(sql, "SELEKT 1");
         assert_eq!(*code, status::SQLITE_ERROR);
         assert!(message.contains("SELEKT"), "unexpected message: {}", message);
      }
      other => panic!("expected Error::Prepare, got {:?}", other),
   }
}

#[test]
fn test_prepare_empty_sql() {
   let db = memory_db();

   let err = StmtHandle::prepare(&db, "  -- nothing here\n").unwrap_err();
   assert!(matches!(err, Error::Prepare { code, .. } if code == status::SQLITE_MISUSE));
}

#[test]
fn test_prepare_next_returns_tail() {
   let db = memory_db();

   let (stmt, rest) = StmtHandle::prepare_next(&db, "SELECT 1; SELECT 2;").unwrap();
   assert_eq!(stmt.unwrap().sql(), Some("SELECT 1;"));
   assert_eq!(rest, " SELECT 2;");

   let (stmt, rest) = StmtHandle::prepare_next(&db, "   ").unwrap();
   assert!(stmt.is_none());
   assert_eq!(rest, "");
}

// ============================================================================
// Bind / step / column
// ============================================================================

#[test]
fn test_step_reset_and_last_status() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT 7").unwrap();
   assert_eq!(stmt.last_status(), status::SQLITE_OK);

   assert_eq!(stmt.step().unwrap(), Step::Row);
   assert_eq!(stmt.last_status(), status::SQLITE_ROW);
   assert_eq!(stmt.column_int(0), 7);
   assert_eq!(stmt.step().unwrap(), Step::Done);
   assert_eq!(stmt.last_status(), status::SQLITE_DONE);

   stmt.reset().unwrap();
   assert_eq!(stmt.step().unwrap(), Step::Row);
   assert_eq!(stmt.column_int64(0), 7);
}

#[test]
fn test_bind_out_of_range_reports_engine_code() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT ?").unwrap();
   assert_eq!(stmt.parameter_count(), 1);

   let err = stmt.bind_int(2, 1).unwrap_err();
   assert_eq!(err.code(), Some(status::SQLITE_RANGE));

   let err = stmt.bind_int(usize::MAX, 1).unwrap_err();
   assert!(matches!(err, Error::IndexOverflow(usize::MAX)));
}

#[test]
fn test_text_and_blob_columns() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT ?, ?, ?, ?").unwrap();
   stmt.bind_text(1, "héllo".as_bytes()).unwrap();
   stmt.bind_blob(2, &[1, 2, 3]).unwrap();
   stmt.bind_blob(3, &[]).unwrap();
   stmt.bind_null(4).unwrap();
   assert_eq!(stmt.step().unwrap(), Step::Row);

   assert_eq!(stmt.column_type(0), StorageClass::Text);
   assert_eq!(stmt.column_text(0), Some("héllo".as_bytes()));
   assert_eq!(stmt.column_bytes(0), "héllo".len());

   assert_eq!(stmt.column_type(1), StorageClass::Blob);
   assert_eq!(stmt.column_blob(1), &[1, 2, 3]);

   // A zero-length blob keeps its storage class
   assert_eq!(stmt.column_type(2), StorageClass::Blob);
   assert!(stmt.column_blob(2).is_empty());

   assert_eq!(stmt.column_type(3), StorageClass::Null);
   assert_eq!(stmt.column_text(3), None);
   assert_eq!(stmt.column_cstr(3), None);
}

#[test]
fn test_text16_binds_as_text() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT ?").unwrap();
   let wide: Vec<u16> = "wide ✓".encode_utf16().collect();
   stmt.bind_text16(1, &wide).unwrap();
   assert_eq!(stmt.step().unwrap(), Step::Row);

   assert_eq!(stmt.column_text(0), Some("wide ✓".as_bytes()));
}

#[test]
fn test_column_views_share_one_buffer() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT randomblob(64), 12345").unwrap();
   assert_eq!(stmt.step().unwrap(), Step::Row);

   let blob = stmt.column_blob(0);
   let text = stmt.column_text(0).unwrap();
   let cstr = stmt.column_cstr(0).unwrap();
   let again = stmt.column_blob(0);

   assert_eq!(blob.len(), 64);
   assert_eq!(text.as_ptr(), blob.as_ptr());
   assert_eq!(cstr.as_ptr() as *const u8, blob.as_ptr());
   assert_eq!(again.as_ptr(), blob.as_ptr());
   assert_eq!(blob, again);
   assert_eq!(stmt.column_type(0), StorageClass::Blob);

   // A number read as bytes first is rendered as text once.
   let digits = stmt.column_blob(1);
   let digits_text = stmt.column_text(1).unwrap();
   assert_eq!(digits, b"12345");
   assert_eq!(digits_text.as_ptr(), digits.as_ptr());
   assert_eq!(stmt.column_type(1), StorageClass::Integer);
   assert_eq!(stmt.column_int64(1), 12345);
}

#[test]
fn test_native_value_keeps_blob_class_after_text_view() {
   let db = memory_db();
   let mut source = StmtHandle::prepare(&db, "SELECT x'00ff'").unwrap();
   assert_eq!(source.step().unwrap(), Step::Row);
   assert_eq!(source.column_text(0), Some(&[0x00, 0xff][..]));

   let value = source.column_value(0).unwrap();
   assert_eq!(value.storage_class(), StorageClass::Blob);

   let owned = value.duplicate().unwrap();
   assert_eq!(owned.storage_class(), StorageClass::Blob);
   let text = owned.text().unwrap();
   let blob = owned.blob();
   assert_eq!(text.as_ptr(), blob.as_ptr());
   assert_eq!(blob, &[0x00, 0xff]);

   let mut target = StmtHandle::prepare(&db, "SELECT typeof(?)").unwrap();
   target.bind_value(1, value).unwrap();
   assert_eq!(target.step().unwrap(), Step::Row);
   assert_eq!(target.column_text(0), Some(&b"blob"[..]));
}

#[test]
fn test_native_value_copies_between_statements() {
   let db = memory_db();
   let mut source = StmtHandle::prepare(&db, "SELECT x'00ff'").unwrap();
   let mut echo = StmtHandle::prepare(&db, "SELECT ?").unwrap();

   assert_eq!(source.step().unwrap(), Step::Row);
   let value = source.column_value(0).unwrap();
   let owned = value.duplicate().unwrap();
   echo.bind_value(1, value).unwrap();

   assert_eq!(owned.storage_class(), StorageClass::Blob);
   assert_eq!(owned.blob(), &[0x00, 0xff]);

   assert_eq!(echo.step().unwrap(), Step::Row);
   assert_eq!(echo.column_blob(0), &[0x00, 0xff]);
}

#[test]
fn test_column_names_and_out_of_range() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT 1 AS one, 'two' AS two").unwrap();
   assert_eq!(stmt.step().unwrap(), Step::Row);

   assert_eq!(stmt.column_count(), 2);
   assert_eq!(stmt.column_name(0), Some("one"));
   assert_eq!(stmt.column_name(1), Some("two"));
   assert_eq!(stmt.column_name(2), None);
   assert_eq!(stmt.column_int64(5), 0);
   assert!(stmt.column_value(5).is_none());
}

#[test]
fn test_finalize_is_idempotent() {
   let db = memory_db();
   let mut stmt = StmtHandle::prepare(&db, "SELECT 1").unwrap();

   stmt.finalize().unwrap();
   assert!(!stmt.is_live());
   stmt.finalize().unwrap();

   let err = stmt.step().unwrap_err();
   assert_eq!(err.code(), Some(status::SQLITE_MISUSE));
   assert_eq!(stmt.column_count(), 0);
}

#[test]
fn test_changes_and_last_insert_rowid() {
   let db = memory_db();
   let mut create = StmtHandle::prepare(&db, "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)").unwrap();
   create.step().unwrap();

   let mut insert = StmtHandle::prepare(&db, "INSERT INTO t (v) VALUES ('a'), ('b')").unwrap();
   assert_eq!(insert.step().unwrap(), Step::Done);

   assert_eq!(db.changes().unwrap(), 2);
   assert_eq!(db.last_insert_rowid().unwrap(), 2);
}
