use sqlite_typed::{Database, Error, Step, Value};

fn seeded_db() -> Database {
   let db = Database::open_in_memory().expect("Failed to open in-memory database");
   db.execute_batch(
      "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, weight REAL);
       INSERT INTO items (name, weight) VALUES ('anvil', 50.0);
       INSERT INTO items (name, weight) VALUES ('feather', 0.01);
       INSERT INTO items (name, weight) VALUES ('brick', 2.5);",
   )
   .expect("Failed to seed database");
   db
}

#[test]
fn test_rows_yields_every_row_in_order() {
   let db = seeded_db();
   let mut stmt = db.prepare("SELECT id, name FROM items ORDER BY id").unwrap();

   let rows: Vec<(i64, String)> = stmt.rows().collect::<Result<_, _>>().unwrap();
   assert_eq!(
      rows,
      vec![
         (1, "anvil".to_string()),
         (2, "feather".to_string()),
         (3, "brick".to_string()),
      ]
   );
}

#[test]
fn test_rows_is_single_pass_until_reset() {
   let db = seeded_db();
   let mut stmt = db.prepare("SELECT name FROM items ORDER BY id").unwrap();

   assert_eq!(stmt.rows::<(String,)>().count(), 3);
   assert_eq!(stmt.rows::<(String,)>().count(), 0);
   assert!(stmt.is_done());

   stmt.reset().unwrap();
   let names: Vec<String> = stmt
      .rows::<(String,)>()
      .map(|row| row.map(|(name,)| name))
      .collect::<Result<_, _>>()
      .unwrap();
   assert_eq!(names, vec!["anvil", "feather", "brick"]);
}

#[test]
fn test_rows_after_execute_starts_at_current_row() {
   let db = seeded_db();
   let mut stmt = db
      .execute("SELECT id FROM items WHERE weight > ? ORDER BY id", (1.0,))
      .unwrap();

   let ids: Vec<i64> = stmt
      .rows::<(i64,)>()
      .map(|row| row.map(|(id,)| id))
      .collect::<Result<_, _>>()
      .unwrap();
   assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_rows_is_lazy() {
   let db = seeded_db();
   let mut stmt = db.prepare("SELECT id FROM items ORDER BY id").unwrap();

   let first = stmt.rows::<(i64,)>().next().unwrap().unwrap();
   assert_eq!(first, (1,));

   // The cursor advanced exactly one row; stepping continues from there.
   assert_eq!(stmt.step().unwrap(), Step::Row);
   assert_eq!(stmt.read::<i64>(0).unwrap(), 2);
}

#[test]
fn test_rows_empty_result() {
   let db = seeded_db();
   let mut stmt = db.prepare("SELECT id FROM items WHERE id < 0").unwrap();

   let mut rows = stmt.rows::<(i64,)>();
   assert!(rows.next().is_none());
   assert!(rows.next().is_none());
}

#[test]
fn test_rows_of_values_with_optional_columns() {
   let db = seeded_db();
   db.execute("INSERT INTO items (name, weight) VALUES (?, ?)", ("ghost", None::<f64>))
      .unwrap();

   let mut stmt = db.prepare("SELECT name, weight FROM items ORDER BY id").unwrap();
   let rows: Vec<(Value, Option<f64>)> = stmt.rows().collect::<Result<_, _>>().unwrap();

   assert_eq!(rows.len(), 4);
   assert_eq!(rows[0], (Value::Text("anvil".into()), Some(50.0)));
   assert_eq!(rows[3], (Value::Text("ghost".into()), None));
}

#[test]
fn test_rows_decode_error_is_per_row() {
   let db = Database::open_in_memory().unwrap();
   let mut stmt = db
      .prepare("SELECT CAST(x'ff' AS TEXT) UNION ALL SELECT 'fine'")
      .unwrap();

   let results: Vec<_> = stmt.rows::<(String,)>().collect();
   assert_eq!(results.len(), 2);
   assert!(matches!(results[0], Err(Error::Utf8 { .. })));
   assert_eq!(results[1].as_ref().unwrap(), &("fine".to_string(),));
}

#[test]
fn test_rows_step_error_ends_sequence() {
   let db = Database::open_in_memory().unwrap();
   // abs() of the smallest integer overflows while the second row is produced.
   let mut stmt = db
      .prepare("SELECT abs(v) FROM (SELECT 1 AS v UNION ALL SELECT -9223372036854775808)")
      .unwrap();

   let mut rows = stmt.rows::<(i64,)>();
   assert_eq!(rows.next().unwrap().unwrap(), (1,));
   let err = rows.next().unwrap().unwrap_err();
   assert!(err.code().is_some());
   assert!(rows.next().is_none());
}
