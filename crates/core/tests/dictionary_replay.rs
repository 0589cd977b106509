//! End-to-end replay of catalog redo through the interpreter: dictionary
//! rows arrive as row operations, commits rebuild the derived view, and the
//! whole state round-trips through the checkpoint document.

use oralog::schema::catalog::SystemTable;
use oralog::schema::values::{TableMeta, ValueVector};
use oralog::{
    ColId, DdlError, DictError, FileOffset, Metadata, ObjId, ReplicatorFlags, RowId, Scn, SchemaFilter,
    SystemTransaction,
};

fn rowid(text: &str) -> RowId {
    text.parse().expect("canonical rowid")
}

fn metadata_with_filter() -> Metadata {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut metadata = Metadata::new(ReplicatorFlags::empty());
    metadata.add_filter(SchemaFilter::new("HR", "EMP").unwrap());
    metadata
}

const USER_ROWID: &str = "AAAAAAAAAAAAAAAAAA";
const OBJ_ROWID: &str = "AAAAACAAAAAAAAAAAB";
const TAB_ROWID: &str = "AAAAACAAAAAAAAAAAC";
const COL_ID_ROWID: &str = "AAAAACAAAAAAAAAAAD";
const COL_SAL_ROWID: &str = "AAAAACAAAAAAAAAAAE";

/// S1: a user alone materializes nothing.
fn insert_user(metadata: &mut Metadata) {
    let meta = TableMeta::builtin(SystemTable::User);
    let values = ValueVector::new()
        .with_after(0, b"42")
        .with_after(1, b"HR")
        .with_after(2, b"0");
    SystemTransaction::new(metadata)
        .on_insert(&meta, rowid(USER_ROWID), &values, FileOffset(10))
        .unwrap();
}

/// S2: OBJ$ + TAB$ + two COL$ rows for HR.EMP (obj 100).
fn insert_emp(metadata: &mut Metadata) {
    let obj_meta = TableMeta::builtin(SystemTable::Obj);
    let tab_meta = TableMeta::builtin(SystemTable::Tab);
    let col_meta = TableMeta::builtin(SystemTable::Col);
    let mut tx = SystemTransaction::new(metadata);

    let obj = ValueVector::new()
        .with_after(0, b"100")
        .with_after(1, b"100")
        .with_after(2, b"42")
        .with_after(3, b"EMP")
        .with_after(4, b"2")
        .with_after(5, b"0");
    tx.on_insert(&obj_meta, rowid(OBJ_ROWID), &obj, FileOffset(20)).unwrap();

    let tab = ValueVector::new()
        .with_after(0, b"100")
        .with_after(1, b"100")
        .with_after(2, b"1")
        .with_after(3, b"0")
        .with_after(4, b"0")
        .with_after(5, b"0");
    tx.on_insert(&tab_meta, rowid(TAB_ROWID), &tab, FileOffset(21)).unwrap();

    let col_id = ValueVector::new()
        .with_after(0, b"100")
        .with_after(1, b"1")
        .with_after(2, b"1")
        .with_after(3, b"1")
        .with_after(4, b"ID")
        .with_after(5, b"2")
        .with_after(6, b"22")
        .with_after(7, b"10")
        .with_after(8, b"0");
    tx.on_insert(&col_meta, rowid(COL_ID_ROWID), &col_id, FileOffset(22)).unwrap();

    let col_sal = ValueVector::new()
        .with_after(0, b"100")
        .with_after(1, b"2")
        .with_after(2, b"2")
        .with_after(3, b"2")
        .with_after(4, b"SAL")
        .with_after(5, b"2")
        .with_after(6, b"22")
        .with_after(7, b"10")
        .with_after(8, b"2");
    tx.on_insert(&col_meta, rowid(COL_SAL_ROWID), &col_sal, FileOffset(23)).unwrap();
}

#[test]
fn user_without_objects_materializes_nothing() {
    let mut metadata = metadata_with_filter();
    insert_user(&mut metadata);
    let reader = metadata.schema.reader();
    SystemTransaction::new(&mut metadata).commit(Scn(999));
    assert!(reader.is_empty());
}

#[test]
fn full_table_materializes_at_commit() {
    let mut metadata = metadata_with_filter();
    insert_user(&mut metadata);
    insert_emp(&mut metadata);
    let reader = metadata.schema.reader();
    SystemTransaction::new(&mut metadata).commit(Scn(1000));

    let table = reader.lookup_table(ObjId(100)).expect("HR.EMP built");
    assert_eq!(table.qualified_name(), "HR.EMP");
    assert_eq!(metadata.schema.scn(), Scn(1000));

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_ref()).collect();
    assert_eq!(names, ["ID", "SAL"]);
    let id = table.column_by_name("ID").unwrap();
    assert_eq!((id.precision, id.scale, id.length), (10, 0, 22));
    let sal = table.column_by_name("SAL").unwrap();
    assert_eq!((sal.precision, sal.scale), (10, 2));
    assert_eq!(table.columns[0].int_col, ColId(1));
    assert_eq!(table.columns[1].int_col, ColId(2));
}

#[test]
fn column_update_rebuilds_only_affected_table() {
    let mut metadata = metadata_with_filter();
    insert_user(&mut metadata);
    insert_emp(&mut metadata);
    let reader = metadata.schema.reader();
    SystemTransaction::new(&mut metadata).commit(Scn(1000));

    let col_meta = TableMeta::builtin(SystemTable::Col);
    let precision = ValueVector::new().with(7, Some(b"10"), Some(b"12"));
    let mut tx = SystemTransaction::new(&mut metadata);
    tx.on_update(&col_meta, rowid(COL_SAL_ROWID), &precision, FileOffset(30)).unwrap();
    tx.commit(Scn(1001));

    let table = reader.lookup_table(ObjId(100)).expect("rebuilt");
    let sal = table.column_by_name("SAL").unwrap();
    assert_eq!(sal.precision, 12);
    let id = table.column_by_name("ID").unwrap();
    assert_eq!(id.precision, 10);
    assert_eq!(metadata.schema.scn(), Scn(1001));
}

#[test]
fn dropping_the_object_row_drops_the_table() {
    let mut metadata = metadata_with_filter();
    insert_user(&mut metadata);
    insert_emp(&mut metadata);
    let reader = metadata.schema.reader();
    SystemTransaction::new(&mut metadata).commit(Scn(1000));
    assert!(reader.lookup_table(ObjId(100)).is_some());

    let obj_meta = TableMeta::builtin(SystemTable::Obj);
    let mut tx = SystemTransaction::new(&mut metadata);
    tx.on_delete(&obj_meta, rowid(OBJ_ROWID), &ValueVector::new(), FileOffset(40)).unwrap();
    tx.commit(Scn(1002));

    assert!(reader.lookup_table(ObjId(100)).is_none());
    assert!(reader.is_empty());
}

#[test]
fn adaptive_mode_replaces_duplicate_insert_strict_mode_fails() {
    let meta = TableMeta::builtin(SystemTable::User);
    let values = ValueVector::new().with_after(0, b"42").with_after(1, b"HR");

    let mut strict = Metadata::new(ReplicatorFlags::empty());
    let mut tx = SystemTransaction::new(&mut strict);
    tx.on_insert(&meta, rowid(USER_ROWID), &values, FileOffset(50)).unwrap();
    let err = tx.on_insert(&meta, rowid(USER_ROWID), &values, FileOffset(51)).unwrap_err();
    assert!(matches!(err, DictError::Ddl(DdlError::DuplicateRow { .. })));

    let mut adaptive = Metadata::new(ReplicatorFlags::ADAPTIVE_SCHEMA);
    let replacement = ValueVector::new().with_after(0, b"42").with_after(1, b"HR2");
    let mut tx = SystemTransaction::new(&mut adaptive);
    tx.on_insert(&meta, rowid(USER_ROWID), &values, FileOffset(50)).unwrap();
    tx.on_insert(&meta, rowid(USER_ROWID), &replacement, FileOffset(51)).unwrap();
}

/// S6: serialize, restart, deserialize; the rebuilt state matches.
#[test]
fn checkpoint_roundtrip_restores_state() {
    let mut metadata = metadata_with_filter();
    insert_user(&mut metadata);
    insert_emp(&mut metadata);
    SystemTransaction::new(&mut metadata).commit(Scn(1001));

    let saved = metadata.save_checkpoint().unwrap();

    let mut restarted = metadata_with_filter();
    restarted.load_checkpoint(&saved).unwrap();

    assert_eq!(restarted.schema.scn(), Scn(1001));
    let before = metadata.schema.reader().iterate_tables();
    let after = restarted.schema.reader().iterate_tables();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(**b, **a);
    }
    // And the rebuilt state serializes identically: no diffs pending.
    assert_eq!(saved, restarted.save_checkpoint().unwrap());
}

/// An insert followed by updates settles to the same state regardless of
/// which update carried which column (adaptive mode permits reordering).
#[test]
fn update_order_converges_to_same_checkpoint() {
    let col_meta = TableMeta::builtin(SystemTable::Col);

    let run = |orders: &[(u16, &[u8])]| {
        let mut metadata = Metadata::new(ReplicatorFlags::ADAPTIVE_SCHEMA);
        let mut tx = SystemTransaction::new(&mut metadata);
        tx.on_insert(
            &col_meta,
            rowid(COL_ID_ROWID),
            &ValueVector::new().with_after(0, b"100").with_after(3, b"1"),
            FileOffset(60),
        )
        .unwrap();
        for (pos, value) in orders {
            let values = ValueVector::new().with_after(*pos, value);
            tx.on_update(&col_meta, rowid(COL_ID_ROWID), &values, FileOffset(61)).unwrap();
        }
        metadata.save_checkpoint().unwrap()
    };

    let forward = run(&[(4, b"ID"), (7, b"12"), (8, b"3")]);
    let reversed = run(&[(8, b"3"), (7, b"12"), (4, b"ID")]);
    assert_eq!(forward, reversed);
}
