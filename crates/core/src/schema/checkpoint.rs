//! The checkpoint schema document: a JSON object with a version header,
//! the commit SCN, one array per mirrored catalog table (records keyed by
//! their source column names plus the rowid string) and the derived
//! `schema` array.
//!
//! Loading validates the version header, repopulates the row mirror through
//! the ordinary store path (rebuilding every index), and leaves the forced
//! derived-view rebuild to the caller; the persisted `schema` array is
//! informational.

use std::path::Path;

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use oralog_primitives::Scn;

use crate::error::CheckpointError;

use super::catalog::{
    SysCCol, SysCDef, SysCol, SysDeferredStg, SysECol, SysLob, SysLobCompPart, SysLobFrag, SysObj, SysSeg, SysTab,
    SysTabComPart, SysTabPart, SysTabSubPart, SysTs, SysUser,
};
use super::derived::Table;
use super::store::{SysRecord, SysStore};
use super::Schema;

/// Build constant the file's version header must equal.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    #[serde(rename = "schema-version")]
    version: String,
    scn: Scn,
    #[serde(rename = "sys-ccol")]
    ccol: Vec<SysCCol>,
    #[serde(rename = "sys-cdef")]
    cdef: Vec<SysCDef>,
    #[serde(rename = "sys-col")]
    col: Vec<SysCol>,
    #[serde(rename = "sys-deferredstg")]
    deferred_stg: Vec<SysDeferredStg>,
    #[serde(rename = "sys-ecol")]
    ecol: Vec<SysECol>,
    #[serde(rename = "sys-lob")]
    lob: Vec<SysLob>,
    #[serde(rename = "sys-lobcomppart")]
    lob_comp_part: Vec<SysLobCompPart>,
    #[serde(rename = "sys-lobfrag")]
    lob_frag: Vec<SysLobFrag>,
    #[serde(rename = "sys-obj")]
    obj: Vec<SysObj>,
    #[serde(rename = "sys-seg")]
    seg: Vec<SysSeg>,
    #[serde(rename = "sys-tab")]
    tab: Vec<SysTab>,
    #[serde(rename = "sys-tabcompart")]
    tab_com_part: Vec<SysTabComPart>,
    #[serde(rename = "sys-tabpart")]
    tab_part: Vec<SysTabPart>,
    #[serde(rename = "sys-tabsubpart")]
    tab_sub_part: Vec<SysTabSubPart>,
    #[serde(rename = "sys-ts")]
    ts: Vec<SysTs>,
    #[serde(rename = "sys-user")]
    user: Vec<SysUser>,
    schema: Vec<Table>,
}

fn sorted_rows<R: SysRecord>(store: &SysStore<R>) -> Vec<R> {
    store.iter().cloned().sorted_by_key(SysRecord::row_id).collect()
}

fn restore_rows<R: SysRecord>(store: &mut SysStore<R>, rows: Vec<R>) -> Result<(), CheckpointError> {
    for row in rows {
        store.add(row).map_err(|row| CheckpointError::DuplicateRowId {
            table: R::TABLE,
            row_id: row.row_id(),
        })?;
    }
    Ok(())
}

pub fn to_json(schema: &Schema) -> Result<String, CheckpointError> {
    log::trace!(target: "system", "writing schema checkpoint ({} objects, {} columns)", schema.obj.len(), schema.col.len());
    let file = SchemaFile {
        version: SCHEMA_VERSION.to_string(),
        scn: schema.scn,
        ccol: sorted_rows(&schema.ccol),
        cdef: sorted_rows(&schema.cdef),
        col: sorted_rows(&schema.col),
        deferred_stg: sorted_rows(&schema.deferred_stg),
        ecol: sorted_rows(&schema.ecol),
        lob: sorted_rows(&schema.lob),
        lob_comp_part: sorted_rows(&schema.lob_comp_part),
        lob_frag: sorted_rows(&schema.lob_frag),
        obj: sorted_rows(&schema.obj),
        seg: sorted_rows(&schema.seg),
        tab: sorted_rows(&schema.tab),
        tab_com_part: sorted_rows(&schema.tab_com_part),
        tab_part: sorted_rows(&schema.tab_part),
        tab_sub_part: sorted_rows(&schema.tab_sub_part),
        ts: sorted_rows(&schema.ts),
        user: sorted_rows(&schema.user),
        schema: schema.derived.read().values().map(|table| (**table).clone()).collect(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn from_json(text: &str) -> Result<Schema, CheckpointError> {
    let file: SchemaFile = serde_json::from_str(text)?;
    if file.version != SCHEMA_VERSION {
        return Err(CheckpointError::VersionMismatch {
            found: file.version,
            expected: SCHEMA_VERSION,
        });
    }

    let mut schema = Schema::new();
    schema.scn = file.scn;
    restore_rows(&mut schema.ccol, file.ccol)?;
    restore_rows(&mut schema.cdef, file.cdef)?;
    restore_rows(&mut schema.col, file.col)?;
    restore_rows(&mut schema.deferred_stg, file.deferred_stg)?;
    restore_rows(&mut schema.ecol, file.ecol)?;
    restore_rows(&mut schema.lob, file.lob)?;
    restore_rows(&mut schema.lob_comp_part, file.lob_comp_part)?;
    restore_rows(&mut schema.lob_frag, file.lob_frag)?;
    restore_rows(&mut schema.obj, file.obj)?;
    restore_rows(&mut schema.seg, file.seg)?;
    restore_rows(&mut schema.tab, file.tab)?;
    restore_rows(&mut schema.tab_com_part, file.tab_com_part)?;
    restore_rows(&mut schema.tab_part, file.tab_part)?;
    restore_rows(&mut schema.tab_sub_part, file.tab_sub_part)?;
    restore_rows(&mut schema.ts, file.ts)?;
    restore_rows(&mut schema.user, file.user)?;
    // The persisted derived view is not trusted; the caller forces a
    // rebuild from the restored mirror.
    Ok(schema)
}

pub fn write_file(schema: &Schema, path: &Path) -> Result<(), CheckpointError> {
    std::fs::write(path, to_json(schema)?)?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Schema, CheckpointError> {
    from_json(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oralog_primitives::{RowId, UserId};

    fn user(row: u32, id: u32, name: &str) -> SysUser {
        SysUser {
            user: UserId(id),
            name: name.into(),
            ..SysUser::new(RowId::new(row, 0, 0))
        }
    }

    #[test]
    fn version_mismatch_fails_startup() {
        let mut schema = Schema::new();
        schema.user.add(user(1, 42, "HR")).unwrap();
        let text = to_json(&schema).unwrap().replace(SCHEMA_VERSION, "0.0.0-other");
        let err = from_json(&text).unwrap_err();
        assert!(matches!(err, CheckpointError::VersionMismatch { .. }));
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(matches!(from_json("{"), Err(CheckpointError::Malformed(_))));
        assert!(matches!(from_json("{}"), Err(CheckpointError::Malformed(_))));
    }

    #[test]
    fn records_serialize_under_source_column_names() {
        let mut schema = Schema::new();
        schema.user.add(user(1, 42, "HR")).unwrap();
        let text = to_json(&schema).unwrap();
        assert!(text.contains("\"USER#\": \"42\"") || text.contains("\"USER#\": 42"));
        assert!(text.contains("\"NAME\": \"HR\""));
        assert!(text.contains("\"rowid\": \"AAAAABAAAAAAAAAAAA\""));
    }

    #[test]
    fn duplicate_rowids_are_structural_corruption() {
        let mut schema = Schema::new();
        schema.user.add(user(1, 42, "HR")).unwrap();
        let mut text = to_json(&schema).unwrap();
        // Duplicate the single USER$ entry.
        let entry = "\"sys-user\": [";
        let pos = text.find(entry).unwrap() + entry.len();
        let end = text[pos..].find(']').unwrap() + pos;
        let row = text[pos..end].trim().to_string();
        text.replace_range(pos..end, &format!("{row}, {row}"));
        let err = from_json(&text).unwrap_err();
        assert!(matches!(err, CheckpointError::DuplicateRowId { .. }));
    }

    #[test]
    fn roundtrip_preserves_rows_and_scn() {
        let mut schema = Schema::new();
        schema.scn = Scn(1001);
        schema.user.add(user(1, 42, "HR")).unwrap();
        schema.user.add(user(2, 43, "OPS")).unwrap();

        let restored = from_json(&to_json(&schema).unwrap()).unwrap();
        assert_eq!(restored.scn, Scn(1001));
        assert_eq!(restored.user.len(), 2);
        assert_eq!(
            restored.user.by_key(&UserId(42)).map(|u| u.name.as_str()),
            Some("HR")
        );
        assert_eq!(
            to_json(&restored).unwrap(),
            to_json(&{
                let mut s = Schema::new();
                s.scn = Scn(1001);
                s.user.add(user(1, 42, "HR")).unwrap();
                s.user.add(user(2, 43, "OPS")).unwrap();
                s
            })
            .unwrap()
        );
    }
}
