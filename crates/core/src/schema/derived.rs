//! The derived, downstream-facing view of the dictionary: fully resolved
//! table descriptions rebuilt from the row mirror at commit points.
//!
//! Consumers hold reference-counted [`Table`] handles; a handle obtained
//! before a rebuild stays valid even if the rebuild drops the entry.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use oralog_primitives::{ColId, DataObjId, IntX, ObjId, TableOptions, TsId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub(crate) type DerivedTables = BTreeMap<ObjId, Arc<Table>>;

/// One column of a derived table, in internal-column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub col: ColId,
    pub seg_col: ColId,
    pub int_col: ColId,
    pub name: Box<str>,
    pub col_type: u16,
    pub length: u64,
    pub precision: i64,
    pub scale: i64,
    pub charset_form: u64,
    pub charset_id: u64,
    pub nullable: bool,
    pub property: IntX,
    /// Guard column id when the column is protected by an encryption guard.
    pub guard_id: Option<i16>,
    pub lob: Option<LobLayout>,
}

/// LOB storage attached to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobLayout {
    pub lob_obj: ObjId,
    pub ts_id: TsId,
    /// Composite LOB partition objects, in object order.
    pub partitions: Vec<ObjId>,
    /// Fragment objects of the LOB and its partitions, in object order.
    pub fragments: Vec<ObjId>,
}

/// A fully resolved user table as downstream formatters consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub obj: ObjId,
    pub data_obj: DataObjId,
    pub owner_id: UserId,
    pub ts_id: TsId,
    pub owner: Box<str>,
    pub name: Box<str>,
    pub clu_cols: ColId,
    pub tablespace: Box<str>,
    pub columns: Vec<Column>,
    /// Partition (and composite-partition) object to its base table object.
    pub partitions: BTreeMap<ObjId, ObjId>,
    /// Subpartition object to its composite-partition object.
    pub subpartitions: BTreeMap<ObjId, ObjId>,
    /// Internal column numbers of the primary key, in constraint order.
    pub primary_key: Vec<ColId>,
    /// Internal column numbers whose before-images supplemental logging
    /// guarantees in redo.
    pub supp_log_cols: Vec<ColId>,
    pub compressed: bool,
    pub options: TableOptions,
    /// Position of the filter entry that materialized this table.
    pub filter_origin: usize,
    /// Every object number this table was assembled from; commit uses it to
    /// map touched rows back to stale entries.
    #[serde(skip)]
    pub(crate) backing: HashSet<ObjId>,
}

impl Table {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name.as_ref() == name)
    }
}

/// Read handle shared with downstream consumers.
///
/// Lookups clone an `Arc`, so returned tables outlive any later rebuild
/// that drops them from the registry.
#[derive(Clone)]
pub struct SchemaReader {
    pub(crate) tables: Arc<RwLock<DerivedTables>>,
}

impl SchemaReader {
    pub fn lookup_table(&self, obj: ObjId) -> Option<Arc<Table>> {
        self.tables.read().get(&obj).cloned()
    }

    /// Snapshot of all derived tables in object order.
    pub fn iterate_tables(&self) -> Vec<Arc<Table>> {
        self.tables.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}
