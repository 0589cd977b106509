//! The generic per-table row store backing the dictionary mirror.
//!
//! Every mirrored catalog table is a [`SysStore`] over its record type:
//! rows are owned by the by-rowid primary map, secondary indexes hold the
//! rowid (never a reference), and a touched set tracks what changed since
//! the last commit. Updates are expressed as remove-then-add so a
//! key-changing mutation can never leave a stale index entry behind.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::ops::{Bound, RangeBounds};

use oralog_primitives::RowId;

use crate::error::DdlError;

use super::catalog::SystemTable;
use super::coerce::ApplyCtx;
use super::values::{ColumnMeta, ValueRef};
use super::Touched;

const ROWID_MIN: RowId = RowId {
    data_obj: 0,
    dba: 0,
    slot: 0,
};
const ROWID_MAX: RowId = RowId {
    data_obj: u32::MAX,
    dba: u32::MAX,
    slot: u16::MAX,
};

/// A record of one mirrored catalog table.
///
/// `Key` is the table's unique hash index, `RangeKey` its ordered multimap
/// index; a table without one of them uses `()` and returns `None`.
pub trait SysRecord: Clone {
    const TABLE: SystemTable;
    type Key: Eq + Hash + Clone;
    type RangeKey: Ord + Clone;

    /// A default-valued record bound to `row_id`.
    fn new(row_id: RowId) -> Self;

    fn row_id(&self) -> RowId;

    fn key(&self) -> Option<Self::Key>;

    fn range_key(&self) -> Option<Self::RangeKey>;

    /// Dispatch one source column onto the matching field, coercing the
    /// after-image per the column's declared type. Unknown names are ignored
    /// so differing source versions stay compatible.
    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError>;

    /// Record which logical objects this row feeds, so commit can invalidate
    /// the derived tables built on top of them.
    fn touch_refs(&self, touched: &mut Touched);
}

/// One mirrored catalog table: rows keyed by rowid plus the secondary
/// indexes its consumers scan.
#[derive(Debug)]
pub(crate) struct SysStore<R: SysRecord> {
    rows: HashMap<RowId, R>,
    by_key: HashMap<R::Key, RowId>,
    by_range: BTreeSet<(R::RangeKey, RowId)>,
    touched: HashSet<RowId>,
}

impl<R: SysRecord> Default for SysStore<R> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            by_key: HashMap::new(),
            by_range: BTreeSet::new(),
            touched: HashSet::new(),
        }
    }
}

impl<R: SysRecord> SysStore<R> {
    pub(crate) fn get(&self, row_id: RowId) -> Option<&R> {
        self.rows.get(&row_id)
    }

    /// Unique-index lookup.
    pub(crate) fn by_key(&self, key: &R::Key) -> Option<&R> {
        let row_id = self.by_key.get(key)?;
        self.rows.get(row_id)
    }

    /// Ordered-index scan; yields records in key order, duplicates in
    /// insertion-key (rowid) order.
    pub(crate) fn range<'a>(
        &'a self,
        bounds: impl RangeBounds<R::RangeKey>,
    ) -> impl Iterator<Item = &'a R> + 'a {
        let start = match bounds.start_bound() {
            Bound::Included(key) => Bound::Included((key.clone(), ROWID_MIN)),
            Bound::Excluded(key) => Bound::Excluded((key.clone(), ROWID_MAX)),
            Bound::Unbounded => Bound::Unbounded,
        };
        let end = match bounds.end_bound() {
            Bound::Included(key) => Bound::Included((key.clone(), ROWID_MAX)),
            Bound::Excluded(key) => Bound::Excluded((key.clone(), ROWID_MIN)),
            Bound::Unbounded => Bound::Unbounded,
        };
        self.by_range
            .range((start, end))
            .filter_map(|(_, row_id)| self.rows.get(row_id))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Insert a record, feeding every index, and mark it touched.
    ///
    /// Fails (returning the record, store unchanged) when a record with the
    /// same rowid is already present.
    pub(crate) fn add(&mut self, record: R) -> Result<(), R> {
        let row_id = record.row_id();
        if self.rows.contains_key(&row_id) {
            return Err(record);
        }
        if let Some(key) = record.key() {
            // Last writer wins under catalog drift; the displaced entry's
            // backing row stays reachable by rowid.
            self.by_key.insert(key, row_id);
        }
        if let Some(key) = record.range_key() {
            self.by_range.insert((key, row_id));
        }
        self.touched.insert(row_id);
        self.rows.insert(row_id, record);
        Ok(())
    }

    /// Remove a record from every index, including the touched set, and
    /// hand ownership back to the caller.
    pub(crate) fn remove(&mut self, row_id: RowId) -> Option<R> {
        let record = self.rows.remove(&row_id)?;
        if let Some(key) = record.key() {
            if self.by_key.get(&key) == Some(&row_id) {
                self.by_key.remove(&key);
            }
        }
        if let Some(key) = record.range_key() {
            self.by_range.remove(&(key, row_id));
        }
        self.touched.remove(&row_id);
        Some(record)
    }

    #[cfg(test)]
    pub(crate) fn is_touched(&self, row_id: RowId) -> bool {
        self.touched.contains(&row_id)
    }

    pub(crate) fn clear_touched(&mut self) {
        self.touched.clear();
    }

    /// Every secondary entry of every row resolves back to that row, and no
    /// index entry is left dangling. Used by the invariant tests.
    #[cfg(test)]
    pub(crate) fn check_consistency(&self) -> bool {
        for (row_id, record) in &self.rows {
            if record.row_id() != *row_id {
                return false;
            }
            if let Some(key) = record.range_key() {
                if !self.by_range.contains(&(key, *row_id)) {
                    return false;
                }
            }
        }
        self.by_key.values().all(|row_id| self.rows.contains_key(row_id))
            && self.by_range.iter().all(|(_, row_id)| self.rows.contains_key(row_id))
            && self.touched.iter().all(|row_id| self.rows.contains_key(row_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{SysCol, SysUser};
    use oralog_primitives::{ColId, ObjId, UserId};
    use proptest::prelude::*;

    fn rowid(n: u32) -> RowId {
        RowId::new(n, 0, 0)
    }

    fn user(n: u32, name: &str) -> SysUser {
        SysUser {
            user: UserId(n),
            name: name.into(),
            ..SysUser::new(rowid(n))
        }
    }

    fn col(row: u32, obj: u32, int_col: i16) -> SysCol {
        SysCol {
            obj: ObjId(obj),
            int_col: ColId(int_col),
            ..SysCol::new(rowid(row))
        }
    }

    #[test]
    fn add_then_find_by_rowid_and_key() {
        let mut store = SysStore::<SysUser>::default();
        store.add(user(42, "HR")).unwrap();
        assert_eq!(store.get(rowid(42)).unwrap().name, "HR");
        assert_eq!(store.by_key(&UserId(42)).unwrap().name, "HR");
        assert!(store.is_touched(rowid(42)));
        assert!(store.check_consistency());
    }

    #[test]
    fn add_rejects_duplicate_rowid_unchanged() {
        let mut store = SysStore::<SysUser>::default();
        store.add(user(1, "A")).unwrap();
        let rejected = store.add(user(1, "B")).unwrap_err();
        assert_eq!(rejected.name, "B");
        assert_eq!(store.get(rowid(1)).unwrap().name, "A");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_clears_every_index_and_touched() {
        let mut store = SysStore::<SysUser>::default();
        store.add(user(7, "OPS")).unwrap();
        let removed = store.remove(rowid(7)).unwrap();
        assert_eq!(removed.name, "OPS");
        assert!(store.get(rowid(7)).is_none());
        assert!(store.by_key(&UserId(7)).is_none());
        assert!(!store.is_touched(rowid(7)));
        assert!(store.check_consistency());
    }

    #[test]
    fn range_scan_is_key_ordered_and_admits_duplicates() {
        let mut store = SysStore::<SysCol>::default();
        store.add(col(3, 100, 2)).unwrap();
        store.add(col(1, 100, 1)).unwrap();
        store.add(col(2, 100, 1)).unwrap();
        store.add(col(4, 200, 1)).unwrap();

        let cols: Vec<_> = store
            .range((ObjId(100), ColId(i16::MIN))..=(ObjId(100), ColId(i16::MAX)))
            .map(|c| (c.int_col.0, c.row_id().data_obj))
            .collect();
        // Duplicate key (1) enumerates in rowid order.
        assert_eq!(cols, vec![(1, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn reinsert_after_key_change_moves_index_entry() {
        let mut store = SysStore::<SysCol>::default();
        store.add(col(1, 100, 1)).unwrap();
        let mut record = store.remove(rowid(1)).unwrap();
        record.obj = ObjId(300);
        store.add(record).unwrap();

        assert!(store
            .range((ObjId(100), ColId(i16::MIN))..=(ObjId(100), ColId(i16::MAX)))
            .next()
            .is_none());
        assert_eq!(
            store
                .range((ObjId(300), ColId(i16::MIN))..=(ObjId(300), ColId(i16::MAX)))
                .count(),
            1
        );
        assert!(store.check_consistency());
    }

    proptest! {
        // Any interleaving of inserts and deletes keeps every index
        // consistent with the primary map.
        #[test]
        fn indexes_stay_consistent(ops in proptest::collection::vec((0u32..16, any::<bool>(), 0u32..4, -4i16..4), 0..64)) {
            let mut store = SysStore::<SysCol>::default();
            for (row, insert, obj, int_col) in ops {
                if insert {
                    let _ = store.add(col(row, obj, int_col));
                } else {
                    store.remove(rowid(row));
                }
                prop_assert!(store.check_consistency());
            }
        }
    }
}
