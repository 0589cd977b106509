//! The in-memory mirror of the source database's data dictionary.
//!
//! [`Schema`] owns one `SysStore` per mirrored catalog table (the row
//! mirror), the touched bookkeeping that drives commit-time rebuilds, and
//! the shared map of derived [`derived::Table`]s that downstream consumers
//! read through [`derived::SchemaReader`].
//!
//! The mirror is single-writer: it is owned and mutated only by the
//! transaction-reassembly thread through
//! [`system_tx::SystemTransaction`]. Readers synchronize on the derived map
//! alone.

pub(crate) mod build;
pub mod catalog;
pub(crate) mod coerce;
pub mod checkpoint;
pub mod derived;
pub mod filter;
pub(crate) mod store;
pub mod system_tx;
pub mod values;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use oralog_primitives::{ObjId, Scn, TsId, UserId};
use parking_lot::RwLock;

use catalog::{
    SysCCol, SysCDef, SysCol, SysDeferredStg, SysECol, SysLob, SysLobCompPart, SysLobFrag, SysObj, SysSeg, SysTab,
    SysTabComPart, SysTabPart, SysTabSubPart, SysTs, SysUser,
};
use derived::{DerivedTables, SchemaReader};
use store::{SysRecord, SysStore};

/// Logical identifiers whose backing rows changed since the last commit.
///
/// Rows map themselves into this set on every add and remove; unlike the
/// per-store touched sets, entries survive row deletion, which is what lets
/// commit invalidate a derived table whose backing rows are gone.
#[derive(Debug, Default)]
pub(crate) struct Touched {
    pub(crate) objs: HashSet<ObjId>,
    pub(crate) users: HashSet<UserId>,
    pub(crate) tablespaces: HashSet<TsId>,
}

impl Touched {
    fn clear(&mut self) {
        self.objs.clear();
        self.users.clear();
        self.tablespaces.clear();
    }
}

/// The dictionary mirror plus its derived view.
#[derive(Debug)]
pub struct Schema {
    pub(crate) ccol: SysStore<SysCCol>,
    pub(crate) cdef: SysStore<SysCDef>,
    pub(crate) col: SysStore<SysCol>,
    pub(crate) deferred_stg: SysStore<SysDeferredStg>,
    pub(crate) ecol: SysStore<SysECol>,
    pub(crate) lob: SysStore<SysLob>,
    pub(crate) lob_comp_part: SysStore<SysLobCompPart>,
    pub(crate) lob_frag: SysStore<SysLobFrag>,
    pub(crate) obj: SysStore<SysObj>,
    pub(crate) seg: SysStore<SysSeg>,
    pub(crate) tab: SysStore<SysTab>,
    pub(crate) tab_com_part: SysStore<SysTabComPart>,
    pub(crate) tab_part: SysStore<SysTabPart>,
    pub(crate) tab_sub_part: SysStore<SysTabSubPart>,
    pub(crate) ts: SysStore<SysTs>,
    pub(crate) user: SysStore<SysUser>,

    /// Any catalog table was touched since the last commit.
    pub(crate) touched: bool,
    pub(crate) touched_refs: Touched,
    pub(crate) scn: Scn,
    pub(crate) derived: Arc<RwLock<DerivedTables>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self {
            ccol: SysStore::default(),
            cdef: SysStore::default(),
            col: SysStore::default(),
            deferred_stg: SysStore::default(),
            ecol: SysStore::default(),
            lob: SysStore::default(),
            lob_comp_part: SysStore::default(),
            lob_frag: SysStore::default(),
            obj: SysStore::default(),
            seg: SysStore::default(),
            tab: SysStore::default(),
            tab_com_part: SysStore::default(),
            tab_part: SysStore::default(),
            tab_sub_part: SysStore::default(),
            ts: SysStore::default(),
            user: SysStore::default(),
            touched: false,
            touched_refs: Touched::default(),
            scn: Scn::NONE,
            derived: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// SCN of the last committed catalog change.
    pub fn scn(&self) -> Scn {
        self.scn
    }

    /// Handle for downstream consumers of the derived view.
    pub fn reader(&self) -> SchemaReader {
        SchemaReader {
            tables: self.derived.clone(),
        }
    }

    pub(crate) fn rows<R>(&self) -> &SysStore<R>
    where
        R: SysRecord,
        Self: StoreOf<R>,
    {
        StoreOf::store(self)
    }

    pub(crate) fn rows_mut<R>(&mut self) -> &mut SysStore<R>
    where
        R: SysRecord,
        Self: StoreOf<R>,
    {
        StoreOf::store_mut(self)
    }

    pub(crate) fn mark_refs<R: SysRecord>(&mut self, record: &R) {
        record.touch_refs(&mut self.touched_refs);
        self.touched = true;
    }

    pub(crate) fn reset_touched(&mut self) {
        self.ccol.clear_touched();
        self.cdef.clear_touched();
        self.col.clear_touched();
        self.deferred_stg.clear_touched();
        self.ecol.clear_touched();
        self.lob.clear_touched();
        self.lob_comp_part.clear_touched();
        self.lob_frag.clear_touched();
        self.obj.clear_touched();
        self.seg.clear_touched();
        self.tab.clear_touched();
        self.tab_com_part.clear_touched();
        self.tab_part.clear_touched();
        self.tab_sub_part.clear_touched();
        self.ts.clear_touched();
        self.user.clear_touched();
        self.touched_refs.clear();
        self.touched = false;
    }

    #[cfg(test)]
    pub(crate) fn check_consistency(&self) -> bool {
        self.ccol.check_consistency()
            && self.cdef.check_consistency()
            && self.col.check_consistency()
            && self.deferred_stg.check_consistency()
            && self.ecol.check_consistency()
            && self.lob.check_consistency()
            && self.lob_comp_part.check_consistency()
            && self.lob_frag.check_consistency()
            && self.obj.check_consistency()
            && self.seg.check_consistency()
            && self.tab.check_consistency()
            && self.tab_com_part.check_consistency()
            && self.tab_part.check_consistency()
            && self.tab_sub_part.check_consistency()
            && self.ts.check_consistency()
            && self.user.check_consistency()
    }
}

/// Typed access from [`Schema`] to the store holding `R`.
pub(crate) trait StoreOf<R: SysRecord> {
    fn store(&self) -> &SysStore<R>;
    fn store_mut(&mut self) -> &mut SysStore<R>;
}

macro_rules! impl_store_of {
    ($($record:ty => $field:ident,)*) => {
        $(impl StoreOf<$record> for Schema {
            fn store(&self) -> &SysStore<$record> {
                &self.$field
            }

            fn store_mut(&mut self) -> &mut SysStore<$record> {
                &mut self.$field
            }
        })*
    };
}

impl_store_of! {
    SysCCol => ccol,
    SysCDef => cdef,
    SysCol => col,
    SysDeferredStg => deferred_stg,
    SysECol => ecol,
    SysLob => lob,
    SysLobCompPart => lob_comp_part,
    SysLobFrag => lob_frag,
    SysObj => obj,
    SysSeg => seg,
    SysTab => tab,
    SysTabComPart => tab_com_part,
    SysTabPart => tab_part,
    SysTabSubPart => tab_sub_part,
    SysTs => ts,
    SysUser => user,
}
