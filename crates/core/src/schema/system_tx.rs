//! The system-transaction interpreter: row-level redo against the mirrored
//! dictionary tables, and the commit that rebuilds the derived view.
//!
//! The reassembler feeds one interpreter per source transaction that
//! touches a catalog table: `on_insert` / `on_update` / `on_delete` per row
//! operation, then `commit` with the transaction's SCN. All handlers share
//! one generic implementation; the per-table knowledge lives in the record
//! types themselves.

use oralog_primitives::{FileOffset, RowId, Scn};

use crate::error::{DdlError, DictError, Result};
use crate::metadata::Metadata;

use super::build::{self, BuildOptions};
use super::catalog::{
    SysCCol, SysCDef, SysCol, SysDeferredStg, SysECol, SysLob, SysLobCompPart, SysLobFrag, SysObj, SysSeg, SysTab,
    SysTabComPart, SysTabPart, SysTabSubPart, SysTs, SysUser, SystemTable,
};
use super::coerce::ApplyCtx;
use super::store::SysRecord;
use super::values::{TableMeta, ValueVector};
use super::{Schema, StoreOf};

pub struct SystemTransaction<'a> {
    metadata: &'a mut Metadata,
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $table:expr, $row_id:expr, $values:expr, $offset:expr) => {
        match $table.table {
            SystemTable::CCol => $self.$method::<SysCCol>($table, $row_id, $values, $offset),
            SystemTable::CDef => $self.$method::<SysCDef>($table, $row_id, $values, $offset),
            SystemTable::Col => $self.$method::<SysCol>($table, $row_id, $values, $offset),
            SystemTable::DeferredStg => $self.$method::<SysDeferredStg>($table, $row_id, $values, $offset),
            SystemTable::ECol => $self.$method::<SysECol>($table, $row_id, $values, $offset),
            SystemTable::Lob => $self.$method::<SysLob>($table, $row_id, $values, $offset),
            SystemTable::LobCompPart => $self.$method::<SysLobCompPart>($table, $row_id, $values, $offset),
            SystemTable::LobFrag => $self.$method::<SysLobFrag>($table, $row_id, $values, $offset),
            SystemTable::Obj => $self.$method::<SysObj>($table, $row_id, $values, $offset),
            SystemTable::Seg => $self.$method::<SysSeg>($table, $row_id, $values, $offset),
            SystemTable::Tab => $self.$method::<SysTab>($table, $row_id, $values, $offset),
            SystemTable::TabComPart => $self.$method::<SysTabComPart>($table, $row_id, $values, $offset),
            SystemTable::TabPart => $self.$method::<SysTabPart>($table, $row_id, $values, $offset),
            SystemTable::TabSubPart => $self.$method::<SysTabSubPart>($table, $row_id, $values, $offset),
            SystemTable::Ts => $self.$method::<SysTs>($table, $row_id, $values, $offset),
            SystemTable::User => $self.$method::<SysUser>($table, $row_id, $values, $offset),
        }
    };
}

impl<'a> SystemTransaction<'a> {
    pub fn new(metadata: &'a mut Metadata) -> Self {
        log::trace!(target: "system", "begin");
        Self { metadata }
    }

    /// Apply an INSERT against a catalog table.
    ///
    /// A pre-existing rowid is a fatal [`DdlError::DuplicateRow`] unless
    /// adaptive-schema mode is on, in which case the stale record is
    /// silently replaced.
    pub fn on_insert(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()> {
        log::trace!(target: "system", "insert table (name: {}, rowid: {row_id})", table.qualified_name());
        dispatch!(self, insert_row, table, row_id, values, offset)
    }

    /// Apply an UPDATE against a catalog table.
    ///
    /// The record leaves every index before its fields change and re-enters
    /// them afterwards, so key-changing updates cannot strand index
    /// entries. A missing rowid is tolerated with a warning; adaptive mode
    /// synthesizes a default record instead and converges on the update's
    /// after-image.
    pub fn on_update(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()> {
        log::trace!(target: "system", "update table (name: {}, rowid: {row_id})", table.qualified_name());
        dispatch!(self, update_row, table, row_id, values, offset)
    }

    /// Apply a DELETE against a catalog table. A missing rowid is tolerated
    /// with a warning.
    pub fn on_delete(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()> {
        log::trace!(target: "system", "delete table (name: {}, rowid: {row_id})", table.qualified_name());
        dispatch!(self, delete_row, table, row_id, values, offset)
    }

    /// Close of the source transaction: record the SCN, drop stale derived
    /// tables, rebuild from the updated mirror and clear the touched sets.
    ///
    /// Returns immediately when no catalog table was touched. Holds the
    /// derived map's write lock for the whole drop-and-build pass.
    pub fn commit(&mut self, scn: Scn) {
        log::trace!(target: "system", "commit");
        if !self.metadata.schema.touched {
            return;
        }
        let metadata = &mut *self.metadata;
        metadata.schema.scn = scn;

        let opts = BuildOptions {
            supp_log_primary: metadata.supp_log_db_primary,
            supp_log_all: metadata.supp_log_db_all,
            default_charset_id: metadata.default_charset_id,
            default_nchar_charset_id: metadata.default_nchar_charset_id,
        };
        let mut dropped = Vec::new();
        let mut updated = Vec::new();
        {
            let derived = metadata.schema.derived.clone();
            let mut tables = derived.write();
            build::drop_unused(&metadata.schema, &metadata.filters, &mut tables, &mut dropped);
            build::build(&metadata.schema, &metadata.filters, &opts, &mut tables, &mut updated);
        }
        metadata.schema.reset_touched();

        for name in dropped {
            log::info!("dropped metadata: {name}");
        }
        for name in updated {
            log::info!("updated metadata: {name}");
        }
    }

    fn insert_row<R: SysRecord>(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()>
    where
        Schema: StoreOf<R>,
    {
        if self.metadata.schema.rows::<R>().get(row_id).is_some() {
            if !self.metadata.is_adaptive() {
                return Err(DdlError::DuplicateRow {
                    table: table.qualified_name(),
                    row_id,
                    offset,
                }
                .into());
            }
            log::trace!(target: "system", "replacing {} (rowid: {row_id}) on insert", table.qualified_name());
            if let Some(old) = self.metadata.schema.rows_mut::<R>().remove(row_id) {
                self.metadata.schema.mark_refs(&old);
            }
        }
        let record = self.fill_record(R::new(row_id), table, values, offset)?;
        self.install(record, table, offset)
    }

    fn update_row<R: SysRecord>(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()>
    where
        Schema: StoreOf<R>,
    {
        let record = match self.metadata.schema.rows_mut::<R>().remove(row_id) {
            Some(existing) => {
                // The old key values may differ from the new ones.
                self.metadata.schema.mark_refs(&existing);
                existing
            }
            None if self.metadata.is_adaptive() => R::new(row_id),
            None => {
                log::warn!(target: "system", "{}", DdlError::MissingRow {
                    table: table.qualified_name(),
                    row_id,
                    op: "update",
                    offset,
                });
                return Ok(());
            }
        };
        let record = self.fill_record(record, table, values, offset)?;
        self.install(record, table, offset)
    }

    fn delete_row<R: SysRecord>(
        &mut self,
        table: &TableMeta,
        row_id: RowId,
        _values: &ValueVector,
        offset: FileOffset,
    ) -> Result<()>
    where
        Schema: StoreOf<R>,
    {
        match self.metadata.schema.rows_mut::<R>().remove(row_id) {
            Some(record) => {
                self.metadata.schema.mark_refs(&record);
                Ok(())
            }
            None => {
                log::warn!(target: "system", "{}", DdlError::MissingRow {
                    table: table.qualified_name(),
                    row_id,
                    op: "delete",
                    offset,
                });
                Ok(())
            }
        }
    }

    fn fill_record<R: SysRecord>(
        &self,
        mut record: R,
        table: &TableMeta,
        values: &ValueVector,
        offset: FileOffset,
    ) -> Result<R> {
        let ctx = ApplyCtx {
            table,
            offset,
            default_charset_id: self.metadata.default_charset_id,
        };
        for (pos, images) in values.iter() {
            let Some(col) = table.columns.get(pos as usize) else {
                log::warn!(target: "system", "column position {pos} out of range for {}", table.qualified_name());
                continue;
            };
            record.apply_column(col, images.as_ref(), &ctx)?;
        }
        Ok(record)
    }

    fn install<R: SysRecord>(&mut self, record: R, table: &TableMeta, offset: FileOffset) -> Result<()>
    where
        Schema: StoreOf<R>,
    {
        let row_id = record.row_id();
        self.metadata.schema.mark_refs(&record);
        self.metadata
            .schema
            .rows_mut::<R>()
            .add(record)
            .map_err(|_| DictError::from(DdlError::DuplicateRow {
                table: table.qualified_name(),
                row_id,
                offset,
            }))
    }
}
