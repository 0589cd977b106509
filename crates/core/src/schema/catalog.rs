//! Record types for the mirrored `SYS.*` dictionary tables.
//!
//! When mirroring a new catalog table, remember to:
//! - Add a variant to [`SystemTable`] and a builtin layout in `values.rs`.
//! - Define the record struct with serde renames to the source column names.
//! - Implement [`SysRecord`]: secondary keys, column dispatch, touch refs.
//! - Add its store to `Schema` and wire it through `impl_store_of!`,
//!   the interpreter dispatch and the checkpoint file.

use oralog_primitives::{ColId, ConId, DataObjId, IntX, ObjId, RowId, TsId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DdlError;

use super::coerce::{self, ApplyCtx};
use super::store::SysRecord;
use super::values::{ColumnMeta, ValueRef};
use super::Touched;

/// Identifier name columns (`USER$`, `OBJ$`, `COL$`) cap at 128 bytes.
pub(crate) const NAME_LENGTH: usize = 128;
/// Tablespace names cap at 30 bytes.
pub(crate) const TS_NAME_LENGTH: usize = 30;

/// `OBJ$.TYPE#` of a table object.
pub const OBJ_TYPE_TABLE: u16 = 2;
/// `CDEF$.TYPE#` of a primary-key constraint.
pub const CDEF_TYPE_PRIMARY_KEY: u16 = 2;

/// The fixed set of dictionary tables the replicator mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum SystemTable {
    #[strum(to_string = "SYS.CCOL$")]
    CCol,
    #[strum(to_string = "SYS.CDEF$")]
    CDef,
    #[strum(to_string = "SYS.COL$")]
    Col,
    #[strum(to_string = "SYS.DEFERRED_STG$")]
    DeferredStg,
    #[strum(to_string = "SYS.ECOL$")]
    ECol,
    #[strum(to_string = "SYS.LOB$")]
    Lob,
    #[strum(to_string = "SYS.LOBCOMPPART$")]
    LobCompPart,
    #[strum(to_string = "SYS.LOBFRAG$")]
    LobFrag,
    #[strum(to_string = "SYS.OBJ$")]
    Obj,
    #[strum(to_string = "SYS.SEG$")]
    Seg,
    #[strum(to_string = "SYS.TAB$")]
    Tab,
    #[strum(to_string = "SYS.TABPART$")]
    TabPart,
    #[strum(to_string = "SYS.TABCOMPART$")]
    TabComPart,
    #[strum(to_string = "SYS.TABSUBPART$")]
    TabSubPart,
    #[strum(to_string = "SYS.TS$")]
    Ts,
    #[strum(to_string = "SYS.USER$")]
    User,
}

impl SystemTable {
    /// Bare table name without the `SYS.` owner.
    pub fn table_name(&self) -> &'static str {
        match self {
            SystemTable::CCol => "CCOL$",
            SystemTable::CDef => "CDEF$",
            SystemTable::Col => "COL$",
            SystemTable::DeferredStg => "DEFERRED_STG$",
            SystemTable::ECol => "ECOL$",
            SystemTable::Lob => "LOB$",
            SystemTable::LobCompPart => "LOBCOMPPART$",
            SystemTable::LobFrag => "LOBFRAG$",
            SystemTable::Obj => "OBJ$",
            SystemTable::Seg => "SEG$",
            SystemTable::Tab => "TAB$",
            SystemTable::TabPart => "TABPART$",
            SystemTable::TabComPart => "TABCOMPART$",
            SystemTable::TabSubPart => "TABSUBPART$",
            SystemTable::Ts => "TS$",
            SystemTable::User => "USER$",
        }
    }
}

/// `SYS.USER$`: one row per database user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysUser {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "USER#")]
    pub user: UserId,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "SPARE1")]
    pub spare1: IntX,
}

impl SysRecord for SysUser {
    const TABLE: SystemTable = SystemTable::User;
    type Key = UserId;
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            user: UserId(0),
            name: String::new(),
            spare1: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<UserId> {
        Some(self.user)
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "USER#" => coerce::number32u(&mut self.user.0, 0, col, value, ctx),
            "NAME" => coerce::string(&mut self.name, NAME_LENGTH, col, value, ctx),
            "SPARE1" => coerce::numberxu(&mut self.spare1, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.users.insert(self.user);
    }
}

/// `SYS.OBJ$`: one row per schema object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysObj {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OWNER#")]
    pub owner: UserId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "DATAOBJ#")]
    pub data_obj: DataObjId,
    #[serde(rename = "TYPE#")]
    pub obj_type: u16,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "FLAGS")]
    pub flags: IntX,
}

impl SysObj {
    pub fn is_table(&self) -> bool {
        self.obj_type == OBJ_TYPE_TABLE
    }

    /// Temporary objects never materialize downstream.
    pub fn is_temporary(&self) -> bool {
        self.flags.bit(1)
    }
}

impl SysRecord for SysObj {
    const TABLE: SystemTable = SystemTable::Obj;
    type Key = ObjId;
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            owner: UserId(0),
            obj: ObjId(0),
            data_obj: DataObjId(0),
            obj_type: 0,
            name: String::new(),
            flags: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ObjId> {
        Some(self.obj)
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OWNER#" => coerce::number32u(&mut self.owner.0, 0, col, value, ctx),
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "DATAOBJ#" => coerce::number32u(&mut self.data_obj.0, 0, col, value, ctx),
            "TYPE#" => coerce::number16u(&mut self.obj_type, 0, col, value, ctx),
            "NAME" => coerce::string(&mut self.name, NAME_LENGTH, col, value, ctx),
            "FLAGS" => coerce::numberxu(&mut self.flags, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.COL$`: one row per column of every object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysCol {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "COL#")]
    pub col: ColId,
    #[serde(rename = "SEGCOL#")]
    pub seg_col: ColId,
    #[serde(rename = "INTCOL#")]
    pub int_col: ColId,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "TYPE#")]
    pub col_type: u16,
    #[serde(rename = "LENGTH")]
    pub length: u64,
    #[serde(rename = "PRECISION#")]
    pub precision: i64,
    #[serde(rename = "SCALE")]
    pub scale: i64,
    #[serde(rename = "CHARSETFORM")]
    pub charset_form: u64,
    #[serde(rename = "CHARSETID")]
    pub charset_id: u64,
    #[serde(rename = "NULL$")]
    pub not_null: i64,
    #[serde(rename = "PROPERTY")]
    pub property: IntX,
}

impl SysCol {
    pub fn is_nullable(&self) -> bool {
        self.not_null == 0
    }

    /// Hidden columns (property bit 5) do not appear downstream.
    pub fn is_hidden(&self) -> bool {
        self.property.bit(5)
    }

    /// Set-unused columns (property bit 15) await a segment rebuild.
    pub fn is_unused(&self) -> bool {
        self.property.bit(15)
    }
}

impl SysRecord for SysCol {
    const TABLE: SystemTable = SystemTable::Col;
    type Key = ();
    type RangeKey = (ObjId, ColId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            col: ColId(0),
            seg_col: ColId(0),
            int_col: ColId(0),
            name: String::new(),
            col_type: 0,
            length: 0,
            precision: -1,
            scale: -1,
            charset_form: 0,
            charset_id: 0,
            not_null: 0,
            property: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<()> {
        None
    }

    fn range_key(&self) -> Option<(ObjId, ColId)> {
        Some((self.obj, self.int_col))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "COL#" => coerce::number16(&mut self.col.0, 0, col, value, ctx),
            "SEGCOL#" => coerce::number16(&mut self.seg_col.0, 0, col, value, ctx),
            "INTCOL#" => coerce::number16(&mut self.int_col.0, 0, col, value, ctx),
            "NAME" => coerce::string(&mut self.name, NAME_LENGTH, col, value, ctx),
            "TYPE#" => coerce::number16u(&mut self.col_type, 0, col, value, ctx),
            "LENGTH" => coerce::number64u(&mut self.length, 0, col, value, ctx),
            "PRECISION#" => coerce::number64(&mut self.precision, -1, col, value, ctx),
            "SCALE" => coerce::number64(&mut self.scale, -1, col, value, ctx),
            "CHARSETFORM" => coerce::number64u(&mut self.charset_form, 0, col, value, ctx),
            "CHARSETID" => coerce::number64u(&mut self.charset_id, 0, col, value, ctx),
            "NULL$" => coerce::number64(&mut self.not_null, 0, col, value, ctx),
            "PROPERTY" => coerce::numberxu(&mut self.property, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.CCOL$`: constraint-to-column mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysCCol {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "CON#")]
    pub con: ConId,
    #[serde(rename = "INTCOL#")]
    pub int_col: ColId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "SPARE1")]
    pub spare1: IntX,
}

impl SysCCol {
    /// Supplemental-log marker on the constraint column.
    pub fn is_supp_log(&self) -> bool {
        self.spare1.bit(0)
    }
}

impl SysRecord for SysCCol {
    const TABLE: SystemTable = SystemTable::CCol;
    type Key = ();
    type RangeKey = (ObjId, ColId, ConId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            con: ConId(0),
            int_col: ColId(0),
            obj: ObjId(0),
            spare1: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<()> {
        None
    }

    fn range_key(&self) -> Option<(ObjId, ColId, ConId)> {
        Some((self.obj, self.int_col, self.con))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "CON#" => coerce::number32u(&mut self.con.0, 0, col, value, ctx),
            "INTCOL#" => coerce::number16(&mut self.int_col.0, 0, col, value, ctx),
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "SPARE1" => coerce::numberxu(&mut self.spare1, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.CDEF$`: constraint definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysCDef {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "CON#")]
    pub con: ConId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "TYPE#")]
    pub def_type: u16,
}

impl SysCDef {
    pub fn is_primary_key(&self) -> bool {
        self.def_type == CDEF_TYPE_PRIMARY_KEY
    }
}

impl SysRecord for SysCDef {
    const TABLE: SystemTable = SystemTable::CDef;
    type Key = ConId;
    type RangeKey = (ObjId, ConId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            con: ConId(0),
            obj: ObjId(0),
            def_type: 0,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ConId> {
        Some(self.con)
    }

    fn range_key(&self) -> Option<(ObjId, ConId)> {
        Some((self.obj, self.con))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "CON#" => coerce::number32u(&mut self.con.0, 0, col, value, ctx),
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "TYPE#" => coerce::number16u(&mut self.def_type, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.DEFERRED_STG$`: deferred segment storage attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysDeferredStg {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "FLAGS_STG")]
    pub flags_stg: IntX,
}

impl SysDeferredStg {
    pub fn is_compressed(&self) -> bool {
        self.flags_stg.bit(2)
    }
}

impl SysRecord for SysDeferredStg {
    const TABLE: SystemTable = SystemTable::DeferredStg;
    type Key = ObjId;
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            flags_stg: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ObjId> {
        Some(self.obj)
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "FLAGS_STG" => coerce::numberxu(&mut self.flags_stg, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.ECOL$`: encryption/guard column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysECol {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "TABOBJ#")]
    pub tab_obj: ObjId,
    #[serde(rename = "COLNUM")]
    pub col_num: ColId,
    #[serde(rename = "GUARD_ID")]
    pub guard_id: i16,
}

impl SysECol {
    pub fn guard(&self) -> Option<i16> {
        (self.guard_id >= 0).then_some(self.guard_id)
    }
}

impl SysRecord for SysECol {
    const TABLE: SystemTable = SystemTable::ECol;
    type Key = (ObjId, ColId);
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            tab_obj: ObjId(0),
            col_num: ColId(0),
            guard_id: -1,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<(ObjId, ColId)> {
        Some((self.tab_obj, self.col_num))
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "TABOBJ#" => coerce::number32u(&mut self.tab_obj.0, 0, col, value, ctx),
            "COLNUM" => coerce::number16(&mut self.col_num.0, 0, col, value, ctx),
            "GUARD_ID" => coerce::number16(&mut self.guard_id, -1, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.tab_obj);
    }
}

/// `SYS.SEG$`: segment storage rows, mirrored for completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysSeg {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "FILE#")]
    pub file: u32,
    #[serde(rename = "BLOCK#")]
    pub block: u32,
    #[serde(rename = "TS#")]
    pub ts: TsId,
    #[serde(rename = "SPARE1")]
    pub spare1: IntX,
}

impl SysRecord for SysSeg {
    const TABLE: SystemTable = SystemTable::Seg;
    type Key = (u32, u32, TsId);
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            file: 0,
            block: 0,
            ts: TsId(0),
            spare1: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<(u32, u32, TsId)> {
        Some((self.file, self.block, self.ts))
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "FILE#" => coerce::number32u(&mut self.file, 0, col, value, ctx),
            "BLOCK#" => coerce::number32u(&mut self.block, 0, col, value, ctx),
            "TS#" => coerce::number32u(&mut self.ts.0, 0, col, value, ctx),
            "SPARE1" => coerce::numberxu(&mut self.spare1, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, _touched: &mut Touched) {
        // No object linkage in the mirrored layout; see DESIGN notes.
    }
}

/// `SYS.TAB$`: one row per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysTab {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "DATAOBJ#")]
    pub data_obj: DataObjId,
    #[serde(rename = "TS#")]
    pub ts: TsId,
    #[serde(rename = "CLUCOLS")]
    pub clu_cols: ColId,
    #[serde(rename = "FLAGS")]
    pub flags: IntX,
    #[serde(rename = "PROPERTY")]
    pub property: IntX,
}

impl SysTab {
    pub fn is_partitioned(&self) -> bool {
        self.property.bit(5)
    }

    pub fn is_binary_compressed(&self) -> bool {
        self.property.bit(17)
    }
}

impl SysRecord for SysTab {
    const TABLE: SystemTable = SystemTable::Tab;
    type Key = ObjId;
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            data_obj: DataObjId(0),
            ts: TsId(0),
            clu_cols: ColId(0),
            flags: IntX::ZERO,
            property: IntX::ZERO,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ObjId> {
        Some(self.obj)
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "DATAOBJ#" => coerce::number32u(&mut self.data_obj.0, 0, col, value, ctx),
            "TS#" => coerce::number32u(&mut self.ts.0, 0, col, value, ctx),
            "CLUCOLS" => coerce::number16(&mut self.clu_cols.0, 0, col, value, ctx),
            "FLAGS" => coerce::numberxu(&mut self.flags, col, value, ctx),
            "PROPERTY" => coerce::numberxu(&mut self.property, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
    }
}

/// `SYS.TABPART$`: range/list/hash partitions of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysTabPart {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "DATAOBJ#")]
    pub data_obj: DataObjId,
    #[serde(rename = "BO#")]
    pub bo: ObjId,
}

impl SysRecord for SysTabPart {
    const TABLE: SystemTable = SystemTable::TabPart;
    type Key = ();
    type RangeKey = (ObjId, ObjId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            data_obj: DataObjId(0),
            bo: ObjId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<()> {
        None
    }

    fn range_key(&self) -> Option<(ObjId, ObjId)> {
        Some((self.bo, self.obj))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "DATAOBJ#" => coerce::number32u(&mut self.data_obj.0, 0, col, value, ctx),
            "BO#" => coerce::number32u(&mut self.bo.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.bo);
        touched.objs.insert(self.obj);
    }
}

/// `SYS.TABCOMPART$`: composite partitions of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysTabComPart {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "DATAOBJ#")]
    pub data_obj: DataObjId,
    #[serde(rename = "BO#")]
    pub bo: ObjId,
}

impl SysRecord for SysTabComPart {
    const TABLE: SystemTable = SystemTable::TabComPart;
    type Key = ObjId;
    type RangeKey = (ObjId, ObjId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            data_obj: DataObjId(0),
            bo: ObjId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ObjId> {
        Some(self.obj)
    }

    fn range_key(&self) -> Option<(ObjId, ObjId)> {
        Some((self.bo, self.obj))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "DATAOBJ#" => coerce::number32u(&mut self.data_obj.0, 0, col, value, ctx),
            "BO#" => coerce::number32u(&mut self.bo.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.bo);
        touched.objs.insert(self.obj);
    }
}

/// `SYS.TABSUBPART$`: subpartitions under a composite partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysTabSubPart {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "DATAOBJ#")]
    pub data_obj: DataObjId,
    #[serde(rename = "POBJ#")]
    pub p_obj: ObjId,
}

impl SysRecord for SysTabSubPart {
    const TABLE: SystemTable = SystemTable::TabSubPart;
    type Key = ();
    type RangeKey = (ObjId, ObjId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            data_obj: DataObjId(0),
            p_obj: ObjId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<()> {
        None
    }

    fn range_key(&self) -> Option<(ObjId, ObjId)> {
        Some((self.p_obj, self.obj))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "DATAOBJ#" => coerce::number32u(&mut self.data_obj.0, 0, col, value, ctx),
            "POBJ#" => coerce::number32u(&mut self.p_obj.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.p_obj);
        touched.objs.insert(self.obj);
    }
}

/// `SYS.TS$`: tablespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysTs {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "TS#")]
    pub ts: TsId,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "BLOCKSIZE")]
    pub block_size: u32,
}

impl SysRecord for SysTs {
    const TABLE: SystemTable = SystemTable::Ts;
    type Key = TsId;
    type RangeKey = ();

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            ts: TsId(0),
            name: String::new(),
            block_size: 0,
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<TsId> {
        Some(self.ts)
    }

    fn range_key(&self) -> Option<()> {
        None
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "TS#" => coerce::number32u(&mut self.ts.0, 0, col, value, ctx),
            "NAME" => coerce::string(&mut self.name, TS_NAME_LENGTH, col, value, ctx),
            "BLOCKSIZE" => coerce::number32u(&mut self.block_size, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.tablespaces.insert(self.ts);
    }
}

/// `SYS.LOB$`: LOB columns of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysLob {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "OBJ#")]
    pub obj: ObjId,
    #[serde(rename = "COL#")]
    pub col: ColId,
    #[serde(rename = "INTCOL#")]
    pub int_col: ColId,
    #[serde(rename = "LOBJ#")]
    pub l_obj: ObjId,
    #[serde(rename = "TS#")]
    pub ts: TsId,
}

impl SysRecord for SysLob {
    const TABLE: SystemTable = SystemTable::Lob;
    type Key = ObjId;
    type RangeKey = (ObjId, ColId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            obj: ObjId(0),
            col: ColId(0),
            int_col: ColId(0),
            l_obj: ObjId(0),
            ts: TsId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    /// Keyed by the LOB's own object number.
    fn key(&self) -> Option<ObjId> {
        Some(self.l_obj)
    }

    fn range_key(&self) -> Option<(ObjId, ColId)> {
        Some((self.obj, self.int_col))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "OBJ#" => coerce::number32u(&mut self.obj.0, 0, col, value, ctx),
            "COL#" => coerce::number16(&mut self.col.0, 0, col, value, ctx),
            "INTCOL#" => coerce::number16(&mut self.int_col.0, 0, col, value, ctx),
            "LOBJ#" => coerce::number32u(&mut self.l_obj.0, 0, col, value, ctx),
            "TS#" => coerce::number32u(&mut self.ts.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.obj);
        touched.objs.insert(self.l_obj);
    }
}

/// `SYS.LOBFRAG$`: LOB fragments, chained to their parent segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysLobFrag {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "FRAGOBJ#")]
    pub frag_obj: ObjId,
    #[serde(rename = "PARENTOBJ#")]
    pub parent_obj: ObjId,
    #[serde(rename = "TS#")]
    pub ts: TsId,
}

impl SysRecord for SysLobFrag {
    const TABLE: SystemTable = SystemTable::LobFrag;
    type Key = ();
    type RangeKey = (ObjId, ObjId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            frag_obj: ObjId(0),
            parent_obj: ObjId(0),
            ts: TsId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<()> {
        None
    }

    fn range_key(&self) -> Option<(ObjId, ObjId)> {
        Some((self.parent_obj, self.frag_obj))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "FRAGOBJ#" => coerce::number32u(&mut self.frag_obj.0, 0, col, value, ctx),
            "PARENTOBJ#" => coerce::number32u(&mut self.parent_obj.0, 0, col, value, ctx),
            "TS#" => coerce::number32u(&mut self.ts.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.parent_obj);
        touched.objs.insert(self.frag_obj);
    }
}

/// `SYS.LOBCOMPPART$`: composite LOB partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysLobCompPart {
    #[serde(rename = "rowid")]
    pub row_id: RowId,
    #[serde(rename = "PARTOBJ#")]
    pub part_obj: ObjId,
    #[serde(rename = "LOBJ#")]
    pub l_obj: ObjId,
}

impl SysRecord for SysLobCompPart {
    const TABLE: SystemTable = SystemTable::LobCompPart;
    type Key = ObjId;
    type RangeKey = (ObjId, ObjId);

    fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            part_obj: ObjId(0),
            l_obj: ObjId(0),
        }
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn key(&self) -> Option<ObjId> {
        Some(self.part_obj)
    }

    fn range_key(&self) -> Option<(ObjId, ObjId)> {
        Some((self.l_obj, self.part_obj))
    }

    fn apply_column(&mut self, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
        match col.name.as_ref() {
            "PARTOBJ#" => coerce::number32u(&mut self.part_obj.0, 0, col, value, ctx),
            "LOBJ#" => coerce::number32u(&mut self.l_obj.0, 0, col, value, ctx),
            _ => Ok(()),
        }
    }

    fn touch_refs(&self, touched: &mut Touched) {
        touched.objs.insert(self.l_obj);
        touched.objs.insert(self.part_obj);
    }
}
