//! Input contract of the system-transaction interpreter: the catalog table
//! descriptor handed in by the record disassembler and the sparse
//! before/after column projection of one row operation.

use std::collections::BTreeMap;

use super::catalog::SystemTable;

/// Source column type codes as they appear in the catalog.
pub mod col_type {
    pub const VARCHAR: u16 = 1;
    pub const NUMBER: u16 = 2;
    pub const CHAR: u16 = 96;
}

/// One column of the catalog table as the disassembler describes it.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: Box<str>,
    pub col_type: u16,
    /// Character set id for string columns; 0 means "database default".
    pub charset_id: u64,
}

impl ColumnMeta {
    pub fn new(name: &str, col_type: u16) -> Self {
        Self {
            name: name.into(),
            col_type,
            charset_id: 0,
        }
    }
}

/// Descriptor of the catalog table a row operation targets.
///
/// Column order must match the positions used by the accompanying
/// [`ValueVector`]; the interpreter dispatches by column *name*, so layouts
/// from different source versions are tolerated.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub table: SystemTable,
    pub owner: Box<str>,
    pub name: Box<str>,
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn new(table: SystemTable, owner: &str, name: &str, columns: Vec<ColumnMeta>) -> Self {
        Self {
            table,
            owner: owner.into(),
            name: name.into(),
            columns,
        }
    }

    /// `owner.name`, as carried in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// The stock layout of a dictionary table, restricted to the columns the
    /// interpreter mirrors. Real deployments may hand in wider layouts; the
    /// by-name dispatch ignores the rest.
    pub fn builtin(table: SystemTable) -> Self {
        let number = |name| ColumnMeta::new(name, col_type::NUMBER);
        let string = |name| ColumnMeta::new(name, col_type::VARCHAR);
        let columns = match table {
            SystemTable::CCol => vec![number("CON#"), number("OBJ#"), number("INTCOL#"), number("SPARE1")],
            SystemTable::CDef => vec![number("CON#"), number("OBJ#"), number("TYPE#")],
            SystemTable::Col => vec![
                number("OBJ#"),
                number("COL#"),
                number("SEGCOL#"),
                number("INTCOL#"),
                string("NAME"),
                number("TYPE#"),
                number("LENGTH"),
                number("PRECISION#"),
                number("SCALE"),
                number("CHARSETFORM"),
                number("CHARSETID"),
                number("NULL$"),
                number("PROPERTY"),
            ],
            SystemTable::DeferredStg => vec![number("OBJ#"), number("FLAGS_STG")],
            SystemTable::ECol => vec![number("TABOBJ#"), number("COLNUM"), number("GUARD_ID")],
            SystemTable::Lob => vec![
                number("OBJ#"),
                number("COL#"),
                number("INTCOL#"),
                number("LOBJ#"),
                number("TS#"),
            ],
            SystemTable::LobCompPart => vec![number("PARTOBJ#"), number("LOBJ#")],
            SystemTable::LobFrag => vec![number("FRAGOBJ#"), number("PARENTOBJ#"), number("TS#")],
            SystemTable::Obj => vec![
                number("OBJ#"),
                number("DATAOBJ#"),
                number("OWNER#"),
                string("NAME"),
                number("TYPE#"),
                number("FLAGS"),
            ],
            SystemTable::Seg => vec![number("FILE#"), number("BLOCK#"), number("TS#"), number("SPARE1")],
            SystemTable::Tab => vec![
                number("OBJ#"),
                number("DATAOBJ#"),
                number("TS#"),
                number("CLUCOLS"),
                number("FLAGS"),
                number("PROPERTY"),
            ],
            SystemTable::TabComPart | SystemTable::TabPart => {
                vec![number("OBJ#"), number("DATAOBJ#"), number("BO#")]
            }
            SystemTable::TabSubPart => vec![number("OBJ#"), number("DATAOBJ#"), number("POBJ#")],
            SystemTable::Ts => vec![number("TS#"), string("NAME"), number("BLOCKSIZE")],
            SystemTable::User => vec![number("USER#"), string("NAME"), number("SPARE1")],
        };
        Self::new(table, "SYS", table.table_name(), columns)
    }
}

/// Before/after images of one column; either side may be absent (null).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnImages {
    pub before: Option<Vec<u8>>,
    pub after: Option<Vec<u8>>,
}

impl ColumnImages {
    pub fn as_ref(&self) -> ValueRef<'_> {
        ValueRef {
            before: self.before.as_deref(),
            after: self.after.as_deref(),
        }
    }
}

/// Borrowed view of one column's images, as the coercions consume it.
#[derive(Debug, Clone, Copy)]
pub struct ValueRef<'a> {
    pub before: Option<&'a [u8]>,
    pub after: Option<&'a [u8]>,
}

/// Sparse projection of one row operation: column position to image pair.
///
/// Only positions that were set are visited by the interpreter; a set
/// position with two absent images still resets nothing and overwrites
/// nothing on its own (the coercion decides).
#[derive(Debug, Clone, Default)]
pub struct ValueVector {
    slots: BTreeMap<u16, ColumnImages>,
}

impl ValueVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: u16, before: Option<&[u8]>, after: Option<&[u8]>) {
        self.slots.insert(
            pos,
            ColumnImages {
                before: before.map(<[u8]>::to_vec),
                after: after.map(<[u8]>::to_vec),
            },
        );
    }

    /// Builder form of [`Self::set`].
    pub fn with(mut self, pos: u16, before: Option<&[u8]>, after: Option<&[u8]>) -> Self {
        self.set(pos, before, after);
        self
    }

    /// Convenience for an after-image-only change.
    pub fn with_after(self, pos: u16, after: &[u8]) -> Self {
        self.with(pos, None, Some(after))
    }

    pub fn is_set(&self, pos: u16) -> bool {
        self.slots.contains_key(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ColumnImages)> {
        self.slots.iter().map(|(pos, images)| (*pos, images))
    }
}
