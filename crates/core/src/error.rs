use oralog_primitives::{FileOffset, RowId};
use thiserror::Error;

use crate::schema::catalog::SystemTable;

pub type Result<T> = std::result::Result<T, DictError>;

#[derive(Error, Debug)]
pub enum DictError {
    #[error("DdlError: {0}")]
    Ddl(#[from] DdlError),
    #[error("CheckpointError: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures while applying redo against a mirrored dictionary table.
///
/// `table` is the `owner.name` of the catalog table as handed in by the
/// disassembler, `offset` the redo-file position of the offending record.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DdlError {
    #[error("ddl: column type mismatch for {table}: column {column} type found {found} at offset: {offset}")]
    TypeMismatch {
        table: String,
        column: Box<str>,
        found: u16,
        offset: FileOffset,
    },
    #[error("ddl: invalid value for {table}: column {column} value found `{value}` at offset: {offset}")]
    ValueRejected {
        table: String,
        column: Box<str>,
        value: String,
        offset: FileOffset,
    },
    #[error("ddl: duplicate {table}: (rowid: {row_id}) for insert at offset: {offset}")]
    DuplicateRow {
        table: String,
        row_id: RowId,
        offset: FileOffset,
    },
    // Tolerated by the interpreter; surfaced only as a warning on the
    // `system` trace channel.
    #[error("ddl: missing {table}: (rowid: {row_id}) for {op} at offset: {offset}")]
    MissingRow {
        table: String,
        row_id: RowId,
        op: &'static str,
        offset: FileOffset,
    },
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("schema file version `{found}` does not match replicator version `{expected}`")]
    VersionMismatch { found: String, expected: &'static str },
    #[error("schema file malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("schema file contains duplicate {table} rowid {row_id}")]
    DuplicateRowId { table: SystemTable, row_id: RowId },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
