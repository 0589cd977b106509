//! Online dictionary maintenance for the redo-log replicator.
//!
//! The replicator decodes raw row images out of the source database's redo
//! stream; turning those images into schema-aware change records requires a
//! live mirror of the source data dictionary. This crate is that mirror:
//!
//! - [`schema::Schema`] holds normalized copies of the `SYS.*` catalog
//!   tables, each indexed by rowid and by the secondary keys the rebuild
//!   path scans.
//! - [`schema::system_tx::SystemTransaction`] consumes the row-level redo
//!   operations that target catalog tables and keeps the mirror consistent,
//!   optionally self-healing under catalog drift.
//! - At commit, the changed portion of the derived view is dropped and
//!   rebuilt; downstream consumers read it through
//!   [`schema::derived::SchemaReader`] with reference-counted table
//!   handles.
//! - [`schema::checkpoint`] round-trips the whole state through the JSON
//!   checkpoint schema file.
//!
//! The mirror is single-writer (the transaction-reassembly thread); only
//! the derived view is shared across threads.

mod charset;
pub mod error;
pub mod metadata;
pub mod schema;

pub use oralog_primitives::{ColId, ConId, DataObjId, FileOffset, IntX, ObjId, RowId, Scn, TableOptions, TsId, UserId};

pub use error::{DdlError, DictError, Result};
pub use metadata::{Metadata, ReplicatorFlags};
pub use schema::derived::{Column, LobLayout, SchemaReader, Table};
pub use schema::filter::SchemaFilter;
pub use schema::system_tx::SystemTransaction;
pub use schema::Schema;
