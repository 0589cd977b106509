//! Run-time control surface of the dictionary subsystem: the flags word,
//! the ordered replication filter list, database-wide supplemental-log
//! options and default character sets, plus the owned [`Schema`].

use crate::error::Result;
use crate::schema::checkpoint;
use crate::schema::filter::SchemaFilter;
use crate::schema::system_tx::SystemTransaction;
use crate::schema::Schema;

bitflags::bitflags! {
    /// Run-time behavior toggles.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ReplicatorFlags: u64 {
        /// Tolerate catalog redo anomalies (duplicate inserts, updates and
        /// deletes of absent rows) and converge instead of failing. Masks
        /// true corruption; intended for starts from a checkpoint that does
        /// not exactly match the catalog snapshot.
        const ADAPTIVE_SCHEMA = 0x0001;
    }
}

/// Default database character set (AL32UTF8).
pub const DEFAULT_CHARSET_ID: u64 = 873;
/// Default national character set (AL16UTF16).
pub const DEFAULT_NCHAR_CHARSET_ID: u64 = 2000;

pub struct Metadata {
    pub schema: Schema,
    /// Replication filters, in configuration order.
    pub filters: Vec<SchemaFilter>,
    pub flags: ReplicatorFlags,
    /// Database-wide supplemental logging of primary-key columns.
    pub supp_log_db_primary: bool,
    /// Database-wide supplemental logging of all columns.
    pub supp_log_db_all: bool,
    pub default_charset_id: u64,
    pub default_nchar_charset_id: u64,
}

impl Metadata {
    pub fn new(flags: ReplicatorFlags) -> Self {
        Self {
            schema: Schema::new(),
            filters: Vec::new(),
            flags,
            supp_log_db_primary: false,
            supp_log_db_all: false,
            default_charset_id: DEFAULT_CHARSET_ID,
            default_nchar_charset_id: DEFAULT_NCHAR_CHARSET_ID,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        self.flags.contains(ReplicatorFlags::ADAPTIVE_SCHEMA)
    }

    pub fn add_filter(&mut self, filter: SchemaFilter) {
        self.filters.push(filter);
    }

    /// Serialize the mirror and the derived view into the checkpoint schema
    /// document.
    pub fn save_checkpoint(&self) -> Result<String> {
        Ok(checkpoint::to_json(&self.schema)?)
    }

    /// Replace the mirror with the checkpoint's content and force a full
    /// rebuild of the derived view against the current filter list.
    pub fn load_checkpoint(&mut self, text: &str) -> Result<()> {
        self.schema = checkpoint::from_json(text)?;
        self.schema.touched = true;
        let scn = self.schema.scn;
        SystemTransaction::new(self).commit(scn);
        Ok(())
    }
}
