//! The user-supplied replication filter list.
//!
//! Entries are evaluated in configuration order; when several entries match
//! the same object, the later entry wins on conflicting options.

use oralog_primitives::TableOptions;
use regex::Regex;

/// One `(owner-pattern, table-pattern)` replication filter entry.
#[derive(Debug, Clone)]
pub struct SchemaFilter {
    owner: Regex,
    table: Regex,
    /// Primary-key override by column name; empty means "derive from
    /// constraints".
    pub keys: Vec<String>,
    pub keys_str: String,
    pub options: TableOptions,
}

impl SchemaFilter {
    /// Compile a filter entry; patterns must match the whole name.
    pub fn new(owner: &str, table: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            owner: anchored(owner)?,
            table: anchored(table)?,
            keys: Vec::new(),
            keys_str: String::new(),
            options: TableOptions::empty(),
        })
    }

    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|key| key.to_string()).collect();
        self.keys_str = self.keys.join(",");
        self
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn matches(&self, owner: &str, table: &str) -> bool {
        self.owner.is_match(owner) && self.table.is_match(table)
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}
