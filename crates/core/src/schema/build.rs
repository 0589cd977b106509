//! Commit-time maintenance of the derived view: drop entries whose backing
//! rows changed or whose preconditions broke, then re-materialize every
//! filter match that is missing.
//!
//! A derived table exists iff its OBJ$ row, its TAB$ row and at least one
//! COL$ row are present and a filter entry accepts `(owner, name)`. The
//! rebuild is idempotent: with an unchanged mirror it produces an identical
//! map and an empty drop set.

use std::collections::HashSet;
use std::sync::Arc;

use itertools::Itertools as _;
use oralog_primitives::{ColId, ConId, ObjId};

use super::catalog::{SysCCol, SysDeferredStg, SysECol, SysObj, SysUser};
use super::derived::{Column, DerivedTables, LobLayout, Table};
use super::filter::SchemaFilter;
use super::Schema;

pub(crate) struct BuildOptions {
    pub supp_log_primary: bool,
    pub supp_log_all: bool,
    pub default_charset_id: u64,
    pub default_nchar_charset_id: u64,
}

fn col_range(obj: ObjId) -> std::ops::RangeInclusive<(ObjId, ColId)> {
    (obj, ColId(i16::MIN))..=(obj, ColId(i16::MAX))
}

fn obj_range(parent: ObjId) -> std::ops::RangeInclusive<(ObjId, ObjId)> {
    (parent, ObjId(0))..=(parent, ObjId(u32::MAX))
}

fn preconditions_hold(schema: &Schema, table: &Table, filters: &[SchemaFilter]) -> bool {
    let Some(obj) = schema.obj.by_key(&table.obj) else {
        return false;
    };
    if schema.tab.by_key(&table.obj).is_none() {
        return false;
    }
    if schema.col.range(col_range(table.obj)).next().is_none() {
        return false;
    }
    let Some(owner) = schema.user.by_key(&obj.owner) else {
        return false;
    };
    filters.iter().any(|filter| filter.matches(&owner.name, &obj.name))
}

fn is_stale(schema: &Schema, table: &Table) -> bool {
    let touched = &schema.touched_refs;
    touched.users.contains(&table.owner_id)
        || touched.tablespaces.contains(&table.ts_id)
        || table.backing.iter().any(|obj| touched.objs.contains(obj))
}

/// Drop every derived entry that no longer satisfies its preconditions or
/// whose backing rows were touched since the last commit.
pub(crate) fn drop_unused(
    schema: &Schema,
    filters: &[SchemaFilter],
    tables: &mut DerivedTables,
    dropped: &mut Vec<String>,
) {
    tables.retain(|_, table| {
        let keep = preconditions_hold(schema, table, filters) && !is_stale(schema, table);
        if !keep {
            dropped.push(table.qualified_name());
        }
        keep
    });
}

/// Walk the filter list in configuration order and materialize every
/// accepted object that is not already present. Within one commit a later
/// filter entry overwrites an earlier one; entries surviving from previous
/// commits are left untouched.
pub(crate) fn build(
    schema: &Schema,
    filters: &[SchemaFilter],
    opts: &BuildOptions,
    tables: &mut DerivedTables,
    updated: &mut Vec<String>,
) {
    let candidates: Vec<&SysObj> = schema
        .obj
        .iter()
        .filter(|obj| obj.is_table())
        .sorted_by_key(|obj| obj.obj)
        .collect();

    let mut built: HashSet<ObjId> = HashSet::new();
    for (origin, filter) in filters.iter().enumerate() {
        for obj in &candidates {
            let Some(owner) = schema.user.by_key(&obj.owner) else {
                continue;
            };
            if !filter.matches(&owner.name, &obj.name) {
                continue;
            }
            if obj.is_temporary() {
                log::trace!(target: "system", "skipping temporary object {}.{}", owner.name, obj.name);
                continue;
            }
            if tables.contains_key(&obj.obj) && !built.contains(&obj.obj) {
                // Survivor from a previous commit; drop_unused vouched for it.
                continue;
            }
            let Some(table) = assemble(schema, obj, owner, origin, filter, opts) else {
                continue;
            };
            if built.insert(obj.obj) {
                updated.push(table.qualified_name());
            }
            tables.insert(obj.obj, Arc::new(table));
        }
    }
}

fn assemble(
    schema: &Schema,
    obj: &SysObj,
    owner: &SysUser,
    origin: usize,
    filter: &SchemaFilter,
    opts: &BuildOptions,
) -> Option<Table> {
    let tab = schema.tab.by_key(&obj.obj)?;
    if schema.col.range(col_range(obj.obj)).next().is_none() {
        return None;
    }

    let mut backing: HashSet<ObjId> = HashSet::new();
    backing.insert(obj.obj);

    let mut columns = Vec::new();
    for col in schema.col.range(col_range(obj.obj)) {
        if col.is_hidden() || col.is_unused() {
            continue;
        }
        let guard_id = schema
            .ecol
            .by_key(&(obj.obj, col.col))
            .and_then(SysECol::guard);
        let lob = schema
            .lob
            .range((obj.obj, col.int_col)..=(obj.obj, col.int_col))
            .next()
            .map(|lob_rec| {
                backing.insert(lob_rec.l_obj);
                let mut partitions = Vec::new();
                let mut fragments = Vec::new();
                for frag in schema.lob_frag.range(obj_range(lob_rec.l_obj)) {
                    fragments.push(frag.frag_obj);
                    backing.insert(frag.frag_obj);
                }
                for part in schema.lob_comp_part.range(obj_range(lob_rec.l_obj)) {
                    partitions.push(part.part_obj);
                    backing.insert(part.part_obj);
                    for frag in schema.lob_frag.range(obj_range(part.part_obj)) {
                        fragments.push(frag.frag_obj);
                        backing.insert(frag.frag_obj);
                    }
                }
                LobLayout {
                    lob_obj: lob_rec.l_obj,
                    ts_id: lob_rec.ts,
                    partitions,
                    fragments,
                }
            });
        let charset_id = if col.charset_id != 0 {
            col.charset_id
        } else if col.charset_form == 2 {
            opts.default_nchar_charset_id
        } else {
            opts.default_charset_id
        };
        columns.push(Column {
            col: col.col,
            seg_col: col.seg_col,
            int_col: col.int_col,
            name: col.name.clone().into(),
            col_type: col.col_type,
            length: col.length,
            precision: col.precision,
            scale: col.scale,
            charset_form: col.charset_form,
            charset_id,
            nullable: col.is_nullable(),
            property: col.property,
            guard_id,
            lob,
        });
    }

    let mut partitions = std::collections::BTreeMap::new();
    let mut subpartitions = std::collections::BTreeMap::new();
    if tab.is_partitioned() {
        for part in schema.tab_part.range(obj_range(obj.obj)) {
            partitions.insert(part.obj, obj.obj);
            backing.insert(part.obj);
        }
        for com_part in schema.tab_com_part.range(obj_range(obj.obj)) {
            partitions.insert(com_part.obj, obj.obj);
            backing.insert(com_part.obj);
            for sub in schema.tab_sub_part.range(obj_range(com_part.obj)) {
                subpartitions.insert(sub.obj, com_part.obj);
                backing.insert(sub.obj);
            }
        }
    }

    let mut primary_key: Vec<ColId> = Vec::new();
    if filter.keys.is_empty() {
        for cdef in schema.cdef.range((obj.obj, ConId(0))..=(obj.obj, ConId(u32::MAX))) {
            if !cdef.is_primary_key() {
                continue;
            }
            for ccol in constraint_cols(schema, obj.obj) {
                if ccol.con == cdef.con && !primary_key.contains(&ccol.int_col) {
                    primary_key.push(ccol.int_col);
                }
            }
        }
    } else {
        for key in &filter.keys {
            if let Some(column) = columns.iter().find(|column| column.name.as_ref() == key) {
                primary_key.push(column.int_col);
            }
        }
    }

    let mut supp_log_cols: Vec<ColId> = if opts.supp_log_all {
        columns.iter().map(|column| column.int_col).collect()
    } else if opts.supp_log_primary {
        primary_key.clone()
    } else {
        Vec::new()
    };
    for ccol in constraint_cols(schema, obj.obj) {
        if ccol.is_supp_log() && !supp_log_cols.contains(&ccol.int_col) {
            supp_log_cols.push(ccol.int_col);
        }
    }
    supp_log_cols.sort();

    let tablespace = schema
        .ts
        .by_key(&tab.ts)
        .map(|ts| ts.name.clone())
        .unwrap_or_default();
    let compressed = tab.is_binary_compressed()
        || schema
            .deferred_stg
            .by_key(&obj.obj)
            .is_some_and(SysDeferredStg::is_compressed);

    Some(Table {
        obj: obj.obj,
        data_obj: tab.data_obj,
        owner_id: obj.owner,
        ts_id: tab.ts,
        owner: owner.name.clone().into(),
        name: obj.name.clone().into(),
        clu_cols: tab.clu_cols,
        tablespace: tablespace.into(),
        columns,
        partitions,
        subpartitions,
        primary_key,
        supp_log_cols,
        compressed,
        options: filter.options,
        filter_origin: origin,
        backing,
    })
}

fn constraint_cols(schema: &Schema, obj: ObjId) -> impl Iterator<Item = &SysCCol> {
    schema
        .ccol
        .range((obj, ColId(i16::MIN), ConId(0))..=(obj, ColId(i16::MAX), ConId(u32::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{SysCDef, SysCol, SysObj, SysTab, SysTabPart, SysTabSubPart, SysTabComPart, SysTs};
    use crate::schema::derived::DerivedTables;
    use crate::schema::store::SysRecord;
    use oralog_primitives::{DataObjId, IntX, RowId, TableOptions, TsId, UserId};
    use pretty_assertions::assert_eq;

    fn rowid(n: u32) -> RowId {
        RowId::new(n, 1, 0)
    }

    // One plain HR.EMP table: obj 100, two columns, pk on ID via con 7.
    fn seed(schema: &mut Schema) {
        schema
            .user
            .add(SysUser {
                user: UserId(42),
                name: "HR".into(),
                ..SysUser::new(rowid(1))
            })
            .unwrap();
        schema
            .obj
            .add(SysObj {
                owner: UserId(42),
                obj: ObjId(100),
                data_obj: DataObjId(100),
                obj_type: 2,
                name: "EMP".into(),
                ..SysObj::new(rowid(2))
            })
            .unwrap();
        schema
            .tab
            .add(SysTab {
                obj: ObjId(100),
                data_obj: DataObjId(100),
                ts: TsId(1),
                ..SysTab::new(rowid(3))
            })
            .unwrap();
        for (row, int_col, name) in [(4, 1, "ID"), (5, 2, "SAL")] {
            schema
                .col
                .add(SysCol {
                    obj: ObjId(100),
                    col: ColId(int_col),
                    seg_col: ColId(int_col),
                    int_col: ColId(int_col),
                    name: name.into(),
                    col_type: 2,
                    length: 22,
                    ..SysCol::new(rowid(row))
                })
                .unwrap();
        }
        schema
            .cdef
            .add(SysCDef {
                con: ConId(7),
                obj: ObjId(100),
                def_type: 2,
                ..SysCDef::new(rowid(6))
            })
            .unwrap();
        schema
            .ccol
            .add(SysCCol {
                con: ConId(7),
                int_col: ColId(1),
                obj: ObjId(100),
                ..SysCCol::new(rowid(7))
            })
            .unwrap();
        schema
            .ts
            .add(SysTs {
                ts: TsId(1),
                name: "USERS".into(),
                block_size: 8192,
                ..SysTs::new(rowid(8))
            })
            .unwrap();
    }

    fn opts() -> BuildOptions {
        BuildOptions {
            supp_log_primary: false,
            supp_log_all: false,
            default_charset_id: 873,
            default_nchar_charset_id: 2000,
        }
    }

    fn run_build(schema: &Schema, filters: &[SchemaFilter], opts: &BuildOptions) -> DerivedTables {
        let mut tables = DerivedTables::new();
        let mut updated = Vec::new();
        build(schema, filters, opts, &mut tables, &mut updated);
        tables
    }

    #[test]
    fn primary_key_comes_from_constraints() {
        let mut schema = Schema::new();
        seed(&mut schema);
        let filters = [SchemaFilter::new("HR", "EMP").unwrap()];
        let tables = run_build(&schema, &filters, &opts());
        let table = &tables[&ObjId(100)];
        assert_eq!(table.primary_key, vec![ColId(1)]);
        assert_eq!(table.tablespace.as_ref(), "USERS");
        assert!(table.supp_log_cols.is_empty());
    }

    #[test]
    fn filter_key_override_beats_constraints() {
        let mut schema = Schema::new();
        seed(&mut schema);
        let filters = [SchemaFilter::new("HR", "EMP").unwrap().with_keys(&["SAL"])];
        let tables = run_build(&schema, &filters, &opts());
        assert_eq!(tables[&ObjId(100)].primary_key, vec![ColId(2)]);
    }

    #[test]
    fn supplemental_logging_expands_the_column_set() {
        let mut schema = Schema::new();
        seed(&mut schema);
        let filters = [SchemaFilter::new("HR", "EMP").unwrap()];

        let primary = BuildOptions {
            supp_log_primary: true,
            ..opts()
        };
        let tables = run_build(&schema, &filters, &primary);
        assert_eq!(tables[&ObjId(100)].supp_log_cols, vec![ColId(1)]);

        let all = BuildOptions {
            supp_log_all: true,
            ..opts()
        };
        let tables = run_build(&schema, &filters, &all);
        assert_eq!(tables[&ObjId(100)].supp_log_cols, vec![ColId(1), ColId(2)]);
    }

    #[test]
    fn marked_constraint_columns_join_supplemental_set() {
        let mut schema = Schema::new();
        seed(&mut schema);
        schema
            .ccol
            .add(SysCCol {
                con: ConId(8),
                int_col: ColId(2),
                obj: ObjId(100),
                spare1: IntX(1),
                ..SysCCol::new(rowid(9))
            })
            .unwrap();
        let filters = [SchemaFilter::new("HR", "EMP").unwrap()];
        let tables = run_build(&schema, &filters, &opts());
        assert_eq!(tables[&ObjId(100)].supp_log_cols, vec![ColId(2)]);
    }

    #[test]
    fn partition_rollup_follows_base_and_parent_links() {
        let mut schema = Schema::new();
        seed(&mut schema);
        // Mark EMP partitioned, with one plain partition and one composite
        // partition carrying a subpartition.
        let tab_rowid = schema.tab.by_key(&ObjId(100)).unwrap().row_id();
        let mut tab = schema.tab.remove(tab_rowid).unwrap();
        tab.property = IntX(1 << 5);
        schema.tab.add(tab).unwrap();
        schema
            .tab_part
            .add(SysTabPart {
                obj: ObjId(201),
                data_obj: DataObjId(201),
                bo: ObjId(100),
                ..SysTabPart::new(rowid(20))
            })
            .unwrap();
        schema
            .tab_com_part
            .add(SysTabComPart {
                obj: ObjId(202),
                data_obj: DataObjId(202),
                bo: ObjId(100),
                ..SysTabComPart::new(rowid(21))
            })
            .unwrap();
        schema
            .tab_sub_part
            .add(SysTabSubPart {
                obj: ObjId(203),
                data_obj: DataObjId(203),
                p_obj: ObjId(202),
                ..SysTabSubPart::new(rowid(22))
            })
            .unwrap();

        let filters = [SchemaFilter::new("HR", "EMP").unwrap()];
        let tables = run_build(&schema, &filters, &opts());
        let table = &tables[&ObjId(100)];
        assert_eq!(table.partitions[&ObjId(201)], ObjId(100));
        assert_eq!(table.partitions[&ObjId(202)], ObjId(100));
        assert_eq!(table.subpartitions[&ObjId(203)], ObjId(202));
        assert!(table.backing.contains(&ObjId(203)));
    }

    #[test]
    fn later_filter_wins_within_one_build() {
        let mut schema = Schema::new();
        seed(&mut schema);
        let filters = [
            SchemaFilter::new("HR", ".*").unwrap(),
            SchemaFilter::new("HR", "EMP")
                .unwrap()
                .with_options(TableOptions::DEBUG_TABLE),
        ];
        let tables = run_build(&schema, &filters, &opts());
        let table = &tables[&ObjId(100)];
        assert_eq!(table.filter_origin, 1);
        assert_eq!(table.options, TableOptions::DEBUG_TABLE);
    }

    #[test]
    fn temporary_objects_are_skipped() {
        let mut schema = Schema::new();
        seed(&mut schema);
        let obj_rowid = schema.obj.by_key(&ObjId(100)).unwrap().row_id();
        let mut obj = schema.obj.remove(obj_rowid).unwrap();
        obj.flags = IntX(2);
        schema.obj.add(obj).unwrap();

        let filters = [SchemaFilter::new("HR", "EMP").unwrap()];
        let tables = run_build(&schema, &filters, &opts());
        assert!(tables.is_empty());
    }
}
