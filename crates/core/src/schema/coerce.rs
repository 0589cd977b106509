//! Typed coercions from redo column images to catalog record fields.
//!
//! All coercions share one shape: a present, non-empty after-image is
//! checked against the source column type and parsed into the field; a set
//! column whose after-image is empty or absent resets the field to its
//! null-equivalent default; a column with neither image leaves the field
//! untouched.

use std::fmt::Display;
use std::str::FromStr;

use oralog_primitives::{FileOffset, IntX};

use crate::charset;
use crate::error::DdlError;

use super::values::{col_type, ColumnMeta, TableMeta, ValueRef};

pub(crate) struct ApplyCtx<'a> {
    pub table: &'a TableMeta,
    pub offset: FileOffset,
    pub default_charset_id: u64,
}

impl ApplyCtx<'_> {
    fn mismatch(&self, col: &ColumnMeta) -> DdlError {
        DdlError::TypeMismatch {
            table: self.table.qualified_name(),
            column: col.name.clone(),
            found: col.col_type,
            offset: self.offset,
        }
    }

    fn rejected(&self, col: &ColumnMeta, value: &[u8]) -> DdlError {
        DdlError::ValueRejected {
            table: self.table.qualified_name(),
            column: col.name.clone(),
            value: String::from_utf8_lossy(value).into_owned(),
            offset: self.offset,
        }
    }
}

/// Digits of a NUMBER column, checked against the source type.
fn number_text<'a>(col: &ColumnMeta, after: &'a [u8], ctx: &ApplyCtx<'_>) -> Result<&'a str, DdlError> {
    if col.col_type != col_type::NUMBER {
        return Err(ctx.mismatch(col));
    }
    std::str::from_utf8(after).map_err(|_| ctx.rejected(col, after))
}

fn set_signed<T>(field: &mut T, default: T, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError>
where
    T: FromStr + Display + Copy,
{
    match value.after {
        Some(after) if !after.is_empty() => {
            let text = number_text(col, after, ctx)?;
            let new = text.parse::<T>().map_err(|_| ctx.rejected(col, after))?;
            log::trace!(target: "system", "set ({}: {} -> {})", col.name, field, new);
            *field = new;
        }
        _ if value.after.is_some() || value.before.is_some() => {
            log::trace!(target: "system", "set ({}: {} -> NULL)", col.name, field);
            *field = default;
        }
        _ => {}
    }
    Ok(())
}

fn set_unsigned<T>(field: &mut T, default: T, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError>
where
    T: FromStr + Display + Copy,
{
    match value.after {
        Some(after) if !after.is_empty() => {
            let text = number_text(col, after, ctx)?;
            // An unsigned field never accepts a sign, whatever the digits.
            if text.starts_with('-') {
                return Err(ctx.rejected(col, after));
            }
            let new = text.parse::<T>().map_err(|_| ctx.rejected(col, after))?;
            log::trace!(target: "system", "set ({}: {} -> {})", col.name, field, new);
            *field = new;
        }
        _ if value.after.is_some() || value.before.is_some() => {
            log::trace!(target: "system", "set ({}: {} -> NULL)", col.name, field);
            *field = default;
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn number16(field: &mut i16, default: i16, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    set_signed(field, default, col, value, ctx)
}

pub(crate) fn number16u(field: &mut u16, default: u16, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    set_unsigned(field, default, col, value, ctx)
}

pub(crate) fn number32u(field: &mut u32, default: u32, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    set_unsigned(field, default, col, value, ctx)
}

pub(crate) fn number64(field: &mut i64, default: i64, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    set_signed(field, default, col, value, ctx)
}

pub(crate) fn number64u(field: &mut u64, default: u64, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    set_unsigned(field, default, col, value, ctx)
}

/// Wide unsigned coercion for bitset columns; null resets to zero.
pub(crate) fn numberxu(field: &mut IntX, col: &ColumnMeta, value: ValueRef<'_>, ctx: &ApplyCtx<'_>) -> Result<(), DdlError> {
    match value.after {
        Some(after) if !after.is_empty() => {
            let text = number_text(col, after, ctx)?;
            if text.starts_with('-') {
                return Err(ctx.rejected(col, after));
            }
            let new: IntX = text.parse().map_err(|_| ctx.rejected(col, after))?;
            log::trace!(target: "system", "set ({}: {} -> {})", col.name, field, new);
            *field = new;
        }
        _ if value.after.is_some() || value.before.is_some() => {
            log::trace!(target: "system", "set ({}: {} -> NULL)", col.name, field);
            *field = IntX::ZERO;
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn string(
    field: &mut String,
    max_length: usize,
    col: &ColumnMeta,
    value: ValueRef<'_>,
    ctx: &ApplyCtx<'_>,
) -> Result<(), DdlError> {
    match value.after {
        Some(after) if !after.is_empty() => {
            if col.col_type != col_type::VARCHAR && col.col_type != col_type::CHAR {
                return Err(ctx.mismatch(col));
            }
            let charset_id = if col.charset_id != 0 {
                col.charset_id
            } else {
                ctx.default_charset_id
            };
            let new = charset::decode(charset_id, after).ok_or_else(|| ctx.rejected(col, after))?;
            if new.len() > max_length {
                return Err(ctx.rejected(col, after));
            }
            log::trace!(target: "system", "set ({}: '{}' -> '{}')", col.name, field, new);
            *field = new;
        }
        _ if value.after.is_some() || value.before.is_some() => {
            log::trace!(target: "system", "set ({}: '{}' -> NULL)", col.name, field);
            field.clear();
        }
        _ => {}
    }
    Ok(())
}
