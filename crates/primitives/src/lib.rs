//! Identifier newtypes shared across the replicator.
//!
//! These mirror the source database's logical identifiers (object, user,
//! constraint, tablespace numbers), the physical [`RowId`], and the wide
//! unsigned [`IntX`] used for catalog bitset columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_u32 {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

id_u32!(
    /// Logical object number (`OBJ#`).
    ObjId
);
id_u32!(
    /// Physical data object number (`DATAOBJ#`); changes when a segment is
    /// rebuilt, unlike [`ObjId`].
    DataObjId
);
id_u32!(
    /// User number (`USER#`).
    UserId
);
id_u32!(
    /// Constraint number (`CON#`).
    ConId
);
id_u32!(
    /// Tablespace number (`TS#`).
    TsId
);

/// Column ordinal within an object (`COL#` / `INTCOL#` / `SEGCOL#`).
///
/// Signed: the source database uses negative ordinals for special columns.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColId(pub i16);

impl fmt::Display for ColId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i16> for ColId {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

/// System change number, the source database's transaction timestamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scn(pub u64);

impl Scn {
    /// Sentinel for "no SCN recorded yet".
    pub const NONE: Scn = Scn(u64::MAX);
}

impl fmt::Display for Scn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Byte offset of a redo record within its log file; carried through every
/// row operation for diagnostics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileOffset(pub u64);

impl fmt::Display for FileOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

bitflags::bitflags! {
    /// Per-filter-entry replication options.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct TableOptions: u8 {
        /// Emit extra diagnostics for rows of this table.
        const DEBUG_TABLE = 0x01;
        /// The entry matches dictionary tables themselves.
        const SYSTEM_TABLE = 0x02;
    }
}

impl Serialize for TableOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for TableOptions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

const ROWID_LEN: usize = 18;
const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Physical record address: data object number, data block address and slot.
///
/// The canonical form is the source database's 18-character encoding
/// (6 characters of object, 3 of file, 6 of block, 3 of slot, each a
/// big-endian group of 6-bit digits).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId {
    pub data_obj: u32,
    pub dba: u32,
    pub slot: u16,
}

impl RowId {
    pub fn new(data_obj: u32, dba: u32, slot: u16) -> Self {
        Self { data_obj, dba, slot }
    }

    /// File number, the top 10 bits of the block address.
    #[inline]
    pub fn file(&self) -> u32 {
        self.dba >> 22
    }

    /// Block number within the file, the low 22 bits of the block address.
    #[inline]
    pub fn block(&self) -> u32 {
        self.dba & 0x003f_ffff
    }
}

fn push_b64(out: &mut String, value: u64, digits: u32) {
    for pos in (0..digits).rev() {
        let digit = ((value >> (6 * pos)) & 0x3f) as usize;
        out.push(B64[digit] as char);
    }
}

fn b64_digit(c: u8) -> Option<u64> {
    match c {
        b'A'..=b'Z' => Some((c - b'A') as u64),
        b'a'..=b'z' => Some((c - b'a') as u64 + 26),
        b'0'..=b'9' => Some((c - b'0') as u64 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

fn parse_b64(input: &[u8]) -> Option<u64> {
    let mut value = 0u64;
    for &c in input {
        value = (value << 6) | b64_digit(c)?;
    }
    Some(value)
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(ROWID_LEN);
        push_b64(&mut out, self.data_obj as u64, 6);
        push_b64(&mut out, self.file() as u64, 3);
        push_b64(&mut out, self.block() as u64, 6);
        push_b64(&mut out, self.slot as u64, 3);
        f.write_str(&out)
    }
}

/// Error returned when a string is not a canonical 18-character rowid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rowid `{0}`")]
pub struct InvalidRowId(pub String);

impl FromStr for RowId {
    type Err = InvalidRowId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != ROWID_LEN {
            return Err(InvalidRowId(s.into()));
        }
        let bad = || InvalidRowId(s.into());
        let data_obj = parse_b64(&bytes[0..6]).ok_or_else(bad)?;
        let file = parse_b64(&bytes[6..9]).ok_or_else(bad)?;
        let block = parse_b64(&bytes[9..15]).ok_or_else(bad)?;
        let slot = parse_b64(&bytes[15..18]).ok_or_else(bad)?;
        if data_obj > u32::MAX as u64 || file > 0x3ff || block > 0x003f_ffff || slot > u16::MAX as u64 {
            return Err(InvalidRowId(s.into()));
        }
        Ok(RowId {
            data_obj: data_obj as u32,
            dba: ((file as u32) << 22) | block as u32,
            slot: slot as u16,
        })
    }
}

impl Serialize for RowId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Wide unsigned integer backing catalog `NUMBER` bitset columns
/// (`PROPERTY`, `FLAGS`, `SPARE1`), which can exceed 64 bits.
///
/// Serialized as a decimal string so checkpoints stay plain JSON.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntX(pub u128);

impl IntX {
    pub const ZERO: IntX = IntX(0);

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when bit `n` (zero-based) is set.
    #[inline]
    pub fn bit(&self, n: u32) -> bool {
        self.0 & (1u128 << n) != 0
    }

    /// True when any of the bits in `mask` are set.
    #[inline]
    pub fn any(&self, mask: u128) -> bool {
        self.0 & mask != 0
    }
}

impl fmt::Display for IntX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u128> for IntX {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for IntX {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl FromStr for IntX {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(IntX)
    }
}

impl Serialize for IntX {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IntX {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rowid_zero_is_all_a() {
        let rowid = RowId::default();
        assert_eq!(rowid.to_string(), "AAAAAAAAAAAAAAAAAA");
        assert_eq!("AAAAAAAAAAAAAAAAAA".parse::<RowId>().unwrap(), rowid);
    }

    #[test]
    fn rowid_encodes_fields_in_order() {
        let rowid = RowId::new(1, (2 << 22) | 3, 4);
        assert_eq!(rowid.file(), 2);
        assert_eq!(rowid.block(), 3);
        assert_eq!(rowid.to_string(), "AAAAABAACAAAAADAAE");
    }

    #[test]
    fn rowid_rejects_bad_input() {
        assert!("".parse::<RowId>().is_err());
        assert!("AAAAAAAAAAAAAAAAA".parse::<RowId>().is_err());
        assert!("AAAAAAAAAAAAAAAAA*".parse::<RowId>().is_err());
    }

    #[test]
    fn intx_parses_and_prints_decimal() {
        let value: IntX = "340282366920938463463374607431768211455".parse().unwrap();
        assert_eq!(value.0, u128::MAX);
        assert_eq!(value.to_string(), "340282366920938463463374607431768211455");
        assert!("".parse::<IntX>().is_err());
        assert!("-1".parse::<IntX>().is_err());
    }

    #[test]
    fn intx_bit_tests() {
        let value = IntX(0b10100);
        assert!(value.bit(2));
        assert!(!value.bit(3));
        assert!(value.any(0b100));
        assert!(!value.any(0b1000));
    }

    proptest! {
        #[test]
        fn rowid_roundtrips(data_obj in any::<u32>(), file in 0u32..1024, block in 0u32..0x0040_0000, slot in any::<u16>()) {
            let rowid = RowId::new(data_obj, (file << 22) | block, slot);
            let text = rowid.to_string();
            prop_assert_eq!(text.len(), 18);
            prop_assert_eq!(text.parse::<RowId>().unwrap(), rowid);
        }
    }
}
