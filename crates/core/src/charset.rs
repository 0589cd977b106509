//! Character-set decoding for catalog string columns.
//!
//! The dictionary only ever stores identifiers, so the supported set is
//! narrow: the UTF-8 family, 7-bit ASCII and UTF-16BE. Unknown ids decode
//! as UTF-8.

pub(crate) const CHARSET_US7ASCII: u64 = 1;
pub(crate) const CHARSET_AL16UTF16: u64 = 2000;

/// Decode `bytes` under `charset_id`; `None` when the bytes are not valid
/// in that character set.
pub(crate) fn decode(charset_id: u64, bytes: &[u8]) -> Option<String> {
    match charset_id {
        CHARSET_US7ASCII => bytes
            .iter()
            .all(u8::is_ascii)
            .then(|| String::from_utf8_lossy(bytes).into_owned()),
        CHARSET_AL16UTF16 => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        // 871 (UTF8), 873 (AL32UTF8) and anything unrecognized.
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_rejects_high_bytes() {
        assert_eq!(decode(CHARSET_US7ASCII, b"EMP").as_deref(), Some("EMP"));
        assert_eq!(decode(CHARSET_US7ASCII, &[0x80]), None);
    }

    #[test]
    fn utf16be_decodes_pairs() {
        assert_eq!(decode(CHARSET_AL16UTF16, &[0x00, 0x45, 0x00, 0x4d]).as_deref(), Some("EM"));
        assert_eq!(decode(CHARSET_AL16UTF16, &[0x00]), None);
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode(0, "naïve".as_bytes()).as_deref(), Some("naïve"));
        assert_eq!(decode(0, &[0xff, 0xfe]), None);
    }
}
