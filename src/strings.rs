//! Parses a contiguous UTF-16LE, NUL-separated string table into an indexable
//! list of entries. Used both for the filename-strings section and for a
//! volume's directory-strings array.

use crate::error::{Result, ScccaError};

/// One decoded entry from a [`parse_string_table`] call.
///
/// Keeps both the UTF-8 projection (for ordinary use) and the raw UTF-16 code
/// units (for callers that need to round-trip exactly what was on disk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTableEntry {
    pub start_byte_offset: usize,
    pub char_count: usize,
    value: String,
    utf16: Vec<u16>,
}

impl StringTableEntry {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn as_utf16(&self) -> &[u16] {
        &self.utf16
    }
}

/// Parses `buf` as a sequence of UTF-16LE strings, each terminated by a
/// single NUL code unit. A trailing empty string produced by a final
/// separator is dropped; an unterminated trailing run is still surfaced.
pub fn parse_string_table(buf: &[u8]) -> Result<Vec<StringTableEntry>> {
    if buf.len() % 2 != 0 {
        return Err(ScccaError::MalformedStringTable(format!(
            "odd byte length {}",
            buf.len()
        )));
    }

    let units: Vec<u16> = buf
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut start = 0usize;
    for (i, &unit) in units.iter().enumerate() {
        if unit == 0 {
            spans.push((start, i));
            start = i + 1;
        }
    }
    if start != units.len() {
        spans.push((start, units.len()));
    }
    if let Some(&(s, e)) = spans.last() {
        if s == e {
            spans.pop();
        }
    }

    let mut entries = Vec::with_capacity(spans.len());
    for (s, e) in spans {
        let slice = &units[s..e];
        let value = String::from_utf16_lossy(slice);
        entries.push(StringTableEntry {
            start_byte_offset: s * 2,
            char_count: e - s,
            value,
            utf16: slice.to_vec(),
        });
    }
    Ok(entries)
}
