//! Walks the metrics array: per-file statistics (start time, duration,
//! optional MFT reference) for files touched during the traced launch.

use nom::IResult;

use crate::codec::{le_u32_nom, le_u64_nom, run};
use crate::error::Result;
use crate::model::FileReference;
use crate::reader::{read_exact_at, ByteReader};

pub(crate) const ENTRY_SIZE_V17: usize = 20;
pub(crate) const ENTRY_SIZE_V23_V26: usize = 32;

pub(crate) fn entry_size(format_version: u32) -> usize {
    if format_version == 17 {
        ENTRY_SIZE_V17
    } else {
        ENTRY_SIZE_V23_V26
    }
}

/// One metrics-array record. `average_duration_ms` and `file_reference` are
/// only present in formats 23/26; fields are surfaced verbatim, with no
/// ordering or uniqueness guarantee imposed by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsEntry {
    pub start_time_ms: u32,
    pub duration_ms: u32,
    pub filename_string_offset: u32,
    pub filename_string_number_of_characters: u32,
    pub flags: u32,
    pub average_duration_ms: Option<u32>,
    pub file_reference: Option<FileReference>,
}

fn parse_v17(buf: &[u8]) -> IResult<&[u8], MetricsEntry> {
    let (buf, start_time_ms) = le_u32_nom(buf)?;
    let (buf, duration_ms) = le_u32_nom(buf)?;
    let (buf, filename_string_offset) = le_u32_nom(buf)?;
    let (buf, filename_string_number_of_characters) = le_u32_nom(buf)?;
    let (buf, flags) = le_u32_nom(buf)?;
    Ok((
        buf,
        MetricsEntry {
            start_time_ms,
            duration_ms,
            filename_string_offset,
            filename_string_number_of_characters,
            flags,
            average_duration_ms: None,
            file_reference: None,
        },
    ))
}

fn parse_v23_v26(buf: &[u8]) -> IResult<&[u8], MetricsEntry> {
    let (buf, start_time_ms) = le_u32_nom(buf)?;
    let (buf, duration_ms) = le_u32_nom(buf)?;
    let (buf, average_duration_ms) = le_u32_nom(buf)?;
    let (buf, filename_string_offset) = le_u32_nom(buf)?;
    let (buf, filename_string_number_of_characters) = le_u32_nom(buf)?;
    let (buf, flags) = le_u32_nom(buf)?;
    let (buf, file_reference) = le_u64_nom(buf)?;
    Ok((
        buf,
        MetricsEntry {
            start_time_ms,
            duration_ms,
            filename_string_offset,
            filename_string_number_of_characters,
            flags,
            average_duration_ms: Some(average_duration_ms),
            file_reference: Some(FileReference(file_reference)),
        },
    ))
}

/// Reads `count` entries starting at the absolute file `offset`. Tolerant of
/// `count == 0`, in which case no read is issued.
pub(crate) fn decode_metrics<R: ByteReader>(
    reader: &mut R,
    offset: u64,
    count: u32,
    format_version: u32,
) -> Result<Vec<MetricsEntry>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let size = entry_size(format_version);
    let mut buf = vec![0u8; size * count as usize];
    read_exact_at(reader, offset, &mut buf)?;

    let parse_one = if format_version == 17 {
        parse_v17
    } else {
        parse_v23_v26
    };

    let mut entries = Vec::with_capacity(count as usize);
    for chunk in buf.chunks_exact(size) {
        entries.push(run(chunk, parse_one)?);
    }
    log::trace!("decoded {} metrics entries", entries.len());
    Ok(entries)
}
