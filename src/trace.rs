//! Walks the trace-chain array: a linked list of 512 KiB page-load
//! descriptors ordered by load time. Chain integrity (cycles, dangling
//! indices) is never validated here; consumers that need chain semantics
//! walk it themselves.

use nom::number::complete::{le_u16, le_u8};
use nom::IResult;

use crate::codec::{le_u32_nom, run};
use crate::error::Result;
use crate::reader::{read_exact_at, ByteReader};

pub(crate) const ENTRY_SIZE: usize = 12;
const TERMINAL_SENTINEL: u32 = 0xFFFF_FFFF;

/// `next_table_index` re-expressed as a typed value instead of a raw `u32`
/// with a magic sentinel, so a terminal entry can't be mistaken for index
/// `0xFFFFFFFF`. The raw value is still recoverable losslessly either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceChainIndex {
    Index(u32),
    Terminal,
}

impl TraceChainIndex {
    fn from_raw(raw: u32) -> Self {
        if raw == TERMINAL_SENTINEL {
            TraceChainIndex::Terminal
        } else {
            TraceChainIndex::Index(raw)
        }
    }
}

/// One trace-chain record. The three unknown/padding fields are preserved
/// opaquely rather than interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceChainEntry {
    pub next_table_index: TraceChainIndex,
    pub block_load_count: u32,
    pub unknown0: u8,
    pub unknown1: u8,
    pub unknown2: u16,
}

fn parse_entry(buf: &[u8]) -> IResult<&[u8], TraceChainEntry> {
    let (buf, next_table_index) = le_u32_nom(buf)?;
    let (buf, block_load_count) = le_u32_nom(buf)?;
    let (buf, unknown0) = le_u8(buf)?;
    let (buf, unknown1) = le_u8(buf)?;
    let (buf, unknown2) = le_u16(buf)?;
    Ok((
        buf,
        TraceChainEntry {
            next_table_index: TraceChainIndex::from_raw(next_table_index),
            block_load_count,
            unknown0,
            unknown1,
            unknown2,
        },
    ))
}

/// Reads `count` fixed 12-byte entries starting at the absolute file
/// `offset`. Tolerant of `count == 0`.
pub(crate) fn decode_trace_chain<R: ByteReader>(
    reader: &mut R,
    offset: u64,
    count: u32,
) -> Result<Vec<TraceChainEntry>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; ENTRY_SIZE * count as usize];
    read_exact_at(reader, offset, &mut buf)?;

    let mut entries = Vec::with_capacity(count as usize);
    for chunk in buf.chunks_exact(ENTRY_SIZE) {
        entries.push(run(chunk, parse_entry)?);
    }
    log::trace!("decoded {} trace-chain entries", entries.len());
    Ok(entries)
}
