//! Little-endian integer decoding and bounds-checked slice access.
//!
//! This is the lowest layer of the decoder: every other module reads bytes
//! through these helpers (directly, or through the `nom` combinators built on
//! top of them) rather than indexing slices by hand.

use nom::number::complete::{le_u32, le_u64};
use nom::{Finish, IResult};

use crate::error::{Result, ScccaError};

fn bounds_check(buf: &[u8], offset: usize, len: usize) -> Result<()> {
    let end = offset.checked_add(len);
    let in_bounds = end.map(|end| end <= buf.len()).unwrap_or(false);
    if in_bounds {
        Ok(())
    } else {
        Err(ScccaError::ShortInput {
            offset: offset as u64,
            needed: len,
            available: buf.len().saturating_sub(offset),
        })
    }
}

/// Reads a little-endian `u16` at `offset` within `buf`.
pub(crate) fn u16_at(buf: &[u8], offset: usize) -> Result<u16> {
    bounds_check(buf, offset, 2)?;
    Ok(u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap()))
}

/// Reads a little-endian `u32` at `offset` within `buf`.
pub(crate) fn u32_at(buf: &[u8], offset: usize) -> Result<u32> {
    bounds_check(buf, offset, 4)?;
    Ok(u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()))
}

/// Reads a little-endian `u64` at `offset` within `buf`. Used verbatim for
/// FILETIME fields (wall-clock conversion is a presentation concern).
pub(crate) fn u64_at(buf: &[u8], offset: usize) -> Result<u64> {
    bounds_check(buf, offset, 8)?;
    Ok(u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()))
}

/// Returns the `len`-byte slice of `buf` starting at `offset`.
pub(crate) fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    bounds_check(buf, offset, len)?;
    Ok(&buf[offset..offset + len])
}

/// Checks that `[offset, offset + length)` lies within `[min, bound]`.
/// `offset == 0` is treated by callers as "section absent" and is never
/// passed here; every other value is validated strictly.
pub(crate) fn check_offset_in_bounds(offset: u64, length: u64, min: u64, bound: u64) -> Result<()> {
    let end = offset.checked_add(length);
    let ok = offset >= min && end.map(|end| end <= bound).unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(ScccaError::OffsetOutOfBounds {
            offset,
            length,
            bound,
        })
    }
}

/// Runs a `nom` combinator over an already-sized buffer, mapping any parse
/// failure to [`ScccaError::ShortInput`]. Callers are expected to have fetched
/// exactly as many bytes as the combinator will consume; failures here mean
/// the buffer was shorter than the declared record layout.
pub(crate) fn run<'a, O>(
    buf: &'a [u8],
    f: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], O>,
) -> Result<O> {
    f(buf)
        .finish()
        .map(|(_, value)| value)
        .map_err(|_| ScccaError::ShortInput {
            offset: 0,
            needed: buf.len(),
            available: buf.len(),
        })
}

pub(crate) fn le_u32_nom(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

pub(crate) fn le_u64_nom(input: &[u8]) -> IResult<&[u8], u64> {
    le_u64(input)
}
