//! Version-dispatched decode of the file-information block that immediately
//! follows the 84-byte header. Layout differs between format 17 and formats
//! 23/26, but the set of fields callers care about is uniform.

use nom::bytes::complete::take;
use nom::IResult;

use crate::codec::{check_offset_in_bounds, le_u32_nom, le_u64_nom, run};
use crate::error::Result;
use crate::header::HEADER_SIZE;

pub(crate) const SIZE_V17: usize = 156;
pub(crate) const SIZE_V23_V26: usize = 224;

pub(crate) fn block_size(format_version: u32) -> usize {
    if format_version == 17 {
        SIZE_V17
    } else {
        SIZE_V23_V26
    }
}

/// The decoded file-information block, independent of the on-disk layout
/// that produced it. `unknown_tail` preserves the trailing bytes (padding and
/// fields the format doesn't name) opaquely, so downstream tooling can be
/// extended without revising the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInformation {
    pub metrics_array_offset: u32,
    pub number_of_metrics_entries: u32,
    pub trace_chain_array_offset: u32,
    pub number_of_trace_chain_entries: u32,
    pub filename_strings_offset: u32,
    pub filename_strings_size: u32,
    pub volumes_information_offset: u32,
    pub number_of_volumes: u32,
    pub volumes_information_size: u32,
    pub last_run_times: Vec<u64>,
    pub run_count: u32,
    pub unknown_tail: Vec<u8>,
}

struct Common {
    metrics_array_offset: u32,
    number_of_metrics_entries: u32,
    trace_chain_array_offset: u32,
    number_of_trace_chain_entries: u32,
    filename_strings_offset: u32,
    filename_strings_size: u32,
    volumes_information_offset: u32,
    number_of_volumes: u32,
    volumes_information_size: u32,
}

fn parse_common(buf: &[u8]) -> IResult<&[u8], Common> {
    let (buf, metrics_array_offset) = le_u32_nom(buf)?;
    let (buf, number_of_metrics_entries) = le_u32_nom(buf)?;
    let (buf, trace_chain_array_offset) = le_u32_nom(buf)?;
    let (buf, number_of_trace_chain_entries) = le_u32_nom(buf)?;
    let (buf, filename_strings_offset) = le_u32_nom(buf)?;
    let (buf, filename_strings_size) = le_u32_nom(buf)?;
    let (buf, volumes_information_offset) = le_u32_nom(buf)?;
    let (buf, number_of_volumes) = le_u32_nom(buf)?;
    let (buf, volumes_information_size) = le_u32_nom(buf)?;
    Ok((
        buf,
        Common {
            metrics_array_offset,
            number_of_metrics_entries,
            trace_chain_array_offset,
            number_of_trace_chain_entries,
            filename_strings_offset,
            filename_strings_size,
            volumes_information_offset,
            number_of_volumes,
            volumes_information_size,
        },
    ))
}

fn parse_v17(buf: &[u8]) -> IResult<&[u8], (Common, Vec<u64>, u32, Vec<u8>)> {
    let (buf, common) = parse_common(buf)?;
    let (buf, run_time) = le_u64_nom(buf)?;
    let (buf, _pad) = take(8usize)(buf)?;
    let (buf, run_count) = le_u32_nom(buf)?;
    Ok((&[], (common, vec![run_time], run_count, buf.to_vec())))
}

fn parse_v23_v26(buf: &[u8]) -> IResult<&[u8], (Common, Vec<u64>, u32, Vec<u8>)> {
    let (buf, common) = parse_common(buf)?;
    let mut rest = buf;
    let mut last_run_times = Vec::with_capacity(8);
    for _ in 0..8 {
        let (r, t) = le_u64_nom(rest)?;
        last_run_times.push(t);
        rest = r;
    }
    let (rest, run_count) = le_u32_nom(rest)?;
    Ok((&[], (common, last_run_times, run_count, rest.to_vec())))
}

/// Decodes the file-information block. `buf` must be exactly
/// `block_size(format_version)` bytes, already fetched by the caller.
/// `file_size_declared` is the header's declared file size, used to bounds
/// check the absolute offsets this block carries.
pub(crate) fn decode_file_info(
    buf: &[u8],
    format_version: u32,
    file_size_declared: u64,
) -> Result<FileInformation> {
    let (common, last_run_times, run_count, unknown_tail) = if format_version == 17 {
        run(buf, parse_v17)?
    } else {
        run(buf, parse_v23_v26)?
    };

    for (offset, name) in [
        (common.metrics_array_offset, "metrics_array_offset"),
        (common.trace_chain_array_offset, "trace_chain_array_offset"),
        (common.filename_strings_offset, "filename_strings_offset"),
        (
            common.volumes_information_offset,
            "volumes_information_offset",
        ),
    ] {
        if offset != 0 {
            check_offset_in_bounds(offset as u64, 0, HEADER_SIZE as u64, file_size_declared)
                .map_err(|e| with_context(e, name))?;
        }
    }

    Ok(FileInformation {
        metrics_array_offset: common.metrics_array_offset,
        number_of_metrics_entries: common.number_of_metrics_entries,
        trace_chain_array_offset: common.trace_chain_array_offset,
        number_of_trace_chain_entries: common.number_of_trace_chain_entries,
        filename_strings_offset: common.filename_strings_offset,
        filename_strings_size: common.filename_strings_size,
        volumes_information_offset: common.volumes_information_offset,
        number_of_volumes: common.number_of_volumes,
        volumes_information_size: common.volumes_information_size,
        last_run_times,
        run_count,
        unknown_tail,
    })
}

fn with_context(err: crate::error::ScccaError, field: &'static str) -> crate::error::ScccaError {
    log::debug!("offset validation failed for {field}");
    err
}
