//! The orchestrator: opens the byte source, runs each decoder in sequence,
//! and assembles the results into an immutable [`FileModel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::codec::check_offset_in_bounds;
use crate::error::{Result, ScccaError, Warning};
use crate::file_info;
use crate::header;
use crate::metrics;
use crate::model::FileModel;
use crate::reader::{read_exact_at, ByteReader};
use crate::strings::parse_string_table;
use crate::trace;
use crate::volume;

/// A cheaply-cloneable, thread-safe handle that can be used to cooperatively
/// cancel an in-progress [`Parser::parse`] call from another thread.
#[derive(Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Sets the cooperative abort flag. Every decoder checks it at entry and
/// between sections; once observed, `parse` returns [`ScccaError::Aborted`]
/// and releases everything it had built so far.
pub fn signal_abort(handle: &AbortHandle) {
    handle.0.store(true, Ordering::Release);
}

fn check_abort(abort: &AbortHandle) -> Result<()> {
    if abort.is_set() {
        Err(ScccaError::Aborted)
    } else {
        Ok(())
    }
}

/// Owns the cooperative abort flag for one parse. Stateless otherwise: the
/// parser holds no reader and no partially built model between calls.
#[derive(Default)]
pub struct Parser {
    abort: AbortHandle,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a handle that `signal_abort` can be called on, from this or
    /// another thread, before or during `parse`.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn parse<R: ByteReader>(&self, reader: &mut R) -> Result<FileModel> {
        parse_inner(reader, &self.abort)
    }
}

/// Equivalent to `Parser::new().parse(reader)`, for callers that don't need
/// cooperative cancellation.
pub fn parse<R: ByteReader>(reader: &mut R) -> Result<FileModel> {
    Parser::new().parse(reader)
}

fn parse_inner<R: ByteReader>(reader: &mut R, abort: &AbortHandle) -> Result<FileModel> {
    check_abort(abort)?;

    let mut header_buf = [0u8; header::HEADER_SIZE];
    read_exact_at(reader, 0, &mut header_buf)?;
    let hdr = header::decode_header(&header_buf)?;
    log::debug!(
        "header decoded: format_version={} prefetch_hash={:#010x}",
        hdr.format_version,
        hdr.prefetch_hash
    );

    let mut warnings = Vec::new();
    let actual_size = reader
        .size()
        .map_err(|e| ScccaError::ReadFailed(Box::new(e)))?;
    if hdr.file_size as u64 != actual_size {
        log::debug!(
            "size mismatch: header declares {}, source reports {}",
            hdr.file_size,
            actual_size
        );
        warnings.push(Warning::SizeMismatch {
            declared: hdr.file_size,
            actual: actual_size,
        });
    }

    check_abort(abort)?;
    let info_size = file_info::block_size(hdr.format_version);
    let mut info_buf = vec![0u8; info_size];
    read_exact_at(reader, header::HEADER_SIZE as u64, &mut info_buf)?;
    let info = file_info::decode_file_info(&info_buf, hdr.format_version, hdr.file_size as u64)?;
    log::debug!(
        "file information decoded: {} metrics, {} trace entries, {} volumes",
        info.number_of_metrics_entries,
        info.number_of_trace_chain_entries,
        info.number_of_volumes
    );

    check_abort(abort)?;
    let metrics = metrics::decode_metrics(
        reader,
        info.metrics_array_offset as u64,
        info.number_of_metrics_entries,
        hdr.format_version,
    )?;

    check_abort(abort)?;
    let trace_chain = trace::decode_trace_chain(
        reader,
        info.trace_chain_array_offset as u64,
        info.number_of_trace_chain_entries,
    )?;

    check_abort(abort)?;
    let filenames = if info.filename_strings_offset == 0 || info.filename_strings_size == 0 {
        Vec::new()
    } else {
        check_offset_in_bounds(
            info.filename_strings_offset as u64,
            info.filename_strings_size as u64,
            header::HEADER_SIZE as u64,
            hdr.file_size as u64,
        )?;
        let mut buf = vec![0u8; info.filename_strings_size as usize];
        read_exact_at(reader, info.filename_strings_offset as u64, &mut buf)?;
        parse_string_table(&buf)?
            .into_iter()
            .map(|e| e.as_str().to_owned())
            .collect()
    };

    check_abort(abort)?;
    let volumes = if info.number_of_volumes == 0 {
        Vec::new()
    } else {
        check_offset_in_bounds(
            info.volumes_information_offset as u64,
            info.volumes_information_size as u64,
            header::HEADER_SIZE as u64,
            hdr.file_size as u64,
        )?;
        volume::decode_volumes(
            reader,
            info.volumes_information_offset as u64,
            info.volumes_information_size as u64,
            info.number_of_volumes,
            hdr.format_version,
            &mut warnings,
        )?
    };

    check_abort(abort)?;

    for warning in &warnings {
        log::debug!("warning recorded: {warning:?}");
    }

    Ok(FileModel {
        format_version: hdr.format_version,
        file_size_declared: hdr.file_size,
        prefetch_hash: hdr.prefetch_hash,
        executable_filename: hdr.executable_filename,
        file_information: info,
        metrics,
        trace_chain,
        filenames,
        volumes,
        warnings,
    })
}
