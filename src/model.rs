//! The immutable, queryable result of a parse: [`FileModel`] and the value
//! types it owns. Construction happens in [`crate::parser`]; everything here
//! is read-only once built and safe to share across threads without
//! synchronization.

use crate::error::{Result, ScccaError, Warning};
use crate::file_info::FileInformation;
use crate::metrics::MetricsEntry;
use crate::trace::TraceChainEntry;

/// A 64-bit NTFS MFT reference: the low 48 bits are the MFT entry number,
/// the high 16 bits are the sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileReference(pub u64);

impl FileReference {
    pub fn mft_entry(&self) -> u64 {
        self.0 & 0x0000_FFFF_FFFF_FFFF
    }

    pub fn sequence(&self) -> u16 {
        (self.0 >> 48) as u16
    }
}

/// One volume referenced by the prefetched executable: the device it lived
/// on, and the directories the launch touched on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub device_path: String,
    pub creation_time: u64,
    pub serial_number: u32,
    pub file_references: Vec<FileReference>,
    pub directory_strings: Vec<String>,
    /// Bytes of the per-volume record past the fields this format names,
    /// preserved opaquely so downstream tooling can be extended without
    /// revising the core.
    pub unknown_tail: Vec<u8>,
}

impl Volume {
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn creation_time(&self) -> u64 {
        self.creation_time
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    /// The serial number as the zero-padded eight-hex-digit string
    /// conventionally shown by prefetch-inspection tools.
    pub fn format_serial(&self) -> String {
        format!("{:08X}", self.serial_number)
    }

    pub fn file_reference_count(&self) -> usize {
        self.file_references.len()
    }

    pub fn file_reference(&self, index: usize) -> Result<FileReference> {
        self.file_references
            .get(index)
            .copied()
            .ok_or(ScccaError::IndexOutOfRange {
                index,
                len: self.file_references.len(),
            })
    }

    pub fn directory_string_count(&self) -> usize {
        self.directory_strings.len()
    }

    pub fn directory_string(&self, index: usize) -> Result<&str> {
        self.directory_strings
            .get(index)
            .map(String::as_str)
            .ok_or(ScccaError::IndexOutOfRange {
                index,
                len: self.directory_strings.len(),
            })
    }
}

/// A borrowed view over one [`Volume`]; returned by [`FileModel::volume`].
pub type VolumeView<'a> = &'a Volume;

/// The fully decoded, immutable result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileModel {
    pub(crate) format_version: u32,
    pub(crate) file_size_declared: u32,
    pub(crate) prefetch_hash: u32,
    pub(crate) executable_filename: String,
    pub(crate) file_information: FileInformation,
    pub(crate) metrics: Vec<MetricsEntry>,
    pub(crate) trace_chain: Vec<TraceChainEntry>,
    pub(crate) filenames: Vec<String>,
    pub(crate) volumes: Vec<Volume>,
    pub(crate) warnings: Vec<Warning>,
}

impl FileModel {
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn file_size_declared(&self) -> u32 {
        self.file_size_declared
    }

    pub fn prefetch_hash(&self) -> u32 {
        self.prefetch_hash
    }

    pub fn executable_filename(&self) -> &str {
        &self.executable_filename
    }

    pub fn run_count(&self) -> u32 {
        self.file_information.run_count
    }

    /// Index `0` is the most recent run. Out-of-range for the format's
    /// recorded count (1 for v17, 8 for v23/v26) is zero, not an error.
    /// The hardware never stored more than it declared.
    pub fn last_run_time(&self, index: usize) -> Result<u64> {
        let max = if self.format_version == 17 { 1 } else { 8 };
        if index >= max {
            return Err(ScccaError::IndexOutOfRange { index, len: max });
        }
        Ok(self
            .file_information
            .last_run_times
            .get(index)
            .copied()
            .unwrap_or(0))
    }

    pub fn file_information(&self) -> &FileInformation {
        &self.file_information
    }

    pub fn metrics(&self) -> &[MetricsEntry] {
        &self.metrics
    }

    pub fn trace_chain(&self) -> &[TraceChainEntry] {
        &self.trace_chain
    }

    pub fn filenames_count(&self) -> usize {
        self.filenames.len()
    }

    pub fn filename(&self, index: usize) -> Result<&str> {
        self.filenames
            .get(index)
            .map(String::as_str)
            .ok_or(ScccaError::IndexOutOfRange {
                index,
                len: self.filenames.len(),
            })
    }

    pub fn volumes_count(&self) -> usize {
        self.volumes.len()
    }

    pub fn volume(&self, index: usize) -> Result<VolumeView<'_>> {
        self.volumes.get(index).ok_or(ScccaError::IndexOutOfRange {
            index,
            len: self.volumes.len(),
        })
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
