//! Shared buffer-building helpers for the end-to-end scenarios. Each builder
//! mirrors the on-disk layout decoded by the corresponding `src/` module, so
//! a layout change there should be felt here too.

pub const HEADER_SIZE: usize = 84;
pub const FILE_INFO_SIZE_V17: usize = 156;
pub const FILE_INFO_SIZE_V23_V26: usize = 224;

pub fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// Builds the 84-byte fixed header.
pub fn build_header(version: u32, signature: &[u8; 4], file_size: u32, name: &str, prefetch_hash: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend(version.to_le_bytes());
    buf.extend(signature);
    buf.extend([0u8; 4]);
    buf.extend(file_size.to_le_bytes());
    let mut name_bytes = utf16le(name);
    name_bytes.resize(60, 0);
    buf.extend(name_bytes);
    buf.extend(prefetch_hash.to_le_bytes());
    buf.extend([0u8; 4]);
    buf
}

#[allow(clippy::too_many_arguments)]
pub fn build_file_info_v17(
    metrics_off: u32,
    metrics_count: u32,
    trace_off: u32,
    trace_count: u32,
    names_off: u32,
    names_size: u32,
    vol_off: u32,
    vol_count: u32,
    vol_size: u32,
    run_count: u32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FILE_INFO_SIZE_V17);
    buf.extend(metrics_off.to_le_bytes());
    buf.extend(metrics_count.to_le_bytes());
    buf.extend(trace_off.to_le_bytes());
    buf.extend(trace_count.to_le_bytes());
    buf.extend(names_off.to_le_bytes());
    buf.extend(names_size.to_le_bytes());
    buf.extend(vol_off.to_le_bytes());
    buf.extend(vol_count.to_le_bytes());
    buf.extend(vol_size.to_le_bytes());
    buf.extend(0u64.to_le_bytes()); // last run time
    buf.extend([0u8; 8]); // pad
    buf.extend(run_count.to_le_bytes());
    buf.resize(FILE_INFO_SIZE_V17, 0);
    buf
}

#[allow(clippy::too_many_arguments)]
pub fn build_file_info_v23(
    metrics_off: u32,
    metrics_count: u32,
    trace_off: u32,
    trace_count: u32,
    names_off: u32,
    names_size: u32,
    vol_off: u32,
    vol_count: u32,
    vol_size: u32,
    run_count: u32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FILE_INFO_SIZE_V23_V26);
    buf.extend(metrics_off.to_le_bytes());
    buf.extend(metrics_count.to_le_bytes());
    buf.extend(trace_off.to_le_bytes());
    buf.extend(trace_count.to_le_bytes());
    buf.extend(names_off.to_le_bytes());
    buf.extend(names_size.to_le_bytes());
    buf.extend(vol_off.to_le_bytes());
    buf.extend(vol_count.to_le_bytes());
    buf.extend(vol_size.to_le_bytes());
    for i in 0..8u64 {
        buf.extend(i.to_le_bytes()); // last run times, unused by these scenarios
    }
    buf.extend(run_count.to_le_bytes());
    buf.resize(FILE_INFO_SIZE_V23_V26, 0);
    buf
}

/// Builds one v23/v26-sized volume record (96 bytes) plus its payload
/// (device path, file-reference list, directory strings), all addressed
/// relative to the record's own start as the format requires.
pub fn build_single_volume_record(
    device_path: &str,
    creation_time: u64,
    serial_number: u32,
    refs: &[u64],
    directory_strings: &[&str],
) -> Vec<u8> {
    const RECORD_SIZE: usize = 96;

    let device_path_offset = RECORD_SIZE as u32;
    let device_path_bytes = utf16le(device_path);
    let device_path_chars = device_path.encode_utf16().count() as u32;

    let file_refs_offset = device_path_offset + device_path_bytes.len() as u32;
    let mut file_refs_bytes = Vec::new();
    file_refs_bytes.extend(1u32.to_le_bytes()); // version
    file_refs_bytes.extend((refs.len() as u32 + 1).to_le_bytes());
    file_refs_bytes.extend([0u8; 8]);
    for r in refs {
        file_refs_bytes.extend(r.to_le_bytes());
    }

    let dir_strings_offset = file_refs_offset + file_refs_bytes.len() as u32;
    let mut dir_strings_bytes = Vec::new();
    for s in directory_strings {
        dir_strings_bytes.extend(utf16le(s));
        dir_strings_bytes.extend([0, 0]);
    }

    let mut record = vec![0u8; RECORD_SIZE];
    record[0..4].copy_from_slice(&device_path_offset.to_le_bytes());
    record[4..8].copy_from_slice(&device_path_chars.to_le_bytes());
    record[8..16].copy_from_slice(&creation_time.to_le_bytes());
    record[16..20].copy_from_slice(&serial_number.to_le_bytes());
    record[20..24].copy_from_slice(&file_refs_offset.to_le_bytes());
    record[24..28].copy_from_slice((file_refs_bytes.len() as u32).to_le_bytes().as_slice());
    record[28..32].copy_from_slice(&dir_strings_offset.to_le_bytes());
    record[32..36].copy_from_slice((directory_strings.len() as u32).to_le_bytes().as_slice());

    record.extend(device_path_bytes);
    record.extend(file_refs_bytes);
    record.extend(dir_strings_bytes);
    record
}
