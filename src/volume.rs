//! Parses the volume information block: per-volume records, device paths,
//! NTFS file references, and directory strings. The trickiest section
//! because every offset inside it is relative to the block's own start
//! rather than to the file; it is modeled as a self-contained sub-buffer.

use nom::IResult;

use crate::codec::{check_offset_in_bounds, le_u32_nom, le_u64_nom, run, slice_at, u32_at, u64_at};
use crate::error::{Result, Warning};
use crate::model::{FileReference, Volume};
use crate::reader::{read_exact_at, ByteReader};
use crate::strings::parse_string_table;

pub(crate) const RECORD_SIZE_V17: usize = 104;
pub(crate) const RECORD_SIZE_V23_V26: usize = 96;
const RECORD_HEADER_SIZE: usize = 36;
const FILE_REF_LIST_HEADER_SIZE: u64 = 16;

fn record_size(format_version: u32) -> usize {
    if format_version == 17 {
        RECORD_SIZE_V17
    } else {
        RECORD_SIZE_V23_V26
    }
}

struct RecordHeader {
    device_path_offset: u32,
    device_path_number_of_characters: u32,
    creation_time: u64,
    serial_number: u32,
    file_references_offset: u32,
    file_references_size: u32,
    directory_strings_array_offset: u32,
    number_of_directory_strings: u32,
}

fn parse_record_header(buf: &[u8]) -> IResult<&[u8], RecordHeader> {
    let (buf, device_path_offset) = le_u32_nom(buf)?;
    let (buf, device_path_number_of_characters) = le_u32_nom(buf)?;
    let (buf, creation_time) = le_u64_nom(buf)?;
    let (buf, serial_number) = le_u32_nom(buf)?;
    let (buf, file_references_offset) = le_u32_nom(buf)?;
    let (buf, file_references_size) = le_u32_nom(buf)?;
    let (buf, directory_strings_array_offset) = le_u32_nom(buf)?;
    let (buf, number_of_directory_strings) = le_u32_nom(buf)?;
    Ok((
        buf,
        RecordHeader {
            device_path_offset,
            device_path_number_of_characters,
            creation_time,
            serial_number,
            file_references_offset,
            file_references_size,
            directory_strings_array_offset,
            number_of_directory_strings,
        },
    ))
}

fn decode_device_path(block: &[u8], header: &RecordHeader) -> Result<String> {
    if header.device_path_offset == 0 || header.device_path_number_of_characters == 0 {
        return Ok(String::new());
    }
    let offset = header.device_path_offset as u64;
    let byte_len = 2 * header.device_path_number_of_characters as u64;
    check_offset_in_bounds(offset, byte_len, 0, block.len() as u64)?;

    let bytes = slice_at(block, offset as usize, byte_len as usize)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

fn decode_file_references(block: &[u8], header: &RecordHeader) -> Result<Vec<FileReference>> {
    if header.file_references_offset == 0 {
        return Ok(Vec::new());
    }
    let offset = header.file_references_offset as u64;
    check_offset_in_bounds(offset, FILE_REF_LIST_HEADER_SIZE, 0, block.len() as u64)?;

    let base = offset as usize;
    let _version = u32_at(block, base)?;
    let count = u32_at(block, base + 4)?;
    let payload_count = count.saturating_sub(1) as u64;
    let total_len = FILE_REF_LIST_HEADER_SIZE + payload_count * 8;
    check_offset_in_bounds(offset, total_len, 0, block.len() as u64)?;

    let mut refs = Vec::with_capacity(payload_count as usize);
    for i in 0..payload_count {
        let at = base + FILE_REF_LIST_HEADER_SIZE as usize + (i as usize) * 8;
        refs.push(FileReference(u64_at(block, at)?));
    }
    Ok(refs)
}

fn decode_directory_strings(
    block: &[u8],
    header: &RecordHeader,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<String>> {
    if header.directory_strings_array_offset == 0 {
        return Ok(Vec::new());
    }
    let offset = header.directory_strings_array_offset as u64;
    check_offset_in_bounds(offset, 0, 0, block.len() as u64)?;

    let region = &block[offset as usize..];
    let entries = parse_string_table(region)?;
    if entries.len() != header.number_of_directory_strings as usize {
        warnings.push(Warning::InconsistentCounts {
            context: "volume.directory_strings",
            declared: header.number_of_directory_strings,
            parsed: entries.len(),
        });
    }
    Ok(entries.into_iter().map(|e| e.as_str().to_owned()).collect())
}

/// Reads the full `size` bytes at absolute file `offset` and decodes
/// `count` per-volume records from the resulting self-contained buffer.
pub(crate) fn decode_volumes<R: ByteReader>(
    reader: &mut R,
    offset: u64,
    size: u64,
    count: u32,
    format_version: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Volume>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut block = vec![0u8; size as usize];
    read_exact_at(reader, offset, &mut block)?;

    let rec_size = record_size(format_version);
    let mut volumes = Vec::with_capacity(count as usize);

    for i in 0..count as usize {
        let record_offset = i * rec_size;
        check_offset_in_bounds(record_offset as u64, rec_size as u64, 0, block.len() as u64)?;
        let record_buf = slice_at(&block, record_offset, rec_size)?;
        let header = run(&record_buf[..RECORD_HEADER_SIZE], parse_record_header)?;

        let device_path = decode_device_path(&block, &header)?;
        let file_references = decode_file_references(&block, &header)?;
        let directory_strings = decode_directory_strings(&block, &header, warnings)?;
        let unknown_tail = record_buf[RECORD_HEADER_SIZE..].to_vec();

        volumes.push(Volume {
            device_path,
            creation_time: header.creation_time,
            serial_number: header.serial_number,
            file_references,
            directory_strings,
            unknown_tail,
        });
    }

    log::trace!("decoded {} volumes", volumes.len());
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CursorByteReader;
    use pretty_assertions::assert_eq;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn build_single_volume_block(
        device_path: &str,
        creation_time: u64,
        serial_number: u32,
        refs: &[u64],
        directory_strings: &[&str],
    ) -> (Vec<u8>, u32) {
        let record_size = RECORD_SIZE_V23_V26;
        let device_path_offset = record_size as u32;
        let device_path_bytes = utf16le(device_path);
        let device_path_chars = device_path.encode_utf16().count() as u32;

        let file_refs_offset = device_path_offset + device_path_bytes.len() as u32;
        let mut file_refs_bytes = Vec::new();
        file_refs_bytes.extend(1u32.to_le_bytes()); // version
        file_refs_bytes.extend((refs.len() as u32 + 1).to_le_bytes());
        file_refs_bytes.extend([0u8; 8]); // ignored
        for r in refs {
            file_refs_bytes.extend(r.to_le_bytes());
        }

        let dir_strings_offset = file_refs_offset + file_refs_bytes.len() as u32;
        let mut dir_strings_bytes = Vec::new();
        for s in directory_strings {
            dir_strings_bytes.extend(utf16le(s));
            dir_strings_bytes.extend([0, 0]);
        }

        let mut block = vec![0u8; record_size];
        block[0..4].copy_from_slice(&device_path_offset.to_le_bytes());
        block[4..8].copy_from_slice(&device_path_chars.to_le_bytes());
        block[8..16].copy_from_slice(&creation_time.to_le_bytes());
        block[16..20].copy_from_slice(&serial_number.to_le_bytes());
        block[20..24].copy_from_slice(&file_refs_offset.to_le_bytes());
        block[24..28].copy_from_slice((file_refs_bytes.len() as u32).to_le_bytes().as_slice());
        block[28..32].copy_from_slice(&dir_strings_offset.to_le_bytes());
        block[32..36].copy_from_slice((directory_strings.len() as u32).to_le_bytes().as_slice());

        block.extend(device_path_bytes);
        block.extend(file_refs_bytes);
        block.extend(dir_strings_bytes);

        let total_size = block.len() as u32;
        (block, total_size)
    }

    #[test]
    fn decodes_single_volume_with_refs_and_dirs() {
        let (block, size) = build_single_volume_block(
            "\\VOLUME{abc}",
            0x01D012A100000000,
            0x12345678,
            &[0x0001_0000_0000_0042, 0x0002_0000_0000_0043],
            &["\\WINDOWS", "\\PROGRAM FILES"],
        );
        let mut reader = CursorByteReader::new(block);
        let mut warnings = Vec::new();

        let volumes = decode_volumes(&mut reader, 0, size as u64, 1, 23, &mut warnings).unwrap();
        assert_eq!(1, volumes.len());
        let v = &volumes[0];
        assert_eq!("\\VOLUME{abc}", v.device_path);
        assert_eq!(0x12345678, v.serial_number);
        assert_eq!(2, v.file_references.len());
        assert_eq!(0x42, v.file_references[0].mft_entry());
        assert_eq!(1, v.file_references[0].sequence());
        assert_eq!(0x43, v.file_references[1].mft_entry());
        assert_eq!(2, v.file_references[1].sequence());
        assert_eq!(2, v.directory_strings.len());
        assert!(warnings.is_empty());
    }

    #[test]
    fn preserves_record_bytes_past_the_named_header_fields() {
        let (mut block, size) = build_single_volume_block("\\X", 0, 1, &[], &[]);
        let tail_start = RECORD_HEADER_SIZE;
        let tail_end = RECORD_SIZE_V23_V26;
        block[tail_start..tail_end].copy_from_slice(&[0xAB; RECORD_SIZE_V23_V26 - RECORD_HEADER_SIZE]);
        let expected_tail = block[tail_start..tail_end].to_vec();

        let mut reader = CursorByteReader::new(block);
        let mut warnings = Vec::new();
        let volumes = decode_volumes(&mut reader, 0, size as u64, 1, 23, &mut warnings).unwrap();
        assert_eq!(expected_tail, volumes[0].unknown_tail);
    }

    #[test]
    fn header_only_file_reference_list_yields_no_refs() {
        let (block, size) = build_single_volume_block("\\X", 0, 1, &[], &["A"]);
        let mut reader = CursorByteReader::new(block);
        let mut warnings = Vec::new();
        let volumes = decode_volumes(&mut reader, 0, size as u64, 1, 23, &mut warnings).unwrap();
        assert!(volumes[0].file_references.is_empty());
    }

    #[test]
    fn zero_volumes_skips_the_read_entirely() {
        let mut reader = CursorByteReader::new(vec![]);
        let mut warnings = Vec::new();
        let volumes = decode_volumes(&mut reader, 0, 0, 0, 23, &mut warnings).unwrap();
        assert!(volumes.is_empty());
    }

    #[test]
    fn directory_string_count_mismatch_is_a_warning_not_an_error() {
        let (mut block, size) = build_single_volume_block("\\X", 0, 1, &[], &["A", "B"]);
        // Lie about the declared count.
        block[32..36].copy_from_slice(&99u32.to_le_bytes());
        let mut reader = CursorByteReader::new(block);
        let mut warnings = Vec::new();
        let volumes = decode_volumes(&mut reader, 0, size as u64, 1, 23, &mut warnings).unwrap();
        assert_eq!(2, volumes[0].directory_strings.len());
        assert_eq!(1, warnings.len());
        assert!(matches!(
            warnings[0],
            Warning::InconsistentCounts { declared: 99, parsed: 2, .. }
        ));
    }
}
