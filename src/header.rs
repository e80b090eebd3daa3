//! Fixed 84-byte file header: signature, format version, declared file size,
//! executable name and prefetch hash.

use nom::bytes::complete::take;
use nom::IResult;

use crate::codec::{le_u32_nom, run};
use crate::error::{Result, ScccaError};

pub(crate) const HEADER_SIZE: usize = 84;
const SIGNATURE: &[u8; 4] = b"SCCA";
const EXECUTABLE_NAME_UNITS: usize = 30;

pub(crate) const SUPPORTED_VERSIONS: [u32; 3] = [17, 23, 26];

/// The decoded, validated header. Everything downstream (file-information
/// offsets, version dispatch) is keyed off `format_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub format_version: u32,
    pub file_size: u32,
    pub executable_filename: String,
    pub prefetch_hash: u32,
}

fn parse_raw(buf: &[u8]) -> IResult<&[u8], (u32, [u8; 4], u32, &[u8], u32)> {
    let (rest, format_version) = le_u32_nom(buf)?;
    let (rest, signature) = take(4usize)(rest)?;
    let (rest, _unknown) = take(4usize)(rest)?;
    let (rest, file_size) = le_u32_nom(rest)?;
    let (rest, name_bytes) = take(60usize)(rest)?;
    let (rest, prefetch_hash) = le_u32_nom(rest)?;
    let (rest, _unknown) = take(4usize)(rest)?;
    let signature: [u8; 4] = signature.try_into().unwrap();
    Ok((
        rest,
        (format_version, signature, file_size, name_bytes, prefetch_hash),
    ))
}

fn decode_executable_name(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end.min(EXECUTABLE_NAME_UNITS)])
}

/// Decodes the 84-byte header slice (exactly `HEADER_SIZE` bytes, already
/// fetched from offset 0 by the caller).
pub(crate) fn decode_header(buf: &[u8]) -> Result<Header> {
    let (_, (format_version, signature, file_size, name_bytes, prefetch_hash)) =
        run(buf, parse_raw)?;

    if &signature != SIGNATURE {
        return Err(ScccaError::InvalidSignature { found: signature });
    }
    if !SUPPORTED_VERSIONS.contains(&format_version) {
        return Err(ScccaError::UnsupportedVersion(format_version));
    }

    Ok(Header {
        format_version,
        file_size,
        executable_filename: decode_executable_name(name_bytes),
        prefetch_hash,
    })
}
