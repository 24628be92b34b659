//! Chunk head parsing, CRC-32 verification and the per-chunk-type
//! body parsers.
use alloc::vec::Vec;

use jimg_core::input::InputSource;

use crate::enums::{InterlaceMethod, PngChunkType, PngColor};
use crate::error::{PngError, PngResult};
use crate::options::{PngOptions, MAX_ICCP_SIZE};
use crate::reader::PngByteReader;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub struct ChunkHead {
    pub length: u32,
    pub type_bytes: [u8; 4],
    pub chunk_type: PngChunkType,
}

fn chunk_type_from_fcc(fcc: &[u8; 4]) -> PngChunkType {
    match fcc {
        b"IHDR" => PngChunkType::IHDR,
        b"PLTE" => PngChunkType::PLTE,
        b"IDAT" => PngChunkType::IDAT,
        b"IEND" => PngChunkType::IEND,
        b"eXIf" => PngChunkType::eXIf,
        b"cHRM" => PngChunkType::cHRM,
        b"gAMA" => PngChunkType::gAMA,
        b"iCCP" => PngChunkType::iCCP,
        b"sBIT" => PngChunkType::sBit,
        b"sRGB" => PngChunkType::sRGB,
        b"bKGD" => PngChunkType::bKGD,
        b"hIST" => PngChunkType::hIST,
        b"tRNS" => PngChunkType::tRNS,
        b"pHYs" => PngChunkType::pHYs,
        b"sPLT" => PngChunkType::sPLT,
        b"tIME" => PngChunkType::tIME,
        b"iTXt" => PngChunkType::iTXt,
        b"tEXt" => PngChunkType::tEXt,
        b"zTXt" => PngChunkType::zTxt,
        b"fcTL" => PngChunkType::fcTL,
        b"acTL" => PngChunkType::acTL,
        _ => PngChunkType::unkn,
    }
}

pub fn read_chunk_head<S: InputSource>(stream: &mut PngByteReader<S>) -> PngResult<ChunkHead> {
    let length = stream.read_u32_be()?;
    let mut type_bytes = [0u8; 4];
    stream.read_exact(&mut type_bytes)?;
    Ok(ChunkHead { length, type_bytes, chunk_type: chunk_type_from_fcc(&type_bytes) })
}

/// Read a chunk's body plus its 4-byte CRC trailer, verifying the CRC
/// unless `options.no_crc_check()` is set.
pub fn read_chunk_body<S: InputSource>(
    stream: &mut PngByteReader<S>, head: &ChunkHead, options: &PngOptions,
) -> PngResult<Vec<u8>> {
    let body = stream.read_vec(head.length as usize)?;
    let crc_read = stream.read_u32_be()?;
    if !options.no_crc_check() {
        #[cfg(feature = "crc")]
        {
            let mut crc = crate::crc::crc32_update(0xFFFF_FFFF, &head.type_bytes);
            crc = crate::crc::crc32_update(crc, &body);
            let computed = crc ^ 0xFFFF_FFFF;
            if computed != crc_read {
                return Err(PngError::BadCrc(crc_read, computed));
            }
        }
    }
    Ok(body)
}

pub struct IhdrInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
    pub color: PngColor,
    pub interlace: InterlaceMethod,
}

pub fn parse_ihdr(body: &[u8], options: &PngOptions) -> PngResult<IhdrInfo> {
    if body.len() != 13 {
        return Err(PngError::BadData("IHDR must be exactly 13 bytes".into()));
    }
    let width = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    let height = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
    let depth = body[8];
    let color_raw = body[9];
    let compression = body[10];
    let filter = body[11];
    let interlace_raw = body[12];

    if width == 0 || height == 0 {
        return Err(PngError::InvalidImage("zero width or height".into()));
    }
    if (width as usize) > options.core().max_width() || (height as usize) > options.core().max_height() {
        return Err(PngError::Limit("IHDR dimensions exceed the configured maximum".into()));
    }
    let color = PngColor::from_int(color_raw)
        .ok_or_else(|| PngError::InvalidImage("unrecognized IHDR color type".into()))?;
    let depth_ok = match color {
        PngColor::Palette => matches!(depth, 1 | 2 | 4 | 8),
        PngColor::Luma => matches!(depth, 1 | 2 | 4 | 8 | 16),
        PngColor::LumaA | PngColor::RGB | PngColor::RGBA => matches!(depth, 8 | 16),
        PngColor::Unknown => false,
    };
    if !depth_ok {
        return Err(PngError::InvalidImage("bit depth not valid for color type".into()));
    }
    if compression != 0 {
        return Err(PngError::InvalidImage("unsupported IHDR compression method".into()));
    }
    if filter != 0 {
        return Err(PngError::InvalidImage("unsupported IHDR filter method".into()));
    }
    let interlace = InterlaceMethod::from_int(interlace_raw)
        .ok_or_else(|| PngError::InvalidImage("unrecognized IHDR interlace method".into()))?;

    Ok(IhdrInfo { width, height, depth, color, interlace })
}

/// Parse PLTE into a fixed 256-entry table (unused tail entries keep the
/// default opaque-black convention), returning the number of entries
/// actually present.
pub fn parse_plte(body: &[u8], depth: u8) -> PngResult<(Vec<[u8; 4]>, usize)> {
    if body.len() % 3 != 0 {
        return Err(PngError::BadData("PLTE length must be a multiple of 3".into()));
    }
    let n = body.len() / 3;
    if n == 0 || n > 256 {
        return Err(PngError::InvalidImage("PLTE entry count out of range".into()));
    }
    if n > (1usize << depth) {
        return Err(PngError::InvalidImage("PLTE has more entries than the bit depth allows".into()));
    }
    let mut palette = alloc::vec![[0u8, 0, 0, 255]; 256];
    for (i, chunk) in body.chunks_exact(3).enumerate() {
        palette[i] = [chunk[0], chunk[1], chunk[2], 255];
    }
    Ok((palette, n))
}

pub enum TrnsInfo {
    Gray(u16),
    Rgb([u16; 3]),
    PaletteApplied,
}

pub fn parse_trns(
    body: &[u8], color: PngColor, palette: &mut [[u8; 4]], palette_len: usize,
) -> PngResult<TrnsInfo> {
    match color {
        PngColor::Palette => {
            if body.len() > palette_len {
                return Err(PngError::BadData("tRNS has more entries than PLTE".into()));
            }
            for (i, &alpha) in body.iter().enumerate() {
                palette[i][3] = alpha;
            }
            Ok(TrnsInfo::PaletteApplied)
        }
        PngColor::Luma => {
            if body.len() != 2 {
                return Err(PngError::BadData("tRNS for grayscale must be 2 bytes".into()));
            }
            Ok(TrnsInfo::Gray(u16::from_be_bytes([body[0], body[1]])))
        }
        PngColor::RGB => {
            if body.len() != 6 {
                return Err(PngError::BadData("tRNS for RGB must be 6 bytes".into()));
            }
            let r = u16::from_be_bytes([body[0], body[1]]);
            let g = u16::from_be_bytes([body[2], body[3]]);
            let b = u16::from_be_bytes([body[4], body[5]]);
            Ok(TrnsInfo::Rgb([r, g, b]))
        }
        PngColor::LumaA | PngColor::RGBA => {
            Err(PngError::InvalidImage("tRNS is forbidden for color types with alpha".into()))
        }
        PngColor::Unknown => unreachable!(),
    }
}

/// gAMA/sBIT/pHYs/sRGB/cHRM/iCCP are all ancillary: a malformed body
/// downgrades to a warning rather than aborting the decode.
pub fn parse_gama(body: &[u8]) -> Option<u32> {
    if body.len() != 4 {
        return None;
    }
    Some(u32::from_be_bytes([body[0], body[1], body[2], body[3]]))
}

pub fn parse_sbit(body: &[u8], color: PngColor) -> Option<[u8; 4]> {
    let expected = match color {
        PngColor::Luma => 1,
        PngColor::RGB | PngColor::Palette => 3,
        PngColor::LumaA => 2,
        PngColor::RGBA => 4,
        PngColor::Unknown => return None,
    };
    if body.len() != expected {
        return None;
    }
    let mut out = [0u8; 4];
    out[..expected].copy_from_slice(body);
    Some(out)
}

pub struct PhysInfo {
    pub ppu_x: u32,
    pub ppu_y: u32,
    pub unit: u8,
}

pub fn parse_phys(body: &[u8]) -> Option<PhysInfo> {
    if body.len() != 9 {
        return None;
    }
    let ppu_x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    let ppu_y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
    Some(PhysInfo { ppu_x, ppu_y, unit: body[8] })
}

pub fn parse_srgb(body: &[u8]) -> Option<u8> {
    if body.len() != 1 || body[0] > 3 {
        return None;
    }
    Some(body[0])
}

pub fn parse_chrm(body: &[u8]) -> Option<[u32; 8]> {
    if body.len() != 32 {
        return None;
    }
    let mut out = [0u32; 8];
    for (i, chunk) in body.chunks_exact(4).enumerate() {
        out[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(out)
}

/// Validate and inflate an iCCP chunk body, using the same ICC
/// header-size/signature checks as the JPEG core's APP2 path. Returns
/// `None` (caller raises `BAD_ICCP`) on any malformed input.
pub fn parse_iccp(body: &[u8]) -> Option<Vec<u8>> {
    let nul = body.iter().position(|&b| b == 0)?;
    if nul == 0 || nul > 79 {
        return None;
    }
    let rest = &body[nul + 1..];
    if rest.is_empty() || rest[0] != 0 {
        // compression method must be 0 (deflate)
        return None;
    }
    let compressed = &rest[1..];
    let options = zune_inflate::DeflateOptions::default().set_confirm_checksum(false);
    let mut decoder = zune_inflate::DeflateDecoder::new_with_options(compressed, options);
    let profile = decoder.decode_zlib().ok()?;

    if profile.len() < 132 {
        return None;
    }
    let declared_size = u32::from_be_bytes([profile[0], profile[1], profile[2], profile[3]]) as usize;
    if !(128..=MAX_ICCP_SIZE).contains(&declared_size) {
        return None;
    }
    if &profile[36..40] != b"acsp" {
        return None;
    }
    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ihdr_rejects_zero_dimension() {
        let mut body = [0u8; 13];
        body[7] = 1; // height = 1, width = 0
        body[8] = 8;
        let opts = PngOptions::new(jimg_core::options::DecoderOptions::default());
        assert!(parse_ihdr(&body, &opts).is_err());
    }

    #[test]
    fn ihdr_rejects_bad_depth_for_truecolor() {
        let mut body = [0u8; 13];
        body[3] = 1;
        body[7] = 1;
        body[8] = 4; // depth 4 invalid for RGB
        body[9] = 2; // RGB
        let opts = PngOptions::new(jimg_core::options::DecoderOptions::default());
        assert!(parse_ihdr(&body, &opts).is_err());
    }

    #[test]
    fn plte_rejects_non_multiple_of_3() {
        let body = [0u8; 4];
        assert!(parse_plte(&body, 8).is_err());
    }

    #[test]
    fn trns_gray_needs_two_bytes() {
        assert!(parse_trns(&[1], PngColor::Luma, &mut [], 0).is_err());
        assert!(parse_trns(&[0, 1], PngColor::Luma, &mut [], 0).is_ok());
    }
}
