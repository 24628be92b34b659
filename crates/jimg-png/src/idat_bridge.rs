//! IDAT chunk stream to inflator bridge.
use alloc::format;
use alloc::vec::Vec;

use jimg_core::input::InputSource;
use zune_inflate::{DeflateDecoder, DeflateOptions};

use crate::enums::PngChunkType;
use crate::error::{PngError, PngResult};
use crate::headers::{read_chunk_body, read_chunk_head, ChunkHead};
use crate::options::PngOptions;
use crate::reader::PngByteReader;

/// Concatenate every contiguous IDAT chunk body into one logical
/// compressed stream, validating each chunk's CRC as its body is read,
/// then hand the assembled buffer to the inflator in a single call.
///
/// A fully streaming decoder would pull the inflator incrementally
/// through a `set_src`/`inflate`/`SRC_EXHAUSTED` contract so it never
/// needs the whole compressed stream resident in memory at once.
/// `zune_inflate` instead exposes a single whole-buffer `decode_zlib`
/// call. Assembling the bytes first and inflating once preserves every
/// other part of the observable contract — IDAT contiguity, per-chunk
/// CRC, the zlib header checks on the first two bytes of the concatenated
/// stream, the trailing
/// Adler-32 check — at the cost of buffering the compressed stream before
/// decompression starts (see DESIGN.md).
///
/// `first_head` is the already-read head of the first IDAT chunk. Returns
/// the inflated bytes and the head of the first non-IDAT chunk seen
/// (expected to be IEND by the caller).
pub fn assemble_and_inflate<S: InputSource>(
    stream: &mut PngByteReader<S>, first_head: ChunkHead, options: &PngOptions,
) -> PngResult<(Vec<u8>, ChunkHead)> {
    let mut compressed = Vec::new();
    let mut head = first_head;
    loop {
        if head.chunk_type != PngChunkType::IDAT {
            break;
        }
        let body = read_chunk_body(stream, &head, options)?;
        compressed.extend_from_slice(&body);
        head = read_chunk_head(stream)?;
    }

    let deflate_opts = DeflateOptions::default().set_confirm_checksum(!options.no_crc_check());
    let mut decoder = DeflateDecoder::new_with_options(&compressed, deflate_opts);
    let raw = decoder
        .decode_zlib()
        .map_err(|e| PngError::Deflate(format!("{e:?}")))?;
    Ok((raw, head))
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use jimg_core::input::SliceSource;

    use super::*;
    use crate::headers::read_chunk_head;

    fn zlib_deflate_stored(data: &[u8]) -> Vec<u8> {
        // Build a single-block "stored" (uncompressed) zlib stream by
        // hand so this test doesn't depend on a working encoder.
        let mut out = vec![0x78, 0x01]; // CMF/FLG, cm=8, fcheck%31==0
        out.push(0x01); // BFINAL=1, BTYPE=00 (stored), rest of byte padding = 0
        let len = data.len() as u16;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(data);
        let adler = simple_adler32(data);
        out.extend_from_slice(&adler.to_be_bytes());
        out
    }

    fn simple_adler32(data: &[u8]) -> u32 {
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in data {
            a = (a + u32::from(byte)) % 65521;
            b = (b + a) % 65521;
        }
        (b << 16) | a
    }

    fn push_chunk(buf: &mut Vec<u8>, fcc: &[u8; 4], body: &[u8]) {
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(fcc);
        buf.extend_from_slice(body);
        let mut crc_input = Vec::new();
        crc_input.extend_from_slice(fcc);
        crc_input.extend_from_slice(body);
        let crc = crate::crc::crc32(&crc_input);
        buf.extend_from_slice(&crc.to_be_bytes());
    }

    #[test]
    fn assembles_two_idat_chunks_across_boundary() {
        let zlib = zlib_deflate_stored(b"hello world");
        let (first, second) = zlib.split_at(zlib.len() / 2);

        let mut wire = Vec::new();
        push_chunk(&mut wire, b"IDAT", first);
        push_chunk(&mut wire, b"IDAT", second);
        push_chunk(&mut wire, b"IEND", &[]);

        let mut byte_reader = PngByteReader::new(SliceSource::new(&wire));
        let options = PngOptions::new(jimg_core::options::DecoderOptions::default());
        let first_head = read_chunk_head(&mut byte_reader).unwrap();
        let (raw, next) = assemble_and_inflate(&mut byte_reader, first_head, &options).unwrap();
        assert_eq!(raw, b"hello world");
        assert_eq!(next.chunk_type, PngChunkType::IEND);
    }
}
