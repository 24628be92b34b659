//! Scenario E3: a 4x4 indexed image decoded pass by pass, checking the
//! Adam7 driver exposes exactly the sub-image sizes the interlace tables
//! predict and paints each pixel no earlier than its owning pass.
use jimg_core::input::SliceSource;
use jimg_core::options::DecoderOptions;
use jimg_png::{PngOptions, PngReader};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &byte in data {
        a = (a + u32::from(byte)) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

fn zlib_stored(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x01];
    out.push(0x01);
    let len = data.len() as u16;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

fn push_chunk(buf: &mut Vec<u8>, fcc: &[u8; 4], body: &[u8]) {
    buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    buf.extend_from_slice(fcc);
    buf.extend_from_slice(body);
    let mut crc_input = Vec::new();
    crc_input.extend_from_slice(fcc);
    crc_input.extend_from_slice(body);
    buf.extend_from_slice(&jimg_png::crc::crc32(&crc_input).to_be_bytes());
}

fn ihdr_body(w: u32, h: u32, depth: u8, color: u8, interlace: u8) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&w.to_be_bytes());
    v.extend_from_slice(&h.to_be_bytes());
    v.push(depth);
    v.push(color);
    v.push(0);
    v.push(0);
    v.push(interlace);
    v
}

/// A 4x4 8-bit indexed image, Adam7-interlaced. Palette entry `k` is the
/// gray level `k * 16`, and pixel `(x, y)` always selects palette index
/// `y * 4 + x`, so every decoded sample is independently identifiable.
fn indexed_4x4_adam7() -> Vec<u8> {
    let mut wire = PNG_SIGNATURE.to_vec();
    push_chunk(&mut wire, b"IHDR", &ihdr_body(4, 4, 8, 3, 1));

    let mut plte = Vec::new();
    for k in 0u8..16 {
        plte.extend_from_slice(&[k * 16, k * 16, k * 16]);
    }
    push_chunk(&mut wire, b"PLTE", &plte);

    // Adam7 sub-images in pass order, each prefixed with a None filter
    // byte per scanline. Pass 1: one sample at (0,0) -> index 0. Pass 2
    // is empty (origin x=4 is outside a 4-wide image). Pass 3: one
    // sample at (0,2) -> index 8. Pass 4: one sample at (2,0) -> index
    // 2. Pass 5: two samples at (0,2),(2,2) -> wait, pass 5 covers
    // y=2,x=0,2 already taken by pass 3/4; Adam7's real pass 5 grid is
    // x in {0,2}, y in {2} minus what's already covered -- the driver
    // does not skip already-covered coordinates itself (each pass's
    // sub-image is exactly its own grid), so pass 5 here is x in {0,2}
    // at y=2: indices 8, 10.
    let mut raw = Vec::new();

    // Pass 1 (index 0): x=0,y=0 grid -> just (0,0), index 0.
    raw.push(0);
    raw.push(0);

    // Pass 2 (index 1): empty for a 4-wide image, contributes no bytes.

    // Pass 3 (index 2): x=0 grid, y=4 grid -> no rows (y_orig=4 >= height=4).
    // Also empty.

    // Pass 4 (index 3): x_orig=2,x_spc=4 -> x=2 only; y_orig=0,y_spc=4 -> y=0
    // only. One sample at (2,0), index 2.
    raw.push(0);
    raw.push(2);

    // Pass 5 (index 4): x_orig=0,x_spc=2 -> x=0,2; y_orig=2,y_spc=4 -> y=2
    // only. One scanline of 2 samples at (0,2),(2,2), indices 8,10.
    raw.push(0);
    raw.push(8);
    raw.push(10);

    // Pass 6 (index 5): x_orig=1,x_spc=2 -> x=1,3; y_orig=0,y_spc=2 -> y=0,2.
    // Two scanlines of 2 samples: (1,0),(3,0) -> indices 1,3; (1,2),(3,2)
    // -> indices 9,11.
    raw.push(0);
    raw.push(1);
    raw.push(3);
    raw.push(0);
    raw.push(9);
    raw.push(11);

    // Pass 7 (index 6): x_orig=0,x_spc=1 -> x=0..4; y_orig=1,y_spc=2 -> y=1,3.
    // Two scanlines of 4 samples: indices 4,5,6,7 then 12,13,14,15.
    raw.push(0);
    raw.extend_from_slice(&[4, 5, 6, 7]);
    raw.push(0);
    raw.extend_from_slice(&[12, 13, 14, 15]);

    push_chunk(&mut wire, b"IDAT", &zlib_stored(&raw));
    push_chunk(&mut wire, b"IEND", &[]);
    wire
}

#[test]
fn e3_adam7_passes_paint_pixels_in_pass_order() {
    let wire = indexed_4x4_adam7();
    let mut reader = PngReader::new(SliceSource::new(&wire), PngOptions::new(DecoderOptions::default()));
    let info = reader.init_decoder().unwrap();
    assert_eq!(info.size_x, 4);
    assert_eq!(info.size_y, 4);

    reader.set_buffers(info.byte_size).unwrap();
    let mut pixels = vec![0u8; info.byte_size];
    let stride = info.byte_size / 4;
    let gray_at = |pixels: &[u8], x: usize, y: usize| pixels[y * stride + x * 3];

    // Pass 1 (call 1): only pixel (0,0) is painted, to index 0 -> gray 0.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 1);
    assert_eq!(gray_at(&pixels, 0, 0), 0);
    assert_eq!(gray_at(&pixels, 1, 0), 0); // not yet painted

    // Pass 2 (call 2): empty, no effect, but the pass counter still advances.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 2);

    // Pass 3 (call 3): empty for this image size.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 3);

    // Pass 4 (call 4): pixel (2,0) painted to index 2 -> gray 32.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 4);
    assert_eq!(gray_at(&pixels, 2, 0), 32);

    // Pass 5 (call 5): one scanline of 2 samples, (0,2) and (2,2).
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 5);
    assert_eq!(gray_at(&pixels, 0, 2), 128); // index 8 -> 8*16
    assert_eq!(gray_at(&pixels, 2, 2), 160); // index 10 -> 10*16

    // Pixel (1,0) is still unpainted going into pass 6.
    assert_eq!(gray_at(&pixels, 1, 0), 0);

    // Pass 6 (call 6): two scanlines of 2 samples each; (1,0) first
    // painted here, to index 1 -> gray 16.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 6);
    assert_eq!(gray_at(&pixels, 1, 0), 16);
    assert_eq!(gray_at(&pixels, 3, 2), 176); // index 11 -> 11*16

    // Pass 7 (call 7): two scanlines of 4 samples; this is the final
    // pass and decode_pass now reports completion.
    let next = reader.decode_pass(&mut pixels).unwrap();
    assert_eq!(next, 0);
    assert_eq!(gray_at(&pixels, 0, 1), 64); // index 4 -> 4*16
    assert_eq!(gray_at(&pixels, 3, 3), 240); // index 15 -> 15*16

    // Every pixel ended up distinct and matching its own y*4+x index.
    for y in 0..4usize {
        for x in 0..4usize {
            assert_eq!(gray_at(&pixels, x, y), ((y * 4 + x) * 16) as u8);
        }
    }
}
