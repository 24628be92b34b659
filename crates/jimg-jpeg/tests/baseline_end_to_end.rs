//! Black-box end-to-end scenarios from the design doc's testable
//! properties: full marker-to-pixel decode over hand-built wire bytes,
//! no internal APIs touched.
use jimg_core::input::SliceSource;
use jimg_core::options::DecoderOptions;
use jimg_core::colorspace::ColorSpace;
use jimg_jpeg::{JpegOptions, JpegReader};

/// Appends a marker segment with a 2-byte big-endian length prefix
/// (the length field itself counts toward the length, per the JPEG wire
/// format).
fn push_segment(buf: &mut Vec<u8>, marker: u16, body: &[u8]) {
    buf.extend_from_slice(&marker.to_be_bytes());
    let len = (body.len() + 2) as u16;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(body);
}

/// A minimal 16x16 4:2:0 baseline frame whose every block decodes flat:
/// Y's DC predictor steps from 0 to 128 on the first block and every
/// later block (including Cb/Cr) carries a zero DC difference, so the
/// whole image is one constant color. Mirrors scenario E4.
fn flat_ycbcr_16x16() -> Vec<u8> {
    let mut wire = Vec::new();
    wire.extend_from_slice(&[0xFF, 0xD8]); // SOI

    // DQT: one table, id 0, every entry 8 (only qt[0] matters here since
    // every non-DC coefficient is zero).
    let mut dqt_body = vec![0x00u8];
    dqt_body.extend(core::iter::repeat(8u8).take(64));
    push_segment(&mut wire, 0xFFDB, &dqt_body);

    // DHT: DC table 0 with two length-1 codes (symbol 0 -> code 0,
    // symbol 8 -> code 1), AC table 0 with a single length-1 code
    // (symbol 0x00, EOB, -> code 0).
    let mut dht_body = Vec::new();
    dht_body.push(0x00); // DC, id 0
    let mut dc_lens = [0u8; 16];
    dc_lens[0] = 2;
    dht_body.extend_from_slice(&dc_lens);
    dht_body.extend_from_slice(&[0x00, 0x08]);
    dht_body.push(0x10); // AC, id 0
    let mut ac_lens = [0u8; 16];
    ac_lens[0] = 1;
    dht_body.extend_from_slice(&ac_lens);
    dht_body.push(0x00);
    push_segment(&mut wire, 0xFFC4, &dht_body);

    // SOF0: 16x16, 3 components, Y at 2x2, Cb/Cr at 1x1 (4:2:0).
    let mut sof_body = vec![8u8, 0x00, 0x10, 0x00, 0x10, 0x03];
    sof_body.extend_from_slice(&[1, 0x22, 0x00]);
    sof_body.extend_from_slice(&[2, 0x11, 0x00]);
    sof_body.extend_from_slice(&[3, 0x11, 0x00]);
    push_segment(&mut wire, 0xFFC0, &sof_body);

    // SOS: all three components use DC/AC table 0, full spectral range.
    let mut sos_body = vec![3u8];
    sos_body.extend_from_slice(&[1, 0x00]);
    sos_body.extend_from_slice(&[2, 0x00]);
    sos_body.extend_from_slice(&[3, 0x00]);
    sos_body.extend_from_slice(&[0x00, 0x3F, 0x00]);
    push_segment(&mut wire, 0xFFDA, &sos_body);

    // Entropy-coded segment for the single MCU: Y00 carries DC symbol 8
    // (size 8, magnitude bits 0b10000000 = 128, predictor 0 -> 128) then
    // EOB; Y01/Y10/Y11/Cb/Cr each carry DC symbol 0 (zero difference)
    // then EOB. Bit string: 1 10000000 0 | 0 0 (x5) = 20 bits, padded
    // with zero bits to a byte boundary.
    wire.extend_from_slice(&[0b1100_0000, 0x00, 0x00]);

    wire.extend_from_slice(&[0xFF, 0xD9]); // EOI
    wire
}

#[test]
fn e4_flat_ycbcr_block_decodes_to_white() {
    let wire = flat_ycbcr_16x16();
    let mut reader = JpegReader::new(
        SliceSource::new(&wire),
        JpegOptions::new(DecoderOptions::default()),
    );
    let info = reader.init_decoder().expect("header parse should succeed");
    assert_eq!(info.size_x, 16);
    assert_eq!(info.size_y, 16);
    assert_eq!(info.color_type, ColorSpace::RGB);
    assert_eq!(info.byte_size, 16 * 16 * 3);

    reader.set_buffers(info.byte_size).unwrap();
    let mut pixels = vec![0u8; info.byte_size];
    reader.decode_img(&mut pixels).unwrap();

    // Y residual 128 (+128 level shift, clamped) with zero chroma
    // produces pure white everywhere.
    assert!(pixels.iter().all(|&b| b == 255));
}

/// Scenario E6: component ids spelled `'R','G','B'` suppress the color
/// transform entirely; each output channel is just its own
/// dequantized-plus-level-shift value.
fn flat_rgb_ids_8x8() -> Vec<u8> {
    let mut wire = Vec::new();
    wire.extend_from_slice(&[0xFF, 0xD8]);

    let mut dqt_body = vec![0x00u8];
    dqt_body.extend(core::iter::repeat(8u8).take(64));
    push_segment(&mut wire, 0xFFDB, &dqt_body);

    let mut dht_body = Vec::new();
    dht_body.push(0x00);
    let mut dc_lens = [0u8; 16];
    dc_lens[0] = 2;
    dht_body.extend_from_slice(&dc_lens);
    dht_body.extend_from_slice(&[0x00, 0x08]);
    dht_body.push(0x10);
    let mut ac_lens = [0u8; 16];
    ac_lens[0] = 1;
    dht_body.extend_from_slice(&ac_lens);
    dht_body.push(0x00);
    push_segment(&mut wire, 0xFFC4, &dht_body);

    // SOF0: 8x8, 3 components all at 1x1, ids 'R','G','B'.
    let mut sof_body = vec![8u8, 0x00, 0x08, 0x00, 0x08, 0x03];
    sof_body.extend_from_slice(&[b'R', 0x11, 0x00]);
    sof_body.extend_from_slice(&[b'G', 0x11, 0x00]);
    sof_body.extend_from_slice(&[b'B', 0x11, 0x00]);
    push_segment(&mut wire, 0xFFC0, &sof_body);

    let mut sos_body = vec![3u8];
    sos_body.extend_from_slice(&[b'R', 0x00]);
    sos_body.extend_from_slice(&[b'G', 0x00]);
    sos_body.extend_from_slice(&[b'B', 0x00]);
    sos_body.extend_from_slice(&[0x00, 0x3F, 0x00]);
    push_segment(&mut wire, 0xFFDA, &sos_body);

    // One MCU, one block per component: R carries DC symbol 8 (value
    // 128) then EOB; G and B carry DC symbol 0 (value 0) then EOB.
    wire.extend_from_slice(&[0b1100_0000, 0x00]);

    wire.extend_from_slice(&[0xFF, 0xD9]);
    wire
}

#[test]
fn e6_rgb_component_ids_skip_color_transform() {
    let wire = flat_rgb_ids_8x8();
    let mut reader = JpegReader::new(
        SliceSource::new(&wire),
        JpegOptions::new(DecoderOptions::default()),
    );
    let info = reader.init_decoder().unwrap();
    assert_eq!(info.color_type, ColorSpace::RGB);

    reader.set_buffers(info.byte_size).unwrap();
    let mut pixels = vec![0u8; info.byte_size];
    reader.decode_img(&mut pixels).unwrap();

    // R channel residual 128 clamps to 255; G and B residual 0 level
    // shifts to 128.
    for px in pixels.chunks(3) {
        assert_eq!(px, [255, 128, 128]);
    }
}

/// `KEEP_YCBCR` must suppress the color matrix the same way spelled-out
/// `'R','G','B'` component ids do: a 3-component YCbCr frame with the
/// option set should come back as the raw, level-shifted Y/Cb/Cr samples
/// rather than matrix-converted RGB.
#[test]
fn keep_ycbcr_option_suppresses_color_transform() {
    let wire = flat_ycbcr_16x16();
    let mut reader = JpegReader::new(
        SliceSource::new(&wire),
        JpegOptions::new(DecoderOptions::default()).set_keep_ycbcr(true),
    );
    let info = reader.init_decoder().expect("header parse should succeed");
    assert_eq!(info.color_type, ColorSpace::YCbCr);

    reader.set_buffers(info.byte_size).unwrap();
    let mut pixels = vec![0u8; info.byte_size];
    reader.decode_img(&mut pixels).unwrap();

    // Y residual 128 clamps to 255; Cb/Cr residual 0 level-shifts to 128.
    for px in pixels.chunks(3) {
        assert_eq!(px, [255, 128, 128]);
    }
}

#[test]
fn rejects_file_without_soi() {
    let wire = [0x00u8, 0x01, 0x02, 0x03];
    let mut reader = JpegReader::new(
        SliceSource::new(&wire),
        JpegOptions::new(DecoderOptions::default()),
    );
    assert!(reader.init_decoder().is_err());
}
