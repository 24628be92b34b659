//! Turn an unfiltered, unpacked raw scanline into the final pixel layout
//! described by [`jimg_core::ImageInfo`].
use crate::enums::PngColor;

/// Palette lookup, tRNS-key comparison and indexed expansion for one raw
/// scanline. `raw` holds one sample per pixel-channel, `sample_bytes`
/// wide, in the order PNG defines for `color` (no bit-packing left: the
/// caller already ran [`crate::filters::unpack_subbyte`] for depths < 8).
///
/// Samples are never converted to a native integer: PNG already stores
/// multi-byte samples big-endian, so keeping everything as raw bytes and
/// comparing byte-for-byte both reproduces the tRNS-key match and keeps
/// PNG's big-endian sample order intact on every host endianness.
#[allow(clippy::too_many_arguments)]
pub fn materialize_row(
    color: PngColor, raw: &[u8], sample_bytes: usize, width: usize, palette: &[[u8; 4]],
    has_alpha_palette: bool, depth_scale: u8, trns_gray: Option<[u8; 2]>, trns_rgb: Option<[[u8; 2]; 3]>,
    out: &mut [u8],
) {
    match color {
        PngColor::Palette => {
            let out_components = if has_alpha_palette { 4 } else { 3 };
            for px in 0..width {
                let idx = raw[px] as usize;
                let entry = palette[idx];
                let o = &mut out[px * out_components..px * out_components + out_components];
                o[..3].copy_from_slice(&entry[..3]);
                if has_alpha_palette {
                    o[3] = entry[3];
                }
            }
        }
        PngColor::Luma => {
            // tRNS keys are compared against the raw (un-scaled) sample
            // value; `depth_scale` only spreads the emitted byte across
            // the full 0..255 range for sub-8-bit depths.
            if let Some(key) = trns_gray {
                let key = &key[2 - sample_bytes..];
                for px in 0..width {
                    let sample = &raw[px * sample_bytes..px * sample_bytes + sample_bytes];
                    let o = &mut out[px * sample_bytes * 2..px * sample_bytes * 2 + sample_bytes * 2];
                    if sample_bytes == 1 {
                        o[0] = sample[0].wrapping_mul(depth_scale);
                    } else {
                        o[..sample_bytes].copy_from_slice(sample);
                    }
                    let opaque = sample != key;
                    for b in &mut o[sample_bytes..] {
                        *b = if opaque { 0xFF } else { 0x00 };
                    }
                }
            } else {
                for px in 0..width {
                    let sample = &raw[px * sample_bytes..px * sample_bytes + sample_bytes];
                    let o = &mut out[px * sample_bytes..px * sample_bytes + sample_bytes];
                    if sample_bytes == 1 {
                        o[0] = sample[0].wrapping_mul(depth_scale);
                    } else {
                        o.copy_from_slice(sample);
                    }
                }
            }
        }
        PngColor::RGB => {
            if let Some(key) = trns_rgb {
                for px in 0..width {
                    let sample = &raw[px * sample_bytes * 3..px * sample_bytes * 3 + sample_bytes * 3];
                    let o_start = px * (sample_bytes * 3 + sample_bytes);
                    let o = &mut out[o_start..o_start + sample_bytes * 3 + sample_bytes];
                    o[..sample_bytes * 3].copy_from_slice(sample);
                    let matches = (0..3).all(|c| {
                        let want = &key[c][2 - sample_bytes..];
                        &sample[c * sample_bytes..(c + 1) * sample_bytes] == want
                    });
                    for b in &mut o[sample_bytes * 3..] {
                        *b = if matches { 0x00 } else { 0xFF };
                    }
                }
            } else {
                out[..raw.len()].copy_from_slice(raw);
            }
        }
        PngColor::LumaA | PngColor::RGBA => out[..raw.len()].copy_from_slice(raw),
        PngColor::Unknown => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_trns_key_marks_transparent() {
        // two 8-bit gray pixels: one matches the key (10), one doesn't.
        let raw = [10u8, 20];
        let key = [0u8, 10];
        let mut out = [0u8; 4];
        materialize_row(PngColor::Luma, &raw, 1, 2, &[], false, 1, Some(key), None, &mut out);
        assert_eq!(out, [10, 0x00, 20, 0xFF]);
    }

    #[test]
    fn rgb_trns_key_marks_transparent() {
        let raw = [10u8, 20, 30, 70, 80, 90];
        let key = [[0u8, 10], [0u8, 20], [0u8, 30]];
        let mut out = [0u8; 8];
        materialize_row(PngColor::RGB, &raw, 1, 2, &[], false, 1, None, Some(key), &mut out);
        assert_eq!(out, [10, 20, 30, 0x00, 70, 80, 90, 0xFF]);
    }

    #[test]
    fn palette_lookup_without_alpha() {
        let palette = {
            let mut p = [[0u8; 4]; 256];
            p[5] = [1, 2, 3, 255];
            p
        };
        let raw = [5u8];
        let mut out = [0u8; 3];
        materialize_row(PngColor::Palette, &raw, 1, 1, &palette, false, 1, None, None, &mut out);
        assert_eq!(out, [1, 2, 3]);
    }
}
