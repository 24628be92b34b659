//! C5: entropy (Huffman) decode of one 8x8 block's worth of coefficients,
//! baseline and all four progressive scan shapes, plus restart-marker
//! resync.
use jimg_core::input::InputSource;

use crate::bitreader::{BitReader, JpegByteReader};
use crate::components::Component;
use crate::errors::{JpegError, JpegResult};
use crate::huffman::HuffmanTable;

/// Maximum number of progressive scans a single image may contain before
/// decoding aborts; guards against a crafted file that spins the decoder
/// through an unbounded number of passes.
pub const JPG_MAXPASSES: u32 = 100;

/// Sign-extend an `size`-bit JPEG magnitude category value. `bits` holds
/// the raw `size` bits read from the stream; when the top bit is `0` the
/// value is negative and lies in `-(2^size - 1) ..= -2^(size-1)`,
/// otherwise it's positive and already equal to `bits` (table F.12 of the
/// ITU-T T.81 JPEG standard).
#[inline]
pub fn extend(size: u8, bits: u32) -> i32 {
    if size == 0 {
        return 0;
    }
    let vt = 1i32 << (size - 1);
    let bits = bits as i32;
    if bits < vt {
        bits - (1 << size) + 1
    } else {
        bits
    }
}

/// Decode one DC or AC Huffman-coded symbol: read the root window, resolve
/// via the fast table, and fall back to bit-at-a-time slow lookup for
/// codes longer than [`crate::huffman::ROOTBITS`].
fn decode_symbol<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, table: &HuffmanTable
) -> JpegResult<u8> {
    // `refill` always tops the accumulator up past ROOTBITS (or pads with
    // zeros once a marker has been hit), so the root window read below
    // never underflows.
    bits.refill(stream)?;
    let window = bits.get_bits(crate::huffman::ROOTBITS);
    let (symbol, length) = table.fast_lookup(window);
    if length != 0 {
        bits.drop_bits(u32::from(length));
        return Ok(symbol);
    }
    // Slow path: grow the code one bit at a time past ROOTBITS up to 16.
    let mut code = window;
    let mut len = crate::huffman::ROOTBITS;
    bits.drop_bits(len);
    loop {
        if len > 16 {
            return Err(JpegError::BadCode("huffman code exceeds 16 bits"));
        }
        if let Some(sym) = table.slow_lookup(code, len) {
            return Ok(sym);
        }
        let next = bits.read_bits(stream, 1)?;
        code = (code << 1) | next;
        len += 1;
    }
}

/// Read `n` raw (non-Huffman-coded) magnitude bits.
fn receive<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, n: u8
) -> JpegResult<u32> {
    if n == 0 {
        return Ok(0);
    }
    bits.read_bits(stream, u32::from(n))
}

/// Baseline (sequential DCT) block decode: one DC difference plus up to 63
/// AC coefficients in natural scan order, written into `block` in
/// zig-zag order (the caller un-zig-zags before IDCT).
pub fn decode_baseline_block<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, dc_table: &HuffmanTable,
    ac_table: &HuffmanTable, dc_predictor: &mut i32, block: &mut [i16; 64]
) -> JpegResult<()> {
    *block = [0i16; 64];

    let size = decode_symbol(bits, stream, dc_table)?;
    if size > 16 {
        return Err(JpegError::BadCode("dc magnitude category > 16"));
    }
    let diff = if size == 0 {
        0
    } else {
        extend(size, receive(bits, stream, size)?)
    };
    *dc_predictor += diff;
    block[0] = *dc_predictor as i16;

    let mut k = 1usize;
    while k < 64 {
        let rs = decode_symbol(bits, stream, ac_table)?;
        let run = rs >> 4;
        let size = rs & 0x0F;
        if size == 0 {
            if run == 15 {
                // ZRL: skip 16 zero coefficients.
                k += 16;
                continue;
            }
            // EOB: remaining coefficients in this block are zero.
            break;
        }
        k += usize::from(run);
        if k >= 64 {
            return Err(JpegError::BadCode("ac run overflowed block"));
        }
        let value = extend(size, receive(bits, stream, size)?);
        block[k] = value as i16;
        k += 1;
    }
    Ok(())
}

/// Progressive DC first scan (`Ss == 0, Ah == 0`): same DC-difference
/// decode as baseline, but the raw value is left-shifted by `al` (point
/// transform) before being added to the running predictor.
pub fn decode_progressive_dc_first<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, dc_table: &HuffmanTable,
    dc_predictor: &mut i32, al: u8, block: &mut [i16; 64]
) -> JpegResult<()> {
    let size = decode_symbol(bits, stream, dc_table)?;
    let diff = if size == 0 {
        0
    } else {
        extend(size, receive(bits, stream, size)?)
    };
    *dc_predictor += diff;
    block[0] = (*dc_predictor << al) as i16;
    Ok(())
}

/// Progressive DC refinement scan (`Ss == 0, Ah != 0`): append one more
/// bit to the DC coefficient's existing value, no Huffman code involved.
pub fn decode_progressive_dc_refine<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, al: u8, block: &mut [i16; 64]
) -> JpegResult<()> {
    let bit = bits.read_bits(stream, 1)?;
    block[0] |= (bit << al) as i16;
    Ok(())
}

/// Progressive AC first scan (`Ss != 0, Ah == 0`), spectral band
/// `ss..=se`. An EOB run lets a single code mark `n+1` consecutive blocks
/// as entirely zero in this band; `eob_run` is carried by the caller's
/// [`Component`] across blocks.
pub fn decode_progressive_ac_first<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, ac_table: &HuffmanTable, ss: u8, se: u8,
    al: u8, eob_run: &mut u16, block: &mut [i16; 64]
) -> JpegResult<()> {
    if *eob_run > 0 {
        *eob_run -= 1;
        return Ok(());
    }

    let mut k = usize::from(ss);
    let se = usize::from(se);
    while k <= se {
        let rs = decode_symbol(bits, stream, ac_table)?;
        let run = rs >> 4;
        let size = rs & 0x0F;
        if size == 0 {
            if run < 15 {
                // EOB run: `run` more magnitude bits extend the count.
                // `eob_run` holds the number of *additional* blocks after
                // this one to treat as all-zero (the `-1` below is what
                // keeps that convention consistent with the
                // decrement-at-top-of-call check above: the current
                // block itself, handled by falling out of this loop, is
                // not counted again here).
                let extra = if run > 0 { receive(bits, stream, run as u8)? } else { 0 };
                *eob_run = ((1u32 << run) - 1 + extra) as u16;
                break;
            }
            // run == 15: ZRL, skip 16 zero coefficients.
            k += 16;
            continue;
        }
        k += usize::from(run);
        if k > se {
            return Err(JpegError::BadCode("ac run overflowed spectral band"));
        }
        let value = extend(size, receive(bits, stream, size)?);
        block[k] = (value << al) as i16;
        k += 1;
    }
    Ok(())
}

/// Progressive AC refinement scan (`Ss != 0, Ah != 0`): the trickiest
/// shape, since nonzero coefficients from earlier passes need one more
/// bit appended while zero coefficients may newly become nonzero, all
/// while correction bits for skipped-over nonzero coefficients inside an
/// EOB run must still be consumed.
#[allow(clippy::too_many_arguments)]
pub fn decode_progressive_ac_refine<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, ac_table: &HuffmanTable, ss: u8, se: u8,
    al: u8, eob_run: &mut u16, block: &mut [i16; 64]
) -> JpegResult<()> {
    let p1 = 1i16 << al;
    let m1 = -1i16 << al;
    let ss = usize::from(ss);
    let se = usize::from(se);
    let mut k = ss;

    if *eob_run == 0 {
        while k <= se {
            let rs = decode_symbol(bits, stream, ac_table)?;
            let mut run = i32::from(rs >> 4);
            let size = rs & 0x0F;
            let mut value = 0i16;
            if size == 0 {
                if run < 15 {
                    let mut run_len = run as u32;
                    if run_len > 0 {
                        run_len = receive(bits, stream, run as u8)? + (1 << run);
                    } else {
                        run_len = 0;
                    }
                    *eob_run = run_len as u16;
                    // The rest of this block's band still needs existing
                    // nonzero coefficients refined; only newly-nonzero
                    // coefficients are withheld from here on (an
                    // unreachable negative run count means "never").
                    run = i32::MAX;
                } else {
                    // run == 15: ZRL, refine/skip over the next 16
                    // positions exactly like a decoded run of 15 below.
                }
            } else {
                // An AC-refine correction bit is always exactly 1 bit
                // wide; the new coefficient's sign is carried directly in
                // that single magnitude bit.
                let bit = receive(bits, stream, 1)?;
                value = if bit != 0 { p1 } else { m1 };
            }

            while k <= se {
                if block[k] != 0 {
                    let correction = receive(bits, stream, 1)?;
                    if correction != 0 && (block[k] & p1) == 0 {
                        block[k] += if block[k] >= 0 { p1 } else { m1 };
                    }
                } else {
                    if run == 0 {
                        if value != 0 {
                            block[k] = value;
                        }
                        k += 1;
                        break;
                    }
                    run -= 1;
                }
                k += 1;
            }
        }
    }

    if *eob_run > 0 {
        while k <= se {
            if block[k] != 0 {
                let correction = receive(bits, stream, 1)?;
                if correction != 0 && (block[k] & p1) == 0 {
                    block[k] += if block[k] >= 0 { p1 } else { m1 };
                }
            }
            k += 1;
        }
        *eob_run -= 1;
    }
    Ok(())
}

/// Reset state that a restart marker (RSTn) requires: every component's
/// DC predictor and EOB run go back to zero, and the bit reader resyncs
/// to a fresh byte (the 0-7 leftover bits of the prior MCU are discarded,
/// not folded into the next one).
///
/// `refill` always reads at least two bytes ahead of what's actually been
/// consumed bit-by-bit, so by the time a restart boundary is reached the
/// RSTn marker has normally already been pulled from the stream and is
/// sitting in `bits.marker()` rather than still unread. A lagging refill
/// (marker not yet seen) falls back to reading the two bytes directly.
pub fn handle_restart<S: InputSource>(
    bits: &mut BitReader, stream: &mut JpegByteReader<S>, components: &mut [Component]
) -> JpegResult<()> {
    match bits.marker() {
        Some(crate::marker::Marker::RST(_)) => {}
        Some(_) => return Err(JpegError::BadData("expected restart marker, found a different marker".into())),
        None => {
            let marker = stream.read_u16_be()?;
            if marker & 0xFFF8 != 0xFFD0 {
                return Err(JpegError::BadData("expected restart marker".into()));
            }
        }
    }
    bits.reset();
    for c in components.iter_mut() {
        c.dc_predictor = 0;
        c.eob_run = 0;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_sign_extension() {
        // size=1: 0 -> -1, 1 -> 1
        assert_eq!(extend(1, 0), -1);
        assert_eq!(extend(1, 1), 1);
        // size=3: range is -7..=-4 for bits 0..=3, 4..=7 for bits 4..=7
        assert_eq!(extend(3, 0), -7);
        assert_eq!(extend(3, 3), -4);
        assert_eq!(extend(3, 4), 4);
        assert_eq!(extend(3, 7), 7);
        assert_eq!(extend(0, 0), 0);
    }

    /// An EOBn code with `run=1` and a zero extra bit means "this block
    /// plus 1 more are all-zero" (2 blocks total), not 3: the symbol's
    /// own block is handled by falling out of this call's decode loop,
    /// and `eob_run` must count only the *additional* blocks the next
    /// calls should skip.
    #[test]
    fn ac_first_eob_run_counts_additional_blocks_only() {
        use jimg_core::input::SliceSource;

        // AC table: a single 1-bit code (bit `0`) mapping to symbol
        // 0x10 (run=1, size=0 -> EOBn with run category 1).
        let mut lens = [0u8; 17];
        lens[1] = 1;
        let symbols = [0x10u8];
        let ac_table = HuffmanTable::new(&lens, &symbols, false).unwrap();

        // Bitstream: selector bit `0`, then one extra bit `0` (extra=0),
        // then padding zero bytes so refill never starves.
        let wire = [0u8, 0u8, 0u8, 0u8];
        let mut stream = JpegByteReader::new(SliceSource::new(&wire));
        let mut bits = BitReader::new();
        let mut eob_run = 0u16;
        let mut block = [0i16; 64];

        decode_progressive_ac_first(&mut bits, &mut stream, &ac_table, 1, 63, 0, &mut eob_run, &mut block)
            .unwrap();
        assert_eq!(eob_run, 1, "run=1, extra=0 should leave exactly 1 additional block to skip");

        // Second block: consumes the carried-over eob_run without
        // decoding any further symbols.
        let mut block2 = [0i16; 64];
        decode_progressive_ac_first(&mut bits, &mut stream, &ac_table, 1, 63, 0, &mut eob_run, &mut block2)
            .unwrap();
        assert_eq!(eob_run, 0, "after 1 additional block the eob run must be exhausted");
    }
}
