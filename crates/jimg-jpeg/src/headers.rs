//! C4: JPEG marker segment parser, SOI through the first SOS.
use alloc::vec::Vec;

use jimg_core::input::InputSource;

use crate::bitreader::JpegByteReader;
use crate::components::Component;
use crate::errors::{JpegError, JpegResult, JpegWarnings};
use crate::huffman::HuffmanTable;
use crate::misc::{SOFMarkers, UN_ZIGZAG};

/// One 8x8 quantization table, stored zig-zag-inverse permuted so the IDCT
/// can address it in natural raster order alongside the un-zig-zagged
/// coefficient block.
#[derive(Copy, Clone)]
pub struct QuantTable {
    pub values: [i32; 64],
}

impl QuantTable {
    /// Build from the 64 values as they appear in a DQT segment (zig-zag
    /// scan order).
    pub fn from_zigzag(raw: &[u16; 64]) -> QuantTable {
        let mut values = [0i32; 64];
        for (i, &v) in raw.iter().enumerate() {
            values[UN_ZIGZAG[i]] = i32::from(v);
        }
        QuantTable { values }
    }
}

/// Result of walking SOI through the first SOS: everything needed to
/// start decoding the first scan.
pub struct FrameHeader {
    pub sof: SOFMarkers,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<Component>,
    /// True when the component ids spell out `'R','G','B'` (case
    /// insensitive): the color transform is skipped and the native
    /// colorspace is RGB rather than YCbCr.
    pub is_rgb_ids: bool,
}

/// One component's table selectors plus the spectral/successive
/// approximation parameters from an SOS segment.
pub struct ScanComponentSelector {
    pub component_index: usize,
    pub dc_table_id: usize,
    pub ac_table_id: usize,
}

pub struct ScanHeader {
    pub components: Vec<ScanComponentSelector>,
    pub ss: u8,
    pub se: u8,
    pub ah: u8,
    pub al: u8,
}

/// Presence/order bitmap enforcing the `{APP0s, SOFXs, SOSs}`
/// segment-order rule.
#[derive(Default, Copy, Clone)]
pub struct SegmentOrderMap {
    pub seen_app0: bool,
    pub seen_sof: bool,
    pub seen_sos: bool,
}

/// ICC profile assembled across one or more APP2 chunks.
#[derive(Default)]
pub struct IccAssembly {
    profile: Vec<u8>,
    declared_size: u32,
    total_chunks: u8,
    next_seq: u8,
    complete: bool,
    aborted: bool,
}

impl IccAssembly {
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn take(&mut self) -> Option<Vec<u8>> {
        if self.complete && !self.aborted {
            Some(core::mem::take(&mut self.profile))
        } else {
            None
        }
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.profile.clear();
        self.complete = true;
    }
}

/// Parse one APP0 segment body (already past the 2-byte length). Returns
/// `true` if this is a well-formed JFIF/JFXX marker; sets `BAD_SIGNATURE`
/// or `BAD_VERSION` on `warnings` otherwise, without aborting the decode.
pub fn parse_app0(body: &[u8], warnings: &mut JpegWarnings) {
    if body.len() < 5 || !(&body[0..5] == b"JFIF\0" || &body[0..5] == b"JFXX\0") {
        warnings.insert(JpegWarnings::BAD_SIGNATURE);
        return;
    }
    if body.len() >= 7 {
        let major = body[5];
        if major != 1 {
            warnings.insert(JpegWarnings::BAD_VERSION);
        }
    }
}

/// Minimum/maximum ICC header sizes accepted inside the first APP2 chunk.
const ICC_HEADER_MIN: u32 = 128;
const ICC_HEADER_MAX: u32 = 0x00FE_EF11;

/// Feed one APP2 (ICC profile) chunk body (already past the `"ICC_PROFILE\0"`
/// 12-byte identifier and the 2-byte `(seq_no, total)` pair) to the
/// multi-chunk assembler. `seq_no` and `total` are both 1-indexed per the
/// ICC-in-JPEG convention.
pub fn feed_app2_icc(
    assembly: &mut IccAssembly, seq_no: u8, total: u8, chunk: &[u8], warnings: &mut JpegWarnings
) {
    if assembly.aborted || assembly.complete {
        return;
    }
    if seq_no == 1 {
        if chunk.len() < 40 || &chunk[36..40] != b"acsp" {
            warnings.insert(JpegWarnings::BAD_ICCP);
            assembly.abort();
            return;
        }
        let size = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !(ICC_HEADER_MIN..=ICC_HEADER_MAX).contains(&size) {
            warnings.insert(JpegWarnings::BAD_ICCP);
            assembly.abort();
            return;
        }
        assembly.declared_size = size;
        assembly.total_chunks = total;
        assembly.next_seq = 2;
        assembly.profile.clear();
        assembly.profile.extend_from_slice(chunk);
    } else {
        if total != assembly.total_chunks || seq_no != assembly.next_seq {
            warnings.insert(JpegWarnings::BAD_ICCP);
            assembly.abort();
            return;
        }
        assembly.profile.extend_from_slice(chunk);
        assembly.next_seq += 1;
    }
    if seq_no == total {
        assembly.complete = true;
    }
}

/// Parse one DQT segment, handing each `(table_id, QuantTable)` pair it
/// contains to `sink`. A DQT segment may define up to four tables.
pub fn parse_dqt<S: InputSource>(
    stream: &mut JpegByteReader<S>, body_len: u16, sink: &mut dyn FnMut(usize, QuantTable) -> JpegResult<()>
) -> JpegResult<()> {
    let mut remaining = i64::from(body_len);
    while remaining > 0 {
        let pq_tq = stream.read_u8()?;
        remaining -= 1;
        let precision = pq_tq >> 4;
        let table_id = usize::from(pq_tq & 0x0F);
        if table_id > 3 {
            return Err(JpegError::TableId(alloc::format!("DQT table id {table_id} > 3")));
        }
        if precision > 1 {
            return Err(JpegError::BadData("DQT precision must be 0 or 1".into()));
        }
        let mut raw = [0u16; 64];
        for slot in raw.iter_mut() {
            if precision == 0 {
                *slot = u16::from(stream.read_u8()?);
                remaining -= 1;
            } else {
                *slot = stream.read_u16_be()?;
                remaining -= 2;
            }
        }
        sink(table_id, QuantTable::from_zigzag(&raw))?;
    }
    Ok(())
}

/// One table's worth of a DHT segment before the caller builds the
/// [`HuffmanTable`] (building needs `is_dc` which the caller already
/// knows from `kind`).
pub struct RawHuffmanSpec {
    pub kind_is_dc: bool,
    pub table_id: usize,
    pub lens: [u8; 17],
    pub symbols: Vec<u8>,
}

/// Parse one DHT segment, handing each table spec it contains to `sink`.
pub fn parse_dht<S: InputSource>(
    stream: &mut JpegByteReader<S>, body_len: u16, sink: &mut dyn FnMut(RawHuffmanSpec) -> JpegResult<()>
) -> JpegResult<()> {
    let mut remaining = i64::from(body_len);
    while remaining > 0 {
        let tc_th = stream.read_u8()?;
        remaining -= 1;
        let kind_is_dc = (tc_th >> 4) == 0;
        let table_id = usize::from(tc_th & 0x0F);
        if table_id > 3 {
            return Err(JpegError::TableId(alloc::format!("DHT table id {table_id} > 3")));
        }
        let mut lens = [0u8; 17];
        let mut total = 0usize;
        for len in 1..=16usize {
            let c = stream.read_u8()?;
            lens[len] = c;
            total += usize::from(c);
        }
        remaining -= 16;
        let symbols = stream.read_vec(total)?;
        remaining -= total as i64;
        sink(RawHuffmanSpec { kind_is_dc, table_id, lens, symbols })?;
    }
    Ok(())
}

/// Parse an SOF0/SOF1/SOF2 segment body.
pub fn parse_sof<S: InputSource>(
    stream: &mut JpegByteReader<S>, sof: SOFMarkers
) -> JpegResult<FrameHeader> {
    let precision = stream.read_u8()?;
    if precision != 8 {
        return Err(JpegError::NotSupported("only 8-bit sample precision is supported"));
    }
    let height = stream.read_u16_be()?;
    let width = stream.read_u16_be()?;
    let nc = stream.read_u8()?;
    if !matches!(nc, 1 | 3) {
        return Err(JpegError::InvalidImage(alloc::format!(
            "{nc} components, only 1 or 3 are supported"
        )));
    }

    let mut components = Vec::with_capacity(usize::from(nc));
    let mut sampling_sum = 0u32;
    let mut ids = Vec::with_capacity(usize::from(nc));
    for _ in 0..nc {
        let id = stream.read_u8()?;
        let hv = stream.read_u8()?;
        let h = hv >> 4;
        let v = hv & 0x0F;
        let qt_id = usize::from(stream.read_u8()?);
        if qt_id > 3 {
            return Err(JpegError::TableId(alloc::format!("component quant table id {qt_id} > 3")));
        }
        sampling_sum += u32::from(h) * u32::from(v);
        ids.push(id);
        components.push(Component::new(id, h, v, qt_id)?);
    }
    if sampling_sum > 10 {
        return Err(JpegError::InvalidImage(alloc::format!(
            "sum of H*V sampling factors {sampling_sum} exceeds 10"
        )));
    }

    let is_rgb_ids = nc == 3
        && {
            let upper: Vec<u8> = ids.iter().map(|b| b.to_ascii_uppercase()).collect();
            upper == [b'R', b'G', b'B']
        };

    Ok(FrameHeader { sof, precision, width, height, components, is_rgb_ids })
}

/// Parse an SOS segment body. `components` is the frame's component list,
/// used to resolve each scan selector's table ids against valid
/// components (by id) and turn them into indices.
pub fn parse_sos<S: InputSource>(
    stream: &mut JpegByteReader<S>, frame_components: &[Component]
) -> JpegResult<ScanHeader> {
    let ns = stream.read_u8()?;
    if ns == 0 || usize::from(ns) > frame_components.len() {
        return Err(JpegError::InvalidImage(alloc::format!(
            "SOS declares {ns} components, frame has {}",
            frame_components.len()
        )));
    }
    let mut components = Vec::with_capacity(usize::from(ns));
    for _ in 0..ns {
        let id = stream.read_u8()?;
        let td_ta = stream.read_u8()?;
        let component_index = frame_components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| JpegError::InvalidImage(alloc::format!("SOS references unknown component id {id}")))?;
        components.push(ScanComponentSelector {
            component_index,
            dc_table_id: usize::from(td_ta >> 4),
            ac_table_id: usize::from(td_ta & 0x0F),
        });
    }
    let ss = stream.read_u8()?;
    let se = stream.read_u8()?;
    let ah_al = stream.read_u8()?;
    let ah = ah_al >> 4;
    let al = ah_al & 0x0F;
    if ss > se || se > 63 || ah > 13 || al > 13 {
        return Err(JpegError::InvalidPass(alloc::format!(
            "SOS parameters Ss={ss} Se={se} Ah={ah} Al={al} out of range"
        )));
    }
    Ok(ScanHeader { components, ss, se, ah, al })
}

/// Build a [`HuffmanTable`] from a parsed DHT spec.
pub fn build_huffman_table(spec: &RawHuffmanSpec) -> JpegResult<HuffmanTable> {
    HuffmanTable::new(&spec.lens, &spec.symbols, spec.kind_is_dc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app0_missing_signature_warns() {
        let mut w = JpegWarnings::empty();
        parse_app0(b"XXXX\0\x01\x02", &mut w);
        assert!(w.contains(JpegWarnings::BAD_SIGNATURE));
    }

    #[test]
    fn app0_bad_version_warns() {
        let mut w = JpegWarnings::empty();
        parse_app0(b"JFIF\0\x02\x00", &mut w);
        assert!(w.contains(JpegWarnings::BAD_VERSION));
        assert!(!w.contains(JpegWarnings::BAD_SIGNATURE));
    }

    #[test]
    fn quant_table_unzigzags() {
        let mut raw = [0u16; 64];
        raw[1] = 7; // zig-zag position 1 maps to natural position 1
        let qt = QuantTable::from_zigzag(&raw);
        assert_eq!(qt.values[UN_ZIGZAG[1]], 7);
    }
}
