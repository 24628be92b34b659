//! The public, stateful JPEG reader: marker parsing through full image
//! reconstruction, driving the reader through its documented lifecycle.
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use jimg_core::colorspace::ColorSpace;
use jimg_core::imageinfo::ImageInfo;
use jimg_core::input::InputSource;
use jimg_core::state::ReaderState;

use crate::bitreader::{BitReader, JpegByteReader};
use crate::color::{self, WriterKind};
use crate::components::Component;
use crate::entropy::{self, JPG_MAXPASSES};
use crate::errors::{JpegError, JpegResult, JpegWarnings};
use crate::headers::{self, FrameHeader, IccAssembly, QuantTable, ScanHeader, SegmentOrderMap};
use crate::huffman::HuffmanTable;
use crate::idct::idct_block;
use crate::marker::{self, Marker};
use crate::misc::{SOFMarkers, UN_ZIGZAG};
use crate::options::JpegOptions;

/// The streaming JPEG reader. One instance owns exactly one input source
/// `S` for its lifetime; [`JpegReader::reset`] rebinds a fresh source and
/// returns the reader to [`ReaderState::NotSet`], folding `reset` together
/// with rebinding the input source since Rust's ownership model makes
/// "detach, then rebind" one step rather than two.
pub struct JpegReader<S> {
    stream: JpegByteReader<S>,
    bits: BitReader,
    options: JpegOptions,
    state: ReaderState,
    error: Option<JpegError>,
    warnings: JpegWarnings,

    width: u16,
    height: u16,
    sof: SOFMarkers,
    is_rgb_ids: bool,
    progressive: bool,
    components: Vec<Component>,
    qt_tables: [Option<QuantTable>; 4],
    dc_tables: [Option<HuffmanTable>; 4],
    ac_tables: [Option<HuffmanTable>; 4],
    restart_interval: u16,
    mcu_x: usize,
    mcu_y: usize,
    h_max: u8,
    v_max: u8,

    segment_map: SegmentOrderMap,
    icc: IccAssembly,
    icc_profile: Option<Vec<u8>>,

    info: ImageInfo,
    buffers_bound: bool,
    pending_scan: Option<ScanHeader>,
    eoi_reached: bool,
    pass_count: u32,
}

impl<S: InputSource> JpegReader<S> {
    pub fn new(source: S, options: JpegOptions) -> Self {
        JpegReader {
            stream: JpegByteReader::new(source),
            bits: BitReader::new(),
            options,
            state: ReaderState::NotSet,
            error: None,
            warnings: JpegWarnings::empty(),
            width: 0,
            height: 0,
            sof: SOFMarkers::BaselineDct,
            is_rgb_ids: false,
            progressive: false,
            components: Vec::new(),
            qt_tables: [None, None, None, None],
            dc_tables: [None, None, None, None],
            ac_tables: [None, None, None, None],
            restart_interval: 0,
            mcu_x: 0,
            mcu_y: 0,
            h_max: 1,
            v_max: 1,
            segment_map: SegmentOrderMap::default(),
            icc: IccAssembly::default(),
            icc_profile: None,
            info: ImageInfo::default(),
            buffers_bound: false,
            pending_scan: None,
            eoi_reached: false,
            pass_count: 0,
        }
    }

    /// Rebind a fresh source and return to [`ReaderState::NotSet`],
    /// discarding every table/component/scan-progress field. Retained
    /// allocations (the `Vec`s backing tables and component coefficient
    /// storage) keep their capacity rather than being freed outright;
    /// there is no separate "soft reset" in this API since nothing here
    /// is retained across sources other than heap capacity.
    pub fn reset(&mut self, source: S) {
        *self = JpegReader::new(source, self.options);
    }

    pub fn get_state(&self) -> (ReaderState, Option<JpegError>, JpegWarnings) {
        (self.state, self.error.clone(), self.warnings)
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    fn abort(&mut self, err: JpegError) -> JpegError {
        self.state = ReaderState::Aborted;
        self.error = Some(err.clone());
        err
    }

    /// Parse SOI through the first SOS, populating `ImageInfo` and
    /// transitioning to [`ReaderState::Ready`].
    pub fn init_decoder(&mut self) -> JpegResult<ImageInfo> {
        if self.state != ReaderState::NotSet {
            return Err(self.abort(JpegError::IncorrectUse(
                "init_decoder called outside of NotSet"
            )));
        }
        match self.init_decoder_inner() {
            Ok(info) => {
                self.info = info;
                self.state = ReaderState::Ready;
                Ok(info)
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn init_decoder_inner(&mut self) -> JpegResult<ImageInfo> {
        let soi = self.stream.read_u16_be()?;
        if soi != marker::SOI {
            return Err(JpegError::BadFile("file does not start with an SOI marker"));
        }

        loop {
            let marker = self.stream.read_marker()?;
            match marker {
                Marker::APP(0) => self.handle_app0()?,
                Marker::APP(1) => self.handle_app1_app13(true)?,
                Marker::APP(2) => self.handle_app2()?,
                Marker::APP(13) => self.handle_app1_app13(false)?,
                Marker::APP(_) => self.skip_segment()?,
                Marker::DQT => self.handle_dqt()?,
                Marker::DHT => self.handle_dht()?,
                Marker::SOF(n) => self.handle_sof(n)?,
                Marker::DRI => {
                    let len = self.stream.read_segment_length()?;
                    if len != 2 {
                        return Err(JpegError::BadData("DRI segment length must be 2".into()));
                    }
                    self.restart_interval = self.stream.read_u16_be()?;
                }
                Marker::SOS => {
                    if !self.segment_map.seen_sof {
                        return Err(JpegError::NoSegment("SOS reached without a SOF segment"));
                    }
                    self.segment_map.seen_sos = true;
                    let _len = self.stream.read_segment_length()?;
                    let scan = headers::parse_sos(&mut self.stream, &self.components)?;
                    self.pending_scan = Some(scan);
                    break;
                }
                Marker::DNL => {
                    return Err(JpegError::NotSupported("DNL (define number of lines) is not supported"));
                }
                Marker::COM | Marker::Other(_) => self.skip_segment()?,
                Marker::SOI => return Err(JpegError::BadData("unexpected second SOI marker".into())),
                Marker::EOI => return Err(JpegError::BadData("EOI reached before any SOS".into())),
                Marker::RST(_) => return Err(JpegError::BadData("unexpected restart marker outside entropy data".into())),
            }
        }

        self.init_components()?;

        let nc = self.components.len();
        let color_type = if self.options.keep_ycbcr() {
            ColorSpace::YCbCr
        } else if nc == 1 {
            ColorSpace::Luma
        } else if self.is_rgb_ids {
            ColorSpace::RGB
        } else {
            ColorSpace::RGB
        };

        let info = ImageInfo {
            size_x: u32::from(self.width),
            size_y: u32::from(self.height),
            color_type,
            depth: jimg_core::bit_depth::BitDepth::Eight,
            byte_size: usize::from(self.width) * color_type.num_components() * usize::from(self.height),
        };
        Ok(info)
    }

    fn handle_app0(&mut self) -> JpegResult<()> {
        if self.segment_map.seen_app0 || self.segment_map.seen_sof {
            if self.options.core().strict_mode() {
                return Err(JpegError::SegmentOrder("duplicate APP0 or APP0 after SOF"));
            }
            self.warnings.insert(JpegWarnings::SEGMENT_ORDER);
        }
        self.segment_map.seen_app0 = true;
        let len = self.stream.read_segment_length()?;
        let body = self.stream.read_vec(usize::from(len))?;
        headers::parse_app0(&body, &mut self.warnings);
        Ok(())
    }

    /// APP1 (Exif/XMP) and APP13 (IPTC) are recognized but their payload
    /// isn't surfaced anywhere yet; skip the body while still validating
    /// the segment length field.
    fn handle_app1_app13(&mut self, _is_app1: bool) -> JpegResult<()> {
        self.skip_segment()
    }

    fn handle_app2(&mut self) -> JpegResult<()> {
        if self.options.ignore_iccp() {
            return self.skip_segment();
        }
        let len = self.stream.read_segment_length()?;
        if usize::from(len) < 14 {
            // Too short to be an ICC chunk; treat as an unrelated APP2.
            self.stream.skip(usize::from(len))?;
            return Ok(());
        }
        let body = self.stream.read_vec(usize::from(len))?;
        if &body[0..11] != b"ICC_PROFILE" || body[11] != 0 {
            // Not an ICC_PROFILE-tagged APP2; ignore.
            return Ok(());
        }
        let seq_no = body[12];
        let total = body[13];
        headers::feed_app2_icc(&mut self.icc, seq_no, total, &body[14..], &mut self.warnings);
        if self.icc.is_complete() {
            self.icc_profile = self.icc.take();
        }
        Ok(())
    }

    fn handle_dqt(&mut self) -> JpegResult<()> {
        let len = self.stream.read_segment_length()?;
        let tables = &mut self.qt_tables;
        headers::parse_dqt(&mut self.stream, len, &mut |id, table| {
            tables[id] = Some(table);
            Ok(())
        })
    }

    fn handle_dht(&mut self) -> JpegResult<()> {
        let len = self.stream.read_segment_length()?;
        let dc_tables = &mut self.dc_tables;
        let ac_tables = &mut self.ac_tables;
        headers::parse_dht(&mut self.stream, len, &mut |spec| {
            let table = headers::build_huffman_table(&spec)?;
            if spec.kind_is_dc {
                dc_tables[spec.table_id] = Some(table);
            } else {
                ac_tables[spec.table_id] = Some(table);
            }
            Ok(())
        })
    }

    fn handle_sof(&mut self, n: u8) -> JpegResult<()> {
        if self.segment_map.seen_sos {
            return Err(JpegError::SegmentOrder("SOF segment appeared after SOS"));
        }
        let sof = match n {
            0 => SOFMarkers::BaselineDct,
            1 => SOFMarkers::ExtendedSequentialHuffman,
            2 => SOFMarkers::ProgressiveDctHuffman,
            _ => return Err(JpegError::NotSupported("only SOF0/SOF1/SOF2 are supported")),
        };
        self.segment_map.seen_sof = true;
        let _len = self.stream.read_segment_length()?;
        let frame: FrameHeader = headers::parse_sof(&mut self.stream, sof)?;
        self.width = frame.width;
        self.height = frame.height;
        self.sof = frame.sof;
        self.is_rgb_ids = frame.is_rgb_ids;
        self.progressive = frame.sof.is_progressive();
        self.components = frame.components;
        Ok(())
    }

    fn skip_segment(&mut self) -> JpegResult<()> {
        let len = self.stream.read_segment_length()?;
        self.stream.skip(usize::from(len))
    }

    /// Compute MCU grid dimensions and each component's padded/unpadded
    /// sizes once the frame header and first SOS are both known.
    fn init_components(&mut self) -> JpegResult<()> {
        if self.components.is_empty() {
            return Err(JpegError::NoSegment("no SOF segment seen before SOS"));
        }
        let h_max = self.components.iter().map(|c| c.h_sampling).max().unwrap_or(1);
        let v_max = self.components.iter().map(|c| c.v_sampling).max().unwrap_or(1);
        self.h_max = h_max;
        self.v_max = v_max;

        let mcu_px_w = usize::from(h_max) * 8;
        let mcu_px_h = usize::from(v_max) * 8;
        self.mcu_x = (usize::from(self.width) + mcu_px_w - 1) / mcu_px_w;
        self.mcu_y = (usize::from(self.height) + mcu_px_h - 1) / mcu_px_h;

        for c in self.components.iter_mut() {
            c.init_sizes(self.mcu_x, self.mcu_y, h_max, v_max);
            if c.quant_table_id > 3 || self.qt_tables[c.quant_table_id].is_none() {
                return Err(JpegError::NoQuantTable(format!(
                    "component {} references undefined quant table {}",
                    c.id, c.quant_table_id
                )));
            }
            if self.progressive {
                c.alloc_progressive();
            }
        }
        Ok(())
    }

    /// Validate the caller's output buffer length against `ImageInfo` and
    /// mark this reader ready for `decode_img`/`decode_pass`.
    pub fn set_buffers(&mut self, expected_len: usize) -> JpegResult<()> {
        if !self.state.can_decode() {
            return Err(self.abort(JpegError::BadState("set_buffers called before init_decoder")));
        }
        if expected_len != self.info.byte_size {
            return Err(self.abort(JpegError::IncorrectUse(
                "set_buffers length does not match ImageInfo::byte_size"
            )));
        }
        self.buffers_bound = true;
        Ok(())
    }

    /// Decode the entire image in one call.
    pub fn decode_img(&mut self, pixels: &mut [u8]) -> JpegResult<()> {
        if !self.buffers_bound {
            return Err(self.abort(JpegError::BadState("decode_img called before set_buffers")));
        }
        if pixels.len() != self.info.byte_size {
            return Err(self.abort(JpegError::IncorrectUse("pixel buffer length mismatch")));
        }
        self.state = ReaderState::Decoding;

        let result = if self.progressive {
            self.decode_img_progressive(pixels)
        } else {
            self.decode_img_baseline(pixels)
        };

        match result {
            Ok(()) => {
                self.state = if self.warnings.is_empty() {
                    ReaderState::Decoded
                } else {
                    ReaderState::DecodedWithWarnings
                };
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Decode one progressive pass; returns the pass number, or `0` at
    /// end of image. `update` triggers a full IDCT+writer repaint using
    /// every coefficient decoded so far.
    pub fn decode_pass(&mut self, pixels: &mut [u8], update: bool) -> JpegResult<u32> {
        if !self.buffers_bound {
            return Err(self.abort(JpegError::BadState("decode_pass called before set_buffers")));
        }
        if !self.progressive {
            return Err(self.abort(JpegError::IncorrectUse("decode_pass is only valid for progressive images")));
        }
        self.state = ReaderState::Decoding;
        match self.decode_one_pass() {
            Ok(None) => {
                self.eoi_reached = true;
                if update {
                    if let Err(e) = self.reconstruct_full_image(pixels) {
                        return Err(self.abort(e));
                    }
                }
                self.state = if self.warnings.is_empty() {
                    ReaderState::Decoded
                } else {
                    ReaderState::DecodedWithWarnings
                };
                Ok(0)
            }
            Ok(Some(n)) => {
                if update {
                    if let Err(e) = self.reconstruct_full_image(pixels) {
                        return Err(self.abort(e));
                    }
                }
                self.state = ReaderState::Ready;
                Ok(n)
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn next_scan(&mut self) -> JpegResult<Option<ScanHeader>> {
        if let Some(scan) = self.pending_scan.take() {
            return Ok(Some(scan));
        }
        loop {
            let marker = self.stream.read_marker()?;
            match marker {
                Marker::EOI => return Ok(None),
                Marker::DHT => self.handle_dht()?,
                Marker::DRI => {
                    let len = self.stream.read_segment_length()?;
                    if len != 2 {
                        return Err(JpegError::BadData("DRI segment length must be 2".into()));
                    }
                    self.restart_interval = self.stream.read_u16_be()?;
                }
                Marker::SOS => {
                    let _len = self.stream.read_segment_length()?;
                    let scan = headers::parse_sos(&mut self.stream, &self.components)?;
                    return Ok(Some(scan));
                }
                Marker::COM | Marker::APP(_) | Marker::Other(_) => self.skip_segment()?,
                other => {
                    return Err(JpegError::BadData(format!(
                        "unexpected marker {other:?} between progressive scans"
                    )));
                }
            }
        }
    }

    fn do_restart(&mut self) -> JpegResult<()> {
        entropy::handle_restart(&mut self.bits, &mut self.stream, &mut self.components)
    }

    fn decode_one_pass(&mut self) -> JpegResult<Option<u32>> {
        if self.eoi_reached {
            return Ok(None);
        }
        let scan = match self.next_scan()? {
            Some(s) => s,
            None => return Ok(None),
        };
        self.pass_count += 1;
        if self.pass_count > JPG_MAXPASSES {
            return Err(JpegError::PassLimit);
        }
        self.bits.reset();
        self.decode_progressive_scan(&scan)?;
        Ok(Some(self.pass_count))
    }

    fn decode_progressive_scan(&mut self, scan: &ScanHeader) -> JpegResult<()> {
        let restart_interval = self.restart_interval;
        let JpegReader { dc_tables, ac_tables, components, bits, stream, .. } = self;

        if scan.ss == 0 {
            for sel in &scan.components {
                components[sel.component_index].eob_run = 0;
            }
            if scan.components.len() > 1 {
                let mcu_x = self.mcu_x;
                let mcu_y = self.mcu_y;
                let mut counter = 0u32;
                for mcu_row in 0..mcu_y {
                    for mcu_col in 0..mcu_x {
                        if restart_interval > 0 && counter > 0 && counter % u32::from(restart_interval) == 0 {
                            entropy::handle_restart(bits, stream, components)?;
                        }
                        for sel in &scan.components {
                            let comp = &mut components[sel.component_index];
                            let blocks_per_row = comp.icols / 8;
                            let h_s = usize::from(comp.h_sampling);
                            let v_s = usize::from(comp.v_sampling);
                            let dc_table = dc_tables[sel.dc_table_id]
                                .as_ref()
                                .ok_or_else(|| JpegError::NoHuffmanTable(format!("dc table {} undefined", sel.dc_table_id)))?;
                            for by in 0..v_s {
                                for bx in 0..h_s {
                                    let block_row = mcu_row * v_s + by;
                                    let block_col = mcu_col * h_s + bx;
                                    let idx = block_row * blocks_per_row + block_col;
                                    if scan.ah == 0 {
                                        entropy::decode_progressive_dc_first(
                                            bits, stream, dc_table, &mut comp.dc_predictor, scan.al,
                                            &mut comp.scan_coefficients[idx]
                                        )?;
                                    } else {
                                        entropy::decode_progressive_dc_refine(
                                            bits, stream, scan.al, &mut comp.scan_coefficients[idx]
                                        )?;
                                    }
                                }
                            }
                        }
                        counter += 1;
                    }
                }
            } else {
                let sel = &scan.components[0];
                let comp = &mut components[sel.component_index];
                let blocks_w = comp.icols / 8;
                let blocks_h = comp.irows / 8;
                let dc_table = dc_tables[sel.dc_table_id]
                    .as_ref()
                    .ok_or_else(|| JpegError::NoHuffmanTable(format!("dc table {} undefined", sel.dc_table_id)))?;
                let mut counter = 0u32;
                for block_row in 0..blocks_h {
                    for block_col in 0..blocks_w {
                        if restart_interval > 0 && counter > 0 && counter % u32::from(restart_interval) == 0 {
                            comp.dc_predictor = 0;
                            bits.reset();
                            let marker = stream.read_u16_be()?;
                            if marker & 0xFFF8 != 0xFFD0 {
                                return Err(JpegError::BadData("expected restart marker".into()));
                            }
                        }
                        let idx = block_row * blocks_w + block_col;
                        if scan.ah == 0 {
                            entropy::decode_progressive_dc_first(
                                bits, stream, dc_table, &mut comp.dc_predictor, scan.al,
                                &mut comp.scan_coefficients[idx]
                            )?;
                        } else {
                            entropy::decode_progressive_dc_refine(bits, stream, scan.al, &mut comp.scan_coefficients[idx])?;
                        }
                        counter += 1;
                    }
                }
            }
        } else {
            // AC scans are always single-component, non-interleaved.
            let sel = &scan.components[0];
            let comp = &mut components[sel.component_index];
            comp.eob_run = 0;
            let blocks_w = comp.icols / 8;
            let blocks_h = comp.irows / 8;
            let ac_table = ac_tables[sel.ac_table_id]
                .as_ref()
                .ok_or_else(|| JpegError::NoHuffmanTable(format!("ac table {} undefined", sel.ac_table_id)))?;
            let mut counter = 0u32;
            for block_row in 0..blocks_h {
                for block_col in 0..blocks_w {
                    if restart_interval > 0 && counter > 0 && counter % u32::from(restart_interval) == 0 {
                        comp.eob_run = 0;
                        bits.reset();
                        let marker = stream.read_u16_be()?;
                        if marker & 0xFFF8 != 0xFFD0 {
                            return Err(JpegError::BadData("expected restart marker".into()));
                        }
                    }
                    let idx = block_row * blocks_w + block_col;
                    if scan.ah == 0 {
                        entropy::decode_progressive_ac_first(
                            bits, stream, ac_table, scan.ss, scan.se, scan.al, &mut comp.eob_run,
                            &mut comp.scan_coefficients[idx]
                        )?;
                    } else {
                        entropy::decode_progressive_ac_refine(
                            bits, stream, ac_table, scan.ss, scan.se, scan.al, &mut comp.eob_run,
                            &mut comp.scan_coefficients[idx]
                        )?;
                    }
                    counter += 1;
                }
            }
        }
        Ok(())
    }

    fn decode_img_progressive(&mut self, pixels: &mut [u8]) -> JpegResult<()> {
        while self.decode_one_pass()?.is_some() {}
        self.reconstruct_full_image(pixels)
    }

    /// IDCT, upsample, and color-convert every component's accumulated
    /// coefficients into the final pixel buffer. Used both by
    /// `decode_img` (progressive) once EOI is reached and by
    /// `decode_pass(update = true)` for an in-progress repaint.
    fn reconstruct_full_image(&mut self, pixels: &mut [u8]) -> JpegResult<()> {
        let nc = self.components.len();
        let kind = WriterKind::classify(self.info.color_type, nc > 1 && self.is_subsampled(), self.is_rgb_ids || self.options.keep_ycbcr());
        let mcu_px_w = usize::from(self.h_max) * 8;
        let mcu_px_h = usize::from(self.v_max) * 8;
        let channels = self.info.color_type.num_components();
        let stride = usize::from(self.width) * channels;

        // Per-MCU, per-component native-resolution sample buffer, IDCT'd
        // fresh from the persisted coefficient storage each repaint.
        let mut comp_blocks: Vec<Vec<i16>> = self
            .components
            .iter()
            .map(|c| vec![0i16; usize::from(c.h_sampling) * 8 * usize::from(c.v_sampling) * 8])
            .collect();

        for mcu_row in 0..self.mcu_y {
            for mcu_col in 0..self.mcu_x {
                for (ci, comp) in self.components.iter().enumerate() {
                    let h_s = usize::from(comp.h_sampling);
                    let v_s = usize::from(comp.v_sampling);
                    let native_w = h_s * 8;
                    let blocks_per_row = comp.icols / 8;
                    let qt = self.qt_tables[comp.quant_table_id]
                        .as_ref()
                        .ok_or_else(|| JpegError::NoQuantTable(format!("quant table {} undefined", comp.quant_table_id)))?;
                    for by in 0..v_s {
                        for bx in 0..h_s {
                            let block_row = mcu_row * v_s + by;
                            let block_col = mcu_col * h_s + bx;
                            let idx = block_row * blocks_per_row + block_col;
                            let zigzag = comp
                                .scan_coefficients
                                .get(idx)
                                .ok_or(JpegError::BadData("block index out of range".into()))?;
                            let mut natural = [0i16; 64];
                            for i in 0..64 {
                                natural[UN_ZIGZAG[i]] = zigzag[i];
                            }
                            idct_block(&mut natural, &qt.values);
                            for row in 0..8 {
                                let dst_row = by * 8 + row;
                                let dst_col = bx * 8;
                                comp_blocks[ci][dst_row * native_w + dst_col..dst_row * native_w + dst_col + 8]
                                    .copy_from_slice(&natural[row * 8..row * 8 + 8]);
                            }
                        }
                    }
                }

                let row_start_y = mcu_row * mcu_px_h;
                let col_start_x = mcu_col * mcu_px_w;
                let rows_here = mcu_px_h.min(usize::from(self.height).saturating_sub(row_start_y));
                let cols_here = mcu_px_w.min(usize::from(self.width).saturating_sub(col_start_x));
                if rows_here == 0 || cols_here == 0 {
                    continue;
                }
                let mut full_rows: Vec<Vec<i16>> = Vec::with_capacity(nc);
                for _ in 0..nc {
                    full_rows.push(vec![0i16; mcu_px_w]);
                }
                for row in 0..rows_here {
                    for (ci, comp) in self.components.iter().enumerate() {
                        let v_rumode = usize::from(comp.v_rumode).max(1);
                        let h_s = usize::from(comp.h_sampling) * 8;
                        let src_row = row / v_rumode;
                        let native_row = &comp_blocks[ci][src_row * h_s..src_row * h_s + h_s];
                        if comp.h_rumode <= 1 {
                            full_rows[ci][..h_s].copy_from_slice(native_row);
                        } else {
                            color::upsample_row(native_row, comp.h_rumode, &mut full_rows[ci][..mcu_px_w]);
                        }
                    }
                    let global_y = row_start_y + row;
                    let row_out = &mut pixels[global_y * stride + col_start_x * channels
                        ..global_y * stride + (col_start_x + cols_here) * channels];
                    match kind {
                        WriterKind::Gray => color::write_row(kind, &full_rows[0][..cols_here], &[], &[], row_out),
                        _ => color::write_row(
                            kind, &full_rows[0][..cols_here], &full_rows[1][..cols_here], &full_rows[2][..cols_here],
                            row_out
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    fn is_subsampled(&self) -> bool {
        self.components.iter().any(|c| c.h_sampling != self.h_max || c.v_sampling != self.v_max)
    }

    fn decode_img_baseline(&mut self, pixels: &mut [u8]) -> JpegResult<()> {
        let scan = self
            .pending_scan
            .take()
            .ok_or(JpegError::NoSegment("no SOS scan pending for baseline decode"))?;
        if scan.components.len() != self.components.len() {
            // A non-interleaved (or partially interleaved) baseline image:
            // one or more SOS segments, each covering a subset of the
            // frame's components, rather than the common single SOS that
            // lists every component. Persist each scan's coefficients
            // per-component (the same storage the progressive core uses)
            // and reconstruct the whole image once every component has
            // been scanned.
            return self.decode_img_baseline_multiscan(scan, pixels);
        }
        self.decode_img_baseline_single_scan(scan, pixels)
    }

    /// One SOS listing every frame component: decode and paint MCU by MCU
    /// without persisting coefficients, the common case for ordinary
    /// encoder output.
    fn decode_img_baseline_single_scan(&mut self, scan: ScanHeader, pixels: &mut [u8]) -> JpegResult<()> {
        let nc = self.components.len();
        let kind = WriterKind::classify(self.info.color_type, nc > 1 && self.is_subsampled(), self.is_rgb_ids || self.options.keep_ycbcr());
        let mcu_px_w = usize::from(self.h_max) * 8;
        let mcu_px_h = usize::from(self.v_max) * 8;
        let channels = self.info.color_type.num_components();
        let stride = usize::from(self.width) * channels;
        let restart_interval = self.restart_interval;

        // Per-MCU, per-component native-resolution sample buffer.
        let mut comp_blocks: Vec<Vec<i16>> = self
            .components
            .iter()
            .map(|c| vec![0i16; usize::from(c.h_sampling) * 8 * usize::from(c.v_sampling) * 8])
            .collect();

        self.bits.reset();
        let mut mcu_counter = 0u32;
        for mcu_row in 0..self.mcu_y {
            for mcu_col in 0..self.mcu_x {
                if restart_interval > 0 && mcu_counter > 0 && mcu_counter % u32::from(restart_interval) == 0 {
                    self.do_restart()?;
                }
                for (ci, sel) in scan.components.iter().enumerate() {
                    let comp = &mut self.components[sel.component_index];
                    let h_s = usize::from(comp.h_sampling);
                    let v_s = usize::from(comp.v_sampling);
                    let qt = self.qt_tables[comp.quant_table_id]
                        .as_ref()
                        .ok_or_else(|| JpegError::NoQuantTable(format!("quant table {} undefined", comp.quant_table_id)))?;
                    let dc_table = self.dc_tables[sel.dc_table_id]
                        .as_ref()
                        .ok_or_else(|| JpegError::NoHuffmanTable(format!("dc table {} undefined", sel.dc_table_id)))?;
                    let ac_table = self.ac_tables[sel.ac_table_id]
                        .as_ref()
                        .ok_or_else(|| JpegError::NoHuffmanTable(format!("ac table {} undefined", sel.ac_table_id)))?;
                    let native_w = h_s * 8;
                    for by in 0..v_s {
                        for bx in 0..h_s {
                            let mut zigzag = [0i16; 64];
                            entropy::decode_baseline_block(
                                &mut self.bits, &mut self.stream, dc_table, ac_table, &mut comp.dc_predictor,
                                &mut zigzag
                            )?;
                            let mut natural = [0i16; 64];
                            for i in 0..64 {
                                natural[UN_ZIGZAG[i]] = zigzag[i];
                            }
                            idct_block(&mut natural, &qt.values);
                            for row in 0..8 {
                                let dst_row = by * 8 + row;
                                let dst_col = bx * 8;
                                comp_blocks[ci][dst_row * native_w + dst_col..dst_row * native_w + dst_col + 8]
                                    .copy_from_slice(&natural[row * 8..row * 8 + 8]);
                            }
                        }
                    }
                }
                if self.bits.overread() {
                    self.warnings.insert(JpegWarnings::TRUNCATED);
                }

                // Upsample + color-convert + write this MCU's pixels.
                let row_start_y = mcu_row * mcu_px_h;
                let col_start_x = mcu_col * mcu_px_w;
                let rows_here = mcu_px_h.min(usize::from(self.height).saturating_sub(row_start_y));
                let cols_here = mcu_px_w.min(usize::from(self.width).saturating_sub(col_start_x));
                if rows_here == 0 || cols_here == 0 {
                    continue;
                }
                let mut full_rows: Vec<Vec<i16>> = Vec::with_capacity(nc);
                for ci in 0..nc {
                    full_rows.push(vec![0i16; mcu_px_w]);
                }
                for row in 0..rows_here {
                    for (ci, comp) in self.components.iter().enumerate() {
                        let v_rumode = usize::from(comp.v_rumode).max(1);
                        let h_s = usize::from(comp.h_sampling) * 8;
                        let src_row = row / v_rumode;
                        let native_row = &comp_blocks[ci][src_row * h_s..src_row * h_s + h_s];
                        if comp.h_rumode <= 1 {
                            full_rows[ci][..h_s].copy_from_slice(native_row);
                        } else {
                            color::upsample_row(native_row, comp.h_rumode, &mut full_rows[ci][..mcu_px_w]);
                        }
                    }
                    let global_y = row_start_y + row;
                    let row_out = &mut pixels[global_y * stride + col_start_x * channels
                        ..global_y * stride + (col_start_x + cols_here) * channels];
                    match kind {
                        WriterKind::Gray => color::write_row(kind, &full_rows[0][..cols_here], &[], &[], row_out),
                        _ => color::write_row(
                            kind, &full_rows[0][..cols_here], &full_rows[1][..cols_here], &full_rows[2][..cols_here],
                            row_out
                        ),
                    }
                }
                mcu_counter += 1;
            }
        }
        Ok(())
    }

    /// One or more SOS segments, each covering a subset of the frame's
    /// components (the common case being exactly one component per SOS).
    /// Coefficients are persisted per-component in `scan_coefficients`
    /// (the same storage the progressive core uses) and the whole image
    /// is reconstructed once every scan up to EOI has been consumed.
    fn decode_img_baseline_multiscan(&mut self, scan: ScanHeader, pixels: &mut [u8]) -> JpegResult<()> {
        for comp in self.components.iter_mut() {
            if comp.scan_coefficients.is_empty() {
                comp.alloc_progressive();
            }
        }
        let mut next = Some(scan);
        loop {
            let scan = match next.take() {
                Some(s) => s,
                None => match self.next_scan()? {
                    Some(s) => s,
                    None => break,
                },
            };
            self.decode_baseline_scan(&scan)?;
        }
        self.reconstruct_full_image(pixels)
    }

    /// Decode one baseline SOS into `scan_coefficients`, resetting the DC
    /// predictor for every component named in this scan (REDESIGN FLAG 1:
    /// each SOS starts its named components' prediction state fresh,
    /// mirroring what the progressive DC-first scan already does).
    fn decode_baseline_scan(&mut self, scan: &ScanHeader) -> JpegResult<()> {
        for sel in &scan.components {
            self.components[sel.component_index].dc_predictor = 0;
        }
        self.bits.reset();
        let restart_interval = self.restart_interval;
        let mcu_x = self.mcu_x;
        let mcu_y = self.mcu_y;
        let JpegReader { dc_tables, ac_tables, components, bits, stream, .. } = self;

        if scan.components.len() > 1 {
            let mut counter = 0u32;
            for mcu_row in 0..mcu_y {
                for mcu_col in 0..mcu_x {
                    if restart_interval > 0 && counter > 0 && counter % u32::from(restart_interval) == 0 {
                        entropy::handle_restart(bits, stream, components)?;
                    }
                    for sel in &scan.components {
                        let comp = &mut components[sel.component_index];
                        let blocks_per_row = comp.icols / 8;
                        let h_s = usize::from(comp.h_sampling);
                        let v_s = usize::from(comp.v_sampling);
                        let dc_table = dc_tables[sel.dc_table_id]
                            .as_ref()
                            .ok_or_else(|| JpegError::NoHuffmanTable(format!("dc table {} undefined", sel.dc_table_id)))?;
                        let ac_table = ac_tables[sel.ac_table_id]
                            .as_ref()
                            .ok_or_else(|| JpegError::NoHuffmanTable(format!("ac table {} undefined", sel.ac_table_id)))?;
                        for by in 0..v_s {
                            for bx in 0..h_s {
                                let block_row = mcu_row * v_s + by;
                                let block_col = mcu_col * h_s + bx;
                                let idx = block_row * blocks_per_row + block_col;
                                entropy::decode_baseline_block(
                                    bits, stream, dc_table, ac_table, &mut comp.dc_predictor,
                                    &mut comp.scan_coefficients[idx]
                                )?;
                            }
                        }
                    }
                    counter += 1;
                }
            }
        } else {
            let sel = &scan.components[0];
            let comp = &mut components[sel.component_index];
            let blocks_w = comp.icols / 8;
            let blocks_h = comp.irows / 8;
            let dc_table = dc_tables[sel.dc_table_id]
                .as_ref()
                .ok_or_else(|| JpegError::NoHuffmanTable(format!("dc table {} undefined", sel.dc_table_id)))?;
            let ac_table = ac_tables[sel.ac_table_id]
                .as_ref()
                .ok_or_else(|| JpegError::NoHuffmanTable(format!("ac table {} undefined", sel.ac_table_id)))?;
            let mut counter = 0u32;
            for block_row in 0..blocks_h {
                for block_col in 0..blocks_w {
                    if restart_interval > 0 && counter > 0 && counter % u32::from(restart_interval) == 0 {
                        comp.dc_predictor = 0;
                        bits.reset();
                        let marker = stream.read_u16_be()?;
                        if marker & 0xFFF8 != 0xFFD0 {
                            return Err(JpegError::BadData("expected restart marker".into()));
                        }
                    }
                    let idx = block_row * blocks_w + block_col;
                    entropy::decode_baseline_block(
                        bits, stream, dc_table, ac_table, &mut comp.dc_predictor, &mut comp.scan_coefficients[idx]
                    )?;
                    counter += 1;
                }
            }
        }
        Ok(())
    }
}
