//! The public, stateful PNG reader: chunk parsing through full image
//! reconstruction, driving the reader through its documented lifecycle
//! (mirrors `jimg-jpeg`'s `JpegReader` shape).
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use jimg_core::bit_depth::BitDepth;
use jimg_core::colorspace::ColorSpace;
use jimg_core::imageinfo::ImageInfo;
use jimg_core::input::InputSource;
use jimg_core::state::ReaderState;
use log::trace;

use crate::adam7::{self, X_SPC, Y_SPC};
use crate::enums::{FilterMethod, InterlaceMethod, PngChunkType, PngColor};
use crate::error::{PngError, PngResult, PngWarnings};
use crate::filters::{
    handle_avg, handle_avg_first, handle_paeth, handle_paeth_first, handle_sub, handle_up,
    unpack_subbyte,
};
use crate::headers::{
    self, read_chunk_body, read_chunk_head, ChunkHead, IhdrInfo, PhysInfo, TrnsInfo, PNG_SIGNATURE,
};
use crate::idat_bridge;
use crate::materialize::materialize_row;
use crate::options::{PngOptions, MAX_CHUNK_SIZE};
use crate::reader::PngByteReader;

/// The streaming PNG reader. One instance owns exactly one input source
/// `S` for its lifetime; [`PngReader::reset`] rebinds a fresh source and
/// returns the reader to [`ReaderState::NotSet`].
pub struct PngReader<S> {
    stream: PngByteReader<S>,
    options: PngOptions,
    state: ReaderState,
    error: Option<PngError>,
    warnings: PngWarnings,

    width: u32,
    height: u32,
    depth: u8,
    color: PngColor,
    interlace: InterlaceMethod,

    palette: Vec<[u8; 4]>,
    palette_len: usize,
    trns_gray: Option<[u8; 2]>,
    trns_rgb: Option<[[u8; 2]; 3]>,

    seen_ihdr: bool,
    seen_plte: bool,
    seen_trns: bool,
    seen_gama: bool,
    seen_sbit: bool,
    seen_srgb: bool,
    seen_chrm: bool,
    seen_iccp: bool,
    seen_bkgd: bool,
    seen_phys: bool,

    gamma: Option<u32>,
    sbit: Option<[u8; 4]>,
    srgb: Option<u8>,
    chrm: Option<[u32; 8]>,
    phys: Option<PhysInfo>,
    bkgd: Option<Vec<u8>>,
    icc_profile: Option<Vec<u8>>,

    info: ImageInfo,
    buffers_bound: bool,

    channels_raw: u8,
    sample_bytes: u8,
    out_channels: u8,
    depth_scale: u8,
    has_alpha_palette: bool,

    /// Fully inflated scanline bytes assembled from every IDAT chunk;
    /// consumed scanline-by-scanline by `decode_img`/`decode_pass`
    /// starting at `raw_pos`.
    raw: Vec<u8>,
    raw_pos: usize,
    /// `0` before the first pass/whole-image decode; `1..=7` mid-Adam7;
    /// for `Standard` interlacing, `1` after the single pass completes.
    pass_index: usize,
}

impl<S: InputSource> PngReader<S> {
    pub fn new(source: S, options: PngOptions) -> Self {
        PngReader {
            stream: PngByteReader::new(source),
            options,
            state: ReaderState::NotSet,
            error: None,
            warnings: PngWarnings::empty(),
            width: 0,
            height: 0,
            depth: 0,
            color: PngColor::Unknown,
            interlace: InterlaceMethod::Unknown,
            palette: Vec::new(),
            palette_len: 0,
            trns_gray: None,
            trns_rgb: None,
            seen_ihdr: false,
            seen_plte: false,
            seen_trns: false,
            seen_gama: false,
            seen_sbit: false,
            seen_srgb: false,
            seen_chrm: false,
            seen_iccp: false,
            seen_bkgd: false,
            seen_phys: false,
            gamma: None,
            sbit: None,
            srgb: None,
            chrm: None,
            phys: None,
            bkgd: None,
            icc_profile: None,
            info: ImageInfo::default(),
            buffers_bound: false,
            channels_raw: 0,
            sample_bytes: 0,
            out_channels: 0,
            depth_scale: 1,
            has_alpha_palette: false,
            raw: Vec::new(),
            raw_pos: 0,
            pass_index: 0,
        }
    }

    /// Rebind a fresh source and return to [`ReaderState::NotSet`].
    pub fn reset(&mut self, source: S) {
        *self = PngReader::new(source, self.options);
    }

    pub fn get_state(&self) -> (ReaderState, Option<PngError>, PngWarnings) {
        (self.state, self.error.clone(), self.warnings)
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    fn abort(&mut self, err: PngError) -> PngError {
        self.state = ReaderState::Aborted;
        self.error = Some(err.clone());
        err
    }

    /// Parse the signature through every chunk up to and including IEND,
    /// populating `ImageInfo` and fully inflating the IDAT stream (see
    /// `idat_bridge` for why the whole stream is assembled here rather
    /// than lazily during `decode_img`/`decode_pass`).
    pub fn init_decoder(&mut self) -> PngResult<ImageInfo> {
        if self.state != ReaderState::NotSet {
            return Err(self.abort(PngError::IncorrectUse(
                "init_decoder called outside of NotSet",
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

    fn init_decoder_inner(&mut self) -> PngResult<ImageInfo> {
        let mut sig = [0u8; 8];
        self.stream.read_exact(&mut sig)?;
        if sig != PNG_SIGNATURE {
            return Err(PngError::BadFile("missing PNG signature"));
        }

        let ihdr_head = read_chunk_head(&mut self.stream)?;
        if ihdr_head.chunk_type != PngChunkType::IHDR {
            return Err(PngError::BadFile("first chunk after signature is not IHDR"));
        }
        self.validate_length(&ihdr_head)?;
        let ihdr_body = read_chunk_body(&mut self.stream, &ihdr_head, &self.options)?;
        let ihdr: IhdrInfo = headers::parse_ihdr(&ihdr_body, &self.options)?;
        self.width = ihdr.width;
        self.height = ihdr.height;
        self.depth = ihdr.depth;
        self.color = ihdr.color;
        self.interlace = ihdr.interlace;
        self.seen_ihdr = true;

        let idat_head = loop {
            let head = read_chunk_head(&mut self.stream)?;
            self.validate_length(&head)?;
            if head.chunk_type == PngChunkType::IDAT {
                break head;
            }
            self.handle_ancillary_chunk(&head)?;
        };

        if self.color == PngColor::Palette && self.palette.is_empty() {
            return Err(PngError::MissingChunk("indexed image has no PLTE chunk"));
        }

        let (raw, final_head) = idat_bridge::assemble_and_inflate(&mut self.stream, idat_head, &self.options)?;
        if final_head.chunk_type != PngChunkType::IEND {
            return Err(PngError::ChunkOrder("expected IEND after the last IDAT chunk"));
        }
        if self.options.core().strict_mode() && self.stream.has_more()? {
            return Err(PngError::ChunkOrder("trailing data after IEND"));
        }
        self.raw = raw;

        self.finish_header_layout()
    }

    fn validate_length(&self, head: &ChunkHead) -> PngResult<()> {
        if head.length > 0x7FFF_FFFF {
            return Err(PngError::BadData("chunk length exceeds 2^31-1".into()));
        }
        Ok(())
    }

    fn handle_ancillary_chunk(&mut self, head: &ChunkHead) -> PngResult<()> {
        match head.chunk_type {
            PngChunkType::PLTE => {
                if self.seen_plte {
                    return Err(PngError::DuplicatedChunk("PLTE"));
                }
                if matches!(self.color, PngColor::Luma | PngColor::LumaA) {
                    return Err(PngError::InvalidImage(
                        "PLTE is forbidden for grayscale color types".into(),
                    ));
                }
                let body = read_chunk_body(&mut self.stream, head, &self.options)?;
                let (palette, n) = headers::parse_plte(&body, self.depth)?;
                self.palette = palette;
                self.palette_len = n;
                self.seen_plte = true;
            }
            PngChunkType::tRNS => {
                if self.seen_trns {
                    return Err(PngError::DuplicatedChunk("tRNS"));
                }
                if self.color == PngColor::Palette && !self.seen_plte {
                    return Err(PngError::ChunkOrder("tRNS for an indexed image must follow PLTE"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_trns(&body, self.color, &mut self.palette, self.palette_len)? {
                    TrnsInfo::Gray(key) => self.trns_gray = Some(key.to_be_bytes()),
                    TrnsInfo::Rgb(keys) => {
                        self.trns_rgb = Some([
                            keys[0].to_be_bytes(),
                            keys[1].to_be_bytes(),
                            keys[2].to_be_bytes(),
                        ]);
                    }
                    TrnsInfo::PaletteApplied => {}
                }
                self.seen_trns = true;
            }
            PngChunkType::bKGD => {
                if self.seen_bkgd {
                    return Err(PngError::DuplicatedChunk("bKGD"));
                }
                if self.color == PngColor::Palette && !self.seen_plte {
                    return Err(PngError::ChunkOrder("bKGD for an indexed image must follow PLTE"));
                }
                self.bkgd = Some(self.read_bounded_body(head)?);
                self.seen_bkgd = true;
            }
            PngChunkType::cHRM => {
                if self.seen_chrm {
                    return Err(PngError::DuplicatedChunk("cHRM"));
                }
                if self.color == PngColor::Palette && self.seen_plte {
                    // An indexed image's cHRM chunk must precede PLTE.
                    return Err(PngError::ChunkOrder("cHRM for an indexed image must precede PLTE"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_chrm(&body) {
                    Some(v) => self.chrm = Some(v),
                    None => self.warnings.insert(PngWarnings::BAD_CHRM),
                }
                self.seen_chrm = true;
            }
            PngChunkType::gAMA => {
                if self.seen_gama {
                    return Err(PngError::DuplicatedChunk("gAMA"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_gama(&body) {
                    Some(v) => self.gamma = Some(v),
                    None => self.warnings.insert(PngWarnings::BAD_GAMA),
                }
                self.seen_gama = true;
            }
            PngChunkType::sBit => {
                if self.seen_sbit {
                    return Err(PngError::DuplicatedChunk("sBIT"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_sbit(&body, self.color) {
                    Some(v) => self.sbit = Some(v),
                    None => self.warnings.insert(PngWarnings::BAD_SBIT),
                }
                self.seen_sbit = true;
            }
            PngChunkType::sRGB => {
                if self.seen_srgb {
                    return Err(PngError::DuplicatedChunk("sRGB"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_srgb(&body) {
                    Some(v) => self.srgb = Some(v),
                    None => self.warnings.insert(PngWarnings::BAD_SRGB),
                }
                self.seen_srgb = true;
            }
            PngChunkType::pHYs => {
                if self.seen_phys {
                    return Err(PngError::DuplicatedChunk("pHYs"));
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_phys(&body) {
                    Some(v) => self.phys = Some(v),
                    None => self.warnings.insert(PngWarnings::BAD_PHYS),
                }
                self.seen_phys = true;
            }
            PngChunkType::iCCP => {
                if self.seen_iccp {
                    return Err(PngError::DuplicatedChunk("iCCP"));
                }
                self.seen_iccp = true;
                if self.options.ignore_iccp() {
                    self.stream.skip(head.length as usize + 4)?;
                    return Ok(());
                }
                let body = self.read_bounded_body(head)?;
                match headers::parse_iccp(&body) {
                    Some(profile) => self.icc_profile = Some(profile),
                    None => self.warnings.insert(PngWarnings::BAD_ICCP),
                }
            }
            PngChunkType::IHDR => {
                return Err(PngError::DuplicatedChunk("IHDR"));
            }
            PngChunkType::IEND => {
                return Err(PngError::ChunkOrder("IEND appeared before any IDAT chunk"));
            }
            PngChunkType::eXIf
            | PngChunkType::hIST
            | PngChunkType::sPLT
            | PngChunkType::tIME
            | PngChunkType::iTXt
            | PngChunkType::tEXt
            | PngChunkType::zTxt
            | PngChunkType::fcTL
            | PngChunkType::acTL
            | PngChunkType::unkn => {
                trace!("skipping ancillary chunk {:?} ({} bytes)", head.chunk_type, head.length);
                self.stream.skip(self.bounded_len(head)? + 4)?;
            }
            PngChunkType::IDAT => unreachable!("IDAT is handled by the caller's loop"),
        }
        Ok(())
    }

    fn bounded_len(&self, head: &ChunkHead) -> PngResult<usize> {
        let len = head.length as usize;
        if len > MAX_CHUNK_SIZE {
            return Err(PngError::Limit(format!(
                "chunk exceeds MAX_CHUNK_SIZE ({len} > {MAX_CHUNK_SIZE})"
            )));
        }
        Ok(len)
    }

    fn read_bounded_body(&mut self, head: &ChunkHead) -> PngResult<Vec<u8>> {
        self.bounded_len(head)?;
        read_chunk_body(&mut self.stream, head, &self.options)
    }

    /// Derive every per-sample/per-pixel constant used by the filter and
    /// materialization stages, and build the final [`ImageInfo`].
    fn finish_header_layout(&mut self) -> PngResult<ImageInfo> {
        self.channels_raw = self.color.num_components();
        self.sample_bytes = if self.depth == 16 { 2 } else { 1 };
        self.depth_scale = match self.depth {
            1 => 255,
            2 => 85,
            4 => 17,
            _ => 1,
        };

        let (color_type, out_channels) = match self.color {
            PngColor::Palette => {
                self.has_alpha_palette = self.seen_trns;
                if self.seen_trns {
                    (ColorSpace::RGBA, 4)
                } else {
                    (ColorSpace::RGB, 3)
                }
            }
            PngColor::Luma => {
                if self.trns_gray.is_some() {
                    (ColorSpace::LumaA, 2)
                } else {
                    (ColorSpace::Luma, 1)
                }
            }
            PngColor::RGB => {
                if self.trns_rgb.is_some() {
                    (ColorSpace::RGBA, 4)
                } else {
                    (ColorSpace::RGB, 3)
                }
            }
            PngColor::LumaA => (ColorSpace::LumaA, 2),
            PngColor::RGBA => (ColorSpace::RGBA, 4),
            PngColor::Unknown => unreachable!(),
        };
        self.out_channels = out_channels;

        let depth = if self.color == PngColor::Palette || self.depth <= 8 {
            BitDepth::Eight
        } else {
            BitDepth::Sixteen
        };

        let byte_size = (self.width as usize)
            * usize::from(out_channels)
            * usize::from(self.sample_bytes)
            * (self.height as usize);

        Ok(ImageInfo {
            size_x: self.width,
            size_y: self.height,
            color_type,
            depth,
            byte_size,
        })
    }

    /// Validate the caller's output buffer length against `ImageInfo` and
    /// mark this reader ready for `decode_img`/`decode_pass`.
    pub fn set_buffers(&mut self, expected_len: usize) -> PngResult<()> {
        if !self.state.can_decode() {
            return Err(self.abort(PngError::BadState("set_buffers called before init_decoder")));
        }
        if expected_len != self.info.byte_size {
            return Err(self.abort(PngError::IncorrectUse(
                "set_buffers length does not match ImageInfo::byte_size",
            )));
        }
        self.buffers_bound = true;
        Ok(())
    }

    pub fn decode_img(&mut self, pixels: &mut [u8]) -> PngResult<()> {
        if !self.buffers_bound {
            return Err(self.abort(PngError::BadState("decode_img called before set_buffers")));
        }
        if pixels.len() != self.info.byte_size {
            return Err(self.abort(PngError::IncorrectUse("pixel buffer length mismatch")));
        }
        self.state = ReaderState::Decoding;
        let result = match self.interlace {
            InterlaceMethod::Standard => self.decode_standard(pixels),
            InterlaceMethod::Adam7 => self.decode_adam7_all(pixels),
            InterlaceMethod::Unknown => unreachable!("validated at IHDR parse time"),
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

    /// Decode one progressive step; returns the pass number, or `0` once
    /// the image is fully painted. `Standard`-interlaced images have
    /// exactly one "pass" covering the whole raster; `Adam7` images have
    /// seven.
    pub fn decode_pass(&mut self, pixels: &mut [u8]) -> PngResult<u32> {
        if !self.buffers_bound {
            return Err(self.abort(PngError::BadState("decode_pass called before set_buffers")));
        }
        if pixels.len() != self.info.byte_size {
            return Err(self.abort(PngError::IncorrectUse("pixel buffer length mismatch")));
        }
        self.state = ReaderState::Decoding;
        let result = match self.interlace {
            InterlaceMethod::Standard => self.decode_pass_standard(pixels),
            InterlaceMethod::Adam7 => self.decode_pass_adam7(pixels),
            InterlaceMethod::Unknown => unreachable!("validated at IHDR parse time"),
        };
        match result {
            Ok(0) => {
                self.state = if self.warnings.is_empty() {
                    ReaderState::Decoded
                } else {
                    ReaderState::DecodedWithWarnings
                };
                Ok(0)
            }
            Ok(n) => {
                self.state = ReaderState::Ready;
                Ok(n)
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn decode_pass_standard(&mut self, pixels: &mut [u8]) -> PngResult<u32> {
        if self.pass_index != 0 {
            return Ok(0);
        }
        self.decode_standard(pixels)?;
        self.pass_index = 1;
        Ok(0)
    }

    fn decode_standard(&mut self, pixels: &mut [u8]) -> PngResult<()> {
        let stride = self.info.stride();
        let width = self.width as usize;
        let height = self.height as usize;
        self.decode_plane_rows(width, height, pixels, stride)
    }

    fn decode_pass_adam7(&mut self, pixels: &mut [u8]) -> PngResult<u32> {
        if self.pass_index >= 7 {
            return Ok(0);
        }
        let p = self.pass_index;
        self.decode_one_adam7_pass(p, pixels)?;
        self.pass_index += 1;
        if self.pass_index >= 7 {
            Ok(0)
        } else {
            Ok((self.pass_index) as u32)
        }
    }

    fn decode_adam7_all(&mut self, pixels: &mut [u8]) -> PngResult<()> {
        for p in 0..7 {
            self.decode_one_adam7_pass(p, pixels)?;
        }
        Ok(())
    }

    fn decode_one_adam7_pass(&mut self, p: usize, pixels: &mut [u8]) -> PngResult<()> {
        let (pw, ph) = adam7::pass_dimensions(p, self.width as usize, self.height as usize);
        if pw == 0 || ph == 0 {
            return Ok(());
        }
        let bpp = usize::from(self.out_channels) * usize::from(self.sample_bytes);
        let sub_stride = pw * bpp;
        let mut sub_image = vec![0u8; sub_stride * ph];
        self.decode_plane_rows(pw, ph, &mut sub_image, sub_stride)?;

        let stride = self.info.stride();
        adam7::scatter_pass(
            p, pw, ph, self.width as usize, self.height as usize, bpp, &sub_image, pixels, stride,
        );
        Ok(())
    }

    /// Read `rows` filtered scanlines of `raw_width` samples each from
    /// `self.raw` starting at `self.raw_pos`, reverse the per-scanline
    /// filter, expand sub-byte depths, and materialize the final pixel
    /// layout into `out`.
    fn decode_plane_rows(
        &mut self, raw_width: usize, rows: usize, out: &mut [u8], out_stride: usize,
    ) -> PngResult<()> {
        let channels_raw = usize::from(self.channels_raw);
        let sample_bytes = usize::from(self.sample_bytes);
        let raw_pel_size = if self.depth < 8 { 1 } else { channels_raw * sample_bytes };
        let row_bits = raw_width * usize::from(self.depth) * channels_raw;
        let row_bytes = (row_bits + 7) / 8;

        let mut prev_row = vec![0u8; row_bytes];
        let mut current = vec![0u8; row_bytes];
        let mut unpacked = if self.depth < 8 { vec![0u8; raw_width * channels_raw] } else { Vec::new() };

        for row in 0..rows {
            if self.raw_pos + 1 + row_bytes > self.raw.len() {
                return Err(PngError::BadData("inflated stream shorter than the image requires".into()));
            }
            let filter_byte = self.raw[self.raw_pos];
            self.raw_pos += 1;
            let raw_slice = &self.raw[self.raw_pos..self.raw_pos + row_bytes];
            self.raw_pos += row_bytes;

            let filter = FilterMethod::from_int(filter_byte)
                .ok_or_else(|| PngError::BadData(format!("invalid filter byte {filter_byte}")))?;
            let is_first = row == 0;
            match filter {
                FilterMethod::None => current.copy_from_slice(raw_slice),
                FilterMethod::Sub => handle_sub(raw_slice, &mut current, raw_pel_size),
                FilterMethod::Up => {
                    if is_first {
                        current.copy_from_slice(raw_slice);
                    } else {
                        handle_up(&prev_row, raw_slice, &mut current);
                    }
                }
                FilterMethod::Average => {
                    if is_first {
                        handle_avg_first(raw_slice, &mut current, raw_pel_size);
                    } else {
                        handle_avg(&prev_row, raw_slice, &mut current, raw_pel_size);
                    }
                }
                FilterMethod::Paeth => {
                    if is_first {
                        handle_paeth_first(raw_slice, &mut current, raw_pel_size);
                    } else {
                        handle_paeth(&prev_row, raw_slice, &mut current, raw_pel_size);
                    }
                }
                FilterMethod::PaethFirst | FilterMethod::AvgFirst | FilterMethod::Unknown => {
                    unreachable!("from_int never returns these synthetic variants")
                }
            }

            let samples: &[u8] = if self.depth < 8 {
                unpack_subbyte(self.depth, &current, &mut unpacked, raw_width * channels_raw);
                &unpacked
            } else {
                &current
            };

            let out_row_bytes = raw_width * usize::from(self.out_channels) * sample_bytes;
            let out_row = &mut out[row * out_stride..row * out_stride + out_row_bytes];
            materialize_row(
                self.color,
                samples,
                sample_bytes,
                raw_width,
                &self.palette,
                self.has_alpha_palette,
                self.depth_scale,
                self.trns_gray,
                self.trns_rgb,
                out_row,
            );

            core::mem::swap(&mut prev_row, &mut current);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use jimg_core::input::SliceSource;
    use jimg_core::options::DecoderOptions;

    use super::*;

    fn zlib_stored(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0x78, 0x01];
        out.push(0x01);
        let len = data.len() as u16;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(data);
        let adler = adler32(data);
        out.extend_from_slice(&adler.to_be_bytes());
        out
    }

    fn adler32(data: &[u8]) -> u32 {
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
        buf.extend_from_slice(&crate::crc::crc32(&crc_input).to_be_bytes());
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

    /// 1x1 8-bit grayscale PNG, no filter, raw byte 0x7F.
    #[test]
    fn e1_1x1_gray_8bit() {
        let mut wire = PNG_SIGNATURE.to_vec();
        push_chunk(&mut wire, b"IHDR", &ihdr_body(1, 1, 8, 0, 0));
        let raw_scanline = [0u8, 0x7F]; // filter=None, one gray sample
        let zlib = zlib_stored(&raw_scanline);
        push_chunk(&mut wire, b"IDAT", &zlib);
        push_chunk(&mut wire, b"IEND", &[]);

        let mut reader = PngReader::new(SliceSource::new(&wire), PngOptions::new(DecoderOptions::default()));
        let info = reader.init_decoder().unwrap();
        assert_eq!(info.size_x, 1);
        assert_eq!(info.size_y, 1);
        assert_eq!(info.color_type, ColorSpace::Luma);
        assert_eq!(info.byte_size, 1);

        reader.set_buffers(info.byte_size).unwrap();
        let mut pixels = [0u8; 1];
        reader.decode_img(&mut pixels).unwrap();
        assert_eq!(pixels, [0x7F]);
    }

    /// 2x2 RGB-via-tRNS PNG; resulting alphas are [0,FF,FF,0].
    #[test]
    fn e2_rgb_trns_key() {
        let mut wire = PNG_SIGNATURE.to_vec();
        push_chunk(&mut wire, b"IHDR", &ihdr_body(2, 2, 8, 2, 0));
        push_chunk(&mut wire, b"tRNS", &[0, 10, 0, 20, 0, 30]);

        let mut raw = Vec::new();
        raw.push(0); // filter None
        raw.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        raw.push(0); // filter None
        raw.extend_from_slice(&[70, 80, 90, 10, 20, 30]);
        let zlib = zlib_stored(&raw);
        push_chunk(&mut wire, b"IDAT", &zlib);
        push_chunk(&mut wire, b"IEND", &[]);

        let mut reader = PngReader::new(SliceSource::new(&wire), PngOptions::new(DecoderOptions::default()));
        let info = reader.init_decoder().unwrap();
        assert_eq!(info.color_type, ColorSpace::RGBA);

        reader.set_buffers(info.byte_size).unwrap();
        let mut pixels = vec![0u8; info.byte_size];
        reader.decode_img(&mut pixels).unwrap();
        let alphas: Vec<u8> = pixels.chunks(4).map(|p| p[3]).collect();
        assert_eq!(alphas, [0x00, 0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn rejects_bad_signature() {
        let wire = [0u8; 8];
        let mut reader = PngReader::new(SliceSource::new(&wire), PngOptions::new(DecoderOptions::default()));
        assert!(reader.init_decoder().is_err());
    }

    #[test]
    fn indexed_image_without_plte_is_missing_chunk() {
        let mut wire = PNG_SIGNATURE.to_vec();
        push_chunk(&mut wire, b"IHDR", &ihdr_body(1, 1, 8, 3, 0));
        push_chunk(&mut wire, b"IDAT", &zlib_stored(&[0, 0]));
        push_chunk(&mut wire, b"IEND", &[]);
        let mut reader = PngReader::new(SliceSource::new(&wire), PngOptions::new(DecoderOptions::default()));
        assert_eq!(reader.init_decoder(), Err(PngError::MissingChunk("indexed image has no PLTE chunk")));
    }
}
