//! The per-component record plus the up-sample map each
//! component needs once `init_components` has run.
use alloc::vec;
use alloc::vec::Vec;

use crate::errors::{JpegError, JpegResult};

/// A single scan/frame component (`Y`, `Cb`, `Cr`, or a lone grayscale
/// channel).
#[derive(Clone)]
pub struct Component {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_id: usize,
    pub dc_table_id: usize,
    pub ac_table_id: usize,
    /// MCU-padded dimensions (a whole number of 8x8 blocks in each
    /// dimension).
    pub irows: usize,
    pub icols: usize,
    pub dc_predictor: i32,
    /// Progressive coefficient storage: one `64`-entry block per 8x8
    /// block position, persisted across scans.
    pub scan_coefficients: Vec<[i16; 64]>,
    /// EOB run carried across blocks within one progressive AC scan.
    pub eob_run: u16,
    /// Precomputed upsample duplication width: `1` (no upsampling
    /// needed along this axis), `2`, or `4`.
    pub h_rumode: u8,
    pub v_rumode: u8,
}

impl Component {
    pub fn new(id: u8, h_sampling: u8, v_sampling: u8, quant_table_id: usize) -> JpegResult<Self> {
        if !matches!(h_sampling, 1 | 2 | 4) || !matches!(v_sampling, 1 | 2 | 4) {
            return Err(JpegError::InvalidImage(alloc::format!(
                "component {id} has sampling factor ({h_sampling},{v_sampling}), must be in {{1,2,4}}"
            )));
        }
        Ok(Component {
            id,
            h_sampling,
            v_sampling,
            quant_table_id,
            dc_table_id: 0,
            ac_table_id: 0,
            irows: 0,
            icols: 0,
            dc_predictor: 0,
            scan_coefficients: Vec::new(),
            eob_run: 0,
            h_rumode: 1,
            v_rumode: 1,
        })
    }

    /// Compute `rows`/`cols`/`irows`/`icols` and allocate progressive
    /// coefficient storage, given the frame's max sampling factors and
    /// MCU grid.
    pub fn init_sizes(&mut self, mcu_x: usize, mcu_y: usize, h_max: u8, v_max: u8) {
        self.icols = mcu_x * 8 * usize::from(self.h_sampling);
        self.irows = mcu_y * 8 * usize::from(self.v_sampling);
        self.h_rumode = h_max / self.h_sampling;
        self.v_rumode = v_max / self.v_sampling;
    }

    pub fn alloc_progressive(&mut self) {
        let blocks_w = self.icols / 8;
        let blocks_h = self.irows / 8;
        self.scan_coefficients = vec![[0i16; 64]; blocks_w * blocks_h];
    }

    pub fn blocks_per_mcu_row(&self) -> usize {
        usize::from(self.h_sampling)
    }

    pub fn blocks_per_mcu_col(&self) -> usize {
        usize::from(self.v_sampling)
    }
}

/// Subsampling ratio classification used to pick the writer variant.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SampleRatios {
    /// All components at the same (full) sampling: no up-sampling needed.
    None,
    /// At least one component is subsampled horizontally, vertically, or
    /// both.
    Subsampled,
}
