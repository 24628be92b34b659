//! The Adam7 interlace pass driver.
//!
//! Two distinct tables are involved. `X_ORIG`/`Y_ORIG`/`X_SPC`/`Y_SPC`
//! size each pass's sub-image (how many samples pass `p` contains) and
//! place each decoded sample at its grid coordinate. `PASS_WIDTH`/
//! `PASS_HEIGHT` size the replication rectangle used to paint a
//! progressive-display preview from that single sample. The two tables
//! coincide for pass 1 (the coarsest) and diverge afterwards: by pass 6,
//! for example, a decoded sample only needs to fill a 1x2 block since
//! half the rows it used to cover were already painted by pass 5.
pub const X_ORIG: [usize; 7] = [0, 4, 0, 2, 0, 1, 0];
pub const Y_ORIG: [usize; 7] = [0, 0, 4, 0, 2, 0, 1];
pub const X_SPC: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];
pub const Y_SPC: [usize; 7] = [8, 8, 8, 4, 4, 2, 2];
pub const PASS_WIDTH: [usize; 7] = [8, 4, 4, 2, 2, 1, 1];
pub const PASS_HEIGHT: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];

/// Dimensions of pass `p`'s sub-image over a full image of `width` x
/// `height`. Either coordinate can be `0`, meaning the pass is skipped.
pub fn pass_dimensions(p: usize, width: usize, height: usize) -> (usize, usize) {
    let x = width.saturating_sub(X_ORIG[p]).saturating_add(X_SPC[p]).saturating_sub(1) / X_SPC[p];
    let y = height.saturating_sub(Y_ORIG[p]).saturating_add(Y_SPC[p]).saturating_sub(1) / Y_SPC[p];
    (x, y)
}

/// Scatter one fully materialized pass sub-image into the final pixel
/// buffer, replicating each sample into its `PASS_WIDTH x PASS_HEIGHT`
/// block (clamped at the image edge). Running this for every pass in
/// order 1..=7 leaves every final pixel holding the exact value its own
/// owning pass decoded: later passes always have a finer grid and are
/// processed after coarser ones, so a pixel's last write is always from
/// its assigned pass.
#[allow(clippy::too_many_arguments)]
pub fn scatter_pass(
    p: usize, sub_width: usize, sub_height: usize, full_width: usize, full_height: usize, bpp: usize,
    sub_image: &[u8], out: &mut [u8], out_stride: usize,
) {
    for j in 0..sub_height {
        let base_y = j * Y_SPC[p] + Y_ORIG[p];
        if base_y >= full_height {
            continue;
        }
        let fill_h = PASS_HEIGHT[p].min(full_height - base_y);
        for i in 0..sub_width {
            let base_x = i * X_SPC[p] + X_ORIG[p];
            if base_x >= full_width {
                continue;
            }
            let fill_w = PASS_WIDTH[p].min(full_width - base_x);
            let sample = &sub_image[(j * sub_width + i) * bpp..(j * sub_width + i) * bpp + bpp];
            for dy in 0..fill_h {
                let row_start = (base_y + dy) * out_stride + base_x * bpp;
                for dx in 0..fill_w {
                    let px_start = row_start + dx * bpp;
                    out[px_start..px_start + bpp].copy_from_slice(sample);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_dimensions_4x4() {
        // A 4x4 image: pass 1 (index 0) decodes the single (0,0) sample;
        // pass 2 (index 1) has origin x=4, entirely outside a 4-wide
        // image, so it contributes nothing; pass 5 (index 4) decodes 1
        // scanline of length 2; pass 7 (index 6) decodes 2 scanlines of
        // length 4.
        assert_eq!(pass_dimensions(0, 4, 4), (1, 1));
        assert_eq!(pass_dimensions(1, 4, 4), (0, 1));
        assert_eq!(pass_dimensions(4, 4, 4), (2, 1));
        assert_eq!(pass_dimensions(6, 4, 4), (4, 2));
    }

    #[test]
    fn pass_dimensions_skips_when_too_small() {
        assert_eq!(pass_dimensions(6, 1, 1), (1, 0));
    }

    #[test]
    fn scatter_single_pixel_pass7_exact_placement() {
        let sub = [9u8];
        let mut out = [0u8; 4];
        scatter_pass(6, 1, 1, 2, 2, 1, &sub, &mut out, 2);
        assert_eq!(out, [0, 0, 9, 0]);
    }
}
