use image::{GrayImage, Luma};
use katanuki_core::{Grid, PiecePosition};

use crate::raster::CutRaster;

pub const BORDER_MARGIN_PX: u32 = 5;
pub const KEEP: Luma<u8> = Luma([255]);
pub const DISCARD: Luma<u8> = Luma([0]);

/// 255 where a pixel tentatively belongs to the piece, 0 elsewhere.
pub type KeepMask = GrayImage;

/// Which side of the piece a cut lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CutDirection {
    Above,
    Below,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderStrategy {
    /// Crossing detection on the top edge, a fixed band discarded on the
    /// other three outer edges.
    Margin { band: u32 },
    /// Crossing detection on every outer edge.
    Crossing,
}

impl Default for BorderStrategy {
    fn default() -> Self {
        BorderStrategy::Margin {
            band: BORDER_MARGIN_PX,
        }
    }
}

/// First cut crossing along every scan line of a raster, seen from one side.
/// Columns for `Above`/`Below`, rows for `Left`/`Right`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutProfile {
    direction: CutDirection,
    crossings: Vec<Option<u32>>,
}

impl CutProfile {
    pub fn scan(raster: &CutRaster, direction: CutDirection) -> Self {
        let (width, height) = (raster.width(), raster.height());
        let crossings = match direction {
            CutDirection::Above => (0..width)
                .map(|x| (0..height).find(|&y| raster.is_cut(x, y)))
                .collect(),
            CutDirection::Below => (0..width)
                .map(|x| (0..height).rev().find(|&y| raster.is_cut(x, y)))
                .collect(),
            CutDirection::Left => (0..height)
                .map(|y| (0..width).find(|&x| raster.is_cut(x, y)))
                .collect(),
            CutDirection::Right => (0..height)
                .map(|y| (0..width).rev().find(|&x| raster.is_cut(x, y)))
                .collect(),
        };
        Self {
            direction,
            crossings,
        }
    }

    pub fn direction(&self) -> CutDirection {
        self.direction
    }

    pub fn crossing(&self, line: u32) -> Option<u32> {
        self.crossings.get(line as usize).copied().flatten()
    }

    /// Zeroes the side of every crossed scan line that lies beyond the cut.
    /// Lines without a crossing are left untouched.
    pub fn apply(&self, mask: &mut KeepMask) {
        let (width, height) = mask.dimensions();
        match self.direction {
            CutDirection::Above => {
                for x in 0..width {
                    if let Some(y0) = self.crossing(x) {
                        clear_column(mask, x, 0..y0.min(height));
                    }
                }
            }
            CutDirection::Below => {
                for x in 0..width {
                    if let Some(y0) = self.crossing(x) {
                        clear_column(mask, x, y0.min(height)..height);
                    }
                }
            }
            CutDirection::Left => {
                for y in 0..height {
                    if let Some(x0) = self.crossing(y) {
                        clear_row(mask, y, 0..x0.min(width));
                    }
                }
            }
            CutDirection::Right => {
                for y in 0..height {
                    if let Some(x0) = self.crossing(y) {
                        clear_row(mask, y, x0.min(width)..width);
                    }
                }
            }
        }
    }
}

/// Outer-edge profiles of the border raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorderProfiles {
    pub top: CutProfile,
    pub bottom: CutProfile,
    pub left: CutProfile,
    pub right: CutProfile,
}

impl BorderProfiles {
    pub fn scan(raster: &CutRaster) -> Self {
        Self {
            top: CutProfile::scan(raster, CutDirection::Above),
            bottom: CutProfile::scan(raster, CutDirection::Below),
            left: CutProfile::scan(raster, CutDirection::Left),
            right: CutProfile::scan(raster, CutDirection::Right),
        }
    }
}

/// Cuts surrounding one piece; `None` where the piece has no neighbour or
/// does not touch the border.
#[derive(Clone, Copy, Debug, Default)]
pub struct PieceCuts<'a> {
    pub above: Option<&'a CutProfile>,
    pub below: Option<&'a CutProfile>,
    pub left: Option<&'a CutProfile>,
    pub right: Option<&'a CutProfile>,
    pub border: Option<&'a BorderProfiles>,
}

pub fn reduce_keep_mask(
    grid: &Grid,
    position: PiecePosition,
    cuts: &PieceCuts<'_>,
    width: u32,
    height: u32,
    strategy: BorderStrategy,
) -> KeepMask {
    let mut mask = KeepMask::from_pixel(width, height, KEEP);
    for profile in [cuts.above, cuts.below, cuts.left, cuts.right]
        .into_iter()
        .flatten()
    {
        profile.apply(&mut mask);
    }

    let on_top = position.row == 0;
    let on_bottom = position.row + 1 == grid.rows;
    let on_left = position.col == 0;
    let on_right = position.col + 1 == grid.cols;
    match strategy {
        BorderStrategy::Margin { band } => {
            if on_top {
                if let Some(border) = cuts.border {
                    border.top.apply(&mut mask);
                }
            }
            let band_w = band.min(width);
            let band_h = band.min(height);
            if on_bottom {
                for x in 0..width {
                    clear_column(&mut mask, x, height - band_h..height);
                }
            }
            if on_left {
                for y in 0..height {
                    clear_row(&mut mask, y, 0..band_w);
                }
            }
            if on_right {
                for y in 0..height {
                    clear_row(&mut mask, y, width - band_w..width);
                }
            }
        }
        BorderStrategy::Crossing => {
            if let Some(border) = cuts.border {
                let sides = [
                    (on_top, &border.top),
                    (on_bottom, &border.bottom),
                    (on_left, &border.left),
                    (on_right, &border.right),
                ];
                for (_, profile) in sides.into_iter().filter(|(touches, _)| *touches) {
                    profile.apply(&mut mask);
                }
            }
        }
    }
    mask
}

pub fn kept_pixels(mask: &KeepMask) -> u64 {
    mask.pixels().filter(|pixel| pixel.0[0] > 0).count() as u64
}

fn clear_column(mask: &mut KeepMask, x: u32, rows: std::ops::Range<u32>) {
    for y in rows {
        mask.put_pixel(x, y, DISCARD);
    }
}

fn clear_row(mask: &mut KeepMask, y: u32, cols: std::ops::Range<u32>) {
    for x in cols {
        mask.put_pixel(x, y, DISCARD);
    }
}
