use image::GrayImage;
use katanuki_core::{Grid, PiecePosition};
use serde::{Deserialize, Serialize};

use crate::reduce::{KeepMask, DISCARD, KEEP};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Ascending row, then ascending column. Earlier pieces win contested
    /// pixels.
    #[default]
    RowMajor,
    /// Row-major order walked backwards.
    Reversed,
}

impl ScanOrder {
    pub fn positions(self, grid: &Grid) -> Vec<PiecePosition> {
        let mut positions = grid.positions();
        if self == ScanOrder::Reversed {
            positions.reverse();
        }
        positions
    }
}

/// Global record of claimed pixels. A claim is permanent.
#[derive(Clone, Debug)]
pub struct AllocationMap {
    owned: GrayImage,
    claimed: u64,
}

impl AllocationMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            owned: GrayImage::new(width, height),
            claimed: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.owned.width()
    }

    pub fn height(&self) -> u32 {
        self.owned.height()
    }

    /// Marks every kept, still-unowned pixel as owned and returns exactly
    /// those pixels as the piece's final mask.
    pub fn claim(&mut self, keep: &KeepMask) -> KeepMask {
        let (width, height) = self.owned.dimensions();
        let mut claim = KeepMask::from_pixel(width, height, DISCARD);
        if keep.dimensions() != (width, height) {
            log::warn!(
                "keep mask is {}x{} but the allocation map is {width}x{height}; nothing claimed",
                keep.width(),
                keep.height()
            );
            return claim;
        }
        for ((kept, owned), out) in keep
            .pixels()
            .zip(self.owned.pixels_mut())
            .zip(claim.pixels_mut())
        {
            if kept.0[0] > 0 && owned.0[0] == 0 {
                *owned = KEEP;
                *out = KEEP;
                self.claimed += 1;
            }
        }
        claim
    }

    pub fn claimed_pixels(&self) -> u64 {
        self.claimed
    }

    pub fn unowned_pixels(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) - self.claimed
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.owned
    }
}

#[derive(Clone, Debug)]
pub struct Allocation {
    pub position: PiecePosition,
    pub mask: KeepMask,
    pub pixels: u64,
}

/// Resolves a full set of keep masks in one sequential pass. Masks are
/// visited in `order` regardless of the order they are given in.
pub fn allocate(
    width: u32,
    height: u32,
    masks: impl IntoIterator<Item = (PiecePosition, KeepMask)>,
    order: ScanOrder,
) -> (AllocationMap, Vec<Allocation>) {
    let mut masks: Vec<_> = masks.into_iter().collect();
    masks.sort_by_key(|(position, _)| *position);
    if order == ScanOrder::Reversed {
        masks.reverse();
    }

    let mut map = AllocationMap::new(width, height);
    let allocations = masks
        .into_iter()
        .map(|(position, keep)| {
            let before = map.claimed_pixels();
            let mask = map.claim(&keep);
            Allocation {
                position,
                mask,
                pixels: map.claimed_pixels() - before,
            }
        })
        .collect();
    (map, allocations)
}
