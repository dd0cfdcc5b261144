use image::{imageops, RgbaImage};
use katanuki_core::PiecePosition;
use serde::{Deserialize, Serialize};

use crate::reduce::KeepMask;

/// Pixel rectangle in source-image coordinates; `right` and `bottom` are
/// exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn padded(&self, padding: u32, width: u32, height: u32) -> Self {
        Self {
            left: self.left.saturating_sub(padding),
            top: self.top.saturating_sub(padding),
            right: self.right.saturating_add(padding).min(width),
            bottom: self.bottom.saturating_add(padding).min(height),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PieceImage {
    pub position: PiecePosition,
    pub bbox: BoundingBox,
    pub image: RgbaImage,
}

/// Copies source pixels where the mask is set; everything else is
/// transparent.
pub fn apply_mask(source: &RgbaImage, mask: &KeepMask) -> RgbaImage {
    RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        let inside = x < mask.width() && y < mask.height() && mask.get_pixel(x, y).0[0] > 0;
        if inside {
            *source.get_pixel(x, y)
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    })
}

/// Bounds of all pixels with nonzero alpha.
pub fn alpha_bounds(image: &RgbaImage) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        let bbox = bounds.get_or_insert(BoundingBox {
            left: x,
            top: y,
            right: x + 1,
            bottom: y + 1,
        });
        bbox.left = bbox.left.min(x);
        bbox.top = bbox.top.min(y);
        bbox.right = bbox.right.max(x + 1);
        bbox.bottom = bbox.bottom.max(y + 1);
    }
    bounds
}

/// Masks, crops and pads one piece. `None` when nothing is visible.
pub fn assemble_piece(
    source: &RgbaImage,
    position: PiecePosition,
    mask: &KeepMask,
    padding: u32,
) -> Option<PieceImage> {
    let masked = apply_mask(source, mask);
    let bbox = alpha_bounds(&masked)?.padded(padding, source.width(), source.height());
    let image = imageops::crop_imm(&masked, bbox.left, bbox.top, bbox.width(), bbox.height())
        .to_image();
    Some(PieceImage {
        position,
        bbox,
        image,
    })
}

/// Explicit dimensions win; a missing one is the largest piece extent.
pub fn resolve_output_size(
    pieces: &[PieceImage],
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let widest = pieces.iter().map(|piece| piece.image.width()).max().unwrap_or(0);
    let tallest = pieces.iter().map(|piece| piece.image.height()).max().unwrap_or(0);
    (width.unwrap_or(widest), height.unwrap_or(tallest))
}

/// Pastes `image` at the floor-halved offset on a transparent canvas.
/// Oversized pieces are clipped.
pub fn center_on_canvas(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    let x = (i64::from(width) - i64::from(image.width())).div_euclid(2);
    let y = (i64::from(height) - i64::from(image.height())).div_euclid(2);
    imageops::replace(&mut canvas, image, x, y);
    canvas
}
