use std::path::Path;

use image::RgbaImage;
use img_parts::{Bytes, ImageEXIF};

use crate::PipelineError;

const EXIF_ORIENTATION_TAG: u16 = 0x0112;
const EXIF_TYPE_SHORT: u16 = 3;

pub fn load_source(path: &Path) -> Result<RgbaImage, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::Source {
        path: path.to_path_buf(),
        source,
    })?;
    decode_source(&bytes)
}

/// Decodes any supported raster format to RGBA8, upright per its EXIF
/// orientation.
pub fn decode_source(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    let orientation = extract_exif_orientation(bytes);
    let image =
        image::load_from_memory(bytes).map_err(|err| PipelineError::Decode(err.to_string()))?;
    let rgba = apply_exif_orientation(image.to_rgba8(), orientation);
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(PipelineError::Dimensions);
    }
    if let Some(orientation) = orientation.filter(|value| *value != 1) {
        log::debug!("applied exif orientation {orientation}");
    }
    Ok(rgba)
}

pub fn extract_exif_orientation(bytes: &[u8]) -> Option<u16> {
    let data = Bytes::copy_from_slice(bytes);
    let exif = img_parts::jpeg::Jpeg::from_bytes(data.clone())
        .ok()
        .and_then(|jpeg| jpeg.exif())
        .or_else(|| {
            img_parts::png::Png::from_bytes(data.clone())
                .ok()
                .and_then(|png| png.exif())
        })
        .or_else(|| {
            img_parts::webp::WebP::from_bytes(data)
                .ok()
                .and_then(|webp| webp.exif())
        })?;
    parse_exif_orientation(&exif)
}

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16_at(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// Reads the orientation entry of IFD0 from a TIFF-structured EXIF block.
pub(crate) fn parse_exif_orientation(exif: &[u8]) -> Option<u16> {
    let data = exif.strip_prefix(b"Exif\0\0").unwrap_or(exif);
    let order = match data.get(..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if order.u16_at(data, 2)? != 42 {
        return None;
    }
    let ifd = order.u32_at(data, 4)? as usize;
    let entries = order.u16_at(data, ifd)? as usize;
    (0..entries)
        .map(|index| ifd + 2 + index * 12)
        .find(|entry| order.u16_at(data, *entry) == Some(EXIF_ORIENTATION_TAG))
        .and_then(|entry| {
            if order.u16_at(data, entry + 2)? != EXIF_TYPE_SHORT {
                return None;
            }
            order.u16_at(data, entry + 8)
        })
        .filter(|value| (1..=8).contains(value))
}

fn apply_exif_orientation(image: RgbaImage, orientation: Option<u16>) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate180, rotate270, rotate90};
    match orientation {
        Some(2) => flip_horizontal(&image),
        Some(3) => rotate180(&image),
        Some(4) => flip_vertical(&image),
        Some(5) => rotate270(&flip_horizontal(&image)),
        Some(6) => rotate90(&image),
        Some(7) => rotate90(&flip_horizontal(&image)),
        Some(8) => rotate270(&image),
        _ => image,
    }
}
