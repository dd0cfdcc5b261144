use std::fmt::Write;

use image::GrayImage;
use resvg::tiny_skia;

use crate::PipelineError;

/// Luma at or below this value counts as part of a cut line.
pub const CUT_THRESHOLD: u8 = 128;

/// Binary bitmap of one rasterized cut, same size as the source image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutRaster {
    width: u32,
    height: u32,
    cut: Vec<bool>,
}

impl CutRaster {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cut: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut is_cut: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cut = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cut.push(is_cut(x, y));
            }
        }
        Self { width, height, cut }
    }

    pub fn from_luma(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            cut: image.pixels().map(|pixel| pixel.0[0] <= CUT_THRESHOLD).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-bounds coordinates are never cut.
    pub fn is_cut(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cut[y as usize * self.width as usize + x as usize]
    }

    pub fn cut_pixels(&self) -> usize {
        self.cut.iter().filter(|cut| **cut).count()
    }
}

pub trait CutRasterizer {
    /// Renders `path_data`, given in canvas units, into a `width` x `height`
    /// bitmap spanning the whole canvas.
    fn rasterize(
        &self,
        path_data: &str,
        canvas: (f64, f64),
        width: u32,
        height: u32,
    ) -> Result<CutRaster, PipelineError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResvgRasterizer {
    /// Stroke width in canvas units.
    pub stroke_width: f32,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self { stroke_width: 1.0 }
    }
}

impl ResvgRasterizer {
    fn cut_svg(&self, path_data: &str, canvas: (f64, f64)) -> String {
        let (width, height) = canvas;
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = write!(
            svg,
            r#"<rect x="0" y="0" width="{width}" height="{height}" fill="white"/>"#
        );
        let _ = write!(
            svg,
            r#"<path fill="none" stroke="black" stroke-width="{}" d="{path_data}"/>"#,
            self.stroke_width
        );
        svg.push_str("</svg>");
        svg
    }
}

impl CutRasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        path_data: &str,
        canvas: (f64, f64),
        width: u32,
        height: u32,
    ) -> Result<CutRaster, PipelineError> {
        if !(canvas.0 > 0.0 && canvas.1 > 0.0) {
            return Err(PipelineError::Rasterize(format!(
                "canvas {}x{} is empty",
                canvas.0, canvas.1
            )));
        }
        let svg = self.cut_svg(path_data, canvas);
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|err| PipelineError::Rasterize(format!("cut svg parse error: {err}")))?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            PipelineError::Rasterize(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // The background is opaque, so premultiplied and straight RGB agree.
        let luma = pixmap
            .data()
            .chunks_exact(4)
            .map(|rgba| {
                let weighted = 299 * u32::from(rgba[0])
                    + 587 * u32::from(rgba[1])
                    + 114 * u32::from(rgba[2]);
                (weighted / 1000) as u8
            })
            .collect::<Vec<_>>();
        let image = GrayImage::from_raw(width, height, luma)
            .ok_or_else(|| PipelineError::Rasterize("pixmap size mismatch".to_string()))?;
        let raster = CutRaster::from_luma(&image);
        log::trace!("rasterized cut with {} cut pixels", raster.cut_pixels());
        Ok(raster)
    }
}
