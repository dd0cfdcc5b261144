use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{ImageFormat, RgbImage, RgbaImage};
use katanuki_core::{infer_grid_from_svg, Grid, PathDocument, PathRole, PiecePosition};
use serde::{Deserialize, Serialize};

use crate::allocate::{AllocationMap, ScanOrder};
use crate::assemble::{assemble_piece, center_on_canvas, resolve_output_size, BoundingBox, PieceImage};
use crate::raster::CutRasterizer;
use crate::reduce::{
    kept_pixels, reduce_keep_mask, BorderProfiles, BorderStrategy, CutDirection, CutProfile,
    PieceCuts,
};
use crate::source::load_source;
use crate::PipelineError;

pub const DEBUG_DIR: &str = "debug";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractConfig {
    pub output_dir: PathBuf,
    pub prefix: String,
    /// File extension of the written pieces; also selects the encoder.
    pub format: String,
    pub padding: u32,
    pub fixed_size: bool,
    pub output_width: Option<u32>,
    pub output_height: Option<u32>,
    pub debug: bool,
    pub border: BorderStrategy,
    pub scan_order: ScanOrder,
    pub write_manifest: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pieces"),
            prefix: "piece".to_string(),
            format: "png".to_string(),
            padding: 30,
            fixed_size: false,
            output_width: None,
            output_height: None,
            debug: false,
            border: BorderStrategy::default(),
            scan_order: ScanOrder::default(),
            write_manifest: true,
        }
    }
}

impl ExtractConfig {
    pub fn piece_file_name(&self, position: PiecePosition) -> String {
        format!(
            "{}_{:02}_{:02}.{}",
            self.prefix, position.row, position.col, self.format
        )
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.output_dir.join(DEBUG_DIR)
    }

    fn image_format(&self) -> Result<ImageFormat, PipelineError> {
        ImageFormat::from_extension(&self.format).ok_or_else(|| PipelineError::Encode {
            path: self.output_dir.clone(),
            message: format!("unsupported output format {:?}", self.format),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub row: u32,
    pub col: u32,
    pub file: String,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub grid: Grid,
    pub image_width: u32,
    pub image_height: u32,
    pub unowned_pixels: u64,
    pub output_size: Option<(u32, u32)>,
    pub pieces: Vec<PieceRecord>,
}

/// In-memory result of one extraction, before anything is written.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub grid: Grid,
    pub pieces: Vec<PieceImage>,
    pub allocation: AllocationMap,
    /// Pieces whose surrounding cuts could not be rasterized.
    pub skipped: Vec<PiecePosition>,
    /// Pieces left with no claimable pixels.
    pub empty: Vec<PiecePosition>,
}

#[derive(Clone, Debug)]
pub struct ExtractionReport {
    pub manifest: Manifest,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PiecePosition>,
    pub empty: Vec<PiecePosition>,
}

/// Both sides of one interior cut.
struct DividerProfiles {
    /// Seen from the piece above or left of the cut.
    before: CutProfile,
    /// Seen from the piece below or right of the cut.
    after: CutProfile,
}

struct CutProfiles {
    horizontal: Vec<Option<DividerProfiles>>,
    vertical: Vec<Option<DividerProfiles>>,
    border: Option<BorderProfiles>,
}

impl CutProfiles {
    fn divider(
        dividers: &[Option<DividerProfiles>],
        index: u32,
        direction: CutDirection,
    ) -> Result<&DividerProfiles, CutDirection> {
        dividers
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(direction)
    }

    /// Fails with the side whose cut is unavailable.
    fn piece_cuts(
        &self,
        grid: &Grid,
        position: PiecePosition,
    ) -> Result<PieceCuts<'_>, CutDirection> {
        let PiecePosition { row, col } = position;
        let mut cuts = PieceCuts::default();
        if row > 0 {
            let divider = Self::divider(&self.horizontal, row - 1, CutDirection::Above)?;
            cuts.above = Some(&divider.after);
        }
        if row + 1 < grid.rows {
            let divider = Self::divider(&self.horizontal, row, CutDirection::Below)?;
            cuts.below = Some(&divider.before);
        }
        if col > 0 {
            let divider = Self::divider(&self.vertical, col - 1, CutDirection::Left)?;
            cuts.left = Some(&divider.after);
        }
        if col + 1 < grid.cols {
            let divider = Self::divider(&self.vertical, col, CutDirection::Right)?;
            cuts.right = Some(&divider.before);
        }
        if grid.is_border(position) {
            cuts.border = self.border.as_ref();
        }
        Ok(cuts)
    }
}

pub struct Extractor<R> {
    config: ExtractConfig,
    rasterizer: R,
}

impl<R: CutRasterizer> Extractor<R> {
    pub fn new(config: ExtractConfig, rasterizer: R) -> Self {
        Self { config, rasterizer }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Loads both inputs, extracts every piece and writes the results.
    pub fn run(
        &self,
        image_path: &Path,
        svg_path: &Path,
    ) -> Result<ExtractionReport, PipelineError> {
        self.config.image_format()?;
        let source = load_source(image_path)?;
        let svg = fs::read_to_string(svg_path).map_err(|source| PipelineError::Io {
            path: svg_path.to_path_buf(),
            source,
        })?;
        let (document, grid) = infer_grid_from_svg(&svg);
        log::info!(
            "detected {}x{} grid ({:?}), canvas {}x{}, image {}x{}",
            grid.cols,
            grid.rows,
            grid.source,
            grid.width,
            grid.height,
            source.width(),
            source.height()
        );
        let extraction = self.extract(&source, &document, &grid)?;
        self.write(&extraction)
    }

    /// Cuts `source` into pieces. Only debug masks touch the filesystem.
    pub fn extract(
        &self,
        source: &RgbaImage,
        document: &PathDocument,
        grid: &Grid,
    ) -> Result<Extraction, PipelineError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Dimensions);
        }
        let debug_dir = self.config.debug_dir();
        if self.config.debug {
            create_dir(&debug_dir)?;
        }

        let profiles = self.profile_cuts(document, grid, width, height);
        let mut allocation = AllocationMap::new(width, height);
        let mut pieces = Vec::with_capacity(grid.piece_count());
        let mut skipped = Vec::new();
        let mut empty = Vec::new();

        for position in self.config.scan_order.positions(grid) {
            let cuts = match profiles.piece_cuts(grid, position) {
                Ok(cuts) => cuts,
                Err(side) => {
                    log::warn!(
                        "skipping piece ({}, {}): no {side:?} cut available",
                        position.row,
                        position.col
                    );
                    skipped.push(position);
                    continue;
                }
            };
            let keep = reduce_keep_mask(grid, position, &cuts, width, height, self.config.border);
            let mask = allocation.claim(&keep);
            log::trace!(
                "piece ({}, {}) keeps {} pixels, claims {}",
                position.row,
                position.col,
                kept_pixels(&keep),
                kept_pixels(&mask)
            );
            if self.config.debug {
                let name = format!("piece_mask_{}_{}.png", position.row, position.col);
                save_image(&mask, &debug_dir.join(name), ImageFormat::Png)?;
            }
            match assemble_piece(source, position, &mask, self.config.padding) {
                Some(piece) => {
                    log::debug!(
                        "piece ({}, {}) spans {}x{}",
                        position.row,
                        position.col,
                        piece.bbox.width(),
                        piece.bbox.height()
                    );
                    pieces.push(piece);
                }
                None => {
                    log::debug!("piece ({}, {}) claimed no pixels", position.row, position.col);
                    empty.push(position);
                }
            }
        }
        pieces.sort_by_key(|piece| piece.position);

        if allocation.unowned_pixels() > 0 {
            log::info!("{} pixels belong to no piece", allocation.unowned_pixels());
        }
        if self.config.debug {
            save_image(
                allocation.as_image(),
                &debug_dir.join("allocation_map.png"),
                ImageFormat::Png,
            )?;
        }
        Ok(Extraction {
            grid: *grid,
            pieces,
            allocation,
            skipped,
            empty,
        })
    }

    pub fn write(&self, extraction: &Extraction) -> Result<ExtractionReport, PipelineError> {
        let format = self.config.image_format()?;
        create_dir(&self.config.output_dir)?;

        let output_size = self.config.fixed_size.then(|| {
            resolve_output_size(
                &extraction.pieces,
                self.config.output_width,
                self.config.output_height,
            )
        });
        if let Some((width, height)) = output_size {
            log::info!("using fixed output dimensions {width}x{height}");
        }

        let mut records = Vec::with_capacity(extraction.pieces.len());
        let mut written = Vec::with_capacity(extraction.pieces.len());
        for piece in &extraction.pieces {
            let file = self.config.piece_file_name(piece.position);
            let path = self.config.output_dir.join(&file);
            let image = match output_size {
                Some((width, height)) => Cow::Owned(center_on_canvas(&piece.image, width, height)),
                None => Cow::Borrowed(&piece.image),
            };
            save_piece(&image, &path, format)?;
            records.push(PieceRecord {
                row: piece.position.row,
                col: piece.position.col,
                file,
                bbox: piece.bbox,
                width: image.width(),
                height: image.height(),
            });
            written.push(path);
        }

        let manifest = Manifest {
            grid: extraction.grid,
            image_width: extraction.allocation.width(),
            image_height: extraction.allocation.height(),
            unowned_pixels: extraction.allocation.unowned_pixels(),
            output_size,
            pieces: records,
        };
        if self.config.write_manifest {
            let path = self.config.output_dir.join(MANIFEST_FILE);
            let json = serde_json::to_string_pretty(&manifest)?;
            fs::write(&path, json).map_err(|source| PipelineError::Io { path, source })?;
        }
        log::info!(
            "wrote {} pieces to {}",
            written.len(),
            self.config.output_dir.display()
        );
        Ok(ExtractionReport {
            manifest,
            written,
            skipped: extraction.skipped.clone(),
            empty: extraction.empty.clone(),
        })
    }

    /// Rasterizes every distinct cut once and keeps only its crossing
    /// profiles.
    fn profile_cuts(
        &self,
        document: &PathDocument,
        grid: &Grid,
        width: u32,
        height: u32,
    ) -> CutProfiles {
        let horizontal = self.divider_profiles(
            document,
            grid,
            PathRole::HorizontalDividers,
            grid.rows.saturating_sub(1),
            (CutDirection::Below, CutDirection::Above),
            (width, height),
        );
        let vertical = self.divider_profiles(
            document,
            grid,
            PathRole::VerticalDividers,
            grid.cols.saturating_sub(1),
            (CutDirection::Right, CutDirection::Left),
            (width, height),
        );
        let border = match document.entity(PathRole::Border) {
            Ok(entity) => {
                match self
                    .rasterizer
                    .rasterize(&entity.data, (grid.width, grid.height), width, height)
                {
                    Ok(raster) => Some(BorderProfiles::scan(&raster)),
                    Err(err) => {
                        log::warn!("cannot rasterize border ({err}), outer edges use image bounds");
                        None
                    }
                }
            }
            Err(err) => {
                log::warn!("no border path ({err}), outer edges use image bounds");
                None
            }
        };
        CutProfiles {
            horizontal,
            vertical,
            border,
        }
    }

    fn divider_profiles(
        &self,
        document: &PathDocument,
        grid: &Grid,
        role: PathRole,
        expected: u32,
        (before, after): (CutDirection, CutDirection),
        (width, height): (u32, u32),
    ) -> Vec<Option<DividerProfiles>> {
        let subpaths = document.subpaths(role).unwrap_or_else(|err| {
            log::warn!("cannot read {role:?} ({err})");
            Vec::new()
        });
        if subpaths.len() != expected as usize {
            log::warn!(
                "{role:?} has {} sub-paths, grid needs {expected}",
                subpaths.len()
            );
        }
        (0..expected as usize)
            .map(|index| {
                let data = subpaths.get(index)?;
                match self
                    .rasterizer
                    .rasterize(data, (grid.width, grid.height), width, height)
                {
                    Ok(raster) => Some(DividerProfiles {
                        before: CutProfile::scan(&raster, before),
                        after: CutProfile::scan(&raster, after),
                    }),
                    Err(err) => {
                        log::warn!("cannot rasterize {role:?} #{index}: {err}");
                        None
                    }
                }
            })
            .collect()
    }
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn save_image(
    image: &image::GrayImage,
    path: &Path,
    format: ImageFormat,
) -> Result<(), PipelineError> {
    image
        .save_with_format(path, format)
        .map_err(|err| encode_error(path, err))
}

fn save_piece(image: &RgbaImage, path: &Path, format: ImageFormat) -> Result<(), PipelineError> {
    let result = if format == ImageFormat::Jpeg {
        let rgb: RgbImage = image.convert();
        rgb.save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };
    result.map_err(|err| encode_error(path, err))
}

fn encode_error(path: &Path, err: image::ImageError) -> PipelineError {
    PipelineError::Encode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
