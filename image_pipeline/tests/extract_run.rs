use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use katanuki_core::{
    infer_grid_from_svg, Grid, GridSource, PathDocument, PiecePosition, PuzzleParams, PuzzleSpec,
    SvgOptions,
};
use katanuki_image_pipeline::{
    BorderStrategy, BoundingBox, CutRaster, CutRasterizer, ExtractConfig, Extractor, Manifest,
    PipelineError, ResvgRasterizer,
};

/// Draws every divider as a straight line through its start point and the
/// border as the outline of the image.
struct StraightCuts;

impl CutRasterizer for StraightCuts {
    fn rasterize(
        &self,
        path_data: &str,
        canvas: (f64, f64),
        width: u32,
        height: u32,
    ) -> Result<CutRaster, PipelineError> {
        if path_data.contains(" A ") {
            return Ok(CutRaster::from_fn(width, height, |x, y| {
                x == 0 || y == 0 || x + 1 == width || y + 1 == height
            }));
        }
        let start = path_data
            .strip_prefix("M ")
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|point| point.split_once(','))
            .ok_or_else(|| PipelineError::Rasterize(format!("no start point in {path_data:?}")))?;
        let parse = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|err| PipelineError::Rasterize(err.to_string()))
        };
        let (x, y) = (parse(start.0)?, parse(start.1)?);
        if x == 0.0 {
            let row = (y * f64::from(height) / canvas.1).round() as u32;
            Ok(CutRaster::from_fn(width, height, |_, py| py == row))
        } else {
            let col = (x * f64::from(width) / canvas.0).round() as u32;
            Ok(CutRaster::from_fn(width, height, |px, _| px == col))
        }
    }
}

fn spec(cols: u32, rows: u32) -> PuzzleSpec {
    PuzzleSpec::new(&PuzzleParams {
        width: 300.0,
        height: 200.0,
        cols,
        rows,
        seed: 7,
        ..PuzzleParams::default()
    })
    .expect("valid spec")
}

fn write_inputs(dir: &Path, width: u32, height: u32, svg: &str) -> (PathBuf, PathBuf) {
    let image_path = dir.join("photo.png");
    RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 90, 255]))
        .save(&image_path)
        .expect("write source image");
    let svg_path = dir.join("cuts.svg");
    fs::write(&svg_path, svg).expect("write svg");
    (image_path, svg_path)
}

#[test]
fn straight_cuts_produce_a_full_grid_of_pieces() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svg = PathDocument::generate(&spec(3, 2), SvgOptions::default()).to_svg();
    let (image_path, svg_path) = write_inputs(dir.path(), 60, 40, &svg);
    let output_dir = dir.path().join("out");
    let config = ExtractConfig {
        output_dir: output_dir.clone(),
        padding: 0,
        debug: true,
        border: BorderStrategy::Crossing,
        ..ExtractConfig::default()
    };

    let report = Extractor::new(config, StraightCuts)
        .run(&image_path, &svg_path)
        .expect("extraction succeeds");

    assert_eq!(report.written.len(), 6);
    assert!(report.skipped.is_empty());
    assert!(report.empty.is_empty());
    assert!(output_dir.join("piece_00_00.png").is_file());
    assert!(output_dir.join("piece_01_02.png").is_file());
    assert!(output_dir.join("debug/allocation_map.png").is_file());
    assert!(output_dir.join("debug/piece_mask_1_2.png").is_file());

    let manifest: Manifest = serde_json::from_str(
        &fs::read_to_string(output_dir.join("manifest.json")).expect("manifest written"),
    )
    .expect("manifest parses");
    assert_eq!((manifest.grid.rows, manifest.grid.cols), (2, 3));
    assert_eq!((manifest.image_width, manifest.image_height), (60, 40));
    // Bottom row and right column of the outline belong to no piece.
    assert_eq!(manifest.unowned_pixels, 99);
    let bbox = |row, col| {
        manifest
            .pieces
            .iter()
            .find(|piece| (piece.row, piece.col) == (row, col))
            .map(|piece| piece.bbox)
            .expect("piece recorded")
    };
    assert_eq!(
        bbox(0, 0),
        BoundingBox {
            left: 0,
            top: 0,
            right: 20,
            bottom: 20
        }
    );
    assert_eq!(
        bbox(1, 2),
        BoundingBox {
            left: 40,
            top: 20,
            right: 59,
            bottom: 39
        }
    );

    let first = image::open(output_dir.join("piece_00_00.png")).expect("piece readable");
    assert_eq!((first.width(), first.height()), (20, 20));
}

#[test]
fn fixed_size_pieces_share_one_canvas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svg = PathDocument::generate(&spec(3, 2), SvgOptions::default()).to_svg();
    let (image_path, svg_path) = write_inputs(dir.path(), 60, 40, &svg);
    let output_dir = dir.path().join("fixed");
    let config = ExtractConfig {
        output_dir: output_dir.clone(),
        prefix: "tile".to_string(),
        padding: 2,
        fixed_size: true,
        output_width: Some(32),
        write_manifest: false,
        ..ExtractConfig::default()
    };

    let report = Extractor::new(config, StraightCuts)
        .run(&image_path, &svg_path)
        .expect("extraction succeeds");

    let tallest = report
        .manifest
        .pieces
        .iter()
        .map(|piece| piece.bbox.height())
        .max()
        .expect("pieces");
    assert_eq!(report.manifest.output_size, Some((32, tallest)));
    for path in &report.written {
        let file = path.file_name().and_then(|name| name.to_str()).expect("file name");
        assert!(file.starts_with("tile_"), "{file}");
        let piece = image::open(path).expect("piece readable");
        assert_eq!((piece.width(), piece.height()), (32, tallest));
    }
    assert!(!output_dir.join("manifest.json").exists());
    assert!(!output_dir.join("debug").exists());
}

#[test]
fn missing_divider_skips_the_pieces_that_need_it() {
    let mut document = PathDocument::generate(&spec(2, 2), SvgOptions::default());
    document.paths[0].data.clear();
    let grid = Grid {
        rows: 2,
        cols: 2,
        width: 300.0,
        height: 200.0,
        source: GridSource::Metadata,
    };

    let source = RgbaImage::from_pixel(40, 40, Rgba([1, 2, 3, 255]));
    let extraction = Extractor::new(ExtractConfig::default(), StraightCuts)
        .extract(&source, &document, &grid)
        .expect("extraction runs");
    assert_eq!(extraction.skipped.len(), 4);
    assert!(extraction.pieces.is_empty());
    assert_eq!(extraction.allocation.unowned_pixels(), 1600);
}

#[test]
fn malformed_document_degrades_to_the_default_grid() {
    let (document, grid) = infer_grid_from_svg("<svg><path d=\"M 0 0\"/></svg>");
    assert_eq!((grid.rows, grid.cols), (4, 4));
    let source = RgbaImage::from_pixel(16, 16, Rgba([9, 9, 9, 255]));
    let extraction = Extractor::new(ExtractConfig::default(), StraightCuts)
        .extract(&source, &document, &grid)
        .expect("extraction runs");
    assert_eq!(extraction.skipped.len(), 16);
}

#[test]
fn oversized_grid_metadata_follows_the_divider_paths() {
    let svg = PathDocument::generate(&spec(2, 2), SvgOptions::default())
        .to_svg()
        .replace(
            r#"data-cols="2" data-rows="2""#,
            r#"data-cols="4000000000" data-rows="4000000000""#,
        );
    let (document, grid) = infer_grid_from_svg(&svg);
    assert_eq!((grid.rows, grid.cols), (2, 2));
    assert_eq!(grid.source, GridSource::Lexical);

    let source = RgbaImage::from_pixel(30, 20, Rgba([4, 5, 6, 255]));
    let extraction = Extractor::new(ExtractConfig::default(), StraightCuts)
        .extract(&source, &document, &grid)
        .expect("extraction runs");
    assert!(extraction.skipped.is_empty());
    assert_eq!(extraction.pieces.len(), 4);
}

#[test]
fn missing_source_image_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svg_path = dir.path().join("cuts.svg");
    fs::write(
        &svg_path,
        PathDocument::generate(&spec(2, 2), SvgOptions::default()).to_svg(),
    )
    .expect("write svg");
    let config = ExtractConfig {
        output_dir: dir.path().join("out"),
        ..ExtractConfig::default()
    };
    let err = Extractor::new(config, StraightCuts)
        .run(&dir.path().join("missing.png"), &svg_path)
        .expect_err("source is required");
    assert!(matches!(err, PipelineError::Source { .. }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn resvg_extraction_partitions_a_generated_puzzle() {
    let document = PathDocument::generate(&spec(3, 2), SvgOptions::default());
    let (document, grid) = infer_grid_from_svg(&document.to_svg());
    let source = RgbaImage::from_pixel(600, 400, Rgba([120, 160, 200, 255]));
    let config = ExtractConfig {
        padding: 0,
        ..ExtractConfig::default()
    };
    let extraction = Extractor::new(config, ResvgRasterizer { stroke_width: 2.0 })
        .extract(&source, &document, &grid)
        .expect("extraction runs");

    assert!(extraction.skipped.is_empty());
    assert_eq!(extraction.pieces.len(), 6);
    assert!(extraction.allocation.unowned_pixels() < 600 * 400 / 20);
    let corner = extraction
        .pieces
        .iter()
        .find(|piece| piece.position == PiecePosition { row: 0, col: 0 })
        .expect("top-left piece");
    assert!(corner.bbox.left < 10 && corner.bbox.top < 10);
    assert!(corner.bbox.right < 290, "{:?}", corner.bbox);
    assert!(corner.bbox.bottom < 290, "{:?}", corner.bbox);
}
