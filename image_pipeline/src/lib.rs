use std::path::PathBuf;

pub mod allocate;
pub mod assemble;
pub mod extract;
pub mod raster;
pub mod reduce;
pub mod source;

pub use allocate::{allocate, Allocation, AllocationMap, ScanOrder};
pub use assemble::{assemble_piece, center_on_canvas, resolve_output_size, BoundingBox, PieceImage};
pub use extract::{ExtractConfig, Extraction, ExtractionReport, Extractor, Manifest, PieceRecord};
pub use raster::{CutRaster, CutRasterizer, ResvgRasterizer};
pub use reduce::{
    reduce_keep_mask, BorderProfiles, BorderStrategy, CutDirection, CutProfile, KeepMask,
    PieceCuts,
};
pub use source::{decode_source, load_source};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot read source image {path}: {source}")]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed for {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error("cut rasterization failed: {0}")]
    Rasterize(String),
    #[error("invalid image dimensions")]
    Dimensions,
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}
