pub mod curve;
pub mod document;
pub mod error;
pub mod grid;
pub mod puzzle;
pub mod sequence;
pub mod tab;

pub use curve::{
    assemble_cuts, Axis, BorderPath, CellCurve, CubicSegment, CutSet, DividerPath, WalkCursor,
};
pub use document::{
    count_subpaths, split_subpaths, GridHint, PathDocument, PathEntity, PathRole, SvgOptions,
};
pub use error::{DocumentError, SpecError};
pub use grid::{infer_grid, infer_grid_from_svg, Grid, GridSource, PiecePosition, FALLBACK_GRID};
pub use puzzle::{PuzzleParams, PuzzleSpec};
pub use sequence::SineSequence;
pub use tab::{TabGenerator, TabState};
