use serde::{Deserialize, Serialize};

use crate::document::{count_subpaths, PathDocument, PathRole};

pub const FALLBACK_ROWS: u32 = 4;
pub const FALLBACK_COLS: u32 = 4;
pub const FALLBACK_WIDTH: f64 = 300.0;
pub const FALLBACK_HEIGHT: f64 = 200.0;

pub const FALLBACK_GRID: Grid = Grid {
    rows: FALLBACK_ROWS,
    cols: FALLBACK_COLS,
    width: FALLBACK_WIDTH,
    height: FALLBACK_HEIGHT,
    source: GridSource::Fallback,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSource {
    /// `data-cols`/`data-rows` on the root element.
    Metadata,
    /// Counted move commands in the divider paths.
    Lexical,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
    pub width: f64,
    pub height: f64,
    pub source: GridSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PiecePosition {
    pub row: u32,
    pub col: u32,
}

impl Grid {
    pub fn piece_count(&self) -> usize {
        (self.rows as usize) * (self.cols as usize)
    }

    pub fn is_border(&self, position: PiecePosition) -> bool {
        position.row == 0
            || position.row + 1 == self.rows
            || position.col == 0
            || position.col + 1 == self.cols
    }

    /// Row-major: ascending row, then ascending column.
    pub fn positions(&self) -> Vec<PiecePosition> {
        let mut positions = Vec::with_capacity(self.piece_count());
        for row in 0..self.rows {
            for col in 0..self.cols {
                positions.push(PiecePosition { row, col });
            }
        }
        positions
    }
}

pub fn infer_grid(document: &PathDocument) -> Grid {
    let roles = match document.roles() {
        Ok(roles) => roles,
        Err(err) => {
            log::warn!("cannot locate divider paths ({err}), using default grid");
            return FALLBACK_GRID;
        }
    };
    let divider = |role: PathRole| document.paths[roles.index(role)].data.as_str();
    let lexical_rows = count_subpaths(divider(PathRole::HorizontalDividers)) + 1;
    let lexical_cols = count_subpaths(divider(PathRole::VerticalDividers)) + 1;
    let (width, height) = document.canvas.unwrap_or_else(|| {
        log::warn!("document declares no canvas size, using {FALLBACK_WIDTH}x{FALLBACK_HEIGHT}");
        (FALLBACK_WIDTH, FALLBACK_HEIGHT)
    });

    let lexical = Grid {
        rows: lexical_rows as u32,
        cols: lexical_cols as u32,
        width,
        height,
        source: GridSource::Lexical,
    };
    match document.grid_hint {
        Some(hint) if hint.rows as usize == lexical_rows && hint.cols as usize == lexical_cols => {
            Grid {
                source: GridSource::Metadata,
                ..lexical
            }
        }
        Some(hint) => {
            log::warn!(
                "grid metadata {}x{} disagrees with divider paths {}x{}, using the paths",
                hint.cols,
                hint.rows,
                lexical_cols,
                lexical_rows
            );
            lexical
        }
        None => lexical,
    }
}

/// Parses and infers in one step; malformed documents degrade to
/// `FALLBACK_GRID` together with an empty document.
pub fn infer_grid_from_svg(svg: &str) -> (PathDocument, Grid) {
    match PathDocument::parse(svg) {
        Ok(document) => {
            let grid = infer_grid(&document);
            (document, grid)
        }
        Err(err) => {
            log::warn!("cannot parse path document ({err}), using default grid");
            (PathDocument::default(), FALLBACK_GRID)
        }
    }
}
