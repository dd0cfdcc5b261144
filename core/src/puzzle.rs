use serde::{Deserialize, Serialize};

use crate::error::SpecError;

pub const DEFAULT_COLS: u32 = 15;
pub const DEFAULT_ROWS: u32 = 10;
pub const DEFAULT_WIDTH_MM: f64 = 300.0;
pub const DEFAULT_HEIGHT_MM: f64 = 200.0;
pub const DEFAULT_TAB_SIZE_PERCENT: f64 = 20.0;
pub const DEFAULT_JITTER_PERCENT: f64 = 4.0;
pub const DEFAULT_CORNER_RADIUS_MM: f64 = 2.0;

/// User-facing puzzle parameters, in the units the generator CLI accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleParams {
    pub width: f64,
    pub height: f64,
    pub cols: u32,
    pub rows: u32,
    pub tab_size_percent: f64,
    pub jitter_percent: f64,
    pub seed: i64,
    pub corner_radius: f64,
}

impl Default for PuzzleParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH_MM,
            height: DEFAULT_HEIGHT_MM,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            tab_size_percent: DEFAULT_TAB_SIZE_PERCENT,
            jitter_percent: DEFAULT_JITTER_PERCENT,
            seed: 0,
            corner_radius: DEFAULT_CORNER_RADIUS_MM,
        }
    }
}

/// Validated, immutable puzzle geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PuzzleSpec {
    width: f64,
    height: f64,
    cols: u32,
    rows: u32,
    tab_ratio: f64,
    jitter_ratio: f64,
    seed: i64,
    corner_radius: f64,
    offset: f64,
}

impl PuzzleSpec {
    pub fn new(params: &PuzzleParams) -> Result<Self, SpecError> {
        if params.cols == 0 || params.rows == 0 {
            return Err(SpecError::EmptyGrid {
                cols: params.cols,
                rows: params.rows,
            });
        }
        require_positive("width", params.width)?;
        require_positive("height", params.height)?;
        require_non_negative("tab size", params.tab_size_percent)?;
        require_non_negative("jitter", params.jitter_percent)?;
        require_non_negative("corner radius", params.corner_radius)?;

        Ok(Self {
            width: params.width,
            height: params.height,
            cols: params.cols,
            rows: params.rows,
            tab_ratio: params.tab_size_percent / 200.0,
            jitter_ratio: params.jitter_percent / 100.0,
            seed: params.seed,
            corner_radius: params.corner_radius,
            offset: 0.0,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tab_ratio(&self) -> f64 {
        self.tab_ratio
    }

    pub fn jitter_ratio(&self) -> f64 {
        self.jitter_ratio
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn cell_width(&self) -> f64 {
        self.width / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.height / self.rows as f64
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), SpecError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SpecError::NotPositive { field, value })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), SpecError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SpecError::Negative { field, value })
    }
}
