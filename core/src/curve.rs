use std::fmt::Write;

use crate::puzzle::PuzzleSpec;
use crate::tab::{TabGenerator, TabState};

pub type Point = (f64, f64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Walks left to right along an interior row boundary.
    Horizontal,
    /// Walks top to bottom along an interior column boundary.
    Vertical,
}

/// Position of one cell on one divider line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkCursor {
    pub axis: Axis,
    /// Cell index along the walk direction.
    pub along: u32,
    /// Index of the divider line across the walk direction.
    pub across: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CellFrame {
    length: f64,
    breadth: f64,
    offset: f64,
}

impl CellFrame {
    fn for_axis(spec: &PuzzleSpec, axis: Axis) -> Self {
        let (length, breadth) = match axis {
            Axis::Horizontal => (spec.cell_width(), spec.cell_height()),
            Axis::Vertical => (spec.cell_height(), spec.cell_width()),
        };
        Self {
            length,
            breadth,
            offset: spec.offset(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicSegment {
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub end: Point,
}

/// The double-bump tab profile for one cell, in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellCurve {
    pub start: Point,
    pub segments: [CubicSegment; 3],
}

impl CellCurve {
    pub fn end(&self) -> Point {
        self.segments[2].end
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DividerPath {
    pub axis: Axis,
    pub index: u32,
    pub cells: Vec<CellCurve>,
}

impl DividerPath {
    pub fn start(&self) -> Option<Point> {
        self.cells.first().map(|cell| cell.start)
    }

    pub fn to_path_data(&self) -> String {
        let mut path = String::new();
        let Some((x, y)) = self.start() else {
            return path;
        };
        let _ = write!(path, "M {},{} ", fmt_num(x), fmt_num(y));
        for cell in &self.cells {
            for segment in &cell.segments {
                let _ = write!(
                    path,
                    "C {} {} {} {} {} {} ",
                    fmt_num(segment.ctrl1.0),
                    fmt_num(segment.ctrl1.1),
                    fmt_num(segment.ctrl2.0),
                    fmt_num(segment.ctrl2.1),
                    fmt_num(segment.end.0),
                    fmt_num(segment.end.1),
                );
            }
        }
        path
    }
}

/// Rounded rectangle around the whole puzzle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderPath {
    pub offset: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
}

impl BorderPath {
    pub fn from_spec(spec: &PuzzleSpec) -> Self {
        Self {
            offset: spec.offset(),
            width: spec.width(),
            height: spec.height(),
            radius: spec.corner_radius(),
        }
    }

    pub fn to_path_data(&self) -> String {
        let o = self.offset;
        let r = self.radius;
        let right = o + self.width;
        let bottom = o + self.height;
        let arc = format!("A {} {} 0 0 1", fmt_num(r), fmt_num(r));
        let mut path = String::new();
        let _ = write!(path, "M {} {} ", fmt_num(o + r), fmt_num(o));
        let _ = write!(path, "L {} {} ", fmt_num(o + self.width - r), fmt_num(o));
        let _ = write!(path, "{arc} {} {} ", fmt_num(right), fmt_num(o + r));
        let _ = write!(path, "L {} {} ", fmt_num(right), fmt_num(o + self.height - r));
        let _ = write!(path, "{arc} {} {} ", fmt_num(o + self.width - r), fmt_num(bottom));
        let _ = write!(path, "L {} {} ", fmt_num(o + r), fmt_num(bottom));
        let _ = write!(path, "{arc} {} {} ", fmt_num(o), fmt_num(o + self.height - r));
        let _ = write!(path, "L {} {} ", fmt_num(o), fmt_num(o + r));
        let _ = write!(path, "{arc} {} {} ", fmt_num(o + r), fmt_num(o));
        path
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CutSet {
    pub horizontal: Vec<DividerPath>,
    pub vertical: Vec<DividerPath>,
    pub border: BorderPath,
}

/// Walks every interior divider of the puzzle. The tab state and the
/// sequence carry over from the horizontal pass into the vertical one.
pub fn assemble_cuts(spec: &PuzzleSpec) -> CutSet {
    let mut tabs = TabGenerator::new(spec.seed(), spec.jitter_ratio());
    let horizontal = (1..spec.rows())
        .map(|row| walk_divider(spec, &mut tabs, Axis::Horizontal, row))
        .collect();
    let vertical = (1..spec.cols())
        .map(|col| walk_divider(spec, &mut tabs, Axis::Vertical, col))
        .collect();
    CutSet {
        horizontal,
        vertical,
        border: BorderPath::from_spec(spec),
    }
}

fn walk_divider(spec: &PuzzleSpec, tabs: &mut TabGenerator, axis: Axis, across: u32) -> DividerPath {
    let frame = CellFrame::for_axis(spec, axis);
    let cell_count = match axis {
        Axis::Horizontal => spec.cols(),
        Axis::Vertical => spec.rows(),
    };
    let mut tab = tabs.first();
    let mut cells = Vec::with_capacity(cell_count as usize);
    for along in 0..cell_count {
        let cursor = WalkCursor { axis, along, across };
        cells.push(cell_curve(&frame, cursor, &tab, spec.tab_ratio()));
        tab = tabs.next();
    }
    DividerPath {
        axis,
        index: across,
        cells,
    }
}

fn cell_curve(frame: &CellFrame, cursor: WalkCursor, tab: &TabState, t: f64) -> CellCurve {
    let sign = if tab.flip { -1.0 } else { 1.0 };
    let origin_l = frame.offset + frame.length * cursor.along as f64;
    let origin_w = frame.offset + frame.breadth * cursor.across as f64;
    let l = |v: f64| round2(origin_l + frame.length * v);
    let w = |v: f64| round2(origin_w + frame.breadth * v * sign);
    let (a, b, c, d, e) = (tab.a, tab.b, tab.c, tab.d, tab.e);

    let p0 = (l(0.0), w(0.0));
    let p1 = (l(0.2), w(a));
    let p2 = (l(0.5 + b + d), w(-t + c));
    let p3 = (l(0.5 - t + b), w(t + c));
    let p4 = (l(0.5 - 2.0 * t + b - d), w(3.0 * t + c));
    let p5 = (l(0.5 + 2.0 * t + b - d), w(3.0 * t + c));
    let p6 = (l(0.5 + t + b), w(t + c));
    let p7 = (l(0.5 + b + d), w(-t + c));
    let p8 = (l(0.8), w(e));
    let p9 = (l(1.0), w(0.0));

    let place = |(len, wid): Point| match cursor.axis {
        Axis::Horizontal => (len, wid),
        Axis::Vertical => (wid, len),
    };
    let segment = |c1: Point, c2: Point, end: Point| CubicSegment {
        ctrl1: place(c1),
        ctrl2: place(c2),
        end: place(end),
    };
    CellCurve {
        start: place(p0),
        segments: [segment(p1, p2, p3), segment(p4, p5, p6), segment(p7, p8, p9)],
    }
}

/// Rounds to 2 decimals with ties to even and normalizes negative zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0 + 0.0
}

/// Shortest round-trip decimal, keeping one decimal on integral values.
pub fn fmt_num(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleParams;

    fn spec(cols: u32, rows: u32, jitter_percent: f64) -> PuzzleSpec {
        PuzzleSpec::new(&PuzzleParams {
            width: 100.0,
            height: 60.0,
            cols,
            rows,
            jitter_percent,
            seed: 11,
            ..PuzzleParams::default()
        })
        .expect("valid spec")
    }

    #[test]
    fn divider_counts_follow_grid() {
        let cuts = assemble_cuts(&spec(4, 3, 4.0));
        assert_eq!(cuts.horizontal.len(), 2);
        assert_eq!(cuts.vertical.len(), 3);
        assert!(cuts.horizontal.iter().all(|divider| divider.cells.len() == 4));
        assert!(cuts.vertical.iter().all(|divider| divider.cells.len() == 3));
    }

    #[test]
    fn horizontal_divider_spans_canvas_width() {
        let cuts = assemble_cuts(&spec(4, 3, 4.0));
        let divider = &cuts.horizontal[0];
        assert_eq!(divider.start(), Some((0.0, 20.0)));
        assert_eq!(divider.cells.last().map(CellCurve::end), Some((100.0, 20.0)));
    }

    #[test]
    fn vertical_divider_swaps_axes() {
        let cuts = assemble_cuts(&spec(4, 3, 4.0));
        let divider = &cuts.vertical[1];
        assert_eq!(divider.start(), Some((50.0, 0.0)));
        assert_eq!(divider.cells.last().map(CellCurve::end), Some((50.0, 60.0)));
    }

    #[test]
    fn flat_tab_profile_without_jitter() {
        let frame = CellFrame {
            length: 100.0,
            breadth: 50.0,
            offset: 0.0,
        };
        let cursor = WalkCursor {
            axis: Axis::Horizontal,
            along: 0,
            across: 1,
        };
        let curve = cell_curve(&frame, cursor, &TabState::default(), 0.1);
        assert_eq!(curve.start, (0.0, 50.0));
        assert_eq!(curve.segments[0].ctrl1, (20.0, 50.0));
        assert_eq!(curve.segments[0].ctrl2, (50.0, 45.0));
        assert_eq!(curve.segments[0].end, (40.0, 55.0));
        assert_eq!(curve.segments[1].ctrl1, (30.0, 65.0));
        assert_eq!(curve.segments[1].ctrl2, (70.0, 65.0));
        assert_eq!(curve.segments[1].end, (60.0, 55.0));
        assert_eq!(curve.segments[2].end, (100.0, 50.0));

        let flipped = TabState {
            flip: true,
            ..TabState::default()
        };
        let curve = cell_curve(&frame, cursor, &flipped, 0.1);
        assert_eq!(curve.segments[1].ctrl1, (30.0, 35.0));
    }

    #[test]
    fn rounding_matches_half_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(0.625), 0.62);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(-0.001).to_string(), "0");
    }

    #[test]
    fn numbers_format_like_float_repr() {
        assert_eq!(fmt_num(50.0), "50.0");
        assert_eq!(fmt_num(33.33), "33.33");
        assert_eq!(fmt_num(0.0), "0.0");
        assert_eq!(fmt_num(-4.5), "-4.5");
        assert_eq!(fmt_num(1e15), "1000000000000000.0");
        assert_eq!(fmt_num(9_999_999_999_999_998.0), "9999999999999998.0");
    }

    #[test]
    fn border_path_is_clockwise_rounded_rectangle() {
        let border = BorderPath {
            offset: 0.0,
            width: 300.0,
            height: 200.0,
            radius: 2.0,
        };
        assert_eq!(
            border.to_path_data(),
            "M 2.0 0.0 L 298.0 0.0 A 2.0 2.0 0 0 1 300.0 2.0 L 300.0 198.0 \
             A 2.0 2.0 0 0 1 298.0 200.0 L 2.0 200.0 A 2.0 2.0 0 0 1 0.0 198.0 \
             L 0.0 2.0 A 2.0 2.0 0 0 1 2.0 0.0 "
        );
    }

    #[test]
    fn path_data_has_one_move_per_divider() {
        let cuts = assemble_cuts(&spec(3, 2, 4.0));
        let data = cuts.horizontal[0].to_path_data();
        assert!(data.starts_with("M 0.0,30.0 C "));
        assert_eq!(data.matches("M ").count(), 1);
        assert_eq!(data.matches("C ").count(), 9);
    }
}
