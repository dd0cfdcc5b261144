use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::curve::{assemble_cuts, CutSet};
use crate::error::DocumentError;
use crate::puzzle::PuzzleSpec;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const DEFAULT_STROKE: &str = "Black";
pub const SUBPATH_SEPARATOR: &str = "M ";

static SVG_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b([^>]*)>").expect("svg root pattern"));
static PATH_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<path\b([^>]*)>").expect("path element pattern"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathRole {
    HorizontalDividers,
    VerticalDividers,
    Border,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathEntity {
    pub data: String,
    pub stroke: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridHint {
    pub cols: u32,
    pub rows: u32,
}

/// Indices into `PathDocument::paths` for each role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathRoles {
    pub horizontal: usize,
    pub vertical: usize,
    pub border: usize,
}

impl PathRoles {
    pub fn index(&self, role: PathRole) -> usize {
        match role {
            PathRole::HorizontalDividers => self.horizontal,
            PathRole::VerticalDividers => self.vertical,
            PathRole::Border => self.border,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SvgOptions {
    /// Writes `data-cols`/`data-rows` on the root element.
    pub grid_metadata: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            grid_metadata: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathDocument {
    pub canvas: Option<(f64, f64)>,
    pub unit: String,
    pub grid_hint: Option<GridHint>,
    pub paths: Vec<PathEntity>,
}

impl PathDocument {
    pub fn generate(spec: &PuzzleSpec, options: SvgOptions) -> Self {
        let cuts = assemble_cuts(spec);
        Self::from_cuts(spec, &cuts, options)
    }

    pub fn from_cuts(spec: &PuzzleSpec, cuts: &CutSet, options: SvgOptions) -> Self {
        let join = |dividers: &[crate::curve::DividerPath]| {
            dividers
                .iter()
                .map(|divider| divider.to_path_data())
                .collect::<String>()
        };
        let stroked = |data: String| PathEntity {
            data,
            stroke: Some(DEFAULT_STROKE.to_string()),
        };
        let grid_hint = options.grid_metadata.then_some(GridHint {
            cols: spec.cols(),
            rows: spec.rows(),
        });
        Self {
            canvas: Some((spec.width(), spec.height())),
            unit: "mm".to_string(),
            grid_hint,
            paths: vec![
                stroked(join(&cuts.horizontal)),
                stroked(join(&cuts.vertical)),
                stroked(cuts.border.to_path_data()),
            ],
        }
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(svg, r#"<svg xmlns="{SVG_NAMESPACE}" version="1.0""#);
        if let Some((width, height)) = self.canvas {
            let unit = &self.unit;
            let _ = write!(
                svg,
                r#" width="{width}{unit}" height="{height}{unit}" viewBox="0 0 {width} {height}""#
            );
        }
        if let Some(hint) = self.grid_hint {
            let _ = write!(svg, r#" data-cols="{}" data-rows="{}""#, hint.cols, hint.rows);
        }
        svg.push('>');
        for path in &self.paths {
            let stroke = path.stroke.as_deref().unwrap_or(DEFAULT_STROKE);
            let _ = write!(
                svg,
                r#"<path fill="none" stroke="{stroke}" stroke-width="1.0" d="{}"></path>"#,
                path.data
            );
        }
        svg.push_str("</svg>");
        svg
    }

    pub fn parse(svg: &str) -> Result<Self, DocumentError> {
        let root = SVG_ROOT.captures(svg).ok_or(DocumentError::MissingRoot)?;
        let root_attrs = parse_attributes(root.get(1).map_or("", |m| m.as_str()));
        let (canvas, unit) = read_canvas(&root_attrs)?;
        let grid_hint = read_grid_hint(&root_attrs);

        let paths = PATH_ELEMENT
            .captures_iter(svg)
            .filter_map(|caps| {
                let mut attrs = parse_attributes(caps.get(1).map_or("", |m| m.as_str()));
                let data = attrs.remove("d")?;
                Some(PathEntity {
                    data,
                    stroke: attrs.remove("stroke"),
                })
            })
            .collect();

        Ok(Self {
            canvas,
            unit,
            grid_hint,
            paths,
        })
    }

    /// Picks the horizontal, vertical and border paths. Stroke colour hints
    /// (`darkblue`, `darkred`) take precedence; plain black paths fill the
    /// divider slots in document order and the border is the first path
    /// left over.
    pub fn roles(&self) -> Result<PathRoles, DocumentError> {
        if self.paths.len() < 3 {
            return Err(DocumentError::TooFewPaths {
                found: self.paths.len(),
            });
        }
        let mut horizontal = None;
        let mut vertical = None;
        for (index, path) in self.paths.iter().enumerate() {
            let stroke = path.stroke.as_deref().unwrap_or_default().to_ascii_lowercase();
            if stroke == "darkblue" || (horizontal.is_none() && stroke == "black") {
                horizontal = Some(index);
            } else if stroke == "darkred"
                || (vertical.is_none() && horizontal.is_some() && stroke == "black")
            {
                vertical = Some(index);
            }
        }
        let first_free = |taken: &[Option<usize>]| {
            (0..self.paths.len())
                .find(|index| !taken.contains(&Some(*index)))
                .unwrap_or(0)
        };
        let horizontal = horizontal.unwrap_or_else(|| first_free(&[vertical]));
        let vertical = vertical.unwrap_or_else(|| first_free(&[Some(horizontal)]));
        let border = first_free(&[Some(horizontal), Some(vertical)]);
        Ok(PathRoles {
            horizontal,
            vertical,
            border,
        })
    }

    pub fn entity(&self, role: PathRole) -> Result<&PathEntity, DocumentError> {
        let roles = self.roles()?;
        self.paths
            .get(roles.index(role))
            .ok_or(DocumentError::TooFewPaths {
                found: self.paths.len(),
            })
    }

    pub fn subpaths(&self, role: PathRole) -> Result<Vec<String>, DocumentError> {
        self.entity(role).map(|entity| split_subpaths(&entity.data))
    }
}

pub fn count_subpaths(data: &str) -> usize {
    data.matches(SUBPATH_SEPARATOR).count()
}

/// Splits path data on its move commands, each piece re-prefixed with `M `.
pub fn split_subpaths(data: &str) -> Vec<String> {
    data.split(SUBPATH_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| format!("{SUBPATH_SEPARATOR}{segment}"))
        .collect()
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((name, value))
        })
        .collect()
}

fn read_canvas(
    attrs: &HashMap<String, String>,
) -> Result<(Option<(f64, f64)>, String), DocumentError> {
    if let (Some(width), Some(height)) = (attrs.get("width"), attrs.get("height")) {
        let (width, unit) = parse_length("width", width)?;
        let (height, _) = parse_length("height", height)?;
        return Ok((Some((width, height)), unit));
    }
    let Some(view_box) = attrs.get("viewBox") else {
        return Ok((None, String::new()));
    };
    let invalid = || DocumentError::InvalidSize {
        attribute: "viewBox",
        value: view_box.clone(),
    };
    let values = view_box
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [_, _, width, height] if *width > 0.0 && *height > 0.0 => {
            Ok((Some((*width, *height)), String::new()))
        }
        _ => Err(invalid()),
    }
}

fn parse_length(attribute: &'static str, raw: &str) -> Result<(f64, String), DocumentError> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|ch: char| ch.is_ascii_alphabetic() || ch == '%')
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok((value, unit.to_string())),
        _ => Err(DocumentError::InvalidSize {
            attribute,
            value: raw.to_string(),
        }),
    }
}

fn read_grid_hint(attrs: &HashMap<String, String>) -> Option<GridHint> {
    let cols = attrs.get("data-cols")?.trim().parse::<u32>().ok()?;
    let rows = attrs.get("data-rows")?.trim().parse::<u32>().ok()?;
    (cols > 0 && rows > 0).then_some(GridHint { cols, rows })
}
