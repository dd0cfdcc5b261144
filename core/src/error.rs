#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("grid must have at least one column and one row, got {cols}x{rows}")]
    EmptyGrid { cols: u32, rows: u32 },
    #[error("{field} must be a finite positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be a finite non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("document has no <svg> root element")]
    MissingRoot,
    #[error("invalid {attribute} attribute: {value:?}")]
    InvalidSize { attribute: &'static str, value: String },
    #[error("expected at least 3 path elements, found {found}")]
    TooFewPaths { found: usize },
}
