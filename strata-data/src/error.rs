use strata_units::StrataUnitError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrataDataError {
    #[error("Field `{field}` not found, available fields: {available:?}")]
    UnknownField {
        field: String,
        available: Vec<String>,
    },

    #[error("Field `{field}` has {actual} samples, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Unit error: `{0}`")]
    UnitError(#[from] StrataUnitError),
}
