use strata_data::StrataDataError;
use strata_units::StrataUnitError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrataProfileError {
    #[error("Profiles bin over 1 or 2 fields, got {0}")]
    InvalidAxisCount(usize),

    #[error("Invalid bin specification: {0}")]
    InvalidBinSpec(String),

    #[error("No dependent fields requested")]
    NoFields,

    #[error("Cannot express `{field}` in `{to}` (native units `{from}`): {source}")]
    IncompatibleUnit {
        field: String,
        from: String,
        to: String,
        #[source]
        source: StrataUnitError,
    },

    #[error("Field `{0}` is not part of this profile")]
    FieldNotInProfile(String),

    #[error("Data error: `{0}`")]
    DataError(#[from] StrataDataError),
}
