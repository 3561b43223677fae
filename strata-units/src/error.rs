use crate::dimensions::Dimensions;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrataUnitError {
    #[error("Unknown unit symbol `{symbol}` in `{expr}`")]
    UnknownSymbol { symbol: String, expr: String },

    #[error("Malformed unit expression `{expr}`: {reason}")]
    MalformedExpression { expr: String, reason: String },

    #[error("Cannot convert from `{from}` ({from_dims}) to `{to}` ({to_dims})")]
    Incompatible {
        from: String,
        to: String,
        from_dims: Dimensions,
        to_dims: Dimensions,
    },
}
