pub mod dimensions;
pub mod error;
pub mod registry;

pub use dimensions::Dimensions;
pub use error::StrataUnitError;
pub use registry::{Unit, UnitRegistry, UnitSystem};
