pub mod error;
pub mod grid;
pub mod source;

pub use error::StrataDataError;
pub use grid::{FakeDatasetConfig, GridDataset, Selection, SelectionKind, SphereCenter};
pub use source::{FieldInfo, FieldSource, FieldValues, SampleSet, SampleTable};
