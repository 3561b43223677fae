pub mod aggregate;
pub mod binning;
pub mod create;
pub mod error;
pub mod profile;
pub mod transform;

pub use binning::{BinAssignment, BinSpec};
pub use create::{
    create_profile, create_profiles, NBins, ProfileRequest, DEFAULT_N_BINS, DEFAULT_WEIGHT_FIELD,
};
pub use error::StrataProfileError;
pub use profile::{Profile, ProfileAxis, ProfileField, ProfileStatus};
pub use transform::{Accumulation, Transforms};
