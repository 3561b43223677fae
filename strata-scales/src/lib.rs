pub mod array;
pub mod colormap;
pub mod format;
pub mod numeric;

pub use colormap::{ColorScale, Colormap};
pub use numeric::{linear::LinearScale, log::LogScale, ContinuousScale, NumericScale};
