pub mod axis;
pub mod colorbar;
pub mod legend;
