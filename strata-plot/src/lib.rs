pub mod error;
pub mod guides;
pub mod panel;
pub mod phase_plot;
pub mod profile_plot;
pub mod renderer;
pub mod save;
pub mod state;

pub use error::StrataPlotError;
pub use panel::{CellGrid, LineSeries, Panel, PanelAxis, PanelContent};
pub use phase_plot::{PhasePlot, PhasePlotConfig};
pub use profile_plot::{ProfilePlot, ProfilePlotConfig};
pub use renderer::{layout_panel, Renderer, SceneRenderer};
pub use save::{RenderedPlot, SaveReport};
pub use state::{
    AnnotationCoords, FigureConfig, LineProperty, LineStyle, PlotState, TextStyle,
};
pub use strata_render::ImageFormat;
