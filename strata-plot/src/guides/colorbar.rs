use strata_render::marks::group::SceneGroup;
use strata_render::marks::rect::SceneRectMark;
use strata_render::types::{BLACK, TRANSPARENT};
use strata_scales::ColorScale;

use crate::guides::axis::{make_numeric_axis_marks, AxisConfig, AxisOrientation};

#[derive(Debug, Clone)]
pub struct ColorbarConfig {
    /// Space available to the colorbar (width, height)
    pub dimensions: [f32; 2],
    /// Thickness of the color ramp
    pub colorbar_width: Option<f32>,
    /// Length of the color ramp, the available height when `None`
    pub colorbar_height: Option<f32>,
    /// Gap between the ramp and its axis
    pub colorbar_margin: Option<f32>,
    /// Gap between the plot area and the ramp
    pub left_padding: Option<f32>,
    /// Number of flat color steps approximating the ramp
    pub steps: usize,
    pub font_size: f32,
}

impl Default for ColorbarConfig {
    fn default() -> Self {
        Self {
            dimensions: [100.0, 100.0],
            colorbar_width: None,
            colorbar_height: None,
            colorbar_margin: None,
            left_padding: None,
            steps: 64,
            font_size: 12.0,
        }
    }
}

pub fn make_colorbar_marks(
    scale: &ColorScale,
    title: &str,
    origin: [f32; 2],
    config: &ColorbarConfig,
) -> SceneGroup {
    let colorbar_width = config.colorbar_width.unwrap_or(15.0);
    let colorbar_height = config.colorbar_height.unwrap_or(config.dimensions[1]);
    let colorbar_margin = config.colorbar_margin.unwrap_or(0.0);
    let left_padding = config.left_padding.unwrap_or(12.0);
    let steps = config.steps.max(1);

    // steps stacked from the bottom of the ramp upward
    let step_height = colorbar_height / steps as f32;
    let fractions: Vec<f64> = (0..steps)
        .map(|i| (i as f64 + 0.5) / steps as f64)
        .collect();
    let ramp = SceneRectMark {
        name: "ramp".to_string(),
        len: steps as u32,
        x: left_padding.into(),
        y: (0..steps)
            .map(|i| colorbar_height - (i + 1) as f32 * step_height)
            .collect::<Vec<_>>()
            .into(),
        width: colorbar_width.into(),
        // overlap neighbors slightly so antialiasing leaves no seams
        height: (step_height + 0.5).into(),
        fill: scale.colormap().sample_many(&fractions).into(),
        ..Default::default()
    };
    let frame = SceneRectMark {
        name: "frame".to_string(),
        x: left_padding.into(),
        width: colorbar_width.into(),
        height: colorbar_height.into(),
        fill: TRANSPARENT.into(),
        stroke: Some(BLACK),
        ..Default::default()
    };

    let axis_scale = scale
        .scale()
        .clone()
        .with_clamp(false)
        .with_range((colorbar_height as f64, 0.0));
    let axis = make_numeric_axis_marks(
        &axis_scale,
        title,
        [left_padding + colorbar_width + colorbar_margin, 0.0],
        &AxisConfig {
            orientation: AxisOrientation::Right,
            font_size: config.font_size,
            tick_count: Some(6.0),
        },
    );

    SceneGroup {
        name: "colorbar".to_string(),
        origin,
        marks: vec![ramp.into(), frame.into(), axis.into()],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_render::marks::mark::SceneMark;
    use strata_scales::Colormap;

    #[test]
    fn test_ramp_runs_low_to_high() {
        let scale = ColorScale::new((1.0, 100.0), true, Colormap::Gray);
        let group = make_colorbar_marks(
            &scale,
            "cell_mass (g)",
            [400.0, 20.0],
            &ColorbarConfig {
                dimensions: [80.0, 200.0],
                steps: 8,
                ..Default::default()
            },
        );
        assert_eq!(group.name, "colorbar");
        let SceneMark::Rect(ramp) = &group.marks[0] else {
            panic!("expected the ramp first");
        };
        let fills = ramp.fill.as_vec(8);
        let ys = ramp.y.as_vec(8);
        assert_eq!(fills.len(), 8);
        // first step sits at the bottom and is the darkest
        assert!(ys[0] > ys[7]);
        assert!(fills[0][0] < fills[7][0]);
        assert!(group.marks.iter().any(|m| m.name() == "colorbar-axis"));
    }
}
