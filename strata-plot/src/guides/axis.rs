use strata_render::marks::group::SceneGroup;
use strata_render::marks::rule::SceneRuleMark;
use strata_render::marks::text::SceneTextMark;
use strata_render::types::{estimate_text_width, FontWeight, TextAlign, TextBaseline, BLACK};
use strata_render::value::ScalarOrArray;
use strata_scales::format::tick_labels;
use strata_scales::{ContinuousScale, NumericScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct AxisConfig {
    pub orientation: AxisOrientation,
    pub font_size: f32,
    /// Approximate number of ticks, `None` for the scale's default
    pub tick_count: Option<f64>,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            orientation: AxisOrientation::Bottom,
            font_size: 12.0,
            tick_count: None,
        }
    }
}

const MAJOR_TICK: f32 = 5.0;
const MINOR_TICK: f32 = 3.0;
const LABEL_PAD: f32 = 3.0;
const TITLE_PAD: f32 = 6.0;

/// Axis line, ticks, tick labels and title for a scale whose range is in
/// pixels relative to `origin`
pub fn make_numeric_axis_marks(
    scale: &NumericScale,
    title: &str,
    origin: [f32; 2],
    config: &AxisConfig,
) -> SceneGroup {
    let mut group = SceneGroup {
        name: match config.orientation {
            AxisOrientation::Bottom => "x-axis",
            AxisOrientation::Left => "y-axis",
            AxisOrientation::Right => "colorbar-axis",
        }
        .to_string(),
        origin,
        ..Default::default()
    };

    let ticks = tick_labels(scale, config.tick_count);
    let positions: Vec<f32> = ticks.iter().map(|(t, _)| scale.scale(*t) as f32).collect();
    let lengths: Vec<f32> = ticks
        .iter()
        .map(|(_, label)| if label.is_some() { MAJOR_TICK } else { MINOR_TICK })
        .collect();
    let labeled: Vec<(f32, String)> = ticks
        .iter()
        .zip(&positions)
        .filter_map(|((_, label), pos)| label.clone().map(|l| (*pos, l)))
        .collect();
    let label_size = config.font_size * 0.85;

    let (r0, r1) = scale.range();
    let (lo, hi) = (r0.min(r1) as f32, r0.max(r1) as f32);
    // direction pointing away from the plot area
    let out = match config.orientation {
        AxisOrientation::Bottom | AxisOrientation::Right => 1.0,
        AxisOrientation::Left => -1.0,
    };

    match config.orientation {
        AxisOrientation::Bottom => {
            group.marks.push(
                SceneRuleMark {
                    name: "domain".to_string(),
                    x: lo.into(),
                    x2: hi.into(),
                    ..Default::default()
                }
                .into(),
            );
            group.marks.push(
                SceneRuleMark {
                    name: "ticks".to_string(),
                    len: positions.len() as u32,
                    x: positions.clone().into(),
                    x2: positions.into(),
                    y2: lengths.into(),
                    ..Default::default()
                }
                .into(),
            );
            let label_y = MAJOR_TICK + LABEL_PAD;
            let (x, text): (Vec<f32>, Vec<String>) = labeled.into_iter().unzip();
            group.marks.push(
                SceneTextMark {
                    name: "tick-labels".to_string(),
                    len: text.len() as u32,
                    text: text.into(),
                    x: x.into(),
                    y: label_y.into(),
                    align: TextAlign::Center.into(),
                    baseline: TextBaseline::Top.into(),
                    color: BLACK.into(),
                    font_size: label_size.into(),
                    ..Default::default()
                }
                .into(),
            );
            group.marks.push(
                SceneTextMark {
                    name: "axis-title".to_string(),
                    text: title.to_string().into(),
                    x: ((lo + hi) / 2.0).into(),
                    y: (label_y + label_size + TITLE_PAD).into(),
                    align: TextAlign::Center.into(),
                    baseline: TextBaseline::Top.into(),
                    font_size: config.font_size.into(),
                    font_weight: FontWeight::Bold.into(),
                    ..Default::default()
                }
                .into(),
            );
        }
        AxisOrientation::Left | AxisOrientation::Right => {
            group.marks.push(
                SceneRuleMark {
                    name: "domain".to_string(),
                    y: lo.into(),
                    y2: hi.into(),
                    ..Default::default()
                }
                .into(),
            );
            group.marks.push(
                SceneRuleMark {
                    name: "ticks".to_string(),
                    len: positions.len() as u32,
                    y: positions.clone().into(),
                    y2: positions.into(),
                    x2: ScalarOrArray::Array(lengths.iter().map(|l| l * out).collect()),
                    ..Default::default()
                }
                .into(),
            );
            let label_x = (MAJOR_TICK + LABEL_PAD) * out;
            let widest = labeled
                .iter()
                .map(|(_, l)| estimate_text_width(l, label_size))
                .fold(0.0f32, f32::max);
            let (y, text): (Vec<f32>, Vec<String>) = labeled.into_iter().unzip();
            group.marks.push(
                SceneTextMark {
                    name: "tick-labels".to_string(),
                    len: text.len() as u32,
                    text: text.into(),
                    x: label_x.into(),
                    y: y.into(),
                    align: (if out < 0.0 {
                        TextAlign::Right
                    } else {
                        TextAlign::Left
                    })
                    .into(),
                    baseline: TextBaseline::Middle.into(),
                    color: BLACK.into(),
                    font_size: label_size.into(),
                    ..Default::default()
                }
                .into(),
            );
            // rotated so glyph tops face away from the plot
            group.marks.push(
                SceneTextMark {
                    name: "axis-title".to_string(),
                    text: title.to_string().into(),
                    x: (label_x + (widest + TITLE_PAD) * out).into(),
                    y: ((lo + hi) / 2.0).into(),
                    align: TextAlign::Center.into(),
                    baseline: TextBaseline::Bottom.into(),
                    angle: (90.0 * out).into(),
                    font_size: config.font_size.into(),
                    font_weight: FontWeight::Bold.into(),
                    ..Default::default()
                }
                .into(),
            );
        }
    }
    group
}
