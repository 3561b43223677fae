use strata_render::marks::group::SceneGroup;
use strata_render::marks::line::SceneLineMark;
use strata_render::marks::rect::SceneRectMark;
use strata_render::marks::text::SceneTextMark;
use strata_render::types::{estimate_text_width, TextBaseline, BLACK, WHITE};

use crate::state::LineStyle;

const SWATCH_WIDTH: f32 = 20.0;
const PADDING: f32 = 6.0;

/// Legend box listing each labeled line with a sample of its stroke.
/// `anchor` is the top-right corner of the box.
pub fn make_line_legend_marks(
    entries: &[(String, LineStyle)],
    anchor: [f32; 2],
    font_size: f32,
) -> SceneGroup {
    let row_height = font_size * 1.4;
    let text_width = entries
        .iter()
        .map(|(label, _)| estimate_text_width(label, font_size))
        .fold(0.0f32, f32::max);
    let width = PADDING * 3.0 + SWATCH_WIDTH + text_width;
    let height = PADDING * 2.0 + row_height * entries.len() as f32;

    let mut marks = vec![SceneRectMark {
        name: "legend-background".to_string(),
        width: width.into(),
        height: height.into(),
        fill: [WHITE[0], WHITE[1], WHITE[2], 0.8].into(),
        stroke: Some([0.8, 0.8, 0.8, 1.0]),
        ..Default::default()
    }
    .into()];

    for (i, (_, style)) in entries.iter().enumerate() {
        let y = PADDING + row_height * (i as f32 + 0.5);
        marks.push(
            SceneLineMark {
                name: format!("legend-swatch-{i}"),
                x: vec![PADDING, PADDING + SWATCH_WIDTH],
                y: vec![y, y],
                defined: vec![true, true],
                stroke: style.color,
                stroke_width: style.width,
                stroke_dash: style.dash.clone(),
                ..Default::default()
            }
            .into(),
        );
    }

    let labels: Vec<String> = entries.iter().map(|(label, _)| label.clone()).collect();
    marks.push(
        SceneTextMark {
            name: "legend-labels".to_string(),
            len: labels.len() as u32,
            text: labels.into(),
            x: (PADDING * 2.0 + SWATCH_WIDTH).into(),
            y: (0..entries.len())
                .map(|i| PADDING + row_height * (i as f32 + 0.5))
                .collect::<Vec<_>>()
                .into(),
            baseline: TextBaseline::Middle.into(),
            color: BLACK.into(),
            font_size: font_size.into(),
            ..Default::default()
        }
        .into(),
    );

    SceneGroup {
        name: "legend".to_string(),
        origin: [anchor[0] - width, anchor[1]],
        marks,
        zindex: Some(1),
        ..Default::default()
    }
}
