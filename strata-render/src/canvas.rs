//! Scene traversal shared by the vector encoders

use itertools::izip;

use crate::error::StrataRenderError;
use crate::marks::group::Clip;
use crate::marks::mark::SceneMark;
use crate::marks::text::TextInstance;
use crate::scene_graph::SceneGraph;
use crate::types::Color;

/// Drawing primitives in absolute figure coordinates (y down)
pub(crate) trait Canvas {
    fn push_clip(&mut self, x: f32, y: f32, width: f32, height: f32)
        -> Result<(), StrataRenderError>;

    fn pop_clip(&mut self) -> Result<(), StrataRenderError>;

    fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: &Color,
        stroke: Option<(&Color, f32)>,
    ) -> Result<(), StrataRenderError>;

    fn polyline(
        &mut self,
        points: &[[f32; 2]],
        stroke: &Color,
        stroke_width: f32,
        dash: Option<&[f32]>,
    ) -> Result<(), StrataRenderError>;

    fn text(&mut self, text: &TextInstance) -> Result<(), StrataRenderError>;
}

pub(crate) fn draw_scene<C: Canvas>(
    scene: &SceneGraph,
    canvas: &mut C,
) -> Result<(), StrataRenderError> {
    draw_marks(&scene.marks, scene.origin, canvas)
}

fn draw_marks<C: Canvas>(
    marks: &[SceneMark],
    origin: [f32; 2],
    canvas: &mut C,
) -> Result<(), StrataRenderError> {
    let mut ordered: Vec<&SceneMark> = marks.iter().collect();
    ordered.sort_by_key(|mark| mark.zindex().unwrap_or(0));

    for mark in ordered {
        match mark {
            SceneMark::Rect(rect) => {
                for (x, y, width, height, fill) in izip!(
                    rect.x_iter(),
                    rect.y_iter(),
                    rect.width_iter(),
                    rect.height_iter(),
                    rect.fill_iter()
                ) {
                    // normalize negative extents so every encoder sees x <= x + width
                    let (x, width) = if *width < 0.0 { (x + width, -width) } else { (*x, *width) };
                    let (y, height) = if *height < 0.0 {
                        (y + height, -height)
                    } else {
                        (*y, *height)
                    };
                    canvas.rect(
                        origin[0] + x,
                        origin[1] + y,
                        width,
                        height,
                        fill,
                        rect.stroke.as_ref().map(|s| (s, rect.stroke_width)),
                    )?;
                }
            }
            SceneMark::Rule(rule) => {
                for (x, y, x2, y2) in
                    izip!(rule.x_iter(), rule.y_iter(), rule.x2_iter(), rule.y2_iter())
                {
                    canvas.polyline(
                        &[
                            [origin[0] + x, origin[1] + y],
                            [origin[0] + x2, origin[1] + y2],
                        ],
                        &rule.stroke,
                        rule.stroke_width,
                        rule.stroke_dash.as_deref(),
                    )?;
                }
            }
            SceneMark::Line(line) => {
                for segment in line.segments() {
                    let points: Vec<[f32; 2]> = segment
                        .iter()
                        .map(|[x, y]| [origin[0] + x, origin[1] + y])
                        .collect();
                    canvas.polyline(
                        &points,
                        &line.stroke,
                        line.stroke_width,
                        line.stroke_dash.as_deref(),
                    )?;
                }
            }
            SceneMark::Text(text) => {
                for mut instance in text.instances() {
                    instance.x += origin[0];
                    instance.y += origin[1];
                    canvas.text(&instance)?;
                }
            }
            SceneMark::Group(group) => {
                let group_origin = [origin[0] + group.origin[0], origin[1] + group.origin[1]];
                let clipped = match group.clip {
                    Clip::Rect {
                        x,
                        y,
                        width,
                        height,
                    } => {
                        canvas.push_clip(group_origin[0] + x, group_origin[1] + y, width, height)?;
                        true
                    }
                    Clip::None => false,
                };
                draw_marks(&group.marks, group_origin, canvas)?;
                if clipped {
                    canvas.pop_clip()?;
                }
            }
        }
    }
    Ok(())
}

/// Horizontal offset from the anchor to the left edge of the text
pub(crate) fn align_shift(text: &TextInstance) -> f32 {
    -text.align.anchor_fraction() * crate::types::estimate_text_width(&text.text, text.font_size)
}
