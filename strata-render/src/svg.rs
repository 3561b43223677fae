use std::fmt::Write;

use crate::canvas::{align_shift, draw_scene, Canvas};
use crate::error::StrataRenderError;
use crate::marks::text::TextInstance;
use crate::scene_graph::SceneGraph;
use crate::types::{to_rgb8, Color, FontWeight};

pub const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

/// Serialize a scene to a standalone SVG document
pub fn scene_to_svg(scene: &SceneGraph) -> Result<String, StrataRenderError> {
    let mut writer = SvgWriter {
        svg: String::new(),
        next_clip: 0,
    };
    writeln!(
        &mut writer.svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        scene.width, scene.height, scene.width, scene.height
    )?;
    draw_scene(scene, &mut writer)?;
    writeln!(&mut writer.svg, "</svg>")?;
    Ok(writer.svg)
}

struct SvgWriter {
    svg: String,
    next_clip: usize,
}

fn paint(attr: &str, color: &Color) -> String {
    let [r, g, b] = to_rgb8(color);
    if color[3] < 1.0 {
        format!(r#"{attr}="rgb({r},{g},{b})" {attr}-opacity="{}""#, color[3])
    } else {
        format!(r#"{attr}="rgb({r},{g},{b})""#)
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl Canvas for SvgWriter {
    fn push_clip(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), StrataRenderError> {
        let id = format!("clip{}", self.next_clip);
        self.next_clip += 1;
        writeln!(
            &mut self.svg,
            r#"  <clipPath id="{id}"><rect x="{x}" y="{y}" width="{width}" height="{height}"/></clipPath>"#
        )?;
        writeln!(&mut self.svg, r#"  <g clip-path="url(#{id})">"#)?;
        Ok(())
    }

    fn pop_clip(&mut self) -> Result<(), StrataRenderError> {
        writeln!(&mut self.svg, "  </g>")?;
        Ok(())
    }

    fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: &Color,
        stroke: Option<(&Color, f32)>,
    ) -> Result<(), StrataRenderError> {
        let stroke = match stroke {
            Some((color, width)) => format!(r#" {} stroke-width="{width}""#, paint("stroke", color)),
            None => String::new(),
        };
        writeln!(
            &mut self.svg,
            r#"  <rect x="{x}" y="{y}" width="{width}" height="{height}" {}{stroke}/>"#,
            paint("fill", fill)
        )?;
        Ok(())
    }

    fn polyline(
        &mut self,
        points: &[[f32; 2]],
        stroke: &Color,
        stroke_width: f32,
        dash: Option<&[f32]>,
    ) -> Result<(), StrataRenderError> {
        let points = points
            .iter()
            .map(|[x, y]| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(" ");
        let dash = match dash {
            Some(dash) if !dash.is_empty() => format!(
                r#" stroke-dasharray="{}""#,
                dash.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",")
            ),
            _ => String::new(),
        };
        writeln!(
            &mut self.svg,
            r#"  <polyline points="{points}" fill="none" {} stroke-width="{stroke_width}"{dash}/>"#,
            paint("stroke", stroke)
        )?;
        Ok(())
    }

    fn text(&mut self, text: &TextInstance) -> Result<(), StrataRenderError> {
        if text.text.is_empty() {
            return Ok(());
        }
        let weight = match text.font_weight {
            FontWeight::Bold => r#" font-weight="bold""#,
            FontWeight::Normal => "",
        };
        // offsets are applied in the rotated frame so rotated labels stay centered
        writeln!(
            &mut self.svg,
            r#"  <text transform="translate({},{}) rotate({})" x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}"{weight} {}>{}</text>"#,
            text.x,
            text.y,
            text.angle,
            align_shift(text),
            text.baseline.baseline_shift(text.font_size),
            text.font_size,
            paint("fill", &text.color),
            escape_xml(&text.text)
        )?;
        Ok(())
    }
}
