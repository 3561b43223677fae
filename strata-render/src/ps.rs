//! PostScript and Encapsulated PostScript output

use std::fmt::Write;

use crate::canvas::{align_shift, draw_scene, Canvas};
use crate::error::StrataRenderError;
use crate::marks::text::TextInstance;
use crate::scene_graph::SceneGraph;
use crate::types::{Color, FontWeight};

pub fn scene_to_ps(scene: &SceneGraph, encapsulated: bool) -> Result<String, StrataRenderError> {
    let mut writer = PsWriter { ps: String::new() };
    let (width, height) = (scene.width.ceil(), scene.height.ceil());
    if encapsulated {
        writeln!(&mut writer.ps, "%!PS-Adobe-3.0 EPSF-3.0")?;
    } else {
        writeln!(&mut writer.ps, "%!PS-Adobe-3.0")?;
        writeln!(&mut writer.ps, "%%Pages: 1")?;
    }
    writeln!(&mut writer.ps, "%%BoundingBox: 0 0 {width} {height}")?;
    writeln!(&mut writer.ps, "%%Creator: strata")?;
    writeln!(&mut writer.ps, "%%EndComments")?;
    if !encapsulated {
        writeln!(&mut writer.ps, "<< /PageSize [{width} {height}] >> setpagedevice")?;
        writeln!(&mut writer.ps, "%%Page: 1 1")?;
    }
    // figure coordinates grow downward
    writeln!(&mut writer.ps, "gsave 0 {} translate 1 -1 scale", scene.height)?;
    draw_scene(scene, &mut writer)?;
    writeln!(&mut writer.ps, "grestore")?;
    writeln!(&mut writer.ps, "showpage")?;
    writeln!(&mut writer.ps, "%%EOF")?;
    Ok(writer.ps)
}

struct PsWriter {
    ps: String,
}

impl PsWriter {
    fn set_color(&mut self, color: &Color) -> Result<(), StrataRenderError> {
        writeln!(
            &mut self.ps,
            "{:.4} {:.4} {:.4} setrgbcolor",
            color[0], color[1], color[2]
        )?;
        Ok(())
    }
}

/// Escape a string for a PostScript or PDF literal; non-ASCII becomes `?`
pub(crate) fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

impl Canvas for PsWriter {
    fn push_clip(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), StrataRenderError> {
        writeln!(&mut self.ps, "gsave {x} {y} {width} {height} rectclip")?;
        Ok(())
    }

    fn pop_clip(&mut self) -> Result<(), StrataRenderError> {
        writeln!(&mut self.ps, "grestore")?;
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
        if fill[3] > 0.0 {
            self.set_color(fill)?;
            writeln!(&mut self.ps, "{x} {y} {width} {height} rectfill")?;
        }
        if let Some((color, stroke_width)) = stroke {
            self.set_color(color)?;
            writeln!(
                &mut self.ps,
                "{stroke_width} setlinewidth {x} {y} {width} {height} rectstroke"
            )?;
        }
        Ok(())
    }

    fn polyline(
        &mut self,
        points: &[[f32; 2]],
        stroke: &Color,
        stroke_width: f32,
        dash: Option<&[f32]>,
    ) -> Result<(), StrataRenderError> {
        let Some(([x0, y0], rest)) = points.split_first() else {
            return Ok(());
        };
        self.set_color(stroke)?;
        let dash = dash
            .unwrap_or(&[])
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(&mut self.ps, "{stroke_width} setlinewidth [{dash}] 0 setdash")?;
        write!(&mut self.ps, "newpath {x0} {y0} moveto")?;
        for [x, y] in rest {
            write!(&mut self.ps, " {x} {y} lineto")?;
        }
        writeln!(&mut self.ps, " stroke")?;
        Ok(())
    }

    fn text(&mut self, text: &TextInstance) -> Result<(), StrataRenderError> {
        if text.text.is_empty() {
            return Ok(());
        }
        let font = match text.font_weight {
            FontWeight::Bold => "Helvetica-Bold",
            FontWeight::Normal => "Helvetica",
        };
        self.set_color(&text.color)?;
        // local frame is y-down, flip back so glyphs are upright
        writeln!(
            &mut self.ps,
            "gsave {} {} translate {} rotate 1 -1 scale /{font} findfont {} scalefont setfont {} {} moveto ({}) show grestore",
            text.x,
            text.y,
            text.angle,
            text.font_size,
            align_shift(text),
            -text.baseline.baseline_shift(text.font_size),
            escape_literal(&text.text)
        )?;
        Ok(())
    }
}
