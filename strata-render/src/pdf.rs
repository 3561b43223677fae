//! Single page PDF output with the base-14 Helvetica fonts

use std::fmt::Write;

use crate::canvas::{align_shift, draw_scene, Canvas};
use crate::error::StrataRenderError;
use crate::marks::text::TextInstance;
use crate::ps::escape_literal;
use crate::scene_graph::SceneGraph;
use crate::types::{Color, FontWeight};

pub fn scene_to_pdf(scene: &SceneGraph) -> Result<Vec<u8>, StrataRenderError> {
    let mut writer = PdfWriter {
        content: String::new(),
    };
    writeln!(&mut writer.content, "1 0 0 -1 0 {} cm", scene.height)?;
    draw_scene(scene, &mut writer)?;

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> >>",
            scene.width, scene.height
        ),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            writer.content.len(),
            writer.content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        writeln!(&mut pdf, "{} 0 obj\n{object}\nendobj", i + 1)?;
    }
    let xref = pdf.len();
    writeln!(&mut pdf, "xref\n0 {}", objects.len() + 1)?;
    writeln!(&mut pdf, "0000000000 65535 f ")?;
    for offset in offsets {
        writeln!(&mut pdf, "{offset:010} 00000 n ")?;
    }
    writeln!(
        &mut pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF",
        objects.len() + 1
    )?;
    Ok(pdf.into_bytes())
}

struct PdfWriter {
    content: String,
}

fn rgb(color: &Color) -> String {
    format!("{:.4} {:.4} {:.4}", color[0], color[1], color[2])
}

impl Canvas for PdfWriter {
    fn push_clip(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), StrataRenderError> {
        writeln!(&mut self.content, "q {x} {y} {width} {height} re W n")?;
        Ok(())
    }

    fn pop_clip(&mut self) -> Result<(), StrataRenderError> {
        writeln!(&mut self.content, "Q")?;
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
            writeln!(&mut self.content, "{} rg {x} {y} {width} {height} re f", rgb(fill))?;
        }
        if let Some((color, stroke_width)) = stroke {
            writeln!(
                &mut self.content,
                "{} RG {stroke_width} w {x} {y} {width} {height} re S",
                rgb(color)
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
        let dash = dash
            .unwrap_or(&[])
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            &mut self.content,
            "{} RG {stroke_width} w [{dash}] 0 d {x0} {y0} m",
            rgb(stroke)
        )?;
        for [x, y] in rest {
            write!(&mut self.content, " {x} {y} l")?;
        }
        writeln!(&mut self.content, " S")?;
        Ok(())
    }

    fn text(&mut self, text: &TextInstance) -> Result<(), StrataRenderError> {
        if text.text.is_empty() {
            return Ok(());
        }
        let font = match text.font_weight {
            FontWeight::Bold => "F2",
            FontWeight::Normal => "F1",
        };
        let (sin, cos) = text.angle.to_radians().sin_cos();
        // rotation in the y-down frame, then flip so glyphs are upright
        writeln!(
            &mut self.content,
            "q {cos} {sin} {} {cos} {} {} cm 1 0 0 -1 0 0 cm {} rg BT /{font} {} Tf {} {} Td ({}) Tj ET Q",
            -sin,
            text.x,
            text.y,
            rgb(&text.color),
            text.font_size,
            align_shift(text),
            -text.baseline.baseline_shift(text.font_size),
            escape_literal(&text.text)
        )?;
        Ok(())
    }
}
