use serde::{Deserialize, Serialize};

use crate::types::{Color, FontWeight, TextAlign, TextBaseline};
use crate::value::ScalarOrArray;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneTextMark {
    pub name: String,
    pub len: u32,
    pub text: ScalarOrArray<String>,
    pub x: ScalarOrArray<f32>,
    pub y: ScalarOrArray<f32>,
    pub align: ScalarOrArray<TextAlign>,
    pub baseline: ScalarOrArray<TextBaseline>,
    /// Clockwise rotation in degrees about the anchor
    pub angle: ScalarOrArray<f32>,
    pub color: ScalarOrArray<Color>,
    pub font_size: ScalarOrArray<f32>,
    pub font_weight: ScalarOrArray<FontWeight>,
    pub zindex: Option<i32>,
}

impl Default for SceneTextMark {
    fn default() -> Self {
        Self {
            name: "text".to_string(),
            len: 1,
            text: String::new().into(),
            x: ScalarOrArray::Scalar(0.0),
            y: ScalarOrArray::Scalar(0.0),
            align: TextAlign::default().into(),
            baseline: TextBaseline::default().into(),
            angle: ScalarOrArray::Scalar(0.0),
            color: ScalarOrArray::Scalar([0.0, 0.0, 0.0, 1.0]),
            font_size: ScalarOrArray::Scalar(12.0),
            font_weight: FontWeight::default().into(),
            zindex: None,
        }
    }
}

impl SceneTextMark {
    pub fn text_iter(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        self.text.as_iter(self.len as usize)
    }
    pub fn x_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.x.as_iter(self.len as usize)
    }
    pub fn y_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.y.as_iter(self.len as usize)
    }
    pub fn align_iter(&self) -> Box<dyn Iterator<Item = &TextAlign> + '_> {
        self.align.as_iter(self.len as usize)
    }
    pub fn baseline_iter(&self) -> Box<dyn Iterator<Item = &TextBaseline> + '_> {
        self.baseline.as_iter(self.len as usize)
    }
    pub fn angle_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.angle.as_iter(self.len as usize)
    }
    pub fn color_iter(&self) -> Box<dyn Iterator<Item = &Color> + '_> {
        self.color.as_iter(self.len as usize)
    }
    pub fn font_size_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.font_size.as_iter(self.len as usize)
    }
    pub fn font_weight_iter(&self) -> Box<dyn Iterator<Item = &FontWeight> + '_> {
        self.font_weight.as_iter(self.len as usize)
    }

    /// One positioned string per instance, in the order they are drawn
    pub fn instances(&self) -> Vec<TextInstance> {
        itertools::izip!(
            self.text_iter(),
            self.x_iter(),
            self.y_iter(),
            self.align_iter(),
            self.baseline_iter(),
            self.angle_iter(),
            self.color_iter(),
            self.font_size_iter(),
            self.font_weight_iter()
        )
        .map(
            |(text, x, y, align, baseline, angle, color, font_size, font_weight)| TextInstance {
                text: text.clone(),
                x: *x,
                y: *y,
                align: *align,
                baseline: *baseline,
                angle: *angle,
                color: *color,
                font_size: *font_size,
                font_weight: *font_weight,
            },
        )
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInstance {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub angle: f32,
    pub color: Color,
    pub font_size: f32,
    pub font_weight: FontWeight,
}
