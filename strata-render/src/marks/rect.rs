use serde::{Deserialize, Serialize};

use crate::types::Color;
use crate::value::ScalarOrArray;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneRectMark {
    pub name: String,
    pub len: u32,
    pub x: ScalarOrArray<f32>,
    pub y: ScalarOrArray<f32>,
    pub width: ScalarOrArray<f32>,
    pub height: ScalarOrArray<f32>,
    pub fill: ScalarOrArray<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub zindex: Option<i32>,
}

impl Default for SceneRectMark {
    fn default() -> Self {
        Self {
            name: "rect".to_string(),
            len: 1,
            x: ScalarOrArray::Scalar(0.0),
            y: ScalarOrArray::Scalar(0.0),
            width: ScalarOrArray::Scalar(0.0),
            height: ScalarOrArray::Scalar(0.0),
            fill: ScalarOrArray::Scalar([0.0, 0.0, 0.0, 1.0]),
            stroke: None,
            stroke_width: 1.0,
            zindex: None,
        }
    }
}

impl SceneRectMark {
    pub fn x_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.x.as_iter(self.len as usize)
    }
    pub fn y_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.y.as_iter(self.len as usize)
    }
    pub fn width_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.width.as_iter(self.len as usize)
    }
    pub fn height_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.height.as_iter(self.len as usize)
    }
    pub fn fill_iter(&self) -> Box<dyn Iterator<Item = &Color> + '_> {
        self.fill.as_iter(self.len as usize)
    }
}
