use serde::{Deserialize, Serialize};

use crate::types::Color;
use crate::value::ScalarOrArray;

/// Straight segments from `(x, y)` to `(x2, y2)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneRuleMark {
    pub name: String,
    pub len: u32,
    pub x: ScalarOrArray<f32>,
    pub y: ScalarOrArray<f32>,
    pub x2: ScalarOrArray<f32>,
    pub y2: ScalarOrArray<f32>,
    pub stroke: Color,
    pub stroke_width: f32,
    pub stroke_dash: Option<Vec<f32>>,
    pub zindex: Option<i32>,
}

impl Default for SceneRuleMark {
    fn default() -> Self {
        Self {
            name: "rule".to_string(),
            len: 1,
            x: ScalarOrArray::Scalar(0.0),
            y: ScalarOrArray::Scalar(0.0),
            x2: ScalarOrArray::Scalar(0.0),
            y2: ScalarOrArray::Scalar(0.0),
            stroke: [0.0, 0.0, 0.0, 1.0],
            stroke_width: 1.0,
            stroke_dash: None,
            zindex: None,
        }
    }
}

impl SceneRuleMark {
    pub fn x_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.x.as_iter(self.len as usize)
    }
    pub fn y_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.y.as_iter(self.len as usize)
    }
    pub fn x2_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.x2.as_iter(self.len as usize)
    }
    pub fn y2_iter(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        self.y2.as_iter(self.len as usize)
    }
}
