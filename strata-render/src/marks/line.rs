use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::types::Color;

/// A polyline that breaks wherever `defined` is false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneLineMark {
    pub name: String,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub defined: Vec<bool>,
    pub stroke: Color,
    pub stroke_width: f32,
    pub stroke_dash: Option<Vec<f32>>,
    pub zindex: Option<i32>,
}

impl Default for SceneLineMark {
    fn default() -> Self {
        Self {
            name: "line".to_string(),
            x: vec![],
            y: vec![],
            defined: vec![],
            stroke: [0.0, 0.0, 0.0, 1.0],
            stroke_width: 1.0,
            stroke_dash: None,
            zindex: None,
        }
    }
}

impl SceneLineMark {
    /// Runs of consecutive defined points
    pub fn segments(&self) -> Vec<Vec<[f32; 2]>> {
        let mut segments = vec![];
        let mut current = vec![];
        for (x, y, defined) in izip!(&self.x, &self.y, &self.defined) {
            if *defined && x.is_finite() && y.is_finite() {
                current.push([*x, *y]);
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_break_on_undefined() {
        let line = SceneLineMark {
            x: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            y: vec![0.0, 1.0, 2.0, f32::NAN, 4.0],
            defined: vec![true, true, false, true, true],
            ..Default::default()
        };
        assert_eq!(
            line.segments(),
            vec![vec![[0.0, 0.0], [1.0, 1.0]], vec![[4.0, 4.0]]]
        );
    }
}
