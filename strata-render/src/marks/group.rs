use serde::{Deserialize, Serialize};

use crate::marks::mark::SceneMark;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Clip {
    #[default]
    None,
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Marks drawn relative to `origin`, optionally clipped to a rectangle in
/// the group's own coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneGroup {
    pub name: String,
    pub origin: [f32; 2],
    pub clip: Clip,
    pub marks: Vec<SceneMark>,
    pub zindex: Option<i32>,
}
