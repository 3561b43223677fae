use serde::{Deserialize, Serialize};

use crate::marks::mark::SceneMark;
use crate::marks::text::SceneTextMark;

/// A figure: marks in pixel coordinates with y growing downward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub marks: Vec<SceneMark>,
    pub width: f32,
    pub height: f32,
    pub origin: [f32; 2],
}

impl SceneGraph {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            marks: vec![],
            width,
            height,
            origin: [0.0, 0.0],
        }
    }

    pub fn children(&self) -> &[SceneMark] {
        &self.marks
    }

    /// Every mark in draw order, groups included, depth first
    pub fn walk(&self) -> Vec<&SceneMark> {
        fn visit<'a>(marks: &'a [SceneMark], out: &mut Vec<&'a SceneMark>) {
            for mark in marks {
                out.push(mark);
                visit(mark.children(), out);
            }
        }
        let mut out = vec![];
        visit(&self.marks, &mut out);
        out
    }

    /// All strings drawn by text marks, handy for checking labels
    pub fn texts(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter_map(|mark| match mark {
                SceneMark::Text(text) => Some(text.as_ref()),
                _ => None,
            })
            .flat_map(|text: &SceneTextMark| text.text_iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&SceneMark> {
        self.walk().into_iter().find(|mark| mark.name() == name)
    }
}
