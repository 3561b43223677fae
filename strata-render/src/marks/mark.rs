use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::marks::group::SceneGroup;
use crate::marks::line::SceneLineMark;
use crate::marks::rect::SceneRectMark;
use crate::marks::rule::SceneRuleMark;
use crate::marks::text::SceneTextMark;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneMark {
    Rect(SceneRectMark),
    Rule(SceneRuleMark),
    Line(SceneLineMark),
    Text(Arc<SceneTextMark>),
    Group(SceneGroup),
}

impl SceneMark {
    pub fn name(&self) -> &str {
        match self {
            Self::Rect(mark) => &mark.name,
            Self::Rule(mark) => &mark.name,
            Self::Line(mark) => &mark.name,
            Self::Text(mark) => &mark.name,
            Self::Group(group) => &group.name,
        }
    }

    pub fn zindex(&self) -> Option<i32> {
        match self {
            Self::Rect(mark) => mark.zindex,
            Self::Rule(mark) => mark.zindex,
            Self::Line(mark) => mark.zindex,
            Self::Text(mark) => mark.zindex,
            Self::Group(group) => group.zindex,
        }
    }

    pub fn children(&self) -> &[SceneMark] {
        match self {
            Self::Group(group) => &group.marks,
            _ => &[],
        }
    }
}

impl From<SceneRectMark> for SceneMark {
    fn from(mark: SceneRectMark) -> Self {
        Self::Rect(mark)
    }
}

impl From<SceneRuleMark> for SceneMark {
    fn from(mark: SceneRuleMark) -> Self {
        Self::Rule(mark)
    }
}

impl From<SceneLineMark> for SceneMark {
    fn from(mark: SceneLineMark) -> Self {
        Self::Line(mark)
    }
}

impl From<SceneTextMark> for SceneMark {
    fn from(mark: SceneTextMark) -> Self {
        Self::Text(Arc::new(mark))
    }
}

impl From<SceneGroup> for SceneMark {
    fn from(group: SceneGroup) -> Self {
        Self::Group(group)
    }
}
