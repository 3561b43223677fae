use serde::{Deserialize, Serialize};

pub type Color = [f32; 4];

pub const BLACK: Color = [0.0, 0.0, 0.0, 1.0];
pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
pub const TRANSPARENT: Color = [0.0, 0.0, 0.0, 0.0];

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Fraction of the text width that lies left of the anchor
    pub fn anchor_fraction(&self) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => 0.5,
            TextAlign::Right => 1.0,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Top,
    Middle,
    Bottom,
}

impl TextBaseline {
    /// Downward shift from the anchor to the alphabetic baseline
    pub fn baseline_shift(&self, font_size: f32) -> f32 {
        match self {
            TextBaseline::Alphabetic => 0.0,
            TextBaseline::Top => 0.8 * font_size,
            TextBaseline::Middle => 0.35 * font_size,
            TextBaseline::Bottom => -0.2 * font_size,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Approximate advance width of `text` in the sans-serif face used by every encoder
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| match c {
            'i' | 'l' | 'j' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | ' ' => 0.36,
            'm' | 'w' | 'M' | 'W' => 0.86,
            c if c.is_ascii_uppercase() => 0.68,
            _ => 0.56,
        })
        .sum::<f32>()
        * font_size
}

/// Channels as 0..=255 integers, alpha dropped
pub fn to_rgb8(color: &Color) -> [u8; 3] {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color[0]), channel(color[1]), channel(color[2])]
}
