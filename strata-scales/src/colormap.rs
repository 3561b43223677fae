use std::fmt::Debug;

use palette::{IntoColor, Laba, Mix, Srgba};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::numeric::{ContinuousScale, NumericScale};

/// Named colormaps for phase plots and colorbars
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Colormap {
    #[default]
    Viridis,
    Magma,
    Inferno,
    Plasma,
    Cividis,
    #[strum(serialize = "gray", serialize = "grey", serialize = "greys")]
    Gray,
    Coolwarm,
}

impl Colormap {
    /// Evenly spaced control colors from low to high
    pub fn stops(&self) -> &'static [u32] {
        match self {
            Colormap::Viridis => &[
                0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58,
                0xb5de2b, 0xfde725,
            ],
            Colormap::Magma => &[
                0x000004, 0x180f3d, 0x440f76, 0x721f81, 0x9e2f7f, 0xcd4071, 0xf1605d, 0xfd9668,
                0xfeca8d, 0xfcfdbf,
            ],
            Colormap::Inferno => &[
                0x000004, 0x160b39, 0x420a68, 0x6a176e, 0x932667, 0xbc3754, 0xdd513a, 0xf37819,
                0xfca50a, 0xf6d746, 0xfcffa4,
            ],
            Colormap::Plasma => &[
                0x0d0887, 0x41049d, 0x6a00a8, 0x8f0da4, 0xb12a90, 0xcc4778, 0xe16462, 0xf2844b,
                0xfca636, 0xfcce25, 0xf0f921,
            ],
            Colormap::Cividis => &[
                0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8779, 0xa69d75, 0xc4b56c,
                0xe4cf5b, 0xfee838,
            ],
            Colormap::Gray => &[0x000000, 0xffffff],
            Colormap::Coolwarm => &[
                0x3b4cc0, 0x6f92f3, 0xaac7fd, 0xdddddd, 0xf7b89c, 0xe7745b, 0xb40426,
            ],
        }
    }

    fn laba_stops(&self) -> Vec<Laba> {
        self.stops()
            .iter()
            .map(|rgb| hex_to_srgba(*rgb).into_color())
            .collect()
    }

    /// Color at fraction `t` of the map, interpolated in Lab space
    pub fn sample(&self, t: f64) -> [f32; 4] {
        interpolate_color(&self.laba_stops(), &[t as f32])[0]
    }

    /// Colors at each fraction of `ts`
    pub fn sample_many(&self, ts: &[f64]) -> Vec<[f32; 4]> {
        let ts: Vec<f32> = ts.iter().map(|t| *t as f32).collect();
        interpolate_color(&self.laba_stops(), &ts)
    }
}

fn hex_to_srgba(rgb: u32) -> Srgba {
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    Srgba::new(channel(16), channel(8), channel(0), 1.0)
}

/// Color spaces that can be mixed for interpolation
pub trait ColorSpace:
    Mix<Scalar = f32> + Copy + IntoColor<Srgba> + Debug + Send + Sync + 'static
{
}

impl<T: Mix<Scalar = f32> + Copy + IntoColor<Srgba> + Debug + Send + Sync + 'static> ColorSpace
    for T
{
}

/// Interpolate over evenly spaced colors at normalized positions
fn interpolate_color<C: ColorSpace>(colors: &[C], values: &[f32]) -> Vec<[f32; 4]> {
    let scale_factor = (colors.len() - 1) as f32;
    values
        .iter()
        .map(|v| {
            let continuous_index = (v * scale_factor).clamp(0.0, scale_factor);
            let lower_index = continuous_index.floor() as usize;
            let upper_index = continuous_index.ceil() as usize;
            let srgba: Srgba = if lower_index == upper_index {
                colors[lower_index].into_color()
            } else {
                let t = continuous_index - lower_index as f32;
                colors[lower_index].mix(colors[upper_index], t).into_color()
            };
            let (r, g, b, a) = srgba.into_components();
            [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), a]
        })
        .collect()
}

/// Maps data values to colors through a linear or log normalization
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScale {
    scale: NumericScale,
    colormap: Colormap,
    /// Color of values with no position on the scale (NaN, or non-positive on log)
    pub bad_color: [f32; 4],
}

impl ColorScale {
    pub fn new(domain: (f64, f64), log: bool, colormap: Colormap) -> Self {
        Self {
            scale: NumericScale::new(domain, (0.0, 1.0), log).with_clamp(true),
            colormap,
            bad_color: [0.0, 0.0, 0.0, 0.0],
        }
    }

    pub fn scale(&self) -> &NumericScale {
        &self.scale
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    pub fn color(&self, value: f64) -> [f32; 4] {
        if value.is_nan() || (self.scale.is_log() && value <= 0.0) {
            return self.bad_color;
        }
        self.colormap.sample(self.scale.normalize(value))
    }

    pub fn colors(&self, values: &[f64]) -> Vec<[f32; 4]> {
        let stops = self.colormap.laba_stops();
        values
            .iter()
            .map(|&v| {
                if v.is_nan() || (self.scale.is_log() && v <= 0.0) {
                    self.bad_color
                } else {
                    interpolate_color(&stops, &[self.scale.normalize(v) as f32])[0]
                }
            })
            .collect()
    }
}
