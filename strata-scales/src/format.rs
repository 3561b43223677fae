//! Tick label text

use crate::numeric::log::is_decade;
use crate::numeric::{ContinuousScale, NumericScale};

const SCIENTIFIC_ABOVE: f64 = 1e5;
const SCIENTIFIC_BELOW: f64 = 1e-3;

/// Label for a tick on a linear axis whose ticks are `step` apart
pub fn format_linear(value: f64, step: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value.is_finite() {
            "0".to_string()
        } else {
            value.to_string()
        };
    }
    let step = if step > 0.0 && step.is_finite() {
        step
    } else {
        value.abs()
    };
    let magnitude = value.abs();
    if !(SCIENTIFIC_BELOW..SCIENTIFIC_ABOVE).contains(&magnitude) {
        let digits = (floor_log10(magnitude) - floor_log10(step)).clamp(0.0, 6.0) as usize;
        return format!("{:.*e}", digits, value);
    }
    let decimals = (-floor_log10(step)).clamp(0.0, 12.0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        "0".to_string()
    } else {
        text
    }
}

// Tolerates the rounding in log10 of inexact powers of ten
fn floor_log10(value: f64) -> f64 {
    (value.log10() + 1e-9).floor()
}

/// Label for a tick on a log axis. Decades read `1e-24` unless they are
/// close to one; values between decades get no label.
pub fn format_log(value: f64) -> Option<String> {
    if !is_decade(value) {
        return None;
    }
    let exponent = value.log10().round() as i32;
    Some(if (-3..=4).contains(&exponent) {
        let decimals = (-exponent).max(0) as usize;
        format!("{:.*}", decimals, 10f64.powi(exponent))
    } else {
        format!("1e{exponent}")
    })
}

/// Ticks of `scale` paired with their labels; unlabeled minor ticks carry `None`
pub fn tick_labels(scale: &NumericScale, count: Option<f64>) -> Vec<(f64, Option<String>)> {
    let ticks = scale.ticks(count);
    match scale.tick_step(count) {
        Some(step) => ticks
            .into_iter()
            .map(|t| (t, Some(format_linear(t, step))))
            .collect(),
        None if scale.is_log() => {
            let labeled = ticks.iter().filter(|t| is_decade(**t)).count();
            ticks
                .into_iter()
                .map(|t| {
                    // too few decades in view to orient the reader, label the multiples too
                    let label = format_log(t).or_else(|| {
                        (labeled < 2).then(|| format_linear(t, t / 10.0))
                    });
                    (t, label)
                })
                .collect()
        }
        None => ticks.into_iter().map(|t| (t, Some(t.to_string()))).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.1, "0")]
    #[case(0.30000000000000004, 0.1, "0.3")]
    #[case(0.45, 0.05, "0.45")]
    #[case(20.0, 10.0, "20")]
    #[case(-1.5, 0.5, "-1.5")]
    #[case(250000.0, 50000.0, "2.5e5")]
    #[case(2e-24, 1e-24, "2e-24")]
    #[case(1.5e-24, 5e-25, "1.5e-24")]
    fn test_format_linear(#[case] value: f64, #[case] step: f64, #[case] expected: &str) {
        assert_eq!(format_linear(value, step), expected);
    }

    #[rstest]
    #[case(1e-24, Some("1e-24"))]
    #[case(0.001, Some("0.001"))]
    #[case(1.0, Some("1"))]
    #[case(1000.0, Some("1000"))]
    #[case(1e5, Some("1e5"))]
    #[case(3e5, None)]
    fn test_format_log(#[case] value: f64, #[case] expected: Option<&str>) {
        assert_eq!(format_log(value).as_deref(), expected);
    }

    #[test]
    fn test_tick_labels_log() {
        let scale = NumericScale::new((1.0, 100.0), (0.0, 1.0), true);
        let labels = tick_labels(&scale, None);
        let labeled: Vec<_> = labels.iter().filter_map(|(_, l)| l.clone()).collect();
        assert_eq!(labeled, vec!["1", "10", "100"]);
    }

    #[test]
    fn test_tick_labels_linear() {
        let scale = NumericScale::new((0.4, 0.6), (0.0, 1.0), false);
        let labels = tick_labels(&scale, Some(5.0));
        let labeled: Vec<_> = labels.iter().filter_map(|(_, l)| l.clone()).collect();
        assert_eq!(labeled, vec!["0.40", "0.45", "0.50", "0.55", "0.60"]);
    }
}
