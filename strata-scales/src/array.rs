//! Nice tick values over a numeric interval

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Roughly `count` round values covering `[start, stop]`, in the order of the bounds
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) {
        return vec![];
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if !(i2 >= i1) {
        return vec![];
    }

    let n = (i2 - i1 + 1.0) as usize;
    let value = |k: f64| if inc < 0.0 { k / -inc } else { k * inc };
    if reverse {
        (0..n).map(|i| value(i2 - i as f64)).collect()
    } else {
        (0..n).map(|i| value(i1 + i as f64)).collect()
    }
}

/// Integer tick bounds plus the increment; a negative increment means the
/// ticks are `k / -inc`, which keeps small steps exact.
fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = step_factor(error);

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        i1 = (start * scale).round();
        i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        inc = -scale;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

fn step_factor(error: f64) -> f64 {
    if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    }
}

/// Distance between adjacent ticks of [`ticks`] for the same arguments
pub fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    if !(count > 0.0) {
        return f64::NAN;
    }
    if start == stop {
        return 0.0;
    }
    let step = ((stop - start) / count).abs();
    if step == 0.0 || !step.is_finite() {
        return f64::NAN;
    }
    let power = step.log10().floor();
    10f64.powf(power) * step_factor(step / 10f64.powf(power))
}
