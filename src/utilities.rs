// Grid lookup and interpolation helpers

/// Largest `i` with `x[i] <= x_new`, or `None` if `x_new` is below the grid
/// (or not a number). Values past the end give the last index.
pub fn bucket_index(x: &[f64], x_new: f64) -> Option<usize> {
    if x.is_empty() || x_new.is_nan() || x_new < x[0] {
        return None;
    }
    let last = x.len() - 1;
    if x_new >= x[last] {
        return Some(last);
    }
    // invariant: x[low] <= x_new < x[high]
    let mut low = 0usize;
    let mut high = last;
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    Some(low)
}

/// Uniform log10 spacing of a grid, if it has one.
///
/// Returns `(log10 of first point, log10 step)` when every step agrees to
/// within a relative tolerance of 1e-6.
pub fn uniform_log_step(x: &[f64]) -> Option<(f64, f64)> {
    if x.len() < 2 || x[0] <= 0.0 {
        return None;
    }
    let start = x[0].log10();
    let step = x[1].log10() - start;
    if step <= 0.0 {
        return None;
    }
    let uniform = x.windows(2).all(|w| {
        w[0] > 0.0 && ((w[1].log10() - w[0].log10()) - step).abs() <= 1e-6 * step
    });
    uniform.then_some((start, step))
}

/// Bucket lookup on a grid with known uniform log spacing. Corrects the
/// computed index by one step when rounding lands it on the wrong side.
pub fn log_bucket_index(x: &[f64], log_start: f64, log_step: f64, x_new: f64) -> Option<usize> {
    if x.is_empty() || !(x_new >= x[0]) {
        return None;
    }
    let last = x.len() - 1;
    let guess = ((x_new.log10() - log_start) / log_step).floor();
    let mut idx = if guess.is_finite() && guess > 0.0 {
        (guess as usize).min(last)
    } else {
        0
    };
    if x[idx] > x_new && idx > 0 {
        idx -= 1;
    } else if idx < last && x[idx + 1] <= x_new {
        idx += 1;
    }
    Some(idx)
}

/// Linear interpolation that is zero outside `[x[0], x[last]]`.
pub fn interpolate_linear_or_zero(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    match bucket_index(x, x_new) {
        Some(idx) => interpolate_in_bucket(x, y, idx, x_new),
        None => 0.0,
    }
}

/// Interpolate inside bucket `idx` as found by one of the lookups above.
/// The last bucket only covers the final point itself.
pub fn interpolate_in_bucket(x: &[f64], y: &[f64], idx: usize, x_new: f64) -> f64 {
    let last = x.len() - 1;
    if idx >= last {
        return if x_new == x[last] { y[last] } else { 0.0 };
    }
    let (x1, x2) = (x[idx], x[idx + 1]);
    let (y1, y2) = (y[idx], y[idx + 1]);
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}
