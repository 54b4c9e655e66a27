use crate::config::LevelStrategy;
use crate::error::LevelError;

/// Slack added before flooring `range / interval`, so an exact multiple is not lost to rounding.
const COUNT_SLACK: f64 = 1e-9;

/// Upper bound on the levels one run may generate.
pub(crate) const MAX_LEVELS: usize = 10_000;

/// How many levels to generate and how far apart, before strategy shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LevelCount {
    /// A single level at the midpoint of the range.
    Midpoint,
    /// `count` levels on a fixed interval starting at `min`, not necessarily reaching `max`.
    Interval { interval: f64, count: usize },
    /// `count` levels spanning `[min, max]` exactly.
    Span { count: usize },
}

/// Resolves the level count from the requested layer count or the interval.
///
/// `num_layers >= 2` spans the range, `num_layers == 1` is the midpoint, and
/// anything else falls back to interval mode. Counts above [`MAX_LEVELS`] are
/// rejected before anything is allocated.
pub(crate) fn resolve_count(
    min: f64,
    max: f64,
    num_layers: i32,
    interval: f64,
    strategy: LevelStrategy,
) -> Result<LevelCount, LevelError> {
    match num_layers {
        1 => return Ok(LevelCount::Midpoint),
        n if n >= 2 => {
            let count = usize::try_from(n).unwrap_or(usize::MAX);
            return within_limit(count).map(|count| LevelCount::Span { count });
        }
        _ => {}
    }

    if !(interval.is_finite() && interval > 0.0) {
        return Err(LevelError::InvalidInterval(interval));
    }
    let steps = (max - min) / interval;
    if !steps.is_finite() {
        return Err(LevelError::TooManyLevels {
            requested: usize::MAX,
            max: MAX_LEVELS,
        });
    }
    match strategy {
        LevelStrategy::Uniform => {
            let count = float_to_count((steps + COUNT_SLACK).floor()).saturating_add(1);
            within_limit(count).map(|count| LevelCount::Interval { interval, count })
        }
        // Shaped strategies must hit both ends, so round the step count up.
        LevelStrategy::Logarithmic | LevelStrategy::Exponential => {
            let count = float_to_count((steps - COUNT_SLACK).ceil()).max(1).saturating_add(1);
            within_limit(count).map(|count| LevelCount::Span { count })
        }
    }
}

fn within_limit(count: usize) -> Result<usize, LevelError> {
    if count > MAX_LEVELS {
        Err(LevelError::TooManyLevels {
            requested: count,
            max: MAX_LEVELS,
        })
    } else {
        Ok(count)
    }
}

/// Produces raw level values for `count` over `[min, max]` under `strategy`.
pub(crate) fn spaced_values(
    min: f64,
    max: f64,
    count: LevelCount,
    strategy: LevelStrategy,
) -> Vec<f64> {
    match count {
        LevelCount::Midpoint => vec![(min + max) / 2.0],
        LevelCount::Interval { interval, count } => (0..count)
            .map(|i| min + index_to_float(i) * interval)
            .filter(|v| *v <= max)
            .collect(),
        LevelCount::Span { count } => {
            let last = count.saturating_sub(1).max(1);
            (0..count)
                .map(|i| {
                    if i == last {
                        return max;
                    }
                    let t = index_to_float(i) / index_to_float(last);
                    min + shape(t, max - min, strategy) * (max - min)
                })
                .collect()
        }
    }
}

/// Maps a linear parameter `t` in `[0, 1]` onto `[0, 1]` according to the strategy.
fn shape(t: f64, range: f64, strategy: LevelStrategy) -> f64 {
    match strategy {
        LevelStrategy::Uniform => t,
        // Geometric in height above the minimum: each step a constant ratio of the last.
        LevelStrategy::Logarithmic => (t * range.ln_1p()).exp_m1() / range,
        LevelStrategy::Exponential => (t * 2.0).exp_m1() / 2.0_f64.exp_m1(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn index_to_float(i: usize) -> f64 {
    i as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}
