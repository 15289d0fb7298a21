//! House Edge and Payout Math
//!
//! Graduated house edge: flat 1% up to target 50, then +0.2% per unit.
//! The payout multiplier is the fair multiplier `100 / target` scaled
//! down by `1 - edge`.
//!
//! Every function here is total: targets outside `[1, 99]` are clamped
//! into range first. Use `game::bet::Target` to reject them instead.

/// Minimum commission applied to every target.
pub const BASE_EDGE: f64 = 0.01;

/// Target above which the edge starts climbing.
pub const EDGE_PIVOT: u8 = 50;

/// Extra edge per target unit above the pivot.
pub const EDGE_SLOPE: f64 = 0.002;

/// Lowest accepted target.
pub const MIN_TARGET: u8 = 1;

/// Highest accepted target.
pub const MAX_TARGET: u8 = 99;

/// Clamp a raw target into `[MIN_TARGET, MAX_TARGET]`.
#[inline]
pub fn clamp_target(target: u8) -> u8 {
    target.clamp(MIN_TARGET, MAX_TARGET)
}

/// House edge fraction for a target (clamped to `[1, 99]`).
#[inline]
pub fn house_edge(target: u8) -> f64 {
    let target = clamp_target(target);
    let extra = if target > EDGE_PIVOT {
        (target - EDGE_PIVOT) as f64 * EDGE_SLOPE
    } else {
        0.0
    };
    BASE_EDGE + extra
}

/// Payout multiplier applied to a winning wager.
///
/// Falls below 1.0 near target 99 (a winning bet returns less than staked).
#[inline]
pub fn payout_multiplier(target: u8) -> f64 {
    let target = clamp_target(target);
    (100.0 / target as f64) * (1.0 - house_edge(target))
}

/// Payout for a winning wager, rounded to cents (target clamped).
pub fn payout(wager: f64, target: u8) -> f64 {
    round_cents(wager * payout_multiplier(target))
}

/// Round to two decimals, halves away from zero.
#[inline]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Long-run return to player for a target.
#[inline]
pub fn theoretical_rtp(target: u8) -> f64 {
    1.0 - house_edge(target)
}

/// Probability that a roll lands at or under the target.
#[inline]
pub fn win_probability(target: u8) -> f64 {
    clamp_target(target) as f64 / 100.0
}
