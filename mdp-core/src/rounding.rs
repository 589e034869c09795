//! Round-half-up fixed-point conversion used for every percentage field this
//! provider emits.

/// `floor(x + 0.5)`. Rounds ties away from zero for positive `x`; callers in
/// this crate never pass negatives, since percentage changes are rounded
/// after their sign is already baked into the float.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// The mantissa of `x` in units of 10⁻⁶, i.e. `round_half_up(x * 1e6)`.
pub fn mantissa(x: f64) -> i64 {
    round_half_up(x * 1_000_000.0) as i64
}

/// `x` rounded to 6 decimal places using round-half-up.
pub fn round6(x: f64) -> f64 {
    mantissa(x) as f64 / 1_000_000.0
}
