//! Integer scaling helpers for the position pipeline.
//!
//! Positions are micrometre fixed point in `i32`. Intermediates are widened
//! to `i64`: `i32::MIN * -1 * u16::MAX` still fits comfortably.

/// `raw * sign * numerator / denominator`, truncating toward zero.
///
/// `denominator` must be non-zero; callers only pass validated calibration.
#[inline]
pub fn scale_counts(raw: i32, sign: i8, numerator: u16, denominator: u16) -> i64 {
    debug_assert!(denominator > 0, "scale_counts: zero denominator");
    let product = i64::from(raw) * i64::from(sign) * i64::from(numerator);
    product / i64::from(denominator.max(1))
}

/// Clamp a widened value into the `i32` range.
#[inline]
pub fn saturate_i32(v: i64) -> i32 {
    if v > i64::from(i32::MAX) {
        i32::MAX
    } else if v < i64::from(i32::MIN) {
        i32::MIN
    } else {
        v as i32
    }
}
