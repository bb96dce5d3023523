use dro_core::{Direction, Outcome, PositionModel, Rejection};
use proptest::prelude::*;

fn expected(raw: i32, sign: i64, n: u16, d: u16) -> i32 {
    let v = i64::from(raw) * sign * i64::from(n) / i64::from(d);
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

proptest! {
    #[test]
    fn update_matches_formula(raw in any::<i32>(), n in 1u16.., d in 1u16.., reversed in any::<bool>()) {
        let mut m = PositionModel::with_scale(n, d);
        if reversed {
            m.toggle_direction();
        }
        let sign = if reversed { -1 } else { 1 };
        prop_assert_eq!(m.update(raw), expected(raw, sign, n, d));
    }

    #[test]
    fn update_is_idempotent(raw in any::<i32>(), n in 1u16.., d in 1u16..) {
        let mut m = PositionModel::with_scale(n, d);
        let first = m.update(raw);
        let snapshot = m.clone();
        prop_assert_eq!(m.update(raw), first);
        prop_assert_eq!(m, snapshot);
    }

    #[test]
    fn set_position_anchors_current_count(
        raw in any::<i32>(),
        n in 1u16..,
        d in 1u16..,
        target in any::<i32>(),
    ) {
        let mut m = PositionModel::with_scale(n, d);
        m.update(raw);
        prop_assert_eq!(m.set_position(target), target);
        prop_assert_eq!(m.position(), target);
        // Re-reading the same count keeps the anchor.
        prop_assert_eq!(m.update(raw), target);
    }

    #[test]
    fn zero_calibration_never_applies(raw in any::<i32>(), n in 1u16.., d in 1u16..) {
        let mut m = PositionModel::with_scale(n, d);
        m.update(raw);
        let before = m.clone();
        prop_assert_eq!(m.set_numerator(0), Outcome::Rejected(Rejection::ZeroNumerator));
        prop_assert_eq!(m.set_denominator(0), Outcome::Rejected(Rejection::ZeroDenominator));
        prop_assert_eq!(m, before);
    }

    #[test]
    fn double_toggle_restores_state(raw in any::<i32>(), n in 1u16.., d in 1u16..) {
        let mut m = PositionModel::with_scale(n, d);
        m.update(raw);
        let before = m.clone();
        m.toggle_direction();
        prop_assert_eq!(m.toggle_direction(), Direction::Forward);
        prop_assert_eq!(m, before);
    }
}
