use crate::CoreError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Which side of a band a value was pushed back from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Breach {
    None,
    Below,
    Above,
    /// NaN has no side. It is passed through unchanged.
    NotANumber,
}

/// Saturate `v` into `[lo, hi]`, reporting which bound (if any) was hit.
///
/// A value sitting exactly on `lo` counts as a `Below` breach: the tank
/// "empty" report fires whenever the level bottoms out, not only when it
/// would have gone negative.
///
/// NaN is returned as is and flagged `NotANumber`; the caller reports it.
pub fn saturate(v: f64, lo: f64, hi: f64) -> (f64, Breach) {
    if v.is_nan() {
        (v, Breach::NotANumber)
    } else if v > hi {
        (hi, Breach::Above)
    } else if v <= lo {
        (lo, Breach::Below)
    } else {
        (v, Breach::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn saturate_reports_side() {
        assert_eq!(saturate(1.2, 0.0, 1.0), (1.0, Breach::Above));
        assert_eq!(saturate(-0.1, 0.0, 1.0), (0.0, Breach::Below));
        assert_eq!(saturate(0.0, 0.0, 1.0), (0.0, Breach::Below));
        assert_eq!(saturate(0.4, 0.0, 1.0), (0.4, Breach::None));
        assert_eq!(saturate(1.0, 0.0, 1.0), (1.0, Breach::None));
    }

    #[test]
    fn saturate_flags_nan() {
        let (out, breach) = saturate(f64::NAN, 0.0, 1.0);
        assert!(out.is_nan());
        assert_eq!(breach, Breach::NotANumber);
    }

    proptest! {
        #[test]
        fn saturate_lands_inside_band(v in -10.0f64..10.0, lo in -1.0f64..0.5, width in 0.0f64..2.0) {
            let hi = lo + width;
            let (out, breach) = saturate(v, lo, hi);
            prop_assert!(out >= lo && out <= hi);
            prop_assert_eq!(breach == Breach::None, out == v && v > lo);
        }
    }
}
