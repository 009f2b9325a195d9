//! Property tests for the metric functions.

use portsim_runner::metrics::{
    cagr, daily_returns, drawdown_curve, max_drawdown, ratio, sample_std, total_return,
};
use proptest::prelude::*;

fn arb_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1_000_000.0_f64, 1..200)
}

proptest! {
    #[test]
    fn drawdown_is_bounded(curve in arb_curve()) {
        let dd = drawdown_curve(&curve);
        prop_assert_eq!(dd.len(), curve.len());
        for v in &dd {
            prop_assert!(*v <= 0.0 && *v > -1.0);
        }
        let worst = max_drawdown(&curve);
        prop_assert!(dd.iter().all(|v| *v >= worst));
    }

    #[test]
    fn returns_compound_to_total_return(curve in arb_curve()) {
        let compounded = daily_returns(&curve).iter().fold(1.0, |acc, r| acc * (1.0 + r));
        let total = total_return(&curve);
        prop_assert!((compounded - (1.0 + total)).abs() < 1e-6 * (1.0 + total).abs().max(1.0));
    }

    #[test]
    fn cagr_has_the_sign_of_total_return(curve in arb_curve(), days in 1_i64..5_000) {
        let c = cagr(&curve, days);
        let t = total_return(&curve);
        prop_assert!(c.is_finite());
        if t > 1e-12 {
            prop_assert!(c >= 0.0);
        } else if t < -1e-12 {
            prop_assert!(c <= 0.0);
        }
    }

    #[test]
    fn ratio_is_always_finite(num in prop::num::f64::ANY, den in prop::num::f64::ANY) {
        prop_assert!(ratio(num, den).is_finite());
    }

    #[test]
    fn std_is_non_negative(values in prop::collection::vec(-1.0..1.0_f64, 0..100)) {
        prop_assert!(sample_std(&values) >= 0.0);
    }
}
