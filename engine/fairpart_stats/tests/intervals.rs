use approx::assert_abs_diff_eq;
use fairpart_stats::{proportion_interval, wald_half_width, z_for_confidence, IntervalMethod};
use proptest::prelude::*;

#[test]
fn width_shrinks_as_sample_grows_at_fixed_rate() {
    let z = z_for_confidence(0.95).expect("z");
    for method in [IntervalMethod::Wilson, IntervalMethod::Wald] {
        let mut prev = f64::INFINITY;
        // p fixed at 0.3
        for n in [10usize, 20, 50, 100, 1000, 10_000] {
            let iv = proportion_interval(3 * n / 10, n, z, method).expect("interval");
            assert!(iv.width() < prev, "{method:?} width did not shrink at n={n}");
            prev = iv.width();
        }
    }
}

#[test]
fn higher_confidence_means_wider_interval() {
    let z90 = z_for_confidence(0.90).expect("z");
    let z99 = z_for_confidence(0.99).expect("z");
    let a = proportion_interval(40, 100, z90, IntervalMethod::Wilson).expect("interval");
    let b = proportion_interval(40, 100, z99, IntervalMethod::Wilson).expect("interval");
    assert!(b.width() > a.width());
}

#[test]
fn wald_half_width_matches_formula() {
    let h = wald_half_width(50, 100, 2.0).expect("half width");
    assert_abs_diff_eq!(h, 2.0 * (0.25f64 / 100.0).sqrt(), epsilon = 1e-12);
}

proptest! {
    #[test]
    fn interval_brackets_estimate(trials in 1usize..500, frac in 0.0f64..=1.0, level in 0.5f64..0.999) {
        let successes = ((trials as f64) * frac).floor() as usize;
        let z = z_for_confidence(level).unwrap();
        for method in [IntervalMethod::Wilson, IntervalMethod::Wald] {
            let iv = proportion_interval(successes, trials, z, method).unwrap();
            prop_assert!(iv.contains(iv.estimate));
            prop_assert!(0.0 <= iv.lower && iv.upper <= 1.0);
        }
    }
}
