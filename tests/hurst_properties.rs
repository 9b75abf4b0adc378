//! Statistical behavior of the R/S estimator on seeded synthetic series.

use momentrader::domain::hurst::HurstEstimator;
use momentrader::domain::regime::RegimeEstimate;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

const TRIALS: u64 = 20;

/// Prices compounding AR(1) returns: r[t] = phi * r[t-1] + e[t].
fn ar_prices(seed: u64, n: usize, phi: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.01).unwrap();
    let mut prices = Vec::with_capacity(n);
    let mut price = 100.0;
    let mut ret = 0.0;
    prices.push(price);
    for _ in 1..n {
        ret = phi * ret + noise.sample(&mut rng);
        price *= 1.0 + ret;
        prices.push(price);
    }
    prices
}

fn estimates(phi: f64) -> Vec<RegimeEstimate> {
    let estimator = HurstEstimator::default();
    (0..TRIALS)
        .map(|seed| {
            let prices = ar_prices(seed, estimator.window_len(), phi);
            estimator.estimate(&prices).unwrap()
        })
        .collect()
}

#[test]
fn random_walk_reads_slightly_above_one_half() {
    let results = estimates(0.0);
    let mean = results.iter().map(|e| e.hurst).sum::<f64>() / results.len() as f64;
    // small-sample R/S bias puts i.i.d. returns near 0.59
    assert!(mean > 0.55 && mean < 0.64, "mean H {}", mean);
}

#[test]
fn anti_persistent_returns_read_below_random_walk() {
    let mean = |phi: f64| estimates(phi).iter().map(|e| e.hurst).sum::<f64>() / TRIALS as f64;
    assert!(mean(-0.5) < mean(0.0));
}

#[test]
fn persistent_returns_read_as_trending() {
    let results = estimates(0.9);
    let trending = results.iter().filter(|e| e.is_trending()).count();
    assert!(trending > TRIALS as usize / 2, "{} of {} trending", trending, TRIALS);

    let mean = results.iter().map(|e| e.hurst).sum::<f64>() / results.len() as f64;
    let walk_mean = estimates(0.0).iter().map(|e| e.hurst).sum::<f64>() / TRIALS as f64;
    assert!(mean > walk_mean);
}

#[test]
fn estimates_are_finite_and_p_values_are_probabilities() {
    for e in estimates(0.0).into_iter().chain(estimates(0.9)) {
        assert!(e.hurst.is_finite());
        assert!(e.t_stat.is_finite());
        assert!((0.0..=1.0).contains(&e.p_value));
    }
}

#[test]
fn longer_window_uses_only_its_tail() {
    let estimator = HurstEstimator::new(6);
    let prices = ar_prices(7, 500, 0.3);
    let tail = &prices[prices.len() - estimator.window_len()..];
    assert_eq!(
        estimator.estimate(&prices).unwrap(),
        estimator.estimate(tail).unwrap()
    );
}
