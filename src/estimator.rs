// 🧮 Mock Estimator - Fallback price formula
// Used when the prediction backend does not answer

use crate::rates::LocationRateTable;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Price multiplier per bedroom beyond the first
pub const BEDROOM_STEP: f64 = 0.10;

/// Price multiplier per bathroom beyond the first
pub const BATHROOM_STEP: f64 = 0.05;

pub const JITTER_MIN: f64 = 0.9;
pub const JITTER_SPAN: f64 = 0.2;

// ============================================================================
// QUERY / RESULT
// ============================================================================

/// Shape-validated input to the estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub location: String,
    pub area_sqft: f64,
    /// BHK count
    pub bedrooms: u32,
    pub bathrooms: u32,
}

impl PriceQuery {
    pub fn new(location: impl Into<String>, area_sqft: f64, bedrooms: u32, bathrooms: u32) -> Self {
        PriceQuery {
            location: location.into(),
            area_sqft,
            bedrooms,
            bathrooms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateResult {
    /// Whole currency units, never negative
    pub price: u64,
}

// ============================================================================
// RANDOM SOURCE
// ============================================================================

/// Supplies draws in `[0, 1)` for the jitter multiplier.
///
/// Any `FnMut() -> f64` works, so tests can pass `|| 0.5` to pin the
/// jitter at exactly 1.0.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<F> RandomSource for F
where
    F: FnMut() -> f64,
{
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Adapter for any `rand` generator
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        RngSource(rand::rng())
    }
}

impl RngSource<StdRng> {
    /// Reproducible draws for a given seed
    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

/// Map a unit draw onto the `[0.9, 1.1)` jitter band.
///
/// Draws outside `[0, 1]` are clamped; NaN lands in the middle of the band.
pub fn jitter_from_unit(unit: f64) -> f64 {
    let unit = if unit.is_nan() { 0.5 } else { unit.clamp(0.0, 1.0) };
    JITTER_MIN + unit * JITTER_SPAN
}

// ============================================================================
// ESTIMATOR
// ============================================================================

pub struct MockEstimator {
    table: LocationRateTable,
}

impl MockEstimator {
    pub fn new(table: LocationRateTable) -> Self {
        MockEstimator { table }
    }

    pub fn table(&self) -> &LocationRateTable {
        &self.table
    }

    /// Estimate with a jitter drawn from `rng`
    pub fn estimate<R: RandomSource + ?Sized>(&self, query: &PriceQuery, rng: &mut R) -> EstimateResult {
        let jitter = jitter_from_unit(rng.next_unit());
        self.estimate_with_jitter(query, jitter)
    }

    /// Estimate with an explicit jitter multiplier (1.0 = no perturbation)
    pub fn estimate_with_jitter(&self, query: &PriceQuery, jitter: f64) -> EstimateResult {
        let raw = self.raw_price(query);
        let jitter = if jitter.is_finite() { jitter.max(0.0) } else { 1.0 };

        // `as` saturates, so an overflowing product pins at u64::MAX
        let price = (raw * jitter).round() as u64;

        tracing::debug!(
            location = %query.location,
            area_sqft = query.area_sqft,
            bedrooms = query.bedrooms,
            bathrooms = query.bathrooms,
            jitter,
            price,
            "mock estimate"
        );

        EstimateResult { price }
    }

    /// Price before jitter.
    ///
    /// Negative or non-finite area counts as zero; zero counts behave like one.
    pub fn raw_price(&self, query: &PriceQuery) -> f64 {
        let base_rate = self.table.rate_for(&query.location);
        let area = if query.area_sqft.is_finite() { query.area_sqft.max(0.0) } else { 0.0 };

        base_rate * area * bedroom_factor(query.bedrooms) * bathroom_factor(query.bathrooms)
    }
}

impl Default for MockEstimator {
    fn default() -> Self {
        Self::new(LocationRateTable::bangalore())
    }
}

pub fn bedroom_factor(bedrooms: u32) -> f64 {
    1.0 + bedrooms.saturating_sub(1) as f64 * BEDROOM_STEP
}

pub fn bathroom_factor(bathrooms: u32) -> f64 {
    1.0 + bathrooms.saturating_sub(1) as f64 * BATHROOM_STEP
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn estimator() -> MockEstimator {
        MockEstimator::default()
    }

    #[test]
    fn test_koramangala_example() {
        let query = PriceQuery::new("Koramangala", 1000.0, 2, 2);
        let result = estimator().estimate_with_jitter(&query, 1.0);

        assert_eq!(result.price, 9_817_500);
    }

    #[test]
    fn test_unknown_location_default_rate() {
        let query = PriceQuery::new("Nowhere", 1000.0, 1, 1);
        let result = estimator().estimate_with_jitter(&query, 1.0);

        assert_eq!(result.price, 6_000_000);
    }

    #[test]
    fn test_midpoint_draw_is_neutral_jitter() {
        let query = PriceQuery::new("Koramangala", 1000.0, 2, 2);
        let mut half = || 0.5;

        assert_eq!(estimator().estimate(&query, &mut half).price, 9_817_500);
    }

    #[test]
    fn test_jitter_band_edges() {
        let query = PriceQuery::new("Whitefield", 1000.0, 1, 1);
        let est = estimator();

        assert_eq!(est.estimate(&query, &mut || 0.0).price, 5_850_000);
        assert_eq!(est.estimate(&query, &mut || 1.0).price, 7_150_000);
    }

    #[test]
    fn test_out_of_range_draws_clamped() {
        assert_eq!(jitter_from_unit(-3.0), 0.9);
        assert_eq!(jitter_from_unit(7.0), 1.1);
        assert!((jitter_from_unit(f64::NAN) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_source_is_deterministic() {
        let query = PriceQuery::new("HSR Layout", 1450.0, 3, 2);
        let est = estimator();

        let first = est.estimate(&query, &mut || 0.37);
        let second = est.estimate(&query, &mut || 0.37);

        assert_eq!(first, second);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let query = PriceQuery::new("JP Nagar", 1200.0, 2, 1);
        let est = estimator();

        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);

        for _ in 0..5 {
            assert_eq!(est.estimate(&query, &mut a), est.estimate(&query, &mut b));
        }
    }

    #[test]
    fn test_negative_area_clamps_to_zero() {
        let query = PriceQuery::new("Bellandur", -500.0, 2, 2);
        assert_eq!(estimator().estimate_with_jitter(&query, 1.0).price, 0);

        let query = PriceQuery::new("Bellandur", f64::NAN, 2, 2);
        assert_eq!(estimator().estimate_with_jitter(&query, 1.0).price, 0);
    }

    #[test]
    fn test_zero_counts_behave_like_one() {
        let est = estimator();
        let zero = PriceQuery::new("Yelahanka", 800.0, 0, 0);
        let one = PriceQuery::new("Yelahanka", 800.0, 1, 1);

        assert_eq!(
            est.estimate_with_jitter(&zero, 1.0),
            est.estimate_with_jitter(&one, 1.0)
        );
    }

    #[test]
    fn test_custom_table() {
        let table = LocationRateTable::new([("Hebbal", 7000.0)], 4000.0);
        let est = MockEstimator::new(table);

        let known = est.estimate_with_jitter(&PriceQuery::new("Hebbal", 1000.0, 1, 1), 1.0);
        let unknown = est.estimate_with_jitter(&PriceQuery::new("Koramangala", 1000.0, 1, 1), 1.0);

        assert_eq!(known.price, 7_000_000);
        assert_eq!(unknown.price, 4_000_000);
    }

    proptest! {
        #[test]
        fn prop_known_location_within_ten_percent(
            idx in 0usize..10,
            area in 300.0f64..10_000.0,
            draw in 0.0f64..1.0,
        ) {
            let est = estimator();
            let location = est.table().location_names()[idx].clone();
            let base = est.table().rate_for(&location) * area;

            let price = est.estimate(&PriceQuery::new(location, area, 1, 1), &mut || draw).price as f64;

            // rounding can push the result half a unit past the band
            prop_assert!(price >= base * 0.9 - 0.5);
            prop_assert!(price <= base * 1.1 + 0.5);
        }

        #[test]
        fn prop_more_bedrooms_strictly_increase_price(
            area in 300.0f64..10_000.0,
            bedrooms in 1u32..10,
            bathrooms in 1u32..6,
        ) {
            let est = estimator();
            let smaller = est.estimate_with_jitter(&PriceQuery::new("Marathahalli", area, bedrooms, bathrooms), 1.0);
            let larger = est.estimate_with_jitter(&PriceQuery::new("Marathahalli", area, bedrooms + 1, bathrooms), 1.0);

            prop_assert!(larger.price > smaller.price);
        }
    }
}
