use crate::record::{TransactionRecord, PRODUCTS, REGIONS};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Revenue range for a synthetic sale, in currency units.
const REVENUE_RANGE: std::ops::RangeInclusive<f64> = 20.0..=500.0;

/// Quantity range for a synthetic sale.
const QUANTITY_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Synthetic sales record generator.
///
/// Each generator owns a seedable RNG so test runs are reproducible; record
/// ids are fresh UUIDs and are unique regardless of the seed.
#[derive(Debug)]
pub struct SalesGenerator {
    rng: StdRng,
}

impl SalesGenerator {
    /// Creates a generator seeded from system entropy.
    pub fn new() -> Self {
        SalesGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a generator with a fixed seed for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        SalesGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates `n` independent records stamped with the current instant.
    ///
    /// Product and region are drawn uniformly from the catalogs, quantity
    /// uniformly from 1..=10, and revenue uniformly from [20, 500] rounded
    /// to two decimals.
    pub fn generate(&mut self, n: usize) -> Vec<TransactionRecord> {
        (0..n).map(|_| self.generate_one()).collect()
    }

    fn generate_one(&mut self) -> TransactionRecord {
        let product = PRODUCTS[self.rng.gen_range(0..PRODUCTS.len())];
        let region = REGIONS[self.rng.gen_range(0..REGIONS.len())];
        let quantity = self.rng.gen_range(QUANTITY_RANGE);
        let revenue = (self.rng.gen_range(REVENUE_RANGE) * 100.0).round() / 100.0;
        TransactionRecord::new(Uuid::new_v4(), Utc::now(), product, region, quantity, revenue)
    }
}

impl Default for SalesGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_count_and_ranges() {
        let mut generator = SalesGenerator::with_seed(7);
        let records = generator.generate(5);
        assert_eq!(records.len(), 5);
        for record in &records {
            assert!((1..=10).contains(&record.quantity));
            assert!((20.0..=500.0).contains(&record.revenue));
        }
    }

    #[test]
    fn test_generate_distinct_ids() {
        let mut generator = SalesGenerator::with_seed(7);
        let records = generator.generate(50);
        let ids: HashSet<Uuid> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_revenue_rounded_to_two_decimals() {
        let mut generator = SalesGenerator::with_seed(42);
        for record in generator.generate(100) {
            let cents = record.revenue * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9, "revenue {}", record.revenue);
        }
    }

    #[test]
    fn test_seeded_generators_reproduce_draws() {
        let mut a = SalesGenerator::with_seed(123);
        let mut b = SalesGenerator::with_seed(123);
        let ra = a.generate(10);
        let rb = b.generate(10);
        for (x, y) in ra.iter().zip(rb.iter()) {
            assert_eq!(x.product, y.product);
            assert_eq!(x.region, y.region);
            assert_eq!(x.quantity, y.quantity);
            assert_eq!(x.revenue, y.revenue);
        }
    }

    #[test]
    fn test_generate_zero_is_empty() {
        let mut generator = SalesGenerator::with_seed(1);
        assert!(generator.generate(0).is_empty());
    }
}
