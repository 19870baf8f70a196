use crate::domain::metric::MetricSample;
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;

/// Bounded random-delta distribution applied to a metric between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariationPolicy {
    /// Uniform draw over a closed float range.
    Uniform { min: f64, max: f64 },
    /// Uniform draw over a closed integer range (for count-like metrics).
    IntUniform { min: i64, max: i64 },
    /// Deterministic delta. Used for degenerate configs and tests.
    Fixed(f64),
}

impl VariationPolicy {
    pub fn draw(&self) -> f64 {
        let mut rng = rand::rng();
        match *self {
            VariationPolicy::Uniform { min, max } => rng.random_range(min..=max),
            VariationPolicy::IntUniform { min, max } => rng.random_range(min..=max) as f64,
            VariationPolicy::Fixed(delta) => delta,
        }
    }
}

/// Per-metric variation policies with a fallback for unknown names.
#[derive(Debug, Clone)]
pub struct VariationTable {
    policies: HashMap<String, VariationPolicy>,
    fallback: VariationPolicy,
}

impl VariationTable {
    pub fn new(fallback: VariationPolicy) -> Self {
        Self {
            policies: HashMap::new(),
            fallback,
        }
    }

    /// Default policies for the shipped broadcast set.
    pub fn defaults() -> Self {
        Self::new(VariationPolicy::Uniform {
            min: -5.0,
            max: 10.0,
        })
        .with_policy(
            "revenue",
            VariationPolicy::Uniform {
                min: -100.0,
                max: 200.0,
            },
        )
        .with_policy("active_users", VariationPolicy::IntUniform { min: -10, max: 25 })
        .with_policy("orders", VariationPolicy::IntUniform { min: -2, max: 5 })
        .with_policy(
            "conversion_rate",
            VariationPolicy::Uniform { min: -0.5, max: 1.0 },
        )
        .with_policy("page_views", VariationPolicy::IntUniform { min: -50, max: 100 })
    }

    pub fn with_policy(mut self, name: &str, policy: VariationPolicy) -> Self {
        self.policies.insert(name.to_string(), policy);
        self
    }

    pub fn policy(&self, name: &str) -> VariationPolicy {
        self.policies.get(name).copied().unwrap_or(self.fallback)
    }
}

impl Default for VariationTable {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Produces the next synthetic sample for a metric from its previous value.
///
/// Pure apart from the RNG draw: no hidden state, no mutation. Unknown metric
/// names fall back to the table's default policy rather than erroring.
pub struct MetricGenerator {
    variations: VariationTable,
}

impl MetricGenerator {
    pub fn new(variations: VariationTable) -> Self {
        Self { variations }
    }

    pub fn next(&self, name: &str, previous: f64) -> MetricSample {
        let delta = round2(self.variations.policy(name).draw());
        let value = round2((previous + delta).max(0.0));
        let delta_percent = if previous == 0.0 {
            0.0
        } else {
            round2(delta / previous * 100.0)
        };

        MetricSample {
            name: name.to_string(),
            value,
            timestamp: Utc::now(),
            delta,
            delta_percent,
        }
    }

    /// Starting value for a metric that has no recorded history yet.
    pub fn baseline(&self, name: &str) -> f64 {
        let mut rng = rand::rng();
        let value = match name {
            "revenue" => 1000.0 + rng.random_range(-200.0..=300.0),
            "active_users" => 200.0 + rng.random_range(-20..=40) as f64,
            "orders" => 15.0 + rng.random_range(-3..=8) as f64,
            "conversion_rate" => 8.0 + rng.random_range(-2.0..=4.0),
            "page_views" => 500.0 + rng.random_range(-50..=100) as f64,
            _ => rng.random_range(1.0..=100.0),
        };
        round2(value.max(0.0))
    }
}

impl Default for MetricGenerator {
    fn default() -> Self {
        Self::new(VariationTable::defaults())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_never_negative() {
        let generator = MetricGenerator::default();
        for _ in 0..1000 {
            let sample = generator.next("revenue", 10.0);
            assert!(sample.value >= 0.0);
        }

        // A fixed negative delta larger than the previous value must clamp.
        let generator = MetricGenerator::new(
            VariationTable::new(VariationPolicy::Fixed(-500.0)),
        );
        let sample = generator.next("orders", 3.0);
        assert_eq!(sample.value, 0.0);
        assert_eq!(sample.delta, -500.0);
    }

    #[test]
    fn test_delta_percent_zero_previous() {
        let generator =
            MetricGenerator::new(VariationTable::new(VariationPolicy::Fixed(7.0)));
        let sample = generator.next("revenue", 0.0);
        assert_eq!(sample.delta_percent, 0.0);
        assert_eq!(sample.value, 7.0);
    }

    #[test]
    fn test_delta_percent_nonzero_previous() {
        let generator =
            MetricGenerator::new(VariationTable::new(VariationPolicy::Fixed(10.0)));
        let sample = generator.next("revenue", 100.0);
        assert_eq!(sample.value, 110.0);
        assert_eq!(sample.delta, 10.0);
        assert_eq!(sample.delta_percent, 10.0);
    }

    #[test]
    fn test_unknown_metric_uses_fallback() {
        let table = VariationTable::new(VariationPolicy::Fixed(2.5));
        assert_eq!(table.policy("never_configured"), VariationPolicy::Fixed(2.5));

        let generator = MetricGenerator::new(table);
        let sample = generator.next("never_configured", 10.0);
        assert_eq!(sample.value, 12.5);
    }

    #[test]
    fn test_policy_draws_stay_in_bounds() {
        let uniform = VariationPolicy::Uniform { min: -1.0, max: 2.0 };
        let ints = VariationPolicy::IntUniform { min: -3, max: 4 };
        for _ in 0..500 {
            let u = uniform.draw();
            assert!((-1.0..=2.0).contains(&u));
            let i = ints.draw();
            assert!((-3.0..=4.0).contains(&i));
            assert_eq!(i.fract(), 0.0);
        }
    }

    #[test]
    fn test_baseline_non_negative() {
        let generator = MetricGenerator::default();
        for name in ["revenue", "orders", "active_users", "totally_unknown"] {
            for _ in 0..100 {
                assert!(generator.baseline(name) >= 0.0);
            }
        }
    }
}
