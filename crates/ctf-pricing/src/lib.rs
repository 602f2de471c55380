//! Dynamic task pricing and the teams-base estimator it is evaluated
//! against (spec.md §4.2, §4.3).
mod teams_base;

pub use teams_base::NonLinear;
pub use teams_base::Static;
pub use teams_base::TeamsBase;

use ctf_core::config::TaskPriceConfig;
use ctf_core::Price;

/// Pricing thresholds, already converted from integer percent to fraction
/// (spec.md §9 Open Question 4 — frozen percent/100 at config-load time,
/// see DESIGN.md O2).
#[derive(Debug, Clone, Copy)]
pub struct PricingThresholds {
    pub t500: f64,
    pub t400: f64,
    pub t300: f64,
    pub t200: f64,
}

impl From<&TaskPriceConfig> for PricingThresholds {
    fn from(cfg: &TaskPriceConfig) -> Self {
        Self {
            t500: cfg.t500(),
            t400: cfg.t400(),
            t300: cfg.t300(),
            t200: cfg.t200(),
        }
    }
}

/// Monotonically non-increasing step function of relative solve-rate
/// (spec.md §4.2). Evaluation order matters: reordering the `≤` chain
/// creates off-by-one-tier errors at equality points, so the thresholds
/// are checked in the exact sequence the spec lists.
pub fn price(solved_count: i64, teams_base: f64, thresholds: PricingThresholds) -> Price {
    let r = solved_count as f64 / teams_base;
    if r <= thresholds.t500 {
        500
    } else if r <= thresholds.t400 {
        400
    } else if r <= thresholds.t300 {
        300
    } else if r <= thresholds.t200 {
        200
    } else {
        100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_thresholds() -> PricingThresholds {
        PricingThresholds {
            t500: 0.10,
            t400: 0.15,
            t300: 0.30,
            t200: 0.50,
        }
    }

    #[test]
    fn pricing_cliffs_match_scenario_2() {
        let t = default_thresholds();
        assert_eq!(price(2, 20.0, t), 500);
        assert_eq!(price(3, 20.0, t), 400);
        assert_eq!(price(6, 20.0, t), 300);
        assert_eq!(price(10, 20.0, t), 200);
        assert_eq!(price(11, 20.0, t), 100);
    }

    #[test]
    fn price_never_increases_with_more_solves() {
        let t = default_thresholds();
        let mut last = 500;
        for n in 0..=40 {
            let p = price(n, 20.0, t);
            assert!(p <= last, "price rose at solved_count={n}");
            last = p;
        }
    }

    #[test]
    fn zero_solves_is_top_tier() {
        let t = default_thresholds();
        assert_eq!(price(0, 20.0, t), 500);
    }
}
