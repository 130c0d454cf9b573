//! # Exposure and Status Factors
//!
//! How strongly a policy reaches a company, and how likely the policy is to
//! take effect. All factors are pure lookups on the input records.

use radar_core::{Company, FinancialMetrics, Policy, PolicyStatus};
use serde::Serialize;

/// Company in an explicitly affected industry.
pub const INDUSTRY_DIRECT: f64 = 1.0;
/// Policy with no industry list (economy-wide).
pub const INDUSTRY_ECONOMY_WIDE: f64 = 0.5;
/// Company outside the affected industries.
pub const INDUSTRY_INDIRECT: f64 = 0.1;

/// Company headquartered in the policy jurisdiction.
pub const JURISDICTION_HOME: f64 = 1.0;
/// Company regulated in or selling into the jurisdiction.
pub const JURISDICTION_PRESENCE: f64 = 0.6;
/// No recorded presence.
pub const JURISDICTION_REMOTE: f64 = 0.15;

/// Revenue at which the size factor reaches one half (M USD).
pub const SIZE_HALF_POINT: f64 = 10_000.0;

/// Share of market cap used as a revenue proxy when nothing better exists.
pub const MARKET_CAP_REVENUE_PROXY: f64 = 0.5;

/// Exposure of a company to a policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Exposure {
    /// Industry overlap factor.
    pub industry: f64,
    /// Geographic overlap factor.
    pub jurisdiction: f64,
}

impl Exposure {
    /// Compute exposure from the policy scope and the company footprint.
    pub fn of(policy: &Policy, company: &Company) -> Self {
        let industry = if policy.affected_industries.is_empty() {
            INDUSTRY_ECONOMY_WIDE
        } else if policy
            .affected_industries
            .iter()
            .any(|i| i.eq_ignore_ascii_case(&company.industry))
        {
            INDUSTRY_DIRECT
        } else {
            INDUSTRY_INDIRECT
        };

        let jurisdiction = if policy.jurisdiction.matches(&company.headquarters_country) {
            JURISDICTION_HOME
        } else if company.has_presence_in(policy.jurisdiction.as_str()) {
            JURISDICTION_PRESENCE
        } else {
            JURISDICTION_REMOTE
        };

        Self {
            industry,
            jurisdiction,
        }
    }

    /// Combined exposure.
    pub fn total(&self) -> f64 {
        self.industry * self.jurisdiction
    }
}

/// Probability that a policy in `status` takes effect.
pub fn status_weight(status: PolicyStatus) -> f64 {
    match status {
        PolicyStatus::Draft => 0.25,
        PolicyStatus::Proposed => 0.5,
        PolicyStatus::Enacted => 0.9,
        PolicyStatus::Implemented => 1.0,
        PolicyStatus::Amended => 0.8,
        PolicyStatus::Repealed | PolicyStatus::Expired => 0.0,
    }
}

/// How settled the policy text is. Terminal states are certain (of no effect).
pub fn status_certainty(status: PolicyStatus) -> f64 {
    match status {
        PolicyStatus::Implemented => 1.0,
        PolicyStatus::Enacted => 0.95,
        PolicyStatus::Amended => 0.85,
        PolicyStatus::Proposed => 0.75,
        PolicyStatus::Draft => 0.6,
        PolicyStatus::Repealed | PolicyStatus::Expired => 1.0,
    }
}

/// Annual revenue used for scaling, in order of preference: latest reported
/// `total_revenue`, the company record's `revenue`, then half the market cap.
///
/// Returns `None` when no positive figure is available.
pub fn resolve_revenue(company: &Company, metrics: Option<&FinancialMetrics>) -> Option<f64> {
    let positive = |v: &f64| v.is_finite() && *v > 0.0;
    metrics
        .and_then(|m| m.total_revenue)
        .filter(positive)
        .or_else(|| company.revenue.filter(positive))
        .or_else(|| {
            company
                .market_cap
                .map(|c| c * MARKET_CAP_REVENUE_PROXY)
                .filter(positive)
        })
}

/// Saturating size factor `revenue / (revenue + 10 000)`.
pub fn size_factor(revenue: f64) -> f64 {
    revenue / (revenue + SIZE_HALF_POINT)
}

/// Input completeness: both profile and financials, one of them, or neither.
pub fn completeness(has_profile: bool, has_financials: bool) -> f64 {
    match (has_profile, has_financials) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.9,
        (false, false) => 0.8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{company, metrics, policy};

    #[test]
    fn direct_home_exposure() {
        let mut p = policy();
        p.jurisdiction = radar_core::JurisdictionCode::new("US").unwrap();
        let e = Exposure::of(&p, &company());
        assert_eq!(e.industry, INDUSTRY_DIRECT);
        assert_eq!(e.jurisdiction, JURISDICTION_HOME);
        assert_eq!(e.total(), 1.0);
    }

    #[test]
    fn presence_exposure_via_primary_markets() {
        // Fixture company sells into the EU but is headquartered in the US.
        let e = Exposure::of(&policy(), &company());
        assert_eq!(e.jurisdiction, JURISDICTION_PRESENCE);
    }

    #[test]
    fn remote_and_indirect_exposure() {
        let mut p = policy();
        p.jurisdiction = radar_core::JurisdictionCode::new("JP").unwrap();
        p.affected_industries = vec!["retail".to_string()];
        let e = Exposure::of(&p, &company());
        assert_eq!(e.industry, INDUSTRY_INDIRECT);
        assert_eq!(e.jurisdiction, JURISDICTION_REMOTE);
    }

    #[test]
    fn economy_wide_policy() {
        let mut p = policy();
        p.affected_industries.clear();
        assert_eq!(Exposure::of(&p, &company()).industry, INDUSTRY_ECONOMY_WIDE);
    }

    #[test]
    fn revenue_preference_order() {
        let mut c = company();
        let m = metrics(c.id, 12_000.0);
        assert_eq!(resolve_revenue(&c, Some(&m)), Some(12_000.0));
        assert_eq!(resolve_revenue(&c, None), Some(8_000.0));
        c.revenue = None;
        assert_eq!(resolve_revenue(&c, None), Some(6_000.0));
        c.market_cap = None;
        assert_eq!(resolve_revenue(&c, None), None);
    }

    #[test]
    fn zero_revenue_falls_through() {
        let mut c = company();
        c.revenue = Some(0.0);
        assert_eq!(resolve_revenue(&c, None), Some(6_000.0));
    }

    #[test]
    fn size_factor_saturates() {
        assert!((size_factor(10_000.0) - 0.5).abs() < 1e-12);
        assert!(size_factor(1e9) < 1.0);
        assert!(size_factor(1.0) > 0.0);
    }

    #[test]
    fn terminal_policies_carry_no_weight() {
        assert_eq!(status_weight(PolicyStatus::Repealed), 0.0);
        assert_eq!(status_weight(PolicyStatus::Expired), 0.0);
        assert_eq!(status_certainty(PolicyStatus::Repealed), 1.0);
        for s in PolicyStatus::ALL {
            assert!((0.0..=1.0).contains(&status_weight(s)));
        }
    }
}
