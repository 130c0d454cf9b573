//! # Risk Scoring and Mitigation
//!
//! Risk is probability × severity. Probability is the chance the policy
//! takes effect; severity is the downside of the impact interval relative
//! to 5% of annual revenue. Per-factor scores reuse the same probability
//! and scale the severity by the factor's weight.

use radar_core::{taxonomy, CategoryGroup, RiskFactorScore, RiskLevel};

/// Downside equal to this share of revenue is maximal severity.
pub const SEVERITY_REVENUE_SHARE: f64 = 0.05;

/// Political exposure assumed when the company has no profile.
pub const DEFAULT_POLITICAL_EXPOSURE: f64 = 0.5;

/// Debt-to-equity above which a leverage surcharge applies.
pub const LEVERAGE_THRESHOLD: f64 = 2.0;

/// Added to the score for highly levered companies.
pub const LEVERAGE_SURCHARGE: f64 = 0.05;

/// Severity weights for the three industry risk factors, in taxonomy order.
const INDUSTRY_FACTOR_WEIGHTS: [f64; 3] = [1.0, 0.8, 0.6];

/// Severity weight for regulatory sub-category factors.
const REGULATORY_FACTOR_WEIGHT: f64 = 0.5;

/// Inputs to the overall risk score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    /// Probability the policy takes effect.
    pub probability: f64,
    /// Lower bound of the impact interval.
    pub interval_lower: f64,
    /// Annual revenue (M USD), strictly positive.
    pub revenue: f64,
    /// Company political exposure, if profiled.
    pub political_exposure: Option<f64>,
    /// Latest debt-to-equity, if reported.
    pub debt_to_equity: Option<f64>,
}

/// Overall and per-factor risk.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskProfile {
    /// Probability component.
    pub probability: f64,
    /// Severity component.
    pub severity: f64,
    /// Overall score in `[0, 1]`.
    pub score: f64,
    /// Level from `score`.
    pub level: RiskLevel,
    /// Per-factor detail.
    pub factors: Vec<RiskFactorScore>,
}

impl RiskProfile {
    /// Score the downside and expand factor detail for the industry and group.
    pub fn assess(inputs: RiskInputs, industry: &str, group: CategoryGroup) -> Self {
        let downside = (-inputs.interval_lower).max(0.0);
        let severity = (downside / (SEVERITY_REVENUE_SHARE * inputs.revenue)).min(1.0);
        let political = inputs
            .political_exposure
            .unwrap_or(DEFAULT_POLITICAL_EXPOSURE)
            .clamp(0.0, 1.0);
        let leverage = match inputs.debt_to_equity {
            Some(de) if de > LEVERAGE_THRESHOLD => LEVERAGE_SURCHARGE,
            _ => 0.0,
        };
        let score = (inputs.probability * severity * (0.75 + 0.5 * political) + leverage)
            .clamp(0.0, 1.0);

        Self {
            probability: inputs.probability,
            severity,
            score,
            level: RiskLevel::from_score(score),
            factors: factor_scores(inputs.probability, severity, industry, group),
        }
    }

    /// Names of the scored factors, in order.
    pub fn factor_names(&self) -> Vec<String> {
        self.factors.iter().map(|f| f.risk_factor.clone()).collect()
    }
}

fn factor_scores(
    probability: f64,
    severity: f64,
    industry: &str,
    group: CategoryGroup,
) -> Vec<RiskFactorScore> {
    let score = |category: &str, name: &str, weight: f64| {
        let sev = (severity * weight).clamp(0.0, 1.0);
        let overall = probability * sev;
        RiskFactorScore {
            risk_category: category.to_string(),
            risk_factor: name.to_string(),
            probability,
            severity: sev,
            overall,
            level: RiskLevel::from_score(overall),
        }
    };

    let industry_factors = taxonomy::industry_config(industry)
        .map(|cfg| cfg.risk_factors)
        .unwrap_or(&[]);

    industry_factors
        .iter()
        .zip(INDUSTRY_FACTOR_WEIGHTS)
        .map(|(name, w)| score("industry", *name, w))
        .chain(
            group
                .subcategories()
                .iter()
                .map(|name| score("regulatory", *name, REGULATORY_FACTOR_WEIGHT)),
        )
        .collect()
}

/// Recommended response to an assessed risk level.
#[derive(Debug, Clone, PartialEq)]
pub struct MitigationPlan {
    /// Strategies, cumulative with level.
    pub strategies: Vec<String>,
    /// Estimated cost (M USD).
    pub cost: f64,
    /// Expected impact reduction.
    pub effectiveness: f64,
}

impl MitigationPlan {
    /// Plan for a level, costed against the absolute overall impact.
    pub fn for_level(level: RiskLevel, overall_impact: f64) -> Self {
        let (cost_ratio, effectiveness) = match level {
            RiskLevel::Low => (0.02, 0.3),
            RiskLevel::Medium => (0.05, 0.45),
            RiskLevel::High => (0.10, 0.6),
            RiskLevel::Critical => (0.15, 0.7),
        };
        let mut strategies = vec!["Monitor policy developments and consultation outcomes"];
        if level >= RiskLevel::Medium {
            strategies.push("Engage regulators and industry bodies during rulemaking");
            strategies.push("Update the compliance roadmap and control inventory");
        }
        if level >= RiskLevel::High {
            strategies.push("Adjust pricing, sourcing and capital plans for the policy");
            strategies.push("Reserve a contingency budget for transition costs");
        }
        if level >= RiskLevel::Critical {
            strategies.push("Restructure or relocate the most exposed operations");
            strategies.push("Hedge the financial exposure where instruments exist");
        }
        Self {
            strategies: strategies.into_iter().map(String::from).collect(),
            cost: cost_ratio * overall_impact.abs(),
            effectiveness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(lower: f64) -> RiskInputs {
        RiskInputs {
            probability: 1.0,
            interval_lower: lower,
            revenue: 1_000.0,
            political_exposure: None,
            debt_to_equity: None,
        }
    }

    #[test]
    fn no_downside_no_risk() {
        let r = RiskProfile::assess(inputs(10.0), "energy", CategoryGroup::Energy);
        assert_eq!(r.severity, 0.0);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.level, RiskLevel::Low);
    }

    #[test]
    fn downside_of_five_percent_revenue_is_max_severity() {
        let r = RiskProfile::assess(inputs(-50.0), "energy", CategoryGroup::Energy);
        assert!((r.severity - 1.0).abs() < 1e-12);
        // 1.0 * 1.0 * (0.75 + 0.25)
        assert!((r.score - 1.0).abs() < 1e-12);
        assert_eq!(r.level, RiskLevel::Critical);
    }

    #[test]
    fn leverage_surcharge_applies_above_threshold() {
        let mut i = inputs(-10.0);
        let base = RiskProfile::assess(i, "retail", CategoryGroup::General).score;
        i.debt_to_equity = Some(2.5);
        let levered = RiskProfile::assess(i, "retail", CategoryGroup::General).score;
        assert!((levered - base - LEVERAGE_SURCHARGE).abs() < 1e-12);
    }

    #[test]
    fn factors_cover_industry_and_group() {
        let r = RiskProfile::assess(inputs(-20.0), "energy", CategoryGroup::Environmental);
        let names = r.factor_names();
        assert_eq!(&names[..3], &["carbon_tax", "renewable_targets", "grid_modernization"]);
        assert_eq!(names.len(), 3 + CategoryGroup::Environmental.subcategories().len());
        assert!(r.factors[..3].iter().all(|f| f.risk_category == "industry"));
        assert!(r.factors[3..].iter().all(|f| f.risk_category == "regulatory"));
        assert!(r.factors[0].severity >= r.factors[1].severity);
    }

    #[test]
    fn unmodelled_industry_general_group_has_no_factors() {
        let r = RiskProfile::assess(inputs(-20.0), "retail", CategoryGroup::General);
        assert!(r.factors.is_empty());
    }

    #[test]
    fn mitigation_scales_with_level() {
        let low = MitigationPlan::for_level(RiskLevel::Low, -200.0);
        let crit = MitigationPlan::for_level(RiskLevel::Critical, -200.0);
        assert!((low.cost - 4.0).abs() < 1e-9);
        assert!((crit.cost - 30.0).abs() < 1e-9);
        assert!(crit.strategies.len() > low.strategies.len());
        assert!(crit.effectiveness > low.effectiveness);
    }
}
