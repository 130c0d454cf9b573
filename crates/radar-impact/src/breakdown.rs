//! Split of an overall impact across revenue, cost, capital and tax.

use radar_core::CategoryGroup;
use serde::Serialize;

/// Share of an impact landing on each line. Rows sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupWeights {
    /// Revenue share.
    pub revenue: f64,
    /// Cost share.
    pub cost: f64,
    /// Capital share.
    pub capital: f64,
    /// Tax share.
    pub tax: f64,
}

impl GroupWeights {
    const fn new(revenue: f64, cost: f64, capital: f64, tax: f64) -> Self {
        Self {
            revenue,
            cost,
            capital,
            tax,
        }
    }

    /// Weights for a policy category group.
    pub fn for_group(group: CategoryGroup) -> Self {
        match group {
            CategoryGroup::Trade => Self::new(0.5, 0.4, 0.0, 0.1),
            CategoryGroup::Financial => Self::new(0.2, 0.3, 0.5, 0.0),
            CategoryGroup::Environmental => Self::new(0.1, 0.6, 0.3, 0.0),
            CategoryGroup::Tax => Self::new(0.0, 0.2, 0.0, 0.8),
            CategoryGroup::Labor => Self::new(0.2, 0.8, 0.0, 0.0),
            CategoryGroup::Technology => Self::new(0.4, 0.5, 0.1, 0.0),
            CategoryGroup::Healthcare => Self::new(0.5, 0.4, 0.0, 0.1),
            CategoryGroup::Energy => Self::new(0.3, 0.5, 0.2, 0.0),
            CategoryGroup::General => Self::new(0.4, 0.4, 0.1, 0.1),
        }
    }

    fn sum(&self) -> f64 {
        self.revenue + self.cost + self.capital + self.tax
    }
}

/// Impact per line item (M USD).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactBreakdown {
    /// Revenue component.
    pub revenue: f64,
    /// Cost component.
    pub cost: f64,
    /// Capital component.
    pub capital: f64,
    /// Tax component.
    pub tax: f64,
}

impl ImpactBreakdown {
    /// Apply group weights to an overall impact.
    pub fn split(overall: f64, group: CategoryGroup) -> Self {
        let w = GroupWeights::for_group(group);
        Self {
            revenue: overall * w.revenue,
            cost: overall * w.cost,
            capital: overall * w.capital,
            tax: overall * w.tax,
        }
    }

    /// Sum of the components.
    pub fn total(&self) -> f64 {
        self.revenue + self.cost + self.capital + self.tax
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_row_sums_to_one() {
        for g in CategoryGroup::ALL {
            let w = GroupWeights::for_group(g);
            assert!((w.sum() - 1.0).abs() < 1e-12, "{g}");
        }
    }

    #[test]
    fn split_conserves_overall() {
        for g in CategoryGroup::ALL {
            let b = ImpactBreakdown::split(-123.4, g);
            assert!((b.total() + 123.4).abs() < 1e-9, "{g}");
        }
    }

    #[test]
    fn tax_policy_lands_on_tax_line() {
        let b = ImpactBreakdown::split(-100.0, CategoryGroup::Tax);
        assert!((b.tax + 80.0).abs() < 1e-9);
        assert_eq!(b.revenue, 0.0);
    }
}
