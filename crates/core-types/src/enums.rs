use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The grouping level for product performance analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLevel {
    #[default]
    Product,
    Category,
    Subcategory,
}

impl CategoryLevel {
    pub const ALL: [CategoryLevel; 3] = [
        CategoryLevel::Product,
        CategoryLevel::Category,
        CategoryLevel::Subcategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLevel::Product => "product",
            CategoryLevel::Category => "category",
            CategoryLevel::Subcategory => "subcategory",
        }
    }
}

impl fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "category_level".to_string(),
                    format!("'{s}' must be one of product, category, subcategory"),
                )
            })
    }
}

/// One of the product performance analyses a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMetric {
    Sales,
    Units,
    Margin,
    PriceBands,
}

impl PerformanceMetric {
    pub const ALL: [PerformanceMetric; 4] = [
        PerformanceMetric::Sales,
        PerformanceMetric::Units,
        PerformanceMetric::Margin,
        PerformanceMetric::PriceBands,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMetric::Sales => "sales",
            PerformanceMetric::Units => "units",
            PerformanceMetric::Margin => "margin",
            PerformanceMetric::PriceBands => "price_bands",
        }
    }
}

impl fmt::Display for PerformanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "metrics".to_string(),
                    format!("Invalid metric: {s}. Valid metrics are: sales, units, margin, price_bands"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_metrics_and_rejects_others() {
        assert_eq!("price_bands".parse::<PerformanceMetric>(), Ok(PerformanceMetric::PriceBands));
        assert!("revenue".parse::<PerformanceMetric>().is_err());
    }

    #[test]
    fn category_level_defaults_to_product() {
        assert_eq!(CategoryLevel::default(), CategoryLevel::Product);
        assert_eq!("subcategory".parse::<CategoryLevel>(), Ok(CategoryLevel::Subcategory));
        assert!("brand".parse::<CategoryLevel>().is_err());
    }
}
