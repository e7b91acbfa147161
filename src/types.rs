// =============================================================================
// Shared types used across the forecasting engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// The forecasting models the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    MultipleRegression,
    GradientBoost,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearRegression,
        ModelKind::MultipleRegression,
        ModelKind::GradientBoost,
    ];
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinearRegression => write!(f, "Linear Regression"),
            Self::MultipleRegression => write!(f, "Multiple Regression"),
            Self::GradientBoost => write!(f, "Gradient Boosting"),
        }
    }
}

/// Granularity of a long-range yearly projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    Monthly,
    Yearly,
    Decadely,
}

impl Default for ProjectionMode {
    fn default() -> Self {
        Self::Yearly
    }
}

impl ProjectionMode {
    /// Number of simulated future steps.
    pub fn steps(self) -> usize {
        match self {
            Self::Monthly => 12,
            Self::Yearly => 10,
            Self::Decadely => 100,
        }
    }

    /// Step length in years.
    pub fn interval(self) -> f64 {
        match self {
            Self::Monthly => 1.0 / 12.0,
            Self::Yearly | Self::Decadely => 1.0,
        }
    }
}

impl std::fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "Monthly"),
            Self::Yearly => write!(f, "Yearly"),
            Self::Decadely => write!(f, "Decadely"),
        }
    }
}

impl std::str::FromStr for ProjectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "decadely" => Ok(Self::Decadely),
            other => Err(format!("unknown projection mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_serde_names() {
        let json = serde_json::to_string(&ModelKind::GradientBoost).unwrap();
        assert_eq!(json, "\"gradient_boost\"");
        let kind: ModelKind = serde_json::from_str("\"linear_regression\"").unwrap();
        assert_eq!(kind, ModelKind::LinearRegression);
    }

    #[test]
    fn projection_mode_parameters() {
        assert_eq!(ProjectionMode::Monthly.steps(), 12);
        assert!((ProjectionMode::Monthly.interval() - 1.0 / 12.0).abs() < 1e-12);
        assert_eq!(ProjectionMode::Decadely.steps(), 100);
        assert_eq!("YEARLY".parse::<ProjectionMode>().unwrap(), ProjectionMode::Yearly);
        assert!("weekly".parse::<ProjectionMode>().is_err());
    }
}
