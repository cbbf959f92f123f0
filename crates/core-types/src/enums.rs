use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The broad asset class a holding belongs to. Allocation scenarios assign weights per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    FixedIncome,
    Commodity,
    RealEstate,
    Crypto,
    Alternative,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; 7] = [
        AssetClass::Equity,
        AssetClass::FixedIncome,
        AssetClass::Commodity,
        AssetClass::RealEstate,
        AssetClass::Crypto,
        AssetClass::Alternative,
        AssetClass::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::FixedIncome => "fixed_income",
            AssetClass::Commodity => "commodity",
            AssetClass::RealEstate => "real_estate",
            AssetClass::Crypto => "crypto",
            AssetClass::Alternative => "alternative",
            AssetClass::Cash => "cash",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        AssetClass::ALL
            .into_iter()
            .find(|class| class.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidInput("asset_class".to_string(), s.to_string()))
    }
}

/// How often observations in a price or return series are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl SamplingFrequency {
    /// Number of periods in one year, used to annualize returns and volatility.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            SamplingFrequency::Daily => 252.0,
            SamplingFrequency::Weekly => 52.0,
            SamplingFrequency::Monthly => 12.0,
            SamplingFrequency::Quarterly => 4.0,
            SamplingFrequency::Annual => 1.0,
        }
    }

    /// Infers the sampling frequency from the median gap between consecutive dates.
    ///
    /// Returns `None` when fewer than two dates are supplied.
    pub fn infer(dates: &[NaiveDate]) -> Option<Self> {
        if dates.len() < 2 {
            return None;
        }
        let mut gaps: Vec<i64> = dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();
        gaps.sort_unstable();
        let median = gaps[gaps.len() / 2];

        // Weekends put three days between consecutive trading sessions.
        let frequency = match median {
            i64::MIN..=4 => SamplingFrequency::Daily,
            5..=10 => SamplingFrequency::Weekly,
            11..=45 => SamplingFrequency::Monthly,
            46..=135 => SamplingFrequency::Quarterly,
            _ => SamplingFrequency::Annual,
        };
        Some(frequency)
    }
}

/// The investor's risk appetite. Each profile maps to a maximum acceptable annualized volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
    /// An explicit maximum volatility, e.g. `0.12` for 12%.
    Custom(f64),
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskProfile::Conservative => f.write_str("conservative"),
            RiskProfile::Moderate => f.write_str("moderate"),
            RiskProfile::Aggressive => f.write_str("aggressive"),
            RiskProfile::Custom(max_vol) => write!(f, "custom({max_vol})"),
        }
    }
}

impl FromStr for RiskProfile {
    type Err = CoreError;

    /// Accepts `conservative`, `moderate`, `aggressive`, or a bare volatility such as `0.12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "moderate" => Ok(RiskProfile::Moderate),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => {
                let value = other.strip_prefix("custom:").unwrap_or(other);
                match value.parse::<f64>() {
                    Ok(v) if v.is_finite() && v > 0.0 => Ok(RiskProfile::Custom(v)),
                    _ => Err(CoreError::InvalidInput(
                        "risk_profile".to_string(),
                        s.to_string(),
                    )),
                }
            }
        }
    }
}
