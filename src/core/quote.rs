//! Quote types shared by sources and view models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Fiat currencies the converter can quote BTC in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    Bam,
    Usd,
    Aud,
    Eur,
    Cad,
}

impl CurrencyCode {
    /// Supported currencies in display order; the first one is the default selection.
    pub const SUPPORTED: [CurrencyCode; 5] = [
        CurrencyCode::Bam,
        CurrencyCode::Usd,
        CurrencyCode::Aud,
        CurrencyCode::Eur,
        CurrencyCode::Cad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Bam => "BAM",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Cad => "CAD",
        }
    }

    /// Prefix used when formatting an amount in this currency (en-US conventions).
    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Bam => "BAM\u{a0}",
            CurrencyCode::Usd => "$",
            CurrencyCode::Aud => "A$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Cad => "CA$",
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        CurrencyCode::SUPPORTED[0]
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BAM" => Ok(CurrencyCode::Bam),
            "USD" => Ok(CurrencyCode::Usd),
            "AUD" => Ok(CurrencyCode::Aud),
            "EUR" => Ok(CurrencyCode::Eur),
            "CAD" => Ok(CurrencyCode::Cad),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

/// Current BTC rate in one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub code: CurrencyCode,
    pub rate: f64,
    pub as_of: DateTime<Utc>,
}

/// Previous day's closing rate, used to derive the percentage change.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub close_rate: f64,
}

impl HistoricalPoint {
    /// Percentage change from this close to `current_rate`. `None` when the close is zero.
    pub fn change_to(&self, current_rate: f64) -> Option<f64> {
        if self.close_rate == 0.0 {
            return None;
        }
        let change = (current_rate - self.close_rate) * 100.0 / self.close_rate;
        change.is_finite().then_some(change)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetMetadata {
    pub symbol: String,
    pub image_url: String,
}

/// One row of the market ranking, as returned by the ranking source.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub symbol: String,
    pub name: String,
    pub price_in_base_currency: f64,
    pub rank: u32,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_parsing() {
        for code in CurrencyCode::SUPPORTED {
            assert_eq!(code.as_str().parse::<CurrencyCode>().unwrap(), code);
        }
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::Eur);
        assert!("GBP".parse::<CurrencyCode>().is_err());
        assert_eq!(CurrencyCode::default(), CurrencyCode::Bam);
    }

    #[test]
    fn test_change_from_close() {
        let point = HistoricalPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            close_rate: 200.0,
        };
        assert_eq!(point.change_to(210.0), Some(5.0));
        assert_eq!(point.change_to(190.0), Some(-5.0));

        let zero = HistoricalPoint {
            close_rate: 0.0,
            ..point
        };
        assert_eq!(zero.change_to(210.0), None);
    }
}
