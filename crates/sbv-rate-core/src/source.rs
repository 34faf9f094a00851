use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trust tier of a source, used by the priority policy and chain ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// State Bank of Vietnam endpoints and pages.
    Official,
    /// Commercial bank feeds quoting their own USD rates.
    Bank,
    /// Generic international currency APIs.
    International,
}

impl SourceTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Bank => "bank",
            Self::International => "international",
        }
    }
}

impl Display for SourceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical source identifiers used in reports and CLI selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    SbvApi,
    SbvEnglish,
    SbvVietnamese,
    SbvRendered,
    Vietcombank,
    Bidv,
    Agribank,
    ExchangerateApi,
}

impl SourceId {
    pub const ALL: [Self; 8] = [
        Self::SbvApi,
        Self::SbvEnglish,
        Self::SbvVietnamese,
        Self::SbvRendered,
        Self::Vietcombank,
        Self::Bidv,
        Self::Agribank,
        Self::ExchangerateApi,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SbvApi => "sbv-api",
            Self::SbvEnglish => "sbv-english",
            Self::SbvVietnamese => "sbv-vietnamese",
            Self::SbvRendered => "sbv-rendered",
            Self::Vietcombank => "vietcombank",
            Self::Bidv => "bidv",
            Self::Agribank => "agribank",
            Self::ExchangerateApi => "exchangerate-api",
        }
    }

    pub const fn tier(self) -> SourceTier {
        match self {
            Self::SbvApi | Self::SbvEnglish | Self::SbvVietnamese | Self::SbvRendered => {
                SourceTier::Official
            }
            Self::Vietcombank | Self::Bidv | Self::Agribank => SourceTier::Bank,
            Self::ExchangerateApi => SourceTier::International,
        }
    }

    /// Official SBV sources in default priority order.
    pub fn official() -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|id| id.tier() == SourceTier::Official)
            .collect()
    }

    fn expected_values() -> String {
        Self::ALL
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidSource {
                value: value.trim().to_owned(),
                expected: Self::expected_values(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_case_insensitively() {
        assert_eq!("SBV-English".parse::<SourceId>(), Ok(SourceId::SbvEnglish));
        assert_eq!("exchangerate_api".parse::<SourceId>(), Ok(SourceId::ExchangerateApi));
    }

    #[test]
    fn rejects_unknown_source_with_expected_list() {
        let err = "yahoo".parse::<SourceId>().expect_err("unknown source");
        let message = err.to_string();
        assert!(message.contains("yahoo"));
        assert!(message.contains("vietcombank"));
    }

    #[test]
    fn official_sources_come_first_in_catalog_order() {
        assert_eq!(
            SourceId::official(),
            vec![
                SourceId::SbvApi,
                SourceId::SbvEnglish,
                SourceId::SbvVietnamese,
                SourceId::SbvRendered
            ]
        );
    }

    #[test]
    fn serializes_as_kebab_case() {
        let json = serde_json::to_string(&SourceId::SbvVietnamese).expect("serialize");
        assert_eq!(json, "\"sbv-vietnamese\"");
    }
}
