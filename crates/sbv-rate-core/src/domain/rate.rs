use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use time::Date;

use crate::{SourceId, ValidationError};

/// Unit a published number is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteScale {
    /// VND per USD, e.g. `23977`.
    Unit,
    /// Thousand VND per USD, e.g. `23.977` on the SBV results page.
    Thousands,
}

impl QuoteScale {
    pub fn factor(self) -> Decimal {
        match self {
            Self::Unit => Decimal::ONE,
            Self::Thousands => Decimal::ONE_THOUSAND,
        }
    }
}

/// Inclusive range a USD/VND value must fall in to be believed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlausibilityBand {
    lower: Decimal,
    upper: Decimal,
}

impl PlausibilityBand {
    pub fn new(lower: Decimal, upper: Decimal) -> Result<Self, ValidationError> {
        if lower <= Decimal::ZERO || upper <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveBand {
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }
        if lower > upper {
            return Err(ValidationError::InvertedBand {
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }
        Ok(Self { lower, upper })
    }

    /// 20000–30000 VND.
    pub fn standard() -> Self {
        Self {
            lower: Decimal::from(20_000),
            upper: Decimal::from(30_000),
        }
    }

    /// 24000–28000 VND, the narrower band used against rendered SBV pages.
    pub fn strict() -> Self {
        Self {
            lower: Decimal::from(24_000),
            upper: Decimal::from(28_000),
        }
    }

    pub const fn lower(&self) -> Decimal {
        self.lower
    }

    pub const fn upper(&self) -> Decimal {
        self.upper
    }

    pub fn contains(&self, value: Decimal, scale: QuoteScale) -> bool {
        let vnd = value * scale.factor();
        self.lower <= vnd && vnd <= self.upper
    }

    /// The only way to obtain a [`RateCandidate`]: out-of-band values yield `None`.
    pub fn admit(&self, value: Decimal, scale: QuoteScale, source: SourceId) -> Option<RateCandidate> {
        self.contains(value, scale).then_some(RateCandidate {
            value,
            scale,
            source,
        })
    }
}

impl Default for PlausibilityBand {
    fn default() -> Self {
        Self::standard()
    }
}

impl FromStr for PlausibilityBand {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "standard" => return Ok(Self::standard()),
            "strict" => return Ok(Self::strict()),
            _ => {}
        }

        let invalid = || ValidationError::InvalidBand {
            value: trimmed.to_owned(),
        };
        let (lower, upper) = trimmed.split_once('-').ok_or_else(invalid)?;
        let lower = Decimal::from_str(lower.trim()).map_err(|_| invalid())?;
        let upper = Decimal::from_str(upper.trim()).map_err(|_| invalid())?;
        Self::new(lower, upper)
    }
}

impl Display for PlausibilityBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}

/// In-band numeric value extracted from one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateCandidate {
    value: Decimal,
    scale: QuoteScale,
    source: SourceId,
}

impl RateCandidate {
    pub const fn value(&self) -> Decimal {
        self.value
    }

    pub const fn scale(&self) -> QuoteScale {
        self.scale
    }

    pub const fn source(&self) -> SourceId {
        self.source
    }

    pub fn vnd_per_usd(&self) -> Decimal {
        self.value * self.scale.factor()
    }
}

/// Where a resolved rate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateOrigin {
    Source(SourceId),
    Averaged(Vec<SourceId>),
}

impl RateOrigin {
    pub fn label(&self) -> String {
        match self {
            Self::Source(id) => id.as_str().to_owned(),
            Self::Averaged(_) => String::from("averaged"),
        }
    }
}

impl Serialize for RateOrigin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.label())
    }
}

/// Terminal output of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRate {
    pub value: Decimal,
    pub scale: QuoteScale,
    pub origin: RateOrigin,
    pub contributing_sources: Vec<SourceId>,
    #[serde(serialize_with = "serialize_iso_date")]
    pub query_date: Date,
}

impl ResolvedRate {
    pub fn from_candidate(candidate: &RateCandidate, query_date: Date) -> Self {
        Self {
            value: candidate.value(),
            scale: candidate.scale(),
            origin: RateOrigin::Source(candidate.source()),
            contributing_sources: vec![candidate.source()],
            query_date,
        }
    }

    /// Mean of the candidates in VND units. `None` when empty.
    pub fn averaged(candidates: &[RateCandidate], query_date: Date) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }

        let total: Decimal = candidates.iter().map(RateCandidate::vnd_per_usd).sum();
        let mean = total / Decimal::from(candidates.len());
        let sources = candidates.iter().map(RateCandidate::source).collect::<Vec<_>>();

        Some(Self {
            value: mean.normalize(),
            scale: QuoteScale::Unit,
            origin: RateOrigin::Averaged(sources.clone()),
            contributing_sources: sources,
            query_date,
        })
    }

    pub fn vnd_per_usd(&self) -> Decimal {
        self.value * self.scale.factor()
    }
}

pub(crate) fn serialize_iso_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&format_args!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn band_admits_only_in_range_values() {
        let band = PlausibilityBand::standard();
        assert!(band.admit(dec!(23977), QuoteScale::Unit, SourceId::Bidv).is_some());
        assert!(band.admit(dec!(20000), QuoteScale::Unit, SourceId::Bidv).is_some());
        assert!(band.admit(dec!(30000), QuoteScale::Unit, SourceId::Bidv).is_some());
        assert!(band.admit(dec!(19999.99), QuoteScale::Unit, SourceId::Bidv).is_none());
        assert!(band.admit(dec!(2023), QuoteScale::Unit, SourceId::Bidv).is_none());
    }

    #[test]
    fn thousands_scale_is_checked_in_vnd() {
        let band = PlausibilityBand::standard();
        let candidate = band
            .admit(dec!(23.977), QuoteScale::Thousands, SourceId::SbvEnglish)
            .expect("23.977 thousand VND is in band");
        assert_eq!(candidate.value(), dec!(23.977));
        assert_eq!(candidate.vnd_per_usd(), dec!(23977));
        assert!(band.admit(dec!(23.977), QuoteScale::Unit, SourceId::SbvEnglish).is_none());
    }

    #[test]
    fn strict_band_narrows_the_range() {
        let band = PlausibilityBand::strict();
        assert!(!band.contains(dec!(23977), QuoteScale::Unit));
        assert!(band.contains(dec!(26217), QuoteScale::Unit));
    }

    #[test]
    fn parses_band_presets_and_ranges() {
        assert_eq!("standard".parse(), Ok(PlausibilityBand::standard()));
        assert_eq!("STRICT".parse(), Ok(PlausibilityBand::strict()));
        let custom: PlausibilityBand = "22000-26000".parse().expect("valid range");
        assert_eq!(custom.lower(), dec!(22000));
        assert_eq!(custom.upper(), dec!(26000));
        assert!(matches!(
            "26000-22000".parse::<PlausibilityBand>(),
            Err(ValidationError::InvertedBand { .. })
        ));
        assert!(matches!(
            "wide".parse::<PlausibilityBand>(),
            Err(ValidationError::InvalidBand { .. })
        ));
    }

    #[test]
    fn averaged_rate_uses_vnd_units() {
        let band = PlausibilityBand::standard();
        let date = Date::from_calendar_date(2023, time::Month::September, 1).expect("date");
        let candidates = vec![
            band.admit(dec!(23977), QuoteScale::Unit, SourceId::Vietcombank)
                .expect("in band"),
            band.admit(dec!(24.011), QuoteScale::Thousands, SourceId::Bidv)
                .expect("in band"),
        ];

        let rate = ResolvedRate::averaged(&candidates, date).expect("non-empty");
        assert_eq!(rate.value, dec!(23994));
        assert_eq!(rate.scale, QuoteScale::Unit);
        assert_eq!(rate.origin.label(), "averaged");
        assert_eq!(
            rate.contributing_sources,
            vec![SourceId::Vietcombank, SourceId::Bidv]
        );
    }
}
