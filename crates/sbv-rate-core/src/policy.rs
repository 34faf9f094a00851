use std::fmt::{Display, Formatter};
use std::str::FromStr;

use time::Date;

use crate::{RateCandidate, ResolvedRate, SourceId, SourceTier, ValidationError};

/// Candidates observed from one source, in query order.
pub type Observation = (SourceId, Vec<RateCandidate>);

/// Walks a priority list of sources, then falls back to bank and
/// international tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityPolicy {
    priority: Vec<SourceId>,
}

impl PriorityPolicy {
    pub fn new(priority: Vec<SourceId>) -> Result<Self, ValidationError> {
        let priority = dedupe(&priority);
        if priority.is_empty() {
            return Err(ValidationError::EmptySourceList);
        }
        Ok(Self { priority })
    }

    /// Listed sources first, then official sources outside the list: an
    /// official hit always outranks bank feeds.
    fn ranks_first(&self, source: SourceId) -> bool {
        self.priority.contains(&source) || source.tier() == SourceTier::Official
    }

    fn resolve(&self, observed: &[Observation], query_date: Date) -> Option<ResolvedRate> {
        let first_of = |source: SourceId| {
            observed
                .iter()
                .find(|(id, candidates)| *id == source && !candidates.is_empty())
                .and_then(|(_, candidates)| candidates.first())
        };

        let listed = self.priority.iter().filter_map(|source| first_of(*source));
        let other_official = observed
            .iter()
            .filter(|(id, _)| id.tier() == SourceTier::Official && !self.priority.contains(id))
            .filter_map(|(_, candidates)| candidates.first());
        if let Some(candidate) = listed.chain(other_official).next() {
            return Some(ResolvedRate::from_candidate(candidate, query_date));
        }

        let bank = self.first_per_source(observed, SourceTier::Bank);
        match bank.as_slice() {
            [] => {}
            [single] => return Some(ResolvedRate::from_candidate(single, query_date)),
            several => return ResolvedRate::averaged(several, query_date),
        }

        self.first_per_source(observed, SourceTier::International)
            .first()
            .map(|candidate| ResolvedRate::from_candidate(candidate, query_date))
    }

    fn first_per_source(&self, observed: &[Observation], tier: SourceTier) -> Vec<RateCandidate> {
        observed
            .iter()
            .filter(|(id, _)| id.tier() == tier && !self.ranks_first(*id))
            .filter_map(|(_, candidates)| candidates.first().copied())
            .collect()
    }
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            priority: SourceId::official(),
        }
    }
}

/// How per-source candidates become one [`ResolvedRate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPolicy {
    Priority(PriorityPolicy),
    /// Upper middle of every in-band candidate, ordered by VND value.
    Median,
}

impl ResolutionPolicy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Priority(_) => "priority",
            Self::Median => "median",
        }
    }

    /// Picks the rate from observations in query order. `None` when no
    /// candidate qualifies.
    pub fn resolve(&self, observed: &[Observation], query_date: Date) -> Option<ResolvedRate> {
        match self {
            Self::Priority(policy) => policy.resolve(observed, query_date),
            Self::Median => median(observed, query_date),
        }
    }

    /// `true` when no later source in chain order can change the outcome.
    pub fn is_decisive(&self, source: SourceId, candidates: &[RateCandidate]) -> bool {
        match self {
            Self::Priority(policy) => !candidates.is_empty() && policy.ranks_first(source),
            Self::Median => false,
        }
    }

    /// Query order: priority-list sources first, then the rest by tier.
    pub fn chain_order(&self, sources: &[SourceId]) -> Vec<SourceId> {
        let sources = dedupe(sources);
        let mut chain = match self {
            Self::Priority(policy) => policy
                .priority
                .iter()
                .copied()
                .filter(|id| sources.contains(id))
                .collect::<Vec<_>>(),
            Self::Median => Vec::new(),
        };

        let mut rest = sources
            .into_iter()
            .filter(|id| !chain.contains(id))
            .collect::<Vec<_>>();
        rest.sort_by_key(|id| id.tier());
        chain.extend(rest);
        chain
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::Priority(PriorityPolicy::default())
    }
}

impl Display for ResolutionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResolutionPolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(Self::default()),
            "median" => Ok(Self::Median),
            _ => Err(ValidationError::InvalidPolicy {
                value: value.trim().to_owned(),
            }),
        }
    }
}

fn median(observed: &[Observation], query_date: Date) -> Option<ResolvedRate> {
    let mut all = observed
        .iter()
        .flat_map(|(_, candidates)| candidates.iter().copied())
        .collect::<Vec<_>>();
    if all.is_empty() {
        return None;
    }

    all.sort_by_key(RateCandidate::vnd_per_usd);
    all.get(all.len() / 2)
        .map(|candidate| ResolvedRate::from_candidate(candidate, query_date))
}

fn dedupe(sources: &[SourceId]) -> Vec<SourceId> {
    let mut seen = Vec::with_capacity(sources.len());
    for source in sources {
        if !seen.contains(source) {
            seen.push(*source);
        }
    }
    seen
}
