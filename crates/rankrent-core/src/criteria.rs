//! Search criteria submitted with each discovery request.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{CityId, NicheId};

/// An inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange<T> {
    /// Lower bound (inclusive).
    pub min: T,
    /// Upper bound (inclusive).
    pub max: T,
}

impl<T: PartialOrd + Copy> ValueRange<T> {
    /// Create a new range.
    #[must_use]
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Criteria for one search. Constructed per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Restrict the search to a single niche.
    #[serde(default)]
    pub niche_id: Option<NicheId>,
    /// Restrict the search to a single city.
    #[serde(default)]
    pub city_id: Option<CityId>,
    /// Accepted monthly search volume.
    pub search_volume: ValueRange<u64>,
    /// Accepted cost-per-click in dollars.
    pub cpc: ValueRange<f64>,
    /// Accepted city population, if filtering by size.
    #[serde(default)]
    pub population: Option<ValueRange<u64>>,
    /// `true` builds "austin plumber", `false` builds "plumber austin".
    #[serde(default)]
    pub location_first: bool,
}

impl SearchCriteria {
    /// Check that every range is well-formed.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRange` when a lower bound exceeds its upper
    /// bound or a CPC bound is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.search_volume.min > self.search_volume.max {
            return Err(CoreError::InvalidRange {
                field: "search_volume",
                reason: "min exceeds max".into(),
            });
        }

        if !self.cpc.min.is_finite() || !self.cpc.max.is_finite() {
            return Err(CoreError::InvalidRange {
                field: "cpc",
                reason: "bounds must be finite".into(),
            });
        }
        if self.cpc.min < 0.0 {
            return Err(CoreError::InvalidRange {
                field: "cpc",
                reason: "min must not be negative".into(),
            });
        }
        if self.cpc.min > self.cpc.max {
            return Err(CoreError::InvalidRange {
                field: "cpc",
                reason: "min exceeds max".into(),
            });
        }

        if let Some(population) = &self.population {
            if population.min > population.max {
                return Err(CoreError::InvalidRange {
                    field: "population",
                    reason: "min exceeds max".into(),
                });
            }
        }

        Ok(())
    }

    /// Whether a city of this population passes the optional size filter.
    #[must_use]
    pub fn accepts_population(&self, population: u64) -> bool {
        self.population
            .as_ref()
            .map_or(true, |range| range.contains(population))
    }
}
