//! Cities and niches: the two universes the candidate generator pairs up.
//!
//! Both are bulk-imported and read-only afterwards. A re-import replaces the
//! whole set, so records carry no update timestamps.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{CityId, NicheId};

/// An imported city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Identifier assigned at import.
    pub id: CityId,
    /// City name as displayed (e.g. "Austin").
    pub name: String,
    /// Two-letter region code, upper-cased (e.g. "TX").
    pub state: String,
    /// Population.
    pub population: u64,
}

impl City {
    /// "Austin, TX".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.state)
    }
}

/// A city as submitted for import, before an identifier is assigned.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewCity {
    /// City name.
    pub name: String,
    /// Two-letter region code.
    pub state: String,
    /// Population.
    pub population: u64,
}

impl NewCity {
    /// Validate and normalize the record into a storable [`City`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCity` if the name is blank or the region code
    /// is not exactly two ASCII letters.
    pub fn into_city(self) -> Result<City> {
        let name = self.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(CoreError::InvalidCity {
                name: self.name,
                reason: "name is empty".into(),
            });
        }

        let state = self.state.trim().to_ascii_uppercase();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidCity {
                name,
                reason: format!("region code {:?} is not two letters", self.state),
            });
        }

        Ok(City {
            id: CityId::generate(),
            name,
            state,
            population: self.population,
        })
    }
}

/// An imported niche (business category label such as "Plumber").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Niche {
    /// Identifier assigned at import.
    pub id: NicheId,
    /// Category label.
    pub name: String,
}

/// A niche as submitted for import.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewNiche {
    /// Category label.
    pub name: String,
}

impl NewNiche {
    /// Validate and normalize the record into a storable [`Niche`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidNiche` if the name is blank.
    pub fn into_niche(self) -> Result<Niche> {
        let name = self.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(CoreError::InvalidNiche("name is empty".into()));
        }
        Ok(Niche {
            id: NicheId::generate(),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_import_normalizes_fields() {
        let city = NewCity {
            name: "  San   Antonio ".into(),
            state: "tx".into(),
            population: 1_400_000,
        }
        .into_city()
        .unwrap();

        assert_eq!(city.name, "San Antonio");
        assert_eq!(city.state, "TX");
        assert_eq!(city.display_name(), "San Antonio, TX");
    }

    #[test]
    fn city_import_rejects_bad_region_code() {
        let err = NewCity {
            name: "Austin".into(),
            state: "Texas".into(),
            population: 1,
        }
        .into_city()
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCity { .. }));
    }

    #[test]
    fn niche_import_rejects_blank_name() {
        assert!(NewNiche { name: "   ".into() }.into_niche().is_err());
        let niche = NewNiche { name: " Tree  Service".into() }.into_niche().unwrap();
        assert_eq!(niche.name, "Tree Service");
    }
}
