//! Keyword candidates, their metrics, and domain availability.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level domains checked for every accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tld {
    /// `.com`
    Com,
    /// `.net`
    Net,
    /// `.org`
    Org,
}

impl Tld {
    /// All supported extensions, in display order.
    pub const ALL: [Self; 3] = [Self::Com, Self::Net, Self::Org];

    /// Extension without the leading dot.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Com => "com",
            Self::Net => "net",
            Self::Org => "org",
        }
    }

    /// Full domain name for `base` under this extension.
    #[must_use]
    pub fn domain(&self, base: &str) -> String {
        format!("{base}.{}", self.as_str())
    }
}

impl fmt::Display for Tld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tld {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "com" => Ok(Self::Com),
            "net" => Ok(Self::Net),
            "org" => Ok(Self::Org),
            other => Err(format!("unsupported TLD: {other}")),
        }
    }
}

/// Search metrics for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    /// Monthly search volume.
    pub search_volume: u64,
    /// Cost per click in dollars.
    pub cpc: f64,
    /// Diagnostic from the lookup, if any. Does not make the numbers unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Availability of one domain name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainAvailability {
    /// Whether the domain can be registered.
    pub available: bool,
    /// Whether the registry prices it as a premium name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
    /// Registration price as quoted by the registrar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<String>,
    /// Renewal price as quoted by the registrar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_price: Option<String>,
    /// Why the lookup could not be completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DomainAvailability {
    /// An unknown result, conservatively reported as unavailable.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            error_message: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Where a result's metrics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    /// Returned by the metrics service.
    Live,
    /// Synthesized after the metrics service could not be reached.
    Fallback,
}

/// One accepted keyword niche, ready for display.
///
/// Only built when both search volume and CPC fall inside the criteria used
/// for the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    /// Stable identifier derived from the city/niche pair.
    pub id: String,
    /// Composed keyword, e.g. "plumber austin".
    pub keyword: String,
    /// City label, e.g. "Austin, TX".
    pub city: String,
    /// Niche label.
    pub niche: String,
    /// Monthly search volume.
    pub search_volume: u64,
    /// Cost per click in dollars.
    pub cpc: f64,
    /// Population of the city, when known.
    pub population: Option<u64>,
    /// Exact-match domain without extension, e.g. "plumberaustin".
    pub domain_base: String,
    /// Exact-match `.com` domain for display.
    pub exact_match_domain: String,
    /// Availability per extension.
    pub availability: BTreeMap<Tld, bool>,
    /// Registration deep link per extension; `None` unless available.
    pub registration_links: BTreeMap<Tld, Option<String>>,
    /// Whether the metrics are live or synthesized.
    pub metrics_source: MetricsSource,
}

/// Build the keyword for a city/niche pair: lower-cased, single-spaced.
#[must_use]
pub fn compose_keyword(city: &str, niche: &str, location_first: bool) -> String {
    let (first, second) = if location_first {
        (city, niche)
    } else {
        (niche, city)
    };

    first
        .split_whitespace()
        .chain(second.split_whitespace())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the exact-match domain base from a keyword.
///
/// Whitespace is removed, as is anything else that cannot appear in a
/// hostname label ("st. louis" becomes "stlouis").
#[must_use]
pub fn compose_domain_base(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .flat_map(char::to_lowercase)
        .collect()
}
