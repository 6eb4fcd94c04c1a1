//! Candidate generation and the search loop.

use std::sync::Arc;

use rankrent_core::{
    compose_domain_base, compose_keyword, City, KeywordResult, MetricsSource, Niche, Outcome,
    SearchCriteria, Tld,
};
use rankrent_store::Store;

use crate::config::EngineConfig;
use crate::domains::DomainAggregator;
use crate::error::{EngineError, Result};
use crate::metrics::MetricsFetcher;
use crate::remote::{DomainService, MetricsService};

/// What a search produced.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Accepted candidates in traversal order, at most the result cap.
    pub results: Vec<KeywordResult>,
    /// Human-readable scope, e.g. "all niches in Austin, TX".
    pub label: String,
    /// Candidates that reached the metrics lookup.
    pub candidates_evaluated: usize,
    /// Candidates outside the volume or CPC range.
    pub rejected: usize,
    /// Candidates without usable metrics.
    pub skipped: usize,
}

enum Candidate {
    Accepted(Box<KeywordResult>),
    Rejected,
    Skipped,
}

/// Walks the city x niche cross product and collects matching keywords.
///
/// Candidates are evaluated one at a time in city-major, niche-minor order,
/// and the walk stops as soon as the result cap is reached.
#[derive(Clone)]
pub struct SearchOrchestrator {
    store: Arc<dyn Store>,
    metrics: MetricsFetcher,
    domains: DomainAggregator,
    config: EngineConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        metrics_service: Arc<dyn MetricsService>,
        domain_service: Arc<dyn DomainService>,
        config: EngineConfig,
    ) -> Self {
        let mut metrics = MetricsFetcher::new(metrics_service, config.metrics_delay);
        if !config.fallback_metrics {
            metrics = metrics.without_fallback();
        }
        let domains = DomainAggregator::new(
            domain_service,
            config.tlds.clone(),
            config.registration_link_template.clone(),
        );

        Self {
            store,
            metrics,
            domains,
            config,
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCriteria` for malformed ranges and
    /// `EngineError::Universe` when cities or niches cannot be loaded.
    /// Upstream metrics and domain failures never fail the search.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchReport> {
        criteria.validate()?;

        let cities = self.resolve_cities(criteria).await?;
        let niches = self.resolve_niches(criteria).await?;

        let mut report = SearchReport {
            label: describe(criteria, &cities, &niches),
            ..SearchReport::default()
        };

        tracing::info!(
            cities = cities.len(),
            niches = niches.len(),
            scope = %report.label,
            "Starting niche search"
        );

        'cities: for city in &cities {
            for niche in &niches {
                if report.results.len() >= self.config.result_cap {
                    break 'cities;
                }

                report.candidates_evaluated += 1;
                match self.evaluate(city, niche, criteria).await {
                    Candidate::Accepted(result) => report.results.push(*result),
                    Candidate::Rejected => report.rejected += 1,
                    Candidate::Skipped => report.skipped += 1,
                }
            }
        }

        tracing::info!(
            scope = %report.label,
            results = report.results.len(),
            evaluated = report.candidates_evaluated,
            rejected = report.rejected,
            skipped = report.skipped,
            "Niche search finished"
        );

        Ok(report)
    }

    async fn resolve_cities(&self, criteria: &SearchCriteria) -> Result<Vec<City>> {
        let failed = |source| EngineError::Universe {
            universe: "cities",
            source,
        };

        if let Some(city_id) = &criteria.city_id {
            let city = self.store.get_city(city_id).await.map_err(failed)?;
            return Ok(match city {
                Some(city) if criteria.accepts_population(city.population) => vec![city],
                Some(city) => {
                    tracing::debug!(city = %city.display_name(), "Selected city outside population range");
                    Vec::new()
                }
                None => {
                    tracing::warn!(city_id = %city_id, "Selected city not found");
                    Vec::new()
                }
            });
        }

        let mut cities = self
            .store
            .list_cities(criteria.population)
            .await
            .map_err(failed)?;
        cities.truncate(self.config.city_sample);
        Ok(cities)
    }

    async fn resolve_niches(&self, criteria: &SearchCriteria) -> Result<Vec<Niche>> {
        let failed = |source| EngineError::Universe {
            universe: "niches",
            source,
        };

        if let Some(niche_id) = &criteria.niche_id {
            let niche = self.store.get_niche(niche_id).await.map_err(failed)?;
            if niche.is_none() {
                tracing::warn!(niche_id = %niche_id, "Selected niche not found");
            }
            return Ok(niche.into_iter().collect());
        }

        // A single city has few candidates, so look at more niches for it.
        let sample = if criteria.city_id.is_some() {
            self.config.single_city_niche_sample
        } else {
            self.config.niche_sample
        };

        let mut niches = self.store.list_niches().await.map_err(failed)?;
        niches.truncate(sample);
        Ok(niches)
    }

    async fn evaluate(&self, city: &City, niche: &Niche, criteria: &SearchCriteria) -> Candidate {
        let keyword = compose_keyword(&city.name, &niche.name, criteria.location_first);

        let (metrics, metrics_source) = match self.metrics.fetch(&keyword).await {
            Outcome::Ok(metrics) => (metrics, MetricsSource::Live),
            Outcome::Degraded(metrics, _) => (metrics, MetricsSource::Fallback),
            Outcome::Failed(reason) => {
                tracing::debug!(keyword = %keyword, reason = %reason, "Skipping candidate without metrics");
                return Candidate::Skipped;
            }
        };

        if !criteria.search_volume.contains(metrics.search_volume)
            || !criteria.cpc.contains(metrics.cpc)
        {
            tracing::debug!(
                keyword = %keyword,
                search_volume = metrics.search_volume,
                cpc = metrics.cpc,
                "Candidate outside filters"
            );
            return Candidate::Rejected;
        }

        let domain_base = compose_domain_base(&keyword);
        let domains = self.domains.check(&domain_base).await;

        tracing::debug!(keyword = %keyword, domain_base = %domain_base, "Candidate accepted");

        Candidate::Accepted(Box::new(KeywordResult {
            id: format!("{}-{}", city.id, niche.id),
            city: city.display_name(),
            niche: niche.name.clone(),
            search_volume: metrics.search_volume,
            cpc: metrics.cpc,
            population: Some(city.population),
            exact_match_domain: Tld::Com.domain(&domain_base),
            domain_base,
            availability: domains.availability,
            registration_links: domains.registration_links,
            metrics_source,
            keyword,
        }))
    }
}

/// Describe the search scope for usage records.
fn describe(criteria: &SearchCriteria, cities: &[City], niches: &[Niche]) -> String {
    let what = match (&criteria.niche_id, niches.first()) {
        (Some(_), Some(niche)) => niche.name.to_lowercase(),
        (Some(niche_id), None) => format!("unknown niche {niche_id}"),
        (None, _) => "all niches".to_string(),
    };

    match (&criteria.city_id, cities.first()) {
        (Some(_), Some(city)) => format!("{what} in {}", city.display_name()),
        (Some(city_id), None) => format!("{what} in city {city_id}"),
        _ if cities.len() == 1 => format!("{what} across 1 city"),
        _ => format!("{what} across {} cities", cities.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankrent_core::{CityId, NicheId, ValueRange};

    fn criteria(city: Option<CityId>, niche: Option<NicheId>) -> SearchCriteria {
        SearchCriteria {
            niche_id: niche,
            city_id: city,
            search_volume: ValueRange::new(0, 1_000),
            cpc: ValueRange::new(0.0, 10.0),
            population: None,
            location_first: false,
        }
    }

    fn austin() -> City {
        City {
            id: CityId::generate(),
            name: "Austin".into(),
            state: "TX".into(),
            population: 960_000,
        }
    }

    fn plumber() -> Niche {
        Niche {
            id: NicheId::generate(),
            name: "Plumber".into(),
        }
    }

    #[test]
    fn label_names_the_selection() {
        let city = austin();
        let niche = plumber();

        assert_eq!(
            describe(&criteria(Some(city.id), Some(niche.id)), &[city.clone()], &[niche.clone()]),
            "plumber in Austin, TX"
        );
        assert_eq!(
            describe(&criteria(Some(city.id), None), &[city.clone()], &[niche.clone()]),
            "all niches in Austin, TX"
        );
        assert_eq!(
            describe(&criteria(None, Some(niche.id)), &[city.clone(), city.clone()], &[niche]),
            "plumber across 2 cities"
        );
        assert_eq!(
            describe(&criteria(None, None), &[city], &[]),
            "all niches across 1 city"
        );
    }

    #[test]
    fn label_keeps_a_missing_selection() {
        let city = austin();
        let missing_niche = NicheId::generate();
        let missing_city = CityId::generate();

        assert_eq!(
            describe(&criteria(Some(city.id), Some(missing_niche)), &[city.clone()], &[]),
            format!("unknown niche {missing_niche} in Austin, TX")
        );
        assert_eq!(
            describe(&criteria(Some(missing_city), None), &[], &[plumber()]),
            format!("all niches in city {missing_city}")
        );
    }
}
