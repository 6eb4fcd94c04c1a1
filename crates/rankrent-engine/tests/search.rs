//! Search orchestrator tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{city, niche, open_criteria, seeded_store, ComTaken, ScriptedMetrics};
use rankrent_core::{MetricsSource, Tld, ValueRange};
use rankrent_engine::{EngineConfig, EngineError, SearchOrchestrator};

fn orchestrator(
    store: Arc<rankrent_store::MemoryStore>,
    metrics: Arc<ScriptedMetrics>,
    config: EngineConfig,
) -> SearchOrchestrator {
    SearchOrchestrator::new(store, metrics, Arc::new(ComTaken::default()), config)
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        metrics_delay: Duration::ZERO,
        ..EngineConfig::default()
    }
}

// ============================================================================
// Result cap and ordering
// ============================================================================

#[tokio::test]
async fn results_never_exceed_cap() {
    let cities: Vec<_> = (0..5)
        .map(|i| city(&format!("City{i}"), "TX", 100_000 + i))
        .collect();
    let niches: Vec<_> = (0..5).map(|i| niche(&format!("Niche{i}"))).collect();
    let store = seeded_store(&cities, &niches).await;
    let metrics = Arc::new(ScriptedMetrics::always(500, 5.0));

    let report = orchestrator(store, metrics.clone(), fast_config())
        .search(&open_criteria())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 10);
    assert_eq!(report.candidates_evaluated, 10);
    assert_eq!(metrics.calls().len(), 10);
}

#[tokio::test]
async fn traversal_is_city_major() {
    let store = seeded_store(
        &[city("Houston", "TX", 2_300_000), city("Austin", "TX", 960_000)],
        &[niche("Roofing"), niche("Electrician")],
    )
    .await;
    let metrics = Arc::new(ScriptedMetrics::always(500, 5.0));

    let report = orchestrator(store, metrics, fast_config())
        .search(&open_criteria())
        .await
        .unwrap();

    let keywords: Vec<_> = report.results.iter().map(|r| r.keyword.as_str()).collect();
    assert_eq!(
        keywords,
        vec![
            "electrician houston",
            "roofing houston",
            "electrician austin",
            "roofing austin"
        ]
    );
    assert_eq!(report.label, "all niches across 2 cities");
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn results_satisfy_volume_and_cpc_ranges() {
    let store = seeded_store(
        &[city("Austin", "TX", 960_000)],
        &[niche("Plumber"), niche("Roofing"), niche("Hvac"), niche("Painter")],
    )
    .await;
    let metrics = Arc::new(
        ScriptedMetrics::default()
            .with("plumber austin", 900, 12.0)
            .with("roofing austin", 50, 12.0)
            .with("hvac austin", 900, 40.0)
            .with("painter austin", 400, 3.5),
    );

    let mut criteria = open_criteria();
    criteria.search_volume = ValueRange::new(100, 1000);
    criteria.cpc = ValueRange::new(1.0, 20.0);

    let report = orchestrator(store, metrics, fast_config())
        .search(&criteria)
        .await
        .unwrap();

    for result in &report.results {
        assert!(criteria.search_volume.contains(result.search_volume));
        assert!(criteria.cpc.contains(result.cpc));
    }
    let keywords: Vec<_> = report.results.iter().map(|r| r.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["painter austin", "plumber austin"]);
    assert_eq!(report.rejected, 2);
}

#[tokio::test]
async fn population_range_excludes_cities() {
    let store = seeded_store(
        &[
            city("Houston", "TX", 2_300_000),
            city("Austin", "TX", 960_000),
            city("Waco", "TX", 140_000),
        ],
        &[niche("Plumber")],
    )
    .await;
    let metrics = Arc::new(ScriptedMetrics::always(500, 5.0));

    let mut criteria = open_criteria();
    criteria.population = Some(ValueRange::new(100_000, 1_000_000));

    let report = orchestrator(store, metrics.clone(), fast_config())
        .search(&criteria)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    for result in &report.results {
        let population = result.population.unwrap();
        assert!((100_000..=1_000_000).contains(&population));
    }
    assert!(!metrics.calls().iter().any(|k| k.contains("houston")));
}

#[tokio::test]
async fn population_filter_removing_everything_is_empty() {
    let store = seeded_store(&[city("Waco", "TX", 140_000)], &[niche("Plumber")]).await;
    let metrics = Arc::new(ScriptedMetrics::always(500, 5.0));

    let mut criteria = open_criteria();
    criteria.population = Some(ValueRange::new(5_000_000, 10_000_000));

    let report = orchestrator(store, metrics.clone(), fast_config())
        .search(&criteria)
        .await
        .unwrap();
    assert!(report.results.is_empty());
    assert!(metrics.calls().is_empty());
}

#[tokio::test]
async fn selected_city_outside_population_range_is_empty() {
    let waco = city("Waco", "TX", 140_000);
    let store = seeded_store(&[waco.clone()], &[niche("Plumber")]).await;

    let mut criteria = open_criteria();
    criteria.city_id = Some(waco.id);
    criteria.population = Some(ValueRange::new(500_000, 1_000_000));

    let report = orchestrator(store, Arc::new(ScriptedMetrics::always(500, 5.0)), fast_config())
        .search(&criteria)
        .await
        .unwrap();
    assert!(report.results.is_empty());
}

// ============================================================================
// Keyword and domain shaping
// ============================================================================

#[tokio::test]
async fn location_first_controls_word_order() {
    let austin = city("Austin", "TX", 960_000);
    let plumber = niche("Plumber");
    let store = seeded_store(&[austin.clone()], &[plumber.clone()]).await;
    let search = orchestrator(store, Arc::new(ScriptedMetrics::always(500, 5.0)), fast_config());

    let mut criteria = open_criteria();
    criteria.city_id = Some(austin.id);
    criteria.niche_id = Some(plumber.id);

    criteria.location_first = true;
    let first = search.search(&criteria).await.unwrap();
    assert_eq!(first.results[0].keyword, "austin plumber");
    assert_eq!(first.results[0].exact_match_domain, "austinplumber.com");

    criteria.location_first = false;
    let second = search.search(&criteria).await.unwrap();
    assert_eq!(second.results[0].keyword, "plumber austin");
    assert_eq!(second.results[0].domain_base, "plumberaustin");
    assert_eq!(second.label, "plumber in Austin, TX");
}

#[tokio::test]
async fn availability_and_links_per_extension() {
    let store = seeded_store(&[city("Austin", "TX", 960_000)], &[niche("Plumber")]).await;
    let report = orchestrator(store, Arc::new(ScriptedMetrics::always(500, 5.0)), fast_config())
        .search(&open_criteria())
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.availability[&Tld::Com], false);
    assert_eq!(result.availability[&Tld::Net], true);
    assert_eq!(result.availability[&Tld::Org], true);
    assert_eq!(result.registration_links[&Tld::Com], None);
    assert!(result.registration_links[&Tld::Net]
        .as_deref()
        .unwrap()
        .ends_with("plumberaustin.net"));
    assert_eq!(result.metrics_source, MetricsSource::Live);
}

// ============================================================================
// Degraded metrics
// ============================================================================

#[tokio::test]
async fn failed_metrics_use_fallback_data() {
    let store = seeded_store(&[city("Austin", "TX", 960_000)], &[niche("Plumber")]).await;
    let report = orchestrator(store, Arc::new(ScriptedMetrics::default()), fast_config())
        .search(&open_criteria())
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.metrics_source, MetricsSource::Fallback);
    assert!((100..5100).contains(&result.search_volume));
    assert!(result.cpc >= 1.0 && result.cpc < 16.0);
}

#[tokio::test]
async fn failed_metrics_without_fallback_skip_candidate() {
    let store = seeded_store(
        &[city("Austin", "TX", 960_000)],
        &[niche("Plumber"), niche("Roofing")],
    )
    .await;
    let metrics = Arc::new(ScriptedMetrics::default().with("roofing austin", 700, 8.0));
    let config = EngineConfig {
        fallback_metrics: false,
        ..fast_config()
    };

    let report = orchestrator(store, metrics, config)
        .search(&open_criteria())
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].keyword, "roofing austin");
}

// ============================================================================
// Sampling and empty universes
// ============================================================================

#[tokio::test]
async fn single_city_widens_niche_sample() {
    let austin = city("Austin", "TX", 960_000);
    let niches: Vec<_> = (0..60).map(|i| niche(&format!("Niche{i:02}"))).collect();
    let store = seeded_store(&[austin.clone()], &niches).await;
    let metrics = Arc::new(ScriptedMetrics::always(5, 5.0));

    let mut criteria = open_criteria();
    criteria.city_id = Some(austin.id);
    criteria.search_volume = ValueRange::new(100, 1000);

    let report = orchestrator(store, metrics, fast_config())
        .search(&criteria)
        .await
        .unwrap();

    assert!(report.results.is_empty());
    assert_eq!(report.candidates_evaluated, 50);
    assert_eq!(report.rejected, 50);
}

#[tokio::test]
async fn universe_is_sampled_without_selection() {
    let cities: Vec<_> = (0..4)
        .map(|i| city(&format!("City{i}"), "OH", 100_000 * (i + 1)))
        .collect();
    let niches: Vec<_> = (0..4).map(|i| niche(&format!("Niche{i}"))).collect();
    let store = seeded_store(&cities, &niches).await;
    let config = EngineConfig {
        city_sample: 2,
        niche_sample: 3,
        ..fast_config()
    };

    let mut criteria = open_criteria();
    criteria.search_volume = ValueRange::new(100, 1000);

    let report = orchestrator(store, Arc::new(ScriptedMetrics::always(5, 5.0)), config)
        .search(&criteria)
        .await
        .unwrap();
    assert_eq!(report.candidates_evaluated, 6);
}

#[tokio::test]
async fn empty_universe_yields_nothing() {
    let store = seeded_store(&[], &[niche("Plumber")]).await;
    let report = orchestrator(store, Arc::new(ScriptedMetrics::always(500, 5.0)), fast_config())
        .search(&open_criteria())
        .await
        .unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.candidates_evaluated, 0);
}

#[tokio::test]
async fn invalid_criteria_are_rejected() {
    let store = seeded_store(&[], &[]).await;
    let mut criteria = open_criteria();
    criteria.cpc = ValueRange::new(10.0, 1.0);

    let result = orchestrator(store, Arc::new(ScriptedMetrics::default()), fast_config())
        .search(&criteria)
        .await;
    assert!(matches!(result, Err(EngineError::InvalidCriteria(_))));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test(start_paused = true)]
async fn single_city_three_niches() {
    let city = city("Springfield", "IL", 500_000);
    let store = seeded_store(
        &[city.clone()],
        &[niche("Roofing"), niche("Electrician"), niche("Plumber")],
    )
    .await;
    let metrics = Arc::new(
        ScriptedMetrics::default()
            .with("electrician springfield", 1_200, 9.5)
            .with("plumber springfield", 2_000_000, 14.0)
            .with("roofing springfield", 300, 22.0),
    );

    let mut criteria = open_criteria();
    criteria.city_id = Some(city.id);

    let started = tokio::time::Instant::now();
    let report = orchestrator(store, metrics.clone(), EngineConfig::default())
        .search(&criteria)
        .await
        .unwrap();

    assert_eq!(
        metrics.calls(),
        vec![
            "electrician springfield",
            "plumber springfield",
            "roofing springfield"
        ]
    );
    assert_eq!(report.candidates_evaluated, 3);

    let keywords: Vec<_> = report.results.iter().map(|r| r.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["electrician springfield", "roofing springfield"]);
    assert!(report
        .results
        .iter()
        .all(|r| r.population == Some(500_000)));
    assert_eq!(report.label, "all niches in Springfield, IL");

    // One pacing delay per successful metrics call.
    assert!(started.elapsed() >= Duration::from_millis(3000));
}
