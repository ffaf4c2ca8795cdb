use std::io::Write;

use chrono::{Datelike, Duration, NaiveDate};
use serde_json::json;

use sentinel_pipeline::candidate_pipeline::CandidatePipeline;
use sentinel_pipeline::components::severity_floor_filter::SeverityFloorFilter;
use sentinel_pipeline::components::severity_rank_selector::SeverityRankSelector;
use sentinel_pipeline::components::trend_analytics_source::TrendAnalyticsSource;
use sentinel_pipeline::config::{load_thresholds, ThresholdConfig};
use sentinel_pipeline::filter::FilterResult;
use sentinel_pipeline::pipelines::weekly_trend_digest::WeeklyTrendDigestPipeline;
use sentinel_pipeline::record_loader::{load_records_file, load_records_json, InputFormat};
use sentinel_pipeline::selector::Selector;
use sentinel_pipeline::source::Source;
use sentinel_pipeline::types::*;
use sentinel_pipeline::{analyze, LoadError};

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

/// Monday of ISO week 36, 2023.
fn prior_year_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 9, 4).unwrap()
}

/// Monday of ISO week 36, 2024.
fn current_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

/// Consecutive weekly records for one product/store.
fn weekly(
    product: &str,
    store: &str,
    start: NaiveDate,
    units: &[u64],
    returns: &[u64],
) -> Vec<SalesRecord> {
    units
        .iter()
        .zip(returns)
        .enumerate()
        .map(|(i, (&u, &r))| {
            let week_start = start + Duration::weeks(i as i64);
            SalesRecord {
                product_id: product.into(),
                store_code: store.into(),
                title: format!("Product {}", product),
                brand: "Acme".into(),
                revenue: u as f64 * 19.99,
                cogs: u as f64 * 8.0,
                units: u,
                returns: r,
                week_start,
                week_start_label: week_start.format("%Y-%m-%d").to_string(),
                fiscal_week_label: format!(
                    "{}-W{:02}",
                    week_start.iso_week().year(),
                    week_start.iso_week().week()
                ),
            }
        })
        .collect()
}

/// A realistic multi-store batch:
/// - B0DECLINE/IT: steady decline, no history -> WARNING
/// - B0COLLAPSE/DE: sales collapsed against last year -> CRITICAL
/// - B0RETURNS/IT: return spike on flat sales -> WARNING
/// - B0STEADY/FR: flat healthy seller -> no alert
/// - B0NEW/IT: only three weeks of history -> skipped
fn sample_records() -> Vec<SalesRecord> {
    let mut records = Vec::new();
    records.extend(weekly("B0DECLINE", "IT", current_start(), &[100, 90, 80, 70], &[0, 0, 0, 0]));
    records.extend(weekly("B0COLLAPSE", "DE", prior_year_start(), &[50, 50, 50, 50], &[0, 0, 0, 0]));
    records.extend(weekly("B0COLLAPSE", "DE", current_start(), &[10, 10, 10, 10], &[0, 0, 0, 0]));
    records.extend(weekly("B0RETURNS", "IT", current_start(), &[100, 100, 100, 100], &[1, 1, 1, 30]));
    records.extend(weekly("B0STEADY", "FR", current_start(), &[60, 61, 59, 60], &[1, 0, 1, 0]));
    records.extend(weekly("B0NEW", "IT", current_start(), &[80, 40, 10], &[0, 0, 0]));
    records
}

fn make_query(request_id: &str) -> TrendQuery {
    TrendQuery::new(request_id, ThresholdConfig::default())
}

// ---------------------------------------------------------------------------
// Engine tests
// ---------------------------------------------------------------------------

#[test]
fn analyze_flags_only_problem_series() {
    let alerts = analyze(&sample_records(), &ThresholdConfig::default());
    let ids: Vec<&str> = alerts.iter().map(|a| a.product_id.as_str()).collect();

    assert_eq!(ids.len(), 3, "expected three alerts, got {:?}", ids);
    assert_eq!(ids[0], "B0COLLAPSE", "critical alert should rank first");
    assert!(!ids.contains(&"B0STEADY"));
    assert!(!ids.contains(&"B0NEW"));
}

#[test]
fn collapse_alert_carries_yoy_detail() {
    let alerts = analyze(&sample_records(), &ThresholdConfig::default());
    let collapse = alerts
        .iter()
        .find(|a| a.product_id == "B0COLLAPSE")
        .expect("should flag the YoY collapse");

    assert_eq!(collapse.severity, Severity::Critical);
    assert!(collapse.yoy_comparison.data_available);
    // (40 - 200) / 200
    assert!((collapse.yoy_comparison.units_change + 0.8).abs() < 1e-12);
    assert!((collapse.yoy_comparison.revenue_change + 0.8).abs() < 1e-9);
    assert_eq!(collapse.weekly_detail.len(), 4);
    assert_eq!(collapse.current_window.start_week, "2024-W36");
    assert_eq!(collapse.current_window.end_week, "2024-W39");
}

#[test]
fn window_length_is_configurable() {
    let mut config = ThresholdConfig::default();
    config.window_weeks = 3;
    let alerts = analyze(&sample_records(), &config);
    assert!(
        alerts.iter().any(|a| a.product_id == "B0NEW"),
        "a three-week window should cover the new product"
    );
}

// ---------------------------------------------------------------------------
// Loader tests
// ---------------------------------------------------------------------------

#[test]
fn json_envelope_round_trips_through_engine() {
    let items: Vec<serde_json::Value> = [100, 90, 80, 70]
        .iter()
        .enumerate()
        .map(|(i, units)| {
            json!({
                "ASIN": "B0JSON",
                "ProductTitle": "Desk Lamp",
                "StoreCode": "IT",
                "Units": units,
                "Revenue": format!("{}.50", units),
                "Returns": 0,
                "WeekStart": format!("2024-09-{:02}", 2 + i * 7),
            })
        })
        .collect();
    let payload = json!({ "body": { "value": items } }).to_string();

    let records = load_records_json(payload.as_bytes()).unwrap();
    assert_eq!(records.len(), 4);
    let alerts = analyze(&records, &ThresholdConfig::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Desk Lamp");
    assert_eq!(alerts[0].severity, Severity::Warning);
}

#[test]
fn csv_file_with_positional_headers_loads() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Title,field_1,field_3,field_6,field_7,field_8").unwrap();
    writeln!(file, "B0CSV,Mug,IT,100,0,2024-09-02").unwrap();
    writeln!(file, "B0CSV,Mug,IT,90,0,2024-09-09").unwrap();
    file.flush().unwrap();

    let records = load_records_file(file.path(), None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].product_id, "B0CSV");
    assert_eq!(records[1].units, 90);

    let forced = load_records_file(file.path(), Some(InputFormat::Csv)).unwrap();
    assert_eq!(forced, records);
}

#[test]
fn oversized_counts_do_not_abort_the_batch() {
    let items: Vec<serde_json::Value> = ["10000000000000000000", "10000000000000000000", "50", "40"]
        .iter()
        .enumerate()
        .map(|(i, units)| {
            let units: u64 = units.parse().unwrap();
            json!({
                "ASIN": "A",
                "StoreCode": "IT",
                "Units": units,
                "WeekStart": format!("2024-09-{:02}", 2 + i * 7),
            })
        })
        .collect();
    let payload = serde_json::Value::Array(items).to_string();
    let mut records = load_records_json(payload.as_bytes()).unwrap();
    records.extend(weekly("B0DECLINE", "IT", current_start(), &[100, 90, 80, 70], &[0, 0, 0, 0]));

    let alerts = analyze(&records, &ThresholdConfig::default());
    let huge = alerts
        .iter()
        .find(|a| a.product_id == "A")
        .expect("the collapse after huge weeks should still alert");
    assert_eq!(huge.current_window.total_units, u64::MAX);
    assert!(alerts.iter().any(|a| a.product_id == "B0DECLINE"));
}

#[test]
fn unknown_envelope_is_rejected() {
    let err = load_records_json(r#"{"rows": []}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::UnrecognizedEnvelope));
}

#[test]
fn thresholds_load_from_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "windowWeeks = 6").unwrap();
    writeln!(file, "minVolume = 10.0").unwrap();
    file.flush().unwrap();

    let config = load_thresholds(file.path()).unwrap();
    assert_eq!(config.window_weeks, 6);
    assert_eq!(config.min_volume, 10.0);
    assert_eq!(config.slope_floor, ThresholdConfig::default().slope_floor);
}

// ---------------------------------------------------------------------------
// Source tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trend_source_produces_unranked_alerts() {
    let source = TrendAnalyticsSource::new(sample_records());
    let candidates = source.get_candidates(&make_query("test-001")).await.unwrap();

    // Encounter order, before ranking.
    let ids: Vec<&str> = candidates.iter().map(|a| a.product_id.as_str()).collect();
    assert_eq!(ids, vec!["B0DECLINE", "B0COLLAPSE", "B0RETURNS"]);
}

#[tokio::test]
async fn trend_source_scopes_to_requested_stores() {
    let source = TrendAnalyticsSource::new(sample_records());
    let mut query = make_query("test-002");
    query.store_codes = vec!["DE".into()];
    let candidates = source.get_candidates(&query).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert!(candidates.iter().all(|a| a.store_code == "DE"));
}

// ---------------------------------------------------------------------------
// Filter tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn severity_floor_filter_partitions_by_severity() {
    let mut query = make_query("test-003");
    query.min_severity = Severity::Critical;
    let candidates = vec![
        Alert {
            product_id: "crit".into(),
            severity: Severity::Critical,
            ..Alert::default()
        },
        Alert {
            product_id: "warn".into(),
            severity: Severity::Warning,
            ..Alert::default()
        },
    ];
    let FilterResult { kept, removed } =
        sentinel_pipeline::filter::Filter::filter(&SeverityFloorFilter, &query, candidates)
            .await
            .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].product_id, "crit");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].product_id, "warn");
}

// ---------------------------------------------------------------------------
// Selector tests
// ---------------------------------------------------------------------------

fn alert_with(id: &str, severity: Severity, yoy: f64) -> Alert {
    Alert {
        product_id: id.into(),
        severity,
        yoy_comparison: YoyComparison {
            units_change: yoy,
            revenue_change: yoy,
            data_available: true,
        },
        ..Alert::default()
    }
}

#[test]
fn rank_selector_puts_critical_before_steeper_warning() {
    let selector = SeverityRankSelector::default();
    let candidates = vec![
        alert_with("warn", Severity::Warning, -0.50),
        alert_with("crit", Severity::Critical, -0.30),
    ];
    let selected = selector.select(&make_query("test-004"), candidates);
    assert_eq!(selected[0].product_id, "crit");
    assert_eq!(selected[1].product_id, "warn");
}

#[test]
fn rank_selector_truncates_to_limit() {
    let selector = SeverityRankSelector::top(2);
    let candidates = vec![
        alert_with("a", Severity::Warning, -0.10),
        alert_with("b", Severity::Warning, -0.40),
        alert_with("c", Severity::Critical, -0.20),
    ];
    let selected = selector.select(&make_query("test-005"), candidates);
    let ids: Vec<&str> = selected.iter().map(|a| a.product_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);
}

// ---------------------------------------------------------------------------
// Full pipeline integration tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weekly_digest_pipeline_end_to_end() {
    let pipeline = WeeklyTrendDigestPipeline::with_records(sample_records());
    let result = pipeline.execute(make_query("digest-001")).await;

    assert_eq!(result.retrieved_candidates.len(), 3);
    assert!(result.filtered_candidates.is_empty());
    assert_eq!(result.selected_candidates.len(), 3);
    assert_eq!(result.query.request_id, "digest-001");

    // Ranked: critical first, then warnings in encounter order (no YoY data).
    let ids: Vec<&str> = result
        .selected_candidates
        .iter()
        .map(|a| a.product_id.as_str())
        .collect();
    assert_eq!(ids, vec!["B0COLLAPSE", "B0DECLINE", "B0RETURNS"]);

    for a in &result.selected_candidates {
        assert!(!a.reasons.is_empty(), "alert {} should carry reasons", a.product_id);
        assert_ne!(a.severity, Severity::Info);
    }
}

#[tokio::test]
async fn weekly_digest_pipeline_applies_floor_and_limit() {
    let pipeline = WeeklyTrendDigestPipeline::with_records_and_limit(sample_records(), 1);
    let mut query = make_query("digest-002");
    query.min_severity = Severity::Critical;

    let result = pipeline.execute(query).await;
    assert_eq!(result.retrieved_candidates.len(), 3);
    assert_eq!(result.filtered_candidates.len(), 2);
    assert_eq!(result.selected_candidates.len(), 1);
    assert_eq!(result.selected_candidates[0].product_id, "B0COLLAPSE");
}

#[tokio::test]
async fn weekly_digest_pipeline_survives_invalid_thresholds() {
    let pipeline = WeeklyTrendDigestPipeline::with_records(sample_records());
    let mut thresholds = ThresholdConfig::default();
    thresholds.window_weeks = 0;
    let query = TrendQuery::new("digest-003", thresholds);

    // The failing source is logged and skipped; the run still completes.
    let result = pipeline.execute(query).await;
    assert!(result.retrieved_candidates.is_empty());
    assert!(result.selected_candidates.is_empty());
}

#[tokio::test]
async fn weekly_digest_pipeline_is_deterministic() {
    let pipeline = WeeklyTrendDigestPipeline::with_records(sample_records());
    let first = pipeline.execute(make_query("digest-004")).await;
    let second = pipeline.execute(make_query("digest-005")).await;
    assert_eq!(first.selected_candidates, second.selected_candidates);
}
