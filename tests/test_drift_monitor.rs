//! Integration tests for drift detection: scoring, anomaly rules and report assembly

use chrono::Utc;
use kolosal_drift::prelude::*;
use std::sync::atomic::AtomicBool;

fn refill_baseline() -> BaselineStatistics {
    BaselineStatistics::new(
        "rx-2024-01",
        Utc::now(),
        vec![FeatureStatistics::numeric("refill_count", 3.0, 1.0, 0.0, 10.0, 10, 11, 500)],
    )
}

fn refill_data(values: Vec<Option<f64>>) -> Dataset {
    Dataset::from_columns(vec![Column::numeric("refill_count", values)]).unwrap()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_constant_at_baseline_mean() {
    let data = refill_data(vec![Some(3.0); 500]);
    let monitor = DriftMonitor::new(MonitorConfig::default().with_threshold(0.15)).unwrap();
    let report = monitor.detect(Some(&refill_baseline()), &data);

    // every value lands in the central bin
    let expected_psi = (1.0 - 0.68) * (1.0f64 / 0.68).ln();
    let cmp = &report.statistics_comparison["refill_count"];
    assert!((cmp.drift_score - expected_psi).abs() < 1e-12);
    assert_eq!(cmp.score_method, ScoreMethod::Psi);
    assert_eq!(cmp.score_status, ScoreStatus::Ok);
    assert_eq!(cmp.current_mean, Some(3.0));
    assert_eq!(cmp.current_std, Some(0.0));

    assert!(report.anomalies.is_empty());
    assert!(report.features_with_drift.is_empty());
    assert_eq!(report.baseline_version, "rx-2024-01");
    assert!((report.drift_score - expected_psi).abs() < 1e-12);
}

#[test]
fn test_constant_at_mean_exceeds_default_threshold() {
    let data = refill_data(vec![Some(3.0); 500]);
    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let report = monitor.detect(Some(&refill_baseline()), &data);

    assert_eq!(report.features_with_drift, vec!["refill_count"]);
    assert!(report.anomalies.is_empty());
}

#[test]
fn test_shifted_and_sparse_feature() {
    let mut values: Vec<Option<f64>> = vec![None; 300];
    values.extend(vec![Some(9.0); 194]);
    values.extend(vec![Some(40.0); 6]);

    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let report = monitor.detect(Some(&refill_baseline()), &refill_data(values));

    assert!(report.has_drift());
    let types: Vec<AnomalyType> = report.anomalies.iter().map(|a| a.anomaly_type).collect();
    assert_eq!(
        types,
        vec![AnomalyType::MissingSpike, AnomalyType::DistributionShift]
    );
    assert_eq!(report.anomalies[0].severity, Severity::High);
    assert_eq!(
        report.anomalies[0].description,
        "Missing values increased from 2.0% to 60.0%"
    );
    assert_eq!(report.high_severity_anomalies(), 2);
}

#[test]
fn test_outlier_rate_counts_nulls_in_denominator() {
    // 12 of 200 rows above 15.0 (6%), with 100 nulls still in the denominator
    let mut values: Vec<Option<f64>> = vec![None; 100];
    values.extend(vec![Some(3.0); 88]);
    values.extend(vec![Some(16.0); 12]);

    let baseline = BaselineStatistics::new(
        "v1",
        Utc::now(),
        vec![FeatureStatistics::numeric("refill_count", 3.0, 10.0, 0.0, 10.0, 100, 11, 200)],
    );
    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&baseline), &refill_data(values));

    let outliers: Vec<&Anomaly> = report
        .anomalies
        .iter()
        .filter(|a| a.anomaly_type == AnomalyType::Outliers)
        .collect();
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].description, "6.0% of values are outliers");
}

// ============================================================================
// Missing-spike boundaries
// ============================================================================

fn spike_baseline() -> BaselineStatistics {
    BaselineStatistics::new(
        "v1",
        Utc::now(),
        vec![FeatureStatistics::numeric("refill_count", 3.0, 1.0, 0.0, 10.0, 50, 11, 1000)],
    )
}

fn with_missing(n_missing: usize) -> Dataset {
    let values = (0..1000)
        .map(|i| if i < n_missing { None } else { Some(3.0) })
        .collect();
    refill_data(values)
}

#[test]
fn test_missing_spike_triggers_medium() {
    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let report = monitor.detect(Some(&spike_baseline()), &with_missing(200));

    let spikes: Vec<&Anomaly> = report.anomalies_for("refill_count").collect();
    assert_eq!(spikes.len(), 1);
    assert_eq!(spikes[0].anomaly_type, AnomalyType::MissingSpike);
    assert_eq!(spikes[0].severity, Severity::Medium);
}

#[test]
fn test_missing_spike_boundary_exclusive() {
    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let report = monitor.detect(Some(&spike_baseline()), &with_missing(100));
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.anomaly_type != AnomalyType::MissingSpike));
}

#[test]
fn test_custom_thresholds() {
    let thresholds = AnomalyThresholds {
        missing_min_pct: 25.0,
        ..AnomalyThresholds::default()
    };
    let monitor =
        DriftMonitor::new(MonitorConfig::default().with_anomaly_thresholds(thresholds)).unwrap();
    let report = monitor.detect(Some(&spike_baseline()), &with_missing(200));
    assert!(report.anomalies.is_empty());
}

// ============================================================================
// Neutral and partial reports
// ============================================================================

#[test]
fn test_no_baseline() {
    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let report = monitor.detect(None, &with_missing(500));

    assert_eq!(report.drift_score, 0.0);
    assert_eq!(report.baseline_version, "none");
    assert!(report.anomalies.is_empty());
    assert!(report.features_with_drift.is_empty());
    assert!(!report.has_baseline());
}

#[test]
fn test_schema_mismatch_reports_skipped_features() {
    let baseline = BaselineStatistics::new(
        "v1",
        Utc::now(),
        vec![
            FeatureStatistics::numeric("age", 40.0, 10.0, 18.0, 90.0, 0, 70, 100),
            FeatureStatistics::categorical("plan", 0, 3, 100),
        ],
    );
    let data = Dataset::from_columns(vec![
        Column::numeric_dense("age", vec![35.0, 45.0, 40.0, 38.0]),
        Column::categorical("region", vec![Some("eu"), Some("us"), None, Some("eu")]),
    ])
    .unwrap();

    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&baseline), &data);

    assert_eq!(report.skipped_features, vec!["plan", "region"]);
    assert_eq!(
        report.statistics_comparison.keys().collect::<Vec<_>>(),
        vec!["age"]
    );
    for name in &report.features_with_drift {
        assert!(baseline.feature(name).is_some());
        assert!(data.has_column(name));
    }
}

#[test]
fn test_text_values_in_numeric_feature_degrade() {
    let baseline = BaselineStatistics::new(
        "v1",
        Utc::now(),
        vec![FeatureStatistics::numeric("dose", 10.0, 2.0, 2.0, 20.0, 0, 30, 100)],
    );
    let data = Dataset::from_columns(vec![Column::categorical(
        "dose",
        vec![Some("10"), Some("12"), Some("n/a"), Some("9")],
    )])
    .unwrap();

    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&baseline), &data);

    let cmp = &report.statistics_comparison["dose"];
    assert_eq!(cmp.score_method, ScoreMethod::MeanShift);
    assert!(cmp.is_degraded());
    assert!(cmp.drift_score >= 0.0);
    assert_eq!(report.degraded_features(), vec!["dose"]);
    assert_eq!(report.metrics().degraded_feature_count, 1);
    assert!((cmp.current_mean.unwrap() - 31.0 / 3.0).abs() < 1e-12);
    assert!(report.anomalies.is_empty());
}

#[test]
fn test_text_values_reach_numeric_anomaly_rules() {
    let mut labels = vec![Some("100"); 99];
    labels.push(Some("n/a"));
    let data = Dataset::from_columns(vec![Column::categorical("refill_count", labels)]).unwrap();

    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&refill_baseline()), &data);

    let cmp = &report.statistics_comparison["refill_count"];
    assert!(cmp.is_degraded());
    assert_eq!(cmp.current_mean, Some(100.0));
    assert_eq!(report.features_with_drift, vec!["refill_count"]);

    let kinds: Vec<_> = report.anomalies.iter().map(|a| a.anomaly_type).collect();
    assert_eq!(kinds, vec![AnomalyType::DistributionShift, AnomalyType::Outliers]);
    assert_eq!(
        report.anomalies[0].description,
        "Mean shifted by 97.00 standard deviations"
    );
    assert_eq!(report.anomalies[1].description, "99.0% of values are outliers");
}

#[test]
fn test_fully_numeric_text_scores_like_numbers() {
    let data = Dataset::from_columns(vec![Column::categorical(
        "refill_count",
        vec![Some("100"); 50],
    )])
    .unwrap();

    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&refill_baseline()), &data);

    let cmp = &report.statistics_comparison["refill_count"];
    assert_eq!(cmp.score_method, ScoreMethod::Psi);
    assert_eq!(cmp.score_status, ScoreStatus::Ok);
    assert_eq!(cmp.current_std, Some(0.0));
    assert!(report
        .anomalies_for("refill_count")
        .any(|a| a.anomaly_type == AnomalyType::DistributionShift));
    assert!(report
        .anomalies_for("refill_count")
        .any(|a| a.anomaly_type == AnomalyType::Outliers));
}

#[test]
fn test_categorical_feature_scores() {
    let baseline = BaselineStatistics::new(
        "v1",
        Utc::now(),
        vec![FeatureStatistics::categorical("plan", 0, 4, 400)],
    );
    let data = Dataset::from_columns(vec![Column::categorical(
        "plan",
        (0..400).map(|i| Some(["basic", "plus", "pro", "team"][i % 4])),
    )])
    .unwrap();

    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&baseline), &data);

    let cmp = &report.statistics_comparison["plan"];
    assert_eq!(cmp.score_method, ScoreMethod::ChiSquare);
    assert_eq!(cmp.drift_score, 0.0);
    assert_eq!(cmp.baseline_mean, None);
    assert!(!report.has_drift());
}

#[test]
fn test_cancellation() {
    let monitor = DriftMonitor::new(MonitorConfig::default()).unwrap();
    let cancel = AtomicBool::new(true);

    let result = monitor.detect_cancellable(Some(&spike_baseline()), &with_missing(10), &cancel);
    assert!(matches!(result, Err(KolosalError::Cancelled { .. })));

    // without a baseline there is nothing to cancel
    let neutral = monitor.detect_cancellable(None, &with_missing(10), &cancel).unwrap();
    assert!(!neutral.has_baseline());
}

#[test]
fn test_service_with_file_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileBaselineRepository::new(dir.path());
    repo.save(spike_baseline()).unwrap();
    assert!(matches!(
        repo.save(spike_baseline()),
        Err(KolosalError::BaselineExists(_))
    ));

    let service = MonitoringService::new(
        DriftMonitor::new(MonitorConfig::default()).unwrap(),
        repo,
        kolosal_drift::monitoring::InMemoryPublisher::new(),
    );
    let report = service.run(&with_missing(200), None).unwrap();
    assert_eq!(report.baseline_version, "v1");
    assert_eq!(service.publisher().published()[0].anomaly_count, 1);
}
