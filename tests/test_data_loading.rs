//! Integration tests for loading datasets from files and building baselines from them

use kolosal_drift::data::loader::load_data;
use kolosal_drift::prelude::*;
use polars::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const CLAIMS_CSV: &str = "\
member_id,refill_count,plan_type,copay
1,3,gold,10.5
2,4,silver,
3,2,gold,12.0
4,,bronze,8.0
5,3,silver,9.5
";

// ============================================================================
// Formats
// ============================================================================

#[test]
fn test_load_csv_types_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "claims.csv", CLAIMS_CSV);

    let data = DataLoader::new().load_auto(&path).unwrap();
    assert_eq!(data.row_count(), 5);
    assert_eq!(
        data.column_names().collect::<Vec<_>>(),
        vec!["member_id", "refill_count", "plan_type", "copay"]
    );

    let refills = data.column("refill_count").unwrap();
    assert_eq!(refills.kind(), FeatureKind::Numeric);
    assert_eq!(refills.null_count(), 1);
    assert_eq!(data.column("plan_type").unwrap().kind(), FeatureKind::Categorical);
    assert_eq!(data.column("plan_type").unwrap().unique_count(), 3);
    assert_eq!(data.column("copay").unwrap().null_count(), 1);
}

#[test]
fn test_load_tsv() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "claims.tsv", &CLAIMS_CSV.replace(',', "\t"));

    let data = load_data(&path).unwrap();
    assert_eq!(data.n_columns(), 4);
    assert_eq!(data.column("copay").unwrap().kind(), FeatureKind::Numeric);
}

#[test]
fn test_load_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "events.jsonl",
        "{\"latency\": 12.5, \"region\": \"eu\"}\n{\"latency\": null, \"region\": \"us\"}\n{\"latency\": 9.0, \"region\": null}\n",
    );

    let data = DataLoader::new().load_auto(&path).unwrap();
    assert_eq!(data.row_count(), 3);
    assert_eq!(data.column("latency").unwrap().null_count(), 1);
    assert_eq!(data.column("region").unwrap().kind(), FeatureKind::Categorical);
}

#[test]
fn test_load_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.parquet");

    let mut df = df!(
        "score" => &[Some(0.1), None, Some(0.7)],
        "label" => &["a", "b", "a"]
    )
    .unwrap();
    ParquetWriter::new(std::fs::File::create(&path).unwrap())
        .finish(&mut df)
        .unwrap();

    let data = DataLoader::new().load_auto(&path).unwrap();
    assert_eq!(data.row_count(), 3);
    assert_eq!(data.column("score").unwrap().numeric_values(), Some(vec![0.1, 0.7]));
}

#[test]
fn test_column_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "claims.csv", CLAIMS_CSV);

    let data = DataLoader::new()
        .with_columns(vec!["plan_type".to_string(), "copay".to_string()])
        .load_auto(&path)
        .unwrap();
    assert_eq!(data.n_columns(), 2);
    assert!(!data.has_column("member_id"));
}

#[test]
fn test_unsupported_and_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "claims.xlsx", "not a spreadsheet");
    assert!(matches!(
        DataLoader::new().load_auto(&path),
        Err(KolosalError::DataError(_))
    ));

    let missing = dir.path().join("absent.csv");
    assert!(matches!(
        DataLoader::new().load_auto(&missing),
        Err(KolosalError::IoError(_))
    ));
}

// ============================================================================
// Files to report
// ============================================================================

#[test]
fn test_baseline_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "claims.csv", CLAIMS_CSV);
    let data = load_data(&path).unwrap();

    let baseline = BaselineBuilder::new("claims-v1")
        .with_features(vec!["refill_count".to_string(), "plan_type".to_string()])
        .build(&data)
        .unwrap();

    let refills = baseline.feature("refill_count").unwrap();
    assert_eq!(refills.mean, Some(3.0));
    assert_eq!(refills.missing_count, 1);
    assert_eq!(refills.baseline_row_count, 5);
    assert_eq!(refills.min, Some(2.0));
    assert_eq!(refills.max, Some(4.0));

    let plan = baseline.feature("plan_type").unwrap();
    assert_eq!(plan.data_type, FeatureKind::Categorical);
    assert_eq!(plan.unique_count, 3);
    assert_eq!(plan.mean, None);
}

#[test]
fn test_quality_then_drift_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let train = load_data(&write_file(&dir, "train.csv", CLAIMS_CSV)).unwrap();
    let current = load_data(&write_file(
        &dir,
        "today.csv",
        "member_id,refill_count,plan_type,copay\n6,,gold,10.0\n7,,gold,10.0\n8,,gold,10.0\n9,3,gold,10.0\n",
    ))
    .unwrap();

    let expected: Vec<String> = ["refill_count", "plan_type", "copay"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let schema = validate_schema(&current, &expected).unwrap();
    assert_eq!(schema.extra_columns, vec!["member_id"]);

    let quality = DataQualityChecker::default().check(&current);
    assert_eq!(quality.missing_values["refill_count"].percentage, 75.0);
    // rows 6..8 differ only by member_id
    assert_eq!(quality.duplicate_rows, 0);

    let baseline = BaselineBuilder::new("claims-v1").build(&train).unwrap();
    let report = DriftMonitor::new(MonitorConfig::default())
        .unwrap()
        .detect(Some(&baseline), &current);

    assert!(report
        .anomalies_for("refill_count")
        .any(|a| a.anomaly_type == AnomalyType::MissingSpike && a.severity == Severity::High));
    assert_eq!(report.statistics_comparison.len(), 4);
}
