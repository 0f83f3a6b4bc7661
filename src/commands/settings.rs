use crate::error::{ReportError, ReportResult};
use crate::models::activity_score::{default_weights, DegeneratePolicy, ScoringMode};
use crate::models::combined::CombinedJoin;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;
const SETTINGS_DIR: &str = ".impactlens";
const DEFAULT_CUTOFF: &str = "2024-07-01T00:00:00Z";

#[derive(Debug, Clone, PartialEq)]
pub struct InputFiles {
    pub metrics: PathBuf,
    pub transactions: PathBuf,
    pub usernames: PathBuf,
    pub developer_series: PathBuf,
    pub grantees: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EffectiveReportSettings {
    pub scoring_mode: ScoringMode,
    pub degenerate_policy: DegeneratePolicy,
    pub weights: HashMap<String, f64>,
    pub cutoff: DateTime<Utc>,
    pub combined_join: CombinedJoin,
    pub top_n: usize,
    pub files: InputFiles,
}

/// Per-run overrides from the command line. Never written back to disk.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub scoring_mode: Option<ScoringMode>,
    pub cutoff: Option<DateTime<Utc>>,
    pub combined_join: Option<CombinedJoin>,
    pub top_n: Option<usize>,
}

impl EffectiveReportSettings {
    pub fn apply(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(mode) = overrides.scoring_mode {
            self.scoring_mode = mode;
        }
        if let Some(cutoff) = overrides.cutoff {
            self.cutoff = cutoff;
        }
        if let Some(join) = overrides.combined_join {
            self.combined_join = join;
        }
        if let Some(top_n) = overrides.top_n {
            self.top_n = top_n.clamp(1, 50);
        }
        self
    }
}

pub async fn get_settings(data_dir: String) -> Result<Value, String> {
    load_settings_from_disk(&data_dir).map_err(|e| e.to_string())
}

pub async fn save_settings(data_dir: String, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&data_dir, settings).map_err(|e| e.to_string())
}

pub fn load_effective_report_settings(data_dir: &str) -> ReportResult<EffectiveReportSettings> {
    let settings = load_settings_from_disk(data_dir)?;
    effective_settings(data_dir, &settings)
}

fn effective_settings(data_dir: &str, settings: &Value) -> ReportResult<EffectiveReportSettings> {
    let scoring_mode = settings
        .get("scoringMode")
        .and_then(Value::as_str)
        .and_then(ScoringMode::parse)
        .unwrap_or_default();
    let degenerate_policy = settings
        .get("degeneratePolicy")
        .and_then(Value::as_str)
        .and_then(DegeneratePolicy::parse)
        .unwrap_or_default();
    let combined_join = settings
        .get("combinedJoin")
        .and_then(Value::as_str)
        .and_then(CombinedJoin::parse)
        .unwrap_or_default();
    let top_n = settings
        .get("topN")
        .and_then(Value::as_u64)
        .unwrap_or(5)
        .clamp(1, 50) as usize;

    let cutoff_raw = settings
        .get("cutoff")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CUTOFF);
    let cutoff = DateTime::parse_from_rfc3339(cutoff_raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ReportError::settings(format!("cutoff {cutoff_raw:?} is not RFC 3339: {e}")))?;

    let mut weights = default_weights();
    if let Some(obj) = settings.get("weights").and_then(Value::as_object) {
        for (key, value) in obj {
            if let (Some(v), true) = (value.as_f64(), weights.contains_key(key)) {
                weights.insert(key.clone(), v);
            }
        }
    }

    let sum: f64 = weights.values().copied().sum();
    if sum > f64::EPSILON {
        for value in weights.values_mut() {
            *value = (*value / sum).clamp(0.0, 1.0);
        }
    } else {
        weights = default_weights();
    }

    let dir = Path::new(data_dir);
    let file = |key: &str, default: &str| {
        dir.join(settings.get("files").and_then(|f| f.get(key)).and_then(Value::as_str).unwrap_or(default))
    };

    Ok(EffectiveReportSettings {
        scoring_mode,
        degenerate_policy,
        weights,
        cutoff,
        combined_join,
        top_n,
        files: InputFiles {
            metrics: file("metrics", "project_metrics.csv"),
            transactions: file("transactions", "transactions.csv"),
            usernames: file("usernames", "farcaster_usernames.csv"),
            developer_series: file("developerSeries", "developer_activity.csv"),
            grantees: file("grantees", "grantees.csv"),
        },
    })
}

/// Read and migrate `settings.json` without touching the disk. An absent file
/// yields the defaults.
pub fn load_settings_from_disk(data_dir: &str) -> ReportResult<Value> {
    let path = settings_path(data_dir);
    if !path.exists() {
        return Ok(migrate_settings(json!({})));
    }

    let raw = fs::read_to_string(&path)
        .map_err(|e| ReportError::settings(format!("Failed to read settings.json: {e}")))?;
    let original = serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
        log::warn!("settings.json is not valid JSON ({e}); starting from defaults");
        json!({})
    });

    Ok(migrate_settings(original))
}

pub fn save_settings_to_disk(data_dir: &str, settings: Value) -> ReportResult<Value> {
    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    effective_settings(data_dir, &migrated)?;

    ensure_settings_dir(data_dir)?;
    write_settings_file(&settings_path(data_dir), &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(SETTINGS_DIR).join("settings.json")
}

fn ensure_settings_dir(data_dir: &str) -> ReportResult<()> {
    let dir = Path::new(data_dir).join(SETTINGS_DIR);
    fs::create_dir_all(&dir)
        .map_err(|e| ReportError::settings(format!("Failed to create {SETTINGS_DIR} directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> ReportResult<()> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| ReportError::settings(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, raw).map_err(|e| ReportError::settings(format!("Failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_weights_from_percentages(&mut out);
    }

    if version < 2 {
        // V2 replaced the date-only `cutoffDate` with an RFC 3339 `cutoff` instant.
        migrate_cutoff_date(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "scoringMode": "normalized",
        "degeneratePolicy": "zero",
        "weights": default_weights(),
        "cutoff": DEFAULT_CUTOFF,
        "combinedJoin": "metrics-left",
        "topN": 5,
        "files": {
            "metrics": "project_metrics.csv",
            "transactions": "transactions.csv",
            "usernames": "farcaster_usernames.csv",
            "developerSeries": "developer_activity.csv",
            "grantees": "grantees.csv"
        }
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn migrate_weights_from_percentages(settings: &mut Value) {
    let Some(weights) = settings.get_mut("weights").and_then(Value::as_object_mut) else {
        return;
    };

    let has_percentage_like_values = weights.values().any(|v| v.as_f64().unwrap_or(0.0) > 1.0);
    if !has_percentage_like_values {
        return;
    }

    for value in weights.values_mut() {
        if let Some(v) = value.as_f64() {
            *value = json!(v / 100.0);
        }
    }
}

fn migrate_cutoff_date(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(old) = obj.remove("cutoffDate") else {
        return;
    };
    if obj.contains_key("cutoff") {
        return;
    }
    if let Some(date) = old
        .as_str()
        .and_then(|raw| chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    {
        obj.insert("cutoff".to_string(), json!(format!("{date}T00:00:00Z")));
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "topN", 1, 50, 5);

    sanitize_enum(obj, "scoringMode", &["normalized", "legacy"], "normalized");
    sanitize_enum(obj, "degeneratePolicy", &["zero", "error"], "zero");
    sanitize_enum(obj, "combinedJoin", &["metrics-left", "grantees-left", "outer"], "metrics-left");

    let cutoff_ok = obj
        .get("cutoff")
        .and_then(Value::as_str)
        .map(|raw| DateTime::parse_from_rfc3339(raw).is_ok())
        .unwrap_or(false);
    if !cutoff_ok {
        obj.insert("cutoff".to_string(), json!(DEFAULT_CUTOFF));
    }

    // Normalize weights; unknown keys are dropped.
    let default_weight_map = default_weights();
    let weights = obj
        .entry("weights".to_string())
        .or_insert_with(|| json!({}));

    let reset = match weights.as_object_mut() {
        Some(weight_obj) => {
            weight_obj.retain(|key, _| default_weight_map.contains_key(key));
            if weight_obj.values().any(|v| v.as_f64().unwrap_or(0.0) > 1.0) {
                log::warn!("weights above 1.0 read as percentages; dividing by 100");
                for value in weight_obj.values_mut() {
                    if let Some(v) = value.as_f64() {
                        *value = json!(v / 100.0);
                    }
                }
            }
            for (key, default_value) in &default_weight_map {
                let current = weight_obj.get(key).and_then(Value::as_f64).unwrap_or(*default_value);
                weight_obj.insert(key.clone(), json!(current.clamp(0.0, 1.0)));
            }

            let sum: f64 = weight_obj.values().filter_map(Value::as_f64).sum();
            if sum > f64::EPSILON {
                for value in weight_obj.values_mut() {
                    if let Some(v) = value.as_f64() {
                        *value = json!((v / sum).clamp(0.0, 1.0));
                    }
                }
            }
            sum <= f64::EPSILON
        }
        None => true,
    };

    if reset {
        *weights = json!(default_weight_map);
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn migrates_percentage_weights_and_normalizes() {
        let input = json!({
            "schema_version": 0,
            "weights": {
                "commits": 50,
                "merged_prs": 30,
                "active_developers": 20
            }
        });

        let migrated = migrate_settings(input);
        let weights = migrated.get("weights").and_then(Value::as_object).unwrap();
        let sum: f64 = weights.values().filter_map(Value::as_f64).sum();

        assert!((sum - 1.0).abs() < 1e-6);
        assert!((weights["commits"].as_f64().unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(
            migrated.get("schema_version").and_then(Value::as_i64).unwrap(),
            SETTINGS_SCHEMA_VERSION
        );
    }

    #[test]
    fn percentage_weights_are_rescaled_at_current_schema() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "weights": { "commits": 50, "merged_prs": 30, "active_developers": 20 }
        }));

        assert!((migrated["weights"]["commits"].as_f64().unwrap() - 0.5).abs() < 1e-9);
        assert!((migrated["weights"]["merged_prs"].as_f64().unwrap() - 0.3).abs() < 1e-9);
        assert!((migrated["weights"]["active_developers"].as_f64().unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn loading_without_a_settings_file_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().to_string();

        let settings = load_settings_from_disk(&data_dir).unwrap();
        assert_eq!(settings["cutoff"], json!(DEFAULT_CUTOFF));
        assert_eq!(settings["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
        assert!(!temp_dir.path().join(SETTINGS_DIR).exists());
    }

    #[test]
    fn loading_an_old_file_migrates_in_memory_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().to_string();
        fs::create_dir_all(temp_dir.path().join(SETTINGS_DIR)).unwrap();
        let path = settings_path(&data_dir);
        let old = r#"{"schema_version":1,"cutoffDate":"2024-03-15"}"#;
        fs::write(&path, old).unwrap();

        let settings = load_settings_from_disk(&data_dir).unwrap();
        assert_eq!(settings["cutoff"], json!("2024-03-15T00:00:00Z"));
        assert_eq!(fs::read_to_string(&path).unwrap(), old);
    }

    #[test]
    fn saving_creates_the_settings_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().to_string();

        let saved = save_settings_to_disk(&data_dir, json!({ "topN": 3 })).unwrap();
        assert_eq!(saved["topN"], json!(3));

        let raw = fs::read_to_string(settings_path(&data_dir)).unwrap();
        let on_disk: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk["topN"], json!(3));
    }

    #[test]
    fn migrates_date_only_cutoff() {
        let migrated = migrate_settings(json!({ "schema_version": 1, "cutoffDate": "2024-03-15" }));
        assert_eq!(migrated["cutoff"], json!("2024-03-15T00:00:00Z"));
        assert!(migrated.get("cutoffDate").is_none());
    }

    #[test]
    fn sanitizes_unknown_enums_and_bad_cutoff() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "scoringMode": "fancy",
            "combinedJoin": "inner",
            "cutoff": "July 1st",
            "topN": 500
        }));

        assert_eq!(migrated["scoringMode"], json!("normalized"));
        assert_eq!(migrated["combinedJoin"], json!("metrics-left"));
        assert_eq!(migrated["cutoff"], json!(DEFAULT_CUTOFF));
        assert_eq!(migrated["topN"], json!(50));
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "scoringMode": "legacy", "files": { "metrics": "m.csv" } }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["scoringMode"], json!("legacy"));
        assert_eq!(migrated["files"]["metrics"], json!("m.csv"));
        assert_eq!(migrated["files"]["transactions"], json!("transactions.csv"));
        assert_eq!(migrated["topN"], json!(5));
    }

    #[test]
    fn effective_settings_resolve_files_and_cutoff() {
        let settings = migrate_settings(json!({ "cutoff": "2024-09-01T12:00:00+02:00" }));
        let effective = effective_settings("/data", &settings).unwrap();

        assert_eq!(effective.cutoff, Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap());
        assert_eq!(effective.files.metrics, Path::new("/data").join("project_metrics.csv"));
        assert_eq!(effective.scoring_mode, ScoringMode::Normalized);
        assert_eq!(effective.combined_join, CombinedJoin::MetricsLeft);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let settings = migrate_settings(json!({}));
        let cutoff = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let effective = effective_settings("/data", &settings).unwrap().apply(&SettingsOverrides {
            scoring_mode: Some(ScoringMode::Legacy),
            cutoff: Some(cutoff),
            combined_join: Some(CombinedJoin::Outer),
            top_n: Some(0),
        });

        assert_eq!(effective.scoring_mode, ScoringMode::Legacy);
        assert_eq!(effective.cutoff, cutoff);
        assert_eq!(effective.combined_join, CombinedJoin::Outer);
        assert_eq!(effective.top_n, 1);
    }
}
