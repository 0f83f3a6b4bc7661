use crate::analysis::recency::{parse_commit_timestamp, parse_timestamp};
use crate::error::{ReportError, ReportResult};
use crate::models::developer::DailyMetricSample;
use crate::models::project::{GranteeRecord, ProjectMetricsRow};
use crate::models::transaction::TransactionEvent;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A CSV file read into memory with its header positions.
struct CsvTable {
    name: String,
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl CsvTable {
    fn read<R: Read>(name: &str, reader: R) -> ReportResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(index, header)| (header.trim_start_matches('\u{feff}').to_string(), index))
            .collect();

        let records = csv_reader.records().collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            columns,
            records,
        })
    }

    fn require(&self, column: &str) -> ReportResult<usize> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| ReportError::missing_column(&self.name, column))
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }
}

fn field(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn open(path: &Path) -> ReportResult<File> {
    File::open(path).map_err(|e| ReportError::io(format!("Failed to open {}: {e}", path.display())))
}

/// Counters may be exported as floats (`12.0`). Blank is zero.
fn parse_count(table: &CsvTable, row: usize, column: &str, raw: Option<&str>) -> ReportResult<u64> {
    let Some(raw) = raw else {
        return Ok(0);
    };

    let value: f64 = raw
        .parse()
        .map_err(|_| ReportError::invalid_value(&table.name, row, column, raw))?;

    if !value.is_finite() || value < 0.0 {
        return Err(ReportError::invalid_value(&table.name, row, column, raw));
    }

    Ok(value.round() as u64)
}

pub fn load_project_metrics(path: &Path) -> ReportResult<Vec<ProjectMetricsRow>> {
    read_project_metrics(&file_name(path), open(path)?)
}

pub fn read_project_metrics<R: Read>(name: &str, reader: R) -> ReportResult<Vec<ProjectMetricsRow>> {
    let table = CsvTable::read(name, reader)?;

    let display_name = table.require("display_name")?;
    let commits = table.require("commit_count_6_months")?;
    let merged_prs = table.require("merged_pull_request_count_6_months")?;
    let active_devs = table.require("active_developer_count_6_months")?;
    let project_name = table.optional("project_name");

    let optional_counters = [
        "contributor_count_6_months",
        "new_contributor_count_6_months",
        "opened_pull_request_count_6_months",
        "opened_issue_count_6_months",
        "closed_issue_count_6_months",
        "repository_count",
    ];
    for column in optional_counters {
        if table.optional(column).is_none() {
            log::warn!("{}: column `{column}` not present, defaulting to 0", table.name);
        }
    }
    let last_commit = table.optional("last_commit_date");

    if table.records.is_empty() {
        return Err(ReportError::empty_input(format!("{} has no rows", table.name)));
    }

    let mut seen_keys = HashSet::new();
    let mut rows = Vec::with_capacity(table.records.len());

    for (index, record) in table.records.iter().enumerate() {
        // Header is line 1.
        let row = index + 2;
        let count = |column: &str| parse_count(&table, row, column, field(record, table.optional(column)));

        let display = field(record, Some(display_name))
            .ok_or_else(|| ReportError::invalid_value(&table.name, row, "display_name", ""))?
            .to_string();
        let project_key = field(record, project_name)
            .map(str::to_string)
            .unwrap_or_else(|| display.clone());

        if !seen_keys.insert(project_key.clone()) {
            log::warn!("{}: duplicate project `{project_key}` on row {row}", table.name);
        }

        rows.push(ProjectMetricsRow {
            project_key,
            display_name: display,
            commit_count: parse_count(&table, row, "commit_count_6_months", field(record, Some(commits)))?,
            merged_pr_count: parse_count(
                &table,
                row,
                "merged_pull_request_count_6_months",
                field(record, Some(merged_prs)),
            )?,
            active_developer_count: parse_count(
                &table,
                row,
                "active_developer_count_6_months",
                field(record, Some(active_devs)),
            )?,
            contributor_count: count("contributor_count_6_months")?,
            new_contributor_count: count("new_contributor_count_6_months")?,
            opened_pr_count: count("opened_pull_request_count_6_months")?,
            opened_issue_count: count("opened_issue_count_6_months")?,
            closed_issue_count: count("closed_issue_count_6_months")?,
            repository_count: count("repository_count")?,
            last_commit: parse_commit_timestamp(field(record, last_commit)),
        });
    }

    log::info!("loaded {} projects from {}", rows.len(), table.name);
    Ok(rows)
}

#[derive(Debug, Default)]
pub struct LoadedTransactions {
    pub events: Vec<TransactionEvent>,
    /// Rows dropped for a missing hash or project, or an unparseable block timestamp.
    pub skipped: usize,
}

pub fn load_transactions(
    path: &Path,
    usernames: &HashMap<String, String>,
) -> ReportResult<LoadedTransactions> {
    read_transactions(&file_name(path), open(path)?, usernames)
}

pub fn read_transactions<R: Read>(
    name: &str,
    reader: R,
    usernames: &HashMap<String, String>,
) -> ReportResult<LoadedTransactions> {
    let table = CsvTable::read(name, reader)?;

    let hash = table.require("transaction_hash")?;
    let timestamp = table.require("block_timestamp")?;
    let project = table.require("project_name")?;
    let to_address = table.optional("to_address");
    let from_address = table.optional("from_address");
    let artifact = table.optional("artifact_name");
    let passport = table.optional("passport_score");
    let username = table.optional("farcaster_username");

    let mut loaded = LoadedTransactions::default();

    for (index, record) in table.records.iter().enumerate() {
        let row = index + 2;
        let (Some(tx_hash), Some(project_name)) = (field(record, Some(hash)), field(record, Some(project)))
        else {
            log::warn!("{}: row {row} has no transaction hash or project, skipped", table.name);
            loaded.skipped += 1;
            continue;
        };

        let block_timestamp = match parse_timestamp(field(record, Some(timestamp)).unwrap_or_default()) {
            Ok(ts) => ts,
            Err(err) => {
                log::warn!("{}: row {row}: {err}, skipped", table.name);
                loaded.skipped += 1;
                continue;
            }
        };

        let passport_score = field(record, passport).and_then(|raw| match raw.parse::<f64>() {
            Ok(score) if score.is_finite() => Some(score),
            _ => {
                log::debug!("{}: row {row}: ignoring passport score {raw:?}", table.name);
                None
            }
        });

        let farcaster_username = field(record, username)
            .map(str::to_string)
            .or_else(|| usernames.get(tx_hash).cloned());

        loaded.events.push(TransactionEvent {
            transaction_hash: tx_hash.to_string(),
            project_name: project_name.to_string(),
            block_timestamp,
            to_address: field(record, to_address).unwrap_or_default().to_string(),
            from_address: field(record, from_address).unwrap_or_default().to_string(),
            artifact_name: field(record, artifact).map(str::to_string),
            passport_score,
            farcaster_username,
        });
    }

    log::info!(
        "loaded {} transaction rows from {} ({} skipped)",
        loaded.events.len(),
        table.name,
        loaded.skipped
    );
    Ok(loaded)
}

/// transaction hash → social-identity username
pub fn load_usernames(path: &Path) -> ReportResult<HashMap<String, String>> {
    read_usernames(&file_name(path), open(path)?)
}

pub fn read_usernames<R: Read>(name: &str, reader: R) -> ReportResult<HashMap<String, String>> {
    let table = CsvTable::read(name, reader)?;
    let hash = table.require("transaction_hash")?;
    let username = table.require("farcaster_username")?;

    Ok(table
        .records
        .iter()
        .filter_map(|record| {
            Some((
                field(record, Some(hash))?.to_string(),
                field(record, Some(username))?.to_string(),
            ))
        })
        .collect())
}

pub fn load_developer_series(path: &Path) -> ReportResult<Vec<DailyMetricSample>> {
    read_developer_series(&file_name(path), open(path)?)
}

pub fn read_developer_series<R: Read>(name: &str, reader: R) -> ReportResult<Vec<DailyMetricSample>> {
    let table = CsvTable::read(name, reader)?;
    let project = table.require("project_name")?;
    let date = table.require("sample_date")?;
    let metric = table.require("metric_name")?;
    let amount = table.require("amount")?;

    let mut samples = Vec::with_capacity(table.records.len());
    for (index, record) in table.records.iter().enumerate() {
        let row = index + 2;
        let (Some(project_name), Some(metric_name)) = (field(record, Some(project)), field(record, Some(metric)))
        else {
            continue;
        };

        let sample_date = match parse_timestamp(field(record, Some(date)).unwrap_or_default()) {
            Ok(ts) => ts.date_naive(),
            Err(err) => {
                log::warn!("{}: row {row}: {err}, skipped", table.name);
                continue;
            }
        };

        let Some(value) = field(record, Some(amount)).and_then(|raw| raw.parse::<f64>().ok()) else {
            log::warn!("{}: row {row}: unreadable amount, skipped", table.name);
            continue;
        };

        samples.push(DailyMetricSample {
            project_name: project_name.to_string(),
            sample_date,
            metric_name: metric_name.to_string(),
            amount: value,
        });
    }

    Ok(samples)
}

pub fn load_grantees(path: &Path) -> ReportResult<Vec<GranteeRecord>> {
    read_grantees(&file_name(path), open(path)?)
}

pub fn read_grantees<R: Read>(name: &str, reader: R) -> ReportResult<Vec<GranteeRecord>> {
    let table = CsvTable::read(name, reader)?;
    let project = table.require("project_name")?;
    let grantee = table.optional("Grantee");
    let program = table.optional("Program");

    Ok(table
        .records
        .iter()
        .filter_map(|record| {
            let project_name = field(record, Some(project))?.to_string();
            Some(GranteeRecord {
                grantee: field(record, grantee).unwrap_or(project_name.as_str()).to_string(),
                program: field(record, program).unwrap_or_default().to_string(),
                project_name,
            })
        })
        .collect())
}
