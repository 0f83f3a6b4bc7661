use serde::{Deserialize, Serialize, Serializer};

pub const NO_DATA: &str = "No Data";
pub const INVALID_DATE: &str = "Invalid Date";

/// A value in the combined table. Unmatched join sides and unusable inputs
/// serialize as an explicit marker string instead of `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<T> {
    Value(T),
    NoData,
    InvalidDate,
}

impl<T> Cell<T> {
    pub fn is_missing(&self) -> bool {
        !matches!(self, Cell::Value(_))
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Cell::Value).unwrap_or(Cell::NoData)
    }
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Value(v) => v.serialize(serializer),
            Cell::NoData => serializer.serialize_str(NO_DATA),
            Cell::InvalidDate => serializer.serialize_str(INVALID_DATE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinedDirection {
    Increase,
    Decrease,
    NoChange,
    UnknownInsufficientData,
}

/// Which table decides the rows of the combined view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CombinedJoin {
    #[default]
    MetricsLeft,
    GranteesLeft,
    Outer,
}

impl CombinedJoin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinedJoin::MetricsLeft => "metrics-left",
            CombinedJoin::GranteesLeft => "grantees-left",
            CombinedJoin::Outer => "outer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metrics-left" => Some(CombinedJoin::MetricsLeft),
            "grantees-left" => Some(CombinedJoin::GranteesLeft),
            "outer" => Some(CombinedJoin::Outer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedProjectView {
    pub project_key: String,
    pub display_name: String,
    pub grantee: Cell<String>,
    pub program: Cell<String>,
    pub activity_score: Cell<f64>,
    pub days_since_last_commit: Cell<i64>,
    pub count_before: Cell<u64>,
    pub count_after: Cell<u64>,
    pub pct_change: Cell<f64>,
    pub direction: CombinedDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_cells_serialize_as_markers() {
        let present: Cell<u64> = Cell::Value(3);
        let absent: Cell<u64> = Cell::NoData;
        let invalid: Cell<i64> = Cell::InvalidDate;

        assert_eq!(serde_json::to_value(&present).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!("No Data"));
        assert_eq!(serde_json::to_value(&invalid).unwrap(), json!("Invalid Date"));
    }

    #[test]
    fn direction_uses_kebab_case_labels() {
        assert_eq!(
            serde_json::to_value(CombinedDirection::UnknownInsufficientData).unwrap(),
            json!("unknown-insufficient-data")
        );
        assert_eq!(
            serde_json::to_value(CombinedDirection::NoChange).unwrap(),
            json!("no-change")
        );
    }
}
