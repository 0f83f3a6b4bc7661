use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing column `{column}` in {file}")]
    MissingColumn { file: String, column: String },
    #[error("empty input: {what}")]
    EmptyInput { what: String },
    #[error("degenerate input: `{metric}` has the same value for every project")]
    DegenerateInput { metric: String },
    #[error("undefined ratio for {project}: active developer count is zero")]
    UndefinedRatio { project: String },
    #[error("unparseable timestamp: {value:?}")]
    UnparseableTimestamp { value: String },
    #[error("invalid value {value:?} for `{column}` in {file} (row {row})")]
    InvalidValue {
        file: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error("io error: {message}")]
    Io { message: String },
    #[error("csv error: {message}")]
    Csv { message: String },
    #[error("settings error: {message}")]
    Settings { message: String },
}

impl ReportError {
    pub fn missing_column(file: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            file: file.into(),
            column: column.into(),
        }
    }

    pub fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput { what: what.into() }
    }

    pub fn degenerate(metric: impl Into<String>) -> Self {
        Self::DegenerateInput {
            metric: metric.into(),
        }
    }

    pub fn undefined_ratio(project: impl Into<String>) -> Self {
        Self::UndefinedRatio {
            project: project.into(),
        }
    }

    pub fn unparseable_timestamp(value: impl Into<String>) -> Self {
        Self::UnparseableTimestamp {
            value: value.into(),
        }
    }

    pub fn invalid_value(
        file: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            file: file.into(),
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

impl From<csv::Error> for ReportError {
    fn from(value: csv::Error) -> Self {
        ReportError::Csv {
            message: value.to_string(),
        }
    }
}
