//! Domain error types.

/// Top-level error type for leadscan.
#[derive(Debug, thiserror::Error)]
pub enum LeadscanError {
    /// A derived column required for classification is absent on the latest row.
    #[error("precondition failed: column `{column}` is missing on the latest row")]
    Precondition { column: &'static str },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LeadscanError> for std::process::ExitCode {
    fn from(err: &LeadscanError) -> Self {
        let code: u8 = match err {
            LeadscanError::Io(_) => 1,
            LeadscanError::ConfigParse { .. }
            | LeadscanError::ConfigMissing { .. }
            | LeadscanError::ConfigInvalid { .. } => 2,
            LeadscanError::Database { .. } | LeadscanError::DatabaseQuery { .. } => 3,
            LeadscanError::Precondition { .. } => 4,
            LeadscanError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_message_names_column() {
        let err = LeadscanError::Precondition { column: "momentum" };
        assert_eq!(
            err.to_string(),
            "precondition failed: column `momentum` is missing on the latest row"
        );
    }

    #[test]
    fn config_missing_message() {
        let err = LeadscanError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [sqlite] path");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::other("boom");
        let err: LeadscanError = io.into();
        assert!(matches!(err, LeadscanError::Io(_)));
    }
}
