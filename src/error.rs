//! Error taxonomy for an analysis run

/// Errors that abort an analysis run.
///
/// Both variants are fatal: a partial report over a corrupt snapshot or a
/// misconfigured run is worse than no report. Insufficient-sample conditions
/// are not errors; the affected group is omitted and counted in the report's
/// omission tally.
#[derive(Debug)]
pub enum AnalysisError {
    /// A record violates a referential or value invariant.
    DataIntegrity { record: String, detail: String },
    /// A parameter is out of range or unparseable.
    Configuration { parameter: String, detail: String },
}

impl AnalysisError {
    pub fn integrity(record: impl Into<String>, detail: impl Into<String>) -> Self {
        AnalysisError::DataIntegrity {
            record: record.into(),
            detail: detail.into(),
        }
    }

    pub fn config(parameter: impl Into<String>, detail: impl Into<String>) -> Self {
        AnalysisError::Configuration {
            parameter: parameter.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::DataIntegrity { record, detail } => {
                write!(f, "data integrity violation at {}: {}", record, detail)
            }
            AnalysisError::Configuration { parameter, detail } => {
                write!(f, "invalid configuration parameter {}: {}", parameter, detail)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_record() {
        let err = AnalysisError::integrity("order_line(o1,3)", "references unknown order");
        assert_eq!(
            err.to_string(),
            "data integrity violation at order_line(o1,3): references unknown order"
        );
    }

    #[test]
    fn test_display_names_parameter() {
        let err = AnalysisError::config("pareto_threshold", "must be in (0, 1]");
        assert!(err.to_string().contains("pareto_threshold"));
    }
}
