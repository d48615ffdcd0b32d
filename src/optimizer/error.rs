use thiserror::Error;

/// Everything that can go wrong between a raw payload and an extracted
/// schedule. Variants up to [`OptimizeError::InvalidModel`] are caused by
/// the caller's payload; the rest happen at solve time.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// A map key is neither a plain integer nor a parenthesized integer
    /// tuple.
    #[error("malformed parameter key {key:?}")]
    MalformedKey { key: String },

    /// A required parameter map has no entry for an index the model needs.
    #[error("missing entry {key} in {name}")]
    MissingParameter { name: &'static str, key: String },

    /// The index sets and per-index parameters do not fit together.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The solver proved that no assignment satisfies the constraints.
    #[error("the model is infeasible")]
    Infeasible,

    /// The solver stopped without producing any incumbent solution.
    #[error("the solver stopped without a solution")]
    Unsolved,

    /// The backend failed outside the normal status taxonomy.
    #[error("solver backend error: {0}")]
    Solver(String),
}

impl OptimizeError {
    /// True when the error is the caller's fault (HTTP 400 territory)
    /// rather than a solve-time failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            OptimizeError::MalformedKey { .. }
                | OptimizeError::MissingParameter { .. }
                | OptimizeError::InvalidModel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_classified() {
        let err = OptimizeError::MalformedKey { key: "(1,".into() };
        assert!(err.is_caller_error());
        let err = OptimizeError::MissingParameter { name: "start_cost", key: "(1,2)".into() };
        assert!(err.is_caller_error());
        assert!(OptimizeError::InvalidModel("short".into()).is_caller_error());
        assert!(!OptimizeError::Infeasible.is_caller_error());
        assert!(!OptimizeError::Unsolved.is_caller_error());
        assert!(!OptimizeError::Solver("abandoned".into()).is_caller_error());
    }

    #[test]
    fn missing_parameter_names_map_and_key() {
        let err = OptimizeError::MissingParameter { name: "electricity_price", key: "7".into() };
        assert_eq!(err.to_string(), "missing entry 7 in electricity_price");
    }
}
