use super::types::AttestError;

/// Coarse error taxonomy used in logs and by the CLI exit code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Provider not connected, invalid config file, unknown agent id.
    Configuration,
    /// Any failure during a provider call. Recorded on the agent, never aborts a run.
    Provider,
    /// Snapshot serialization or storage failure. Logged and discarded.
    Persistence,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Provider => "provider",
            Self::Persistence => "persistence",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AttestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AttestError::Config(_)
            | AttestError::Authentication(_)
            | AttestError::UnknownAgent(_)
            | AttestError::Yaml(_) => ErrorCategory::Configuration,

            AttestError::Provider(_)
            | AttestError::RateLimit(_)
            | AttestError::Network(_)
            | AttestError::Prompt(_) => ErrorCategory::Provider,

            AttestError::Persistence(_) | AttestError::Json(_) => ErrorCategory::Persistence,

            AttestError::Data(_)
            | AttestError::Cancelled(_)
            | AttestError::Io(_)
            | AttestError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_provider_error() {
        let err = AttestError::RateLimit("too many requests".into());
        assert_eq!(err.category(), ErrorCategory::Provider);
    }

    #[test]
    fn test_authentication_is_configuration() {
        let err = AttestError::Authentication("bad key".into());
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_persistence_category() {
        let err = AttestError::Persistence("disk full".into());
        assert_eq!(err.category(), ErrorCategory::Persistence);
        assert_eq!(err.category().as_str(), "persistence");
    }

    #[test]
    fn test_network_is_provider_error() {
        let err = AttestError::Network("connection refused".into());
        assert_eq!(err.category(), ErrorCategory::Provider);
    }

    #[test]
    fn test_display_keeps_message() {
        let err = AttestError::Provider("model overloaded".into());
        assert_eq!(err.to_string(), "Provider error: model overloaded");
    }
}
