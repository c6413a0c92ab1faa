use thiserror::Error;

/// Failure of a single recommendation call. Always returned as a value;
/// nothing in the engine panics across this boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("rule store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal recommendation failure: {0}")]
    Internal(String),
}

impl RecommendError {
    /// Stable machine-readable class for logs and wire payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Provide at least one non-blank product name."
            }
            Self::ServiceUnavailable { .. } => {
                "Recommendations are temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl From<RecommendError> for InterfaceError {
    fn from(value: RecommendError) -> Self {
        match value {
            RecommendError::InvalidInput(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            RecommendError::StoreUnavailable(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            RecommendError::Internal(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{InterfaceError, RecommendError};

    #[test]
    fn invalid_input_maps_to_bad_request_interface_error() {
        let interface =
            RecommendError::InvalidInput("item 0 is blank".to_owned()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.correlation_id(), "req-1");
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface =
            RecommendError::InvalidInput("item 0 is blank".to_owned()).into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Provide at least one non-blank product name."
        );
    }

    #[test]
    fn store_unavailable_maps_to_service_unavailable() {
        let interface = RecommendError::StoreUnavailable("artifact missing".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.error_class(), "service_unavailable");
        assert_eq!(
            interface.user_message(),
            "Recommendations are temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn internal_failure_maps_to_internal() {
        let error = RecommendError::Internal("rule 3 has NaN lift".to_owned());
        assert_eq!(error.error_class(), "internal");

        let interface = error.into_interface("req-4");
        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
