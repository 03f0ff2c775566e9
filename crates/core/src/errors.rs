use thiserror::Error;

/// Failure surfaced to the caller of the skill endpoint.
///
/// Only rejected requests and internal faults reach this type; backend
/// outages are turned into spoken text long before an error is built.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Forbidden { .. } => "The request was not issued for this skill.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Forbidden { .. } => "forbidden",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::InterfaceError;

    #[test]
    fn every_class_exposes_its_correlation_id() {
        let internal = InterfaceError::Internal {
            message: "handler failed".to_owned(),
            correlation_id: "req-1".to_owned(),
        };

        assert_eq!(internal.correlation_id(), "req-1");
        assert_eq!(internal.error_class(), "internal");
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let error = InterfaceError::BadRequest {
            message: "missing request type".to_owned(),
            correlation_id: "req-2".to_owned(),
        };

        assert_eq!(
            error.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn forbidden_does_not_echo_identifiers() {
        let error = InterfaceError::Forbidden {
            message: "application id amzn1.ask.skill.other does not match".to_owned(),
            correlation_id: "req-3".to_owned(),
        };

        assert!(!error.user_message().contains("amzn1"));
    }
}
