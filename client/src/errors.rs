// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Error taxonomy shared by every bootstrap stage and the request dispatcher.
//!
//! Messages name the stage or field that failed. They never carry secret
//! values: callers build them from field names, parameter names, paths and
//! collaborator error text only.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),
    #[error("unable to load configuration: {0}")]
    ConfigLoad(String),
    #[error("authentication failed: {0}")]
    AuthFailure(String),
    #[error("unable to fetch parameters: {0}")]
    ParameterFetchFailure(String),
    #[error("i/o failure: {0}")]
    IoFailure(String),
    #[error("serialization failure: {0}")]
    SerializationFailure(String),
    #[error("connection failure: {0}")]
    ConnectionFailure(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        tracing::error!("[ai2c] {:?}", source);
        AppError::IoFailure(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_field() {
        let err = AppError::MissingField("clientId");
        assert_eq!(err.to_string(), "missing required field: clientId");
    }

    #[test]
    fn test_io_error_maps_to_io_failure() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = source.into();
        assert!(matches!(err, AppError::IoFailure(msg) if msg.contains("denied")));
    }
}
