// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Credential resolution and validation.
//!
//! [`resolve`] turns a [`CredentialSource`] into a [`CredentialBundle`]; it
//! checks presence only. [`validate`] then checks the whole bundle, including
//! the environment, and names the first offending field.

use serde_json::{Map, Value};
use zeroize::{Zeroize, Zeroizing};

use crate::configuration::{ConfigLoader, CredentialSource, ExplicitCredentials};
use crate::constants::{
    ENVIRONMENTS, FN_CLIENT_ID, FN_ENVIRONMENT, FN_PASSWORD, FN_SECRET_KEY, FN_TEMP_DIRECTORY,
    FN_USERNAME, TXT_PROTECTED,
};
use crate::errors::AppError;
use crate::models::CredentialBundle;

#[tracing::instrument(skip(source, loader))]
pub fn resolve(
    source: CredentialSource,
    loader: &dyn ConfigLoader,
) -> Result<CredentialBundle, AppError> {
    match source {
        CredentialSource::Explicit(explicit) => resolve_explicit(explicit),
        CredentialSource::ConfigFile(path) => {
            tracing::debug!("[ai2c] loading credentials from {}", path.display());
            let mut bundle = loader.load(&path)?;
            resolve_from_map(&mut bundle)
        }
    }
}

/// Checks the explicit fields in a fixed order: clientId, password,
/// secretKey, tempDirectory, username. The environment is passed through.
pub fn resolve_explicit(explicit: ExplicitCredentials) -> Result<CredentialBundle, AppError> {
    if explicit.client_id.is_empty() {
        return Err(AppError::MissingField(FN_CLIENT_ID));
    }
    if explicit.password.is_empty() {
        return Err(AppError::MissingField(FN_PASSWORD));
    }
    if explicit.secret_key.is_empty() {
        return Err(AppError::MissingField(FN_SECRET_KEY));
    }
    if explicit.temp_directory.is_empty() {
        return Err(AppError::MissingField(FN_TEMP_DIRECTORY));
    }
    if explicit.username.is_empty() {
        return Err(AppError::MissingField(FN_USERNAME));
    }

    let ExplicitCredentials {
        client_id,
        environment,
        password,
        secret_key,
        temp_directory,
        username,
    } = explicit;

    Ok(CredentialBundle {
        client_id,
        environment,
        username,
        password: Some(password),
        secret_key,
        temp_directory,
    })
}

/// Extracts the six typed fields from a loaded config bundle.
///
/// The password and secret key entries in `bundle` are wiped and replaced
/// with [`TXT_PROTECTED`] as soon as they have been read, whether or not the
/// remaining fields extract cleanly.
pub fn resolve_from_map(bundle: &mut Map<String, Value>) -> Result<CredentialBundle, AppError> {
    let password = take_secret(bundle, FN_PASSWORD);
    let secret_key = take_secret(bundle, FN_SECRET_KEY);

    let client_id = string_field(bundle, FN_CLIENT_ID)?;
    let environment = string_field(bundle, FN_ENVIRONMENT)?;
    let password = password?;
    let secret_key = secret_key?;
    let temp_directory = string_field(bundle, FN_TEMP_DIRECTORY)?;
    let username = string_field(bundle, FN_USERNAME)?;

    Ok(CredentialBundle {
        client_id,
        environment,
        username,
        password: Some(password),
        secret_key,
        temp_directory,
    })
}

fn take_secret(
    bundle: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Zeroizing<String>, AppError> {
    let Some(entry) = bundle.get_mut(name) else {
        return Err(type_mismatch(name));
    };
    let secret = match &mut *entry {
        Value::String(value) => {
            let secret = Zeroizing::new(value.clone());
            value.zeroize();
            Ok(secret)
        }
        _ => Err(type_mismatch(name)),
    };
    *entry = Value::String(TXT_PROTECTED.to_string());
    secret
}

fn string_field(bundle: &Map<String, Value>, name: &'static str) -> Result<String, AppError> {
    match bundle.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(type_mismatch(name)),
    }
}

fn type_mismatch(name: &str) -> AppError {
    AppError::ConfigLoad(format!("{} must be present and a string", name))
}

pub fn is_environment_valid(environment: &str) -> bool {
    ENVIRONMENTS.contains(&environment)
}

/// Validates the resolved bundle, failing on the first offending field.
#[tracing::instrument(skip(bundle))]
pub fn validate(bundle: &CredentialBundle) -> Result<(), AppError> {
    if bundle.client_id.is_empty() {
        return Err(AppError::MissingField(FN_CLIENT_ID));
    }
    if !is_environment_valid(&bundle.environment) {
        return Err(AppError::InvalidEnvironment(bundle.environment.clone()));
    }
    if bundle.password.is_none() {
        return Err(AppError::MissingField(FN_PASSWORD));
    }
    if bundle.secret_key.is_empty() {
        return Err(AppError::MissingField(FN_SECRET_KEY));
    }
    if bundle.temp_directory.is_empty() {
        return Err(AppError::MissingField(FN_TEMP_DIRECTORY));
    }
    if bundle.username.is_empty() {
        return Err(AppError::MissingField(FN_USERNAME));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn explicit() -> ExplicitCredentials {
        ExplicitCredentials {
            client_id: "c1".to_string(),
            environment: "development".to_string(),
            password: Zeroizing::new("p".to_string()),
            secret_key: Zeroizing::new("sk".to_string()),
            temp_directory: "/tmp/x".to_string(),
            username: "u".to_string(),
        }
    }

    fn config_map() -> Map<String, Value> {
        let value = json!({
            "clientId": "c1",
            "environment": "development",
            "password": "p",
            "secretKey": "sk",
            "tempDirectory": "/tmp/x",
            "username": "u",
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn bundle() -> CredentialBundle {
        resolve_explicit(explicit()).unwrap()
    }

    struct StaticLoader(Map<String, Value>);

    impl ConfigLoader for StaticLoader {
        fn load(&self, _path: &Path) -> Result<Map<String, Value>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLoader;

    impl ConfigLoader for FailingLoader {
        fn load(&self, _path: &Path) -> Result<Map<String, Value>, AppError> {
            Err(AppError::ConfigLoad("unreadable".to_string()))
        }
    }

    // ==================== Explicit Mode ====================

    #[test]
    fn test_explicit_complete() {
        let bundle = bundle();
        assert_eq!(bundle.client_id, "c1");
        assert_eq!(bundle.password.as_ref().unwrap().as_str(), "p");
        assert_eq!(bundle.secret_key.as_str(), "sk");
    }

    #[test]
    fn test_explicit_each_missing_field_in_order() {
        let cases: [(&'static str, fn(&mut ExplicitCredentials)); 5] = [
            (FN_CLIENT_ID, |e| e.client_id.clear()),
            (FN_PASSWORD, |e| e.password.clear()),
            (FN_SECRET_KEY, |e| e.secret_key.clear()),
            (FN_TEMP_DIRECTORY, |e| e.temp_directory.clear()),
            (FN_USERNAME, |e| e.username.clear()),
        ];
        for (name, clear) in cases {
            let mut credentials = explicit();
            clear(&mut credentials);
            let err = resolve_explicit(credentials).unwrap_err();
            assert_eq!(err, AppError::MissingField(name));
        }
    }

    #[test]
    fn test_explicit_first_violation_wins() {
        let mut credentials = explicit();
        credentials.username.clear();
        credentials.secret_key.clear();
        assert_eq!(
            resolve_explicit(credentials).unwrap_err(),
            AppError::MissingField(FN_SECRET_KEY)
        );
    }

    #[test]
    fn test_explicit_does_not_validate_environment() {
        let mut credentials = explicit();
        credentials.environment = "staging".to_string();
        assert_eq!(resolve_explicit(credentials).unwrap().environment, "staging");
    }

    // ==================== Config-File Mode ====================

    #[test]
    fn test_config_map_extracts_fields() {
        let mut map = config_map();
        let bundle = resolve_from_map(&mut map).unwrap();
        assert_eq!(bundle.client_id, "c1");
        assert_eq!(bundle.environment, "development");
        assert_eq!(bundle.username, "u");
        assert_eq!(bundle.temp_directory, "/tmp/x");
        assert_eq!(bundle.password.as_ref().unwrap().as_str(), "p");
    }

    #[test]
    fn test_config_map_password_redacted_after_extraction() {
        let mut map = config_map();
        map.insert("password".to_string(), json!("correct horse"));

        resolve_from_map(&mut map).unwrap();

        assert_eq!(map["password"], TXT_PROTECTED);
        assert!(!map.values().any(|v| v == "correct horse"));
    }

    #[test]
    fn test_config_map_password_redacted_on_failure() {
        let mut map = config_map();
        map.insert("password".to_string(), json!("correct horse"));
        map.insert("username".to_string(), json!(42));

        assert!(matches!(resolve_from_map(&mut map), Err(AppError::ConfigLoad(_))));
        assert_eq!(map["password"], TXT_PROTECTED);
    }

    #[test]
    fn test_config_map_wrong_type() {
        let mut map = config_map();
        map.insert("clientId".to_string(), json!(7));
        let err = resolve_from_map(&mut map).unwrap_err();
        assert!(matches!(err, AppError::ConfigLoad(msg) if msg.contains("clientId")));
    }

    #[test]
    fn test_config_map_missing_key() {
        let mut map = config_map();
        map.remove("secretKey");
        let err = resolve_from_map(&mut map).unwrap_err();
        assert!(matches!(err, AppError::ConfigLoad(msg) if msg.contains("secretKey")));
    }

    #[test]
    fn test_config_map_password_wrong_type() {
        let mut map = config_map();
        map.insert("password".to_string(), json!(1234));
        assert!(matches!(resolve_from_map(&mut map), Err(AppError::ConfigLoad(_))));
        assert_eq!(map["password"], TXT_PROTECTED);
    }

    #[test]
    fn test_config_map_secret_key_redacted_after_extraction() {
        let mut map = config_map();
        map.insert("secretKey".to_string(), json!("sk-plaintext"));

        let bundle = resolve_from_map(&mut map).unwrap();

        assert_eq!(bundle.secret_key.as_str(), "sk-plaintext");
        assert_eq!(map["secretKey"], TXT_PROTECTED);
        assert!(!map.values().any(|v| v == "sk-plaintext"));
    }

    #[test]
    fn test_config_map_secret_key_redacted_on_failure() {
        let mut map = config_map();
        map.insert("secretKey".to_string(), json!("sk-plaintext"));
        map.insert("clientId".to_string(), json!(null));

        assert!(matches!(resolve_from_map(&mut map), Err(AppError::ConfigLoad(_))));
        assert_eq!(map["secretKey"], TXT_PROTECTED);
    }

    #[test]
    fn test_resolve_through_loader() {
        let loader = StaticLoader(config_map());
        let source = CredentialSource::ConfigFile("/etc/ai2c.json".into());
        let bundle = resolve(source, &loader).unwrap();
        assert_eq!(bundle.client_id, "c1");
    }

    #[test]
    fn test_resolve_loader_error() {
        let source = CredentialSource::ConfigFile("/etc/ai2c.json".into());
        assert!(matches!(
            resolve(source, &FailingLoader),
            Err(AppError::ConfigLoad(_))
        ));
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_complete_bundle() {
        assert!(validate(&bundle()).is_ok());
    }

    #[test]
    fn test_validate_each_missing_field_in_order() {
        let cases: [(&'static str, fn(&mut CredentialBundle)); 5] = [
            (FN_CLIENT_ID, |b| b.client_id.clear()),
            (FN_PASSWORD, |b| b.password = None),
            (FN_SECRET_KEY, |b| b.secret_key.clear()),
            (FN_TEMP_DIRECTORY, |b| b.temp_directory.clear()),
            (FN_USERNAME, |b| b.username.clear()),
        ];
        for (name, clear) in cases {
            let mut bundle = bundle();
            clear(&mut bundle);
            assert_eq!(validate(&bundle), Err(AppError::MissingField(name)));
        }
    }

    #[test]
    fn test_validate_invalid_environment() {
        let mut bundle = bundle();
        bundle.environment = "staging".to_string();
        assert_eq!(
            validate(&bundle),
            Err(AppError::InvalidEnvironment("staging".to_string()))
        );
    }

    #[test]
    fn test_validate_client_id_checked_before_environment() {
        let mut bundle = bundle();
        bundle.client_id.clear();
        bundle.environment = "staging".to_string();
        assert_eq!(validate(&bundle), Err(AppError::MissingField(FN_CLIENT_ID)));
    }

    #[test]
    fn test_recognized_environments() {
        assert!(is_environment_valid("local"));
        assert!(is_environment_valid("development"));
        assert!(is_environment_valid("production"));
        assert!(!is_environment_valid(""));
        assert!(!is_environment_valid("Production"));
    }
}
