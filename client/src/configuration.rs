// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde_json::{Map, Value, json};
use zeroize::Zeroizing;

use crate::constants::{
    CONFIG_SKELETON_FILENAME, DEFAULT_ENVIRONMENT, FN_CLIENT_ID, FN_ENVIRONMENT, FN_PASSWORD,
    FN_SECRET_KEY, FN_TEMP_DIRECTORY, FN_USERNAME, PROGRAM_NAME,
};
use crate::errors::AppError;

#[derive(Clone, Parser)]
#[command(name = PROGRAM_NAME, author, version, about, long_about = None)]
pub struct ClientOptions {
    /// JSON configuration file holding the credential set
    #[arg(
        short = 'c',
        long = "config",
        env("AI2C_CONFIG_FILE"),
        conflicts_with_all = ["client_id", "password", "secret_key", "temp_dir", "username"]
    )]
    pub config: Option<PathBuf>,
    /// Write a skeleton configuration file into this directory and exit
    #[arg(long = "genconfig")]
    pub gen_config: Option<PathBuf>,
    #[arg(long, env("AI2C_CLIENT_ID"))]
    pub client_id: Option<String>,
    #[arg(long, env("AI2C_PASSWORD"), hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, env("AI2C_SECRET_KEY"), hide_env_values = true)]
    pub secret_key: Option<String>,
    #[arg(long, env("AI2C_TEMP_DIR"))]
    pub temp_dir: Option<String>,
    #[arg(long, env("AI2C_USERNAME"))]
    pub username: Option<String>,
    #[arg(long, default_value = DEFAULT_ENVIRONMENT, env("AI2C_ENVIRONMENT"))]
    pub environment: String,
    /// JSON request to dispatch once the client is ready
    #[arg(long, env("AI2C_REQUEST_FILE"))]
    pub request: Option<PathBuf>,
    #[arg(long, env("AI2C_AWS_REGION"))]
    pub region: Option<String>,
    #[arg(long, env("AI2C_USER_POOL_ID"))]
    pub user_pool_id: Option<String>,
    #[arg(long, env("AI2C_APP_CLIENT_ID"))]
    pub app_client_id: Option<String>,
    #[arg(long, env("AI2C_IDENTITY_POOL_ID"))]
    pub identity_pool_id: Option<String>,
    #[arg(long, default_value = "30", env("AI2C_STAGE_TIMEOUT_SECS"))]
    pub stage_timeout_secs: u64,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("config", &self.config)
            .field("gen_config", &self.gen_config)
            .field("client_id", &self.client_id)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("temp_dir", &self.temp_dir)
            .field("username", &self.username)
            .field("environment", &self.environment)
            .field("request", &self.request)
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("app_client_id", &self.app_client_id)
            .field("identity_pool_id", &self.identity_pool_id)
            .field("stage_timeout_secs", &self.stage_timeout_secs)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            config: None,
            gen_config: None,
            client_id: None,
            password: None,
            secret_key: None,
            temp_dir: None,
            username: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            request: None,
            region: None,
            user_pool_id: None,
            app_client_id: None,
            identity_pool_id: None,
            stage_timeout_secs: 30,
        }
    }
}

impl ClientOptions {
    /// Moves the credential inputs out of the options.
    ///
    /// The password and secret key strings are moved, not copied, into
    /// zeroizing buffers; the options no longer hold them afterwards.
    pub fn take_credential_source(&mut self) -> CredentialSource {
        match self.config.take() {
            Some(path) => CredentialSource::ConfigFile(path),
            None => CredentialSource::Explicit(ExplicitCredentials {
                client_id: self.client_id.take().unwrap_or_default(),
                environment: self.environment.clone(),
                password: Zeroizing::new(self.password.take().unwrap_or_default()),
                secret_key: Zeroizing::new(self.secret_key.take().unwrap_or_default()),
                temp_directory: self.temp_dir.take().unwrap_or_default(),
                username: self.username.take().unwrap_or_default(),
            }),
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn cognito_settings(&self) -> Result<CognitoSettings, AppError> {
        Ok(CognitoSettings {
            region: required(&self.region, "region")?,
            user_pool_id: required(&self.user_pool_id, "userPoolId")?,
            app_client_id: required(&self.app_client_id, "appClientId")?,
            identity_pool_id: required(&self.identity_pool_id, "identityPoolId")?,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(AppError::MissingField(name)),
    }
}

/// Where the credential set comes from. The two modes are mutually exclusive.
#[derive(Debug)]
pub enum CredentialSource {
    Explicit(ExplicitCredentials),
    ConfigFile(PathBuf),
}

pub struct ExplicitCredentials {
    pub client_id: String,
    pub environment: String,
    pub password: Zeroizing<String>,
    pub secret_key: Zeroizing<String>,
    pub temp_directory: String,
    pub username: String,
}

impl fmt::Debug for ExplicitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplicitCredentials")
            .field("client_id", &self.client_id)
            .field("environment", &self.environment)
            .field("password", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("temp_directory", &self.temp_directory)
            .field("username", &self.username)
            .finish()
    }
}

/// Identity provider settings for the Cognito adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoSettings {
    pub region: String,
    pub user_pool_id: String,
    pub app_client_id: String,
    pub identity_pool_id: String,
}

impl CognitoSettings {
    /// Login provider key used by the identity pool for this user pool.
    pub fn provider_name(&self) -> String {
        format!(
            "cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// The part of the user pool id after the region prefix.
    pub fn pool_name(&self) -> &str {
        self.user_pool_id
            .split_once('_')
            .map_or(self.user_pool_id.as_str(), |(_, name)| name)
    }
}

/// Loads a config bundle as an untyped key/value map.
pub trait ConfigLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Map<String, Value>, AppError>;
}

/// Reads the bundle from a JSON file.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileLoader;

impl ConfigLoader for JsonFileLoader {
    #[tracing::instrument(skip(self))]
    fn load(&self, path: &Path) -> Result<Map<String, Value>, AppError> {
        let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigLoad(format!("unable to read {}: {}", path.display(), e))
        })?);

        // serde_json errors only report position, never content
        serde_json::from_str::<Map<String, Value>>(&contents)
            .map_err(|e| AppError::ConfigLoad(format!("unable to parse {}: {}", path.display(), e)))
    }
}

/// Writes a skeleton config file with every expected key and returns its path.
#[tracing::instrument]
pub fn generate_config_skeleton(directory: &Path) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(CONFIG_SKELETON_FILENAME);

    let skeleton = json!({
        FN_CLIENT_ID: "",
        FN_ENVIRONMENT: DEFAULT_ENVIRONMENT,
        FN_PASSWORD: "",
        FN_SECRET_KEY: "",
        FN_TEMP_DIRECTORY: "",
        FN_USERNAME: "",
    });
    let contents = serde_json::to_string_pretty(&skeleton)
        .map_err(|e| AppError::SerializationFailure(e.to_string()))?;
    std::fs::write(&path, contents)?;

    tracing::info!("[ai2c] wrote configuration skeleton to {}", path.display());

    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment_is_production() {
        let options = ClientOptions::parse_from(["ai2c-client"]);
        assert_eq!(options.environment, "production");
        assert_eq!(options.stage_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_conflicts_with_explicit_fields() {
        let result = ClientOptions::try_parse_from([
            "ai2c-client",
            "--config",
            "/etc/ai2c.json",
            "--username",
            "u",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_take_credential_source_explicit_moves_secrets() {
        let mut options = ClientOptions::parse_from([
            "ai2c-client",
            "--client-id",
            "c1",
            "--password",
            "p",
            "--secret-key",
            "sk",
            "--temp-dir",
            "/tmp/x",
            "--username",
            "u",
            "--environment",
            "development",
        ]);

        let source = options.take_credential_source();
        assert!(options.password.is_none());
        assert!(options.secret_key.is_none());
        match source {
            CredentialSource::Explicit(explicit) => {
                assert_eq!(explicit.client_id, "c1");
                assert_eq!(explicit.environment, "development");
                assert_eq!(explicit.password.as_str(), "p");
                assert_eq!(explicit.secret_key.as_str(), "sk");
                assert_eq!(explicit.temp_directory, "/tmp/x");
                assert_eq!(explicit.username, "u");
            }
            CredentialSource::ConfigFile(_) => panic!("expected explicit source"),
        }
    }

    #[test]
    fn test_take_credential_source_config_file() {
        let mut options = ClientOptions::parse_from(["ai2c-client", "-c", "/etc/ai2c.json"]);
        match options.take_credential_source() {
            CredentialSource::ConfigFile(path) => assert_eq!(path, PathBuf::from("/etc/ai2c.json")),
            CredentialSource::Explicit(_) => panic!("expected config file source"),
        }
    }

    #[test]
    fn test_options_debug_redacts_secrets() {
        let options = ClientOptions {
            password: Some("hunter2".to_string()),
            secret_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", options);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_cognito_settings_missing_value() {
        let options = ClientOptions {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.cognito_settings(),
            Err(AppError::MissingField("userPoolId"))
        );
    }

    #[test]
    fn test_cognito_provider_and_pool_name() {
        let settings = CognitoSettings {
            region: "us-east-1".to_string(),
            user_pool_id: "us-east-1_AbCdEf".to_string(),
            app_client_id: "client".to_string(),
            identity_pool_id: "us-east-1:pool".to_string(),
        };
        assert_eq!(
            settings.provider_name(),
            "cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEf"
        );
        assert_eq!(settings.pool_name(), "AbCdEf");
    }

    #[test]
    fn test_json_loader_reads_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"clientId": "c1", "environment": "local"}"#).unwrap();

        let map = JsonFileLoader.load(&path).unwrap();
        assert_eq!(map["clientId"], "c1");
    }

    #[test]
    fn test_json_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonFileLoader.load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(AppError::ConfigLoad(_))));
    }

    #[test]
    fn test_json_loader_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(JsonFileLoader.load(&path), Err(AppError::ConfigLoad(_))));
    }

    #[test]
    fn test_generate_config_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_config_skeleton(dir.path()).unwrap();

        let map = JsonFileLoader.load(&path).unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map[FN_ENVIRONMENT], "production");
        assert_eq!(map[FN_PASSWORD], "");
    }
}
