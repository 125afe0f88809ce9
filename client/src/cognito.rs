// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Cognito-backed identity provider.
//!
//! Login is a user pool SRP exchange followed by an identity pool credential
//! exchange:
//!
//! ```text
//! InitiateAuth (USER_SRP_AUTH) -> PASSWORD_VERIFIER -> RespondToAuthChallenge
//!     -> ID token -> GetId -> GetCredentialsForIdentity -> AWS credentials
//! ```
//!
//! The resulting [`AwsSession`] reads remote parameters from SSM Parameter
//! Store with those credentials, limited to the environment it was
//! authenticated for. The user and identity pools are the same for every
//! environment.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_cognitoidentityprovider::types::{AuthFlowType, ChallengeNameType};
use zeroize::Zeroizing;

use crate::configuration::CognitoSettings;
use crate::errors::AppError;
use crate::identity::{IdentityAuthenticator, Parameter, SessionHandle};
use crate::parameters::parameter_name;
use crate::srp::{SrpClient, timestamp_now};

const CREDENTIALS_PROVIDER_NAME: &str = "cognito-identity";

pub struct CognitoAuthenticator {
    settings: CognitoSettings,
}

impl CognitoAuthenticator {
    pub fn new(settings: CognitoSettings) -> Self {
        Self { settings }
    }

    /// Config for the unauthenticated Cognito calls.
    async fn anonymous_config(&self) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.settings.region.clone()))
            .no_credentials()
            .load()
            .await
    }

    /// Runs the SRP exchange and returns the user's ID token.
    async fn user_pool_login(
        &self,
        config: &SdkConfig,
        username: &str,
        password: &str,
    ) -> Result<Zeroizing<String>, AppError> {
        let client = aws_sdk_cognitoidentityprovider::Client::new(config);
        let srp = SrpClient::new(self.settings.pool_name())?;

        let initiated = client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserSrpAuth)
            .client_id(&self.settings.app_client_id)
            .auth_parameters("USERNAME", username)
            .auth_parameters("SRP_A", srp.srp_a())
            .send()
            .await
            .map_err(|e| {
                AppError::AuthFailure(format!(
                    "initiate auth: {}",
                    aws_sdk_cognitoidentityprovider::error::DisplayErrorContext(&e)
                ))
            })?;

        if initiated.challenge_name() != Some(&ChallengeNameType::PasswordVerifier) {
            return Err(AppError::AuthFailure(format!(
                "unexpected challenge: {:?}",
                initiated.challenge_name()
            )));
        }
        let parameters = initiated
            .challenge_parameters()
            .ok_or_else(|| AppError::AuthFailure("challenge has no parameters".to_string()))?;

        let user_id = challenge_value(parameters, "USER_ID_FOR_SRP")?;
        let claim = srp.password_claim(
            user_id,
            password,
            challenge_value(parameters, "SALT")?,
            challenge_value(parameters, "SRP_B")?,
            challenge_value(parameters, "SECRET_BLOCK")?,
            &timestamp_now(),
        )?;

        let responded = client
            .respond_to_auth_challenge()
            .client_id(&self.settings.app_client_id)
            .challenge_name(ChallengeNameType::PasswordVerifier)
            .set_session(initiated.session().map(str::to_string))
            .challenge_responses("USERNAME", user_id)
            .challenge_responses("PASSWORD_CLAIM_SECRET_BLOCK", claim.secret_block)
            .challenge_responses("PASSWORD_CLAIM_SIGNATURE", claim.signature)
            .challenge_responses("TIMESTAMP", claim.timestamp)
            .send()
            .await
            .map_err(|e| {
                AppError::AuthFailure(format!(
                    "respond to challenge: {}",
                    aws_sdk_cognitoidentityprovider::error::DisplayErrorContext(&e)
                ))
            })?;

        responded
            .authentication_result()
            .and_then(|result| result.id_token())
            .map(|token| Zeroizing::new(token.to_string()))
            .ok_or_else(|| AppError::AuthFailure("no id token issued".to_string()))
    }

    /// Trades the ID token for an identity id and temporary AWS credentials.
    async fn identity_credentials(
        &self,
        config: &SdkConfig,
        id_token: &str,
    ) -> Result<(String, Credentials), AppError> {
        let client = aws_sdk_cognitoidentity::Client::new(config);
        let provider = self.settings.provider_name();

        let identity = client
            .get_id()
            .identity_pool_id(&self.settings.identity_pool_id)
            .logins(&provider, id_token)
            .send()
            .await
            .map_err(|e| {
                AppError::AuthFailure(format!(
                    "get identity: {}",
                    aws_sdk_cognitoidentity::error::DisplayErrorContext(&e)
                ))
            })?;
        let identity_id = identity
            .identity_id()
            .ok_or_else(|| AppError::AuthFailure("no identity id issued".to_string()))?
            .to_string();

        let issued = client
            .get_credentials_for_identity()
            .identity_id(&identity_id)
            .logins(&provider, id_token)
            .send()
            .await
            .map_err(|e| {
                AppError::AuthFailure(format!(
                    "get credentials: {}",
                    aws_sdk_cognitoidentity::error::DisplayErrorContext(&e)
                ))
            })?;
        let issued = issued
            .credentials()
            .ok_or_else(|| AppError::AuthFailure("no credentials issued".to_string()))?;

        let (Some(access_key_id), Some(secret_key)) = (issued.access_key_id(), issued.secret_key())
        else {
            return Err(AppError::AuthFailure(
                "issued credentials are incomplete".to_string(),
            ));
        };

        let credentials = Credentials::new(
            access_key_id,
            secret_key,
            issued.session_token().map(str::to_string),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        Ok((identity_id, credentials))
    }
}

#[async_trait]
impl IdentityAuthenticator for CognitoAuthenticator {
    #[tracing::instrument(skip(self, password))]
    async fn authenticate(
        &self,
        environment: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn SessionHandle>, AppError> {
        tracing::info!(
            "[ai2c] authenticating {} for {} against user pool {}",
            username,
            environment,
            self.settings.user_pool_id
        );
        let config = self.anonymous_config().await;

        let id_token = self.user_pool_login(&config, username, password).await?;
        tracing::debug!("[ai2c] user pool login succeeded");

        let (identity_id, credentials) = self.identity_credentials(&config, &id_token).await?;
        tracing::debug!("[ai2c] obtained credentials for identity {}", identity_id);

        let session_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(Box::new(AwsSession {
            identity_id,
            environment: environment.to_string(),
            ssm: aws_sdk_ssm::Client::new(&session_config),
        }))
    }
}

fn challenge_value<'a>(
    parameters: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, AppError> {
    parameters
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::AuthFailure(format!("challenge is missing {}", name)))
}

/// Names outside `environment`'s parameter path are refused.
fn ensure_in_environment(environment: &str, names: &[String]) -> Result<(), AppError> {
    let scope = parameter_name(environment, "");
    match names.iter().find(|name| !name.starts_with(&scope)) {
        Some(name) => Err(AppError::ParameterFetchFailure(format!(
            "{} is outside the {} environment",
            name, environment
        ))),
        None => Ok(()),
    }
}

/// Session backed by Cognito-issued AWS credentials.
pub struct AwsSession {
    identity_id: String,
    environment: String,
    ssm: aws_sdk_ssm::Client,
}

#[async_trait]
impl SessionHandle for AwsSession {
    fn client_id(&self) -> &str {
        &self.identity_id
    }

    #[tracing::instrument(skip(self))]
    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>, AppError> {
        ensure_in_environment(&self.environment, names)?;

        let output = self
            .ssm
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                AppError::ParameterFetchFailure(format!(
                    "{}",
                    aws_sdk_ssm::error::DisplayErrorContext(&e)
                ))
            })?;

        if !output.invalid_parameters().is_empty() {
            tracing::warn!(
                "[ai2c] parameter store does not know {:?}",
                output.invalid_parameters()
            );
        }

        Ok(output
            .parameters()
            .iter()
            .filter_map(|parameter| Some(Parameter::new(parameter.name()?, parameter.value()?)))
            .collect())
    }
}
