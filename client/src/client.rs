// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Bootstrap pipeline and the ready client.
//!
//! ```text
//! resolve -> validate -> authenticate -> fetch parameters -> stage -> connect
//! ```
//!
//! Stages run strictly in order and the first failure aborts the rest. The
//! password leaves the credential bundle only for the authentication call
//! and is wiped when that call returns. The bundle, and with it the secret
//! key, is dropped once the connection is open.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::configuration::{ConfigLoader, CredentialSource};
use crate::constants::{DEFAULT_STAGE_TIMEOUT, FN_PASSWORD};
use crate::credentials;
use crate::dispatch;
use crate::errors::AppError;
use crate::identity::{IdentityAuthenticator, SessionHandle};
use crate::messaging::{
    ConnectionSettings, MessagingConnection, MessagingConnector, build_instance_name,
};
use crate::models::{Ai2CInfo, CredentialBundle, StagedMaterial};
use crate::parameters::fetch_parameters;
use crate::staging::stage_material;

/// Runs the bootstrap stages against the given collaborators.
pub struct Bootstrapper {
    loader: Box<dyn ConfigLoader>,
    authenticator: Box<dyn IdentityAuthenticator>,
    connector: Box<dyn MessagingConnector>,
    stage_timeout: Duration,
}

impl Bootstrapper {
    pub fn new(
        loader: Box<dyn ConfigLoader>,
        authenticator: Box<dyn IdentityAuthenticator>,
        connector: Box<dyn MessagingConnector>,
    ) -> Self {
        Self {
            loader,
            authenticator,
            connector,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    /// Deadline applied to authentication, parameter fetch and connect.
    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    #[tracing::instrument(skip(self, source))]
    pub async fn run(&self, source: CredentialSource) -> Result<Ai2CClient, AppError> {
        let bundle = credentials::resolve(source, self.loader.as_ref())?;
        self.run_bundle(bundle).await
    }

    /// Runs every stage after resolution against an already resolved bundle.
    #[tracing::instrument(skip(self, bundle))]
    pub async fn run_bundle(&self, mut bundle: CredentialBundle) -> Result<Ai2CClient, AppError> {
        credentials::validate(&bundle)?;
        tracing::info!(
            "[ai2c] credentials resolved for {} in {}",
            bundle.client_id,
            bundle.environment
        );

        let session = {
            let password = bundle
                .password
                .take()
                .ok_or(AppError::MissingField(FN_PASSWORD))?;
            let session = self
                .with_deadline(
                    "authentication",
                    AppError::AuthFailure,
                    self.authenticator
                        .authenticate(&bundle.environment, &bundle.username, &password),
                )
                .await;
            // wiped here on both paths
            drop(password);
            session?
        };
        tracing::info!("[ai2c] authenticated as {}", session.client_id());

        let parameters = self
            .with_deadline(
                "parameter fetch",
                AppError::ParameterFetchFailure,
                fetch_parameters(session.as_ref(), &bundle.environment),
            )
            .await?;

        let staged = stage_material(Path::new(&bundle.temp_directory), &parameters).await?;

        let instance_name = build_instance_name(session.client_id())?;
        let settings = ConnectionSettings::new(instance_name, &parameters, &staged);
        drop(parameters);

        let connection = self
            .with_deadline(
                "connection",
                AppError::ConnectionFailure,
                self.connector.connect(settings),
            )
            .await?;

        let client = Ai2CClient {
            client_id: bundle.client_id.clone(),
            environment: bundle.environment.clone(),
            temp_directory: PathBuf::from(&bundle.temp_directory),
            session,
            staged,
            connection,
        };
        drop(bundle);

        tracing::info!("[ai2c] client {} is ready", client.instance_name());

        Ok(client)
    }

    async fn with_deadline<T>(
        &self,
        stage: &str,
        on_expiry: fn(String) -> AppError,
        future: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.stage_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("[ai2c] {} timed out after {:?}", stage, self.stage_timeout);
                Err(on_expiry(format!(
                    "{} did not complete within {:?}",
                    stage, self.stage_timeout
                )))
            }
        }
    }
}

/// A bootstrapped client. Only ever handed out fully connected.
pub struct Ai2CClient {
    client_id: String,
    environment: String,
    temp_directory: PathBuf,
    session: Box<dyn SessionHandle>,
    staged: StagedMaterial,
    connection: Arc<dyn MessagingConnection>,
}

impl Ai2CClient {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn temp_directory(&self) -> &Path {
        &self.temp_directory
    }

    pub fn session(&self) -> &dyn SessionHandle {
        self.session.as_ref()
    }

    pub fn staged(&self) -> &StagedMaterial {
        &self.staged
    }

    pub fn instance_name(&self) -> &str {
        self.connection.instance_name()
    }

    /// Dispatches `info`; see [`dispatch::dispatch`] for routing.
    ///
    /// Safe to call concurrently from several tasks.
    pub async fn ai2_request(&self, info: &Ai2CInfo) -> Result<Option<Bytes>, AppError> {
        dispatch::dispatch(self.connection.as_ref(), &self.client_id, info).await
    }
}

impl fmt::Debug for Ai2CClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ai2CClient")
            .field("client_id", &self.client_id)
            .field("environment", &self.environment)
            .field("temp_directory", &self.temp_directory)
            .field("session", &self.session.client_id())
            .field("staged", &self.staged)
            .field("instance_name", &self.instance_name())
            .finish()
    }
}
