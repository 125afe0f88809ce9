// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Messaging connection establishment and transport.
//!
//! [`MessagingConnector`] opens a persistent mutual-TLS connection from
//! [`ConnectionSettings`]; the resulting [`MessagingConnection`] carries
//! correlated request/reply calls. Correlation of concurrent requests is left
//! to the transport. There is no reconnection here: a failed connect is
//! terminal, and so is losing an established connection. Once the transport
//! reports a disconnect every later request fails with
//! [`AppError::ConnectionFailure`] and the caller re-runs bootstrap.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_nats::client::RequestErrorKind;
use async_nats::{ConnectOptions, Event, HeaderMap};
use async_trait::async_trait;
use bytes::Bytes;
use zeroize::Zeroizing;

use crate::constants::{FN_CLIENT_ID, MAX_RECONNECTS, PING_INTERVAL};
use crate::errors::AppError;
use crate::models::{ParameterSet, RequestEnvelope, StagedMaterial};

/// Builds a connection name unique to this process from the client id.
pub fn build_instance_name(client_id: &str) -> Result<String, AppError> {
    if client_id.is_empty() {
        return Err(AppError::MissingField(FN_CLIENT_ID));
    }
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();

    Ok([
        client_id.to_string(),
        millis.to_string(),
        fastrand::u32(..).to_string(),
    ]
    .join("-"))
}

/// Everything needed to open the messaging connection.
pub struct ConnectionSettings {
    pub instance_name: String,
    pub url: String,
    pub port: u16,
    pub token: Zeroizing<String>,
    pub tls_ca_bundle_path: PathBuf,
    pub tls_cert_path: PathBuf,
    pub tls_private_key_path: PathBuf,
}

impl ConnectionSettings {
    pub fn new(instance_name: String, parameters: &ParameterSet, staged: &StagedMaterial) -> Self {
        Self {
            instance_name,
            url: parameters.url.clone(),
            port: parameters.port,
            token: Zeroizing::new(parameters.token.clone()),
            tls_ca_bundle_path: staged.tls_ca_bundle_path.clone(),
            tls_cert_path: staged.tls_cert_path.clone(),
            tls_private_key_path: staged.tls_private_key_path.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.url, self.port)
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("instance_name", &self.instance_name)
            .field("url", &self.url)
            .field("port", &self.port)
            .field("token", &"[REDACTED]")
            .field("tls_ca_bundle_path", &self.tls_ca_bundle_path)
            .field("tls_cert_path", &self.tls_cert_path)
            .field("tls_private_key_path", &self.tls_private_key_path)
            .finish()
    }
}

#[async_trait]
pub trait MessagingConnector: Send + Sync {
    /// Opens the connection. Failures are [`AppError::ConnectionFailure`].
    async fn connect(
        &self,
        settings: ConnectionSettings,
    ) -> Result<Arc<dyn MessagingConnection>, AppError>;
}

#[async_trait]
pub trait MessagingConnection: Send + Sync {
    fn instance_name(&self) -> &str;

    /// Publishes `envelope` and returns the payload of the single reply.
    async fn request(&self, envelope: RequestEnvelope) -> Result<Bytes, AppError>;
}

/// Tracks whether an established link is still usable.
///
/// A link is lost on the first disconnect or close and stays lost, even if
/// the transport later reconnects on its own.
#[derive(Debug, Default)]
pub struct LinkState {
    lost: AtomicBool,
}

impl LinkState {
    pub fn observe(&self, event: &Event) {
        match event {
            Event::Disconnected | Event::Closed => {
                if !self.lost.swap(true, Ordering::SeqCst) {
                    tracing::error!("[ai2c] messaging connection lost: {}", event);
                }
            }
            _ => tracing::debug!("[ai2c] messaging event: {}", event),
        }
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    pub fn ensure_usable(&self, instance_name: &str) -> Result<(), AppError> {
        if self.is_lost() {
            return Err(AppError::ConnectionFailure(format!(
                "{} is disconnected, bootstrap again",
                instance_name
            )));
        }
        Ok(())
    }
}

/// NATS transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct NatsConnector;

#[async_trait]
impl MessagingConnector for NatsConnector {
    #[tracing::instrument(skip(self))]
    async fn connect(
        &self,
        settings: ConnectionSettings,
    ) -> Result<Arc<dyn MessagingConnection>, AppError> {
        let endpoint = settings.endpoint();
        tracing::info!("[ai2c] connecting to {} as {}", endpoint, settings.instance_name);

        let link = Arc::new(LinkState::default());
        let observer = link.clone();

        let client = ConnectOptions::new()
            .name(&settings.instance_name)
            .token(settings.token.to_string())
            .require_tls(true)
            .add_root_certificates(settings.tls_ca_bundle_path.clone())
            .add_client_certificate(
                settings.tls_cert_path.clone(),
                settings.tls_private_key_path.clone(),
            )
            .ping_interval(PING_INTERVAL)
            .max_reconnects(MAX_RECONNECTS)
            .event_callback(move |event| {
                let observer = observer.clone();
                async move { observer.observe(&event) }
            })
            .connect(endpoint.as_str())
            .await
            .map_err(|e| AppError::ConnectionFailure(format!("{}: {}", endpoint, e)))?;

        tracing::info!("[ai2c] connected to {}", endpoint);

        Ok(Arc::new(NatsConnection {
            client,
            instance_name: settings.instance_name.clone(),
            link,
        }))
    }
}

pub struct NatsConnection {
    client: async_nats::Client,
    instance_name: String,
    link: Arc<LinkState>,
}

#[async_trait]
impl MessagingConnection for NatsConnection {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[tracing::instrument(skip(self, envelope), fields(subject = %envelope.subject))]
    async fn request(&self, envelope: RequestEnvelope) -> Result<Bytes, AppError> {
        self.link.ensure_usable(&self.instance_name)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &envelope.headers {
            headers.insert(name.as_str(), value.as_str());
        }

        let reply = self
            .client
            .request_with_headers(envelope.subject.clone(), headers, envelope.body)
            .await
            .map_err(|e| match e.kind() {
                RequestErrorKind::TimedOut => AppError::Timeout(envelope.subject.clone()),
                _ => AppError::ConnectionFailure(format!("{}: {}", envelope.subject, e)),
            })?;

        Ok(reply.payload)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        let mut parameters = ParameterSet::default();
        parameters.token = "T".to_string();
        parameters.port = 4222;
        parameters.url = "nats://host".to_string();
        let staged = StagedMaterial {
            credentials_path: PathBuf::from("/tmp/x/nats-credentials.creds"),
            tls_ca_bundle_path: PathBuf::from("/tmp/x/tls-ca-bundle.crt"),
            tls_cert_path: PathBuf::from("/tmp/x/tls-cert.crt"),
            tls_private_key_path: PathBuf::from("/tmp/x/tls-private.key"),
        };
        ConnectionSettings::new("c1-1-2".to_string(), &parameters, &staged)
    }

    #[test]
    fn test_instance_name_derived_from_client_id() {
        let name = build_instance_name("identity-7").unwrap();
        assert!(name.starts_with("identity-7-"));

        let suffix: Vec<&str> = name["identity-7-".len()..].split('-').collect();
        assert_eq!(suffix.len(), 2);
        assert!(suffix.iter().all(|part| part.parse::<u128>().is_ok()));
    }

    #[test]
    fn test_instance_names_are_unique() {
        let first = build_instance_name("c1").unwrap();
        let second = build_instance_name("c1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_instance_name_requires_client_id() {
        assert_eq!(
            build_instance_name(""),
            Err(AppError::MissingField("clientId"))
        );
    }

    #[test]
    fn test_settings_endpoint_and_paths() {
        let settings = settings();
        assert_eq!(settings.endpoint(), "nats://host:4222");
        assert_eq!(settings.token.as_str(), "T");
        assert_eq!(
            settings.tls_private_key_path,
            PathBuf::from("/tmp/x/tls-private.key")
        );
    }

    #[test]
    fn test_settings_debug_redacts_token() {
        let mut settings = settings();
        settings.token = Zeroizing::new("super-secret-token".to_string());
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("nats://host"));
    }

    #[test]
    fn test_link_usable_until_disconnected() {
        let link = LinkState::default();
        link.observe(&Event::Connected);
        assert!(link.ensure_usable("c1-1-2").is_ok());

        link.observe(&Event::Disconnected);
        assert!(link.is_lost());
        assert!(matches!(
            link.ensure_usable("c1-1-2"),
            Err(AppError::ConnectionFailure(msg)) if msg.contains("c1-1-2")
        ));
    }

    #[test]
    fn test_link_stays_lost_after_reconnect() {
        let link = LinkState::default();
        link.observe(&Event::Disconnected);
        link.observe(&Event::Connected);
        assert!(link.is_lost());
    }

    #[test]
    fn test_link_lost_on_close() {
        let link = LinkState::default();
        link.observe(&Event::Closed);
        assert!(link.ensure_usable("c1-1-2").is_err());
    }

    #[test]
    fn test_link_ignores_slow_consumer() {
        let link = LinkState::default();
        link.observe(&Event::SlowConsumer(7));
        assert!(!link.is_lost());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings();
        settings.url = "nats://127.0.0.1".to_string();
        settings.port = 1;
        settings.tls_ca_bundle_path = dir.path().join("missing-ca.crt");
        settings.tls_cert_path = dir.path().join("missing-cert.crt");
        settings.tls_private_key_path = dir.path().join("missing.key");

        let result = NatsConnector.connect(settings).await;
        assert!(matches!(result, Err(AppError::ConnectionFailure(_))));
    }
}
