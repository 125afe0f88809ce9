// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroizing, ZeroizeOnDrop};

/// Canonical credential set produced by the resolver.
///
/// The password is an `Option` so it can be taken out and wiped right after
/// authentication while the rest of the bundle lives on until the connection
/// is up.
pub struct CredentialBundle {
    pub client_id: String,
    pub environment: String,
    pub username: String,
    pub password: Option<Zeroizing<String>>,
    pub secret_key: Zeroizing<String>,
    pub temp_directory: String,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("client_id", &self.client_id)
            .field("environment", &self.environment)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("temp_directory", &self.temp_directory)
            .finish()
    }
}

/// Messaging and TLS settings fetched from the parameter store.
#[derive(Clone, Default, PartialEq, ZeroizeOnDrop)]
pub struct ParameterSet {
    pub token: String,
    pub port: u16,
    pub url: String,
    pub tls_cert: String,
    pub tls_private_key: String,
    pub tls_ca_bundle: String,
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("token", &"[REDACTED]")
            .field("port", &self.port)
            .field("url", &self.url)
            .field("tls_cert", &"[REDACTED]")
            .field("tls_private_key", &"[REDACTED]")
            .field("tls_ca_bundle", &"[REDACTED]")
            .finish()
    }
}

/// Fully-qualified paths of the files written by the stager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedMaterial {
    pub credentials_path: PathBuf,
    pub tls_ca_bundle_path: PathBuf,
    pub tls_cert_path: PathBuf,
    pub tls_private_key_path: PathBuf,
}

/// Caller input to [`crate::client::Ai2CClient::ai2_request`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ai2CInfo {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub automatic_payment_methods: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cancellation_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub capture_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub limit: i64,
    #[serde(default, rename = "id", skip_serializing_if = "String::is_empty")]
    pub payment_intent_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receipt_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub starting_after: String,
}

/// Body of the payment-intent creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub automatic_payment_methods: bool,
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub key: String,
    pub receipt_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_url: String,
}

impl From<&Ai2CInfo> for PaymentIntentRequest {
    fn from(info: &Ai2CInfo) -> Self {
        Self {
            amount: info.amount,
            automatic_payment_methods: info.automatic_payment_methods,
            currency: info.currency.clone(),
            description: info.description.clone(),
            // the caller's key is deliberately not forwarded
            key: String::new(),
            receipt_email: info.receipt_email.clone(),
            return_url: info.return_url.clone(),
        }
    }
}

/// One correlated request, built per call and discarded after the reply.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub subject: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub timeout: Duration,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}
