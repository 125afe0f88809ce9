// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const PROGRAM_NAME: &str = "ai2c-client";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const ENVIRONMENTS: [&str; 3] = ["local", "development", "production"];
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

// Field names, as they appear in config files and error messages
pub const FN_CLIENT_ID: &str = "clientId";
pub const FN_ENVIRONMENT: &str = "environment";
pub const FN_PASSWORD: &str = "password";
pub const FN_SECRET_KEY: &str = "secretKey";
pub const FN_TEMP_DIRECTORY: &str = "tempDirectory";
pub const FN_USERNAME: &str = "username";
pub const FN_KEY: &str = "key";

/// Replaces the password in a loaded config bundle once it has been extracted.
pub const TXT_PROTECTED: &str = "[PROTECTED]";
pub const CONFIG_SKELETON_FILENAME: &str = "ai2c-client-config.json";

// Remote parameters: /{prefix}/{environment}/{name}
pub const PARAMETER_PREFIX: &str = "ai2c";
pub const PARAMETER_NATS_TOKEN: &str = "nats-token";
pub const PARAMETER_NATS_PORT: &str = "nats-port";
pub const PARAMETER_NATS_URL: &str = "nats-url";
pub const PARAMETER_TLS_CERT: &str = "tls-cert";
pub const PARAMETER_TLS_PRIVATE_KEY: &str = "tls-private-key";
pub const PARAMETER_TLS_CA_BUNDLE: &str = "tls-ca-bundle";

// Staged material, written under the temp directory
pub const CREDENTIAL_FILENAME: &str = "nats-credentials.creds";
pub const TLS_CA_BUNDLE_FILENAME: &str = "tls-ca-bundle.crt";
pub const TLS_CERT_FILENAME: &str = "tls-cert.crt";
pub const TLS_PRIVATE_KEY_FILENAME: &str = "tls-private.key";
pub const STAGED_FILE_MODE: u32 = 0o600;

// Messaging
pub const SUB_STRIPE_CREATE_PAYMENT_INTENT: &str = "stripe.create.payment.intent";
pub const HEADER_CLIENT_ID: &str = "clientId";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const PING_INTERVAL: Duration = Duration::from_secs(120);
/// 0 means unlimited to the transport, so the cap is one attempt; the link
/// is treated as lost on the first disconnect regardless.
pub const MAX_RECONNECTS: usize = 1;

// Cognito SRP
pub const SRP_DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";
pub const SRP_TIMESTAMP_FORMAT: &str = "%a %b %-d %H:%M:%S UTC %Y";
pub const SRP_EPHEMERAL_BYTES: usize = 128;
