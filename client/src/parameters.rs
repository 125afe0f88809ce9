// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Remote parameter retrieval.
//!
//! The six messaging/TLS parameters live under
//! `/{PARAMETER_PREFIX}/{environment}/{name}` and are fetched in one batched
//! call. The response is unordered, so values are matched by their fully
//! qualified name.

use std::collections::HashMap;

use crate::constants::{
    PARAMETER_NATS_PORT, PARAMETER_NATS_TOKEN, PARAMETER_NATS_URL, PARAMETER_PREFIX,
    PARAMETER_TLS_CA_BUNDLE, PARAMETER_TLS_CERT, PARAMETER_TLS_PRIVATE_KEY,
};
use crate::errors::AppError;
use crate::identity::SessionHandle;
use crate::models::ParameterSet;

/// Logical names, in the order they are requested.
pub const PARAMETER_NAMES: [&str; 6] = [
    PARAMETER_NATS_TOKEN,
    PARAMETER_NATS_PORT,
    PARAMETER_NATS_URL,
    PARAMETER_TLS_CERT,
    PARAMETER_TLS_PRIVATE_KEY,
    PARAMETER_TLS_CA_BUNDLE,
];

pub fn parameter_name(environment: &str, name: &str) -> String {
    format!("/{}/{}/{}", PARAMETER_PREFIX, environment, name)
}

/// Fetches and assembles the [`ParameterSet`] for `environment`.
///
/// A non-numeric port becomes 0. Names the request did not ask for are
/// ignored. Any of the six missing from the response is an error.
#[tracing::instrument(skip(session))]
pub async fn fetch_parameters(
    session: &dyn SessionHandle,
    environment: &str,
) -> Result<ParameterSet, AppError> {
    let names: Vec<String> = PARAMETER_NAMES
        .iter()
        .map(|name| parameter_name(environment, name))
        .collect();

    let returned = session.get_parameters(&names).await?;

    tracing::debug!("[ai2c] parameter store returned {} values", returned.len());

    let mut values: HashMap<String, String> = returned
        .into_iter()
        .map(|parameter| (parameter.name, parameter.value))
        .collect();

    let mut take = |name: &str| {
        values
            .remove(&parameter_name(environment, name))
            .ok_or_else(|| AppError::ParameterFetchFailure(format!("{} was not returned", name)))
    };

    let mut parameters = ParameterSet::default();
    parameters.token = take(PARAMETER_NATS_TOKEN)?;
    parameters.port = parse_port(&take(PARAMETER_NATS_PORT)?);
    parameters.url = take(PARAMETER_NATS_URL)?;
    parameters.tls_cert = take(PARAMETER_TLS_CERT)?;
    parameters.tls_private_key = take(PARAMETER_TLS_PRIVATE_KEY)?;
    parameters.tls_ca_bundle = take(PARAMETER_TLS_CA_BUNDLE)?;

    if !values.is_empty() {
        tracing::debug!("[ai2c] ignoring {} unrequested parameters", values.len());
    }

    if parameters.port == 0 {
        tracing::warn!("[ai2c] {} is not a valid port, using 0", PARAMETER_NATS_PORT);
    }

    Ok(parameters)
}

/// Parses the messaging port; anything that is not a valid port is 0.
pub fn parse_port(value: &str) -> u16 {
    value.trim().parse().unwrap_or(0)
}
