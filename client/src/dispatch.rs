// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Request dispatch over an established messaging connection.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::constants::{FN_KEY, HEADER_CLIENT_ID, REQUEST_TIMEOUT, SUB_STRIPE_CREATE_PAYMENT_INTENT};
use crate::errors::AppError;
use crate::messaging::MessagingConnection;
use crate::models::{Ai2CInfo, PaymentIntentRequest, RequestEnvelope};

/// Routes `info` to the matching request.
///
/// Returns `Ok(None)` when nothing was dispatched. Only payment-intent
/// creation (`amount > 0`) is routed today.
#[tracing::instrument(skip(connection, info))]
pub async fn dispatch(
    connection: &dyn MessagingConnection,
    client_id: &str,
    info: &Ai2CInfo,
) -> Result<Option<Bytes>, AppError> {
    if info.key.is_empty() {
        return Err(AppError::MissingField(FN_KEY));
    }

    if info.amount > 0.0 {
        return create_payment_intent(connection, client_id, info).await.map(Some);
    }

    tracing::debug!("[ai2c] no request matches, nothing dispatched");
    Ok(None)
}

async fn create_payment_intent(
    connection: &dyn MessagingConnection,
    client_id: &str,
    info: &Ai2CInfo,
) -> Result<Bytes, AppError> {
    let body = serde_json::to_vec(&PaymentIntentRequest::from(info))
        .map_err(|e| AppError::SerializationFailure(e.to_string()))?;

    let envelope = build_envelope(SUB_STRIPE_CREATE_PAYMENT_INTENT, client_id, body);
    send(connection, envelope).await
}

pub fn build_envelope(subject: &str, client_id: &str, body: Vec<u8>) -> RequestEnvelope {
    RequestEnvelope {
        subject: subject.to_string(),
        headers: BTreeMap::from([(HEADER_CLIENT_ID.to_string(), client_id.to_string())]),
        body: Bytes::from(body),
        timeout: REQUEST_TIMEOUT,
    }
}

/// Publishes `envelope` and waits at most `envelope.timeout` for the reply.
async fn send(
    connection: &dyn MessagingConnection,
    envelope: RequestEnvelope,
) -> Result<Bytes, AppError> {
    let subject = envelope.subject.clone();
    let timeout = envelope.timeout;

    tracing::info!("[ai2c] requesting {}", subject);

    let reply = tokio::time::timeout(timeout, connection.request(envelope))
        .await
        .map_err(|_| AppError::Timeout(format!("no reply on {} within {:?}", subject, timeout)))??;

    tracing::info!("[ai2c] reply on {} ({} bytes)", subject, reply.len());

    Ok(reply)
}
