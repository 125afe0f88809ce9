// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::Path;
use std::process::ExitCode;

use ai2c_client::client::{Ai2CClient, Bootstrapper};
use ai2c_client::cognito::CognitoAuthenticator;
use ai2c_client::configuration::{
    ClientOptions, CognitoSettings, JsonFileLoader, generate_config_skeleton,
};
use ai2c_client::credentials;
use ai2c_client::errors::AppError;
use ai2c_client::messaging::NatsConnector;
use ai2c_client::models::{Ai2CInfo, CredentialBundle};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    println!("[ai2c] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    let options = ClientOptions::parse();

    tracing::info!("[ai2c] {:?}", &options);

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("[ai2c] {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mut options: ClientOptions) -> Result<(), AppError> {
    if let Some(directory) = &options.gen_config {
        generate_config_skeleton(directory)?;
        return Ok(());
    }

    let (bundle, settings) = prepare(&mut options)?;

    let bootstrapper = Bootstrapper::new(
        Box::new(JsonFileLoader),
        Box::new(CognitoAuthenticator::new(settings)),
        Box::new(NatsConnector),
    )
    .with_stage_timeout(options.stage_timeout());

    let client = bootstrapper.run_bundle(bundle).await?;

    if let Some(path) = &options.request {
        send_request(&client, path).await?;
    }

    Ok(())
}

/// Credential problems are reported before identity provider settings are
/// checked.
fn prepare(options: &mut ClientOptions) -> Result<(CredentialBundle, CognitoSettings), AppError> {
    let bundle = credentials::resolve(options.take_credential_source(), &JsonFileLoader)?;
    credentials::validate(&bundle)?;
    let settings = options.cognito_settings()?;
    Ok((bundle, settings))
}

async fn send_request(client: &Ai2CClient, path: &Path) -> Result<(), AppError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let info: Ai2CInfo = serde_json::from_str(&contents)
        .map_err(|e| AppError::SerializationFailure(format!("{}: {}", path.display(), e)))?;

    match client.ai2_request(&info).await? {
        Some(reply) => println!("{}", String::from_utf8_lossy(&reply)),
        None => tracing::info!("[ai2c] nothing to dispatch for {}", path.display()),
    }

    Ok(())
}
