// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Writes the messaging credential and TLS material to the temp directory.
//!
//! Files are always created fresh, owner-read/write only. Log lines carry paths and sizes,
//! never file content.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::constants::{
    CREDENTIAL_FILENAME, STAGED_FILE_MODE, TLS_CA_BUNDLE_FILENAME, TLS_CERT_FILENAME,
    TLS_PRIVATE_KEY_FILENAME,
};
use crate::errors::AppError;
use crate::models::{ParameterSet, StagedMaterial};

#[tracing::instrument(skip(parameters))]
pub async fn stage_material(
    temp_directory: &Path,
    parameters: &ParameterSet,
) -> Result<StagedMaterial, AppError> {
    fs::create_dir_all(temp_directory)
        .await
        .map_err(|e| staging_error(temp_directory, e))?;

    let staged = StagedMaterial {
        credentials_path: temp_directory.join(CREDENTIAL_FILENAME),
        tls_ca_bundle_path: temp_directory.join(TLS_CA_BUNDLE_FILENAME),
        tls_cert_path: temp_directory.join(TLS_CERT_FILENAME),
        tls_private_key_path: temp_directory.join(TLS_PRIVATE_KEY_FILENAME),
    };

    write_secret_file(&staged.credentials_path, &parameters.token).await?;
    write_secret_file(&staged.tls_ca_bundle_path, &parameters.tls_ca_bundle).await?;
    write_secret_file(&staged.tls_cert_path, &parameters.tls_cert).await?;
    write_secret_file(&staged.tls_private_key_path, &parameters.tls_private_key).await?;

    tracing::info!("[ai2c] staged messaging material in {}", temp_directory.display());

    Ok(staged)
}

async fn write_secret_file(path: &Path, contents: &str) -> Result<(), AppError> {
    // open() keeps the mode of an existing file, so start from a fresh one
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!("[ai2c] replacing {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(staging_error(path, e)),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(STAGED_FILE_MODE);

    let mut file = options.open(path).await.map_err(|e| staging_error(path, e))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| staging_error(path, e))?;
    file.flush().await.map_err(|e| staging_error(path, e))?;

    tracing::debug!("[ai2c] wrote {} ({} bytes)", path.display(), contents.len());

    Ok(())
}

fn staging_error(path: &Path, source: std::io::Error) -> AppError {
    tracing::error!("[ai2c] unable to stage {}: {:?}", path.display(), source.kind());
    AppError::IoFailure(format!("{}: {}", path.display(), source))
}

pub fn staged_paths(staged: &StagedMaterial) -> [&PathBuf; 4] {
    [
        &staged.credentials_path,
        &staged.tls_ca_bundle_path,
        &staged.tls_cert_path,
        &staged.tls_private_key_path,
    ]
}
