// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Identity provider boundary.
//!
//! An [`IdentityAuthenticator`] turns a username and password into a
//! [`SessionHandle`]. The session is owned by the client and lent to the
//! parameter fetcher for the one batched lookup it performs.

use async_trait::async_trait;

use crate::errors::AppError;

/// One name/value pair returned by a batched parameter lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait IdentityAuthenticator: Send + Sync {
    /// Authenticates `username` in `environment`.
    ///
    /// The password is only borrowed; implementations must not retain it.
    /// Failures are reported as [`AppError::AuthFailure`].
    async fn authenticate(
        &self,
        environment: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn SessionHandle>, AppError>;
}

/// An authenticated session.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Identifier of the authenticated principal, used to name the
    /// messaging connection.
    fn client_id(&self) -> &str;

    /// Fetches all `names` in one call. The response is unordered and may
    /// contain names that were not asked for.
    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>, AppError>;
}
