// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # AI2C Client
//!
//! Bootstraps a secure messaging session for an AI2 Connect client and
//! dispatches correlated requests over it.
//!
//! ## Architecture
//!
//! ```text
//! credentials -> validated bundle -> session -> parameters -> staged files
//!             -> messaging connection -> Ai2CClient -> request/reply
//!                        |
//!                        +-> Cognito (SRP login, identity pool credentials)
//!                        +-> SSM Parameter Store (messaging and TLS settings)
//!                        +-> NATS over mutual TLS
//! ```
//!
//! ## Modules
//!
//! - [`client`]: bootstrap pipeline and the ready [`client::Ai2CClient`]
//! - [`cognito`]: Cognito-backed identity provider
//! - [`configuration`]: CLI argument parsing with clap, config file loading
//! - [`constants`]: Configuration constants for the application
//! - [`credentials`]: credential resolution and validation
//! - [`dispatch`]: request routing and reply handling
//! - [`errors`]: Application error types
//! - [`identity`]: authenticator and session seams
//! - [`messaging`]: instance naming, connection establishment, NATS transport
//! - [`models`]: credential, parameter and request types
//! - [`parameters`]: batched remote parameter retrieval
//! - [`srp`]: SRP-6a client computations
//! - [`staging`]: writes credential and TLS material to disk
//!
//! ## Usage
//!
//! ```bash
//! ai2c-client --config ./ai2c-client-config.json \
//!     --region us-east-1 --user-pool-id us-east-1_AbC --app-client-id 123 \
//!     --identity-pool-id us-east-1:0000 --request ./payment.json
//! ```
//!
//! ## Security Considerations
//!
//! - The password is wiped as soon as authentication returns
//! - The secret key is wiped once the messaging connection is open
//! - Fetched parameters are zeroized on drop
//! - Staged files are owner read/write only
//! - Types holding secrets redact them in `Debug` output

pub mod client;
pub mod cognito;
pub mod configuration;
pub mod constants;
pub mod credentials;
pub mod dispatch;
pub mod errors;
pub mod identity;
pub mod messaging;
pub mod models;
pub mod parameters;
pub mod srp;
pub mod staging;
