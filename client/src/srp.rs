// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Client side of the SRP-6a exchange used by Cognito user pools.
//!
//! The group is the 3072-bit prime from RFC 5054 with generator 2. Values
//! travel as hex strings; before hashing, a hex value is padded so that it
//! decodes to a positive big-endian integer (see [`pad_hex`]).
//!
//! # Flow
//!
//! 1. [`SrpClient::new`] draws the private ephemeral `a` and computes `A`.
//! 2. `A` is sent as `SRP_A` with `InitiateAuth`.
//! 3. The `PASSWORD_VERIFIER` challenge returns `SALT`, `SRP_B`,
//!    `SECRET_BLOCK` and `USER_ID_FOR_SRP`.
//! 4. [`SrpClient::password_claim`] derives the shared key and signs the
//!    secret block with it.

use base64::{Engine as _, prelude::BASE64_STANDARD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::constants::{SRP_DERIVED_KEY_INFO, SRP_EPHEMERAL_BYTES, SRP_TIMESTAMP_FORMAT};
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

const N_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64",
    "ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6B",
    "F12FFA06D98A0864D87602733EC86A64521F2B18177B200C",
    "BBE117577A615D6C770988C0BAD946E208E24FA074E5AB31",
    "43DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);
const G_HEX: &str = "2";

/// Response values for the `PASSWORD_VERIFIER` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordClaim {
    pub secret_block: String,
    pub signature: String,
    pub timestamp: String,
}

pub struct SrpClient {
    n: BigUint,
    g: BigUint,
    k: BigUint,
    small_a: BigUint,
    large_a: BigUint,
    pool_name: String,
}

impl SrpClient {
    /// Creates a client for the user pool whose id ends in `pool_name`.
    pub fn new(pool_name: &str) -> Result<Self, AppError> {
        let mut ephemeral = Zeroizing::new([0u8; SRP_EPHEMERAL_BYTES]);
        OsRng.fill_bytes(&mut ephemeral[..]);
        Self::with_ephemeral(pool_name, &ephemeral[..])
    }

    fn with_ephemeral(pool_name: &str, ephemeral: &[u8]) -> Result<Self, AppError> {
        let n = hex_to_big(N_HEX)?;
        let g = hex_to_big(G_HEX)?;
        let k = hex_to_big(&hex_hash(&format!("00{}0{}", N_HEX, G_HEX))?)?;

        let small_a = BigUint::from_bytes_be(ephemeral) % &n;
        let large_a = g.modpow(&small_a, &n);
        if large_a.bits() == 0 {
            return Err(srp_error("ephemeral value is degenerate"));
        }

        Ok(Self {
            n,
            g,
            k,
            small_a,
            large_a,
            pool_name: pool_name.to_string(),
        })
    }

    /// The public ephemeral `A`, as sent in `SRP_A`.
    pub fn srp_a(&self) -> String {
        self.large_a.to_str_radix(16)
    }

    /// Answers a `PASSWORD_VERIFIER` challenge.
    ///
    /// `timestamp` must use [`SRP_TIMESTAMP_FORMAT`]; see [`timestamp_now`].
    pub fn password_claim(
        &self,
        user_id: &str,
        password: &str,
        salt_hex: &str,
        srp_b_hex: &str,
        secret_block: &str,
        timestamp: &str,
    ) -> Result<PasswordClaim, AppError> {
        let large_b = hex_to_big(srp_b_hex)?;
        if (&large_b % &self.n).bits() == 0 {
            return Err(srp_error("server public value is degenerate"));
        }

        let key = self.password_authentication_key(user_id, password, &large_b, salt_hex)?;
        let secret_block_bytes = BASE64_STANDARD
            .decode(secret_block)
            .map_err(|e| srp_error(&format!("secret block is not base64: {}", e)))?;

        let mut mac = HmacSha256::new_from_slice(&key[..])
            .map_err(|e| srp_error(&format!("invalid derived key: {}", e)))?;
        mac.update(self.pool_name.as_bytes());
        mac.update(user_id.as_bytes());
        mac.update(&secret_block_bytes);
        mac.update(timestamp.as_bytes());

        Ok(PasswordClaim {
            secret_block: secret_block.to_string(),
            signature: BASE64_STANDARD.encode(mac.finalize().into_bytes()),
            timestamp: timestamp.to_string(),
        })
    }

    fn password_authentication_key(
        &self,
        user_id: &str,
        password: &str,
        large_b: &BigUint,
        salt_hex: &str,
    ) -> Result<Zeroizing<Vec<u8>>, AppError> {
        let u = compute_u(&self.large_a, large_b)?;
        if u.bits() == 0 {
            return Err(srp_error("scrambling parameter is zero"));
        }

        let x = compute_x(&self.pool_name, user_id, password, salt_hex)?;
        let g_x = self.g.modpow(&x, &self.n);
        let k_g_x = (&self.k * g_x) % &self.n;
        let base = ((large_b % &self.n) + &self.n - k_g_x) % &self.n;
        let exponent = &self.small_a + &u * &x;
        let s = base.modpow(&exponent, &self.n);

        compute_hkdf(&s, &u)
    }
}

pub fn timestamp_now() -> String {
    Utc::now().format(SRP_TIMESTAMP_FORMAT).to_string()
}

/// Pads a hex string so it decodes to whole bytes with a clear sign bit.
pub fn pad_hex(hex: &str) -> String {
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else if hex.starts_with(|c: char| "89abcdefABCDEF".contains(c)) {
        format!("00{}", hex)
    } else {
        hex.to_string()
    }
}

fn pad_big(value: &BigUint) -> String {
    pad_hex(&value.to_str_radix(16))
}

fn hex_to_big(hex: &str) -> Result<BigUint, AppError> {
    BigUint::parse_bytes(hex.as_bytes(), 16).ok_or_else(|| srp_error("value is not hex"))
}

fn hex_decode(hex: &str) -> Result<Vec<u8>, AppError> {
    hex::decode(hex).map_err(|e| srp_error(&format!("value is not hex: {}", e)))
}

fn hex_hash(hex: &str) -> Result<String, AppError> {
    Ok(hex::encode(Sha256::digest(hex_decode(hex)?)))
}

fn compute_u(large_a: &BigUint, large_b: &BigUint) -> Result<BigUint, AppError> {
    hex_to_big(&hex_hash(&format!("{}{}", pad_big(large_a), pad_big(large_b)))?)
}

fn compute_x(
    pool_name: &str,
    user_id: &str,
    password: &str,
    salt_hex: &str,
) -> Result<BigUint, AppError> {
    let identity = Zeroizing::new(format!("{}{}:{}", pool_name, user_id, password));
    let identity_hash = Zeroizing::new(hex::encode(Sha256::digest(identity.as_bytes())));
    hex_to_big(&hex_hash(&format!("{}{}", pad_hex(salt_hex), identity_hash.as_str()))?)
}

fn compute_hkdf(s: &BigUint, u: &BigUint) -> Result<Zeroizing<Vec<u8>>, AppError> {
    let ikm = Zeroizing::new(hex_decode(&pad_big(s))?);
    let salt = hex_decode(&pad_big(u))?;

    let mut extract = HmacSha256::new_from_slice(&salt)
        .map_err(|e| srp_error(&format!("invalid hkdf salt: {}", e)))?;
    extract.update(&ikm);
    let prk = Zeroizing::new(extract.finalize().into_bytes().to_vec());

    let mut expand = HmacSha256::new_from_slice(&prk)
        .map_err(|e| srp_error(&format!("invalid hkdf key: {}", e)))?;
    expand.update(SRP_DERIVED_KEY_INFO);
    expand.update(&[1u8]);
    let okm = expand.finalize().into_bytes();

    Ok(Zeroizing::new(okm[..16].to_vec()))
}

fn srp_error(message: &str) -> AppError {
    AppError::AuthFailure(format!("srp: {}", message))
}
