//! Signed license tokens.
//!
//! A token is a JWT handed to the desktop application alongside the opaque
//! key. It carries the holder, the allotment and a hard `exp` at the
//! license's calendar end, so the client can check it offline. The server
//! stays the authority on consumed time and revocation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use licensehub_core::config::{TokenAlgorithm, TokenConfig};
use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;
use licensehub_entity::license::{License, LicenseKind};

use super::error::LicenseError;

/// Claims embedded in a license token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClaims {
    /// Holder e-mail.
    pub sub: String,
    /// License key.
    pub key: String,
    /// Purchase, trial or admin grant.
    pub kind: LicenseKind,
    /// Allotment in seconds.
    pub allotted_seconds: i64,
    /// Allotment in whole hours, rounded up.
    pub usage_hours: i64,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Calendar end (seconds since epoch).
    pub exp: i64,
}

impl LicenseClaims {
    /// Claims for `license`. Fails when the license has no representable
    /// calendar end.
    pub fn for_license(license: &License) -> Result<Self, LicenseError> {
        let exp = license.expires_at().ok_or(LicenseError::InvalidDuration)?;
        Ok(Self {
            sub: license.email.clone(),
            key: license.key.clone(),
            kind: license.kind,
            allotted_seconds: license.allotted_seconds,
            usage_hours: license.allotted_seconds.div_euclid(3600)
                + i64::from(license.allotted_seconds.rem_euclid(3600) > 0),
            iat: license.issued_at.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

/// Signs and verifies license tokens.
#[derive(Clone)]
pub struct LicenseTokenSigner {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
}

impl std::fmt::Debug for LicenseTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseTokenSigner")
            .field("algorithm", &self.header.alg)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl LicenseTokenSigner {
    /// Build a signer from configuration. `None` when no keys are set.
    pub fn from_config(config: &TokenConfig) -> AppResult<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }

        let signer = match config.algorithm {
            TokenAlgorithm::Hs256 => Self::hs256(config.secret.as_bytes(), config.leeway_seconds),
            TokenAlgorithm::Rs256 => {
                let private_pem = std::fs::read(&config.private_key_path).map_err(|e| {
                    AppError::configuration(format!(
                        "Failed to read token private key '{}': {e}",
                        config.private_key_path
                    ))
                })?;
                let public_pem = std::fs::read(&config.public_key_path).map_err(|e| {
                    AppError::configuration(format!(
                        "Failed to read token public key '{}': {e}",
                        config.public_key_path
                    ))
                })?;
                let encoding_key = EncodingKey::from_rsa_pem(&private_pem).map_err(|e| {
                    AppError::configuration(format!("Invalid token private key: {e}"))
                })?;
                let decoding_key = DecodingKey::from_rsa_pem(&public_pem).map_err(|e| {
                    AppError::configuration(format!("Invalid token public key: {e}"))
                })?;
                Self::with_keys(
                    Algorithm::RS256,
                    encoding_key,
                    decoding_key,
                    config.leeway_seconds,
                )
            }
        };
        Ok(Some(signer))
    }

    /// HMAC-SHA256 signer with a shared secret.
    pub fn hs256(secret: &[u8], leeway_seconds: i64) -> Self {
        Self::with_keys(
            Algorithm::HS256,
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
            leeway_seconds,
        )
    }

    fn with_keys(
        algorithm: Algorithm,
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        leeway_seconds: i64,
    ) -> Self {
        // `exp` is checked against the injected clock in `verify`.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;

        Self {
            header: Header::new(algorithm),
            encoding_key,
            decoding_key,
            validation,
            leeway_seconds: leeway_seconds.max(0),
        }
    }

    /// Sign a token for `license`.
    pub fn sign(&self, license: &License) -> Result<String, LicenseError> {
        let claims = LicenseClaims::for_license(license)?;
        encode(&self.header, &claims, &self.encoding_key).map_err(|e| {
            LicenseError::Store(AppError::internal(format!(
                "Failed to encode license token: {e}"
            )))
        })
    }

    /// Check signature and expiry at `now` and return the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<LicenseClaims, LicenseError> {
        let data = decode::<LicenseClaims>(token.trim(), &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "License token rejected");
                LicenseError::InvalidToken
            })?;

        let claims = data.claims;
        if now.timestamp() >= claims.exp.saturating_add(self.leeway_seconds) {
            return Err(LicenseError::TokenExpired);
        }
        Ok(claims)
    }
}
