//! Signed license token configuration.

use serde::{Deserialize, Serialize};

/// JWT signing algorithm for license tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenAlgorithm {
    /// HMAC-SHA256 with a shared secret.
    Hs256,
    /// RSA-SHA256 with a PEM key pair; clients only need the public key.
    Rs256,
}

/// License token settings. Tokens are only issued when the keys for the
/// chosen algorithm are configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Signing algorithm.
    #[serde(default = "default_algorithm")]
    pub algorithm: TokenAlgorithm,
    /// Shared secret for `HS256`.
    #[serde(default)]
    pub secret: String,
    /// PEM private key file for `RS256`.
    #[serde(default)]
    pub private_key_path: String,
    /// PEM public key file for `RS256`.
    #[serde(default)]
    pub public_key_path: String,
    /// Clock leeway when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: i64,
}

impl TokenConfig {
    /// Whether the configured algorithm has its keys.
    pub fn is_enabled(&self) -> bool {
        match self.algorithm {
            TokenAlgorithm::Hs256 => !self.secret.is_empty(),
            TokenAlgorithm::Rs256 => {
                !self.private_key_path.is_empty() && !self.public_key_path.is_empty()
            }
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            secret: String::new(),
            private_key_path: String::new(),
            public_key_path: String::new(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_algorithm() -> TokenAlgorithm {
    TokenAlgorithm::Hs256
}

fn default_leeway() -> i64 {
    60
}
