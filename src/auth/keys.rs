use std::fmt;
use std::fs;
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::config::{ConfigError, JwtConfig};

/// The signing/verification key pair, loaded once at startup.
///
/// Owned by the token codec; nothing else gets to see the private half.
#[derive(Clone)]
pub struct JwtKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone, Copy)]
enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

fn family(algorithm: Algorithm) -> Result<KeyFamily, ConfigError> {
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Ok(KeyFamily::Rsa),
        Algorithm::ES256 | Algorithm::ES384 => Ok(KeyFamily::Ec),
        Algorithm::EdDSA => Ok(KeyFamily::Ed),
        other => Err(ConfigError::UnsupportedAlgorithm(format!("{:?}", other))),
    }
}

impl JwtKeys {
    pub fn from_pem(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, ConfigError> {
        let malformed = |kind: &'static str| {
            move |e: jsonwebtoken::errors::Error| ConfigError::MalformedKey {
                kind,
                reason: e.to_string(),
            }
        };

        let (encoding, decoding) = match family(algorithm)? {
            KeyFamily::Rsa => (
                EncodingKey::from_rsa_pem(private_pem).map_err(malformed("private"))?,
                DecodingKey::from_rsa_pem(public_pem).map_err(malformed("public"))?,
            ),
            KeyFamily::Ec => (
                EncodingKey::from_ec_pem(private_pem).map_err(malformed("private"))?,
                DecodingKey::from_ec_pem(public_pem).map_err(malformed("public"))?,
            ),
            KeyFamily::Ed => (
                EncodingKey::from_ed_pem(private_pem).map_err(malformed("private"))?,
                DecodingKey::from_ed_pem(public_pem).map_err(malformed("public"))?,
            ),
        };

        Ok(Self {
            algorithm,
            encoding,
            decoding,
        })
    }

    pub fn from_files(
        algorithm: Algorithm,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<Self, ConfigError> {
        let read = |path: &Path| {
            fs::read(path).map_err(|source| ConfigError::KeyFile {
                path: path.to_path_buf(),
                source,
            })
        };
        let private_pem = read(private_key_path)?;
        let public_pem = read(public_key_path)?;
        Self::from_pem(algorithm, &private_pem, &public_pem)
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, ConfigError> {
        Self::from_files(
            config.algorithm,
            &config.private_key_path,
            &config.public_key_path,
        )
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_keys {
    pub const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/private_key.pem");
    pub const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/public_key.pem");
    pub const OTHER_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/other_public_key.pem");
}
