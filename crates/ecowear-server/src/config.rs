//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5001`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.
    /// Env: `DATABASE_PATH`
    /// Default: `./ecowear.db`
    pub database_path: PathBuf,

    /// Ed25519 seed for the token signing key (hex-encoded, 64 chars).
    /// Env: `ECOWEAR_SIGNING_KEY`
    /// Default: none; a fresh key is generated at startup, so issued tokens
    /// do not survive a restart.
    pub signing_key_seed: Option<[u8; 32]>,

    /// Lifetime of issued bearer tokens, in hours.
    /// Env: `TOKEN_TTL_HOURS`
    /// Default: `24`
    pub token_ttl_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5001).into(),
            database_path: PathBuf::from("./ecowear.db"),
            signing_key_seed: None,
            token_ttl_hours: 24,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(hex_seed) = std::env::var("ECOWEAR_SIGNING_KEY") {
            match parse_hex_seed(&hex_seed) {
                Ok(seed) => config.signing_key_seed = Some(seed),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid ECOWEAR_SIGNING_KEY, generating an ephemeral key"
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("TOKEN_TTL_HOURS") {
            if let Ok(hours) = val.parse::<i64>() {
                config.token_ttl_hours = hours;
            } else {
                tracing::warn!(value = %val, "Invalid TOKEN_TTL_HOURS, using default");
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse a 64-character hex string into a 32-byte seed.
fn parse_hex_seed(hex_str: &str) -> Result<[u8; 32], String> {
    let hex_str = hex_str.trim();
    if hex_str.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", hex_str.len()));
    }

    let bytes = hex::decode(hex_str).map_err(|e| e.to_string())?;
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes);
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5001).into());
        assert_eq!(config.database_path, PathBuf::from("./ecowear.db"));
        assert!(config.signing_key_seed.is_none());
        assert_eq!(config.token_ttl_hours, 24);
    }

    #[test]
    fn test_parse_hex_seed() {
        let hex_str = "ab".repeat(32);
        let seed = parse_hex_seed(&hex_str).unwrap();
        assert_eq!(seed, [0xab; 32]);
    }

    #[test]
    fn test_parse_hex_seed_wrong_length() {
        assert!(parse_hex_seed("abcd").is_err());
    }

    #[test]
    fn test_parse_hex_seed_bad_digit() {
        assert!(parse_hex_seed(&"zz".repeat(32)).is_err());
    }
}
