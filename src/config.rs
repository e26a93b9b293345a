use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ratings: RatingsConfig,
    pub pagination: PaginationConfig,
    pub ids: IdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingsConfig {
    pub missing_listing: MissingListingPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdConfig {
    pub node_id: u16,
}

/// What a recompute does when the listing it was asked about no longer exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingListingPolicy {
    /// Silent no-op.
    #[default]
    Ignore,
    /// Surface `AppError::NotFound` to the caller.
    Reject,
}

impl FromStr for MissingListingPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::ConfigurationError(format!(
                "MISSING_LISTING_POLICY must be 'ignore' or 'reject', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MissingListingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing_listing = match lookup("MISSING_LISTING_POLICY") {
            Some(raw) => raw.parse()?,
            None => MissingListingPolicy::default(),
        };

        let node_id = lookup("NODE_ID")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(0);
        if node_id >= 1024 {
            return Err(AppError::ConfigurationError(format!(
                "NODE_ID must be less than 1024, got {}",
                node_id
            )));
        }

        let default_limit = lookup("PAGE_SIZE_DEFAULT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let max_limit = lookup("PAGE_SIZE_MAX")
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);
        if default_limit == 0 || default_limit > max_limit {
            return Err(AppError::ConfigurationError(format!(
                "PAGE_SIZE_DEFAULT ({}) must be between 1 and PAGE_SIZE_MAX ({})",
                default_limit, max_limit
            )));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:data/condo_reviews.db".to_string()),
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            },
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("SERVER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
            },
            ratings: RatingsConfig { missing_listing },
            pagination: PaginationConfig {
                default_limit,
                max_limit,
            },
            ids: IdConfig { node_id },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
