use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_username: String,
    pub neo4j_password: String,
    pub google_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let neo4j_uri = env::var("NEO4J_URI").map_err(|_| ConfigError::Missing("NEO4J_URI"))?;
        let neo4j_username =
            env::var("NEO4J_USERNAME").map_err(|_| ConfigError::Missing("NEO4J_USERNAME"))?;
        let neo4j_password =
            env::var("NEO4J_PASSWORD").map_err(|_| ConfigError::Missing("NEO4J_PASSWORD"))?;
        let google_api_key =
            env::var("GOOGLE_API_KEY").map_err(|_| ConfigError::Missing("GOOGLE_API_KEY"))?;

        Ok(Self {
            neo4j_uri,
            neo4j_username,
            neo4j_password,
            google_api_key,
        })
    }
}
