use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_API_URL: &str = "OPENAI_API_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/agent-watcher.db";
    pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// API key for the outbound agent event stream (stream endpoints are
    /// rejected when this is unset)
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            openai_api_key: env::var(env_vars::OPENAI_API_KEY).ok(),
            openai_api_url: env::var(env_vars::OPENAI_API_URL)
                .unwrap_or_else(|_| defaults::OPENAI_API_URL.to_string()),
        }
    }
}
