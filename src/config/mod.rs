use anyhow::{anyhow, Result};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub ranked_feed_limit: i64,
    pub thread_depth_cap: u32,
    pub follower_limit: i64,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ranked_feed_limit: env_or_parse("RANKED_FEED_LIMIT", "50")?,
            thread_depth_cap: env_or_parse("THREAD_DEPTH_CAP", "3")?,
            follower_limit: env_or_parse("FOLLOWER_LIMIT", "5000")?,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ranked_feed_limit: 50,
            thread_depth_cap: 3,
            follower_limit: 5000,
        }
    }
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
