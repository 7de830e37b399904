// region:    --- Imports
use crate::error::{MarketError, MarketResult};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Config
/// 서비스 설정 (환경 변수)
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// 미설정 시 메모리 저장소로 동작
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub kafka_brokers: Option<String>,
    pub scheduler_interval: Duration,
    pub outbox_batch_size: i64,
}

impl Config {
    pub fn load() -> MarketResult<Self> {
        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            kafka_brokers: optional("KAFKA_BROKERS"),
            scheduler_interval: Duration::from_millis(try_load("SCHEDULER_INTERVAL_MS", "1000")?),
            outbox_batch_size: try_load("OUTBOX_BATCH_SIZE", "100")?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            warn!("{:<12} --> {} 미설정", "Config", key);
            None
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> MarketResult<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{:<12} --> {} 미설정, 기본값 사용: {}", "Config", key, default);
        default.to_string()
    });
    raw.parse()
        .map_err(|e| MarketError::Config(format!("{key}={raw}: {e}")))
}
// endregion: --- Config

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        let port: u16 = try_load("MARKET_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = try_load::<u16>("MARKET_TEST_UNSET_PORT_2", "not-a-port").unwrap_err();
        assert_eq!(err.code(), "CONFIG");
    }
}
