use chrono::FixedOffset;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub crm: CrmConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub board: BoardConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки CRM API
#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Сетка слотов и часовой пояс центра
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub first_hour: u32,
    pub last_hour: u32,
    pub utc_offset_hours: i32,
}

impl BoardConfig {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
    }
}

// Плоское представление переменных окружения (ключи в нижнем регистре)
#[derive(Debug, Deserialize)]
struct EnvSettings {
    host: String,
    port: u16,
    environment: String,
    rust_log: String,
    crm_api_url: String,
    crm_api_token: Option<String>,
    crm_api_timeout_seconds: u64,
    circuit_breaker_failure_threshold: u32,
    circuit_breaker_timeout_seconds: u64,
    board_first_hour: u32,
    board_last_hour: u32,
    board_utc_offset_hours: i32,
}

impl Config {
    /// Читает настройки из переменных окружения (после `dotenvy`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(
            config::Config::builder().add_source(Environment::default().try_parsing(true)),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: EnvSettings = builder
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("environment", "development")?
            .set_default("rust_log", "eywa_board=debug,tower_http=debug")?
            .set_default("crm_api_url", "http://localhost:8000")?
            .set_default("crm_api_timeout_seconds", 30)?
            .set_default("circuit_breaker_failure_threshold", 5)?
            .set_default("circuit_breaker_timeout_seconds", 60)?
            .set_default("board_first_hour", 7)?
            .set_default("board_last_hour", 22)?
            .set_default("board_utc_offset_hours", 5)?
            .build()?
            .try_deserialize()?;

        if settings.board_first_hour > settings.board_last_hour || settings.board_last_hour > 23 {
            return Err(ConfigError::Message(format!(
                "BOARD_FIRST_HOUR/BOARD_LAST_HOUR must form a range within a day, got {}..{}",
                settings.board_first_hour, settings.board_last_hour
            )));
        }
        if FixedOffset::east_opt(settings.board_utc_offset_hours * 3600).is_none() {
            return Err(ConfigError::Message(format!(
                "BOARD_UTC_OFFSET_HOURS is out of range: {}",
                settings.board_utc_offset_hours
            )));
        }

        Ok(Config {
            app: AppConfig {
                host: settings.host,
                port: settings.port,
                environment: settings.environment,
                rust_log: settings.rust_log,
            },
            crm: CrmConfig {
                base_url: settings.crm_api_url.trim_end_matches('/').to_string(),
                token: settings.crm_api_token.filter(|t| !t.trim().is_empty()),
                timeout_seconds: settings.crm_api_timeout_seconds,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: settings.circuit_breaker_failure_threshold,
                timeout_seconds: settings.circuit_breaker_timeout_seconds,
            },
            board: BoardConfig {
                first_hour: settings.board_first_hour,
                last_hour: settings.board_last_hour,
                utc_offset_hours: settings.board_utc_offset_hours,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = Config::from_builder(config::Config::builder()).unwrap();
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.crm.base_url, "http://localhost:8000");
        assert_eq!(config.crm.token, None);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.board.first_hour, 7);
        assert_eq!(config.board.last_hour, 22);
        assert_eq!(config.board.utc_offset().unwrap().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn overrides_are_applied() {
        let builder = config::Config::builder()
            .set_override("crm_api_url", "https://crm.example.com/")
            .unwrap()
            .set_override("crm_api_token", "secret")
            .unwrap()
            .set_override("board_first_hour", 8)
            .unwrap()
            .set_override("board_last_hour", 21)
            .unwrap();
        let config = Config::from_builder(builder).unwrap();
        assert_eq!(config.crm.base_url, "https://crm.example.com");
        assert_eq!(config.crm.token.as_deref(), Some("secret"));
        assert_eq!(config.board.first_hour, 8);
    }

    #[test]
    fn inverted_hours_are_rejected() {
        let builder = config::Config::builder()
            .set_override("board_first_hour", 22)
            .unwrap()
            .set_override("board_last_hour", 7)
            .unwrap();
        assert!(Config::from_builder(builder).is_err());
    }
}
