use crate::domain::{Commodity, Decimal};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub commodities: Vec<Commodity>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: Decimal,
    pub order_near_qty: Decimal,
    pub order_long_qty: Decimal,
    pub spread_source: SpreadSource,
    pub chain_database_path: String,
    pub chain_name: String,
    pub ledger_output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadSource {
    Csv(PathBuf),
    Http(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let commodities: Vec<Commodity> = required(&env_map, "COMMODITIES")?
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Commodity::from)
            .collect();
        if commodities.is_empty() {
            return Err(ConfigError::InvalidValue(
                "COMMODITIES".to_string(),
                "must list at least one commodity".to_string(),
            ));
        }

        let start_date = parse_date(&env_map, "START_DATE")?;
        let end_date = parse_date(&env_map, "END_DATE")?;
        if start_date > end_date {
            return Err(ConfigError::InvalidValue(
                "END_DATE".to_string(),
                format!("{} is before START_DATE {}", end_date, start_date),
            ));
        }

        let initial_cash = parse_decimal(&env_map, "INITIAL_CASH", "1000000")?;
        if initial_cash.is_negative() {
            return Err(ConfigError::InvalidValue(
                "INITIAL_CASH".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let order_near_qty = parse_decimal(&env_map, "ORDER_NEAR_QTY", "1")?;
        let order_long_qty = parse_decimal(&env_map, "ORDER_LONG_QTY", "1")?;
        for (key, qty) in [("ORDER_NEAR_QTY", order_near_qty), ("ORDER_LONG_QTY", order_long_qty)] {
            if qty.is_negative() {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }

        let spread_source = match required(&env_map, "SPREAD_SOURCE")?.split_once(':') {
            Some(("csv", path)) if !path.is_empty() => SpreadSource::Csv(PathBuf::from(path)),
            Some(("http", rest)) if !rest.is_empty() => SpreadSource::Http(format!("http:{}", rest)),
            Some(("https", rest)) if !rest.is_empty() => {
                SpreadSource::Http(format!("https:{}", rest))
            }
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SPREAD_SOURCE".to_string(),
                    "must be csv:<path> or an http(s) URL".to_string(),
                ))
            }
        };

        let chain_database_path = env_map
            .get("CHAIN_DATABASE_PATH")
            .cloned()
            .unwrap_or_else(|| "./data/chain.db".to_string());

        let chain_name = env_map
            .get("CHAIN_NAME")
            .cloned()
            .unwrap_or_else(|| "spreadchain".to_string());

        let ledger_output_dir = PathBuf::from(
            env_map
                .get("LEDGER_OUTPUT_DIR")
                .map(|s| s.as_str())
                .unwrap_or("./output"),
        );

        Ok(Config {
            commodities,
            start_date,
            end_date,
            initial_cash,
            order_near_qty,
            order_long_qty,
            spread_source,
            chain_database_path,
            chain_name,
            ledger_output_dir,
        })
    }
}

fn required<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_date(env_map: &HashMap<String, String>, key: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(required(env_map, key)?.trim(), "%Y-%m-%d").map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a YYYY-MM-DD date".to_string())
    })
}

fn parse_decimal(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    Decimal::from_str_canonical(env_map.get(key).map(|s| s.as_str()).unwrap_or(default))
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), "must be a decimal".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("COMMODITIES".to_string(), "CORN, WHEAT".to_string());
        map.insert("START_DATE".to_string(), "2025-01-01".to_string());
        map.insert("END_DATE".to_string(), "2025-01-31".to_string());
        map.insert("SPREAD_SOURCE".to_string(), "csv:data/spreads.csv".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(
            config.commodities,
            vec![Commodity::from("CORN"), Commodity::from("WHEAT")]
        );
        assert_eq!(config.initial_cash, Decimal::from(1_000_000));
        assert_eq!(config.order_near_qty, Decimal::one());
        assert_eq!(config.order_long_qty, Decimal::one());
        assert_eq!(
            config.spread_source,
            SpreadSource::Csv(PathBuf::from("data/spreads.csv"))
        );
        assert_eq!(config.chain_database_path, "./data/chain.db");
        assert_eq!(config.chain_name, "spreadchain");
        assert_eq!(config.ledger_output_dir, PathBuf::from("./output"));
    }

    #[test]
    fn test_missing_commodities() {
        let mut env_map = setup_required_env();
        env_map.remove("COMMODITIES");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "COMMODITIES"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_blank_commodity_list() {
        let mut env_map = setup_required_env();
        env_map.insert("COMMODITIES".to_string(), " , ".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "COMMODITIES"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_missing_start_date() {
        let mut env_map = setup_required_env();
        env_map.remove("START_DATE");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "START_DATE"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_date_format() {
        let mut env_map = setup_required_env();
        env_map.insert("END_DATE".to_string(), "31/01/2025".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "END_DATE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_end_before_start() {
        let mut env_map = setup_required_env();
        env_map.insert("END_DATE".to_string(), "2024-12-31".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "END_DATE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_initial_cash() {
        let mut env_map = setup_required_env();
        env_map.insert("INITIAL_CASH".to_string(), "lots".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "INITIAL_CASH"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_negative_initial_cash() {
        let mut env_map = setup_required_env();
        env_map.insert("INITIAL_CASH".to_string(), "-5".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn test_negative_order_quantity() {
        let mut env_map = setup_required_env();
        env_map.insert("ORDER_LONG_QTY".to_string(), "-1".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "ORDER_LONG_QTY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_http_spread_source() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "SPREAD_SOURCE".to_string(),
            "https://feed.example.com/api".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.spread_source,
            SpreadSource::Http("https://feed.example.com/api".to_string())
        );
    }

    #[test]
    fn test_invalid_spread_source() {
        let mut env_map = setup_required_env();
        env_map.insert("SPREAD_SOURCE".to_string(), "ftp://nope".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SPREAD_SOURCE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
