use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenType {
    Port,
    Sock,
}

impl ListenType {
    fn from_env(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "port" | "tcp" => Ok(Self::Port),
            "sock" | "unix" => Ok(Self::Sock),
            _ => Err(anyhow::anyhow!("LISTEN_TYPE must be one of: port, sock")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub users_corpus_path: PathBuf,
    pub games_corpus_path: PathBuf,
    pub min_batch: usize,
    pub batch_span: usize,
    pub max_inflight: usize,
    pub deadline: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub listen_type: ListenType,
    pub collection_users: String,
    pub collection_user_games: String,
    pub store_op_timeout: Duration,
    pub snapshot_path: Option<PathBuf>,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("APP_PORT", 8080u16)?;
        let listen_type =
            ListenType::from_env(&env::var("LISTEN_TYPE").unwrap_or_else(|_| "port".to_string()))?;

        let collection_users =
            env::var("COLLECTION_USERS").unwrap_or_else(|_| "users".to_string());
        let collection_user_games =
            env::var("COLLECTION_USER_GAMES").unwrap_or_else(|_| "user_games".to_string());

        let store_op_timeout = Duration::from_millis(parse_var("STORE_OP_TIMEOUT_MS", 5_000u64)?);
        let snapshot_path = env::var("DATA_SNAPSHOT_PATH")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let seed = SeedConfig {
            users_corpus_path: env::var("USERS_CORPUS_PATH")
                .unwrap_or_else(|_| "resources/users_go.json".to_string())
                .into(),
            games_corpus_path: env::var("GAMES_CORPUS_PATH")
                .unwrap_or_else(|_| "resources/games.json".to_string())
                .into(),
            min_batch: parse_var("SEED_MIN_BATCH", 5_000usize)?,
            batch_span: parse_var("SEED_BATCH_SPAN", 5_000usize)?,
            max_inflight: parse_var("SEED_MAX_INFLIGHT", 16usize)?,
            deadline: Duration::from_secs(parse_var("SEED_DEADLINE_SECS", 36_000u64)?),
        };

        let config = Self {
            host,
            port,
            listen_type,
            collection_users,
            collection_user_games,
            store_op_timeout,
            snapshot_path,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.seed.max_inflight == 0 {
            anyhow::bail!("SEED_MAX_INFLIGHT must be at least 1");
        }
        if self.collection_users == self.collection_user_games {
            anyhow::bail!("COLLECTION_USERS and COLLECTION_USER_GAMES must differ");
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
