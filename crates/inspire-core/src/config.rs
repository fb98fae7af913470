use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Runtime configuration, read from the environment.
///
/// The command table itself lives in the schema file named here.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub command_schema_path: PathBuf,
    pub data_dir: PathBuf,
    /// Seeded as admins on every start.
    pub admin_users: Vec<i64>,
    pub telegram_message_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let token_file = env_path("TOKEN_FILE").unwrap_or_else(|| PathBuf::from("token.txt"));
        let telegram_bot_token = resolve_token(env_str("TELEGRAM_BOT_TOKEN"), &token_file)?;

        let command_schema_path =
            env_path("COMMAND_SCHEMA_PATH").unwrap_or_else(|| PathBuf::from("commands.toml"));

        let data_dir = env_path("INSPIRE_DATA_DIR").unwrap_or_else(|| PathBuf::from("data"));
        fs::create_dir_all(&data_dir)?;

        let admin_users = parse_csv_i64(env_str("INSPIRE_ADMIN_USERS"))?;

        let telegram_message_limit = env_usize("TELEGRAM_MESSAGE_LIMIT").unwrap_or(4096);
        if telegram_message_limit == 0 {
            return Err(Error::Config(
                "TELEGRAM_MESSAGE_LIMIT must be positive".to_string(),
            ));
        }

        Ok(Self {
            telegram_bot_token,
            command_schema_path,
            data_dir,
            admin_users,
            telegram_message_limit,
        })
    }
}

/// The env var wins; otherwise the trimmed contents of `token_file`.
fn resolve_token(from_env: Option<String>, token_file: &Path) -> Result<String> {
    if let Some(token) = from_env.and_then(non_empty) {
        return Ok(token.trim().to_string());
    }

    let contents = fs::read_to_string(token_file).map_err(|e| {
        Error::Config(format!(
            "TELEGRAM_BOT_TOKEN is not set and {} is unreadable: {e}",
            token_file.display()
        ))
    })?;
    non_empty(contents.trim().to_string()).ok_or_else(|| {
        Error::Config(format!("token file {} is empty", token_file.display()))
    })
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }
        out.push((key.to_string(), val.to_string()));
    }
    out
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

/// Every entry must parse.
fn parse_csv_i64(v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("invalid user id in INSPIRE_ADMIN_USERS: {s}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
