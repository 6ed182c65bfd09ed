use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::types::GameConfig;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Word list to load instead of the built-in one
    pub lexicon_path: Option<PathBuf>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 4678)),
            lexicon_path: None,
            game: GameConfig::default(),
        }
    }
}

/// Parse an env var, warning and falling back to `default` on bad input
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid {}='{}', using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// - `IMPOSTOR_ADDR`: listen address (default: 0.0.0.0:4678)
    /// - `IMPOSTOR_LEXICON`: path to a JSON word list
    /// - `IMPOSTOR_DEFAULT_IMPOSTORS`: impostors per round when none is requested (default: 1)
    /// - `IMPOSTOR_MAX_NAME_CHARS`: longest accepted player name (default: 32)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = parse_env("IMPOSTOR_ADDR", defaults.addr);
        let lexicon_path = std::env::var("IMPOSTOR_LEXICON")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let mut default_impostor_count = parse_env(
            "IMPOSTOR_DEFAULT_IMPOSTORS",
            defaults.game.default_impostor_count,
        );
        if default_impostor_count == 0 {
            tracing::warn!("IMPOSTOR_DEFAULT_IMPOSTORS must be at least 1, using default");
            default_impostor_count = defaults.game.default_impostor_count;
        }

        let mut max_name_chars =
            parse_env("IMPOSTOR_MAX_NAME_CHARS", defaults.game.max_name_chars);
        if max_name_chars == 0 {
            tracing::warn!("IMPOSTOR_MAX_NAME_CHARS must be at least 1, using default");
            max_name_chars = defaults.game.max_name_chars;
        }

        tracing::debug!(
            %addr,
            ?lexicon_path,
            default_impostor_count,
            max_name_chars,
            "Config loaded"
        );

        Self {
            addr,
            lexicon_path,
            game: GameConfig {
                default_impostor_count,
                max_name_chars,
            },
        }
    }
}
