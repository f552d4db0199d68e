// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

use crate::highscores::ScoreOrder;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LEVELS_DIR: &str = "../levels";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory containing `level<N>.json` files.
    pub levels_dir: PathBuf,
    /// Comparison used to decide whether a submitted score is better.
    pub score_order: ScoreOrder,
    /// Origins allowed by CORS. `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            levels_dir: PathBuf::from(DEFAULT_LEVELS_DIR),
            score_order: ScoreOrder::default(),
            allowed_origins: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `LEVELS_DIR` - Path to levels directory (default: `../levels`)
    /// - `SCORE_ORDER` - `string` or `numeric` (default: `string`)
    /// - `ALLOWED_ORIGINS` - `;`-separated CORS origins (default: any)
    ///
    /// CLI flags override the matching variable:
    /// - `--port <PORT>`
    /// - `--levels-dir <DIR>`
    /// - `--score-order <ORDER>`
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let port = Self::lookup(args, &env, "--port", "PORT")
            .and_then(|v| match v.parse() {
                Ok(p) => Some(p),
                Err(_) => {
                    tracing::warn!("Ignoring invalid port '{v}'");
                    None
                }
            })
            .unwrap_or(defaults.port);

        let levels_dir = Self::lookup(args, &env, "--levels-dir", "LEVELS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.levels_dir);

        let score_order = Self::lookup(args, &env, "--score-order", "SCORE_ORDER")
            .and_then(|v| match v.parse() {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::warn!("Ignoring score order: {e}");
                    None
                }
            })
            .unwrap_or(defaults.score_order);

        let allowed_origins = env("ALLOWED_ORIGINS").and_then(|v| {
            let origins: Vec<String> = v
                .split(';')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        });

        Config {
            port,
            levels_dir,
            score_order,
            allowed_origins,
        }
    }

    // CLI flag takes precedence, then env var.
    fn lookup(
        args: &[String],
        env: &impl Fn(&str) -> Option<String>,
        flag: &str,
        var: &str,
    ) -> Option<String> {
        Self::parse_cli_value(args, flag).or_else(|| env(var))
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
