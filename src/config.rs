use anyhow::bail;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "inkpost", about = "A small blogging API server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database location (SQLite file path)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub token_hours: u64,
    pub bcrypt_cost: u32,
    pub jwt_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
    pub api_base: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            token_hours: 72,
            bcrypt_cost: 10,
            jwt_secret: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: "blog_images".to_string(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Settings that have no sensible default. Startup fails without them.
#[derive(Debug, Clone, Copy)]
pub struct Required<'a> {
    pub database_url: &'a str,
    pub jwt_secret: &'a str,
    pub cloud_name: &'a str,
    pub api_key: &'a str,
    pub api_secret: &'a str,
}

impl Config {
    /// Layered load: TOML file, then `.env` and process environment, then CLI flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("inkpost.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else if cli.config.is_some() {
            bail!("config file {} does not exist", config_path.display());
        } else {
            Config::default()
        };
        config.server.allowed_origins =
            normalize_origins(std::mem::take(&mut config.server.allowed_origins));

        if dotenv::dotenv().is_ok() {
            tracing::debug!("Loaded .env file");
        }
        config.apply_env(|key| std::env::var(key).ok());

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref url) = cli.database_url {
            config.database.url = Some(url.clone());
        }

        Ok(config)
    }

    /// Overlay environment variables onto the file config.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(secret) = non_empty("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(name) = non_empty("CLOUD_NAME") {
            self.media.cloud_name = Some(name);
        }
        if let Some(key) = non_empty("CLOUD_API_KEY") {
            self.media.api_key = Some(key);
        }
        if let Some(secret) = non_empty("CLOUD_API_SECRET") {
            self.media.api_secret = Some(secret);
        }
        if let Some(port) = non_empty("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring unparseable PORT value: {}", port),
            }
        }
        if let Some(origins) = non_empty("ALLOWED_ORIGINS") {
            self.server.allowed_origins =
                normalize_origins(origins.split(',').map(str::to_string));
        }
    }

    /// Borrow the required settings, or fail naming every one that is missing.
    pub fn required(&self) -> anyhow::Result<Required<'_>> {
        let fields = [
            ("DATABASE_URL", self.database.url.as_deref()),
            ("JWT_SECRET", self.auth.jwt_secret.as_deref()),
            ("CLOUD_NAME", self.media.cloud_name.as_deref()),
            ("CLOUD_API_KEY", self.media.api_key.as_deref()),
            ("CLOUD_API_SECRET", self.media.api_secret.as_deref()),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!("missing required settings: {}", missing.join(", "));
        }

        match fields.map(|(_, value)| value) {
            [Some(database_url), Some(jwt_secret), Some(cloud_name), Some(api_key), Some(api_secret)] => {
                Ok(Required {
                    database_url,
                    jwt_secret,
                    cloud_name,
                    api_key,
                    api_secret,
                })
            }
            _ => bail!("missing required settings"),
        }
    }
}

/// Browsers send `Origin` without surrounding space or a trailing slash.
fn normalize_origins<I>(origins: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    origins
        .into_iter()
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_env() -> impl Fn(&str) -> Option<String> {
        env(&[
            ("DATABASE_URL", "/tmp/inkpost.db"),
            ("JWT_SECRET", "s3cret"),
            ("CLOUD_NAME", "demo"),
            ("CLOUD_API_KEY", "key"),
            ("CLOUD_API_SECRET", "shh"),
        ])
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.auth.cookie_name, "token");
        assert_eq!(config.auth.token_hours, 72);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.media.folder, "blog_images");
        assert!(config.database.url.is_none());
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn required_lists_every_missing_setting() {
        let err = Config::default().required().unwrap_err().to_string();
        for name in [
            "DATABASE_URL",
            "JWT_SECRET",
            "CLOUD_NAME",
            "CLOUD_API_KEY",
            "CLOUD_API_SECRET",
        ] {
            assert!(err.contains(name), "{} missing from: {}", name, err);
        }
    }

    #[test]
    fn required_succeeds_when_env_is_complete() {
        let mut config = Config::default();
        config.apply_env(complete_env());
        let required = config.required().unwrap();
        assert_eq!(required.database_url, "/tmp/inkpost.db");
        assert_eq!(required.jwt_secret, "s3cret");
        assert_eq!(required.cloud_name, "demo");
        assert_eq!(required.api_key, "key");
        assert_eq!(required.api_secret, "shh");
    }

    #[test]
    fn blank_env_values_count_as_missing() {
        let mut config = Config::default();
        config.apply_env(env(&[("JWT_SECRET", "   ")]));
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn env_overrides_port_and_origins() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("PORT", "8080"),
            (
                "ALLOWED_ORIGINS",
                "http://localhost:5173, https://blog.example.com/ ,",
            ),
        ]));
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.allowed_origins,
            vec!["http://localhost:5173", "https://blog.example.com"]
        );
    }

    #[test]
    fn bad_port_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("inkpost.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "127.0.0.1"
port = 9000
allowed_origins = ["https://blog.example.com"]

[auth]
cookie_name = "session"
token_hours = 24

[media]
folder = "covers"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://blog.example.com"]
        );
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.auth.token_hours, 24);
        assert_eq!(config.media.folder, "covers");
    }

    #[test]
    fn toml_origins_are_normalized_like_env_origins() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("inkpost.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
allowed_origins = [" https://blog.example.com/ ", "", "http://localhost:5173"]
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://blog.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn load_fails_for_missing_explicit_config() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(tmp.path().join("nope.toml")),
            ..Cli::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("inkpost.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[database]
url = "/var/lib/inkpost.db"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            database_url: Some("/tmp/override.db".to_string()),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.url.as_deref(), Some("/tmp/override.db"));
    }
}
