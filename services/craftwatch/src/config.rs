//! Configuration types for the craftwatch service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rcon: Option<RconConfig>,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    /// Bound on each presence, topic or announcement write
    #[serde(default = "default_surface_timeout")]
    pub surface_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rcon: None,
            discord: DiscordConfig::default(),
            polling_interval_seconds: default_polling_interval(),
            probe_timeout_seconds: default_probe_timeout(),
            surface_timeout_seconds: default_surface_timeout(),
        }
    }
}

/// The monitored game server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_game_port")]
    pub port: u16,
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_game_port(),
            display_name: default_display_name(),
        }
    }
}

impl ServerConfig {
    /// `host:port` as shown to players
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// RCON admin query channel. Absent means the admin query is disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RconConfig {
    /// Defaults to the game server host
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_rcon_port")]
    pub port: u16,
    pub password: String,
}

/// Discord bot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    /// Channel whose topic mirrors the server state and which receives
    /// transition announcements
    #[serde(default)]
    pub status_channel_id: Option<u64>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            status_channel_id: None,
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_game_port() -> u16 {
    25565
}

fn default_rcon_port() -> u16 {
    25575
}

fn default_display_name() -> String {
    "Cartofia".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_polling_interval() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_surface_timeout() -> u64 {
    15
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Setting `RCON_PASSWORD` enables the admin query even when the config
    /// file has no `rcon` section.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(host) = lookup("MC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MC_PORT") {
            self.server.port = parse_env("MC_PORT", &port)?;
        }
        if let Some(name) = lookup("SERVER_NAME") {
            self.server.display_name = name;
        }
        if let Some(prefix) = lookup("COMMAND_PREFIX") {
            self.discord.command_prefix = prefix;
        }
        if let Some(channel) = lookup("STATUS_CHANNEL_ID") {
            self.discord.status_channel_id = Some(parse_env("STATUS_CHANNEL_ID", &channel)?);
        }

        if let Some(password) = lookup("RCON_PASSWORD") {
            let rcon = self.rcon.get_or_insert_with(|| RconConfig {
                host: None,
                port: default_rcon_port(),
                password: String::new(),
            });
            rcon.password = password;
        }
        if let Some(rcon) = self.rcon.as_mut() {
            if let Some(host) = lookup("RCON_HOST") {
                rcon.host = Some(host);
            }
            if let Some(port) = lookup("RCON_PORT") {
                rcon.port = parse_env("RCON_PORT", &port)?;
            }
        }

        Ok(())
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> crate::Result<()> {
        if self.discord.token.trim().is_empty() {
            return Err(crate::CraftwatchError::Config(
                "DISCORD_TOKEN is not set in environment or config file".to_string(),
            ));
        }
        if self.polling_interval_seconds == 0 {
            return Err(crate::CraftwatchError::Config(
                "polling_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.probe_timeout_seconds == 0 {
            return Err(crate::CraftwatchError::Config(
                "probe_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.surface_timeout_seconds == 0 {
            return Err(crate::CraftwatchError::Config(
                "surface_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.rcon.as_ref().is_some_and(|r| r.password.is_empty()) {
            return Err(crate::CraftwatchError::Config(
                "rcon.password must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved `(host, port)` of the RCON endpoint, if enabled
    pub fn rcon_address(&self) -> Option<(String, u16)> {
        self.rcon.as_ref().map(|r| {
            (
                r.host.clone().unwrap_or_else(|| self.server.host.clone()),
                r.port,
            )
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value.trim().parse().map_err(|_| {
        crate::CraftwatchError::Config(format!("Invalid value for {}: {:?}", key, value))
    })
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::CraftwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
