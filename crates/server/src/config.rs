use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "PARLEY_";

// Variable names the parent application already provisions.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("PARENT_APP_URL", "permission.url"),
    ("PARENT_APP_API_SECRET", "permission.secret"),
];

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub permission: Option<PermissionSettings>,
    pub spam: SpamSettings,
    #[serde(default)]
    pub notification: Option<NotificationSettings>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
    pub timeout_secs: u64,
}

/// Parent application asked before identified commenters may post.
#[derive(Deserialize, Clone, Debug)]
pub struct PermissionSettings {
    pub url: String,
    /// Hex. Absent or malformed means every check is denied.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_requester")]
    pub requester: String,
    #[serde(default = "default_perm_key")]
    pub perm_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SpamSettings {
    #[serde(default)]
    pub akismet_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    pub webhook_url: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_requester() -> String {
    domain::protocol::DEFAULT_REQUESTER.to_string()
}

fn default_perm_key() -> String {
    domain::protocol::PERM_CAN_COMMENT.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    256
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load(&run_mode, std::env::vars())
    }

    fn load(
        run_mode: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let env_map = collect_env_vars(vars);
        let env_json = serde_json::to_string(&env_map)
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/parley.db")?
            .set_default("database.timeout_secs", 5)?
            .set_default("spam.timeout_secs", 5)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(&env_json, config::FileFormat::Json))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut prefixed = Vec::new();

    for (k, v) in vars {
        if let Some(rest) = k.strip_prefix(ENV_PREFIX) {
            prefixed.push((rest.replace("__", ".").to_lowercase(), v));
        } else if let Some((_, key)) = LEGACY_ALIASES.iter().find(|(name, _)| *name == k) {
            map.insert(key.to_string(), v);
        }
    }
    // Explicit PARLEY_ variables win over legacy aliases.
    map.extend(prefixed);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_vars_map_to_nested_keys() {
        let map = collect_env_vars(vars(&[
            ("PARLEY_SERVER__PORT", "8080"),
            ("PARLEY_PERMISSION__PERM_KEY", "canReply"),
            ("HOME", "/root"),
        ]));
        assert_eq!(map.get("server.port").map(String::as_str), Some("8080"));
        assert_eq!(map.get("permission.perm_key").map(String::as_str), Some("canReply"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn legacy_aliases_lose_to_prefixed_vars() {
        let map = collect_env_vars(vars(&[
            ("PARLEY_PERMISSION__URL", "https://new.example.org"),
            ("PARENT_APP_URL", "https://old.example.org"),
            ("PARENT_APP_API_SECRET", "abcd"),
        ]));
        assert_eq!(map.get("permission.url").map(String::as_str), Some("https://new.example.org"));
        assert_eq!(map.get("permission.secret").map(String::as_str), Some("abcd"));
    }

    #[test]
    fn defaults_leave_optional_integrations_off() {
        let s = Settings::load("test", Vec::new()).unwrap();
        assert_eq!(s.server.port, 3000);
        assert_eq!(s.database.timeout_secs, 5);
        assert!(s.permission.is_none());
        assert!(s.notification.is_none());
        assert!(s.spam.akismet_key.is_none());
    }

    #[test]
    fn permission_section_from_legacy_env() {
        let s = Settings::load(
            "test",
            vars(&[
                ("PARENT_APP_URL", "https://app.example.org"),
                ("PARENT_APP_API_SECRET", "deadbeef"),
                ("PARLEY_NOTIFICATION__WEBHOOK_URL", "https://hooks.example.org/new"),
            ]),
        )
        .unwrap();

        let p = s.permission.unwrap();
        assert_eq!(p.url, "https://app.example.org");
        assert_eq!(p.secret.as_deref(), Some("deadbeef"));
        assert_eq!(p.requester, "commento");
        assert_eq!(p.perm_key, "canComment");
        assert_eq!(p.timeout_secs, 5);

        let n = s.notification.unwrap();
        assert_eq!(n.queue_capacity, 256);
    }
}
