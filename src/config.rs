use std::env;
use thiserror::Error;

// Only good enough for local development.
const DEV_SECRET_KEY: [u8; 32] = [0u8; 32];
const MIN_SECRET_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not valid unicode")]
    NotUnicode { name: &'static str },
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub db_path: String,
    pub templates: String,
    pub secret_key: Vec<u8>,
    pub secure_cookie: bool,
    pub bcrypt_cost: u32,
    pub admin: Option<AdminConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:8080".to_owned(),
            db_path: "watchlist_data.db".to_owned(),
            templates: concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*").to_owned(),
            secret_key: DEV_SECRET_KEY.to_vec(),
            secure_cookie: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin: None,
        }
    }
}

fn var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { name }),
    }
}

impl Config {
    /// Reads the configuration from `WATCHLIST_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(var)
    }

    fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let mut config = Config::default();
        if let Some(bind) = lookup("WATCHLIST_BIND")? {
            config.bind = bind;
        }
        if let Some(db_path) = lookup("WATCHLIST_DB_PATH")? {
            config.db_path = db_path;
        }
        if let Some(templates) = lookup("WATCHLIST_TEMPLATES")? {
            config.templates = templates;
        }
        match lookup("WATCHLIST_SECRET_KEY")? {
            Some(key) if key.len() < MIN_SECRET_KEY_LEN => {
                return Err(ConfigError::Invalid {
                    name: "WATCHLIST_SECRET_KEY",
                    value: "<redacted>".to_owned(),
                    reason: "must be at least 32 bytes",
                })
            }
            Some(key) => config.secret_key = key.into_bytes(),
            None => log::warn!("WATCHLIST_SECRET_KEY is not set, using an insecure development key"),
        }
        if let Some(secure) = lookup("WATCHLIST_SECURE_COOKIE")? {
            config.secure_cookie = secure.parse().map_err(|_| ConfigError::Invalid {
                name: "WATCHLIST_SECURE_COOKIE",
                value: secure.clone(),
                reason: "expected true or false",
            })?;
        }
        if let Some(cost) = lookup("WATCHLIST_BCRYPT_COST")? {
            config.bcrypt_cost = match cost.parse() {
                Ok(parsed) if (4..=31).contains(&parsed) => parsed,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "WATCHLIST_BCRYPT_COST",
                        value: cost,
                        reason: "expected a number between 4 and 31",
                    })
                }
            };
        }
        let username = lookup("WATCHLIST_ADMIN_USERNAME")?;
        let password = lookup("WATCHLIST_ADMIN_PASSWORD")?;
        config.admin = match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminConfig {
                    username,
                    password,
                    name: lookup("WATCHLIST_ADMIN_NAME")?.unwrap_or_else(|| "Admin".to_owned()),
                })
            }
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid {
                    name: "WATCHLIST_ADMIN_USERNAME",
                    value: String::new(),
                    reason: "WATCHLIST_ADMIN_USERNAME and WATCHLIST_ADMIN_PASSWORD must not be empty",
                })
            }
            _ => {
                return Err(ConfigError::Invalid {
                    name: "WATCHLIST_ADMIN_USERNAME",
                    value: String::new(),
                    reason: "WATCHLIST_ADMIN_USERNAME and WATCHLIST_ADMIN_PASSWORD must be set together",
                })
            }
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(
        vars: &[(&'static str, &str)],
    ) -> impl Fn(&'static str) -> Result<Option<String>, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| Ok(vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.secret_key.len(), 32);
        assert!(config.admin.is_none());
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("WATCHLIST_BIND", "0.0.0.0:5000"),
            ("WATCHLIST_SECRET_KEY", "0123456789abcdef0123456789abcdef-extra"),
            ("WATCHLIST_SECURE_COOKIE", "true"),
            ("WATCHLIST_BCRYPT_COST", "6"),
            ("WATCHLIST_ADMIN_USERNAME", "txm"),
            ("WATCHLIST_ADMIN_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:5000");
        assert!(config.secure_cookie);
        assert_eq!(config.bcrypt_cost, 6);
        let admin = config.admin.unwrap();
        assert_eq!(admin.username, "txm");
        assert_eq!(admin.name, "Admin");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("WATCHLIST_SECRET_KEY", "short")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WATCHLIST_BCRYPT_COST", "3")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WATCHLIST_SECURE_COOKIE", "yes")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WATCHLIST_ADMIN_USERNAME", "txm")])).is_err());
    }

    #[test]
    fn admin_credentials_must_not_be_empty() {
        let err = Config::from_lookup(lookup(&[
            ("WATCHLIST_ADMIN_USERNAME", "txm"),
            ("WATCHLIST_ADMIN_PASSWORD", ""),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = Config::from_lookup(lookup(&[("WATCHLIST_ADMIN_PASSWORD", "hunter2")]))
            .unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }
}
