mod app_env;

pub use app_env::AppEnv;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Application configuration managed by Figment.
///
/// Every field maps to the upper-snake-case environment variable of the same name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// SQLite connection string. Absent or blank means "serve fallback data".
    /// Env: `DATABASE_URL`. Example: `sqlite://shop.db`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub database_url: Option<String>,

    /// Port for the standalone listener (always bound on loopback).
    /// Env: `PORT`. Default: `3001`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Set by Vercel for every function invocation.
    /// Env: `VERCEL`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub vercel: Option<String>,

    /// Set by AWS Lambda for every function invocation.
    /// Env: `AWS_LAMBDA_FUNCTION_NAME`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub aws_lambda_function_name: Option<String>,

    /// Extra origin added to the CORS allow-list.
    /// Env: `FRONTEND_URL`. Example: `https://shop.example.com`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub frontend_url: Option<String>,

    /// Execution mode; development exposes error details to clients.
    /// Env: `APP_ENV`. Default: `development`.
    #[serde(default)]
    pub app_env: AppEnv,

    /// Log level for tracing subscriber initialization ("error" through "trace").
    /// Env: `LOGLEVEL`. Default: `info`.
    #[serde(default = "default_loglevel", deserialize_with = "deserialize_string_lax")]
    pub loglevel: String,

    /// Shared secret for `/api/admin`. Unset disables the admin routes.
    /// Env: `ADMIN_KEY`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub admin_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: default_port(),
            vercel: None,
            aws_lambda_function_name: None,
            frontend_url: None,
            app_env: AppEnv::default(),
            loglevel: default_loglevel(),
            admin_key: None,
        }
    }
}

impl Config {
    /// Builds a Figment that merges defaults and environment variables.
    /// Uses raw env mapping, so field names map to env vars in UPPER_SNAKE_CASE.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&[
                "DATABASE_URL",
                "PORT",
                "VERCEL",
                "AWS_LAMBDA_FUNCTION_NAME",
                "FRONTEND_URL",
                "APP_ENV",
                "LOGLEVEL",
                "ADMIN_KEY",
            ]))
    }

    /// Loads configuration from the environment (with defaults).
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Whether a serverless host is driving this process.
    pub fn is_hosted(&self) -> bool {
        is_set(self.vercel.as_deref()) || is_set(self.aws_lambda_function_name.as_deref())
    }

    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    /// The configured database URL, with blank values treated as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Copy of this configuration as seen inside a function invocation: production mode with
    /// the hosted indicator set.
    pub fn for_hosted(&self) -> Self {
        let mut cfg = self.clone();
        cfg.app_env = AppEnv::Production;
        if !cfg.is_hosted() {
            cfg.vercel = Some("1".to_string());
        }
        cfg
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Default port for the standalone server.
fn default_port() -> u16 {
    3001
}

fn default_loglevel() -> String {
    "info".to_string()
}

// Raw env values are parsed before they reach serde: `VERCEL=1` arrives as a number and
// `VERCEL=true` as a bool. Free-form string fields take either back as text.
fn lax_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lax_string(Value::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("expected a string, a number or a boolean"))
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        v => lax_string(v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a string, a number or a boolean")),
    }
}
