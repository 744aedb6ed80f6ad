use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

/// Accepted range for `FIKRA_SESSION_DAYS`.
const SESSION_DAYS: std::ops::RangeInclusive<u32> = 1..=3650;

/// Secrets that must not reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub session_secret: String,
    pub session_days: u32,
    /// Usernames promoted to admin at startup.
    pub admins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let session_secret = var_or("FIKRA_SESSION_SECRET", "dev-secret-change-me");
        if PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            warn!("FIKRA_SESSION_SECRET is unset or a placeholder; sessions can be forged");
        }

        Ok(Self {
            host: var_or("FIKRA_HOST", "0.0.0.0"),
            port: parse_var("FIKRA_PORT", "5000")?,
            db_path: var_or("FIKRA_DB_PATH", "data.db").into(),
            upload_dir: var_or("FIKRA_UPLOAD_DIR", "static/images").into(),
            max_upload_bytes: parse_var("FIKRA_MAX_UPLOAD_BYTES", "10485760")?,
            session_secret,
            session_days: session_days(&var_or("FIKRA_SESSION_DAYS", "30"))?,
            admins: split_list(&var_or("FIKRA_ADMINS", "")),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var_or(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw:?}"))
}

fn session_days(raw: &str) -> Result<u32> {
    let days: u32 = raw
        .parse()
        .with_context(|| format!("invalid FIKRA_SESSION_DAYS value: {raw:?}"))?;
    if !SESSION_DAYS.contains(&days) {
        anyhow::bail!(
            "FIKRA_SESSION_DAYS must be between {} and {}, got {days}",
            SESSION_DAYS.start(),
            SESSION_DAYS.end()
        );
    }
    Ok(days)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_ignores_blanks() {
        assert_eq!(split_list(" alice, ,bob ,"), vec!["alice", "bob"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = parse_var::<u16>("FIKRA_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(format!("{err:#}").contains("FIKRA_TEST_UNSET_PORT"));
        assert_eq!(parse_var::<u16>("FIKRA_TEST_UNSET_PORT", "8080").unwrap(), 8080);
    }

    #[test]
    fn session_days_must_be_in_range() {
        assert_eq!(session_days("30").unwrap(), 30);
        assert_eq!(session_days("3650").unwrap(), 3650);

        for raw in ["-1", "0", "200000000", "soon"] {
            let err = session_days(raw).unwrap_err();
            assert!(format!("{err:#}").contains("FIKRA_SESSION_DAYS"), "{raw}");
        }
    }
}
