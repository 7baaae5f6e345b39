use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use chrono::FixedOffset;
use dotenvy::dotenv;

use crate::model::role::Role;

/// Upper bound for `TOKEN_TTL` (one year).
const MAX_TOKEN_TTL_SECS: i64 = 366 * 86_400;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    /// Session lifetime in seconds.
    pub token_ttl: i64,

    pub api_prefix: String,
    pub pool: PoolConfig,
    pub password: PasswordConfig,
    pub guard: GuardConfig,

    /// Zone in which calendar days for attendance are cut.
    pub work_zone: FixedOffset,

    // Rate limiting
    pub rate_login_per_min: u32,

    pub cookie_secure: bool,
    pub log_dir: String,
    pub log_level: tracing::Level,
    pub run_migrations: bool,
}

#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub query_timeout: Duration,
}

/// Argon2 cost parameters.
#[derive(Clone, Debug)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Clone, Debug)]
pub struct GuardConfig {
    pub protected_prefixes: Vec<String>,
    pub role_prefixes: Vec<(String, Vec<Role>)>,
    pub login_path: String,
    pub register_path: String,
    pub landing_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let offset_minutes: i32 = parse_or(&lookup, "WORK_UTC_OFFSET_MINUTES", 0)?;
        let work_zone = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("WORK_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let token_ttl: i64 = parse_or(&lookup, "TOKEN_TTL", 86_400)?; // default 1 day
        if token_ttl <= 0 || token_ttl > MAX_TOKEN_TTL_SECS {
            bail!("TOKEN_TTL must be between 1 and {MAX_TOKEN_TTL_SECS} seconds, got {token_ttl}");
        }

        let role_prefixes = match lookup("ROLE_PREFIXES") {
            Some(raw) => parse_role_prefixes(&raw)?,
            None => vec![("/admin".to_string(), vec![Role::Admin])],
        };
        for (prefix, _) in &role_prefixes {
            check_prefix("ROLE_PREFIXES", prefix)?;
        }

        let protected_prefixes = lookup("PROTECTED_PREFIXES")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| {
                ["/dashboard", "/attendance", "/leave", "/profile", "/admin"]
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            });
        for prefix in &protected_prefixes {
            check_prefix("PROTECTED_PREFIXES", prefix)?;
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl,

            api_prefix: prefix_or(&lookup, "API_PREFIX", "/api")?,

            pool: PoolConfig {
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    3,
                )?),
                idle_timeout: Duration::from_secs(parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", 600)?),
                query_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DB_QUERY_TIMEOUT_SECS",
                    5,
                )?),
            },

            password: PasswordConfig {
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", 19_456)?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", 2)?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", 1)?,
            },

            guard: GuardConfig {
                protected_prefixes,
                role_prefixes,
                login_path: prefix_or(&lookup, "LOGIN_PATH", "/login")?,
                register_path: prefix_or(&lookup, "REGISTER_PATH", "/register")?,
                landing_path: lookup("LANDING_PATH").unwrap_or_else(|| "/dashboard".to_string()),
            },

            work_zone,

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,

            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Gated prefixes must be rooted and name at least one segment.
fn check_prefix(key: &str, prefix: &str) -> anyhow::Result<()> {
    if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
        bail!("{key}: path prefix must start with '/' and not be the root: {prefix:?}");
    }
    Ok(())
}

fn prefix_or<F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = lookup(key)
        .map(|raw| raw.trim().to_string())
        .unwrap_or_else(|| default.to_string());
    check_prefix(key, &prefix)?;
    Ok(prefix)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `/admin=admin;/reports=admin|manager`.
fn parse_role_prefixes(raw: &str) -> anyhow::Result<Vec<(String, Vec<Role>)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (prefix, roles) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("ROLE_PREFIXES entry without '=': {entry}"))?;
            let roles = roles
                .split('|')
                .map(|r| {
                    Role::from_str(r.trim()).map_err(|_| anyhow!("Unknown role in ROLE_PREFIXES: {r}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok((prefix.trim().to_string(), roles))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://localhost/hrm"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup_from(&BASE)).unwrap();

        assert_eq!(cfg.token_ttl, 86_400);
        assert_eq!(cfg.api_prefix, "/api");
        assert_eq!(cfg.pool.max_connections, 10);
        assert_eq!(cfg.pool.acquire_timeout, Duration::from_secs(3));
        assert_eq!(cfg.work_zone, FixedOffset::east_opt(0).unwrap());
        assert_eq!(cfg.guard.login_path, "/login");
        assert_eq!(
            cfg.guard.role_prefixes,
            vec![("/admin".to_string(), vec![Role::Admin])]
        );
        assert!(cfg.guard.protected_prefixes.contains(&"/dashboard".to_string()));
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup_from(&BASE[..2])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", "lots"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(format!("{err:#}").contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_role_prefixes_and_zone() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ROLE_PREFIXES", "/admin=admin; /reports=admin|manager"));
        pairs.push(("WORK_UTC_OFFSET_MINUTES", "360"));
        pairs.push(("PROTECTED_PREFIXES", "/dashboard, /reports"));
        let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(cfg.guard.role_prefixes.len(), 2);
        assert_eq!(
            cfg.guard.role_prefixes[1],
            ("/reports".to_string(), vec![Role::Admin, Role::Manager])
        );
        assert_eq!(cfg.work_zone.local_minus_utc(), 6 * 3600);
        assert_eq!(cfg.guard.protected_prefixes, vec!["/dashboard", "/reports"]);
    }

    #[test]
    fn test_token_ttl_bounds() {
        for bad in ["0", "-5", "10000000000000", "9223372036854775807"] {
            let mut pairs = BASE.to_vec();
            pairs.push(("TOKEN_TTL", bad));
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains("TOKEN_TTL"), "{bad}");
        }

        let mut pairs = BASE.to_vec();
        pairs.push(("TOKEN_TTL", "3600"));
        assert_eq!(Config::from_lookup(lookup_from(&pairs)).unwrap().token_ttl, 3600);
    }

    #[test]
    fn test_empty_or_unrooted_prefixes_rejected() {
        let cases = [
            ("API_PREFIX", ""),
            ("API_PREFIX", "/"),
            ("API_PREFIX", "api"),
            ("LOGIN_PATH", ""),
            ("REGISTER_PATH", " "),
            ("PROTECTED_PREFIXES", "/dashboard, dashboard"),
            ("PROTECTED_PREFIXES", "/dashboard, /"),
            ("ROLE_PREFIXES", "=admin"),
            ("ROLE_PREFIXES", "/=admin"),
        ];
        for (key, value) in cases {
            let mut pairs = BASE.to_vec();
            pairs.push((key, value));
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains(key), "{key}={value:?}: {err}");
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ROLE_PREFIXES", "/admin=superuser"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
