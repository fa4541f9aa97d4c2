use std::fmt::{Debug, Formatter};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::utils::redaction::redact_secret;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ROW_CEILING: usize = 1_000;
pub const DEFAULT_DATABASE_FILE: &str = "argo_floats.sqlite";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "FLOATCHAT_API_BASE";
pub const ENV_MODEL: &str = "FLOATCHAT_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "FLOATCHAT_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "FLOATCHAT_MAX_RETRIES";
pub const ENV_DATABASE: &str = "FLOATCHAT_DATABASE";
pub const ENV_ROW_CEILING: &str = "FLOATCHAT_ROW_CEILING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub data_dir: PathBuf,
}

impl RuntimePaths {
    #[must_use]
    pub fn default_database_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_DATABASE_FILE)
    }

    /// Resolves a user-supplied path the same way `--data-dir` is resolved.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        resolve_user_path(path, &self.home_dir, &self.cwd)
    }
}

pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    data_dir_override: Option<&Path>,
) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let data_dir = match data_dir_override {
        Some(path) => resolve_user_path(path, &home_dir, &cwd)?,
        None => home_dir.join(".floatchat"),
    };

    Ok(RuntimePaths {
        home_dir,
        cwd,
        data_dir: normalize_lexical(&data_dir),
    })
}

/// Settings for the chat-completions endpoint.
#[derive(Clone, PartialEq)]
pub struct GatewayConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Extra attempts after a transport failure. Zero means at-most-once.
    pub max_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

impl Debug for GatewayConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_deref().map(redact_secret))
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayOverrides {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl GatewayConfig {
    /// Flag > environment > default.
    pub fn resolve(
        overrides: &GatewayOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => env(ENV_TIMEOUT_SECS)
                .map(|raw| parse_env_number::<u64>(ENV_TIMEOUT_SECS, &raw))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            bail!("gateway timeout must be greater than zero seconds");
        }

        let max_retries = match overrides.max_retries {
            Some(retries) => retries,
            None => env(ENV_MAX_RETRIES)
                .map(|raw| parse_env_number::<u32>(ENV_MAX_RETRIES, &raw))
                .transpose()?
                .unwrap_or(defaults.max_retries),
        };

        let api_base = overrides
            .api_base
            .clone()
            .or_else(|| env(ENV_API_BASE))
            .unwrap_or(defaults.api_base);

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: env(ENV_API_KEY).map(|key| key.trim().to_string()),
            model: overrides
                .model
                .clone()
                .or_else(|| env(ENV_MODEL))
                .unwrap_or(defaults.model),
            max_output_tokens: defaults.max_output_tokens,
            temperature: defaults.temperature,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }

    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub row_ceiling: usize,
}

impl StoreConfig {
    /// Flag > environment > `<data_dir>/argo_floats.sqlite`.
    pub fn resolve(
        runtime_paths: &RuntimePaths,
        database_override: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_path = match database_override {
            Some(path) => runtime_paths.resolve(path)?,
            None => match env(ENV_DATABASE) {
                Some(raw) => runtime_paths.resolve(Path::new(raw.trim()))?,
                None => runtime_paths.default_database_path(),
            },
        };

        let row_ceiling = env(ENV_ROW_CEILING)
            .map(|raw| parse_env_number::<usize>(ENV_ROW_CEILING, &raw))
            .transpose()?
            .unwrap_or(DEFAULT_ROW_CEILING);
        if row_ceiling == 0 {
            bail!("{ENV_ROW_CEILING} must be greater than zero");
        }

        Ok(Self {
            database_path,
            row_ceiling,
        })
    }
}

fn parse_env_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got `{raw}`"))
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::time::Duration;

    use super::{
        DEFAULT_MODEL, DEFAULT_ROW_CEILING, GatewayConfig, GatewayOverrides, StoreConfig,
        resolve_runtime_paths,
    };

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<BTreeMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_data_dir_under_home() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"), None)
            .expect("paths should resolve");

        assert_eq!(paths.home_dir, Path::new("/home/tester"));
        assert_eq!(paths.cwd, Path::new("/work/repo"));
        assert_eq!(paths.data_dir, Path::new("/home/tester/.floatchat"));
        assert_eq!(
            paths.default_database_path(),
            Path::new("/home/tester/.floatchat/argo_floats.sqlite")
        );
    }

    #[test]
    fn expands_tilde_override_against_home_dir() {
        let paths = resolve_runtime_paths(
            Path::new("/home/tester"),
            Path::new("/work/repo"),
            Some(Path::new("~/ocean/data")),
        )
        .expect("tilde override should resolve");

        assert_eq!(paths.data_dir, Path::new("/home/tester/ocean/data"));
    }

    #[test]
    fn resolves_relative_override_against_cwd() {
        let paths = resolve_runtime_paths(
            Path::new("/home/tester"),
            Path::new("/work/repo"),
            Some(Path::new("./data/../data/argo")),
        )
        .expect("relative override should resolve");

        assert_eq!(paths.data_dir, Path::new("/work/repo/data/argo"));
    }

    #[test]
    fn rejects_non_absolute_home_dir() {
        let err = resolve_runtime_paths(Path::new("home/tester"), Path::new("/work/repo"), None)
            .expect_err("relative home dir must fail");

        assert!(
            err.to_string().contains("home_dir must be absolute"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_tilde_username_syntax() {
        let err = resolve_runtime_paths(
            Path::new("/home/tester"),
            Path::new("/work/repo"),
            Some(Path::new("~someone/out")),
        )
        .expect_err("~username syntax must fail");

        assert!(
            err.to_string()
                .contains("unsupported home expansion syntax"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn gateway_defaults_apply_without_environment() {
        let config = GatewayConfig::resolve(&GatewayOverrides::default(), env_from(&[]))
            .expect("defaults should resolve");

        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert_eq!(config.max_output_tokens, 500);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn gateway_flags_take_precedence_over_environment() {
        let overrides = GatewayOverrides {
            model: Some("flag-model".to_string()),
            timeout_secs: Some(5),
            ..GatewayOverrides::default()
        };
        let config = GatewayConfig::resolve(
            &overrides,
            env_from(&[
                ("FLOATCHAT_MODEL", "env-model"),
                ("FLOATCHAT_TIMEOUT_SECS", "90"),
                ("FLOATCHAT_API_BASE", "http://localhost:8080/v1/"),
                ("FLOATCHAT_MAX_RETRIES", "2"),
                ("OPENAI_API_KEY", " test-key "),
            ]),
        )
        .expect("config should resolve");

        assert_eq!(config.model, "flag-model");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
    }

    #[test]
    fn gateway_debug_output_hides_api_key() {
        let config = GatewayConfig::resolve(
            &GatewayOverrides::default(),
            env_from(&[("OPENAI_API_KEY", "very-private-value")]),
        )
        .expect("config should resolve");

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-private-value"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn gateway_rejects_malformed_numbers() {
        let err = GatewayConfig::resolve(
            &GatewayOverrides::default(),
            env_from(&[("FLOATCHAT_TIMEOUT_SECS", "soon")]),
        )
        .expect_err("non-numeric timeout must fail");
        assert!(err.to_string().contains("FLOATCHAT_TIMEOUT_SECS"));
    }

    #[test]
    fn store_prefers_flag_then_environment_then_default() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"), None)
            .expect("paths should resolve");

        let from_flag = StoreConfig::resolve(
            &paths,
            Some(Path::new("local.sqlite")),
            env_from(&[("FLOATCHAT_DATABASE", "/srv/argo.sqlite")]),
        )
        .expect("flag should resolve");
        assert_eq!(from_flag.database_path, Path::new("/work/repo/local.sqlite"));

        let from_env = StoreConfig::resolve(
            &paths,
            None,
            env_from(&[
                ("FLOATCHAT_DATABASE", "~/argo.sqlite"),
                ("FLOATCHAT_ROW_CEILING", "250"),
            ]),
        )
        .expect("env should resolve");
        assert_eq!(from_env.database_path, Path::new("/home/tester/argo.sqlite"));
        assert_eq!(from_env.row_ceiling, 250);

        let from_default =
            StoreConfig::resolve(&paths, None, env_from(&[])).expect("default should resolve");
        assert_eq!(
            from_default.database_path,
            Path::new("/home/tester/.floatchat/argo_floats.sqlite")
        );
        assert_eq!(from_default.row_ceiling, DEFAULT_ROW_CEILING);
    }

    #[test]
    fn store_rejects_zero_row_ceiling() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"), None)
            .expect("paths should resolve");
        assert!(
            StoreConfig::resolve(&paths, None, env_from(&[("FLOATCHAT_ROW_CEILING", "0")]))
                .is_err()
        );
    }
}
