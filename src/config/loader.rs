use std::path::{Path, PathBuf};
use tracing::debug;

use super::RemediationConfig;
use crate::error::{RemediationError, RemediationResult};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "REMEDIATION_CONFIG";

/// Finds, parses and overrides the remediation configuration.
///
/// Precedence (highest to lowest):
/// 1. Environment variables
/// 2. Config file (`$REMEDIATION_CONFIG`, `./remediation.toml`, `./config/remediation.toml`)
/// 3. Default values
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            search_paths.push(PathBuf::from(path));
        }
        search_paths.push(PathBuf::from("./remediation.toml"));
        search_paths.push(PathBuf::from("./config/remediation.toml"));
        Self { search_paths }
    }

    /// Loader that only considers the given paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn load(&self) -> RemediationResult<RemediationConfig> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as `load`, reading overrides through `lookup`
    pub fn load_with_env<F>(&self, lookup: F) -> RemediationResult<RemediationConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.find_config_file() {
            Some(path) => {
                debug!(path = %path.display(), "Loading remediation config");
                Self::load_from_file(&path)?
            }
            None => {
                debug!("No remediation config file found, using defaults");
                RemediationConfig::default()
            }
        };

        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        debug!(config = ?config, "Loaded remediation configuration");
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> RemediationResult<RemediationConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RemediationError::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RemediationError::Configuration(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.is_file())
            .cloned()
    }
}

fn apply_env_overrides<F>(config: &mut RemediationConfig, lookup: F) -> RemediationResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("REMEDIATION_API_URL") {
        config.api.base_url = url;
    }
    if let Some(timeout) = lookup("REMEDIATION_API_TIMEOUT_MS") {
        config.api.timeout_ms = parse_millis("REMEDIATION_API_TIMEOUT_MS", &timeout)?;
    }
    if let Some(token) = lookup("REMEDIATION_AUTH_TOKEN") {
        config.auth.bearer_token = Some(token);
    }
    if let Some(user_id) = lookup("REMEDIATION_USER_ID") {
        config.auth.user_id = user_id;
    }
    if let Some(role) = lookup("REMEDIATION_FALLBACK_ROLE") {
        config.auth.fallback_role = role;
    }
    if let Some(delay) = lookup("REMEDIATION_PACING_DELAY_MS") {
        config.execution.pacing_delay_ms = parse_millis("REMEDIATION_PACING_DELAY_MS", &delay)?;
    }
    if let Some(timeout) = lookup("REMEDIATION_GATEWAY_TIMEOUT_MS") {
        config.execution.gateway_timeout_ms =
            Some(parse_millis("REMEDIATION_GATEWAY_TIMEOUT_MS", &timeout)?);
    }
    if let Some(environment) = lookup("REMEDIATION_ENVIRONMENT") {
        config.execution.environment = environment;
    }
    Ok(())
}

fn parse_millis(name: &str, value: &str) -> RemediationResult<u64> {
    value.trim().parse().map_err(|_| {
        RemediationError::Configuration(format!("{name} must be a whole number of milliseconds, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_search_paths(vec![dir.path().join("missing.toml")]);
        let config = loader.load_with_env(no_env).unwrap();
        assert_eq!(config, RemediationConfig::default());
    }

    #[test]
    fn test_first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(&second, "[auth]\nuser_id = \"second\"\n").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![first.clone(), second.clone()]);
        assert_eq!(loader.load_with_env(no_env).unwrap().auth.user_id, "second");

        std::fs::write(&first, "[auth]\nuser_id = \"first\"\n").unwrap();
        assert_eq!(loader.load_with_env(no_env).unwrap().auth.user_id, "first");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://file:1\"\n[execution]\npacing_delay_ms = 20"
        )
        .unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            ("REMEDIATION_API_URL", "http://env:2"),
            ("REMEDIATION_AUTH_TOKEN", "Bearer a.b.c"),
            ("REMEDIATION_GATEWAY_TIMEOUT_MS", "2500"),
            ("REMEDIATION_FALLBACK_ROLE", "On Call"),
        ]);

        let loader = ConfigLoader::with_search_paths(vec![file.path().to_path_buf()]);
        let config = loader
            .load_with_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api.base_url, "http://env:2");
        assert_eq!(config.execution.pacing_delay_ms, 20);
        assert_eq!(config.execution.gateway_timeout_ms, Some(2500));
        assert_eq!(config.auth.raw_token(), "a.b.c");
        assert_eq!(config.auth.fallback_role, "On Call");
    }

    #[test]
    fn test_invalid_inputs_are_configuration_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();
        let loader = ConfigLoader::with_search_paths(vec![file.path().to_path_buf()]);
        assert!(matches!(
            loader.load_with_env(no_env),
            Err(RemediationError::Configuration(_))
        ));

        let loader = ConfigLoader::with_search_paths(vec![]);
        let result = loader.load_with_env(|name| {
            (name == "REMEDIATION_PACING_DELAY_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(RemediationError::Configuration(_))));

        let result = loader.load_with_env(|name| {
            (name == "REMEDIATION_GATEWAY_TIMEOUT_MS").then(|| "0".to_string())
        });
        assert!(result.is_err());
    }
}
