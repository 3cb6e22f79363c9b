use std::path::{Path, PathBuf};

pub const API_PATH: &str = "/client/api";

pub const ENV_API_KEY: &str = "IDCF_COMPUTE_API_KEY";
pub const ENV_SECRET_KEY: &str = "IDCF_COMPUTE_SECRET_KEY";
pub const ENV_HOST: &str = "IDCF_COMPUTE_HOST";
pub const ENV_SSH_KEY_FILE: &str = "IDCF_SSH_KEY_FILE";

/// Account credentials and SSH key location, built once per run from the
/// environment and passed by reference from there on.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub secret_key: String,
    pub host: String,
    pub ssh_key_file: String,
    pub ssh_key_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Config, Box<dyn std::error::Error>> {
        Config::resolve(
            |name| std::env::var(name).ok(),
            dirs::home_dir(),
            |path| path.exists(),
        )
    }

    fn resolve(
        get: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
        exists: impl Fn(&Path) -> bool,
    ) -> Result<Config, Box<dyn std::error::Error>> {
        let api_key = require(&get, ENV_API_KEY)?;
        let secret_key = require(&get, ENV_SECRET_KEY)?;
        let host = require(&get, ENV_HOST)?;
        let ssh_key_file = require(&get, ENV_SSH_KEY_FILE)?;

        let home = home.ok_or("could not determine home directory")?;
        let ssh_key_path = home.join(".ssh").join(&ssh_key_file);
        if !exists(&ssh_key_path) {
            return Err(format!("{} is not found", ssh_key_path.display()).into());
        }

        Ok(Config {
            api_key,
            secret_key,
            host,
            ssh_key_file,
            ssh_key_path,
        })
    }
}

fn require(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    match get(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("please set {} in your environment", name).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_API_KEY, "AK"),
            (ENV_SECRET_KEY, "SK"),
            (ENV_HOST, "compute.example.jp"),
            (ENV_SSH_KEY_FILE, "idcf.pem"),
        ])
    }

    fn resolve_with(
        env: HashMap<&'static str, &'static str>,
        key_exists: bool,
    ) -> Result<Config, Box<dyn std::error::Error>> {
        Config::resolve(
            move |name| env.get(name).map(|v| v.to_string()),
            Some(PathBuf::from("/home/alice")),
            move |_| key_exists,
        )
    }

    #[test]
    fn resolves_all_values() {
        let config = resolve_with(full_env(), true).unwrap();
        assert_eq!(config.api_key, "AK");
        assert_eq!(config.host, "compute.example.jp");
        assert_eq!(
            config.ssh_key_path,
            PathBuf::from("/home/alice/.ssh/idcf.pem")
        );
    }

    #[test]
    fn each_missing_variable_is_named() {
        for var in [ENV_API_KEY, ENV_SECRET_KEY, ENV_HOST, ENV_SSH_KEY_FILE] {
            let mut env = full_env();
            env.remove(var);
            let err = resolve_with(env, true).unwrap_err();
            assert!(err.to_string().contains(var), "error should name {}", var);
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert(ENV_API_KEY, "");
        let err = resolve_with(env, true).unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn missing_key_file_names_resolved_path() {
        let err = resolve_with(full_env(), false).unwrap_err();
        assert!(err.to_string().contains("/home/alice/.ssh/idcf.pem"));
    }
}
