use std::io;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

const DEV_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../../config");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    ConfigCompilation(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    IOError(#[from] io::Error),

    #[error("Expected '=' separator in config override '{0}'")]
    MalformedConfigOverride(String),
}

/// Directory holding the default configuration files.
///
/// An installed `/etc/gora` takes precedence over the development tree.
pub fn config_dir() -> PathBuf {
    let config_dir = PathBuf::from("/etc/gora/");
    if config_dir.exists() {
        config_dir
    } else {
        PathBuf::from(DEV_CONFIG_PATH)
    }
}

/// Settings assembled from three layers, each overriding the previous one:
///
/// 1. the files listed by `file_sources`, looked up in the configuration directory,
/// 2. environment variables `{ENV_PREFIX}__SECTION__KEY`,
/// 3. explicit `key=value` overrides (TOML syntax for the value).
pub trait StoreConfig<'a>: Deserialize<'a> {
    const ENV_PREFIX: &'static str;

    fn file_sources() -> Vec<&'static str> {
        vec![]
    }

    fn root_key() -> Option<&'static str> {
        None
    }

    fn get(overrides: &[String]) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        Self::get_from(&config_dir(), overrides)
    }

    fn get_from(dir: &Path, overrides: &[String]) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        let mut override_sources = vec![];
        for value in overrides {
            if !value.contains('=') {
                return Err(ConfigError::MalformedConfigOverride(value.clone()));
            }

            // "host='es.local'" -> "elasticsearch.host='es.local'"
            let value = match Self::root_key() {
                None => value.clone(),
                Some(key) => format!("{key}.{value}"),
            };

            override_sources.push(File::from_str(&value, FileFormat::Toml));
        }

        let file_sources: Vec<File<_, _>> = Self::file_sources()
            .iter()
            .map(|path| dir.join(path))
            .map(|path| File::from(path).required(false))
            .collect();

        let config = Config::builder()
            .add_source(file_sources)
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .prefix_separator("__"),
            )
            .add_source(override_sources)
            .build()?;

        match Self::root_key() {
            None => Ok(config.try_deserialize()?),
            Some(key) => Ok(config.get::<Self>(key)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use speculoos::prelude::*;

    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct TestSettings {
        foo: u32,
    }

    #[derive(Deserialize, Debug)]
    pub struct TestSettingsWithArray {
        foo: Vec<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct ServerSettings {
        host: String,
        port: u16,
    }

    impl StoreConfig<'_> for TestSettings {
        const ENV_PREFIX: &'static str = "STORE_CONFIG_TEST";
    }

    impl StoreConfig<'_> for TestSettingsWithArray {
        const ENV_PREFIX: &'static str = "STORE_CONFIG_TEST";
    }

    impl StoreConfig<'_> for ServerSettings {
        const ENV_PREFIX: &'static str = "STORE_CONFIG_SERVER";

        fn file_sources() -> Vec<&'static str> {
            vec!["server.toml"]
        }

        fn root_key() -> Option<&'static str> {
            Some("server")
        }
    }

    fn write_server_file(dir: &Path) -> anyhow::Result<()> {
        let mut file = std::fs::File::create(dir.join("server.toml"))?;
        writeln!(file, "[server]\nhost = \"localhost\"\nport = 9200")?;
        Ok(())
    }

    #[test]
    fn should_correctly_create_a_source_from_int_assignment() -> anyhow::Result<()> {
        let overrides = vec!["foo=42".to_string()];
        let config = TestSettings::get(&overrides)?;
        assert_that!(config).map(|c| &c.foo).is_equal_to(42);
        Ok(())
    }

    #[test]
    fn should_correctly_create_a_source_from_array_assignment() -> anyhow::Result<()> {
        let overrides = vec![String::from("foo=[ 'fr','en' ]")];
        let config = TestSettingsWithArray::get(&overrides)?;
        assert_that!(config)
            .map(|c| &c.foo)
            .is_equal_to(vec!["fr".to_string(), "en".to_string()]);
        Ok(())
    }

    #[test]
    fn should_read_defaults_from_config_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_server_file(dir.path())?;

        let config = ServerSettings::get_from(dir.path(), &[])?;

        assert_that!(config.host.as_str()).is_equal_to("localhost");
        assert_that!(config.port).is_equal_to(9200);
        Ok(())
    }

    #[test]
    fn should_prefer_overrides_to_file_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_server_file(dir.path())?;

        let overrides = vec![String::from("host='es.internal'")];
        let config = ServerSettings::get_from(dir.path(), &overrides)?;

        assert_that!(config.host.as_str()).is_equal_to("es.internal");
        assert_that!(config.port).is_equal_to(9200);
        Ok(())
    }

    #[test]
    #[serial]
    fn should_layer_environment_between_files_and_overrides() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_server_file(dir.path())?;

        std::env::set_var("STORE_CONFIG_SERVER__SERVER__PORT", "9300");
        std::env::set_var("STORE_CONFIG_SERVER__SERVER__HOST", "from-env");
        let overrides = vec![String::from("host='from-override'")];
        let config = ServerSettings::get_from(dir.path(), &overrides);
        std::env::remove_var("STORE_CONFIG_SERVER__SERVER__PORT");
        std::env::remove_var("STORE_CONFIG_SERVER__SERVER__HOST");

        let config = config?;
        assert_that!(config.host.as_str()).is_equal_to("from-override");
        assert_that!(config.port).is_equal_to(9300);
        Ok(())
    }

    #[test]
    fn should_reject_override_without_separator() {
        let overrides = vec![String::from("foo")];
        let res = TestSettings::get(&overrides);
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::MalformedConfigOverride(_)));
    }
}
