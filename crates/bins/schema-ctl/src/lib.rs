/// This module contains the definition for schemactl command line arguments.
use std::env;
use std::path::{Path, PathBuf};

use elastic_client::errors::Result;
use elastic_client::StoreSettings;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[derive(Debug, clap::Parser)]
#[command(
name = "schemactl",
about = "Inspect Elasticsearch collections and check them against a mapping file",
version = VERSION,
author = AUTHORS
)]
pub struct Opts {
    /// Mapping file, overriding `mapping.file`
    #[arg(short = 'c', long = "mapping")]
    pub mapping: Option<PathBuf>,

    /// Check the mapping file against its grammar before reading it
    #[arg(long = "validate")]
    pub validate: bool,

    /// Override settings values using key=value
    #[arg(short = 's', long = "setting", num_args = 0..)]
    pub settings: Vec<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List the collections of the store
    Tables,
    /// Show the fields of a collection as found in the store
    Describe { collection: String },
    /// Read the mapping file and list the classes it maps
    CheckMapping,
    /// Compare every mapped collection with the store
    Verify,
    /// Create the index of every mapped class that does not exist yet
    Init,
    /// Print the settings
    Config,
}

impl Opts {
    /// Setting overrides given with `-s` and `--validate`, the latter last.
    pub fn overrides(&self) -> Vec<String> {
        let mut overrides = self.settings.clone();
        if self.validate {
            overrides.push("mapping.xsd_validation=true".to_string());
        }
        overrides
    }

    /// Loads the settings, a `-c` mapping path being resolved against `current_dir`.
    pub fn store_settings_in(&self, current_dir: &Path) -> Result<StoreSettings> {
        let mut settings = StoreSettings::load(&self.overrides())?;
        if let Some(mapping) = &self.mapping {
            settings.mapping.file = current_dir.join(mapping);
        }
        Ok(settings)
    }

    pub fn store_settings(&self) -> Result<StoreSettings> {
        let current_dir = env::current_dir().unwrap_or_default();
        self.store_settings_in(&current_dir)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use speculoos::prelude::*;

    use super::*;

    #[test]
    fn should_turn_flags_into_overrides() {
        let opts = Opts::try_parse_from([
            "schemactl",
            "-s",
            "elasticsearch.host='es'",
            "-c",
            "mapping.xml",
            "--validate",
            "verify",
        ])
        .expect("valid arguments");

        assert!(matches!(opts.cmd, Command::Verify));
        assert_that!(opts.overrides()).is_equal_to(vec![
            "elasticsearch.host='es'".to_string(),
            "mapping.xsd_validation=true".to_string(),
        ]);
    }

    #[test]
    fn should_resolve_mapping_path_against_working_directory() -> anyhow::Result<()> {
        let opts = Opts::try_parse_from(["schemactl", "-c", "mapping.xml", "--validate", "verify"])?;

        let settings = opts.store_settings_in(Path::new("/work/it's \"here\""))?;
        assert_that!(settings.mapping_path())
            .is_equal_to(Path::new("/work/it's \"here\"/mapping.xml"));
        assert_that!(settings.mapping.xsd_validation).is_true();
        Ok(())
    }

    #[test]
    fn should_keep_absolute_mapping_path() -> anyhow::Result<()> {
        let opts = Opts::try_parse_from(["schemactl", "-c", "/etc/gora/m.xml", "describe", "frontier"])?;

        assert!(matches!(&opts.cmd, Command::Describe { collection } if collection == "frontier"));
        let settings = opts.store_settings_in(Path::new("/work"))?;
        assert_that!(settings.mapping_path()).is_equal_to(Path::new("/etc/gora/m.xml"));
        Ok(())
    }

    #[test]
    fn should_require_a_subcommand() {
        assert_that!(Opts::try_parse_from(["schemactl"])).is_err();
    }
}
