//! Battle configuration loader.

use std::path::Path;

use anyhow::Context;
use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("failed to parse config TOML {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let config = ConfigLoader::parse("worker_threads = 3\n").expect("parse");
        assert_eq!(config.worker_threads, Some(3));
        assert_eq!(config.turn_order_rounds, BattleConfig::DEFAULT_TURN_ORDER_ROUNDS);
        assert_eq!(config.max_turn_order_units, None);
    }

    #[test]
    fn load_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "turn_order_rounds = \"two\"").expect("write");
        let err = ConfigLoader::load(file.path()).expect_err("bad type");
        assert!(format!("{err:#}").contains(&file.path().display().to_string()));

        let missing = file.path().with_extension("absent");
        assert!(ConfigLoader::load(&missing).is_err());
    }
}
