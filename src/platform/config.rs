//! `stackfuzz.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{StackfuzzError, StackfuzzResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MachineConfig {
    /// Maximum number of random programs tried by the search.
    #[serde(default = "default_n_iters")]
    pub n_iters: usize,

    /// Maximum number of steps in one generated program.
    #[serde(default = "default_prog_length")]
    pub prog_length: usize,

    /// Stop searching once this many trials have failed.
    #[serde(default = "default_good_enough")]
    pub good_enough: usize,

    /// Seed for the run's RNG. Drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Only count failures that still reproduce once the failing program is
    /// pruned to operations whose preconditions held.
    #[serde(default = "default_legal_failures_only")]
    pub legal_failures_only: bool,
}

fn default_n_iters() -> usize {
    500
}

fn default_prog_length() -> usize {
    200
}

fn default_good_enough() -> usize {
    10
}

fn default_legal_failures_only() -> bool {
    true
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            n_iters: default_n_iters(),
            prog_length: default_prog_length(),
            good_enough: default_good_enough(),
            seed: None,
            legal_failures_only: default_legal_failures_only(),
        }
    }
}

impl MachineConfig {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<MachineConfig>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> StackfuzzResult<()> {
        for (field, value) in [
            ("n_iters", self.n_iters),
            ("prog_length", self.prog_length),
            ("good_enough", self.good_enough),
        ] {
            if value == 0 {
                return Err(StackfuzzError::InvalidArgument(format!(
                    "{field} must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: MachineConfig = toml::from_str("n_iters = 5\nseed = 9\n").unwrap();
        assert_eq!(cfg.n_iters, 5);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.prog_length, 200);
        assert_eq!(cfg.good_enough, 10);
        assert!(cfg.legal_failures_only);
    }

    #[test]
    fn missing_or_broken_config_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("stackfuzz-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        assert_eq!(
            MachineConfig::load_optional(&dir.join("absent.toml")),
            MachineConfig::default()
        );

        let broken = dir.join("broken.toml");
        std::fs::write(&broken, "n_iters = \"many\"").expect("write config");
        assert_eq!(MachineConfig::load_optional(&broken), MachineConfig::default());

        let good = dir.join("good.toml");
        std::fs::write(&good, "prog_length = 12\nlegal_failures_only = false\n")
            .expect("write config");
        let cfg = MachineConfig::load_optional(&good);
        assert_eq!(cfg.prog_length, 12);
        assert!(!cfg.legal_failures_only);
    }

    #[test]
    fn zero_bounds_are_rejected() {
        assert!(MachineConfig::default().validate().is_ok());
        let cfg = MachineConfig {
            prog_length: 0,
            ..MachineConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: prog_length must be at least 1");
    }
}
