use std::{io::ErrorKind, path::PathBuf};

use berth_core::Config;
use eyre::{Result, WrapErr};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSettings {
    #[serde(skip)]
    #[allow(unused)]
    pub project_root: Option<PathBuf>,

    /// Number of worker threads serving the mock API
    #[serde(default = "default_workers")]
    pub workers: u16,

    /// Engine configuration used unless a test overrides it
    #[serde(default)]
    pub config: Config,
}

fn default_workers() -> u16 {
    2
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            project_root: None,
            workers: default_workers(),
            config: Config::default(),
        }
    }
}

impl ProjectSettings {
    /// Look for a `berth.toml` in the current directory and its ancestors
    ///
    /// Falls back to the defaults if there is none. `BERTH_SEED` and
    /// `BERTH_WORKERS` take precedence over the file.
    pub fn load() -> Result<Self> {
        let mut path = std::env::current_dir()?;
        let contents = loop {
            path.push("berth.toml");

            match std::fs::read_to_string(&path) {
                Ok(s) => break Some(s),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            path.pop();
            if !path.pop() {
                break None;
            }
        };

        let mut settings = match contents {
            Some(contents) => {
                let mut settings: ProjectSettings = toml::from_str(&contents)
                    .wrap_err_with(|| format!("invalid settings in {}", path.display()))?;
                path.pop();
                settings.project_root = Some(path);
                settings
            }
            None => ProjectSettings::default(),
        };

        if let Ok(v) = std::env::var("BERTH_SEED") {
            settings.config.seed = Some(v.parse().wrap_err("BERTH_SEED takes a decimal u64")?);
        }
        if let Ok(v) = std::env::var("BERTH_WORKERS") {
            settings.workers = v.parse().wrap_err("BERTH_WORKERS takes a decimal u16")?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_overrides_defaults() {
        let settings: ProjectSettings = toml::from_str(
            r#"
            workers = 4

            [config]
            seed = 7
            restamp-on-promotion = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.config.seed, Some(7));
        assert!(!settings.config.restamp_on_promotion);
        assert!(!settings.config.children_hold_confirmed);
        assert_eq!(settings.config.lock_timeout_ms, Config::default().lock_timeout_ms);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let settings: ProjectSettings = toml::from_str("").unwrap();
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.config, Config::default());
    }
}
