// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use sawit_app::ViewKind;
use sawit_data::{DEFAULT_RANDOM_PLOTS, DEFAULT_SEED, DataOrigin};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "sawit";
const CONFIG_VERSION: i64 = 1;
const MAX_PLOTS: i64 = 500;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    pub source: Option<String>,
    pub seed: Option<i64>,
    pub plots: Option<i64>,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            source: Some("fixed".to_owned()),
            seed: Some(DEFAULT_SEED as i64),
            plots: Some(DEFAULT_RANDOM_PLOTS as i64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_view: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_view: Some(ViewKind::Dashboard.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub dir: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SAWIT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SAWIT_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [data], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(source) = &self.data.source
            && !matches!(source.as_str(), "fixed" | "random")
        {
            bail!(
                "data.source in {} must be \"fixed\" or \"random\", got {:?}",
                path.display(),
                source
            );
        }

        if let Some(seed) = self.data.seed
            && seed < 0
        {
            bail!(
                "data.seed in {} must be non-negative, got {}",
                path.display(),
                seed
            );
        }

        if let Some(plots) = self.data.plots
            && !(1..=MAX_PLOTS).contains(&plots)
        {
            bail!(
                "data.plots in {} must be between 1 and {MAX_PLOTS}, got {}",
                path.display(),
                plots
            );
        }

        if let Some(view) = &self.ui.start_view
            && ViewKind::parse(view).is_none()
        {
            bail!(
                "ui.start_view in {} must be one of dashboard, input, monitoring; got {:?}",
                path.display(),
                view
            );
        }

        if let Some(level) = &self.log.level {
            crate::logging::parse_filter(level)
                .with_context(|| format!("log.level in {} is not a valid filter", path.display()))?;
        }

        Ok(())
    }

    pub fn data_origin(&self) -> DataOrigin {
        match self.data.source.as_deref() {
            Some("random") => DataOrigin::Random {
                seed: self.seed(),
                plots: self.plots(),
            },
            _ => DataOrigin::Fixed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.data
            .seed
            .and_then(|seed| u64::try_from(seed).ok())
            .unwrap_or(DEFAULT_SEED)
    }

    pub fn plots(&self) -> usize {
        self.data
            .plots
            .and_then(|plots| usize::try_from(plots).ok())
            .unwrap_or(DEFAULT_RANDOM_PLOTS)
    }

    pub fn start_view(&self) -> ViewKind {
        self.ui
            .start_view
            .as_deref()
            .and_then(ViewKind::parse)
            .unwrap_or(ViewKind::Dashboard)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.log.dir {
            return Ok(PathBuf::from(dir));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].dir in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("logs"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# sawit config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# \"fixed\" shows the three reference plots; \"random\" draws seeded data\nsource = \"fixed\"\nseed = {}\nplots = {}\n\n[ui]\n# dashboard | input | monitoring\nstart_view = \"dashboard\"\n\n[log]\n# Overridden by SAWIT_LOG\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/sawit/logs)\n# dir = \"/absolute/path/to/logs\"\n",
            path.display(),
            DEFAULT_SEED,
            DEFAULT_RANDOM_PLOTS,
            DEFAULT_LOG_LEVEL,
        )
    }
}
