// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "SAWIT_LOG";
const LOG_FILE: &str = "sawit.log";

/// `SAWIT_LOG` wins over the configured level when it is set and non-empty.
pub fn filter_directive(env_value: Option<String>, config_level: &str) -> String {
    env_value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| config_level.to_owned())
}

pub fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter {directive:?}"))
}

/// Logs go to a file because the terminal belongs to the dashboard.
pub fn init(log_dir: &Path, config_level: &str) -> Result<()> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), config_level);
    let filter = parse_filter(&directive).with_context(|| format!("check {LOG_ENV}"))?;

    fs::create_dir_all(log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;
    let appender = rolling::never(log_dir, LOG_FILE);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install log subscriber")?;

    tracing::debug!(
        dir = %log_dir.display(),
        filter = %directive,
        "logging initialized"
    );
    Ok(())
}
