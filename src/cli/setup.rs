use crate::core::config::AppConfig;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::info;

/// Example configuration shipped with the binary.
pub const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the example configuration to the default location and returns its path.
pub fn setup(force: bool) -> Result<PathBuf> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(&path, force)?;
    Ok(path)
}

/// Writes the example configuration to `path`. An existing file is kept unless `force` is set.
pub fn setup_at_path<P: AsRef<Path>>(path: P, force: bool) -> Result<()> {
    let path = path.as_ref();
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}, use --force to overwrite it",
            path.display()
        );
    }

    let config: AppConfig =
        serde_yaml::from_str(EXAMPLE_CONFIG).context("Bundled example configuration is invalid")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!(
        path = %path.display(),
        bind = %config.server.bind,
        local_currency = %config.local_currency,
        "Created configuration"
    );
    Ok(())
}
