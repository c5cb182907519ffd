use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::convert::ConvertOptions;

/// Persisted project settings used by CLI workflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub input_path: Option<String>,
    pub output_prefix: Option<String>,
    pub options: ConvertOptions,
}

impl ProjectSettings {
    /// Input model and output prefix stored in the settings file.
    pub fn resolve_paths(&self) -> Result<(PathBuf, PathBuf)> {
        let Some(input) = self.input_path.as_deref() else {
            bail!("project settings do not name an input model (input_path)");
        };
        let Some(output) = self.output_prefix.as_deref() else {
            bail!("project settings do not name an output prefix (output_prefix)");
        };
        Ok((PathBuf::from(input), PathBuf::from(output)))
    }
}

/// Save project settings to a JSON file.
pub fn save_project_settings(path: &Path, settings: &ProjectSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize project settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save project settings: {}", path.display()))?;
    Ok(())
}

/// Load project settings from a JSON file.
pub fn load_project_settings(path: &Path) -> Result<ProjectSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load project settings: {}", path.display()))?;
    let settings: ProjectSettings =
        serde_json::from_str(&content).context("failed to parse project settings JSON")?;
    Ok(settings)
}
