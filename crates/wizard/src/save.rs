//! File materialization for generated configurations.

use crate::session::GeneratedConfig;
use aifabrix_client::{AuthConfig, DataplaneApi};
use aifabrix_common::paths;
use aifabrix_schema::AppConfig;
use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything the save step wrote.
#[derive(Debug, Clone)]
pub struct SavedFiles {
    pub dir: PathBuf,
    pub application_yaml: PathBuf,
    pub system_file: PathBuf,
    pub datasource_files: Vec<PathBuf>,
    /// None when both README sources failed; the save still succeeds.
    pub readme: Option<PathBuf>,
}

/// Write the generated configuration under `integration/<systemKey>/`.
///
/// The README is fetched last and is allowed to fail: first the
/// just-written files are posted to the deployment-docs endpoint, then
/// the generic docs endpoint is tried, and if both fail no README is
/// written.
pub async fn save_files(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    generated: &GeneratedConfig,
    root: &Path,
) -> Result<SavedFiles> {
    let system_key = generated.system.key.clone();
    let dir = paths::integration_dir(root, &system_key);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let application_yaml = dir.join("application.yaml");
    let yaml = aifabrix_scaffold::generate_variables_yaml(
        &system_key,
        &generated.system,
        &generated.datasources,
    )?;
    std::fs::write(&application_yaml, &yaml)?;

    let system_file = dir.join(paths::system_file_name(&system_key));
    std::fs::write(
        &system_file,
        serde_json::to_string_pretty(&generated.system)?,
    )?;

    let mut datasource_files = Vec::new();
    for datasource in &generated.datasources {
        let path = dir.join(paths::datasource_file_name(&system_key, &datasource.key));
        std::fs::write(&path, serde_json::to_string_pretty(datasource)?)?;
        datasource_files.push(path);
    }

    let app_config = AppConfig::from_yaml(&yaml)?;
    std::fs::write(
        dir.join("env.template"),
        aifabrix_scaffold::generate_env_template(&app_config)?,
    )?;

    let readme = fetch_readme(api, auth, &system_key, &dir).await;
    if let Some(path) = &readme {
        info!("wrote {}", path.display());
    }

    Ok(SavedFiles {
        dir,
        application_yaml,
        system_file,
        datasource_files,
        readme,
    })
}

async fn fetch_readme(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    system_key: &str,
    dir: &Path,
) -> Option<PathBuf> {
    let readme_path = dir.join("README.md");

    match docs_from_files(api, auth, system_key, dir).await {
        Ok(markdown) => {
            if std::fs::write(&readme_path, markdown).is_ok() {
                return Some(readme_path);
            }
        }
        Err(e) => warn!("deployment docs from configuration failed: {:#}", e),
    }

    match api.deployment_docs(system_key, auth).await {
        Ok(markdown) => {
            if std::fs::write(&readme_path, markdown).is_ok() {
                return Some(readme_path);
            }
            None
        }
        Err(e) => {
            warn!("deployment docs fallback failed: {}; skipping README", e);
            None
        }
    }
}

/// Read the just-written files back and ask the dataplane for docs
/// generated from them.
async fn docs_from_files(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    system_key: &str,
    dir: &Path,
) -> Result<String> {
    let application_yaml = std::fs::read_to_string(dir.join("application.yaml"))?;
    let system_json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
        dir.join(paths::system_file_name(system_key)),
    )?)?;

    let files = json!({
        "applicationYaml": application_yaml,
        "system": system_json,
    });
    Ok(api.deployment_docs_for(system_key, &files, auth).await?)
}
