//! File generators for aifabrix.
//!
//! Everything the CLI writes to disk is assembled here: Dockerfiles,
//! docker-compose files, env templates, READMEs, `variables.yaml` and
//! the starter application sources for `aifabrix create`.

pub mod docker;
pub mod templates;
pub mod variables;

pub use docker::{generate_compose, generate_dockerfile};
pub use templates::{generate_env_template, generate_readme};
pub use variables::generate_variables_yaml;

use aifabrix_schema::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Scaffold a new application directory: `variables.yaml`, Dockerfile,
/// env template, README and the starter sources for the language.
pub fn scaffold_app(config: &AppConfig, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    std::fs::write(dir.join("variables.yaml"), config.to_yaml()?)?;
    std::fs::write(dir.join("Dockerfile"), generate_dockerfile(config)?)?;
    std::fs::write(dir.join("env.template"), generate_env_template(config)?)?;
    std::fs::write(dir.join("README.md"), generate_readme(config)?)?;

    match config.app.language.as_str() {
        "python" => {
            std::fs::write(dir.join("main.py"), templates::PYTHON_MAIN)?;
            std::fs::write(dir.join("requirements.txt"), templates::PYTHON_REQUIREMENTS)?;
        }
        "node" => {
            std::fs::write(dir.join("server.js"), templates::NODE_SERVER)?;
            std::fs::write(dir.join("package.json"), templates::NODE_PACKAGE_JSON)?;
        }
        other => {
            info!("no starter sources for language '{}'", other);
        }
    }

    info!("scaffolded {} in {}", config.app.name, dir.display());
    Ok(())
}
