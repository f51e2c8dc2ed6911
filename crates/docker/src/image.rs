//! Image build and registry push.

use crate::process::{az, docker};
use crate::ensure_docker;
use aifabrix_common::{Error, Result};
use aifabrix_schema::AppConfig;
use std::path::Path;
use tracing::info;

/// Build the application image from the app directory.
pub fn build_app(config: &AppConfig, dir: &Path) -> Result<String> {
    ensure_docker()?;

    let image = config.image_name();
    if !dir.join("Dockerfile").exists() {
        return Err(Error::MissingFile(
            dir.join("Dockerfile").display().to_string(),
        ));
    }

    info!("building {}", image);
    docker(&["build", "-t", &image, "."], Some(dir))?.require_success("docker build")?;
    Ok(image)
}

/// Push a built image to an Azure container registry.
///
/// Logs in via `az acr login` first; the az CLI owns the credential
/// handshake with docker.
pub fn push_image(image: &str, registry: &str) -> Result<String> {
    ensure_docker()?;
    if which::which("az").is_err() {
        return Err(Error::CommandExecution {
            cmd: "az".to_string(),
            reason: "Azure CLI not found on PATH".to_string(),
        });
    }

    az(&["acr", "login", "--name", registry])?.require_success("az acr login")?;

    let remote = format!("{}.azurecr.io/{}", registry, image);
    docker(&["tag", image, &remote], None)?.require_success("docker tag")?;

    info!("pushing {}", remote);
    let push = docker(&["push", &remote], None)?;
    if !push.success() {
        if push.stderr.contains("No such image") {
            return Err(Error::ImageMissing {
                image: image.to_string(),
            });
        }
        return push.require_success("docker push").map(|_| remote);
    }
    Ok(remote)
}
