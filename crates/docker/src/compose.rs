//! Compose lifecycle: run, stop, health polling.

use crate::process::docker;
use crate::{check_port_free, ensure_docker};
use aifabrix_common::{Error, Result};
use aifabrix_schema::AppConfig;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How long to wait for the app container to report healthy.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Start an application with docker compose.
///
/// Writes the generated compose file into the app directory, checks the
/// published port is free before any container is started, brings the
/// stack up and waits until the app container reports healthy.
pub async fn run_app(config: &AppConfig, dir: &Path, port_override: Option<u16>) -> Result<()> {
    ensure_docker()?;

    let published = port_override.unwrap_or(config.app.port);
    check_port_free(published)?;

    let compose = aifabrix_scaffold::generate_compose(config, port_override)
        .map_err(|e| Error::Other(e.to_string()))?;
    std::fs::write(dir.join("docker-compose.yaml"), compose)?;

    // compose references .env; seed it from the template on first run
    let env_file = dir.join(".env");
    if !env_file.exists() {
        let template = dir.join("env.template");
        if template.exists() {
            std::fs::copy(&template, &env_file)?;
        } else {
            std::fs::write(&env_file, "")?;
        }
    }

    info!("starting {} on port {}", config.app.name, published);
    docker(
        &["compose", "up", "-d", "--build", "--wait"],
        Some(dir),
    )?
    .require_success("docker compose up")?;

    wait_healthy(&config.app.name, HEALTH_TIMEOUT).await?;
    info!("{} is healthy", config.app.name);
    Ok(())
}

/// Stop an application and its backing services.
pub async fn stop_app(dir: &Path) -> Result<()> {
    ensure_docker()?;
    docker(&["compose", "down"], Some(dir))?.require_success("docker compose down")?;
    Ok(())
}

/// Poll `docker inspect` until the container reports healthy.
pub async fn wait_healthy(container: &str, timeout: Duration) -> Result<()> {
    let deadline = std::time::Instant::now() + timeout;

    loop {
        let status = health_status(container)?;
        debug!("{} health: {}", container, status);
        match status.as_str() {
            "healthy" => return Ok(()),
            "unhealthy" => {
                return Err(Error::Other(format!(
                    "Container {} reported unhealthy",
                    container
                )))
            }
            _ => {}
        }

        if std::time::Instant::now() >= deadline {
            return Err(Error::Other(format!(
                "Timed out waiting for {} to become healthy",
                container
            )));
        }
        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
    }
}

fn health_status(container: &str) -> Result<String> {
    let output = docker(
        &[
            "inspect",
            "--format",
            "{{.State.Health.Status}}",
            container,
        ],
        None,
    )?;
    if !output.success() {
        return Err(Error::Other(format!(
            "docker inspect failed for {}: {}",
            container,
            output.stderr.trim()
        )));
    }
    Ok(parse_health_status(&output.stdout))
}

/// Extract the status token from inspect output; some shells wrap it in
/// quotes.
pub(crate) fn parse_health_status(stdout: &str) -> String {
    let re = Regex::new(r"[a-z]+").expect("static regex");
    re.find(stdout.trim())
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| stdout.trim().to_string())
}
