//! Controller and dataplane URL resolution.

use crate::auth::AuthConfig;
use crate::config::CliConfig;
use crate::controller::ControllerClient;
use crate::api::ApiError;
use tracing::debug;

/// Resolve the controller URL. Priority, first match wins: explicit
/// override (CLI flag), config file value, controller recorded on the
/// stored device token, developer-slot localhost default.
pub fn resolve_controller_url(config: &CliConfig, override_url: Option<&str>) -> String {
    let url = if let Some(explicit) = override_url {
        explicit.to_string()
    } else if let Some(configured) = &config.controller {
        configured.clone()
    } else if let Some(token) = &config.device_token {
        token.controller.clone()
    } else {
        format!("http://localhost:{}", 3000 + config.developer_id as u32 * 100)
    };
    url.trim_end_matches('/').to_string()
}

/// Resolve the dataplane URL for an environment. An explicit override is
/// used as-is with no discovery call; otherwise the controller is asked
/// and its error, if any, is surfaced verbatim.
pub async fn resolve_dataplane_url(
    controller: &ControllerClient,
    environment: &str,
    auth: &AuthConfig,
    override_url: Option<&str>,
) -> Result<String, ApiError> {
    if let Some(explicit) = override_url {
        debug!("using explicit dataplane {}", explicit);
        return Ok(explicit.trim_end_matches('/').to_string());
    }
    let url = controller.dataplane_url(environment, auth).await?;
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceToken;
    use chrono::{Duration, Utc};

    fn config_with_token(controller: &str) -> CliConfig {
        CliConfig {
            device_token: Some(DeviceToken {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                controller: controller.to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_override_wins() {
        let mut config = config_with_token("https://b");
        config.controller = Some("https://a".to_string());
        assert_eq!(
            resolve_controller_url(&config, Some("https://flag/")),
            "https://flag"
        );
    }

    #[test]
    fn test_config_wins_over_device_token() {
        let mut config = config_with_token("https://b");
        config.controller = Some("https://a".to_string());
        assert_eq!(resolve_controller_url(&config, None), "https://a");
    }

    #[test]
    fn test_device_token_controller_used() {
        let config = config_with_token("https://b/");
        assert_eq!(resolve_controller_url(&config, None), "https://b");
    }

    #[test]
    fn test_developer_default() {
        let config = CliConfig {
            developer_id: 2,
            ..Default::default()
        };
        assert_eq!(resolve_controller_url(&config, None), "http://localhost:3200");
    }

    #[test]
    fn test_developer_zero_default() {
        let config = CliConfig::default();
        assert_eq!(resolve_controller_url(&config, None), "http://localhost:3000");
    }
}
