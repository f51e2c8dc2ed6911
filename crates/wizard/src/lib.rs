//! External-system wizard.
//!
//! Turns a source (OpenAPI document, MCP server, known platform) into a
//! deployable system/datasource configuration by walking a linear
//! sequence of dataplane-backed steps and materializing the result as
//! local files.

pub mod prompts;
pub mod save;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use prompts::{Prompter, StdinPrompter};
pub use save::{save_files, SavedFiles};
pub use session::{
    GeneratedConfig, SourceSelection, UserPreferences, WizardMode, WizardSession,
};

use aifabrix_client::{AuthConfig, DataplaneApi};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Inputs for one wizard run. Anything left as `None` is prompted for.
#[derive(Debug, Clone)]
pub struct WizardOptions {
    pub mode: WizardMode,
    /// Existing system key, required when adding a datasource.
    pub system: Option<String>,
    pub source: Option<SourceSelection>,
    pub credential: Option<String>,
    pub preferences: UserPreferences,
    pub intent: Option<String>,
    /// Project root the `integration/` tree is created under.
    pub root: PathBuf,
}

/// Run the wizard end to end and return the files it wrote.
pub async fn run_wizard(
    api: &dyn DataplaneApi,
    auth: &AuthConfig,
    options: WizardOptions,
    prompter: &mut dyn Prompter,
) -> Result<SavedFiles> {
    let mut wizard_session =
        session::start_session(api, auth, options.mode, options.system.as_deref()).await?;

    let source = match options.source {
        Some(source) => source,
        None => prompt_source(prompter)?,
    };

    println!("{} {}", "Source:".bold(), source.source_type());
    session::select_source(api, auth, &mut wizard_session, &source).await?;
    session::parse_source(api, auth, &wizard_session, &source).await?;

    session::resolve_credential(api, auth, &wizard_session, options.credential, prompter)
        .await?;

    session::detect_types(api, auth, &wizard_session).await?;

    let generated = session::generate_configuration(
        api,
        auth,
        &wizard_session,
        options.preferences,
        options.intent.as_deref(),
    )
    .await?;
    println!(
        "Generated system '{}' with {} datasource(s)",
        generated.system.key,
        generated.datasources.len()
    );

    let validation =
        session::validate_configuration(api, auth, &wizard_session, &generated).await?;
    for warning in &validation.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    let saved = save::save_files(api, auth, &generated, &options.root).await?;
    println!(
        "{} configuration written to {}",
        "Done:".green().bold(),
        saved.dir.display()
    );
    Ok(saved)
}

fn prompt_source(prompter: &mut dyn Prompter) -> Result<SourceSelection> {
    println!("Select a source:");
    println!("  1) OpenAPI file");
    println!("  2) OpenAPI URL");
    println!("  3) MCP server");
    println!("  4) Known platform");

    loop {
        let choice = prompter.line("Choice [1-4]: ")?;
        let selection = match choice.as_str() {
            "1" => SourceSelection::OpenapiFile(prompter.line("Path to OpenAPI file: ")?.into()),
            "2" => SourceSelection::OpenapiUrl(prompter.line("OpenAPI URL: ")?),
            "3" => SourceSelection::McpServer(prompter.line("MCP server URL: ")?),
            "4" => SourceSelection::KnownPlatform(prompter.line("Platform name: ")?),
            _ => {
                println!("Enter a number between 1 and 4");
                continue;
            }
        };
        return Ok(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ScriptedPrompter;
    use crate::testutil::MockDataplane;

    #[tokio::test]
    async fn test_full_run_with_known_platform() {
        let api = MockDataplane::new();
        let auth = AuthConfig::bearer("at");
        let root = tempfile::tempdir().unwrap();
        // credential prompt: skip
        let mut prompter = ScriptedPrompter::new(&[""]);

        let options = WizardOptions {
            mode: WizardMode::CreateSystem,
            system: None,
            source: Some(SourceSelection::KnownPlatform("hubspot".to_string())),
            credential: None,
            preferences: UserPreferences::default(),
            intent: Some("sync contacts".to_string()),
            root: root.path().to_path_buf(),
        };

        let saved = run_wizard(&api, &auth, options, &mut prompter).await.unwrap();
        assert!(saved.system_file.ends_with("crm-deploy.json"));

        // linear order, no parse step for a known platform
        let calls = api.calls();
        assert_eq!(calls[0], "create_session create-system");
        assert_eq!(calls[1], "select_source known-platform");
        assert_eq!(calls[2], "detect_types");
        assert_eq!(calls[3], "generate_configuration");
        assert_eq!(calls[4], "validate_configuration");
    }

    #[tokio::test]
    async fn test_source_prompted_when_not_given() {
        let api = MockDataplane::new();
        let auth = AuthConfig::bearer("at");
        let root = tempfile::tempdir().unwrap();
        // choice 4 (known platform), platform name, then credential skip
        let mut prompter = ScriptedPrompter::new(&["4", "hubspot", ""]);

        let options = WizardOptions {
            mode: WizardMode::CreateSystem,
            system: None,
            source: None,
            credential: None,
            preferences: UserPreferences::default(),
            intent: None,
            root: root.path().to_path_buf(),
        };

        run_wizard(&api, &auth, options, &mut prompter).await.unwrap();
        assert!(api
            .calls()
            .contains(&"select_source known-platform".to_string()));
    }
}
