//! AI Fabrix Builder - scaffold, run and deploy containerized apps and
//! external-system integrations.

use aifabrix_client::api::ApiError;
use aifabrix_client::config::{self, DeviceToken};
use aifabrix_client::resolve::{resolve_controller_url, resolve_dataplane_url};
use aifabrix_client::{auth, ControllerClient, DataplaneClient};
use aifabrix_schema::{AppConfig, AppSection, DatabaseSpec, RequiresSection};
use aifabrix_wizard::{SourceSelection, StdinPrompter, UserPreferences, WizardMode, WizardOptions};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "aifabrix")]
#[command(
    author,
    version,
    about = "Scaffold, build, run and deploy apps and external-system integrations"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP timeout for remote calls, in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to a controller and store the device token
    Login {
        /// Controller URL (defaults to the configured one)
        #[arg(long)]
        controller: Option<String>,

        /// Client id to authenticate with
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Remove the stored device token
    Logout,

    /// Scaffold a new application under builder/<app>
    Create {
        app: String,

        /// Runtime language (python, node)
        #[arg(long, default_value = "python")]
        language: String,

        #[arg(long, default_value = "3000")]
        port: u16,

        /// Include a postgres database
        #[arg(long)]
        database: bool,

        /// Include a redis instance
        #[arg(long)]
        redis: bool,
    },

    /// Build the application image
    Build {
        app: String,

        /// Azure container registry to push to after building
        #[arg(long)]
        registry: Option<String>,
    },

    /// Run the application with docker compose
    Run {
        app: String,

        /// Host port to publish instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },

    /// Stop the application
    Stop { app: String },

    /// Upload, validate and publish an external-system integration
    Deploy {
        app: String,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,

        /// Dataplane URL override; skips discovery
        #[arg(long)]
        dataplane: Option<String>,

        /// Skip server-side validation before publishing
        #[arg(long)]
        skip_validation: bool,

        /// Do not request MCP contract generation on publish
        #[arg(long)]
        no_mcp_contract: bool,
    },

    /// Scaffold an external-system integration interactively
    Wizard {
        /// create-system or add-datasource
        #[arg(long, default_value = "create-system")]
        mode: String,

        /// Existing system key when adding a datasource
        #[arg(long)]
        system: Option<String>,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,

        #[arg(long)]
        dataplane: Option<String>,

        /// OpenAPI document on disk
        #[arg(long, conflicts_with_all = ["openapi_url", "mcp_server", "platform"])]
        openapi_file: Option<PathBuf>,

        /// OpenAPI document by URL
        #[arg(long, conflicts_with_all = ["mcp_server", "platform"])]
        openapi_url: Option<String>,

        /// MCP server URL
        #[arg(long, conflicts_with = "platform")]
        mcp_server: Option<String>,

        /// Known platform name
        #[arg(long)]
        platform: Option<String>,

        /// Credential key to attach
        #[arg(long)]
        credential: Option<String>,

        /// Free-text intent forwarded to configuration generation
        #[arg(long)]
        intent: Option<String>,

        #[arg(long)]
        enable_mcp: bool,

        #[arg(long)]
        enable_abac: bool,

        #[arg(long)]
        enable_rbac: bool,
    },

    /// Work with the datasources of an integration
    Datasource {
        #[command(subcommand)]
        command: DatasourceCommands,
    },

    /// Credential management
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },

    /// Deployment listing
    Deployment {
        #[command(subcommand)]
        command: DeploymentCommands,
    },

    /// Service-user management
    ServiceUser {
        #[command(subcommand)]
        command: ServiceUserCommands,
    },
}

#[derive(Subcommand)]
enum DatasourceCommands {
    /// Validate local files against the embedded schemas (offline)
    Validate {
        #[arg(long)]
        system: String,

        /// Restrict to one datasource key
        #[arg(long)]
        datasource: Option<String>,
    },

    /// List the datasources of an integration
    List {
        #[arg(long)]
        system: String,
    },

    /// Compare local files with the remote configuration
    Diff {
        #[arg(long)]
        system: String,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,

        #[arg(long)]
        dataplane: Option<String>,
    },

    /// Run datasources through the remote pipeline with test payloads
    Test {
        #[arg(long)]
        system: String,

        #[arg(long)]
        datasource: Option<String>,

        /// JSON file with a payload to use instead of the stored templates
        #[arg(long)]
        payload: Option<PathBuf>,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,

        #[arg(long)]
        dataplane: Option<String>,
    },

    /// Deploy datasources through the remote pipeline (fail-fast)
    Deploy {
        #[arg(long)]
        system: String,

        #[arg(long)]
        datasource: Option<String>,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,

        #[arg(long)]
        dataplane: Option<String>,
    },
}

#[derive(Subcommand)]
enum CredentialCommands {
    /// List credentials available for wizard attachment
    List {
        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,
    },
}

#[derive(Subcommand)]
enum DeploymentCommands {
    /// List deployments known to the controller
    List {
        #[arg(long)]
        environment: Option<String>,

        #[arg(long)]
        controller: Option<String>,
    },
}

#[derive(Subcommand)]
enum ServiceUserCommands {
    /// Create a service user for machine-to-machine deployments
    Create {
        name: String,

        #[arg(long, default_value = "dev")]
        environment: String,

        #[arg(long)]
        controller: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let timeout = Duration::from_secs(cli.timeout);
    if let Err(err) = run(cli.command, timeout).await {
        print_failure(&err);
        std::process::exit(1);
    }
}

/// The only place errors are formatted and turned into an exit code.
fn print_failure(err: &anyhow::Error) {
    if let Some(api) = err.chain().find_map(|cause| cause.downcast_ref::<ApiError>()) {
        // server-side pre-formatted text wins when present
        if let Some(formatted) = &api.formatted {
            eprintln!("{}", formatted);
        } else {
            eprintln!("{}", api.render());
        }
        // prefixed context above the ApiError itself
        let context = format!("{:#}", err);
        if !context.starts_with(&api.message) {
            eprintln!("{}", context);
        }
        return;
    }

    eprintln!("{} {:#}", "error:".red().bold(), err);

    if let Some(common) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<aifabrix_common::Error>())
    {
        match common {
            aifabrix_common::Error::DockerNotFound => {
                eprintln!("Install Docker and make sure it is on your PATH.");
            }
            aifabrix_common::Error::DockerNotRunning => {
                eprintln!("Start Docker and try again.");
            }
            aifabrix_common::Error::Authentication(_) => {
                eprintln!("Run 'aifabrix login' and retry.");
            }
            aifabrix_common::Error::ImageMissing { image } => {
                eprintln!("Build it first: aifabrix build ({})", image);
            }
            _ => {}
        }
    }
}

async fn run(command: Commands, timeout: Duration) -> Result<()> {
    match command {
        Commands::Login {
            controller,
            client_id,
        } => login(controller.as_deref(), client_id, timeout).await,

        Commands::Logout => logout(),

        Commands::Create {
            app,
            language,
            port,
            database,
            redis,
        } => create(&app, &language, port, database, redis),

        Commands::Build { app, registry } => build(&app, registry.as_deref()),

        Commands::Run { app, port } => {
            let (dir, app_config) = load_app(&app)?;
            aifabrix_docker::run_app(&app_config, &dir, port).await?;
            println!(
                "{} {} is running on port {}",
                "OK".green().bold(),
                app,
                port.unwrap_or(app_config.app.port)
            );
            Ok(())
        }

        Commands::Stop { app } => {
            let (dir, _) = load_app(&app)?;
            aifabrix_docker::stop_app(&dir).await?;
            println!("{} {} stopped", "OK".green().bold(), app);
            Ok(())
        }

        Commands::Deploy {
            app,
            environment,
            controller,
            dataplane,
            skip_validation,
            no_mcp_contract,
        } => {
            let dir = integration_dir(&app)?;
            let session = connect(
                &environment,
                &app,
                controller.as_deref(),
                dataplane.as_deref(),
                timeout,
            )
            .await?;

            let options = aifabrix_deploy::PublishOptions {
                skip_validation,
                mcp_contract: !no_mcp_contract,
            };
            aifabrix_deploy::publish::publish_dir(&session.dataplane, &session.auth, &dir, &options)
                .await?;
            println!("{} {} published to {}", "OK".green().bold(), app, environment);
            Ok(())
        }

        Commands::Wizard {
            mode,
            system,
            environment,
            controller,
            dataplane,
            openapi_file,
            openapi_url,
            mcp_server,
            platform,
            credential,
            intent,
            enable_mcp,
            enable_abac,
            enable_rbac,
        } => {
            let mode: WizardMode = mode.parse().map_err(anyhow::Error::new)?;
            let scope = system.clone().unwrap_or_else(|| "wizard".to_string());
            let session = connect(
                &environment,
                &scope,
                controller.as_deref(),
                dataplane.as_deref(),
                timeout,
            )
            .await?;

            let source = openapi_file
                .map(SourceSelection::OpenapiFile)
                .or(openapi_url.map(SourceSelection::OpenapiUrl))
                .or(mcp_server.map(SourceSelection::McpServer))
                .or(platform.map(SourceSelection::KnownPlatform));

            let options = WizardOptions {
                mode,
                system,
                source,
                credential,
                preferences: UserPreferences {
                    enable_mcp,
                    enable_abac,
                    enable_rbac,
                },
                intent,
                root: std::env::current_dir()?,
            };

            let mut prompter = StdinPrompter;
            aifabrix_wizard::run_wizard(&session.dataplane, &session.auth, options, &mut prompter)
                .await?;
            Ok(())
        }

        Commands::Datasource { command } => datasource(command, timeout).await,

        Commands::Credential { command } => match command {
            CredentialCommands::List {
                environment,
                controller,
            } => {
                let session =
                    controller_session(&environment, "cli", controller.as_deref(), timeout).await?;
                let credentials = session
                    .controller
                    .list_credentials(&session.auth)
                    .await
                    .map_err(anyhow::Error::new)?;
                println!("{:<24} {:<16} DESCRIPTION", "KEY", "TYPE");
                for credential in credentials {
                    println!(
                        "{:<24} {:<16} {}",
                        credential.key,
                        credential.credential_type.as_deref().unwrap_or("-"),
                        credential.description.as_deref().unwrap_or("")
                    );
                }
                Ok(())
            }
        },

        Commands::Deployment { command } => match command {
            DeploymentCommands::List {
                environment,
                controller,
            } => {
                let scope = environment.clone().unwrap_or_else(|| "dev".to_string());
                let session =
                    controller_session(&scope, "cli", controller.as_deref(), timeout).await?;
                let deployments = session
                    .controller
                    .list_deployments(environment.as_deref(), &session.auth)
                    .await
                    .map_err(anyhow::Error::new)?;
                println!("{:<20} {:<12} STATUS", "APP", "ENVIRONMENT");
                for deployment in deployments {
                    println!(
                        "{:<20} {:<12} {}",
                        deployment.app,
                        deployment.environment,
                        deployment.status.as_deref().unwrap_or("-")
                    );
                }
                Ok(())
            }
        },

        Commands::ServiceUser { command } => match command {
            ServiceUserCommands::Create {
                name,
                environment,
                controller,
            } => {
                let session =
                    controller_session(&environment, "cli", controller.as_deref(), timeout).await?;
                let user = session
                    .controller
                    .create_service_user(&name, &session.auth)
                    .await
                    .map_err(anyhow::Error::new)?;
                println!("{} service user created", "OK".green().bold());
                println!("  clientId:     {}", user.client_id);
                println!("  clientSecret: {}", user.client_secret);
                println!(
                    "{}",
                    "Store the secret now; it will not be shown again.".yellow()
                );
                Ok(())
            }
        },
    }
}

async fn datasource(command: DatasourceCommands, timeout: Duration) -> Result<()> {
    match command {
        DatasourceCommands::Validate { system, datasource } => {
            let bundle = aifabrix_deploy::load_bundle(&integration_dir(&system)?)?;
            let selected = datasource.map(|d| vec![d]);
            let report = aifabrix_deploy::unit_validate(&bundle, selected.as_deref());
            aifabrix_deploy::report::print_unit_report(&report);
            if !report.valid() {
                anyhow::bail!(aifabrix_common::Error::Validation(format!(
                    "{} error(s) found",
                    report.result.errors.len()
                )));
            }
            Ok(())
        }

        DatasourceCommands::List { system } => {
            let bundle = aifabrix_deploy::load_bundle(&integration_dir(&system)?)?;
            aifabrix_deploy::report::print_datasource_list(&aifabrix_deploy::list_datasources(
                &bundle,
            ));
            Ok(())
        }

        DatasourceCommands::Diff {
            system,
            environment,
            controller,
            dataplane,
        } => {
            let bundle = aifabrix_deploy::load_bundle(&integration_dir(&system)?)?;
            let session = connect(
                &environment,
                &system,
                controller.as_deref(),
                dataplane.as_deref(),
                timeout,
            )
            .await?;
            let report =
                aifabrix_deploy::diff_system(&session.dataplane, &session.auth, &bundle).await?;
            aifabrix_deploy::report::print_diff(&report);
            Ok(())
        }

        DatasourceCommands::Test {
            system,
            datasource,
            payload,
            environment,
            controller,
            dataplane,
        } => {
            let bundle = aifabrix_deploy::load_bundle(&integration_dir(&system)?)?;
            let custom_payload = payload
                .map(|path| -> Result<serde_json::Value> {
                    let contents = std::fs::read_to_string(&path).with_context(|| {
                        format!("Failed to read payload file {}", path.display())
                    })?;
                    serde_json::from_str(&contents)
                        .with_context(|| format!("Failed to parse {}", path.display()))
                })
                .transpose()?;

            let session = connect(
                &environment,
                &system,
                controller.as_deref(),
                dataplane.as_deref(),
                timeout,
            )
            .await?;

            let options = aifabrix_deploy::TestOptions {
                selected: datasource.map(|d| vec![d]),
                custom_payload,
                retry: Default::default(),
            };
            let report = aifabrix_deploy::run_pipeline_tests(
                &session.dataplane,
                &session.auth,
                &bundle,
                &options,
            )
            .await?;
            aifabrix_deploy::report::print_test_report(&report);
            if !report.summary.success {
                anyhow::bail!("{} datasource(s) failed", report.summary.failed());
            }
            Ok(())
        }

        DatasourceCommands::Deploy {
            system,
            datasource,
            environment,
            controller,
            dataplane,
        } => {
            let bundle = aifabrix_deploy::load_bundle(&integration_dir(&system)?)?;
            let session = connect(
                &environment,
                &system,
                controller.as_deref(),
                dataplane.as_deref(),
                timeout,
            )
            .await?;
            let selected = datasource.map(|d| vec![d]);
            let summary = aifabrix_deploy::deploy_datasources(
                &session.dataplane,
                &session.auth,
                &bundle,
                selected.as_deref(),
            )
            .await?;
            aifabrix_deploy::report::print_deploy_report(&summary);
            if !summary.success {
                anyhow::bail!("deploy stopped on the first failure");
            }
            Ok(())
        }
    }
}

async fn login(
    controller_flag: Option<&str>,
    client_id: Option<String>,
    timeout: Duration,
) -> Result<()> {
    let mut config = config::load_config()?;
    let controller_url = resolve_controller_url(&config, controller_flag);
    let controller = ControllerClient::new(&controller_url, timeout)?;

    let client_id = match client_id {
        Some(id) => id,
        None => {
            use aifabrix_wizard::Prompter;
            let mut prompter = StdinPrompter;
            prompter.line("Client id: ")?
        }
    };
    let client_secret = rpassword::prompt_password("Client secret: ")?;

    let token = controller
        .exchange_client_credentials(&client_id, &client_secret)
        .await
        .map_err(|e| anyhow::Error::new(e).context("Login failed"))?;

    let refresh_token = token
        .refresh_token
        .clone()
        .context("controller issued no refresh token")?;

    config.device_token = Some(DeviceToken {
        access_token: token.access_token,
        refresh_token,
        controller: controller_url.clone(),
        expires_at: config::token_expiry(token.expires_in, token.expires_at),
    });
    config::save_config(&config)?;

    println!("{} logged in to {}", "OK".green().bold(), controller_url);
    Ok(())
}

fn logout() -> Result<()> {
    let mut config = config::load_config()?;
    if config.device_token.take().is_some() {
        config::save_config(&config)?;
        println!("{} logged out", "OK".green().bold());
    } else {
        println!("No stored login");
    }
    Ok(())
}

fn create(app: &str, language: &str, port: u16, database: bool, redis: bool) -> Result<()> {
    aifabrix_common::names::validate_app_name(app).map_err(anyhow::Error::new)?;

    let config = AppConfig {
        app: AppSection {
            name: app.to_string(),
            display_name: None,
            description: None,
            language: language.to_string(),
            port,
            image: None,
        },
        requires: RequiresSection {
            database,
            redis,
            storage: false,
        },
        databases: if database {
            vec![DatabaseSpec {
                name: app.to_string(),
            }]
        } else {
            Vec::new()
        },
        ..Default::default()
    };

    let dir = aifabrix_common::paths::builder_dir(&std::env::current_dir()?, app);
    if dir.join("variables.yaml").exists() {
        anyhow::bail!("{} already exists", dir.display());
    }
    aifabrix_scaffold::scaffold_app(&config, &dir)?;
    println!("{} scaffolded {}", "OK".green().bold(), dir.display());
    Ok(())
}

fn build(app: &str, registry: Option<&str>) -> Result<()> {
    let (dir, app_config) = load_app(app)?;
    let image = aifabrix_docker::build_app(&app_config, &dir)?;
    println!("{} built {}", "OK".green().bold(), image);

    if let Some(registry) = registry {
        let remote = aifabrix_docker::push_image(&image, registry)?;
        println!("{} pushed {}", "OK".green().bold(), remote);
    }
    Ok(())
}

fn load_app(app: &str) -> Result<(PathBuf, AppConfig)> {
    aifabrix_common::names::validate_app_name(app).map_err(anyhow::Error::new)?;
    let dir = aifabrix_common::paths::builder_dir(&std::env::current_dir()?, app);
    let variables = dir.join("variables.yaml");
    if !variables.exists() {
        anyhow::bail!(aifabrix_common::Error::MissingFile(
            variables.display().to_string()
        ));
    }
    let contents = std::fs::read_to_string(&variables)?;
    let config = AppConfig::from_yaml(&contents)
        .with_context(|| format!("Failed to parse {}", variables.display()))?;
    Ok((dir, config))
}

fn integration_dir(name: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let integration = aifabrix_common::paths::integration_dir(&cwd, name);
    if integration.exists() {
        return Ok(integration);
    }
    let builder = aifabrix_common::paths::builder_dir(&cwd, name);
    if builder.exists() {
        return Ok(builder);
    }
    anyhow::bail!(aifabrix_common::Error::MissingFile(format!(
        "{} (no integration/ or builder/ directory for '{}')",
        integration.display(),
        name
    )));
}

/// Everything a dataplane-backed command needs: fresh auth and a
/// client for the resolved dataplane.
struct RemoteSession {
    auth: auth::AuthConfig,
    dataplane: DataplaneClient,
}

struct ControllerSession {
    controller: ControllerClient,
    auth: auth::AuthConfig,
}

async fn controller_session(
    environment: &str,
    app: &str,
    controller_flag: Option<&str>,
    timeout: Duration,
) -> Result<ControllerSession> {
    let mut config = config::load_config()?;
    let controller_url = resolve_controller_url(&config, controller_flag);
    info!("controller: {}", controller_url);

    let controller = ControllerClient::new(&controller_url, timeout)?;
    let auth = auth::get_deployment_auth(&controller, &mut config, environment, app).await?;
    Ok(ControllerSession { controller, auth })
}

async fn connect(
    environment: &str,
    app: &str,
    controller_flag: Option<&str>,
    dataplane_flag: Option<&str>,
    timeout: Duration,
) -> Result<RemoteSession> {
    let mut config = config::load_config()?;
    let controller_url = resolve_controller_url(&config, controller_flag);
    info!("controller: {}", controller_url);

    let controller = ControllerClient::new(&controller_url, timeout)?;
    let auth = auth::get_deployment_auth(&controller, &mut config, environment, app).await?;

    let dataplane_url = resolve_dataplane_url(&controller, environment, &auth, dataplane_flag)
        .await
        .map_err(anyhow::Error::new)?;
    info!("dataplane: {}", dataplane_url);

    let dataplane = DataplaneClient::new(&dataplane_url, timeout)?;
    Ok(RemoteSession { auth, dataplane })
}
