use anyhow::Context;
use clap::{Parser, Subcommand};
use incident_stack::{
    config::{Config, ObservabilityConfig},
    dispatch::{ArtifactTimeline, Dashboard, Intent},
    gateway::{HttpIncidentGateway, RemoteIncidentGateway},
    models::{CreateIncidentDto, IncidentStatus, Severity, UpdateIncidentDto},
    store::IncidentStore,
};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "incident-stack")]
#[command(about = "Incident dashboard CLI", long_about = None, version)]
struct Cli {
    /// Incident service base URL (overrides configuration)
    #[arg(short, long, env = "INCIDENT_STACK_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List incidents
    List,

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Create an incident
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short = 'S', long, default_value = "3")]
        severity: Severity,

        #[arg(short = 's', long, default_value = "open")]
        status: IncidentStatus,

        #[arg(short, long)]
        owner: String,

        #[arg(short = 'r', long)]
        source: String,

        #[arg(short = 'T', long)]
        trigger: Option<String>,
    },

    /// Patch an incident
    Update {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'S', long)]
        severity: Option<Severity>,

        #[arg(short = 's', long)]
        status: Option<IncidentStatus>,

        #[arg(short, long)]
        owner: Option<String>,

        #[arg(short = 'r', long)]
        source: Option<String>,

        #[arg(short = 'T', long)]
        trigger: Option<String>,
    },

    /// Set an incident's status
    Status {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        #[arg(value_name = "STATUS")]
        status: IncidentStatus,
    },

    /// Set an incident's severity (1-5 or label)
    Severity {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        #[arg(value_name = "SEVERITY")]
        severity: Severity,
    },

    /// Delete an incident
    Delete {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Load incidents and print the computed stack layout
    Stack {
        #[arg(short = 'x', long)]
        expanded: bool,

        /// Only show incidents with this tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Print the demo artifact timeline layout
    Artifacts {
        #[arg(short = 'x', long)]
        expanded: bool,

        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("incident_stack={}", config.log_level).into());

    // Logs go to stderr so stdout stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(endpoint) = cli.endpoint {
        config.gateway.base_url = endpoint;
    }

    init_tracing(&config.observability);
    tracing::debug!(base_url = %config.gateway.base_url, "Configuration loaded");

    let gateway: Arc<dyn RemoteIncidentGateway> = Arc::new(
        HttpIncidentGateway::new(&config.gateway).context("Failed to create incident gateway")?,
    );
    let store = IncidentStore::from_config(gateway.clone(), &config.store);

    match cli.command {
        Commands::List => {
            store.load_all().await?;
            print_json(&store.snapshot())?;
        }

        Commands::Get { id } => {
            print_json(&gateway.get(&id).await?)?;
        }

        Commands::Create {
            title,
            severity,
            status,
            owner,
            source,
            trigger,
        } => {
            let mut dto = CreateIncidentDto::new(title, owner, source)
                .with_severity(severity)
                .with_status(status);
            dto.trigger = trigger;
            print_json(&store.create(dto).await?)?;
        }

        Commands::Update {
            id,
            title,
            severity,
            status,
            owner,
            source,
            trigger,
        } => {
            let dto = UpdateIncidentDto {
                title,
                severity,
                status,
                owner,
                source,
                trigger,
            };
            if dto.is_empty() {
                anyhow::bail!("Nothing to update; pass at least one field");
            }
            print_json(&store.update(&id, dto).await?)?;
        }

        Commands::Status { id, status } => {
            print_json(&store.update_status(&id, status).await?)?;
        }

        Commands::Severity { id, severity } => {
            print_json(&store.update_severity(&id, severity).await?)?;
        }

        Commands::Delete { id } => {
            store.delete(&id).await?;
            println!("Deleted {}", id);
        }

        Commands::Stack { expanded, tags } => {
            let mut dashboard = Dashboard::new(Arc::new(store), config.layout.clone());
            dashboard.load().await?;
            for tag in tags {
                dashboard.dispatch(Intent::toggle_tag(tag)).await?;
            }
            if expanded {
                dashboard.dispatch(Intent::expand()).await?;
            }
            print_json(&dashboard.render())?;
        }

        Commands::Artifacts { expanded, tags } => {
            let mut timeline = ArtifactTimeline::demo(config.layout.clone());
            for tag in tags {
                timeline.handle(&Intent::toggle_tag(tag));
            }
            if expanded {
                timeline.handle(&Intent::expand());
            }
            print_json(&timeline.render())?;
        }
    }

    Ok(())
}
