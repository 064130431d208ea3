use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use rwportal_auth::{FileTokenStorage, Session, TracingNavigator};
use rwportal_client::{ApiClient, ClientConfig, RouteDecision};
use rwportal_org::{OrgStructure, RtKey};

#[derive(Parser)]
#[command(name = "rwportal", about = "Session and API shell for the RW portal", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (overrides RWPORTAL_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Session token file (overrides RWPORTAL_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a token pair obtained from the login endpoint
    Login {
        #[arg(long)]
        access: String,
        #[arg(long)]
        refresh: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the session state
    Status,
    /// Refresh the access token now
    Refresh,
    /// Check whether a protected screen may be opened
    Guard,
    /// GET a path and print the JSON response
    Get { path: String },
    /// Print the bundled organization structure as JSON
    Org {
        /// Print this RT's board instead of the RW board (e.g. "3", "RT 03")
        #[arg(long)]
        rt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rwportal_observability::init();

    let cli = Cli::parse();
    if let Commands::Org { rt } = cli.command {
        return print_org(rt.as_deref());
    }
    let mut config = ClientConfig::from_env();
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if let Some(token_file) = cli.token_file {
        config.token_file = Some(token_file);
    }

    let token_file = config
        .token_file()
        .context("no token file configured and no platform data directory available")?;
    let mut session = Session::new(FileTokenStorage::new(&token_file));
    session
        .init_from_storage()
        .with_context(|| format!("failed to load session from {}", token_file.display()))?;

    let client = ApiClient::new(config, session, Arc::new(TracingNavigator));

    match cli.command {
        Commands::Org { .. } => {}
        Commands::Login { access, refresh } => {
            client.login(&access, &refresh).await.context("failed to store tokens")?;
            println!("logged in");
        }
        Commands::Logout => {
            client.logout().await.context("failed to clear session")?;
            println!("logged out");
        }
        Commands::Status => {
            let state = client.session_state().await;
            println!("{}", serde_json::to_string(&state)?);
        }
        Commands::Refresh => match client.refresh_session().await {
            Some(_) => println!("refreshed"),
            None => anyhow::bail!("session could not be refreshed; logged out"),
        },
        Commands::Guard => match client.guard_route().await {
            RouteDecision::Allow => println!("allow"),
            RouteDecision::Redirect(route) => println!("redirect {route}"),
        },
        Commands::Get { path } => {
            let body: Value = client
                .get(&path)
                .await
                .with_context(|| format!("GET {path} failed"))?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

fn print_org(rt: Option<&str>) -> anyhow::Result<()> {
    let org = OrgStructure::seeded();
    let tree = match rt {
        None => org.rw(),
        Some(raw) => {
            let key = RtKey::parse(raw).with_context(|| format!("invalid RT {raw:?}"))?;
            org.rts()
                .get(&key)
                .with_context(|| format!("{key} is not registered"))?
        }
    };
    println!("{}", serde_json::to_string_pretty(tree)?);
    Ok(())
}
