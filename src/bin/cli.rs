use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use uuid::Uuid;
use workdesk::access::{
    AuthState, GuardOutcome, GuardRequirement, PermissionStore, RetryPolicy, TokioTimer, evaluate,
};
use workdesk::logging::init_tracing;
use workdesk_auth::{Principal, UserRole, create_access_token};
use workdesk_config::{AccessConfig, JwtConfig};
use workdesk_core::{Action, module_for_path};
use workdesk_db::{PgPermissionSource, init_db_pool};

#[derive(Parser)]
#[command(name = "workdesk-cli")]
#[command(about = "Workdesk CLI - Developer tools for Workdesk access control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue an access token signed with JWT_SECRET
    IssueToken {
        /// User ID (the token subject)
        #[arg(short = 'u', long)]
        user_id: Uuid,

        /// Email address
        #[arg(short = 'e', long)]
        email: String,

        /// Role claim: admin, hr_manager, manager or employee
        #[arg(short = 'r', long)]
        role: Option<UserRole>,
    },
    /// Load a user's permissions from the database and run the route guard for a path
    CheckAccess {
        /// User ID to load permissions for
        #[arg(short = 'u', long)]
        user_id: Uuid,

        /// Page path, e.g. /employees
        #[arg(short = 'p', long)]
        path: String,

        /// Role to evaluate as
        #[arg(short = 'r', long)]
        role: Option<UserRole>,

        /// Treat the path as an elevated-only area
        #[arg(long)]
        elevated: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::IssueToken {
            user_id,
            email,
            role,
        } => handle_issue_token(user_id, &email, role),
        Commands::CheckAccess {
            user_id,
            path,
            role,
            elevated,
        } => handle_check_access(user_id, &path, role, elevated).await,
    }
}

fn handle_issue_token(user_id: Uuid, email: &str, role: Option<UserRole>) -> anyhow::Result<()> {
    let token = create_access_token(user_id, email, role, &JwtConfig::from_env())
        .map_err(|e| anyhow!("Failed to create token: {}", e.error))?;
    println!("{token}");
    Ok(())
}

async fn handle_check_access(
    user_id: Uuid,
    path: &str,
    role: Option<UserRole>,
    elevated: bool,
) -> anyhow::Result<()> {
    init_tracing();

    let pool = init_db_pool().await?;
    let access_config = AccessConfig::from_env();
    let store = PermissionStore::new(
        user_id,
        Arc::new(PgPermissionSource::new(pool)),
        Arc::new(TokioTimer),
        RetryPolicy::from_config(&access_config),
    );

    if let Err(e) = store.refetch().await {
        eprintln!("⚠️  Permission fetch failed: {e}");
    }
    let snapshot = store.snapshot();

    let principal = Principal {
        user_id,
        email: String::new(),
        role,
    };
    let mut requirement = GuardRequirement::page(path);
    if elevated {
        requirement = requirement.elevated();
    }
    let outcome = evaluate(
        &AuthState::signed_in(principal),
        &snapshot,
        &requirement,
        path,
    );

    let module = module_for_path(path);
    let actions: Vec<&str> = Action::ALL
        .into_iter()
        .filter(|action| snapshot.has_page_action(module, *action))
        .map(|action| action.as_str())
        .collect();
    let mut branches: Vec<String> = snapshot.accessible_branches().into_iter().collect();
    branches.sort();

    println!("Path:        {path}");
    println!("Module:      {module}");
    println!("Page access: {}", snapshot.has_page_access(path));
    println!("Actions:     {}", actions.join(", "));
    println!("Branches:    {}", branches.join(", "));
    println!("Outcome:     {}", outcome.kind());

    match outcome {
        GuardOutcome::Allowed => Ok(()),
        GuardOutcome::PermissionError { message } => {
            Err(anyhow!(message)).context("Permissions could not be loaded")
        }
        other => Err(anyhow!("Access refused ({})", other.kind())),
    }
}
