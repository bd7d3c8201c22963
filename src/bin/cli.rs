use sqlx::Row;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use scopegate::authz::{has_access, validate, AccessRequest, PolicyDocument, RoleKind};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[derive(Parser, Debug)]
#[command(author, version, about = "scopegate policy and migration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Evaluate a policy file against a request file
    Check {
        /// JSON array of policy documents
        #[arg(long)]
        policy: PathBuf,
        /// JSON object of scope -> {verb, resource}
        #[arg(long)]
        request: PathBuf,
    },
    /// Report structural errors in a policy file
    Validate {
        #[arg(long)]
        policy: PathBuf,
    },
    /// Print the built-in policy for a role kind
    Template { kind: BuiltinRole },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BuiltinRole {
    Admin,
    Developer,
    Viewer,
}

impl From<BuiltinRole> for RoleKind {
    fn from(role: BuiltinRole) -> Self {
        match role {
            BuiltinRole::Admin => RoleKind::Admin,
            BuiltinRole::Developer => RoleKind::Developer,
            BuiltinRole::Viewer => RoleKind::Viewer,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD, then fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::Check { policy, request } => {
            let policy: Vec<PolicyDocument> = read_json(&policy)?;
            let request: AccessRequest = read_json(&request)?;
            let decision = if has_access(&policy, &request) { "allow" } else { "deny" };
            println!("{}", decision);
        }
        Commands::Validate { policy } => {
            let policy: Vec<PolicyDocument> = read_json(&policy)?;
            let mut invalid = 0;
            for (index, doc) in policy.iter().enumerate() {
                match validate(doc) {
                    Ok(()) => println!("document {}: ok", index),
                    Err(err) => {
                        invalid += 1;
                        println!("document {}: {}", index, err);
                    }
                }
            }
            if invalid > 0 {
                anyhow::bail!("{} of {} documents are invalid", invalid, policy.len());
            }
        }
        Commands::Template { kind } => {
            let kind = RoleKind::from(kind);
            let template = kind
                .template()
                .with_context(|| format!("{} has no built-in template", kind))?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
