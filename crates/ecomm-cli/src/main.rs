//! ecomm CLI - Command-line interface
//!
//! Usage:
//!   ecomm hash-password <password>
//!   ecomm issue-token --email <email> [--admin]
//!   ecomm inspect-token <token>
//!   ecomm create-user --name <name> --email <email> --password <password> [--admin]

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use ecomm_api::auth::{
    hash_password_with_config, new_token_id, AuthService, PasswordConfig, RegisterRequest,
    TokenIssuer,
};
use ecomm_core::{AppConfig, PgStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ecomm")]
#[command(about = "ecomm account and token tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Argon2id hash of a password
    HashPassword {
        password: String,
        /// Use minimal cost parameters
        #[arg(long)]
        fast: bool,
    },
    /// Sign a token with the configured key
    IssueToken {
        #[arg(long)]
        email: String,
        /// Subject id; random when omitted
        #[arg(long)]
        user_id: Option<Uuid>,
        #[arg(long)]
        admin: bool,
        /// Lifetime in seconds; the access token lifetime when omitted
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
    /// Validate a token and print its claims
    InspectToken { token: String },
    /// Create an account directly in the database
    CreateUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ECOMM_USER_PASSWORD")]
        password: String,
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password, fast } => {
            let config = if fast {
                PasswordConfig::fast()
            } else {
                PasswordConfig::default()
            };
            println!("{}", hash_password_with_config(&password, &config)?);
        }
        Commands::IssueToken {
            email,
            user_id,
            admin,
            ttl_secs,
        } => {
            let config = AppConfig::from_env()?;
            let tokens = TokenIssuer::new(&config.auth)?;
            let ttl = ttl_secs.unwrap_or_else(|| tokens.access_ttl_secs());
            if ttl <= 0 {
                bail!("--ttl-secs must be positive");
            }
            let Some(expires_at) =
                Duration::try_seconds(ttl).and_then(|ttl| Utc::now().checked_add_signed(ttl))
            else {
                bail!("--ttl-secs is too large");
            };

            let (token, claims) = tokens.issue(
                &email,
                user_id.unwrap_or_else(Uuid::new_v4),
                &new_token_id(),
                admin,
                expires_at,
            )?;
            tracing::debug!(jti = %claims.jti, exp = claims.exp, "token issued");
            println!("{token}");
        }
        Commands::InspectToken { token } => {
            let config = AppConfig::from_env()?;
            let tokens = TokenIssuer::new(&config.auth)?;
            let claims = tokens.validate(&token).context("token rejected")?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Commands::CreateUser {
            name,
            email,
            password,
            admin,
        } => {
            let config = AppConfig::from_env()?;
            let Some(url) = config.database.postgres_url.clone() else {
                bail!("DATABASE_URL must be set to create users");
            };

            let store = PgStore::connect(&url, config.database.pool_size).await?;
            store.ensure_schema().await?;
            let store = Arc::new(store);

            let tokens = Arc::new(TokenIssuer::new(&config.auth)?);
            let service = AuthService::new(store.clone(), store, tokens);
            let user = service
                .register(
                    RegisterRequest {
                        name,
                        email,
                        password,
                    },
                    admin,
                )
                .await?;

            println!("{}", serde_json::to_string_pretty(&user)?);
        }
    }

    Ok(())
}
