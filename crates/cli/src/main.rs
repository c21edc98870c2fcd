//! Kiezbett CLI - session, order and deep-link tools.
//!
//! # Usage
//!
//! ```bash
//! # Store the operator session the toolbox acts with
//! kb-cli login --token "$ACCESS_TOKEN" --actor-id u-1 --email ops@kiezbett.de --role editor
//!
//! # Show category counts and one category
//! kb-cli orders counts
//! kb-cli orders list paid
//!
//! # Move an order along
//! kb-cli orders transition o-1 --axis delivery --action shipped
//!
//! # Issue, list and revoke deep links
//! kb-cli links create --order o-1 --days 14
//! kb-cli links list --global
//! kb-cli links revoke tok_abc
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Manage the stored session
//! - `orders` - Read orders and request transitions
//! - `links` - Manage deep-link tokens

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kb-cli")]
#[command(author, version, about = "Kiezbett toolbox CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an operator session
    Login {
        /// Backend access token
        #[arg(short, long, env = "KIEZBETT_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Actor id the token belongs to
        #[arg(short, long)]
        actor_id: String,

        /// Actor email address
        #[arg(short, long)]
        email: Option<String>,

        /// Actor role (`admin`, `editor`, `viewer`)
        #[arg(short, long)]
        role: Option<String>,

        /// Hours until the token expires
        #[arg(long)]
        expires_in_hours: Option<i64>,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session's actor
    Whoami,
    /// Read orders and request transitions
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage deep links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Count orders per category
    Counts,
    /// List the orders of one category
    List {
        /// Category slug (`open`, `paid`, `in-progress`, `shipping`, `completed`)
        category: String,
    },
    /// Show one order
    Show {
        order_id: String,
    },
    /// Request a transition
    Transition {
        order_id: String,

        /// `order`, `payment` or `delivery`
        #[arg(long)]
        axis: String,

        /// Action name, e.g. `paid` or `shipped`
        #[arg(long)]
        action: String,

        /// Transaction or delivery id; looked up when omitted
        #[arg(long)]
        subject_id: Option<String>,
    },
    /// Print the backend's transition graph as JSON
    Transitions {
        order_id: String,

        /// `order`, `payment` or `delivery`
        #[arg(long, default_value = "order")]
        axis: String,
    },
}

/// Which links a command works on.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScopeArgs {
    /// Links of one order
    #[arg(long)]
    order: Option<String>,

    /// Global links
    #[arg(long)]
    global: bool,
}

#[derive(Subcommand)]
enum LinksAction {
    /// Issue a new link
    Create {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Lifetime in days (1-365)
        #[arg(short, long)]
        days: Option<u16>,
    },
    /// List links
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Revoke a link
    Revoke {
        token: String,
    },
    /// Resolve a link the way the public page does
    Resolve {
        token: String,

        /// Treat the token as a global link
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login {
            token,
            actor_id,
            email,
            role,
            expires_in_hours,
        } => {
            commands::session::login(
                token,
                &actor_id,
                email,
                role.as_deref(),
                expires_in_hours,
            )
            .await?;
        }
        Commands::Logout => commands::session::logout().await?,
        Commands::Whoami => commands::session::whoami().await?,
        Commands::Orders { action } => {
            let state = commands::connect().await?;
            match action {
                OrdersAction::Counts => commands::orders::counts(&state).await?,
                OrdersAction::List { category } => {
                    commands::orders::list(&state, &category).await?;
                }
                OrdersAction::Show { order_id } => {
                    commands::orders::show(&state, order_id).await?;
                }
                OrdersAction::Transition {
                    order_id,
                    axis,
                    action,
                    subject_id,
                } => {
                    commands::orders::transition(&state, order_id, &axis, &action, subject_id)
                        .await?;
                }
                OrdersAction::Transitions { order_id, axis } => {
                    commands::orders::transitions(&state, order_id, &axis).await?;
                }
            }
        }
        Commands::Links { action } => {
            let state = commands::connect().await?;
            match action {
                LinksAction::Create { scope, days } => {
                    commands::links::create(&state, scope.order, days).await?;
                }
                LinksAction::List { scope } => {
                    commands::links::list(&state, scope.order).await?;
                }
                LinksAction::Revoke { token } => commands::links::revoke(&state, &token).await?,
                LinksAction::Resolve { token, global } => {
                    commands::links::resolve(&state, &token, global).await?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_links_scope_is_exclusive() {
        let parsed = Cli::try_parse_from(["kb-cli", "links", "list", "--order", "o-1", "--global"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["kb-cli", "links", "create", "--global", "--days", "30"]);
        assert!(parsed.is_ok());
    }
}
