//! CLI subcommands.

pub mod links;
pub mod orders;
pub mod session;

use kiezbett_toolbox::config::ToolboxConfig;
use kiezbett_toolbox::session::SessionManager;
use kiezbett_toolbox::state::AppState;

/// Build the same services the toolbox server uses, from the environment.
pub async fn connect() -> Result<AppState, Box<dyn std::error::Error>> {
    let config = ToolboxConfig::from_env()?;
    let session = SessionManager::load(config.session_file.clone()).await?;
    Ok(AppState::new(config, session)?)
}
