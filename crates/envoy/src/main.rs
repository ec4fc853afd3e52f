mod client;
mod config;
mod embed;
mod ui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client::ApiClient;
use config::Config;
use courier_shared::{ConfigUpdate, Position, WidgetPresentationUpdate};
use embed::EmbedOptions;

/// Operator client for a Courier chat server.
#[derive(Parser)]
#[command(name = "envoy", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set the Courier server URL
    Server { url: String },
    /// Sign in as the administrator
    Login {
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored admin token
    Logout,
    /// Show or change the server configuration (admin)
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show the public widget defaults
    Defaults,
    /// Check that the server is up
    Health,
    /// Talk to an assistant; starts an interactive session without MESSAGE
    Chat {
        #[arg(long)]
        assistant: String,
        message: Option<String>,
    },
    /// Print an embed snippet for a web page
    Embed(EmbedArgs),
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    assistant_id: Option<String>,
    #[arg(long)]
    welcome: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    position: Option<Position>,
    #[arg(long)]
    title: Option<String>,
}

impl SetArgs {
    fn into_update(self) -> ConfigUpdate {
        let widget = WidgetPresentationUpdate {
            primary_color: self.color,
            position: self.position,
            title: self.title,
        };
        ConfigUpdate {
            api_key: self.api_key,
            assistant_id: self.assistant_id,
            welcome_message: self.welcome,
            widget_config: (!widget.is_empty()).then_some(widget),
        }
    }
}

#[derive(Args)]
struct EmbedArgs {
    #[arg(long)]
    assistant: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    position: Option<Position>,
    #[arg(long)]
    welcome: Option<String>,
    /// Include event hooks and control examples
    #[arg(long)]
    advanced: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    let client = ApiClient::new(config.server_url.clone(), config.token.clone());

    match cli.command {
        Command::Server { url } => {
            config.set_server_url(&url)?;
            println!("Server URL updated to: {}", config.server_url);
        }
        Command::Login { password } => {
            let password = match password {
                Some(p) => p,
                None => ui::prompt_password("Admin password")?,
            };
            let token = client.login(&password).await?;
            config.set_token(Some(token))?;
            println!("Logged in to {}", config.server_url);
        }
        Command::Logout => {
            config.set_token(None)?;
            println!("Logged out.");
        }
        Command::Config(ConfigCommand::Show) => {
            let current = client.admin_config().await?;
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        Command::Config(ConfigCommand::Set(args)) => {
            let update = args.into_update();
            if update.is_empty() {
                println!("Nothing to update. See `envoy config set --help`.");
                return Ok(());
            }
            println!("{}", client.update_config(&update).await?);
        }
        Command::Defaults => {
            let defaults = client.widget_defaults().await?;
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{} at {}", health.status, health.timestamp);
        }
        Command::Chat { assistant, message } => match message {
            Some(message) => ui::single_message(client, &assistant, message).await?,
            None => ui::interactive_chat(client, &assistant).await?,
        },
        Command::Embed(args) => {
            let options = EmbedOptions {
                assistant_id: args.assistant,
                title: args.title,
                color: args.color,
                position: args.position,
                welcome: args.welcome,
            };
            let html = if args.advanced {
                embed::advanced_snippet(&config.server_url, &options)
            } else {
                embed::snippet(&config.server_url, &options)
            };
            println!("{}", html);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn config_set_builds_a_partial_update() {
        let cli = Cli::try_parse_from([
            "envoy", "config", "set", "--title", "Sales", "--position", "bottom-left",
        ])
        .unwrap();

        let Command::Config(ConfigCommand::Set(args)) = cli.command else {
            panic!("expected config set");
        };
        let update = args.into_update();

        assert!(update.api_key.is_none());
        let widget = update.widget_config.unwrap();
        assert_eq!(widget.title.as_deref(), Some("Sales"));
        assert_eq!(widget.position, Some(Position::BottomLeft));
        assert!(widget.primary_color.is_none());
    }

    #[test]
    fn login_without_flag_leaves_password_to_the_prompt() {
        let cli = Cli::try_parse_from(["envoy", "login"]).unwrap();
        assert!(matches!(cli.command, Command::Login { password: None }));

        let cli = Cli::try_parse_from(["envoy", "login", "--password", "pw"]).unwrap();
        assert!(matches!(cli.command, Command::Login { password: Some(ref p) } if p == "pw"));
    }

    #[test]
    fn unknown_position_is_rejected() {
        assert!(Cli::try_parse_from(["envoy", "embed", "--assistant", "a", "--position", "top"]).is_err());
    }
}
