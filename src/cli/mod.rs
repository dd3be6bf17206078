pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "retention-os")]
#[command(about = "Retention OS API - account-scoped retention data service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT / PORT)")]
        port: Option<u16>,
        #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
        host: String,
    },

    #[command(about = "Print the effective configuration with secrets redacted")]
    Config,

    #[command(about = "Mint a session token for local testing (not available in production)")]
    Token {
        #[arg(long, help = "User id to place in the `sub` claim")]
        user: Uuid,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, default_value_t = 24, help = "Lifetime in hours")]
        hours: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        host: "0.0.0.0".to_string(),
    }) {
        Commands::Serve { port, host } => commands::serve::handle(config, &host, port).await,
        Commands::Config => commands::config::handle(&config, output_format),
        Commands::Token { user, email, hours } => commands::token::handle(&config, user, email, hours, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["retention-os", "serve", "--port", "4000"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(4000), .. })));

        let cli = Cli::try_parse_from(["retention-os"]).unwrap();
        assert!(cli.command.is_none());

        let user = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["retention-os", "--json", "token", "--user", user.as_str()]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        assert!(matches!(cli.command, Some(Commands::Token { hours: 24, .. })));

        assert!(Cli::try_parse_from(["retention-os", "token", "--user", "not-a-uuid"]).is_err());
    }
}
