use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gateway-server",
    about = "Gemini Gateway - OpenAI and Gemini compatible proxy over a credential pool",
    version = env!("GIT_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "GATEWAY_CONFIG", help = "Path to gateway_config.json")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "GATEWAY_DATA_DIR", help = "Directory for config and credential storage")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the gateway (default if no command specified)")]
    Serve(ServeArgs),

    #[command(subcommand, about = "Manage stored credentials offline")]
    Credentials(CredentialCommands),

    #[command(subcommand, about = "Inspect or create the configuration file")]
    Config(ConfigCommands),
}

#[derive(clap::Args, Default)]
pub struct ServeArgs {
    #[arg(long, env = "GATEWAY_HOST", help = "Bind address")]
    pub host: Option<String>,

    #[arg(short, long, env = "GATEWAY_PORT", help = "Listen port")]
    pub port: Option<u16>,

    #[arg(long, env = "GATEWAY_API_KEY", hide_env_values = true, help = "Key required on proxy routes")]
    pub api_key: Option<String>,

    #[arg(long, env = "GATEWAY_ADMIN_KEY", hide_env_values = true, help = "Key enabling the /admin API")]
    pub admin_key: Option<String>,
}

#[derive(Subcommand)]
pub enum CredentialCommands {
    #[command(about = "List stored credentials with their health")]
    List {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Add or replace a credential from a JSON file")]
    Add {
        #[arg(help = "Path to the credential JSON (must contain access_token)")]
        file: PathBuf,

        #[arg(long, help = "Record id (defaults to the file name)")]
        id: Option<String>,

        #[arg(long, help = "Bind the credential to a project")]
        project_id: Option<String>,
    },

    #[command(about = "Remove a credential")]
    Remove {
        #[arg(help = "Credential id")]
        id: String,
    },

    #[command(about = "Take a credential out of rotation")]
    Disable {
        #[arg(help = "Credential id")]
        id: String,
    },

    #[command(about = "Return a credential to rotation")]
    Enable {
        #[arg(help = "Credential id")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration (keys are masked)")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Write a configuration file with every default filled in")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["gateway-server"]).unwrap_or_else(|e| panic!("{e}"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_overrides_parse() {
        let cli = Cli::try_parse_from(["gateway-server", "serve", "--port", "9000", "--host", "0.0.0.0"])
            .unwrap_or_else(|e| panic!("{e}"));
        let Some(Commands::Serve(args)) = cli.command else { panic!("expected serve") };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gateway-server", "credentials", "list", "--json", "--data-dir", "/tmp/gw"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/gw")));
        assert!(matches!(cli.command, Some(Commands::Credentials(CredentialCommands::List { json: true }))));
    }
}
