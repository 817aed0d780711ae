use clap::{Parser, Subcommand};

/// idgate — bearer-token identity service with simulated VM provisioning
#[derive(Parser)]
#[command(name = "idgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (overrides IDGATE_PORT)
        #[arg(short, long, env = "IDGATE_PORT")]
        port: Option<u16>,
    },

    /// Work with bearer tokens offline, using the configured secret
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Mint a token for an arbitrary identity
    Issue {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Verify a token and print the identity it carries.
    /// Revocations are held by the running server and are not checked here.
    Verify { token: String },
}
