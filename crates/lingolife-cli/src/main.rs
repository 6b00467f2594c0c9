//! lingolife CLI: runs the API server and acts as a flashcard client.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use lingolife_core::model::WordDraft;
use lingolife_core::statistics::DEFAULT_DAILY_GOAL;

mod client;
mod commands;
mod session;

use client::DEFAULT_API_URL;
use commands::ClientContext;

#[derive(Parser)]
#[command(name = "lingolife", version, about = "Vocabulary flashcards with dictionary lookup")]
struct Cli {
    /// API server base URL
    #[arg(long, global = true, env = "LINGOLIFE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Client state file (saved session, review history)
    #[arg(long, global = true, env = "LINGOLIFE_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create a starter lingolife.toml
    Init,

    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that talk to the API server and use local client state.
#[derive(Subcommand)]
enum ClientCommand {
    /// Create an account and sign in
    Register {
        username: String,
        email: String,

        #[arg(long, env = "LINGOLIFE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in and remember the session
    Login {
        username: String,

        #[arg(long, env = "LINGOLIFE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Do not contact the server
        #[arg(long)]
        offline: bool,
    },

    /// Look a word up in the dictionary
    Lookup {
        term: String,

        /// Add the result to your words
        #[arg(long)]
        save: bool,
    },

    /// List your words
    Words {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a word by hand
    Add {
        term: String,
        translation: String,

        #[arg(long)]
        phonetic: Option<String>,

        /// Part of speech
        #[arg(long)]
        pos: Option<String>,

        #[arg(long)]
        definition: Option<String>,
    },

    /// Review today's cards
    Review,

    /// Show vocabulary statistics
    Stats {
        /// Reviews per day that make the goal
        #[arg(long, default_value_t = DEFAULT_DAILY_GOAL)]
        goal: u32,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingolife=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, port } => commands::serve::execute(config, port).await,
        Commands::Init => commands::init::execute(),
        Commands::Client(command) => match ClientContext::open(cli.api_url, cli.state) {
            Ok(ctx) => run_client(&ctx, command).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run_client(ctx: &ClientContext, command: ClientCommand) -> anyhow::Result<()> {
    match command {
        ClientCommand::Register {
            username,
            email,
            password,
        } => commands::account::register(ctx, &username, &email, &password).await,
        ClientCommand::Login { username, password } => {
            commands::account::login(ctx, &username, &password).await
        }
        ClientCommand::Logout => commands::account::logout(ctx),
        ClientCommand::Whoami { offline } => commands::account::whoami(ctx, offline).await,
        ClientCommand::Lookup { term, save } => commands::lookup::execute(ctx, &term, save).await,
        ClientCommand::Words { json } => commands::words::list(ctx, json).await,
        ClientCommand::Add {
            term,
            translation,
            phonetic,
            pos,
            definition,
        } => {
            let draft = WordDraft {
                term,
                translation,
                phonetic,
                part_of_speech: pos,
                definition,
            };
            commands::words::add(ctx, draft).await
        }
        ClientCommand::Review => commands::review::execute(ctx).await,
        ClientCommand::Stats { goal, json } => commands::stats::execute(ctx, goal, json).await,
    }
}
