//! Rollcall CLI
//!
//! Terminal front end for the activity signup service:
//! - Interactive shell (browse, sign in, register and unregister students)
//! - One-shot roster listing
//! - Session status
//! - Config generation

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rollcall::shell::{Command, Step, HELP};
use rollcall::{App, Config, HttpSignupApi, LoggingConfig, SignupApi};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for the school activity signup service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Signup service URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format (pretty, json)
    #[arg(short, long, global = true)]
    pub format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session (default)
    Shell,

    /// Print the activity list once
    List,

    /// Show whether a teacher session is open
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Config { output } => {
            let config = rollcall::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
            return Ok(());
        }
        other => other,
    };

    let (mut config, search) = match &cli.config {
        Some(path) => (Config::load_with_env(path)?, None),
        None => {
            let search = Config::load_default();
            (search.config.clone(), Some(search))
        }
    };
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    if let Some(format) = cli.format {
        config.logging.format = format;
    }

    init_logging(&config.logging)?;
    tracing::info!("Rollcall v{}", env!("CARGO_PKG_VERSION"));
    if let Some(search) = &search {
        search.log();
    }

    let api: Rc<dyn SignupApi> = Rc::new(
        HttpSignupApi::new(config.server.base_url.as_str(), config.request_timeout())
            .context("failed to build HTTP client")?,
    );
    let app = Rc::new(App::new(api, config.app_settings()));

    // Components share the page through Rc, so everything runs on this thread
    LocalSet::new()
        .run_until(async move {
            match command {
                Commands::List => {
                    app.start().await;
                    print!("{}", app.snapshot());
                    Ok(())
                }
                Commands::Status => {
                    let session = app.session_gate().probe().await;
                    println!("Server: {}", config.server.base_url);
                    match session.username {
                        Some(username) if session.authenticated => {
                            println!("Session: signed in as {}", username)
                        }
                        _ => println!("Session: not signed in"),
                    }
                    Ok(())
                }
                _ => run_shell(app).await,
            }
        })
        .await
}

/// Install the global subscriber. Logs go to stderr or the configured file,
/// never stdout, so they stay out of the rendered page.
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("rollcall={}", logging.level)))
        .unwrap_or_else(|_| EnvFilter::new("rollcall=info"));

    let (writer, ansi) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }

    Ok(())
}

fn render(app: &App) {
    println!();
    println!("{}", "=".repeat(60));
    print!("{}", app.snapshot());
    println!("{}", "=".repeat(60));
}

async fn run_shell(app: Rc<App>) -> anyhow::Result<()> {
    println!("Rollcall v{} (type `help` for commands)", env!("CARGO_PKG_VERSION"));

    app.start().await;
    render(&app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                let step = line
                    .parse::<Command>()
                    .and_then(|command| command.resolve(&app.snapshot()));

                match step {
                    Ok(Step::Events(events)) => {
                        for event in events {
                            app.dispatch(event);
                        }
                    }
                    Ok(Step::Show) => render(&app),
                    Ok(Step::Help) => println!("{}", HELP),
                    Ok(Step::Quit) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            _ = app.document().changed() => render(&app),
        }
    }

    tracing::debug!("Shell closed");
    Ok(())
}
