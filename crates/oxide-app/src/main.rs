//! oxide-app CLI
//!
//! Runs single requests through the application's route table.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oxide_router::{Method, PathParams};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oxide_app::{App, AppConfig};

/// Route requests through the reference application.
#[derive(Parser)]
#[command(name = "oxide-app")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (defaults are used when absent).
    #[arg(short, long, env = "OXIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one request and print the response.
    Dispatch {
        /// HTTP method.
        method: String,

        /// Request target, e.g. `/blog/hello?draft=1`.
        target: String,

        /// Print response headers.
        #[arg(short, long)]
        include: bool,
    },

    /// List the registered routes.
    Routes {
        /// Only show routes for this method.
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Build a path for a registered route template.
    Url {
        /// Route template, e.g. `blog/{slug}`.
        template: String,

        /// Parameters as `name=value`.
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let app = App::new(config)?;

    match cli.command {
        Commands::Dispatch {
            method,
            target,
            include,
        } => {
            let response = app.handle(&method, &target).await;

            println!("{} {}", response.status, response.status_text());
            if include {
                let mut headers: Vec<_> = response.headers.iter().collect();
                headers.sort();
                for (key, value) in headers {
                    println!("{key}: {value}");
                }
            }
            println!();
            println!("{}", String::from_utf8_lossy(&response.body));
        }

        Commands::Routes { method } => {
            let methods = match method {
                Some(name) => {
                    let verb = Method::parse(&name)
                        .ok_or_else(|| anyhow::anyhow!("unknown method: {name}"))?;
                    vec![verb]
                }
                None => {
                    let mut all = Method::ANY.to_vec();
                    all.push(Method::Options);
                    all
                }
            };

            for verb in methods {
                for template in app.router().routes(verb) {
                    println!("{:<7} {template}", verb.as_str());
                }
            }
        }

        Commands::Url { template, params } => {
            let params = params
                .iter()
                .map(|pair| {
                    pair.split_once('=')
                        .ok_or_else(|| anyhow::anyhow!("expected name=value, got: {pair}"))
                })
                .collect::<anyhow::Result<PathParams>>()?;

            let path = app.router().url(&template, &params).ok_or_else(|| {
                anyhow::anyhow!("no route for {template} with the given parameters")
            })?;
            println!("{path}");
        }
    }

    app.db().disconnect(None).await;
    Ok(())
}
