use clap::Parser;
use owo_colors::OwoColorize;

use zeno::cli::{Cli, Commands, GlobalOpts};
use zeno::commands;
use zeno::config::model::LogConfig;
use zeno::config::{self, resolve::resolve_config};
use zeno::engine::Engine;

/// BSD sysexits "internal software error", used for startup failures.
const EX_SOFTWARE: i32 = 70;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run(cli.global).await,
        Commands::Init => {
            init_logging(cli.global.verbose, &LogConfig::default());
            commands::init::run()
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(EX_SOFTWARE);
    }
}

async fn run(global: GlobalOpts) -> anyhow::Result<()> {
    let config_path = resolve_config(global.config_file.as_deref())?;
    let config = config::load_config(&config_path)?;
    init_logging(global.verbose, &config.log);

    eprintln!(
        "{} v{} -- {}",
        "zeno".cyan().bold(),
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let engine = Engine::new(config)?;
    let shutdown = engine.shutdown_token();
    tokio::spawn(async move {
        wait_for_signal().await;
        eprintln!("\nShutting down...");
        shutdown.cancel();
    });

    engine.run().await
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Initialize the tracing subscriber from the `log:` config section.
/// `RUST_LOG` overrides everything when set.
fn init_logging(verbose: bool, log: &LogConfig) {
    let default_level = if log.silent {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let directives = if log.main_only {
        format!("off,zeno={default_level}")
    } else {
        default_level.to_string()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if log.add_time {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
