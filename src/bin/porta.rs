//! porta CLI: run the API server, or talk to the assistant from a terminal.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use porta_rs::api;
use porta_rs::config::Config;
use porta_rs::engine::RequestTracker;
use porta_rs::executor::LazyExecutor;
use porta_rs::llm::agent_factory;
use porta_rs::model::{ChatRequest, ChatTurn, DEFAULT_USER_ID, Status};
use porta_rs::normalize::normalize_response;
use porta_rs::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "porta", about = "Porta finance assistant backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the request admission loop
    Serve {
        /// Bind host (overrides PORTA_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides PORTA_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Maximum requests processing at once (overrides MAX_CONCURRENT_REQUESTS)
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// Result records kept before eviction (overrides MAX_STORED_REQUESTS)
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Send one message through the request queue and print the answer
    Ask {
        message: String,
        /// User identifier
        #[arg(long, default_value = DEFAULT_USER_ID)]
        user: String,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
    /// Chat with the assistant in the terminal
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve {
            host,
            port,
            max_concurrent,
            capacity,
        } => {
            let _guard = telemetry(&config, true)?;
            cmd_serve(config, host, port, max_concurrent, capacity).await
        }
        Command::Ask {
            message,
            user,
            timeout,
        } => {
            let _guard = telemetry(&config, false)?;
            cmd_ask(config, message, user, timeout).await
        }
        Command::Interactive => {
            let _guard = telemetry(&config, false)?;
            cmd_interactive(config).await
        }
    }
}

/// The server exports to OTLP when configured; one-shot commands log only.
fn telemetry(config: &Config, export: bool) -> anyhow::Result<TelemetryGuard> {
    let guard = init_telemetry(TelemetryConfig {
        endpoint: if export {
            config.otel_endpoint.clone()
        } else {
            None
        },
        service_name: "porta".to_string(),
        log_level: config.log_level.clone(),
    })?;
    Ok(guard)
}

async fn cmd_serve(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
    max_concurrent: Option<usize>,
    capacity: Option<usize>,
) -> anyhow::Result<()> {
    let mut tracker_config = config.tracker_config();
    if let Some(n) = max_concurrent {
        anyhow::ensure!(n > 0, "--max-concurrent must be positive");
        tracker_config.max_concurrent = n;
    }
    if let Some(n) = capacity {
        anyhow::ensure!(n > 0, "--capacity must be positive");
        tracker_config.capacity = n;
    }

    let executor = Arc::new(LazyExecutor::new(agent_factory(&config)));
    let tracker = RequestTracker::new(Arc::clone(&executor), tracker_config);

    // Build the agent up front so the first request doesn't pay for it.
    // Failure here is not fatal; each request will retry and report it.
    tokio::spawn(async move {
        match executor.get().await {
            Ok(_) => info!("AI agent ready"),
            Err(e) => warn!(error = %e, "AI agent failed to initialize, AI features may not work"),
        }
    });

    let admission = tracker.clone();
    let admission_handle = tokio::spawn(async move { admission.run().await });

    let addr = format!(
        "{}:{}",
        host.unwrap_or(config.host),
        port.unwrap_or(config.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let stopper = tracker.clone();
    api::serve(listener, tracker, async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown requested");
        stopper.shutdown();
    })
    .await?;

    admission_handle.await??;
    Ok(())
}

async fn cmd_ask(
    config: Config,
    message: String,
    user: String,
    timeout: u64,
) -> anyhow::Result<()> {
    let executor = Arc::new(LazyExecutor::new(agent_factory(&config)));
    let tracker = RequestTracker::new(executor, config.tracker_config());

    let admission = tracker.clone();
    tokio::spawn(async move { admission.run().await });

    let submitted = tracker.submit(ChatRequest::new(message).user(user))?;
    info!(request_id = %submitted.request_id, "request queued");

    let record = tokio::time::timeout(
        Duration::from_secs(timeout),
        tracker.wait(submitted.request_id, Duration::from_millis(200)),
    )
    .await
    .map_err(|_| anyhow::anyhow!("no answer within {timeout}s"))??;
    tracker.shutdown();

    match record.status {
        Status::Completed => {
            println!("{}", record.response.unwrap_or_default());
            Ok(())
        }
        _ => anyhow::bail!(record.error.unwrap_or_else(|| "request failed".to_string())),
    }
}

async fn cmd_interactive(config: Config) -> anyhow::Result<()> {
    let executor = LazyExecutor::new(agent_factory(&config));
    let agent = executor.get().await?;

    println!("=== Porta - your finance assistant ===");
    println!("Try: 'add AAPL to my watchlist', 'list my portfolio'.");
    println!("Type 'quit' or 'exit' to stop.");

    let mut history: Vec<ChatTurn> = Vec::new();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let input = line?.trim().to_string();
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.execute(&input, &history).await {
            Ok(value) => {
                let reply = normalize_response(&value);
                println!("Porta: {reply}");
                history.push(ChatTurn::user(input));
                history.push(ChatTurn::assistant(reply));
            }
            Err(e) => {
                println!("Error: {e}");
                println!("Please try again.");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
