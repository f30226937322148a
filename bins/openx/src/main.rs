//! OpenExchange CLI and server binary.
//!
//! This is the "invocation surface" collaborator of `spec.md` §6, kept
//! intentionally thin: it parses a handful of subcommands, wires up an
//! `Exchange` behind a `CompositeWriter`, runs cold-start `rebuild`, and
//! for `serve` drives the exchange from newline-delimited commands read
//! off stdin until EOF or Ctrl-C. There is no HTTP/gRPC/WebSocket layer
//! here; that is an external collaborator per `spec.md` §1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use common::{Clock, OrderSide, OrderType, SystemClock};
use config::{generate_default_config, load_config, save_config, validate, ExchangeRuntimeConfig};
use exchange::{Exchange, ExchangeError, SubmitOrderRequest};
use observability::{init_logging, LogFormat};
use storage::{BackupWriter, BroadcastWriter, CompositeWriter, QueuedDurableWriter, Writer};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "openx", about = "Multi-instrument limit order matching engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the exchange: rebuild from the durable journal, then accept
    /// commands on stdin (one operation per line) until EOF or Ctrl-C.
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Validate a configuration file without starting the exchange.
    Validate {
        #[arg(long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Write a default configuration file to disk.
    Init {
        #[arg(long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config } => serve(&config).await,
        Command::Validate { config } => validate_command(&config),
        Command::Init { output } => init_command(&output),
    }
}

async fn serve(config_path: &PathBuf) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("failed to load configuration from {config_path:?}"))?;

    let format = match config.logging.format.as_str() {
        "json" => LogFormat::Json,
        "compact" => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(&config.exchange.name, format)?;

    if let Err(errors) = validate(&config) {
        for err in &errors {
            error!("{err}");
        }
        anyhow::bail!("configuration is invalid, see errors above");
    }

    info!(exchange = %config.exchange.name, "starting exchange");

    let durable = Arc::new(QueuedDurableWriter::new(
        config.durable_writer.queue_capacity,
        config.durable_writer.max_retries,
        config.durable_writer.retry_backoff_ms,
    ));
    let backup = Arc::new(BackupWriter::new(
        config.backup.directory.clone(),
        config.durable_writer.queue_capacity,
    ));
    let broadcast = Arc::new(BroadcastWriter::new(config.broadcast.channel_capacity));

    let writers: Vec<Arc<dyn Writer>> = vec![durable.clone(), backup, broadcast];
    let writer: Arc<dyn Writer> = Arc::new(CompositeWriter::new(writers));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let exchange = Arc::new(Exchange::new(writer, clock));
    exchange.rebuild().await.context("cold-start rebuild failed")?;

    info!("ready; reading commands from stdin (type 'help' for the command list)");
    run_command_loop(&exchange).await;

    info!("draining durable writer before exit");
    durable.shutdown().await;
    Ok(())
}

async fn run_command_loop(exchange: &Arc<Exchange>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl-C, shutting down");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("stdin closed, shutting down");
                break;
            }
            Err(err) => {
                error!(%err, "error reading stdin");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match dispatch(exchange, line).await {
            Ok(output) => println!("{output}"),
            Err(message) => println!("{{\"status\":\"ERROR\",\"details\":{message:?}}}"),
        }
    }
}

/// Parses and executes one REPL line, returning the JSON-serialized
/// response on success or a human-readable error string on failure.
/// Field-level parsing failures never reach the `Exchange`: no order id
/// is consumed and no writer event is emitted, per `spec.md` §7.
async fn dispatch(exchange: &Arc<Exchange>, line: &str) -> std::result::Result<String, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or("");

    match verb {
        "help" => Ok(HELP.to_string()),

        "create-book" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            let name = next_str(&mut parts, "name")?;
            let description = next_str(&mut parts, "description")?;
            let admin_party_id = next_str(&mut parts, "admin_party_id")?;
            match exchange
                .create_book(instrument_id, name, description, admin_party_id)
                .await
            {
                Ok(()) => Ok(format!("{{\"status\":\"CREATED\",\"instrument_id\":{instrument_id}}}")),
                Err(err) => Err(render_error(err)),
            }
        }

        "submit" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            let side = parse_side(&next_str(&mut parts, "side")?)?;
            let order_type = parse_order_type(&next_str(&mut parts, "order_type")?)?;
            let price_token = next_str(&mut parts, "price_cents (or '-')")?;
            let price_cents = if price_token == "-" {
                None
            } else {
                Some(price_token.parse::<u64>().map_err(|_| "price_cents must be an integer or '-'".to_string())?)
            };
            let quantity = next_u64(&mut parts, "quantity")?;
            let party_id = next_str(&mut parts, "party_id")?;

            let request = SubmitOrderRequest {
                instrument_id,
                side,
                order_type,
                price_cents,
                quantity,
                party_id,
            };
            match exchange.submit_order(request).await {
                Ok(response) => serde_json::to_string(&response).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        "cancel" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            let order_id = next_u64(&mut parts, "order_id")?;
            let party_id = next_str(&mut parts, "party_id")?;
            match exchange.cancel_order(instrument_id, order_id, &party_id).await {
                Ok(()) => Ok(format!("{{\"status\":\"CANCELLED\",\"order_id\":{order_id}}}")),
                Err(err) => Err(render_error(err)),
            }
        }

        "cancel-all" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            let party_id = next_str(&mut parts, "party_id")?;
            match exchange.cancel_all_for_party(instrument_id, &party_id).await {
                Ok(result) => serde_json::to_string(&result).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        "rebuild" => match exchange.rebuild().await {
            Ok(()) => Ok("{\"status\":\"REBUILT\"}".to_string()),
            Err(err) => Err(render_error(err)),
        },

        "list-instruments" => {
            let instruments = exchange.list_instruments().await;
            serde_json::to_string(&instruments).map_err(|e| e.to_string())
        }

        "list-orders" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            match exchange.order_history(instrument_id).await {
                Ok(orders) => serde_json::to_string(&orders).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        "list-live-orders" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            match exchange.live_orders(instrument_id).await {
                Ok(orders) => serde_json::to_string(&orders).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        "list-trades" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            match exchange.trades(instrument_id).await {
                Ok(trades) => serde_json::to_string(&trades).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        "metrics" => {
            let instrument_id = next_u64(&mut parts, "instrument_id")?;
            match exchange.book_metrics(instrument_id).await {
                Ok(snapshot) => serde_json::to_string(&snapshot).map_err(|e| e.to_string()),
                Err(err) => Err(render_error(err)),
            }
        }

        other => Err(format!("unknown command '{other}', type 'help' for the list")),
    }
}

const HELP: &str = "commands: create-book <instrument_id> <name> <description> <admin_party_id> | \
submit <instrument_id> <buy|sell> <market|gtc|ioc> <price_cents|-> <quantity> <party_id> | \
cancel <instrument_id> <order_id> <party_id> | cancel-all <instrument_id> <party_id> | \
rebuild | list-instruments | list-orders <instrument_id> | list-live-orders <instrument_id> | \
list-trades <instrument_id> | metrics <instrument_id> | quit";

fn next_str<'a>(parts: &mut impl Iterator<Item = &'a str>, field: &str) -> std::result::Result<String, String> {
    parts
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| format!("missing field: {field}"))
}

fn next_u64<'a>(parts: &mut impl Iterator<Item = &'a str>, field: &str) -> std::result::Result<u64, String> {
    let raw = next_str(parts, field)?;
    raw.parse::<u64>().map_err(|_| format!("{field} must be a non-negative integer, got '{raw}'"))
}

fn parse_side(raw: &str) -> std::result::Result<OrderSide, String> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => Err(format!("side must be 'buy' or 'sell', got '{other}'")),
    }
}

fn parse_order_type(raw: &str) -> std::result::Result<OrderType, String> {
    match raw.to_ascii_lowercase().as_str() {
        "market" => Ok(OrderType::Market),
        "gtc" => Ok(OrderType::Gtc),
        "ioc" => Ok(OrderType::Ioc),
        other => Err(format!("order_type must be 'market', 'gtc', or 'ioc', got '{other}'")),
    }
}

fn render_error(err: ExchangeError) -> String {
    format!("{{\"status\":\"ERROR\",\"details\":{:?}}}", err.to_string())
}

fn validate_command(config_path: &PathBuf) -> Result<()> {
    let config: ExchangeRuntimeConfig = load_config(config_path)
        .with_context(|| format!("failed to load configuration from {config_path:?}"))?;

    println!("\n=== Configuration Validation Report ===\n");
    println!("Exchange: {}", config.exchange.name);
    println!("Backup directory: {}", config.backup.directory);
    println!("Durable writer queue capacity: {}", config.durable_writer.queue_capacity);
    println!("Broadcast channel capacity: {}", config.broadcast.channel_capacity);
    println!();

    match validate(&config) {
        Ok(()) => {
            println!("[ok] Configuration is valid!");
            Ok(())
        }
        Err(errors) => {
            println!("Errors ({}):", errors.len());
            for err in &errors {
                warn!("{err}");
                println!("  [error] {err}");
            }
            anyhow::bail!("configuration validation failed");
        }
    }
}

fn init_command(output_path: &PathBuf) -> Result<()> {
    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {parent:?}"))?;
        }
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created at {output_path:?}");
    println!("Edit it, then run:");
    println!("  openx validate --config {output_path:?}");
    println!("  openx serve --config {output_path:?}");
    Ok(())
}
