// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod host;
mod walker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::runtime::Handle;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use locdisp_app::{init_logging, ConfigFile};
use locdisp_core::{
    DynResult, LocationDisplayController, LocationSource, MethodCall, MethodResponse, Point,
    SimulatedSource, SpatialReference, TapConsumer,
};

use config::SimConfig;
use host::{HostChannel, HostLine, HostOverlays, HostSource, TapNotifier};
use walker::CircleWalk;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - location display dev host");
const OUTPUT_DRAIN_MS: u64 = 400;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

/// Everything a stdin line may need to reach.
struct Host {
    channel: Arc<HostChannel>,
    overlays: Arc<HostOverlays>,
    simulated: Arc<SimulatedSource>,
    controller: LocationDisplayController,
    tap_consumers: Vec<Arc<dyn TapConsumer>>,
    next_id: u64,
}

impl Host {
    fn handle_line(&mut self, line: &str) {
        let call: MethodCall = match serde_json::from_str(line) {
            Ok(call) => call,
            Err(e) => {
                error!("Invalid JSON on stdin: {} / {:?}", line, e);
                self.channel.emit(HostLine::Error {
                    error: format!("Invalid JSON: {}", e),
                });
                return;
            }
        };
        self.next_id += 1;
        let id = self.next_id;

        match call.method.as_str() {
            "setTrackingTapEnabled" => self.set_tracking_tap_enabled(id, call),
            "tap" => self.tap(id, call),
            "completeStart" => self.complete_start(id, call),
            _ => self.forward(id, call),
        }
    }

    fn set_tracking_tap_enabled(&self, id: u64, call: MethodCall) {
        let result = match call.arguments.as_bool() {
            Some(enabled) => {
                self.controller.set_tracking_tap_enabled(enabled);
                host_success(Value::Null)
            }
            None => host_error("expected a boolean"),
        };
        self.reply(id, call.method, Some(result));
    }

    fn tap(&self, id: u64, call: MethodCall) {
        let on_marker = call
            .arguments
            .get("marker")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let point = match (on_marker, self.simulated.map_location()) {
            (true, Some(point)) => Some(point),
            (true, None) => None,
            (false, _) => match (
                call.arguments.get("x").and_then(Value::as_f64),
                call.arguments.get("y").and_then(Value::as_f64),
            ) {
                (Some(x), Some(y)) => Some(Point::new(x, y, SpatialReference::WEB_MERCATOR)),
                _ => None,
            },
        };
        let handled = point.is_some_and(|p| self.overlays.hit_test(&p, &self.tap_consumers));
        debug!(
            "Tap at {:?} over {} overlays, handled={}",
            point,
            self.overlays.len(),
            handled
        );
        self.reply(id, call.method, Some(host_success(Value::Bool(handled))));
    }

    fn complete_start(&self, id: u64, call: MethodCall) {
        if !self.simulated.is_starting() {
            self.reply(id, call.method, Some(host_error("no start in progress")));
            return;
        }
        let outcome = match call.arguments.get("error").and_then(Value::as_str) {
            Some(message) => Err(message.to_string()),
            None => Ok(()),
        };
        self.simulated.complete_start(outcome);
        self.reply(id, call.method, Some(host_success(Value::Null)));
    }

    fn forward(&self, id: u64, call: MethodCall) {
        let method = call.method.clone();
        let Some(rx) = self.channel.dispatch(call) else {
            warn!("No handler bound for {}", method);
            self.reply(id, method, Some(MethodResponse::NotImplemented));
            return;
        };
        let channel = Arc::clone(&self.channel);
        tokio::spawn(async move {
            // A closed sink means the command does not reply.
            let result = rx.await.ok();
            channel.emit(HostLine::Reply { id, method, result });
        });
    }

    fn reply(&self, id: u64, method: String, result: Option<MethodResponse>) {
        self.channel.emit(HostLine::Reply { id, method, result });
    }
}

fn host_success(value: Value) -> MethodResponse {
    MethodResponse::Success { value }
}

fn host_error(message: &str) -> MethodResponse {
    MethodResponse::Error {
        code: "Invalid argument".to_string(),
        message: Some(message.to_string()),
        details: None,
    }
}

async fn run_writer(mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", SimConfig::example_combined_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = SimConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        SimConfig::load_from_default_paths()?
    };
    if cli.log_level.is_some() {
        cfg.general.log_level = cli.log_level.clone();
    }
    cfg.validate()
        .map_err(|e| format!("Invalid simulator configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let plan = cfg.source.start_plan();
    info!(
        "Starting locdisp-sim (start: {:?}, delay: {:?})",
        plan.behavior,
        plan.completion.as_ref().map(|(delay, _)| *delay)
    );

    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        if let Err(e) = run_writer(out_rx).await {
            error!("Output writer error: {:?}", e);
        }
    });

    let simulated = Arc::new(SimulatedSource::with_start_behavior(plan.behavior));
    let source: Arc<dyn LocationSource> = Arc::new(HostSource::new(
        Arc::clone(&simulated),
        plan.completion,
        Handle::current(),
    ));
    let channel = Arc::new(HostChannel::new(out_tx));
    let overlays = Arc::new(HostOverlays::default());

    let controller = LocationDisplayController::new(channel.clone(), source, overlays.clone());
    controller.set_delegate(Some(Arc::new(TapNotifier::new(channel.clone()))));
    let tap_consumers = vec![controller.tap_consumer()];

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let walk_task = tokio::spawn(walker::run_walker(
        Arc::clone(&simulated),
        CircleWalk::from_config(&cfg.source),
        Duration::from_millis(cfg.source.update_interval_ms),
        shutdown_rx,
    ));

    let mut host = Host {
        channel,
        overlays,
        simulated,
        controller,
        tap_consumers,
        next_id: 0,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        host.handle_line(trimmed);
                    }
                }
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    error!("stdin read error: {:?}", e);
                    break;
                }
            },
            _ = signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }

    host.controller.dispose();
    let _ = shutdown_tx.send(true);
    if let Err(e) = walk_task.await {
        warn!("Walker task ended abnormally: {:?}", e);
    }
    drop(host);

    if tokio::time::timeout(Duration::from_millis(OUTPUT_DRAIN_MS), writer)
        .await
        .is_err()
    {
        debug!("Output writer still busy at exit");
    }
    Ok(())
}
