//! bmc-inventoryd entry point: CLI dispatch, signal handlers, async runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bmc_inventory::app::cli::Args;
use bmc_inventory::app::logging::{init_tracing, level_filter, reload_level, resolve_level};
use bmc_inventory::config::{load_config, DaemonConfig};
use bmc_inventory::hotplug::HotplugMonitor;
use bmc_inventory::inventory::{load_inventory, platform_tree};
use bmc_inventory::ipc::IpcServer;
use bmc_inventory::peer::{DryRunConnector, PeerConnector, PeerKind, ServiceLink, WebSocketConnector};
use bmc_inventory::sensor::{AccessCondition, HwmonAccess};
use bmc_inventory::InventoryEngine;

fn build_engine(config: &DaemonConfig, dry_run: bool) -> Result<InventoryEngine> {
    let mut tree = platform_tree(&config.platform.root_path)?;
    load_inventory(
        Path::new(&config.platform.inventory_file),
        &mut tree,
        &config.platform.root_path,
    )?;

    let link = |kind: PeerKind, url: &str| {
        let connector: Arc<dyn PeerConnector> = if dry_run {
            Arc::new(DryRunConnector::new(kind))
        } else {
            Arc::new(WebSocketConnector::new(kind, url))
        };
        ServiceLink::new(kind, connector, config.peers.call_timeout())
    };

    let engine = InventoryEngine::new(
        tree,
        &config.platform.root_path,
        link(PeerKind::Sensor, &config.peers.sensor.url),
        link(PeerKind::Fru, &config.peers.fru.url),
    )?;
    Ok(engine)
}

fn spawn_sensor_refresh(
    engine: Arc<InventoryEngine>,
    period: Duration,
    conditions: AccessCondition,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!("Sensor refresh every {:?} under {:?}", period, conditions);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let ok = engine.refresh_sensors(&HwmonAccess, conditions).await;
                    debug!("Sensor refresh: {} successful read(s)", ok);
                }
            }
        }
        info!("Sensor refresh stopped");
    })
}

fn spawn_sighup_handler(config_path: PathBuf, shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sighup) => sighup,
        Err(e) => {
            warn!("Failed to setup SIGHUP handler: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sighup.recv() => {}
            }
            info!("SIGHUP received, reloading log level configuration");

            match load_config(&config_path).await {
                Ok(new_config) => {
                    let level = &new_config.logging.log_level;
                    let filter = level_filter(level).unwrap_or("info");
                    match reload_level(filter) {
                        Ok(()) => info!("Log level reloaded: {}", level.to_uppercase()),
                        Err(e) => error!("Failed to reload log level: {}", e),
                    }
                }
                Err(e) => error!("Failed to reload config: {:#}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .await
        .with_context(|| format!("Failed to load configuration {:?}", args.config))?;

    let env_level = std::env::var("LOG_LEVEL").ok();
    let filter = resolve_level(args.log_level.as_deref(), env_level.as_deref(), &config.logging.log_level);
    init_tracing(filter);

    if args.show_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("bmc-inventoryd v{} starting", env!("CARGO_PKG_VERSION"));
    if args.dry_run {
        info!("[DRY RUN] Peer calls will be logged, not sent");
    }

    let engine = Arc::new(build_engine(&config, args.dry_run)?);

    if args.check {
        let frus = engine.fru_list().await;
        println!("FRUs under {}: {}", config.platform.root_path, frus.len());
        for name in &frus {
            println!("  {}", name);
        }
        println!(
            "Internally detectable FRUs: {}",
            engine.count_internally_detectable_frus().await
        );
        return Ok(());
    }

    for (peer, endpoint) in [
        (PeerKind::Sensor, &config.peers.sensor),
        (PeerKind::Fru, &config.peers.fru),
    ] {
        if endpoint.connect_on_start && !engine.set_peer_available(peer, true).await {
            warn!("{} peer not reachable at startup; waiting for setPeerAvailable", peer);
        }
    }

    let shutdown = CancellationToken::new();

    let monitor = HotplugMonitor::new(Arc::clone(&engine), config.hotplug.poll_interval());
    let monitor_task = monitor.start(shutdown.clone()).await;

    let conditions = config
        .sensors
        .access_conditions()
        .map_err(|name| anyhow::anyhow!("Unknown sensor access condition {:?}", name))?;
    let refresh_task = spawn_sensor_refresh(
        Arc::clone(&engine),
        config.sensors.refresh_interval(),
        conditions,
        shutdown.clone(),
    );

    let server = IpcServer::new(&config.ipc.socket_path, Arc::clone(&engine));
    let listener = server.bind()?;
    let ipc_task = tokio::spawn(server.run(listener, shutdown.clone()));

    spawn_sighup_handler(args.config.clone(), shutdown.clone());

    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received (Ctrl+C)");
    shutdown.cancel();

    if let Some(task) = monitor_task {
        if let Err(e) = task.await {
            error!("Hot-plug monitor task failed: {}", e);
        }
    }
    if let Err(e) = refresh_task.await {
        error!("Sensor refresh task failed: {}", e);
    }
    match ipc_task.await {
        Ok(Err(e)) => error!("IPC server error: {:#}", e),
        Err(e) => error!("IPC server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("bmc-inventoryd shutdown complete");
    Ok(())
}
