use color_eyre::{eyre::eyre, Result};
use padnorm::controller::collector::{BackendEvent, CollectorHandle, CollectorSettings};
use padnorm::mapping::symbols::StandardButton;
use padnorm::{DeviceIdentity, EngineConfig, MappingDatabase, MappingEngine};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    // Config path from the first argument, else the user config dir
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(EngineConfig::default_path)
        .ok_or_else(|| eyre!("No config directory available"))?;
    let config = EngineConfig::load(&config_path)?;

    let (database, _) = MappingDatabase::load(&config.database, &config.custom_mappings);
    let database = Arc::new(database);
    let mut engine = MappingEngine::new(database.clone(), &config);

    let (backend_sender, mut backend_receiver) = mpsc::channel(1000);
    let collector = CollectorHandle::spawn(
        Some(CollectorSettings::from(config.backend.clone())),
        database,
        backend_sender,
    )
    .map_err(|e| eyre!("Failed to spawn collector: {}", e))?;

    // Last pressed set per device, only changes are logged
    let mut pressed: HashMap<DeviceIdentity, Vec<StandardButton>> = HashMap::new();

    loop {
        tokio::select! {
            event = backend_receiver.recv() => match event {
                Some(BackendEvent::Connected { identity, timestamp }) => {
                    info!("[{}] Connected {} ({})", timestamp.format("%H:%M:%S"), identity.name, identity.guid);
                    engine.connect(&identity);
                }
                Some(BackendEvent::Disconnected { identity, timestamp }) => {
                    info!("[{}] Disconnected {} ({})", timestamp.format("%H:%M:%S"), identity.name, identity.guid);
                    engine.disconnect(&identity);
                    pressed.remove(&identity);
                }
                Some(BackendEvent::Sample(sample)) => {
                    let snapshot = engine.poll(&sample);
                    let now_pressed = snapshot.state.pressed_buttons();
                    let identity = sample.identity();
                    if pressed.get(&identity) != Some(&now_pressed) {
                        info!(
                            "{} [{:?}] pressed: {:?} axes: {:?}",
                            snapshot.name, snapshot.source, now_pressed, snapshot.state.axes
                        );
                        pressed.insert(identity, now_pressed);
                    }
                }
                None => {
                    if collector.is_finished() {
                        warn!("Collector stopped, shutting down");
                    }
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    debug!("{} devices cached at shutdown", engine.cached_devices());
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
