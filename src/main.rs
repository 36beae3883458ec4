use color_eyre::{eyre::eyre, Result};
use shooter_control::config::{self, RobotConfig};
use shooter_control::controller::{ControllerHandle, XboxController};
use shooter_control::robot_container::RobotContainer;
use shooter_control::subsystems::{shared, SimHood, SimIndexer, SimShooter};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let robot_config = setup_config().await?;
    let shutdown = CancellationToken::new();

    info!("Initializing controller with {:?}", robot_config.controller);
    let (controller_handle, driver) =
        match ControllerHandle::spawn(Some(robot_config.controller.clone()), shutdown.clone()) {
            Ok((handle, driver)) => (Some(handle), driver),
            Err(e) => {
                warn!("No gamepad available ({}), running with a neutral controller", e);
                let (_state, driver) = XboxController::detached(robot_config.controller.port);
                (None, driver)
            }
        };

    let mut container = RobotContainer::new(
        driver,
        shared(SimShooter::default()),
        shared(SimHood::default()),
        shared(SimIndexer::default()),
    )
    .map_err(|e| eyre!("Failed to set up bindings: {}", e))?;

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        ctrl_c.cancel();
    });

    let mut ticker = interval(robot_config.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Robot loop running every {:?}", robot_config.period());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => container.run_cycle(),
        }
    }

    container.shutdown();
    if let Some(handle) = controller_handle {
        tokio::task::spawn_blocking(move || handle.shutdown()).await?;
    }
    info!("Shutdown complete");
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

async fn setup_config() -> Result<RobotConfig> {
    let path = config::default_path();
    if let Err(e) = RobotConfig::ensure_default(&path).await {
        warn!("Could not write default config: {}", e);
    }
    Ok(RobotConfig::load(&path).await)
}
