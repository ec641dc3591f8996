//! SecureLock emulator.
//!
//! Runs the access controller on a simulated MFRC522, a mock keypad, relay
//! and maintenance button, driven by commands typed on stdin.
//!
//! # Usage
//!
//! ```bash
//! # Defaults, no enrolled users
//! securelock
//!
//! # Sample configuration and user directory
//! securelock --config crates/securelock-cli/config/securelock.toml
//!
//! RUST_LOG=securelock_rfid=trace securelock --config ...
//! ```

mod config;
mod console;
mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use securelock_controller::{AccessController, ControlLoop, FaultSignal, LoopExit};
use securelock_crypto::{AuditKey, StandardCrypto};
use securelock_hardware::KeypadPinReader;
use securelock_hardware::mock::{
    MockActuator, MockActuatorHandle, MockButton, MockButtonHandle, MockKeypad, MockKeypadHandle,
};
use securelock_network::{CommandSender, RemoteCommand};
use securelock_rfid::Mfrc522;
use securelock_rfid::sim::{SimulatedMfrc522, SimulatedMfrc522Handle};
use securelock_storage::{StaticDirectory, UserDirectory};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::console::{ConsoleCommand, HELP};
use crate::telemetry::Telemetry;

/// SecureLock access controller emulator
#[derive(Parser, Debug)]
#[command(name = "securelock")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

const RESET_FAILED: &str = "Reader initialization failed after reset";

/// Console requests the control loop itself must serve.
#[derive(Debug)]
enum Control {
    Reset,
    Quit,
}

enum Wake {
    Exit(LoopExit),
    Console(Option<Control>),
}

/// Everything the console drives besides the loop.
struct Devices {
    chip: SimulatedMfrc522Handle,
    keypad: MockKeypadHandle,
    button: MockButtonHandle,
    relay: MockActuatorHandle,
    commands: CommandSender,
    faults: FaultSignal,
    hold: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!(version = securelock_core::VERSION, "securelock starting");

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    let directory = match &config.users {
        Some(path) => StaticDirectory::from_json_file(path)
            .with_context(|| format!("Failed to load users from {}", path.display()))?,
        None => {
            warn!("no user directory configured, every card will be rejected");
            StaticDirectory::from_records(Vec::new())?
        }
    };
    info!(users = directory.len(), "user directory loaded");

    let audit_key = match config.telemetry.audit_key()? {
        Some(key) => key,
        None => {
            warn!("no audit key configured, generated a random one");
            AuditKey::generate()
        }
    };

    let telemetry = Telemetry::new(config.telemetry.tcp());
    let commands = telemetry.command_sender();

    let (chip_device, chip) = SimulatedMfrc522::new();
    let (keypad_device, keypad) = MockKeypad::new();
    let (button_device, button) = MockButton::new();
    let (actuator, relay) = MockActuator::new();

    let hold = config.controller.maintenance_hold();
    let controller = AccessController::new(
        directory,
        StandardCrypto,
        actuator,
        telemetry,
        audit_key,
        config.controller,
    )?;
    let mut control = ControlLoop::new(
        controller,
        Mfrc522::new(chip_device, config.reader),
        KeypadPinReader::new(keypad_device),
        button_device,
    );
    control.start().await.context("Reader initialization failed")?;

    let devices = Devices {
        chip,
        keypad,
        button,
        relay,
        commands,
        faults: control.fault_signal(),
        hold,
    };
    let (control_tx, mut control_rx) = mpsc::channel(8);
    tokio::spawn(run_console(devices, control_tx));

    println!("{HELP}");

    let mut faulted = false;
    loop {
        let wake = if faulted {
            Wake::Console(control_rx.recv().await)
        } else {
            tokio::select! {
                exit = control.run() => Wake::Exit(exit),
                request = control_rx.recv() => Wake::Console(request),
            }
        };

        match wake {
            Wake::Exit(LoopExit::Command(RemoteCommand::Status)) => {
                let line = control.status_line();
                info!(status = %line, "status requested");
                control.controller_mut().report(&line).await;
            }
            Wake::Exit(LoopExit::Command(RemoteCommand::Reboot)) => {
                info!("reboot requested");
                control.reset().await.context(RESET_FAILED)?;
            }
            Wake::Exit(LoopExit::Command(other)) => warn!(command = %other, "command not handled"),
            Wake::Exit(LoopExit::Faulted(fault)) => {
                error!(%fault, "controller halted, type 'reset' to recover");
                faulted = true;
            }
            Wake::Console(Some(Control::Reset)) => {
                control.reset().await.context(RESET_FAILED)?;
                faulted = false;
            }
            Wake::Console(Some(Control::Quit) | None) => break,
        }
    }

    info!("shutting down");
    Ok(())
}

async fn run_console(devices: Devices, control: mpsc::Sender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Card(uid) => devices.chip.present_card(uid),
            ConsoleCommand::Remove => devices.chip.remove_card(),
            ConsoleCommand::Keys(keys) => {
                if let Err(e) = devices.keypad.type_keys(&keys).await {
                    println!("{e}");
                }
            }
            ConsoleCommand::Unlock => {
                devices.commands.push("UNLOCK");
            }
            ConsoleCommand::Status => {
                devices.commands.push("STATUS");
            }
            ConsoleCommand::Hold => {
                devices.button.press();
                tokio::time::sleep(devices.hold + Duration::from_millis(100)).await;
                devices.button.release();
            }
            ConsoleCommand::Fault(fault) => {
                devices.faults.raise(fault);
            }
            ConsoleCommand::Reset => {
                if control.send(Control::Reset).await.is_err() {
                    break;
                }
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{HELP}"),
        }

        println!(
            "relay: {:?}, card on reader: {}",
            devices.relay.line(),
            devices.chip.card_present()
        );
    }

    control.send(Control::Quit).await.ok();
}
