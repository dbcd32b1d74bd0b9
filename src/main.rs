//! asus-numpad - Asus touchpad numpad / dial driver
//!
//! Turns the touchpad of Asus laptops with a printed numpad into a
//! numeric keypad (or a rotary dial), emitting keys through uinput.

mod bus;
mod cli;
mod config;
mod constants;
mod device;
mod error;
mod input;
mod interpreter;
mod layout;
mod utils;

use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Duration;

use bus::{BusCommandSender, I2cTransfer, NoBus};
use cli::CliArgs;
use config::Config;
use device::{DeviceBinding, ProcDevices, RetryPolicy};
use input::evdev::{event_node_path, EvdevTouchpad, KeyboardMonitor, UinputKeyboard};
use error::NumpadError;
use input::{HostDevices, RawEventSource, VirtualKeyboard};
use interpreter::{capability_set, Interpreter, InterpreterSettings};
use layout::Layout;

/// Print help message
fn print_help() {
    println!(
        r#"asus-numpad {} - numpad and dial driver for Asus touchpads

USAGE:
    asus-numpad [OPTIONS] [MODEL] [PERCENTAGE_KEY] [MODES]

ARGUMENTS:
    MODEL                   Layout model (default: m433ia, see --list-models)
    PERCENTAGE_KEY          evdev code or name sent with Shift for "%" (default: 6 = KEY_5)
    MODES                   Mode cycle, e.g. "0 1 2" (0 off, 1 numpad, 2 dial)

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --dial-coords "X Y R"   Dial pivot and radius (default: "750 850 450")
    -c, --config PATH       Read this config file instead of the default search
    --list-models           List available layout models
    --init-config[=system]  Generate config file (user or /etc)
    -f, --force             Overwrite config file without confirmation

EXAMPLES:
    sudo asus-numpad m433ia                 Numpad with "%" on Shift+5
    sudo asus-numpad ux581l 40 "1 2"        Numpad/dial only, "%" on Shift+'
    RUST_LOG=debug sudo -E asus-numpad      Log every touch

CONFIG FILE:
    ~/.config/asus-numpad/config.toml
    /etc/asus-numpad/config.toml
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// --init-config: write the default template, asking before overwriting
fn init_config(system: bool, force: bool) -> Result<()> {
    let config_path = Config::template_path(system)?;
    if config_path.exists() && !force {
        println!("Config file already exists: {}", config_path.display());
        print!("Overwrite? [y/N]: ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    match Config::write_default(system, true) {
        Ok(path) => {
            println!("Config file generated: {}", path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to generate config: {:#}", e);
            Err(e)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;

    if cli.help {
        print_help();
        return Ok(());
    }

    if cli.version {
        println!("asus-numpad {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Some(system) = cli.init_config {
        return init_config(system, cli.force);
    }

    let mut cfg = match &cli.config_path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load(),
    };
    cli.apply(&mut cfg);

    if cli.list_models {
        for model in layout::available_models(&cfg.layouts) {
            println!("{}", model);
        }
        return Ok(());
    }

    let layout = layout::resolve(&cfg.model, &cfg.layouts)?;
    let settings = cfg.interpreter_settings()?;
    info!(
        "asus-numpad starting: model {}, {}x{} grid, modes {:?}, percentage key {}",
        layout.model, layout.rows, layout.cols, settings.modes, settings.percentage_key
    );

    utils::setup_signal_handlers();
    run(&cfg, layout, settings)
}

/// Discover devices, bind them and run until a shutdown signal
fn run(cfg: &Config, layout: Layout, settings: InterpreterSettings) -> Result<()> {
    let policy = RetryPolicy {
        attempts: layout.device_search_attempts,
        interval: layout.device_search_interval,
    };
    let located = match device::locate(
        &mut ProcDevices,
        policy,
        std::thread::sleep,
        utils::shutdown_requested,
    ) {
        Ok(located) => located,
        Err(NumpadError::Interrupted) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut touchpad = EvdevTouchpad::open(&event_node_path(located.touchpad_event))
        .context("Failed to open touchpad")?;
    let mut monitor = KeyboardMonitor::open(&event_node_path(located.keyboard_event))
        .context("Failed to open keyboard")?;
    let binding = DeviceBinding::new(located, touchpad.bounds());
    debug!("{:?}", binding);

    let keyboard = UinputKeyboard::create(capability_set(&layout, &settings))?;
    debug!("Virtual keyboard keys: {:?}", keyboard.supported_keys());

    let poll = Duration::from_millis(cfg.poll.interval_ms);
    if cfg.bus.enabled {
        let bus = I2cTransfer::new(&cfg.bus.program, binding.i2c_bus, cfg.bus.address);
        let interpreter = Interpreter::new(layout, binding.bounds, settings, keyboard, bus);
        serve(interpreter, &mut touchpad, &mut monitor, poll)
    } else {
        info!("Bus control disabled, backlight and dial firmware are left alone");
        let interpreter = Interpreter::new(layout, binding.bounds, settings, keyboard, NoBus);
        serve(interpreter, &mut touchpad, &mut monitor, poll)
    }
}

/// Polling loop
fn serve<B: BusCommandSender>(
    mut interpreter: Interpreter<UinputKeyboard, B>,
    touchpad: &mut EvdevTouchpad,
    monitor: &mut KeyboardMonitor,
    poll: Duration,
) -> Result<()> {
    interpreter.start(&mut HostDevices {
        touchpad: &mut *touchpad,
        keyboard: &mut *monitor,
    });
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);

    let result = loop {
        match touchpad.fetch() {
            Ok(events) => {
                let mut host = HostDevices {
                    touchpad: &mut *touchpad,
                    keyboard: &mut *monitor,
                };
                for event in events {
                    interpreter.handle(event, &mut host);
                }
            }
            Err(e) => break Err(e),
        }

        monitor.drain();

        if utils::shutdown_requested() {
            info!("Shutdown requested");
            break Ok(());
        }

        std::thread::sleep(poll);
    };

    interpreter.shutdown(&mut HostDevices {
        touchpad: &mut *touchpad,
        keyboard: &mut *monitor,
    });
    debug!("Final state: {:?}", interpreter.state());
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
    result
}
