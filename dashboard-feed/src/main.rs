mod config;

use crate::config::{Config, Transport};
use acquisition::LinkStatus;
use std::{process::ExitCode, sync::Arc, thread};
use telemetry::TelemetrySnapshot;

fn main() -> ExitCode {
    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        eprintln!("Please create a dashboard-feed/config.toml file.");
        eprintln!("See the example config.toml for the required format.");
        std::process::exit(1);
    });

    println!("Loaded configuration:");
    match config.transport {
        Transport::Serial => println!(
            "  Link: serial {} @ {} baud",
            config.serial.path, config.serial.baud_rate
        ),
        Transport::Spi => println!(
            "  Link: SPI {} @ {} Hz",
            config.spi.path, config.spi.clock_hz
        ),
    }
    println!("  Poll cadence: every {:?}", config.consumer.poll_interval());

    let handle = match config.transport {
        Transport::Serial => acquisition::spawn(config.serial_config(), config.acquisition_config()),
        Transport::Spi => acquisition::spawn(config.spi_config(), config.acquisition_config()),
    };
    let store = handle.store();

    // The dashboard half: poll the store at a fixed cadence and render (here,
    // print) whatever is current. The poll never blocks on link I/O.
    let mut last_status = store.status();
    let mut last_snapshot: Option<Arc<TelemetrySnapshot>> = None;
    println!("[dashboard] {last_status}");

    loop {
        let status = store.status();
        if status != last_status {
            println!("[dashboard] {status}");
            last_status = status;
        }
        if status == LinkStatus::Fatal {
            eprintln!("[dashboard] telemetry link is down for good, exiting");
            handle.shutdown();
            return ExitCode::FAILURE;
        }

        if let Some(snapshot) = store.current() {
            let changed = last_snapshot
                .as_ref()
                .is_none_or(|old| !Arc::ptr_eq(&snapshot, old));
            if changed {
                println!(
                    "speed {:6.1} km/h | rpm {:7.0} | power {:7.1} kW | current {:7.1} A | soc {:5.1} % | cell {:5.1} C | {}",
                    snapshot.speed,
                    snapshot.rpm,
                    snapshot.power,
                    snapshot.current,
                    snapshot.soc,
                    snapshot.cell_temp,
                    snapshot.error
                );
                last_snapshot = Some(snapshot);
            }
        }

        thread::sleep(config.consumer.poll_interval());
    }
}
