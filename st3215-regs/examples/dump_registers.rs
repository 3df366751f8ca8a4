//! Reads every register from a simulated ST3215 and prints it.
//!
//! Usage: `dump_registers [config.toml]`. Without an argument, `regmap.toml` in the current
//! directory is used if it exists.

use eyre::{Context, Report};
use futures::executor::block_on;
use log::{info, warn};
use regmap::config::Config;
use regmap::simulator::SimulatedDevice;
use regmap::Session;
use st3215_regs::St3215;
use std::env;
use std::path::Path;

fn main() -> Result<(), Report> {
    pretty_env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => Config::read(&path).wrap_err_with(|| format!("Failed to load {}", path))?,
        None if Path::new("regmap.toml").exists() => Config::from_file()?,
        None => Config::default(),
    };

    let servo = SimulatedDevice::for_family::<St3215>()?;
    if let Some(simulator) = &config.simulator {
        servo
            .apply_config::<St3215>(simulator)
            .wrap_err("Invalid simulator config")?;
    }

    block_on(async {
        let mut session = Session::<St3215, _>::create(&servo, config.target())
            .await
            .wrap_err_with(|| format!("Failed to open {}", config.target()))?;
        info!("Connected to {}", session.target());

        for register in session.registers().iter() {
            match session.read_descriptor_timestamped(register).await {
                Ok(reading) => println!(
                    "{:3} {:<30} {:>6} @ {:?}",
                    register.address, register.name, reading.value, reading.timestamp
                ),
                Err(e) => warn!("Failed to read {}: {}", register.name, e),
            }
        }

        session.close();
        Ok(())
    })
}
