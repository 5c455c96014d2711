// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `fireplace-bridge` daemon: CC1101 on Linux `spidev`, MQTT and HTTP.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, anyhow};
use clap::Parser;
use fireplace_bridge::bridge::{self, Exit};
use fireplace_bridge::config::{BridgeConfig, RadioSettings};
use fireplace_bridge::radio::Cc1101;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{Delay, SpidevDevice};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fireplace-bridge", version, about)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    dry_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(cli.config.as_deref()).context("invalid configuration")?;

    if cli.dry_config {
        print!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    let radio = open_radio(&config.radio)?;
    match bridge::run(&config, radio).await {
        Ok(Exit::ScheduledRestart) => restart(),
        Ok(Exit::Shutdown) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Bridge stopped");
            Err(e.into())
        }
    }
}

fn open_radio(settings: &RadioSettings) -> anyhow::Result<Cc1101<SpidevDevice, Delay>> {
    let path = settings.spidev.display();
    let mut spi = SpidevDevice::open(&settings.spidev).map_err(|e| anyhow!("opening {path}: {e:?}"))?;

    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(settings.spi_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)
        .map_err(|e| anyhow!("configuring {path}: {e:?}"))?;

    tracing::info!(spidev = %path, hz = settings.spi_hz, "SPI bus opened");
    Ok(Cc1101::new(spi, Delay).with_polling(settings.poll_interval_us, settings.poll_budget))
}

/// Replaces the running process with a fresh copy of itself.
#[cfg(unix)]
fn restart() -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;

    let exe = std::env::current_exe().context("locating executable")?;
    tracing::info!(exe = %exe.display(), "Re-executing");
    let err = Command::new(&exe).args(std::env::args_os().skip(1)).exec();
    Err(err).context("re-exec failed")
}

#[cfg(not(unix))]
fn restart() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("locating executable")?;
    Command::new(exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .context("respawn failed")?;
    Ok(())
}
