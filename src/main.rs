// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Neewer GL1 Pro command-line controller

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neewer_gl1::bluetooth::bluez;
use neewer_gl1::config::{Config, DeviceConfig};
use neewer_gl1::controller::default_name;
use neewer_gl1::DeviceController;

#[derive(Parser)]
#[command(name = "neewer-gl1", version)]
#[command(about = "Switch Neewer GL1 Pro lights on and off over Bluetooth LE")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a light on
    On {
        /// Address or name; may be omitted when one light is configured
        device: Option<String>,
    },
    /// Turn a light off
    Off {
        /// Address or name; may be omitted when one light is configured
        device: Option<String>,
    },
    /// List configured lights
    List,
    /// Add a light by address
    Add {
        /// Bluetooth address, e.g. A4:C1:38:12:34:56
        address: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a configured light
    Remove {
        /// Address or name
        device: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("neewer_gl1={}", level).parse()?),
        )
        .init();

    let mut config = match cli.config {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    info!("Configuration loaded from {}", config.path.display());

    match cli.command {
        Commands::On { device } => {
            let controller = controller_for(&config, device.as_deref()).await?;
            let outcome = controller.turn_on().await;
            println!("{}: {}", controller.name(), outcome.as_str());
        }
        Commands::Off { device } => {
            let controller = controller_for(&config, device.as_deref()).await?;
            let outcome = controller.turn_off().await;
            println!("{}: {}", controller.name(), outcome.as_str());
        }
        Commands::List => {
            if config.devices.is_empty() {
                println!("No devices configured");
            }
            for device in &config.devices {
                println!("{}  {}", device.address, display_name(device));
            }
        }
        Commands::Add { address, name } => {
            let added = config.add_device(&address, name)?.clone();
            config.save()?;
            println!("Added {}", display_name(&added));
        }
        Commands::Remove { device } => {
            let removed = config.remove_device(&device)?;
            config.save()?;
            println!("Removed {}", display_name(&removed));
        }
    }

    Ok(())
}

fn display_name(device: &DeviceConfig) -> String {
    device
        .name
        .clone()
        .unwrap_or_else(|| default_name(&device.address))
}

async fn controller_for(config: &Config, selector: Option<&str>) -> Result<DeviceController> {
    let device = config.find_device(selector)?;
    let adapter = bluez::open_adapter(config.bluetooth.adapter.as_deref()).await?;
    let connectors = bluez::connectors(&adapter, &config.bluetooth.link_options());

    Ok(DeviceController::new(
        device.address,
        device.name.clone(),
        connectors,
        config.bluetooth.exchange_options(),
    ))
}
