use std::{fs::File, io::Write, path::Path, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use meridian_common::config::VERSION;
use meridian_daemon::{
    core::{backend::Backend, config::Config, storage::SledStorage},
    rpc::MeridianRpcServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
    } else if config.generate_config_template {
        eprintln!(
            "Provided config file path is required to generate the template with --config-file"
        );
        return Ok(());
    }

    let mut logger = env_logger::Builder::new();
    logger.filter_level(config.log.log_level.into());
    if let Some(filters) = config.log.log_filters.as_deref() {
        logger.parse_filters(filters);
    }
    logger.init();

    info!("Meridian daemon v{}", VERSION);
    config
        .ledger
        .validate()
        .context("Invalid referral commission rates")?;

    let storage = Arc::new(
        SledStorage::new(config.dir_path.clone(), None).context("Error while opening the database")?,
    );
    let backend = Arc::new(
        Backend::new(storage, config.ledger, &config.phonepe, &config.razorpay)
            .context("Error while building the ledger")?,
    );

    let server = MeridianRpcServer::new(Arc::clone(&backend), config.rpc).await?;

    tokio::signal::ctrl_c()
        .await
        .context("Error while waiting for the shutdown signal")?;
    server.stop().await;

    match backend.flush().await {
        Ok(bytes) => info!("Database flushed ({} bytes)", bytes),
        Err(e) => error!("Error while flushing the database: {}", e),
    }
    Ok(())
}
