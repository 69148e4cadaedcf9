mod api;
mod config;
mod engine;

use crate::config::ServerConfig;
use anyhow::Context;
// Leading :: — the `config` crate shares a name with our own module
use ::config::{Config, File};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{path::Path, path::PathBuf, process};
use structopt::StructOpt;
use validator::Validate;

/// Host process for the Tellus planetary simulation engine.
#[derive(Debug, StructOpt)]
#[structopt(name = "tellus-server")]
struct Opt {
    /// Path to a config file defining the API surface and the world to
    /// simulate. Supported formats: JSON, TOML. Without one, a demo world
    /// with default settings is booted.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// The logging level to use. See
    /// https://docs.rs/log/0.4/log/enum.LevelFilter.html for options
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn load_config(config_path: &Path) -> anyhow::Result<ServerConfig> {
    let mut settings = Config::new();
    let path_str = config_path
        .to_str()
        .with_context(|| format!("invalid character in path {:?}", config_path))?;
    settings
        .merge(File::with_name(path_str))
        .context("error reading config file")?;
    let server_config: ServerConfig =
        settings.try_into().context("error reading config")?;
    server_config
        .validate()
        .context("invalid server config")?;
    Ok(server_config)
}

async fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let server_config = match &opt.config {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given, booting a default demo world");
            ServerConfig::default()
        }
    };

    engine::init_world(server_config.world.clone())
        .context("error generating world")?;
    engine::start_engine(&server_config)
        .context("error starting engine")?;

    let app = api::router(api::ApiState {
        api_key: server_config.api.api_key.clone(),
    });
    let listener = tokio::net::TcpListener::bind(&server_config.api.bind_addr)
        .await
        .with_context(|| {
            format!("error binding to {}", server_config.api.bind_addr)
        })?;
    info!("Listening on {}", server_config.api.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let exit_code = match run(Opt::from_args()).await {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
