use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config;
use crate::http::server::HttpServer;
use crate::service::{index::TrackIndexService, metrics::MetricsService};
use crate::storage::{blob, kv};

#[derive(Parser)]
#[command(name = "bongo")]
#[command(version = "0.1")]
#[command(about = "Catalog and metrics service for user-uploaded audio tracks")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve,
    /// List tracks in the public index
    List,
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = config::Config::load(cli.config.to_str().unwrap()).unwrap();

    match &cli.command {
        Commands::Serve => {
            let metrics_store = kv::open(&cfg.metrics_store).expect("Failed to open metrics store");
            let blob_store = blob::open(&cfg.blob_store).expect("Failed to open blob store");

            let metrics = MetricsService::new(metrics_store);
            let index =
                TrackIndexService::new(blob_store, cfg.blob_store.public_base_url.clone());

            let server = HttpServer::new(metrics, index, cfg.http, cfg.upload);

            println!(
                "HTTP server running at http://{}:{}",
                server.config.bind_addr, server.config.port
            );
            server.run();
        }

        Commands::List => {
            let blob_store = blob::open(&cfg.blob_store).expect("Failed to open blob store");
            let index =
                TrackIndexService::new(blob_store, cfg.blob_store.public_base_url.clone());

            let tracks = index.list_tracks().unwrap();

            if tracks.is_empty() {
                println!("No tracks in the index");
            }
            for track in tracks {
                println!("Track: {}", track.id);
                println!("  {} by {}", track.title, track.artist);
                println!("  genre: {}", track.genre);
                println!("  audio: {}", track.audio);
                if let Some(cover) = &track.cover {
                    println!("  cover: {}", cover);
                }
                println!("  created at: {}", track.created_at);
            }
        }
    }
}
