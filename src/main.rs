// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Pinakotheke: filesystem-backed photo galleries
//!
//! Serves the JSON API and offers a few maintenance commands on the store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use pinakotheke::config::AppConfig;
use pinakotheke::tagger::OllamaTagger;
use pinakotheke::web::{self, AppState};
use pinakotheke::{GalleryError, Result};

/// Pinakotheke CLI - photo galleries on disk
#[derive(Parser, Debug)]
#[command(name = "pinakotheke")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Filesystem-backed photo galleries with AI tagging", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage root (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Skip Ollama health check on startup
        #[arg(long)]
        skip_health_check: bool,
    },

    /// List galleries, or the photos of one gallery
    List {
        /// Gallery id
        gallery: Option<String>,

        /// Only show entries whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a gallery
    Create {
        /// Gallery name
        name: String,
    },

    /// Copy image files into a gallery
    Upload {
        /// Gallery id
        gallery: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask the vision model for a photo's tags
    Tag {
        /// Gallery id
        gallery: String,

        /// Photo id
        photo: String,
    },

    /// Write a default configuration and storage root
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Serve { host, port, root, skip_health_check }) => {
            run_serve(config, host, port, root, skip_health_check).await
        }
        Some(Commands::List { gallery, search }) => run_list(config, gallery, search),
        Some(Commands::Create { name }) => run_create(config, &name),
        Some(Commands::Upload { gallery, files }) => run_upload(config, &gallery, &files),
        Some(Commands::Tag { gallery, photo }) => run_tag(config, &gallery, &photo).await,
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        None => run_serve(config, None, None, None, false).await,
    }
}

async fn run_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    root: Option<PathBuf>,
    skip_health_check: bool,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }
    if let Some(root) = root {
        config.storage.root = root.to_string_lossy().to_string();
    }

    if config.ai_engine.enabled && !skip_health_check {
        info!("Checking Ollama availability...");
        OllamaTagger::new(&config.ai_engine)?.health_check().await?;
        info!("Ollama is running");
    }

    web::start_server(config).await
}

fn run_list(config: AppConfig, gallery: Option<String>, search: Option<String>) -> Result<()> {
    let state = AppState::from_config(&config)?;

    match gallery {
        None => {
            let galleries = match search.as_deref() {
                Some(q) => state.galleries.search(q)?,
                None => state.galleries.all()?,
            };
            for g in galleries {
                println!("{}  {}", g.id, g.name);
            }
        }
        Some(id) => {
            if state.galleries.find(&id).is_none() {
                return Err(GalleryError::GalleryNotFound(id));
            }
            let photos = match search.as_deref() {
                Some(q) => state.photos.search(&id, q)?,
                None => state.photos.gallery_photos(&id)?,
            };
            for p in photos {
                println!("{}  {}  {}", p.id, p.name, p.file);
            }
        }
    }

    Ok(())
}

fn run_create(config: AppConfig, name: &str) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let gallery = state.galleries.create(name)?;
    println!("{}  {}", gallery.id, gallery.name);
    Ok(())
}

fn run_upload(config: AppConfig, gallery: &str, files: &[PathBuf]) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let target = state
        .galleries
        .find(gallery)
        .ok_or_else(|| GalleryError::GalleryNotFound(gallery.to_string()))?;

    for file in files {
        if let Some(photo) = state.photos.upload(&target, file)? {
            println!("{}  {}", photo.id, photo.file);
        }
    }
    Ok(())
}

async fn run_tag(config: AppConfig, gallery: &str, photo: &str) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let tags = state.photos.tag(gallery, photo).await;
    if tags.is_empty() {
        println!("No tags");
    } else {
        println!("{}", tags.join(", "));
    }
    Ok(())
}

/// Initialize a new gallery root
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(GalleryError::Config(
            "config.json already exists. Use --force to overwrite".to_string()
        ));
    }

    let root = target.join("galleries");
    std::fs::create_dir_all(&root)?;

    let mut config = AppConfig::default();
    config.storage.root = root.to_string_lossy().to_string();
    config.save(&config_path)?;

    println!("Pinakotheke initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - galleries/");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["pinakotheke"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::try_parse_from([
            "pinakotheke", "serve", "--port", "9000", "--root", "/tmp/galleries"
        ]).unwrap();

        match cli.command {
            Some(Commands::Serve { port, root, skip_health_check, .. }) => {
                assert_eq!(port, Some(9000));
                assert_eq!(root, Some(PathBuf::from("/tmp/galleries")));
                assert!(!skip_health_check);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_upload_requires_files() {
        assert!(Cli::try_parse_from(["pinakotheke", "upload", "R2FsbGVyeQ"]).is_err());

        let cli = Cli::try_parse_from([
            "pinakotheke", "upload", "R2FsbGVyeQ", "a.png", "b.jpg"
        ]).unwrap();
        match cli.command {
            Some(Commands::Upload { gallery, files }) => {
                assert_eq!(gallery, "R2FsbGVyeQ");
                assert_eq!(files.len(), 2);
            }
            _ => panic!("Expected Upload command"),
        }
    }

    fn temp_config(tmp: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.root = tmp.path().join("galleries").to_string_lossy().to_string();
        config.ai_engine.enabled = false;
        config
    }

    #[test]
    fn test_unknown_gallery_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ghost = pinakotheke::codec::encode("Ghost");

        let err = run_list(temp_config(&tmp), Some(ghost.clone()), None).unwrap_err();
        assert!(matches!(err, GalleryError::GalleryNotFound(ref id) if *id == ghost));
        assert_eq!(err.to_string(), format!("Gallery not found: {}", ghost));

        let err = run_upload(temp_config(&tmp), &ghost, &[PathBuf::from("a.png")]).unwrap_err();
        assert!(matches!(err, GalleryError::GalleryNotFound(_)));
    }

    #[test]
    fn test_init_writes_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        run_init(Some(tmp.path().to_path_buf()), false).unwrap();

        assert!(tmp.path().join("galleries").is_dir());
        let config = AppConfig::load(&tmp.path().join("config.json")).unwrap();
        assert!(config.storage.root.ends_with("galleries"));

        assert!(run_init(Some(tmp.path().to_path_buf()), false).is_err());
        assert!(run_init(Some(tmp.path().to_path_buf()), true).is_ok());
    }
}
