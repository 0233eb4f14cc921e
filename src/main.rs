//! Gradient Carousel HTTP API Server
//!
//! Serves an auto-advancing image carousel. Any client on the network can
//! read the current slide and its background gradient, navigate manually,
//! or subscribe to changes over a WebSocket.
//!
//! ## Architecture
//! - **Carousel** (tokio tasks): autoplay timer plus one analysis task per
//!   slide change
//! - **HTTP server** (tokio/axum): navigation commands and state reads
//!
//! ## Usage
//! ```sh
//! ./target/release/gradient-carousel --images-dir ./slides --port 8080
//! ./target/release/gradient-carousel --image https://example.com/a.jpg --image b.png
//! ```

use clap::Parser;
use gradient_carousel::media;
use gradient_carousel::server::{self, AppState};
use gradient_carousel::{AutoplayPolicy, Carousel, CarouselConfig, DefaultImageSource, ImageSet};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Gradient Carousel HTTP API Server
#[derive(Parser)]
#[command(name = "gradient-carousel")]
#[command(about = "Image carousel with a background gradient taken from the current slide")]
#[command(version)]
struct Args {
    /// Image URL or path; repeat for several images (shown first, in order)
    #[arg(long = "image", value_name = "LOCATOR")]
    images: Vec<String>,

    /// Directory whose images are appended to the carousel, sorted by name
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Milliseconds between automatic slide changes
    #[arg(long, default_value = "5000")]
    period_ms: u64,

    /// Disable automatic slide changes
    #[arg(long)]
    no_autoplay: bool,

    /// Restart the autoplay period after every manual navigation
    #[arg(long)]
    reset_on_navigate: bool,
}

impl Args {
    fn config(&self) -> CarouselConfig {
        let autoplay = (!self.no_autoplay).then(|| Duration::from_millis(self.period_ms));
        let policy = if self.reset_on_navigate {
            AutoplayPolicy::ResetOnNavigation
        } else {
            AutoplayPolicy::FixedCadence
        };
        CarouselConfig::new(autoplay, policy)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for request logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();

    let images_dir = args.images_dir.as_ref().map(|dir| {
        dir.canonicalize().unwrap_or_else(|_| {
            tracing::warn!("Could not canonicalize images dir, using as-is");
            dir.clone()
        })
    });
    let locators = media::collect_locators(&args.images, images_dir.as_deref());

    // An empty carousel is a setup error: report it and exit.
    let images = ImageSet::new(locators)?;
    let config = args.config();

    tracing::info!("Gradient Carousel v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Images: {}", images.len());
    match config.autoplay {
        Some(period) => tracing::info!(
            "Autoplay: every {}ms ({:?})",
            period.as_millis(),
            config.policy
        ),
        None => tracing::info!("Autoplay: off"),
    }
    tracing::info!("Port: {}", args.port);

    let carousel = Carousel::new(images, DefaultImageSource::default(), config)?;
    carousel.start();

    let app = server::create_router(AppState {
        carousel: carousel.clone(),
    });

    // Start listening
    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/carousel", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Run until Ctrl+C, then stop the timer and pending analyses.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    carousel.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_autoplay_every_five_seconds() {
        let args = Args::parse_from(["gradient-carousel", "--image", "a.png"]);
        assert_eq!(args.images, vec!["a.png"]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.config(), CarouselConfig::default());
    }

    #[test]
    fn flags_shape_the_config() {
        let args = Args::parse_from([
            "gradient-carousel",
            "--image",
            "a.png",
            "--image",
            "https://example.com/b.jpg",
            "--period-ms",
            "1500",
            "--reset-on-navigate",
        ]);
        assert_eq!(args.images.len(), 2);
        assert_eq!(
            args.config(),
            CarouselConfig::new(
                Some(Duration::from_millis(1500)),
                AutoplayPolicy::ResetOnNavigation
            )
        );
    }

    #[test]
    fn no_autoplay_turns_the_timer_off() {
        let args = Args::parse_from(["gradient-carousel", "--no-autoplay"]);
        assert_eq!(args.config().autoplay, None);
    }
}
