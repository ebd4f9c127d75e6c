//! CLI binary for img2lvgl.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `ServerConfig` and runs the HTTP service.

use anyhow::{Context, Result};
use clap::Parser;
use img2lvgl::{serve, ServerConfig};
use std::io;
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port (8080)
  img2lvgl

  # Convert a remote image to a C array
  curl -X POST http://localhost:8080/convert \
       -H 'Content-Type: application/json' \
       -d '{"url":"https://example.com/logo.png","cf":"RGB565A8","output":"c_array"}' \
       -o logo.c

  # Upload a file, shrink it and compress the result
  curl -X POST http://localhost:8080/convert \
       -F image=@photo.jpg \
       -F 'params={"cf":"RGB565","maxSize":"320x240","compress":"LZ4"}' \
       -o photo.bin

  # List supported formats
  curl http://localhost:8080/formats

ENVIRONMENT:
  PORT, HOST                   Listening address
  IMG2LVGL_MAX_UPLOAD_BYTES    Request and download size limit
  IMG2LVGL_DOWNLOAD_TIMEOUT    URL fetch timeout in seconds
  IMG2LVGL_ARRAY_NAME          C variable name for c_array output
  RUST_LOG                     Log filter (overrides -v / -q)
"#;

#[derive(Parser, Debug)]
#[command(
    name = "img2lvgl",
    version,
    about = "HTTP service converting PNG/JPEG images to LVGL binaries and C arrays",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Largest accepted upload or download, in bytes.
    #[arg(long, env = "IMG2LVGL_MAX_UPLOAD_BYTES", default_value_t = 16 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Timeout for fetching `url` sources, in seconds.
    #[arg(long, env = "IMG2LVGL_DOWNLOAD_TIMEOUT", default_value_t = 10)]
    download_timeout: u64,

    /// C variable name used for `c_array` output.
    #[arg(long, env = "IMG2LVGL_ARRAY_NAME", default_value = "lvgl_image")]
    array_name: String,

    /// Enable debug logging.
    #[arg(short, long, env = "IMG2LVGL_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, env = "IMG2LVGL_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ServerConfig::builder()
        .host(cli.host)
        .port(cli.port)
        .max_upload_bytes(cli.max_upload_bytes)
        .download_timeout_secs(cli.download_timeout)
        .array_name(cli.array_name)
        .build()
        .context("Invalid server configuration")?;

    serve(config).await.context("Server failed")?;
    Ok(())
}
