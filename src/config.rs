//! Configuration types: per-request conversion options and server settings.
//!
//! [`ConversionOptions`] is the validated, typed form of one request's
//! parameters; [`ServerConfig`] holds the process-wide knobs the binary reads
//! from the command line and environment. Both are built through builders
//! that validate before handing out a value.

use crate::error::Img2LvglError;
use crate::format::{ColorFormat, Compression, OutputMode, RequestedFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

static C_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Default C variable name for `c_array` output.
pub const DEFAULT_ARRAY_NAME: &str = "lvgl_image";

/// Returns true when `name` can be used verbatim as a C identifier.
pub fn is_c_identifier(name: &str) -> bool {
    C_IDENT.is_match(name)
}

// ── ConversionOptions ────────────────────────────────────────────────────

/// Bounding box an image is shrunk into before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxSize {
    pub width: u32,
    pub height: u32,
}

/// Typed options for a single conversion.
///
/// # Example
/// ```rust
/// use img2lvgl::{ConversionOptions, OutputMode};
///
/// let options = ConversionOptions::builder()
///     .color_format("I4")
///     .unwrap()
///     .output(OutputMode::CArray)
///     .max_size(320, 240)
///     .build()
///     .unwrap();
/// assert!(options.max_size.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Requested color format. Default: RGB565.
    pub format: RequestedFormat,

    /// Output encoding. Default: plain `bin`.
    pub output: OutputMode,

    /// Optional cap on the image dimensions. Default: none.
    pub max_size: Option<MaxSize>,

    /// Floyd–Steinberg dithering for the RGB565 family. Default: false.
    pub dither: bool,

    /// Byte-swap 16-bit color words. Default: false.
    pub big_endian: bool,

    /// Pixel data compression. Default: none.
    pub compression: Compression,

    /// C variable name for `c_array` output. Default: `lvgl_image`.
    pub array_name: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: RequestedFormat::Exact(ColorFormat::Rgb565),
            output: OutputMode::default(),
            max_size: None,
            dither: false,
            big_endian: false,
            compression: Compression::None,
            array_name: DEFAULT_ARRAY_NAME.to_string(),
        }
    }
}

impl ConversionOptions {
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn format(mut self, format: RequestedFormat) -> Self {
        self.options.format = format;
        self
    }

    /// Parse and set the color format from its request name.
    pub fn color_format(mut self, name: &str) -> Result<Self, Img2LvglError> {
        self.options.format = name.parse()?;
        Ok(self)
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.options.output = output;
        self
    }

    /// Cap the image size. Zero in either dimension clears the cap.
    pub fn max_size(mut self, width: u32, height: u32) -> Self {
        self.options.max_size = (width > 0 && height > 0).then_some(MaxSize { width, height });
        self
    }

    pub fn dither(mut self, v: bool) -> Self {
        self.options.dither = v;
        self
    }

    pub fn big_endian(mut self, v: bool) -> Self {
        self.options.big_endian = v;
        self
    }

    pub fn compression(mut self, c: Compression) -> Self {
        self.options.compression = c;
        self
    }

    pub fn array_name(mut self, name: impl Into<String>) -> Self {
        self.options.array_name = name.into();
        self
    }

    pub fn build(self) -> Result<ConversionOptions, Img2LvglError> {
        if !is_c_identifier(&self.options.array_name) {
            return Err(Img2LvglError::InvalidConfig(format!(
                "array name '{}' is not a C identifier",
                self.options.array_name
            )));
        }
        Ok(self.options)
    }
}

// ── ServerConfig ─────────────────────────────────────────────────────────

/// Process-wide settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: 0.0.0.0.
    pub host: IpAddr,

    /// Listening port. Default: 8080.
    pub port: u16,

    /// Upper bound for request bodies and downloaded images. Default: 16 MiB.
    pub max_upload_bytes: usize,

    /// Timeout for fetching `url` sources, in seconds. Default: 10.
    pub download_timeout_secs: u64,

    /// C variable name for `c_array` output. Default: `lvgl_image`.
    pub array_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024,
            download_timeout_secs: 10,
            array_name: DEFAULT_ARRAY_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: IpAddr) -> Self {
        self.config.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn array_name(mut self, name: impl Into<String>) -> Self {
        self.config.array_name = name.into();
        self
    }

    pub fn build(self) -> Result<ServerConfig, Img2LvglError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(Img2LvglError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(Img2LvglError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        if !is_c_identifier(&c.array_name) {
            return Err(Img2LvglError::InvalidConfig(format!(
                "array name '{}' is not a C identifier",
                c.array_name
            )));
        }
        Ok(self.config)
    }
}
