//! Request parameters: the wire shape of `/convert` and its validation.
//!
//! Parameters arrive either as a JSON body, as a `params` multipart field
//! holding the same JSON object, or as individual multipart text fields.
//! All three land in [`ConvertParams`], which [`ConvertParams::to_options`]
//! turns into typed [`ConversionOptions`].

use crate::config::{ConversionOptions, MaxSize};
use crate::error::Img2LvglError;
use crate::format::{Compression, OutputMode, RequestedFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

static DIMENSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").expect("valid regex"));

/// Raw `/convert` parameters, as sent by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertParams {
    pub url: Option<String>,
    pub cf: Option<String>,
    pub output: Option<String>,
    pub max_size: Option<MaxSizeParam>,
    pub dither: Option<bool>,
    pub big_endian: Option<bool>,
    pub compress: Option<String>,
}

/// JSON body shape. `dithering` and `compression` are alternate spellings;
/// when both spellings are present the short one wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireParams {
    url: Option<String>,
    cf: Option<String>,
    output: Option<String>,
    max_size: Option<MaxSizeParam>,
    #[serde(default, deserialize_with = "de_flag")]
    dither: Option<bool>,
    #[serde(default, deserialize_with = "de_flag")]
    dithering: Option<bool>,
    #[serde(default, deserialize_with = "de_flag")]
    big_endian: Option<bool>,
    compress: Option<String>,
    compression: Option<String>,
}

impl From<WireParams> for ConvertParams {
    fn from(w: WireParams) -> Self {
        ConvertParams {
            url: w.url,
            cf: w.cf,
            output: w.output,
            max_size: w.max_size,
            dither: w.dither.or(w.dithering),
            big_endian: w.big_endian,
            compress: w.compress.or(w.compression),
        }
    }
}

/// `maxSize` as sent: `"800x480"` or `{"width": 800, "height": 480}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxSizeParam {
    Text(String),
    Dims { width: Value, height: Value },
    Other(Value),
}

fn de_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => Some(parse_flag(&s)),
        Some(other) => {
            debug!("Non-boolean flag value {} treated as false", other);
            Some(false)
        }
    })
}

/// `"true"` (any case) is true; everything else is false.
pub fn parse_flag(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

impl ConvertParams {
    /// Parse a JSON object body or `params` field.
    pub fn from_json(bytes: &[u8]) -> Result<Self, Img2LvglError> {
        serde_json::from_slice::<WireParams>(bytes)
            .map(ConvertParams::from)
            .map_err(|e| Img2LvglError::InvalidParams(e.to_string()))
    }

    /// Apply one multipart text field. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "url" => self.url = Some(value),
            "cf" => self.cf = Some(value),
            "output" => self.output = Some(value),
            "maxSize" => self.max_size = Some(MaxSizeParam::Text(value)),
            "dither" => self.dither = Some(parse_flag(&value)),
            "dithering" => self.dither = self.dither.or(Some(parse_flag(&value))),
            "bigEndian" => self.big_endian = Some(parse_flag(&value)),
            "compress" => self.compress = Some(value),
            "compression" => self.compress = self.compress.take().or(Some(value)),
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    /// Fill every field `self` leaves unset from `fallback`.
    pub fn or(self, fallback: ConvertParams) -> ConvertParams {
        ConvertParams {
            url: self.url.or(fallback.url),
            cf: self.cf.or(fallback.cf),
            output: self.output.or(fallback.output),
            max_size: self.max_size.or(fallback.max_size),
            dither: self.dither.or(fallback.dither),
            big_endian: self.big_endian.or(fallback.big_endian),
            compress: self.compress.or(fallback.compress),
        }
    }

    /// Validate into typed options. Unknown enum values are errors; a
    /// malformed `maxSize` is ignored.
    pub fn to_options(&self, array_name: &str) -> Result<ConversionOptions, Img2LvglError> {
        let format: RequestedFormat = self.cf.as_deref().unwrap_or("RGB565").parse()?;
        let output: OutputMode = self.output.as_deref().unwrap_or("bin").parse()?;
        let compression: Compression = self.compress.as_deref().unwrap_or("NONE").parse()?;

        let mut builder = ConversionOptions::builder()
            .format(format)
            .output(output)
            .dither(self.dither.unwrap_or(false))
            .big_endian(self.big_endian.unwrap_or(false))
            .compression(compression)
            .array_name(array_name);

        if let Some(MaxSize { width, height }) = self.max_size.as_ref().and_then(parse_max_size) {
            builder = builder.max_size(width, height);
        }

        builder.build()
    }
}

/// Interpret a `maxSize` value; `None` (with a warning) when malformed.
pub fn parse_max_size(param: &MaxSizeParam) -> Option<MaxSize> {
    let parsed = match param {
        MaxSizeParam::Text(s) => DIMENSIONS.captures(s).and_then(|caps| {
            let width = caps[1].parse::<u32>().ok()?;
            let height = caps[2].parse::<u32>().ok()?;
            Some((width, height))
        }),
        MaxSizeParam::Dims { width, height } => dimension(width).zip(dimension(height)),
        MaxSizeParam::Other(_) => None,
    };

    match parsed {
        Some((width, height)) if width > 0 && height > 0 => Some(MaxSize { width, height }),
        _ => {
            warn!("Ignoring malformed maxSize {:?}", param);
            None
        }
    }
}

fn dimension(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
