//! Encoded image payloads
//!
//! [`EncodedImage`] is the only image representation the pipeline handles.
//! Construction validates the payload, so every value in circulation is
//! non-empty and of a supported encoding. The canonical text form is a data
//! URL (`data:image/png;base64,...`).

use crate::error::InputError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMime {
    /// JPEG
    Jpeg,
    /// PNG
    Png,
    /// WebP
    Webp,
}

impl ImageMime {
    /// MIME type string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extension without the dot
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Detect the encoding from the payload's magic bytes
    ///
    /// # Errors
    /// - `InputError::EmptyImage` if `bytes` is empty
    /// - `InputError::UnsupportedEncoding` if the format is unknown or unsupported
    pub fn sniff(bytes: &[u8]) -> Result<Self, InputError> {
        if bytes.is_empty() {
            return Err(InputError::EmptyImage);
        }

        match ::image::guess_format(bytes) {
            Ok(::image::ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Ok(::image::ImageFormat::Png) => Ok(Self::Png),
            Ok(::image::ImageFormat::WebP) => Ok(Self::Webp),
            Ok(other) => Err(InputError::UnsupportedEncoding(format!("{other:?}"))),
            Err(_) => Err(InputError::UnsupportedEncoding("unrecognized".to_string())),
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageMime {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            other => Err(InputError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// SHA-256 digest of an image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash raw bytes
    #[inline]
    #[must_use]
    pub fn compute(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Digest bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Immutable, validated image payload
///
/// Cloning shares the underlying buffer. Equality is by content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedImage {
    mime: ImageMime,
    bytes: Arc<[u8]>,
}

impl EncodedImage {
    /// Wrap raw image bytes
    ///
    /// The encoding is taken from the payload itself.
    ///
    /// # Errors
    /// - `InputError::EmptyImage` for an empty buffer
    /// - `InputError::UnsupportedEncoding` for anything but JPEG, PNG or WebP
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, InputError> {
        let bytes = bytes.into();
        let mime = ImageMime::sniff(&bytes)?;
        Ok(Self {
            mime,
            bytes: Arc::from(bytes),
        })
    }

    /// Parse a data URL or a bare base64 payload
    ///
    /// A declared MIME type must be an `image/*` type; the encoding recorded
    /// on the result is the one detected from the decoded bytes.
    ///
    /// # Errors
    /// - `InputError::MalformedPayload` for a bad header or invalid base64
    /// - see [`EncodedImage::from_bytes`]
    pub fn from_data_url(input: &str) -> Result<Self, InputError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(InputError::EmptyImage);
        }

        let payload = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    InputError::MalformedPayload("data URL has no payload separator".to_string())
                })?;
                let declared = header.strip_suffix(";base64").ok_or_else(|| {
                    InputError::MalformedPayload("data URL is not base64 encoded".to_string())
                })?;
                if !declared.to_ascii_lowercase().starts_with("image/") {
                    return Err(InputError::UnsupportedEncoding(declared.to_string()));
                }
                payload
            }
            None => input,
        };

        if payload.is_empty() {
            return Err(InputError::EmptyImage);
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| InputError::MalformedPayload(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Canonical data URL form
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Bare base64 payload, without the data URL header
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Detected encoding
    #[inline]
    #[must_use]
    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a constructed image
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content digest
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(&self.bytes)
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("hash", &self.content_hash().short())
            .finish()
    }
}

impl FromStr for EncodedImage {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_data_url(s)
    }
}

impl Serialize for EncodedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for EncodedImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_data_url(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

    fn png(tail: &[u8]) -> Vec<u8> {
        [PNG_MAGIC, tail].concat()
    }

    #[test]
    fn from_bytes_detects_encoding() {
        let image = EncodedImage::from_bytes(png(b"pixels")).unwrap();
        assert_eq!(image.mime(), ImageMime::Png);

        let image = EncodedImage::from_bytes([JPEG_MAGIC, b"pixels"].concat()).unwrap();
        assert_eq!(image.mime(), ImageMime::Jpeg);
    }

    #[test]
    fn from_bytes_rejects_empty() {
        assert_eq!(
            EncodedImage::from_bytes(Vec::new()).unwrap_err(),
            InputError::EmptyImage
        );
    }

    #[test]
    fn from_bytes_rejects_unknown_encoding() {
        let err = EncodedImage::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedEncoding(_)));
    }

    #[test]
    fn data_url_round_trip() {
        let image = EncodedImage::from_bytes(png(b"room")).unwrap();
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed: EncodedImage = url.parse().unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.content_hash(), image.content_hash());
    }

    #[test]
    fn bare_base64_is_accepted() {
        let image = EncodedImage::from_bytes([JPEG_MAGIC, b"room"].concat()).unwrap();
        let parsed = EncodedImage::from_data_url(&image.to_base64()).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn declared_mime_does_not_override_bytes() {
        let bytes = png(b"room");
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes));
        let parsed = EncodedImage::from_data_url(&url).unwrap();
        assert_eq!(parsed.mime(), ImageMime::Png);
    }

    #[test]
    fn malformed_data_urls() {
        assert_eq!(
            EncodedImage::from_data_url("   ").unwrap_err(),
            InputError::EmptyImage
        );
        assert_eq!(
            EncodedImage::from_data_url("data:image/png;base64,").unwrap_err(),
            InputError::EmptyImage
        );
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png;base64").unwrap_err(),
            InputError::MalformedPayload(_)
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png,abcd").unwrap_err(),
            InputError::MalformedPayload(_)
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:text/plain;base64,aGVsbG8=").unwrap_err(),
            InputError::UnsupportedEncoding(_)
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png;base64,!!!").unwrap_err(),
            InputError::MalformedPayload(_)
        ));
    }

    #[test]
    fn equality_is_by_content() {
        let a = EncodedImage::from_bytes(png(b"same")).unwrap();
        let b = EncodedImage::from_bytes(png(b"same")).unwrap();
        let c = EncodedImage::from_bytes(png(b"other")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn serde_uses_data_url() {
        let image = EncodedImage::from_bytes(png(b"json")).unwrap();
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, format!("\"{}\"", image.to_data_url()));

        let back: EncodedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn mime_from_str() {
        assert_eq!("image/jpg".parse::<ImageMime>().unwrap(), ImageMime::Jpeg);
        assert_eq!("IMAGE/PNG".parse::<ImageMime>().unwrap(), ImageMime::Png);
        assert!("image/gif".parse::<ImageMime>().is_err());
    }
}
