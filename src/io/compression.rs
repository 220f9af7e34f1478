//! Transparent decompression of the JSON Lines input stream.
//!
//! Input usually arrives on stdin, so there is no file name to go by: codecs
//! are detected from the magic bytes at the start of the stream. A stream that
//! matches no signature is passed through unchanged.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags:
//! - **Gzip** via `flate2` (feature: `compression-gzip`)
//! - **Zstd** via `zstd` (feature: `compression-zstd`)
//! - **Bzip2** via `bzip2` (feature: `compression-bzip2`)
//! - **Xz** via `xz2` (feature: `compression-xz`)

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};

/// A decompression codec recognised by its leading bytes.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// Signature at the start of a compressed stream.
    fn magic_bytes(&self) -> &[u8];

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>>;
}

/// Built-in codecs enabled in this build.
#[must_use]
pub fn builtin_codecs() -> Vec<&'static dyn CompressionCodec> {
    vec![
        #[cfg(feature = "compression-gzip")]
        &GzipCodec,
        #[cfg(feature = "compression-zstd")]
        &ZstdCodec,
        #[cfg(feature = "compression-bzip2")]
        &Bzip2Codec,
        #[cfg(feature = "compression-xz")]
        &XzCodec,
    ]
}

/// Detect a codec from the buffered prefix of `reader` without consuming it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn CompressionCodec> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    builtin_codecs()
        .into_iter()
        .find(|codec| buf.starts_with(codec.magic_bytes()))
}

/// Wrap `reader` with decompression if its first bytes match a known codec.
///
/// The returned reader is buffered.
///
/// # Errors
/// Returns an error if the matching codec fails to initialize.
pub fn auto_detect_reader<'a, R: Read + 'a>(reader: R) -> Result<Box<dyn BufRead + 'a>> {
    let mut buf_reader = BufReader::new(reader);
    match detect_from_magic(&mut buf_reader) {
        Some(codec) => {
            tracing::debug!(codec = codec.name(), "decompressing input stream");
            let inner = codec
                .wrap_reader_dyn(Box::new(buf_reader))
                .with_context(|| format!("wrap reader with {} codec", codec.name()))?;
            Ok(Box::new(BufReader::new(inner)))
        }
        None => Ok(Box::new(buf_reader)),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x1f, 0x8b]
    }

    fn wrap_reader_dyn<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x28, 0xb5, 0x2f, 0xfd]
    }

    fn wrap_reader_dyn<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read + 'a>)
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    // "BZh": a bare "BZ" would also match plain text starting with those letters.
    fn magic_bytes(&self) -> &[u8] {
        &[0x42, 0x5a, 0x68]
    }

    fn wrap_reader_dyn<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        use bzip2::read::MultiBzDecoder;
        Ok(Box::new(MultiBzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]
    }

    fn wrap_reader_dyn<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new_multi_decoder(reader)))
    }
}
