//! Upload classification: sniffed MIME type → internal format identifier.
//!
//! Byte sniffing sits behind the [`Sniffer`] trait. [`MagicSniffer`] is the
//! built-in implementation: it reads the start of the stream and matches
//! magic numbers through `image::guess_format`, plus a few document
//! signatures the `image` crate does not know.
//!
//! [`classify_stream`] takes the most confident candidate, rewinds the stream
//! so callers can read it again from the start, and maps the MIME type through
//! a static table. A MIME type outside the table is an explicit
//! [`FormatError::UnsupportedFormat`].

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Seek};
use std::sync::LazyLock;

use thiserror::Error;

/// Number of leading bytes [`MagicSniffer`] inspects.
const SNIFF_LEN: u64 = 64;

/// Signatures checked when `image::guess_format` finds nothing.
const EXTRA_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"8BPS", "image/psd"),
    (b"%!PS-Adobe", "image/eps"),
];

/// Internal format identifiers, as understood by the image backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatId {
    Bmp,
    Dcx,
    Eps,
    Gif,
    Jpeg,
    Pcd,
    Pcx,
    Pdf,
    Png,
    Ppm,
    Psd,
    Tiff,
    Xbm,
    Xpm,
    Webp,
}

impl FormatId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bmp => "BMP",
            Self::Dcx => "DCX",
            // Lowercase in the backend's own format list.
            Self::Eps => "eps",
            Self::Gif => "GIF",
            Self::Jpeg => "JPEG",
            Self::Pcd => "PCD",
            Self::Pcx => "PCX",
            Self::Pdf => "PDF",
            Self::Png => "PNG",
            Self::Ppm => "PPM",
            Self::Psd => "PSD",
            Self::Tiff => "TIFF",
            Self::Xbm => "XBM",
            Self::Xpm => "XPM",
            Self::Webp => "WEBP",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MIME_TYPES: &[(&str, FormatId)] = &[
    ("image/x-ms-bmp", FormatId::Bmp),
    ("image/bmp", FormatId::Bmp),
    ("image/dcx", FormatId::Dcx),
    ("image/eps", FormatId::Eps),
    ("image/gif", FormatId::Gif),
    ("image/jpeg", FormatId::Jpeg),
    ("image/pcd", FormatId::Pcd),
    ("image/pcx", FormatId::Pcx),
    ("application/pdf", FormatId::Pdf),
    ("image/png", FormatId::Png),
    ("image/x-ppm", FormatId::Ppm),
    ("image/psd", FormatId::Psd),
    ("image/tiff", FormatId::Tiff),
    ("image/x-xbitmap", FormatId::Xbm),
    ("image/x-xpm", FormatId::Xpm),
    ("image/webp", FormatId::Webp),
];

static MIME_TABLE: LazyLock<HashMap<&'static str, FormatId>> =
    LazyLock::new(|| MIME_TYPES.iter().copied().collect());

/// Format identifier for a MIME type, if it is a supported upload format.
pub fn format_for_mime(mime_type: &str) -> Option<FormatId> {
    MIME_TABLE.get(mime_type).copied()
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported image format: {mime_type}")]
    UnsupportedFormat { mime_type: String },
    #[error("Could not determine the format of the stream")]
    UnclassifiedStream,
}

/// One sniffing result.
#[derive(Debug, Clone, PartialEq)]
pub struct MimeCandidate {
    pub mime_type: String,
    pub confidence: f32,
}

/// Guesses MIME types from stream content.
pub trait Sniffer: Sync {
    /// Candidates ordered by descending confidence; empty when nothing matches.
    fn sniff(&self, stream: &mut dyn Read) -> io::Result<Vec<MimeCandidate>>;
}

/// Magic-number sniffer backed by `image::guess_format`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

impl Sniffer for MagicSniffer {
    fn sniff(&self, stream: &mut dyn Read) -> io::Result<Vec<MimeCandidate>> {
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        stream.take(SNIFF_LEN).read_to_end(&mut head)?;

        let mime_type = match image::guess_format(&head) {
            Ok(format) => Some(format.to_mime_type()),
            Err(_) => EXTRA_SIGNATURES
                .iter()
                .find(|(magic, _)| head.starts_with(magic))
                .map(|(_, mime)| *mime),
        };
        Ok(mime_type
            .map(|mime_type| MimeCandidate {
                mime_type: mime_type.to_string(),
                confidence: 1.0,
            })
            .into_iter()
            .collect())
    }
}

/// Classify an upload, leaving `stream` rewound to its start.
///
/// Returns the format identifier and the sniffed MIME type.
pub fn classify_stream<R: Read + Seek>(
    sniffer: &dyn Sniffer,
    stream: &mut R,
) -> Result<(FormatId, String), FormatError> {
    let candidates = sniffer.sniff(stream)?;
    let mime_type = candidates
        .into_iter()
        .next()
        .map(|candidate| candidate.mime_type)
        .unwrap_or_default();
    stream.rewind()?;

    if mime_type.is_empty() {
        return Err(FormatError::UnclassifiedStream);
    }
    match format_for_mime(&mime_type) {
        Some(format) => Ok((format, mime_type)),
        None => Err(FormatError::UnsupportedFormat { mime_type }),
    }
}
