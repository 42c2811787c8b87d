use log::{info, warn};

pub const FALLBACK_FOURCC: &str = "mp4v";

/// Output container chosen for a source codec tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecChoice {
    pub fourcc: String,
    /// Container extension including the leading dot.
    pub extension: &'static str,
}

impl CodecChoice {
    /// The four FourCC characters handed to the writer. Tags that are not
    /// four characters long (`prores`) are written as `mp4v`.
    pub fn fourcc_chars(&self) -> [char; 4] {
        fourcc_chars(&self.fourcc).unwrap_or(['m', 'p', '4', 'v'])
    }
}

/// Four characters packed little-endian, first character in the low byte.
pub fn fourcc_from_code(code: u32) -> String {
    (0..4)
        .map(|i| char::from(((code >> (8 * i)) & 0xff) as u8))
        .collect()
}

pub fn fourcc_chars(tag: &str) -> Option<[char; 4]> {
    let chars: Vec<char> = tag.chars().collect();
    chars.try_into().ok()
}

pub fn is_printable(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace())
}

fn lookup(tag: &str) -> Option<&'static str> {
    let extension = match tag {
        "mp4v" | "avc1" | "H264" | "h264" | "X264" | "H265" | "HEVC" => ".mp4",
        "XVID" | "DIVX" | "DX50" | "MJPG" | "HFYU" | "FFV1" | "I420" | "YV12" => ".avi",
        "jpeg" | "prores" | "apcn" | "apch" | "apco" | "apcs" | "ap4h" => ".mov",
        "VP80" | "VP90" => ".mkv",
        _ => return None,
    };
    Some(extension)
}

/// Second container some tag tables list for a tag that resolves to `.mp4`.
pub fn alternative_container(tag: &str) -> Option<&'static str> {
    match tag {
        "avc1" | "mp4v" => Some(".mov"),
        "H265" | "HEVC" => Some(".mkv"),
        _ => None,
    }
}

fn fallback() -> CodecChoice {
    CodecChoice {
        fourcc: FALLBACK_FOURCC.to_string(),
        extension: ".mp4",
    }
}

/// Resolves the writer settings for a source tag. Missing, non-printable and
/// unmapped tags all resolve to `mp4v` in an `.mp4` container.
pub fn codec_for_tag(tag: Option<&str>) -> CodecChoice {
    let Some(tag) = tag else {
        warn!("no codec tag reported, using {}", FALLBACK_FOURCC);
        return fallback();
    };
    if !is_printable(tag) {
        warn!("invalid codec tag {:?}, using {}", tag, FALLBACK_FOURCC);
        return fallback();
    }
    match lookup(tag) {
        Some(extension) => {
            info!("detected codec {}", tag);
            if let Some(other) = alternative_container(tag) {
                info!("codec {} also fits {}, writing {}", tag, other, extension);
            }
            CodecChoice {
                fourcc: tag.to_string(),
                extension,
            }
        }
        None => {
            warn!("codec {} has no known container, using {}", tag, FALLBACK_FOURCC);
            fallback()
        }
    }
}
