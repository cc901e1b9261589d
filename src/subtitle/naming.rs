//! File name handling shared by the LRC converter and the MP3 extractor.

/// Extension stripped from subtitle inputs before anything else.
pub const SUBTITLE_EXTENSION: &str = ".vtt";

/// Extensions removed by nested stripping, checked in this order.
pub const KNOWN_EXTENSIONS: &[&str] = &[
    // Audio
    ".mp3", ".wav", ".aac", ".flac", ".ogg", ".wma", ".m4a", ".opus", ".aiff", ".au", ".ra",
    ".ac3", ".dts", ".amr", ".awb",
    // Video
    ".mp4", ".avi", ".mkv", ".flv", ".mov", ".wmv", ".webm", ".m4v", ".3gp", ".asf", ".rm",
    ".rmvb", ".vob", ".ogv", ".dv", ".ts",
    // Subtitle
    ".vtt", ".srt", ".sub", ".sbv", ".ass", ".ssa", ".webvtt", ".ttml", ".dfxp", ".smi", ".sami",
];

const ILLEGAL_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(cut) || !name[cut..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    Some(&name[..cut])
}

/// Output base name for a subtitle file.
///
/// Removes a trailing `.vtt`, then, with `strip_nested`, keeps removing
/// known media extensions (`song.mp3.vtt` becomes `song`). Stripping stops
/// once a pass removes nothing or no `.` is left.
pub fn get_output_file_name(original_name: &str, strip_nested: bool) -> String {
    let mut base =
        strip_suffix_ignore_case(original_name, SUBTITLE_EXTENSION).unwrap_or(original_name);

    if !strip_nested {
        return base.to_string();
    }

    loop {
        let stripped = KNOWN_EXTENSIONS
            .iter()
            .find_map(|ext| strip_suffix_ignore_case(base, ext));

        match stripped {
            Some(shorter) => base = shorter,
            None => break,
        }

        if !base.contains('.') {
            break;
        }
    }

    base.to_string()
}

/// Replace characters that are illegal in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace(ILLEGAL_CHARS, "_").trim().to_string()
}

/// Everything before the last `.`, or the whole name when there is none.
pub fn base_name(name: &str) -> &str {
    name.rsplit_once('.').map(|(base, _)| base).unwrap_or(name)
}

/// Lowercase extension after the last `.`, empty when there is none.
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Whether `name`'s extension is in `accepted` (lowercase, no dot).
pub fn matches_extension(name: &str, accepted: &[String]) -> bool {
    let ext = extension_of(name);
    !ext.is_empty() && accepted.iter().any(|a| *a == ext)
}
