use chrono::Utc;
use mime::Mime;
use std::path::Path;

/// Longest extension carried over from a client filename
const MAX_EXTENSION_LEN: usize = 10;

/// Build a storage key from its raw ingredients.
///
/// Pure so collision behavior can be tested without a clock or RNG: the
/// millisecond timestamp spreads keys over time, the random component
/// separates submissions landing in the same millisecond. Client input
/// never reaches the key except as a sanitized extension, so keys are
/// always plain filenames without path separators.
pub fn storage_key(timestamp_millis: i64, random: u32, extension: &str) -> String {
    if extension.is_empty() {
        format!("{}-{:08x}", timestamp_millis, random)
    } else {
        format!("{}-{:08x}.{}", timestamp_millis, random, extension)
    }
}

/// Extension to preserve on the stored artifact.
///
/// Prefers the client filename's extension; falls back to one derived
/// from the declared MIME type when the filename has none or it looks
/// suspicious.
pub fn extension_for(original_filename: Option<&str>, content_type: &Mime) -> String {
    if let Some(name) = original_filename {
        if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return ext.to_ascii_lowercase();
            }
        }
    }

    match content_type.essence_str() {
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        _ => "bin",
    }
    .to_string()
}

/// Generate a fresh key for an accepted upload using the real clock and RNG
pub fn generate_key(original_filename: Option<&str>, content_type: &Mime) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let random: u32 = rand::random();
    storage_key(timestamp, random, &extension_for(original_filename, content_type))
}
