//! crates/doc_chat_core/src/transcript.rs
//!
//! Pure helpers for working with time-coded transcript segments.

use crate::domain::TranscriptSegment;

/// How far (in seconds) a segment's start may be from the target timestamp
/// and still count as context.
pub const DEFAULT_CONTEXT_WINDOW_SECS: f64 = 30.0;

/// Converts a second offset into `HH:MM:SS`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Collects the transcript text around a specific timestamp.
///
/// A segment qualifies when its interval contains the target, or when its
/// start lies within `window_seconds` of the target. Qualifying segments are
/// returned in input order, one `[HH:MM:SS] text` line each.
pub fn find_text_around_timestamp(
    segments: &[TranscriptSegment],
    target_seconds: f64,
    window_seconds: f64,
) -> String {
    if segments.is_empty() {
        return "No timestamp information available.".to_string();
    }

    let context_lines: Vec<String> = segments
        .iter()
        .filter(|segment| {
            (segment.start <= target_seconds && target_seconds <= segment.end)
                || (segment.start - target_seconds).abs() <= window_seconds
        })
        .map(|segment| format!("[{}] {}", format_timestamp(segment.start), segment.text))
        .collect();

    if context_lines.is_empty() {
        return format!(
            "No content found around timestamp {}.",
            format_timestamp(target_seconds)
        );
    }

    context_lines.join("\n")
}
