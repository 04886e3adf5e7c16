//! Transcript normalization so every screen matches against the same shape.

/// Normalize a raw speech-to-text transcript for matching.
///
/// Lower-cases, trims, and collapses internal whitespace runs so substring
/// and prefix rules see one predictable form. Total: empty or
/// whitespace-only input yields an empty string.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_space = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            last_space = false;
        }
    }
    out
}

/// Shorten a transcript for the preview toast.
///
/// The toast shows the same shape the matcher saw, so the text goes
/// through [`normalize`] first. Anything over `max_chars` is cut at the
/// last word boundary that still fits, with an ellipsis taking the final
/// slot; a single overlong word is cut mid-word rather than dropped.
#[must_use]
pub fn transcript_preview(text: &str, max_chars: usize) -> String {
    let cleaned = normalize(text);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let budget = max_chars.saturating_sub(1).max(1);
    let head: String = cleaned.chars().take(budget).collect();
    let cut = match head.rfind(' ') {
        Some(idx) if idx > 0 => &head[..idx],
        _ => head.as_str(),
    };
    format!("{}…", cut.trim_end())
}
