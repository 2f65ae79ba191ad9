//! Output truncation for history entries.
//!
//! Every execution is rendered into a day file that is rewritten in full on
//! each append, so a single `kubectl get events -A` must not grow it without
//! bound. The head and the tail of the output are kept; the middle goes.

pub use kubecron_core::config::DEFAULT_MAX_OUTPUT_CHARS as DEFAULT_MAX_CHARS;

/// Truncate `output` to at most `max_chars` characters using middle-omission.
///
/// If `output` fits within `max_chars`, it is returned unchanged.
/// Otherwise the result is:
///
/// ```text
/// <first max_chars/2 chars>
///
/// ... [OUTPUT TRUNCATED: N chars omitted] ...
///
/// <last max_chars/2 chars>
/// ```
///
/// The split is done on character boundaries (not bytes), so multi-byte
/// Unicode sequences are never broken.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    if output.len() <= max_chars {
        return output.to_owned();
    }

    let chars: Vec<char> = output.chars().collect();
    let total = chars.len();

    if total <= max_chars {
        return output.to_owned();
    }

    let half = max_chars / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[total - half..].iter().collect();
    let omitted = total - 2 * half;

    format!("{head}\n\n... [OUTPUT TRUNCATED: {omitted} chars omitted] ...\n\n{tail}")
}
