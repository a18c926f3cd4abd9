use crate::error::IngestError;
use crate::models::ChunkingOptions;

/// Separator priority, most semantic first. The empty separator is the
/// terminal level: it slices on character boundaries and always succeeds.
const SEPARATORS: [&str; 7] = ["\n\n", "\n", ".", "?", "!", " ", ""];

/// Splits `text` into fragments of at most `max_chars` characters, preferring
/// paragraph, line, sentence, and word boundaries in that order, then applies
/// a trailing-character overlap between consecutive fragments.
pub fn chunk_text(text: &str, options: &ChunkingOptions) -> Result<Vec<String>, IngestError> {
    validate(options)?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let fragments = split_level(text, &SEPARATORS, options.max_chars);
    Ok(apply_overlap(fragments, options))
}

fn validate(options: &ChunkingOptions) -> Result<(), IngestError> {
    if options.max_chars == 0 {
        return Err(IngestError::InvalidArgument(
            "max_chars must be positive".to_string(),
        ));
    }

    if options.overlap_chars >= options.max_chars {
        return Err(IngestError::InvalidArgument(format!(
            "overlap_chars {} must be smaller than max_chars {}",
            options.overlap_chars, options.max_chars
        )));
    }

    Ok(())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_level(segment: &str, separators: &[&str], max_chars: usize) -> Vec<String> {
    let Some((separator, finer)) = separators.split_first() else {
        return Vec::new();
    };

    if separator.is_empty() {
        return slice_chars(segment, max_chars);
    }

    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in split_keeping_separator(segment, separator) {
        let piece_len = char_len(piece);

        if piece_len > max_chars {
            close(&mut fragments, &mut current);
            current_len = 0;
            fragments.extend(split_level(piece, finer, max_chars));
            continue;
        }

        // Combining two pieces re-includes the boundary text, so packing
        // stops strictly below the limit; a lone piece may still fill it.
        if current_len > 0 && current_len + piece_len >= max_chars {
            close(&mut fragments, &mut current);
            current_len = 0;
        }

        current.push_str(piece);
        current_len += piece_len;
    }

    close(&mut fragments, &mut current);
    fragments
}

/// Splits at every occurrence of `separator`, keeping the separator attached
/// to the end of the piece it terminates.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while let Some(found) = rest.find(separator) {
        let end = found + separator.len();
        pieces.push(&rest[..end]);
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }

    pieces
}

fn slice_chars(segment: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut slices = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            slices.push(trimmed.to_string());
        }
        start = end;
    }

    slices
}

fn close(fragments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed.to_string());
    }
    current.clear();
}

/// Prefixes each fragment after the first with the tail of its predecessor.
/// The shared length is capped by the predecessor's own length and by the
/// room left under `max_chars`, computed against the pre-overlap fragments.
fn apply_overlap(fragments: Vec<String>, options: &ChunkingOptions) -> Vec<String> {
    if options.overlap_chars == 0 || fragments.len() < 2 {
        return fragments;
    }

    let mut overlapped = Vec::with_capacity(fragments.len());
    overlapped.push(fragments[0].clone());

    for index in 1..fragments.len() {
        let previous = &fragments[index - 1];
        let current = &fragments[index];
        let previous_len = char_len(previous);
        let shared = options
            .overlap_chars
            .min(previous_len)
            .min(options.max_chars.saturating_sub(char_len(current)));

        if shared == 0 {
            overlapped.push(current.clone());
            continue;
        }

        let tail: String = previous.chars().skip(previous_len - shared).collect();
        overlapped.push(format!("{tail}{current}"));
    }

    overlapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max_chars: usize, overlap_chars: usize) -> ChunkingOptions {
        ChunkingOptions {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn empty_text_yields_no_fragments() {
        let fragments = chunk_text("", &options(100, 10)).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn whitespace_only_text_yields_no_fragments() {
        let fragments = chunk_text(" \n\n \t ", &options(100, 10)).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn tight_limit_splits_at_sentence_boundaries() {
        let fragments = chunk_text("A. B. C.", &options(5, 0)).unwrap();
        assert_eq!(fragments, vec!["A.", "B.", "C."]);
    }

    #[test]
    fn short_paragraphs_pack_into_one_fragment() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let fragments = chunk_text(text, &options(100, 0)).unwrap();
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("First paragraph."));
        assert!(fragments[0].contains("Second paragraph."));
    }

    #[test]
    fn unbroken_runs_fall_back_to_character_slices() {
        let fragments = chunk_text(&"a".repeat(10), &options(4, 0)).unwrap();
        assert_eq!(fragments, vec!["aaaa", "aaaa", "aa"]);
    }

    #[test]
    fn no_fragment_exceeds_max_chars() {
        let text = "Pump pressure must stay within limits. The relief valve opens \
                    at the configured threshold!\n\nOperators log every reading. \
                    Was the gauge calibrated? Records say yes.\nSupercalifragilisticexpialidocious \
                    equipment identifiers are still split safely.";
        let fragments = chunk_text(text, &options(40, 8)).unwrap();
        assert!(!fragments.is_empty());
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 40, "oversized: {fragment:?}");
            assert!(!fragment.trim().is_empty());
        }
    }

    #[test]
    fn fragments_preserve_document_order_and_content() {
        let text = "alpha beta gamma delta epsilon zeta";
        let fragments = chunk_text(text, &options(12, 0)).unwrap();

        let rejoined: String = fragments.join("").chars().filter(|c| !c.is_whitespace()).collect();
        let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "One sentence. Another sentence? A third!\n\nA new paragraph with more words.";
        let first = chunk_text(text, &options(24, 6)).unwrap();
        let second = chunk_text(text, &options(24, 6)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn consecutive_fragments_share_an_overlap_prefix() {
        let text = "alpha beta gamma delta epsilon";
        let overlap = 4;
        let fragments = chunk_text(text, &options(12, overlap)).unwrap();
        assert!(fragments.len() >= 2);

        for pair in fragments.windows(2) {
            let previous: Vec<char> = pair[0].chars().collect();
            let shares_tail = (1..=overlap.min(previous.len())).any(|len| {
                let tail: String = previous[previous.len() - len..].iter().collect();
                pair[1].starts_with(&tail)
            });
            assert!(shares_tail, "no shared prefix between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn overlap_respects_max_chars() {
        let text = "word ".repeat(50);
        let fragments = chunk_text(&text, &options(15, 14)).unwrap();
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 15);
        }
    }

    #[test]
    fn zero_max_chars_is_rejected() {
        let result = chunk_text("anything", &options(0, 0));
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
    }

    #[test]
    fn overlap_matching_max_chars_is_rejected() {
        let result = chunk_text("anything", &options(10, 10));
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
    }
}
