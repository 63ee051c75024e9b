//! Recursive overflow splitting for oversized text chunks.
//!
//! [`split_text`] partitions a single over-length text into ordered pieces,
//! each within the chunk budget, with roughly `overlap` characters of shared
//! context between consecutive pieces. Natural boundaries win over hard
//! cuts: blank lines first, then line breaks, sentence punctuation, clause
//! punctuation, word boundaries, and only then fixed-width character
//! windows.
//!
//! All lengths here are counted in Unicode scalar values, matching the chunk
//! budget semantics of [`crate::config::PipelineConfig`].

use unicode_segmentation::UnicodeSegmentation;

/// Separator hierarchy, coarse to fine. Word boundaries and hard character
/// cuts are handled separately below this list.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ", "];

/// Splits `text` into pieces of at most `max_len` characters with
/// approximately `overlap` characters shared between neighbors.
///
/// Deterministic for a given input. Callers guarantee `overlap < max_len`
/// (enforced by configuration validation).
pub fn split_text(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    debug_assert!(max_len > 0 && overlap < max_len);
    if char_len(text) <= max_len {
        return vec![text.to_string()];
    }
    split_with(text, max_len, overlap, SEPARATORS)
}

fn split_with(text: &str, max_len: usize, overlap: usize, separators: &[&str]) -> Vec<String> {
    let Some((separator, finer)) = separators.split_first() else {
        return split_words(text, max_len, overlap);
    };

    let pieces = split_keep_separator(text, separator);
    if pieces.len() <= 1 {
        return split_with(text, max_len, overlap, finer);
    }

    let mut atoms: Vec<String> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if char_len(piece) <= max_len {
            atoms.push(piece.to_string());
        } else {
            atoms.extend(split_with(piece, max_len, overlap, finer));
        }
    }
    merge_with_overlap(atoms, max_len, overlap)
}

/// Word-boundary atomization, the last natural level before hard cuts.
fn split_words(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    let mut atoms: Vec<String> = Vec::new();
    for word in text.split_word_bounds() {
        if char_len(word) <= max_len {
            atoms.push(word.to_string());
        } else {
            atoms.extend(sliding_windows(word, max_len, overlap));
        }
    }
    if atoms.len() <= 1 {
        return atoms;
    }
    merge_with_overlap(atoms, max_len, overlap)
}

/// Fixed-width character windows advancing by `max_len - overlap`, so
/// consecutive windows share exactly `overlap` characters.
fn sliding_windows(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let stride = max_len - overlap;
    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max_len).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }
    windows
}

/// Greedy merge of atoms into budget-bounded pieces. On every flush, the
/// trailing atoms of the flushed piece (up to `overlap` characters) seed the
/// next piece so neighbors share context.
fn merge_with_overlap(atoms: Vec<String>, max_len: usize, overlap: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for atom in atoms {
        let atom_len = char_len(&atom);
        if current_len + atom_len > max_len && !current.is_empty() {
            pieces.push(current.concat());

            let mut carried: Vec<String> = Vec::new();
            let mut carried_len = 0usize;
            for prior in current.iter().rev() {
                let prior_len = char_len(prior);
                if carried_len + prior_len > overlap {
                    break;
                }
                carried.push(prior.clone());
                carried_len += prior_len;
            }
            carried.reverse();
            current = carried;
            current_len = carried_len;

            // The carry must never push the next piece over budget.
            if current_len + atom_len > max_len {
                current.clear();
                current_len = 0;
            }
        }
        current_len += atom_len;
        current.push(atom);
    }

    if !current.is_empty() {
        pieces.push(current.concat());
    }
    pieces
}

/// Lossless split keeping the separator attached to the left piece.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search_from = 0;
    while let Some(found) = text[search_from..].find(separator) {
        let end = search_from + found + separator.len();
        pieces.push(&text[start..end]);
        start = end;
        search_from = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
