//! Resolves a free-text "correct answer" indicator into an option index.
//!
//! Upstream generators are inconsistent: sometimes they answer with a letter
//! ("C", "Letra B", "Alternativa D"), sometimes with the option text itself,
//! sometimes with a sentence that merely contains it. The match order below is
//! a deliberate policy: explicit letter first, exact text second, containment
//! as a last resort.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// The whole answer is a letter designation, optionally wrapped in a known
/// designator word: "C", "b)", "(D)", "Letra B", "Alternativa: d".
static DESIGNATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:letra|alternativa|op[cç][aã]o)?\s*[:\-]?\s*\(?([A-Da-d])\)?\s*[).:]?$")
        .unwrap()
});

/// A designator word followed by a letter anywhere in the text, e.g.
/// "a resposta é a letra b".
static DESIGNATOR_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:letra|alternativa|op[cç][aã]o)\s*[:\-]?\s*\(?([A-Da-d])\)?\b").unwrap()
});

/// Standalone uppercase letter inside longer text, e.g. "Resposta correta: C".
static STANDALONE_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-D])\b").unwrap());

/// Map a loose correct-answer text to an index into `options`.
/// Returns `None` when nothing matches.
pub fn normalize(answer: &str, options: &[String]) -> Option<usize> {
    if let Some(index) = match_letter(answer) {
        if index < options.len() {
            debug!(answer, index, "normalized via letter designation");
            return Some(index);
        }
    }

    let folded = answer.trim().to_lowercase();
    if let Some(index) = options
        .iter()
        .position(|opt| opt.trim().to_lowercase() == folded)
    {
        debug!(answer, index, "normalized via exact match");
        return Some(index);
    }

    if let Some(index) = options.iter().position(|opt| {
        let opt_folded = opt.trim().to_lowercase();
        !opt_folded.is_empty()
            && (folded.contains(&opt_folded) || opt_folded.contains(&folded))
    }) {
        debug!(answer, index, "normalized via containment");
        return Some(index);
    }

    debug!(answer, "normalization found no match");
    None
}

/// Letter designation heuristic, three tiers:
///
/// 1. the trimmed answer *is* a designation ("C", "Letra B"), any case;
/// 2. a designator word plus letter anywhere in the text ("... a letra b ...");
/// 3. exactly one distinct standalone uppercase A-D anywhere in the text.
///    Uppercase only, and abstaining on ambiguity, so that the Portuguese
///    article in "A resposta é banana" does not shadow the text match and
///    phrases with no reliable letter fall through.
fn match_letter(answer: &str) -> Option<usize> {
    if let Some(cap) = DESIGNATOR.captures(answer.trim()) {
        let letter = cap[1].as_bytes()[0].to_ascii_uppercase();
        return Some((letter - b'A') as usize);
    }
    if let Some(cap) = DESIGNATOR_INLINE.captures(answer) {
        let letter = cap[1].as_bytes()[0].to_ascii_uppercase();
        return Some((letter - b'A') as usize);
    }

    let mut found: Option<u8> = None;
    for m in STANDALONE_UPPER.find_iter(answer) {
        // A capital at the very start is most likely a sentence-initial
        // article ("A resposta ..."), not a designation; tier 1 already
        // covers answers that are nothing but a letter.
        if m.start() == 0 {
            continue;
        }
        let letter = m.as_str().as_bytes()[0];
        match found {
            None => found = Some(letter),
            Some(prev) if prev == letter => {}
            Some(_) => return None, // ambiguous
        }
    }
    found.map(|letter| (letter - b'A') as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["maçã", "banana", "uva", "pera"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn bare_letter_resolves() {
        assert_eq!(normalize("C", &options()), Some(2));
        assert_eq!(normalize("d", &options()), Some(3));
    }

    #[test]
    fn letter_with_designator_word() {
        assert_eq!(normalize("Letra B", &options()), Some(1));
        assert_eq!(normalize("Alternativa: D", &options()), Some(3));
        assert_eq!(normalize("Opção (a)", &options()), Some(0));
    }

    #[test]
    fn designator_word_inside_sentence() {
        assert_eq!(normalize("A resposta correta é a letra B.", &options()), Some(1));
    }

    #[test]
    fn single_uppercase_letter_in_sentence() {
        assert_eq!(normalize("resposta correta: C", &options()), Some(2));
    }

    #[test]
    fn exact_text_match() {
        assert_eq!(normalize("banana", &options()), Some(1));
        assert_eq!(normalize("  UVA  ", &options()), Some(2));
    }

    #[test]
    fn containment_is_last_resort() {
        assert_eq!(normalize("a fruta banana, claramente", &options()), Some(1));
    }

    #[test]
    fn ambiguous_letters_fall_through_to_text() {
        assert_eq!(normalize("A resposta é banana", &options()), Some(1));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(normalize("xyz", &options()), None);
    }
}
