//! Parsers for loosely structured question payloads.
//!
//! The AI backend is asked for a strict JSON object but in practice replies
//! with anything from clean JSON to prose-wrapped JSON to the plain-text
//! template (`Pergunta:` / `A)`..`D)` / `Resposta correta:`). Both paths here
//! return typed results and never panic on malformed input.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::ParseError;

// =============== Embedded JSON extraction ===============

/// Byte range of a top-level JSON object inside a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObjSpan {
    start: usize,
    end: usize, // inclusive index of the closing brace
}

/// Find all top-level `{...}` object spans in `text`, string- and
/// escape-aware so braces inside string literals do not confuse the scan.
fn find_object_spans(text: &str) -> Vec<ObjSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        spans.push(ObjSpan { start, end: i });
                    }
                }
            }
            _ => {}
        }
    }

    trace!(count = spans.len(), "found top-level JSON object spans");
    spans
}

/// Deserialize the first top-level JSON object in `text` that matches `T`.
/// Surrounding prose, markdown fences, and stray structures are ignored.
pub fn extract_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let spans = find_object_spans(text);
    if spans.is_empty() {
        return Err(ParseError::NoJsonObject);
    }
    let mut last_err = None;
    for span in &spans {
        match serde_json::from_str::<T>(&text[span.start..=span.end]) {
            Ok(value) => {
                debug!(start = span.start, "deserialized embedded JSON payload");
                return Ok(value);
            }
            Err(e) => last_err = Some(e),
        }
    }
    // At least one span existed, so last_err is set.
    Err(last_err.map(ParseError::Json).unwrap_or(ParseError::NoJsonObject))
}

// =============== Plain-text template parsing ===============

const PROMPT_MARKER: &str = "pergunta:";
const ANSWER_MARKER: &str = "resposta correta:";

/// A question parsed from the plain-text template. The correct answer is
/// still free text at this stage; `normalize` resolves it to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateQuestion {
    pub prompt: String,
    pub options: [String; 4],
    pub answer_text: String,
}

/// Parse the `Pergunta:` / `A)`..`D)` / `Resposta correta:` template.
///
/// Markers are matched case-insensitively and lines may arrive in any order
/// with arbitrary surrounding whitespace or noise lines, but all four option
/// lines and exactly one prompt and one answer line must be present.
pub fn parse_template(text: &str) -> Result<TemplateQuestion, ParseError> {
    let mut prompt: Option<String> = None;
    let mut answer: Option<String> = None;
    let mut options: [Option<String>; 4] = [None, None, None, None];
    let mut option_lines = 0usize;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = strip_marker(line, PROMPT_MARKER) {
            if prompt.replace(rest.to_string()).is_some() {
                return Err(ParseError::DuplicateMarker("Pergunta:"));
            }
        } else if let Some(rest) = strip_marker(line, ANSWER_MARKER) {
            if answer.replace(rest.to_string()).is_some() {
                return Err(ParseError::DuplicateMarker("Resposta correta:"));
            }
        } else if let Some((slot, rest)) = option_line(line) {
            option_lines += 1;
            if options[slot].replace(rest).is_some() {
                return Err(ParseError::DuplicateMarker("option line"));
            }
        }
        // Anything else is ordering noise; skip it.
    }

    let prompt = prompt.ok_or(ParseError::MissingMarker("Pergunta:"))?;
    let answer = answer.ok_or(ParseError::MissingMarker("Resposta correta:"))?;
    if options.iter().any(|o| o.is_none()) {
        return Err(ParseError::OptionCount(option_lines));
    }
    let options = options.map(|o| o.unwrap_or_default());

    debug!(prompt_len = prompt.len(), "parsed plain-text question template");
    Ok(TemplateQuestion { prompt, options, answer_text: answer })
}

/// Case-insensitive prefix strip. Markers are pure ASCII, so a byte-length
/// prefix comparison is safe on any input.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    if line.len() >= marker.len()
        && line.is_char_boundary(marker.len())
        && line[..marker.len()].eq_ignore_ascii_case(marker)
    {
        Some(line[marker.len()..].trim())
    } else {
        None
    }
}

/// Match an option line `A) text` / `b) text` / `C. text` / `d: text`.
fn option_line(line: &str) -> Option<(usize, String)> {
    let mut chars = line.chars();
    let letter = chars.next()?;
    let sep = chars.next()?;
    let slot = match letter.to_ascii_uppercase() {
        'A' => 0,
        'B' => 1,
        'C' => 2,
        'D' => 3,
        _ => return None,
    };
    if !matches!(sep, ')' | '.' | ':') {
        return None;
    }
    Some((slot, chars.as_str().trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Pergunta: Qual é a capital do Brasil?
A) Rio de Janeiro
B) São Paulo
C) Brasília
D) Salvador
Resposta correta: C";

    #[test]
    fn parses_well_formed_template() {
        let parsed = parse_template(WELL_FORMED).unwrap();
        assert_eq!(parsed.prompt, "Qual é a capital do Brasil?");
        assert_eq!(parsed.options[2], "Brasília");
        assert_eq!(parsed.answer_text, "C");
    }

    #[test]
    fn markers_are_case_insensitive_and_order_free() {
        let shuffled = "\
resposta correta: Brasília

d) Salvador
b) São Paulo
PERGUNTA:   Qual é a capital do Brasil?
a) Rio de Janeiro
noise line the model added
c) Brasília";
        let parsed = parse_template(shuffled).unwrap();
        assert_eq!(parsed.prompt, "Qual é a capital do Brasil?");
        assert_eq!(parsed.options[0], "Rio de Janeiro");
        assert_eq!(parsed.options[3], "Salvador");
        assert_eq!(parsed.answer_text, "Brasília");
    }

    #[test]
    fn missing_option_line_fails() {
        let input = "Pergunta: x?\nA) um\nB) dois\nC) três\nResposta correta: A";
        assert!(matches!(parse_template(input), Err(ParseError::OptionCount(3))));
    }

    #[test]
    fn duplicate_answer_line_fails() {
        let input = format!("{WELL_FORMED}\nResposta correta: D");
        assert!(matches!(
            parse_template(&input),
            Err(ParseError::DuplicateMarker("Resposta correta:"))
        ));
    }

    #[test]
    fn json_payload_embedded_in_prose() {
        #[derive(serde::Deserialize)]
        struct P {
            question: String,
        }
        let text = r#"Claro! Aqui está: {"question": "Quanto é 2 + 2?"} Espero que ajude."#;
        let p: P = extract_json_payload(text).unwrap();
        assert_eq!(p.question, "Quanto é 2 + 2?");
    }

    #[test]
    fn no_json_object_reports_typed_error() {
        #[derive(serde::Deserialize)]
        struct P {
            #[allow(dead_code)]
            question: String,
        }
        assert!(matches!(
            extract_json_payload::<P>("nenhum objeto aqui"),
            Err(ParseError::NoJsonObject)
        ));
    }
}
