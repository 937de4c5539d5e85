//! Post-processing: deterministic cleanup of extracted text.
//!
//! PDF text layers and OCR output both carry typographic characters that
//! downstream consumers (and narrow terminals) choke on: curly quotes, en
//! dashes, bullet glyphs from private-use fonts, zero-width joiners. The
//! passes here map them to plain equivalents without touching content.
//!
//! Every pass returns ASCII-only input unchanged, so running the chain twice
//! is the same as running it once.

use crate::config::OutputEncoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Map problem punctuation to ASCII and drop invisible characters.
///
/// | Input | Output |
/// |-------|--------|
/// | `‘ ’ ‚ ′` | `'` |
/// | `“ ” „ ″` | `"` |
/// | U+2010–U+2015, `−` | `-` |
/// | `• ● ◦ ▪ ‣ ⁃` and the Symbol-font bullet U+F0B7 | `*` |
/// | `…` | `...` |
/// | no-break, thin and other fixed-width spaces | space |
/// | zero-width chars, BOM, soft hyphen, word joiner, U+FFFD | removed |
pub fn sanitize(input: &str) -> String {
    if input.is_ascii() {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{25CF}' | '\u{25E6}' | '\u{25AA}' | '\u{2023}' | '\u{2043}'
            | '\u{F0B7}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                out.push(' ')
            }
            '\u{200B}' | '\u{FEFF}' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
            | '\u{FFFD}' => {}
            other => out.push(other),
        }
    }
    out
}

/// Decode backend output, replacing invalid UTF-8 rather than failing.
///
/// Replacement characters are removed later by [`sanitize`].
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Join per-page texts into one document.
///
/// Pages are separated by a newline; line endings are normalised, trailing
/// whitespace is trimmed per line, and runs of blank lines are capped.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let joined = pages
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    let s = normalise_line_endings(&joined);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Make the selected text safe for the requested output encoding.
///
/// `Utf8` re-applies [`sanitize`]. `Ascii` additionally strips anything
/// still outside 7-bit ASCII and tidies the gaps that leaves behind.
pub fn finalize(text: &str, encoding: OutputEncoding) -> String {
    let s = sanitize(text);
    match encoding {
        OutputEncoding::Utf8 => s,
        OutputEncoding::Ascii if s.is_ascii() => s,
        OutputEncoding::Ascii => {
            let stripped: String = s.chars().filter(char::is_ascii).collect();
            let s = RE_SPACE_RUNS.replace_all(&stripped, " ");
            let s = RE_BLANK_RUNS.replace_all(&s, "\n\n");
            s.into_owned()
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> Cow<'_, str> {
    if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").into_owned()
}

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_ascii_is_identity() {
        let input = "Jane Doe\r\n  Rust  engineer\t\n\n\n\n\nEnd   ";
        assert_eq!(sanitize(input), input);
        assert_eq!(finalize(input, OutputEncoding::Utf8), input);
        assert_eq!(finalize(input, OutputEncoding::Ascii), input);
    }

    #[test]
    fn test_sanitize_quotes_and_dashes() {
        assert_eq!(
            sanitize("\u{201C}Lead\u{201D} \u{2018}dev\u{2019} 2019\u{2013}2023 \u{2014} now"),
            "\"Lead\" 'dev' 2019-2023 - now"
        );
    }

    #[test]
    fn test_sanitize_bullets_and_ellipsis() {
        assert_eq!(
            sanitize("\u{2022} Rust\n\u{F0B7} Go\n\u{25CF} more\u{2026}"),
            "* Rust\n* Go\n* more..."
        );
    }

    #[test]
    fn test_sanitize_spaces_and_invisibles() {
        assert_eq!(
            sanitize("a\u{00A0}b\u{2009}c\u{200B}d\u{FEFF}e\u{00AD}f\u{FFFD}g"),
            "a b cdefg"
        );
    }

    #[test]
    fn test_sanitize_keeps_other_unicode() {
        assert_eq!(sanitize("José Müller — 東京"), "José Müller - 東京");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let once = sanitize("\u{201C}x\u{201D} \u{2022} y\u{2026}");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_decode_lossy_then_sanitize() {
        let bytes = b"Skills: Rust\xFF\xFE, Go";
        assert_eq!(sanitize(&decode_lossy(bytes)), "Skills: Rust, Go");
    }

    #[test]
    fn test_join_pages() {
        let pages = ["Page one  \r\nline two\r\n", "\n\n\n\n\n\nPage two\t"];
        assert_eq!(join_pages(&pages), "Page one\nline two\n\n\nPage two");
    }

    #[test]
    fn test_join_pages_empty() {
        let pages: [&str; 2] = ["", "  \n "];
        assert_eq!(join_pages(&pages), "");
    }

    #[test]
    fn test_finalize_ascii_strips_and_collapses() {
        let out = finalize("Jos\u{00E9}  \u{6771} Doe\n\u{4EAC}\n\n\nnext", OutputEncoding::Ascii);
        assert_eq!(out, "Jos Doe\n\nnext");
        assert!(out.is_ascii());
    }

    #[test]
    fn test_finalize_utf8_keeps_accents() {
        assert_eq!(
            finalize("Jos\u{00E9} \u{2013} dev", OutputEncoding::Utf8),
            "Jos\u{00E9} - dev"
        );
    }
}
