//! Persian text normalization.
//!
//! [`normalize`] runs four stages in a fixed order: compatibility-form
//! expansion, mark and punctuation stripping, affix spacing, digit
//! translation. Each stage expects the output shape of the one before it.

use lazy_static::lazy_static;
use regex::Regex;

const PUNC_AFTER: &str = ".:!،؛؟»])}";
const PUNC_BEFORE: &str = "«[({";

/// Compatibility forms and lookalike letters, applied top to bottom.
const COMPATIBILITY_FORMS: &[(&str, &str)] = &[
    ("﷽", "بسم الله الرحمن الرحیم"),
    ("﷼", "ریال"),
    ("ﷰ", "صلی"),
    ("ﷹ", "صلی"),
    ("ﷲ", "الله"),
    ("ﷳ", "اکبر"),
    ("ﷴ", "محمد"),
    ("ﷵ", "صلعم"),
    ("ﷶ", "رسول"),
    ("ﷷ", "علیه"),
    ("ﷸ", "وسلم"),
    ("ﻵ", "لا"),
    ("ﻶ", "لا"),
    ("ﻷ", "لا"),
    ("ﻸ", "لا"),
    ("ﻹ", "لا"),
    ("ﻺ", "لا"),
    ("ﻻ", "لا"),
    ("ﻼ", "لا"),
    ("آ", "ا"),
    ("ك", "ک"),
    ("ي", "ی"),
];

/// Tanvin, short vowels, shadda and sukun.
const DIACRITICS: &[char] = &[
    '\u{064b}', '\u{064c}', '\u{064d}', '\u{064e}', '\u{064f}', '\u{0650}', '\u{0651}', '\u{0652}',
];

const STRIPPED_PUNCTUATION: &[char] = &[
    '(', ')', '<', '>', '؛', '،', '.', '»', '«', '}', '{', '؟', '!', ':', '"', '+', '=', '/', '|',
    '%', '*', '\'', '-',
];

const LATIN_DIGITS: &str = "0123456789%٠١٢٣٤٥٦٧٨٩";
const PERSIAN_DIGITS: &str = "۰۱۲۳۴۵۶۷۸۹٪۰۱۲۳۴۵۶۷۸۹";

/// Context check standing in for lookaround: receives the text before and
/// after a candidate match.
type Guard = fn(before: &str, after: &str) -> bool;

/// One ordered substitution of the affix-spacing stage.
pub struct SpacingRule {
    pattern: Regex,
    replacement: &'static str,
    guard: Option<Guard>,
}

impl SpacingRule {
    fn new(pattern: &str, replacement: &'static str, guard: Option<Guard>) -> Self {
        Self { pattern: Regex::new(pattern).expect("valid regex"), replacement, guard }
    }

    /// Replace every non-overlapping match whose context passes the guard.
    ///
    /// A rejected match only consumes its first character, so a valid match
    /// starting inside it is still found.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 8);
        let mut last = 0;
        let mut start = 0;
        while let Some(caps) = self.pattern.captures_at(text, start) {
            let Some(m) = caps.get(0) else { break };
            if let Some(guard) = self.guard {
                if !guard(&text[..m.start()], &text[m.end()..]) {
                    match text[m.start()..].chars().next() {
                        Some(c) => start = m.start() + c.len_utf8(),
                        None => break,
                    }
                    continue;
                }
            }
            out.push_str(&text[last..m.start()]);
            caps.expand(self.replacement, &mut out);
            last = m.end();
            start = m.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

lazy_static! {
    static ref DECIMAL_DIGIT: Regex = Regex::new(r"^\d$").expect("valid regex");

    /// Affix spacing rules. Later rules rely on joins made by earlier ones.
    pub static ref AFFIX_RULES: Vec<SpacingRule> = vec![
        SpacingRule::new(r"([^ ]ه) ی ", "${1}\u{200c}ی ", None),
        SpacingRule::new(r"(^| )(ن?می) ", "${1}${2}\u{200c}", None),
        // U+200C (zero-width non-joiner) binds the affix to its host.
        // Alternatives are longest-first: a shorter suffix at the same position would be followed by a letter.
        SpacingRule::new(r" (ترین|تری|تر|گری|گر|های|ها)", "\u{200c}${1}", Some(comparative_or_plural_guard)),
        SpacingRule::new(r"([^ ]ه) (ا(?:م|یم|ش|ند|ید|ی|ت))", "${1}\u{200c}${2}", Some(pronoun_guard)),
        SpacingRule::new(r"(ه)(ها)", "${1}\u{200c}${2}", None),
    ];
}

fn is_punctuation(c: char) -> bool {
    PUNC_AFTER.contains(c) || PUNC_BEFORE.contains(c)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

fn is_host_letter(c: char) -> bool {
    !(c == '\n' || c == ' ' || is_decimal_digit(c) || is_punctuation(c))
}

fn comparative_or_plural_guard(before: &str, after: &str) -> bool {
    let mut prev = before.chars().rev();
    let host = |c: Option<char>| c.is_some_and(is_host_letter);
    host(prev.next())
        && host(prev.next())
        && after.chars().next().map_or(true, |c| c == ' ' || c == '\n' || is_punctuation(c))
}

fn pronoun_guard(_before: &str, after: &str) -> bool {
    after
        .chars()
        .next()
        .map_or(true, |c| c == ' ' || c == '\n' || PUNC_AFTER.contains(c))
}

/// Expand presentation forms and fold lookalike letters.
pub fn replace_compatibility_forms(text: &str) -> String {
    COMPATIBILITY_FORMS
        .iter()
        .fold(text.to_string(), |acc, &(from, to)| if acc.contains(from) { acc.replace(from, to) } else { acc })
}

/// Drop diacritics and punctuation. Whitespace survives so words stay apart.
pub fn strip_marks(text: &str) -> String {
    text.chars()
        .filter(|c| !DIACRITICS.contains(c) && !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}

/// Bind bound morphemes to their host with a zero-width non-joiner.
pub fn correct_spacing(text: &str) -> String {
    AFFIX_RULES.iter().fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Map ASCII and Arabic-Indic digits (and `%`) to Persian script.
pub fn translate_digits(text: &str) -> String {
    text.chars()
        .map(|c| match LATIN_DIGITS.chars().position(|d| d == c) {
            Some(i) => PERSIAN_DIGITS.chars().nth(i).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Canonicalize raw text. Pure and total.
pub fn normalize(text: &str) -> String {
    let text = replace_compatibility_forms(text);
    let text = strip_marks(&text);
    let text = correct_spacing(&text);
    translate_digits(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_lookalike_letters() {
        assert_eq!(replace_compatibility_forms("كتاب آبي"), "کتاب ابی");
        assert_eq!(replace_compatibility_forms("ﷲ"), "الله");
        assert_eq!(replace_compatibility_forms("ﻻ"), "لا");
    }

    #[test]
    fn strips_diacritics_and_punctuation() {
        assert_eq!(strip_marks("کِتاب، خوب!"), "کتاب خوب");
        assert_eq!(strip_marks("مُحَمَّد"), "محمد");
    }

    #[test]
    fn joins_plural_suffix() {
        assert_eq!(correct_spacing("کتاب ها خوب"), "کتاب\u{200c}ها خوب");
        assert_eq!(correct_spacing("بزرگ ترین"), "بزرگ\u{200c}ترین");
    }

    #[test]
    fn plural_suffix_needs_two_letter_host() {
        assert_eq!(correct_spacing("۱۲ ها"), "۱۲ ها");
        assert_eq!(correct_spacing("کتاب هاشان"), "کتاب هاشان");
    }

    #[test]
    fn only_decimal_digits_block_a_plural_host() {
        assert_eq!(correct_spacing("x² ها"), "x²\u{200c}ها");
        assert_eq!(correct_spacing("12 ها"), "12 ها");
    }

    #[test]
    fn joins_continuous_prefix() {
        assert_eq!(correct_spacing("من می روم"), "من می\u{200c}روم");
        assert_eq!(correct_spacing("نمی دانم"), "نمی\u{200c}دانم");
    }

    #[test]
    fn joins_pronoun_suffix_after_silent_h() {
        assert_eq!(correct_spacing("خانه ام"), "خانه\u{200c}ام");
        assert_eq!(correct_spacing("خسته اید."), "خسته\u{200c}اید.");
        assert_eq!(correct_spacing("خانه امروز"), "خانه امروز");
    }

    #[test]
    fn rejected_pronoun_match_does_not_hide_the_next_one() {
        // "مه اید" fails its boundary check; "ده اش" starts inside it.
        assert_eq!(correct_spacing("برنامه ایده اش"), "برنامه ایده\u{200c}اش");
        assert_eq!(correct_spacing("خانه ایده"), "خانه ایده");
    }

    #[test]
    fn separates_he_from_plural() {
        assert_eq!(correct_spacing("شنبهها"), "شنبه\u{200c}ها");
    }

    #[test]
    fn translates_digits_forward_only() {
        assert_eq!(translate_digits("12% ٣"), "۱۲٪ ۳");
        assert_eq!(translate_digits("۱۲"), "۱۲");
    }

    #[test]
    fn normalize_runs_all_stages() {
        assert_eq!(normalize("كتاب ها 12"), "کتاب\u{200c}ها ۱۲");
        assert_eq!(normalize(""), "");
    }
}
