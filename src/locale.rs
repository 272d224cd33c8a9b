//! Locale services: direction detection, locale negotiation,
//! and CLDR plural category lookup.
//!
//! A full implementation delegates these to a platform CLDR provider. This
//! module is the built-in stand-in: a small table for the languages most
//! commonly exercised, with `other` as the safe universal fallback. Hosts
//! that need full CLDR coverage register their own [`crate::registry::MessageFunction`]s
//! or swap this module's tables; the public surface (`direction_for`,
//! `negotiate`, `plural_category`) is the seam to do so.

use crate::value::Direction;

/// RTL primary language subtags.
const RTL_LANGUAGES: &[&str] = &["ar", "fa", "he", "ps", "sd", "ug", "ur", "yi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleDirection {
    Ltr,
    Rtl,
    Auto,
}

/// Extract the primary language subtag from a BCP-47 tag (`en-US` → `en`).
fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Direction for a single language tag. Unknown tags default to `ltr`.
pub fn direction_for(tag: &str) -> LocaleDirection {
    let lang = primary_subtag(tag).to_ascii_lowercase();
    if RTL_LANGUAGES.contains(&lang.as_str()) {
        LocaleDirection::Rtl
    } else {
        LocaleDirection::Ltr
    }
}

/// The first strong (non-neutral) directional character's bidi class, per
/// the UBA's P2/P3 rules: an RTL-script codepoint makes the run `rtl`, an
/// LTR-script codepoint makes it `ltr`, and a run with no strong character
/// at all (digits, punctuation, empty) stays `auto`.
pub fn first_strong_direction(s: &str) -> Direction {
    for c in s.chars() {
        if is_strong_rtl(c) {
            return Direction::Rtl;
        }
        if is_strong_ltr(c) {
            return Direction::Ltr;
        }
    }
    Direction::Auto
}

fn is_strong_rtl(c: char) -> bool {
    matches!(c as u32,
        0x0590..=0x05FF   // Hebrew
        | 0x0600..=0x06FF // Arabic
        | 0x0700..=0x074F // Syriac
        | 0x0750..=0x077F // Arabic Supplement
        | 0x0780..=0x07BF // Thaana
        | 0x08A0..=0x08FF // Arabic Extended-A
        | 0xFB1D..=0xFDFF // Hebrew/Arabic presentation forms
        | 0xFE70..=0xFEFF
    )
}

fn is_strong_ltr(c: char) -> bool {
    c.is_alphabetic() && !is_strong_rtl(c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleMatcher {
    BestFit,
    Lookup,
}

impl Default for LocaleMatcher {
    fn default() -> Self {
        LocaleMatcher::BestFit
    }
}

/// Locale tags this module has explicit plural-rule data for (the match
/// arms of [`plural_category`]), used as the "available" set a
/// [`MessageFormat`][crate::MessageFormat] negotiates its requested
/// locales against — everything else still works through `other`, but
/// negotiation prefers a tag we have real rules for.
pub const KNOWN_LOCALES: &[&str] = &[
    "en", "de", "nl", "sv", "da", "no", "nb", "nn", "es", "it", "pt", "fi", "el", "hu", "tr", "fr", "ar", "ru", "uk",
    "be", "sr", "hr", "bs", "pl", "cs", "sk", "ja", "ko", "zh", "vi", "th", "id", "ms",
];

/// Negotiate the caller's requested locale list against the platform's
/// available locales, returning the first usable match (or the first
/// requested locale if nothing matches — callers still need *some*
/// answer for direction/plural lookups).
pub fn negotiate(requested: &[String], available: &[String], matcher: LocaleMatcher) -> String {
    if requested.is_empty() {
        return available.first().cloned().unwrap_or_else(|| "en".to_string());
    }
    match matcher {
        LocaleMatcher::Lookup => {
            for tag in requested {
                if available.iter().any(|a| a.eq_ignore_ascii_case(tag)) {
                    return tag.clone();
                }
                // Lookup falls back through truncated subtags (en-US -> en).
                let primary = primary_subtag(tag);
                if available.iter().any(|a| primary_subtag(a).eq_ignore_ascii_case(primary)) {
                    return primary.to_string();
                }
            }
            requested[0].clone()
        }
        LocaleMatcher::BestFit => {
            // Best-fit: prefer an exact match, else a shared primary
            // subtag, else just use what the caller asked for — a real
            // best-fit matcher additionally scores script/region distance,
            // which a platform CLDR provider would supply.
            for tag in requested {
                if available.iter().any(|a| a.eq_ignore_ascii_case(tag)) {
                    return tag.clone();
                }
            }
            for tag in requested {
                let primary = primary_subtag(tag);
                if let Some(found) = available.iter().find(|a| primary_subtag(a).eq_ignore_ascii_case(primary)) {
                    return found.clone();
                }
            }
            requested[0].clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

/// CLDR cardinal plural category for `value` under `locale`'s pluralization
/// rules. Covers English-family (one/other), and the handful of rule
/// shapes (Slavic few/many, Arabic zero/two) exercised by the built-in
/// `:number`/`:integer` selectors; anything else safely degrades to
/// `other`, which is always a legal category for every locale.
pub fn plural_category(value: f64, locale: &str) -> PluralCategory {
    let lang = primary_subtag(locale).to_ascii_lowercase();
    let n = value.abs();
    let is_integer = n.fract() == 0.0;
    let i = n.trunc() as i64;

    match lang.as_str() {
        "ar" => arabic_plural(n, is_integer, i),
        "ru" | "uk" | "be" | "sr" | "hr" | "bs" => slavic_plural(n, is_integer, i),
        "pl" => polish_plural(is_integer, i),
        "cs" | "sk" => czech_plural(n, is_integer, i),
        "ja" | "ko" | "zh" | "vi" | "th" | "id" | "ms" => PluralCategory::Other,
        "en" | "de" | "nl" | "sv" | "da" | "no" | "nb" | "nn" | "es" | "it" | "pt" | "fi" | "el" | "hu" | "tr" => {
            english_family_plural(n, is_integer, i)
        }
        "fr" | "pt-br" => french_plural(n),
        _ => english_family_plural(n, is_integer, i),
    }
}

fn english_family_plural(n: f64, is_integer: bool, i: i64) -> PluralCategory {
    if is_integer && i == 1 {
        PluralCategory::One
    } else {
        let _ = n;
        PluralCategory::Other
    }
}

fn french_plural(n: f64) -> PluralCategory {
    if n >= 0.0 && n < 2.0 {
        PluralCategory::One
    } else {
        PluralCategory::Other
    }
}

fn polish_plural(is_integer: bool, i: i64) -> PluralCategory {
    if !is_integer {
        return PluralCategory::Other;
    }
    let i10 = i % 10;
    let i100 = i % 100;
    if i == 1 {
        PluralCategory::One
    } else if (2..=4).contains(&i10) && !(12..=14).contains(&i100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn czech_plural(n: f64, is_integer: bool, i: i64) -> PluralCategory {
    if is_integer && i == 1 {
        PluralCategory::One
    } else if is_integer && (2..=4).contains(&i) {
        PluralCategory::Few
    } else if !is_integer {
        PluralCategory::Many
    } else {
        let _ = n;
        PluralCategory::Other
    }
}

fn slavic_plural(n: f64, is_integer: bool, i: i64) -> PluralCategory {
    if !is_integer {
        return PluralCategory::Other;
    }
    let i10 = i % 10;
    let i100 = i % 100;
    if i10 == 1 && i100 != 11 {
        PluralCategory::One
    } else if (2..=4).contains(&i10) && !(12..=14).contains(&i100) {
        PluralCategory::Few
    } else if i10 == 0 || (5..=9).contains(&i10) || (11..=14).contains(&i100) {
        PluralCategory::Many
    } else {
        let _ = n;
        PluralCategory::Other
    }
}

fn arabic_plural(n: f64, is_integer: bool, i: i64) -> PluralCategory {
    if n == 0.0 {
        PluralCategory::Zero
    } else if is_integer && i == 1 {
        PluralCategory::One
    } else if is_integer && i == 2 {
        PluralCategory::Two
    } else if is_integer && (i % 100) >= 3 && (i % 100) <= 10 {
        PluralCategory::Few
    } else if is_integer && (i % 100) >= 11 && (i % 100) <= 99 {
        PluralCategory::Many
    } else {
        PluralCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtl_languages_are_detected() {
        assert_eq!(direction_for("ar"), LocaleDirection::Rtl);
        assert_eq!(direction_for("he-IL"), LocaleDirection::Rtl);
        assert_eq!(direction_for("fa"), LocaleDirection::Rtl);
    }

    #[test]
    fn unknown_language_defaults_ltr() {
        assert_eq!(direction_for("en"), LocaleDirection::Ltr);
        assert_eq!(direction_for("xx-ZZ"), LocaleDirection::Ltr);
    }

    #[test]
    fn english_plural_one_vs_other() {
        assert_eq!(plural_category(1.0, "en"), PluralCategory::One);
        assert_eq!(plural_category(0.0, "en"), PluralCategory::Other);
        assert_eq!(plural_category(5.0, "en"), PluralCategory::Other);
    }

    #[test]
    fn polish_few_vs_many() {
        assert_eq!(plural_category(2.0, "pl"), PluralCategory::Few);
        assert_eq!(plural_category(5.0, "pl"), PluralCategory::Many);
        assert_eq!(plural_category(1.0, "pl"), PluralCategory::One);
    }

    #[test]
    fn negotiate_lookup_falls_back_to_primary_subtag() {
        let available = vec!["en".to_string(), "fr".to_string()];
        let requested = vec!["en-US".to_string()];
        assert_eq!(negotiate(&requested, &available, LocaleMatcher::Lookup), "en");
    }

    #[test]
    fn first_strong_direction_detects_arabic() {
        assert_eq!(first_strong_direction("\u{0623}\u{062d}\u{0645}\u{062f}"), Direction::Rtl);
    }

    #[test]
    fn first_strong_direction_detects_latin() {
        assert_eq!(first_strong_direction("World"), Direction::Ltr);
    }

    #[test]
    fn first_strong_direction_is_auto_for_digits_only() {
        assert_eq!(first_strong_direction("123"), Direction::Auto);
    }

    #[test]
    fn negotiate_prefers_exact_match() {
        let available = vec!["en-US".to_string(), "en".to_string()];
        let requested = vec!["en-US".to_string()];
        assert_eq!(negotiate(&requested, &available, LocaleMatcher::BestFit), "en-US");
    }
}
