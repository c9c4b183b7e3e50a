//! Query matching for type-ahead filtering.
//!
//! A [`Matcher`] decides whether a candidate display string matches the text
//! currently typed into the widget. The comparison policy is an injected
//! [`TextFold`] strategy rather than ambient locale state, which keeps
//! matching deterministic and testable.
//!
//! The default [`UnicodeFolder`] performs Unicode full case folding plus
//! canonical (NFD) decomposition with combining marks removed, so `"cafe"`
//! matches `"Café"`. This deviates deliberately from per-locale collation:
//! folding is locale-independent and does not apply language tailorings such
//! as the Turkish dotted/dotless I. Hosts that need a different policy can
//! supply their own strategy (see [`AsciiCaseFolder`] for the simpler
//! case-insensitive-only variant).

use std::sync::Arc;

use icu::casemap::CaseMapper;
use icu::casemap::CaseMapperBorrowed;
use icu::normalizer::{DecomposingNormalizer, DecomposingNormalizerBorrowed};
use icu::properties::props::GeneralCategory;
use icu::properties::{CodePointMapData, CodePointMapDataBorrowed};

/// Strategy for folding text into a comparison form.
///
/// Two strings are considered equivalent when their folded forms are equal;
/// containment is likewise tested on folded forms.
pub trait TextFold: Send + Sync {
    /// Folds `text` into its canonical comparison form.
    fn fold(&self, text: &str) -> String;
}

/// Case- and accent-insensitive folding backed by ICU data.
///
/// Applies canonical decomposition, strips nonspacing marks, then applies
/// Unicode full case folding (so `ß` folds to `ss`).
pub struct UnicodeFolder {
    case_mapper: CaseMapperBorrowed<'static>,
    nfd: DecomposingNormalizerBorrowed<'static>,
    categories: CodePointMapDataBorrowed<'static, GeneralCategory>,
}

impl UnicodeFolder {
    /// Creates a folder using the compiled ICU data.
    pub fn new() -> Self {
        Self {
            case_mapper: CaseMapper::new(),
            nfd: DecomposingNormalizer::new_nfd(),
            categories: CodePointMapData::<GeneralCategory>::new(),
        }
    }
}

impl Default for UnicodeFolder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFold for UnicodeFolder {
    fn fold(&self, text: &str) -> String {
        let decomposed = self.nfd.normalize(text);
        let stripped: String = decomposed
            .chars()
            .filter(|&c| self.categories.get(c) != GeneralCategory::NonspacingMark)
            .collect();
        self.case_mapper.fold_string(&stripped).into_owned()
    }
}

/// ASCII case-insensitive folding with no accent handling.
///
/// The simpler comparison policy for hosts that do not want Unicode folding;
/// `"cafe"` will not match `"café"` under this strategy.
pub struct AsciiCaseFolder;

impl TextFold for AsciiCaseFolder {
    fn fold(&self, text: &str) -> String {
        text.to_ascii_lowercase()
    }
}

/// Substring matcher over folded text.
///
/// # Example
///
/// ```
/// use typeahead::Matcher;
///
/// let matcher = Matcher::new();
/// assert!(matcher.matches("cafe", Some("Le Café Bleu")));
/// assert!(matcher.matches("", None)); // empty query matches everything
/// assert!(!matcher.matches("cafe", None));
/// ```
#[derive(Clone)]
pub struct Matcher {
    folder: Arc<dyn TextFold>,
}

impl Matcher {
    /// Creates a matcher with the default [`UnicodeFolder`] policy.
    pub fn new() -> Self {
        Self {
            folder: Arc::new(UnicodeFolder::new()),
        }
    }

    /// Creates a matcher with a custom folding strategy.
    pub fn with_folder(folder: Arc<dyn TextFold>) -> Self {
        Self { folder }
    }

    /// Tests whether `candidate` matches `query`.
    ///
    /// - An empty query matches every candidate, including an absent one;
    ///   this is what restores the unfiltered view when text is cleared.
    /// - An absent candidate never matches a non-empty query.
    /// - Otherwise the match is substring containment on folded forms.
    pub fn matches(&self, query: &str, candidate: Option<&str>) -> bool {
        if query.is_empty() {
            return true;
        }
        let Some(candidate) = candidate else {
            return false;
        };
        self.folder
            .fold(candidate)
            .contains(&self.folder.fold(query))
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_matches_everything() {
        let matcher = Matcher::new();
        assert!(matcher.matches("", Some("anything")));
        assert!(matcher.matches("", Some("")));
        assert!(matcher.matches("", None));
    }

    #[test]
    fn test_absent_candidate_never_matches() {
        let matcher = Matcher::new();
        assert!(!matcher.matches("a", None));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let matcher = Matcher::new();
        assert!(matcher.matches("bob", Some("BOBBY")));
        assert!(matcher.matches("OB", Some("Bob")));
        assert!(!matcher.matches("bob", Some("alice")));
    }

    #[test]
    fn test_accent_insensitive() {
        let matcher = Matcher::new();
        assert!(matcher.matches("cafe", Some("café")));
        assert!(matcher.matches("café", Some("cafe")));
        assert!(matcher.matches("uber", Some("Über uns")));
    }

    #[test]
    fn test_full_case_folding() {
        let matcher = Matcher::new();
        assert!(matcher.matches("strasse", Some("Hauptstraße")));
    }

    #[test]
    fn test_ascii_folder_keeps_accents_distinct() {
        let matcher = Matcher::with_folder(Arc::new(AsciiCaseFolder));
        assert!(matcher.matches("CAFE", Some("cafe")));
        assert!(!matcher.matches("cafe", Some("café")));
    }
}
