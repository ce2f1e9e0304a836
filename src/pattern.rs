//! Combined app-id / title filters.
//!
//! Every `--app-id` (or `--title`) flag contributes one regex fragment.  The
//! fragments are joined with `|` into a single expression, so a window passes
//! a category if *any* fragment matches somewhere in the string.  No filters
//! at all means the empty regex, which matches everything.
//!
//! Fragments are raw regexes and are not grouped before joining: `ab|cd`
//! followed by `efg` compiles to `ab|cd|efg`.

use regex::Regex;

/// Error produced when the combined expression does not compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern {pattern:?}: {source}")]
pub struct PatternError {
    pattern: String,
    #[source]
    source: regex::Error,
}

/// A compiled OR-combination of filter fragments.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// `None` is the empty expression.
    regex: Option<Regex>,
}

impl Pattern {
    /// Join `fragments` with `|` and compile the result.
    pub fn combine<S: AsRef<str>>(fragments: &[S]) -> Result<Self, PatternError> {
        let pattern = fragments
            .iter()
            .map(|fragment| fragment.as_ref())
            .collect::<Vec<&str>>()
            .join("|");
        if pattern.is_empty() {
            return Ok(Self::any());
        }
        let regex = Regex::new(&pattern).map_err(|source| PatternError { pattern, source })?;
        Ok(Self { regex: Some(regex) })
    }

    /// A pattern that matches every string.
    pub fn any() -> Self {
        Self { regex: None }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.as_ref().map_or(true, |regex| regex.is_match(haystack))
    }

    /// The combined expression, as compiled.
    pub fn as_str(&self) -> &str {
        self.regex.as_ref().map_or("", Regex::as_str)
    }
}

/// App-id and title filters applied together.
///
/// A window must pass both categories (AND between categories, OR within
/// each one).
#[derive(Debug, Clone)]
pub struct WindowFilter {
    app_id: Pattern,
    title: Pattern,
}

impl WindowFilter {
    pub fn new(app_id: Pattern, title: Pattern) -> Self {
        Self { app_id, title }
    }

    /// Compile both categories from raw fragments.
    pub fn from_fragments<S: AsRef<str>>(
        app_ids: &[S],
        titles: &[S],
    ) -> Result<Self, PatternError> {
        Ok(Self::new(Pattern::combine(app_ids)?, Pattern::combine(titles)?))
    }

    pub fn matches(&self, app_id: &str, title: &str) -> bool {
        self.app_id.is_match(app_id) && self.title.is_match(title)
    }
}

impl Default for WindowFilter {
    fn default() -> Self {
        Self::new(Pattern::any(), Pattern::any())
    }
}
