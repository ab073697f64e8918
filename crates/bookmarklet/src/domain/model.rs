//! Domain models for marked regions and compiled bookmarklets.

/// URI scheme every compiled bookmarklet starts with.
pub const SCHEME: &str = "javascript:";

pub const DEFAULT_START_MARKER: &str = "(() => { // start bookmarklet";
pub const DEFAULT_END_MARKER: &str = "// end bookmarklet";

/// Literal delimiters around the region that gets compiled.
///
/// The start marker is part of the region, the end marker is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Markers {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(DEFAULT_START_MARKER, DEFAULT_END_MARKER)
    }
}

/// Minified code carrying the `javascript:` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmarklet(String);

impl Bookmarklet {
    pub fn from_minified(code: &str) -> Self {
        let mut uri = String::with_capacity(SCHEME.len() + code.len());
        uri.push_str(SCHEME);
        uri.push_str(code);
        Self(uri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The minified code without the scheme prefix.
    pub fn code(&self) -> &str {
        &self.0[SCHEME.len()..]
    }

    pub fn is_single_line(&self) -> bool {
        !self.0.contains('\n')
    }

    pub fn line_count(&self) -> usize {
        self.0.lines().count().max(1)
    }
}
