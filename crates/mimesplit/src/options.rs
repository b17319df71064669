//! Parser configuration types.

/// Default limit on the number of parts in one body.
pub const DEFAULT_MAX_PARTS: usize = 1024;

/// How the parser treats malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseMode {
    /// Recover where possible and return a best-effort result.
    #[default]
    Lenient,
    /// Reject any deviation from the multipart grammar.
    Strict,
}

/// Multipart parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Malformed input handling.
    pub mode: ParseMode,
    /// Maximum number of parts accepted from one body.
    pub max_parts: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lenient,
            max_parts: DEFAULT_MAX_PARTS,
        }
    }
}

impl ParseOptions {
    /// Creates lenient options with the default part limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates strict options with the default part limit.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            mode: ParseMode::Strict,
            ..Self::default()
        }
    }

    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }

    /// Returns true in strict mode.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        matches!(self.mode, ParseMode::Strict)
    }
}

/// Builder for [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    mode: ParseMode,
    max_parts: Option<usize>,
}

impl ParseOptionsBuilder {
    /// Creates a new builder with lenient defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parse mode.
    #[must_use]
    pub const fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the maximum number of parts.
    #[must_use]
    pub const fn max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = Some(max_parts);
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> ParseOptions {
        ParseOptions {
            mode: self.mode,
            max_parts: self.max_parts.unwrap_or(DEFAULT_MAX_PARTS),
        }
    }
}
