//! Extraction configuration.

use mimesplit::ParseOptions;

/// Default limit on nested `multipart/*` levels.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Content extraction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Options used for every nested multipart part.
    pub parse: ParseOptions,
    /// Maximum nesting depth below the top-level message.
    pub max_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExtractOptions {
    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> ExtractOptionsBuilder {
        ExtractOptionsBuilder::default()
    }
}

/// Builder for [`ExtractOptions`].
#[derive(Debug, Clone, Default)]
pub struct ExtractOptionsBuilder {
    parse: ParseOptions,
    max_depth: Option<usize>,
}

impl ExtractOptionsBuilder {
    /// Sets the nested parse options.
    #[must_use]
    pub const fn parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> ExtractOptions {
        ExtractOptions {
            parse: self.parse,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}
