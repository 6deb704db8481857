//! Structural stub generators.
//!
//! Each generator keeps the outer shape of a file and replaces bulk content
//! (function bodies, long lists, inline scripts) with an elision marker.

pub mod brace;
pub mod indent;
pub mod json;
pub mod markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    IndentBlock,
    BraceBlock,
    Json,
    Markup,
}

impl StubKind {
    /// `extension` is lowercased and includes the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".py" | ".pyw" => Some(StubKind::IndentBlock),
            ".js" | ".mjs" | ".cjs" | ".jsx" | ".ts" | ".tsx" => Some(StubKind::BraceBlock),
            ".json" => Some(StubKind::Json),
            ".html" | ".htm" => Some(StubKind::Markup),
            _ => None,
        }
    }

    pub fn apply(self, content: &str) -> String {
        match self {
            StubKind::IndentBlock => indent::stub(content),
            StubKind::BraceBlock => brace::stub(content),
            StubKind::Json => json::stub(content),
            StubKind::Markup => markup::stub(content),
        }
    }
}

/// Runs the stub generator registered for `extension`; other files pass through.
pub fn create_stubs(content: &str, extension: &str) -> String {
    match StubKind::from_extension(extension) {
        Some(kind) => kind.apply(content),
        None => content.to_string(),
    }
}
