use serde::{Deserialize, Serialize};

/// Byte-offset span into the source the declaration tree was parsed from.
///
/// The checker never reads source text; spans are carried through so the
/// diagnostic renderer can point at the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub file_id: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end, file_id: 0 }
    }

    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    /// `self` unless it is a dummy, in which case `fallback`.
    pub fn or(self, fallback: Span) -> Span {
        if self.is_dummy() { fallback } else { self }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A value annotated with the span of the syntax it came from.
///
/// Deserializes from either `{"node": .., "span": ..}` or the bare node, in
/// which case the span is a dummy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SpannedRepr<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpannedRepr<T> {
    Full {
        node: T,
        #[serde(default)]
        span: Span,
    },
    Bare(T),
}

impl<T> From<SpannedRepr<T>> for Spanned<T> {
    fn from(repr: SpannedRepr<T>) -> Self {
        match repr {
            SpannedRepr::Full { node, span } => Spanned { node, span },
            SpannedRepr::Bare(node) => Spanned::dummy(node),
        }
    }
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self { node, span: Span::dummy() }
    }
}
