//! Tab residency
//!
//! ```text
//! Live ──evict / remove──▶ Dehydrated
//!   ▲                          │
//!   └──────── select ──────────┘
//! ```
//! A live tab owns a web view. A dehydrated tab keeps only its session
//! snapshot, cached title and screenshot key.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Live,
    Dehydrated,
}

impl TabState {
    pub fn is_live(&self) -> bool {
        matches!(self, TabState::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Live => "live",
            TabState::Dehydrated => "dehydrated",
        }
    }
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
