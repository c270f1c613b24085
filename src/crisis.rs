//! Crisis language detection in chat messages
//!
//! A heuristic safety net, not a clinical classifier. The rule families are
//! deliberately broad and overlap: a missed crisis signal costs more than an
//! unnecessary alert, so phrases like "ending my subscription" do match.

use std::fmt;
use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};

/// Rule families, in the same order as [`CRISIS_PATTERNS`]
const CATEGORIES: [CrisisCategory; 7] = [
    CrisisCategory::KillSelf,
    CrisisCategory::WishToDie,
    CrisisCategory::EndLife,
    CrisisCategory::SelfHarm,
    CrisisCategory::Hopelessness,
    CrisisCategory::BetterOffWithout,
    CrisisCategory::Planning,
];

/// Word-boundary anchored phrase families, matched case-insensitively
const CRISIS_PATTERNS: [&str; 7] = [
    r"\b(kill(ing)?\s*(my)?self|suicide|suicidal)\b",
    r"\b(want(ing)?\s*to\s*die|don['’]?t\s*want\s*to\s*live)\b",
    r"\b(end(ing)?\s*(my|it\s*all)|end\s*my\s*life)\b",
    r"\b(self[- ]?harm|cut(ting)?\s*(my)?self|hurt(ing)?\s*(my)?self)\b",
    r"\b(no\s*(point|reason)\s*(in\s*)?(living|life|going\s*on))\b",
    r"\b(better\s*off\s*(dead|without\s*me))\b",
    r"\b(plan(ning)?\s*to\s*(kill|hurt|end))\b",
];

static CRISIS_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSetBuilder::new(CRISIS_PATTERNS)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
});

/// Semantic cluster a crisis rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrisisCategory {
    /// "kill myself", "suicide", "suicidal"
    KillSelf,
    /// "want to die", "don't want to live"
    WishToDie,
    /// "end my life", "ending it all"
    EndLife,
    /// "self-harm", "cutting myself", "hurting myself"
    SelfHarm,
    /// "no point in living", "no reason going on"
    Hopelessness,
    /// "better off dead", "better off without me"
    BetterOffWithout,
    /// "planning to kill/hurt/end"
    Planning,
}

impl CrisisCategory {
    /// Stable identifier used in logs and CLI output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KillSelf => "kill_self",
            Self::WishToDie => "wish_to_die",
            Self::EndLife => "end_life",
            Self::SelfHarm => "self_harm",
            Self::Hopelessness => "hopelessness",
            Self::BetterOffWithout => "better_off_without",
            Self::Planning => "planning",
        }
    }
}

impl fmt::Display for CrisisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a message contains crisis-risk language
///
/// Total over all inputs: empty, emoji-only or very long text simply
/// returns `false` when no rule matches.
#[must_use]
pub fn scan(text: &str) -> bool {
    CRISIS_SET.is_match(text)
}

/// List the rule families that match a message, in rule order
#[must_use]
pub fn categories(text: &str) -> Vec<CrisisCategory> {
    CRISIS_SET
        .matches(text)
        .into_iter()
        .map(|idx| CATEGORIES[idx])
        .collect()
}
