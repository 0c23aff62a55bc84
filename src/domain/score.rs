use std::fmt;

use rand::Rng;
use serde::Serialize;

const BASE_SCORE: i64 = 50;
const INDUSTRY_BONUS: i64 = 20;
const HEADCOUNT_BONUS: i64 = 15;
const DOMAIN_KEYWORD_BONUS: i64 = 10;
const TARGET_THRESHOLD: u8 = 70;

pub const TARGET_INDUSTRIES: [&str; 4] = ["Software", "Technology", "IT", "Internet"];
pub const TARGET_DOMAIN_KEYWORDS: [&str; 6] =
    ["tech", "software", "digital", "data", "ai", "cloud"];

/// Match score, always within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchScore(u8);

impl MatchScore {
    pub fn new(value: i64) -> Self {
        MatchScore(value.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoringSignals {
    pub industry: Option<String>,
    pub employees: Option<u64>,
    pub domain: Option<String>,
}

pub fn compute_score(signals: &ScoringSignals) -> MatchScore {
    let mut score = BASE_SCORE;

    if let Some(industry) = signals.industry.as_deref() {
        if TARGET_INDUSTRIES.contains(&industry) {
            score += INDUSTRY_BONUS;
        }
    }

    if let Some(employees) = signals.employees {
        if employees > 50 && employees < 1000 {
            score += HEADCOUNT_BONUS;
        }
    }

    if let Some(domain) = signals.domain.as_deref() {
        if TARGET_DOMAIN_KEYWORDS
            .iter()
            .any(|&keyword| domain.contains(keyword))
        {
            score += DOMAIN_KEYWORD_BONUS;
        }
    }

    MatchScore::new(score.min(100))
}

pub fn classify(score: MatchScore) -> bool {
    score.value() >= TARGET_THRESHOLD
}

/// Score used when no external data is available at all.
pub fn synthetic_score<R: Rng + ?Sized>(rng: &mut R) -> MatchScore {
    MatchScore::new(rng.gen_range(40..=100))
}
