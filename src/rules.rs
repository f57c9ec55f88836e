//! Rule selection: explicit lists or a random draw of playable rules.

use std::fmt;
use std::str::FromStr;

use rand::seq::index;
use rand::Rng;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::Rule;

/// Rules worth playing: everything except the constant rules 0 and 255.
pub const PLAYABLE_RULES: std::ops::RangeInclusive<u8> = 1..=254;

/// Either an explicit rule list or a number of rules to draw at random.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleSelection {
    Count(usize),
    List(Vec<Rule>),
}

impl Default for RuleSelection {
    fn default() -> Self {
        RuleSelection::List(vec![Rule::new(30)])
    }
}

impl RuleSelection {
    /// Concrete rules; random counts are drawn from `rng`.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Rule>> {
        match self {
            RuleSelection::Count(n) => choose_rules(*n, rng),
            RuleSelection::List(rules) => Ok(rules.clone()),
        }
    }
}

/// `"5"` draws five rules; `"[30]"`, `"30,45"` or `"[30, 45]"` list them.
impl FromStr for RuleSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRules(s.to_string());
        let trimmed = s.trim();
        if !trimmed.starts_with('[') && !trimmed.contains(',') {
            return trimmed
                .parse::<usize>()
                .map(RuleSelection::Count)
                .map_err(|_| invalid());
        }
        let inner = match (trimmed.strip_prefix('['), trimmed.strip_suffix(']')) {
            (Some(_), Some(_)) => &trimmed[1..trimmed.len() - 1],
            (None, None) => trimmed,
            _ => return Err(invalid()),
        };
        if inner.trim().is_empty() {
            return Ok(RuleSelection::List(Vec::new()));
        }
        inner
            .split(',')
            .map(|r| r.trim().parse::<u8>().map(Rule::new).map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()
            .map(RuleSelection::List)
    }
}

impl fmt::Display for RuleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSelection::Count(n) => write!(f, "{n}"),
            RuleSelection::List(rules) => write!(f, "{}", format_rules(rules)),
        }
    }
}

/// `[30, 45]`
pub fn format_rules(rules: &[Rule]) -> String {
    let parts: Vec<String> = rules.iter().map(Rule::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Draw `count` distinct playable rules.
pub fn choose_rules<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<Vec<Rule>> {
    let pool = PLAYABLE_RULES.count();
    if count > pool {
        return Err(Error::TooManyRules(count));
    }
    Ok(index::sample(rng, pool, count)
        .into_iter()
        .map(|i| Rule::new(*PLAYABLE_RULES.start() + i as u8))
        .collect())
}
