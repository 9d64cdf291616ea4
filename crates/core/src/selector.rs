//! Label selectors for filtered metric reads
//!
//! A [`Selector`] is a conjunction of [`Requirement`]s evaluated against
//! anything implementing [`Labeled`]. The store only sees the
//! [`LabelMatcher`] trait, so new requirement kinds are added here without
//! touching storage.
//!
//! The textual form follows Kubernetes label selectors:
//!
//! | syntax            | requirement                          |
//! |-------------------|--------------------------------------|
//! | `k=v`, `k==v`     | label `k` present and equal to `v`   |
//! | `k!=v`            | label `k` absent or not equal to `v` |
//! | `k in (a,b)`      | label `k` present with a listed value|
//! | `k notin (a,b)`   | label `k` absent or not listed       |
//! | `k`               | label `k` present, any value         |
//! | `!k`              | label `k` absent                     |

use std::collections::BTreeSet;
use std::fmt;

use agentmetrics_domain::{AdapterError, Labeled, Result};

/// Anything that can decide whether a label set is selected.
pub trait LabelMatcher: Send + Sync {
    /// `true` when the matcher places no constraint at all.
    fn is_empty(&self) -> bool;

    /// Whether `labels` is selected.
    fn matches(&self, labels: &dyn Labeled) -> bool;
}

/// One predicate over a single label key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// `key=value` or `key==value`
    Equals { key: String, value: String },
    /// `key!=value`; also true when the key is absent
    NotEquals { key: String, value: String },
    /// `key in (a,b)`
    In { key: String, values: BTreeSet<String> },
    /// `key notin (a,b)`; also true when the key is absent
    NotIn { key: String, values: BTreeSet<String> },
    /// `key`
    Exists { key: String },
    /// `!key`
    DoesNotExist { key: String },
}

impl Requirement {
    /// Shorthand for [`Requirement::Equals`].
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals { key: key.into(), value: value.into() }
    }

    /// Shorthand for [`Requirement::Exists`].
    pub fn exists(key: impl Into<String>) -> Self {
        Self::Exists { key: key.into() }
    }

    /// Label key the requirement constrains.
    pub fn key(&self) -> &str {
        match self {
            Self::Equals { key, .. }
            | Self::NotEquals { key, .. }
            | Self::In { key, .. }
            | Self::NotIn { key, .. }
            | Self::Exists { key }
            | Self::DoesNotExist { key } => key,
        }
    }

    /// Evaluate against one label set.
    pub fn matches(&self, labels: &dyn Labeled) -> bool {
        match self {
            Self::Equals { key, value } => labels.get(key) == Some(value.as_str()),
            Self::NotEquals { key, value } => labels.get(key) != Some(value.as_str()),
            Self::In { key, values } => labels.get(key).is_some_and(|v| values.contains(v)),
            Self::NotIn { key, values } => !labels.get(key).is_some_and(|v| values.contains(v)),
            Self::Exists { key } => labels.has(key),
            Self::DoesNotExist { key } => !labels.has(key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| values.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            Self::Equals { key, value } => write!(f, "{key}={value}"),
            Self::NotEquals { key, value } => write!(f, "{key}!={value}"),
            Self::In { key, values } => write!(f, "{key} in ({})", join(values)),
            Self::NotIn { key, values } => write!(f, "{key} notin ({})", join(values)),
            Self::Exists { key } => write!(f, "{key}"),
            Self::DoesNotExist { key } => write!(f, "!{key}"),
        }
    }
}

/// Conjunction of requirements. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// Selector with no requirements.
    pub fn everything() -> Self {
        Self::default()
    }

    /// One equality requirement per pair, like a plain label set.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            requirements: pairs.into_iter().map(|(k, v)| Requirement::equals(k, v)).collect(),
        }
    }

    /// Add one more requirement.
    #[must_use]
    pub fn with(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Parse the Kubernetes textual form. Blank input yields the empty
    /// selector.
    ///
    /// # Errors
    /// Returns `AdapterError::InvalidInput` describing the offending term.
    pub fn parse(input: &str) -> Result<Self> {
        let mut requirements = Vec::new();
        for term in split_terms(input)? {
            let term = term.trim();
            if term.is_empty() {
                if input.trim().is_empty() {
                    continue;
                }
                return Err(invalid(input, "empty requirement"));
            }
            requirements.push(parse_term(term)?);
        }
        Ok(Self { requirements })
    }
}

impl LabelMatcher for Selector {
    fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    fn matches(&self, labels: &dyn Labeled) -> bool {
        self.requirements.iter().all(|requirement| requirement.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(","))
    }
}

impl std::str::FromStr for Selector {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn invalid(input: &str, reason: &str) -> AdapterError {
    AdapterError::InvalidInput(format!("invalid label selector '{input}': {reason}"))
}

/// Split on commas outside parentheses.
fn split_terms(input: &str) -> Result<Vec<&str>> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| invalid(input, "unbalanced ')'"))?;
            }
            ',' if depth == 0 => {
                terms.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(invalid(input, "unbalanced '('"));
    }
    terms.push(&input[start..]);
    Ok(terms)
}

fn parse_term(term: &str) -> Result<Requirement> {
    if let Some(key) = term.strip_prefix('!') {
        let key = validate_key(term, key.trim())?;
        return Ok(Requirement::DoesNotExist { key });
    }

    if let Some((key, rest)) = term.split_once(char::is_whitespace) {
        let rest = rest.trim_start();
        if let Some(values) = rest.strip_prefix("notin") {
            let key = validate_key(term, key)?;
            return Ok(Requirement::NotIn { key, values: parse_set(term, values)? });
        }
        if let Some(values) = rest.strip_prefix("in") {
            let key = validate_key(term, key)?;
            return Ok(Requirement::In { key, values: parse_set(term, values)? });
        }
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Ok(Requirement::NotEquals {
            key: validate_key(term, key.trim())?,
            value: validate_value(term, value.trim())?,
        });
    }

    if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
        return Ok(Requirement::Equals {
            key: validate_key(term, key.trim())?,
            value: validate_value(term, value.trim())?,
        });
    }

    Ok(Requirement::Exists { key: validate_key(term, term)? })
}

fn parse_set(term: &str, raw: &str) -> Result<BTreeSet<String>> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| invalid(term, "set values must be wrapped in parentheses"))?;

    let values = inner
        .split(',')
        .map(|value| validate_value(term, value.trim()))
        .collect::<Result<BTreeSet<String>>>()?;

    if inner.trim().is_empty() {
        return Err(invalid(term, "set must not be empty"));
    }
    Ok(values)
}

fn validate_key(term: &str, key: &str) -> Result<String> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if !valid {
        return Err(invalid(term, &format!("invalid key '{key}'")));
    }
    Ok(key.to_string())
}

fn validate_value(term: &str, value: &str) -> Result<String> {
    let valid = value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(invalid(term, &format!("invalid value '{value}'")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn equality_selector_matches_same_label() {
        let selector = Selector::from_pairs([("agent_type", "x")]);
        assert!(selector.matches(&labels(&[("agent_type", "x")])));
    }

    #[test]
    fn extra_requirement_makes_selector_unsatisfiable() {
        let selector = Selector::from_pairs([("agent_type", "x"), ("other", "y")]);
        assert!(!selector.matches(&labels(&[("agent_type", "x")])));
    }

    #[test]
    fn empty_value_does_not_match_present_non_empty_value() {
        let selector = Selector::from_pairs([("agent_type", "")]);
        assert!(!selector.matches(&labels(&[("agent_type", "x")])));
        assert!(selector.matches(&labels(&[("agent_type", "")])));
    }

    #[test]
    fn mismatched_value_or_key_does_not_match() {
        let metric = labels(&[("app", "semaphore-agent")]);
        assert!(!Selector::from_pairs([("app", "something-else")]).matches(&metric));
        assert!(!Selector::from_pairs([("app2", "semaphore-agent")]).matches(&metric));
        assert!(Selector::from_pairs([("app", "semaphore-agent")]).matches(&metric));
    }

    #[test]
    fn presence_requirement_ignores_value() {
        let selector = Selector::everything().with(Requirement::exists("agent_type"));
        assert!(selector.matches(&labels(&[("agent_type", "anything")])));
        assert!(selector.matches(&labels(&[("agent_type", "")])));
        assert!(!selector.matches(&labels(&[("other", "x")])));
    }

    #[test]
    fn empty_selector_matches_everything() {
        let selector = Selector::everything();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("a", "b")])));
    }

    #[test]
    fn parses_equality_and_presence_terms() {
        let selector = Selector::parse("agent_type=s1, tier==prod,zone").unwrap();
        assert_eq!(
            selector.requirements(),
            &[
                Requirement::equals("agent_type", "s1"),
                Requirement::equals("tier", "prod"),
                Requirement::exists("zone"),
            ]
        );
    }

    #[test]
    fn parses_empty_value_as_equality() {
        let selector = Selector::parse("agent_type=").unwrap();
        assert_eq!(selector.requirements(), &[Requirement::equals("agent_type", "")]);
    }

    #[test]
    fn parses_set_and_negative_terms() {
        let selector = Selector::parse("agent_type in (s1, s2),tier notin (dev),!legacy,zone!=eu")
            .unwrap();
        assert_eq!(selector.requirements().len(), 4);

        assert!(selector.matches(&labels(&[("agent_type", "s2"), ("tier", "prod")])));
        assert!(!selector.matches(&labels(&[("agent_type", "s3")])));
        assert!(!selector.matches(&labels(&[("agent_type", "s1"), ("tier", "dev")])));
        assert!(!selector.matches(&labels(&[("agent_type", "s1"), ("legacy", "")])));
        assert!(!selector.matches(&labels(&[("agent_type", "s1"), ("zone", "eu")])));
        assert!(selector.matches(&labels(&[("agent_type", "s1"), ("zone", "us")])));
    }

    #[test]
    fn blank_input_is_the_empty_selector() {
        assert!(Selector::parse("").unwrap().is_empty());
        assert!(Selector::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_selectors() {
        for input in ["a=b,,c=d", "a in (b", "a in b", "=b", "a b=c", "k in ()", "a=b c"] {
            let err = Selector::parse(input).unwrap_err();
            assert!(matches!(err, AdapterError::InvalidInput(_)), "{input}: {err:?}");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let selector = Selector::parse("a=b,c!=d,e in (f,g),!h,i").unwrap();
        let reparsed = Selector::parse(&selector.to_string()).unwrap();
        assert_eq!(selector, reparsed);
    }
}
