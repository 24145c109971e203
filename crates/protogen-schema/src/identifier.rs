//! Include/exclude rules for `--includes` and `--excludes`.
//!
//! Supports:
//! - Exact names: `--includes=squareup.geology.Period`
//! - Namespace wildcards: `--includes=squareup.geology.*`
//!
//! An exact rule also matches every type nested inside the named one, so
//! `squareup.Outer` matches `squareup.Outer.Inner`. Excludes always win over
//! includes, regardless of which rule is more specific.

use std::fmt;

/// A malformed include or exclude rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("empty identifier")]
    Empty,
    #[error("invalid identifier '{0}': wildcard must follow a namespace, as in 'pkg.*'")]
    MisplacedWildcard(String),
    #[error("invalid identifier '{0}': member identifiers are not supported")]
    Member(String),
    #[error("invalid identifier '{rule}': unexpected character '{found}'")]
    InvalidCharacter { rule: String, found: char },
}

/// A single parsed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `pkg.Type`: the type itself and anything nested in it.
    Exact(String),
    /// `pkg.*`: anything under the namespace `pkg`.
    Namespace(String),
}

impl Rule {
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let rule = input.trim();
        if rule.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if rule.contains('#') {
            return Err(IdentifierError::Member(rule.to_string()));
        }

        let (body, wildcard) = match rule.strip_suffix(".*") {
            Some(body) => (body, true),
            None => (rule, false),
        };
        if body.contains('*') || body.is_empty() || rule == "*" {
            return Err(IdentifierError::MisplacedWildcard(rule.to_string()));
        }
        if let Some(found) = body
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        {
            return Err(IdentifierError::InvalidCharacter {
                rule: rule.to_string(),
                found,
            });
        }
        if body.split('.').any(str::is_empty) {
            return Err(IdentifierError::InvalidCharacter {
                rule: rule.to_string(),
                found: '.',
            });
        }

        Ok(if wildcard {
            Self::Namespace(body.to_string())
        } else {
            Self::Exact(body.to_string())
        })
    }

    /// Whether this rule matches the fully-qualified type `name`.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact || is_nested_in(name, exact),
            Self::Namespace(prefix) => is_nested_in(name, prefix),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Namespace(prefix) => write!(f, "{prefix}.*"),
        }
    }
}

/// `name` lies strictly below the dotted `prefix`.
fn is_nested_in(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() + 1
        && name.starts_with(prefix)
        && name.as_bytes()[prefix.len()] == b'.'
}

/// Include and exclude rules used to prune a schema to a set of root types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    includes: Vec<Rule>,
    excludes: Vec<Rule>,
}

impl IdentifierSet {
    pub fn builder() -> IdentifierSetBuilder {
        IdentifierSetBuilder::default()
    }

    /// No rules at all: nothing should be pruned.
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn includes(&self) -> &[Rule] {
        &self.includes
    }

    pub fn excludes(&self) -> &[Rule] {
        &self.excludes
    }

    /// Whether `name` is a root: included and not excluded.
    ///
    /// An empty set retains everything.
    pub fn retains(&self, name: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        self.includes.iter().any(|r| r.matches(name)) && !self.is_excluded(name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excludes.iter().any(|r| r.matches(name))
    }

    /// Start recording which rules match during a walk.
    pub fn tracker(&self) -> RuleTracker<'_> {
        RuleTracker {
            set: self,
            used_includes: vec![false; self.includes.len()],
            used_excludes: vec![false; self.excludes.len()],
        }
    }
}

/// Collects rules before validating them all at once.
#[derive(Debug, Default)]
pub struct IdentifierSetBuilder {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl IdentifierSetBuilder {
    pub fn include(&mut self, rule: impl Into<String>) -> &mut Self {
        self.includes.push(rule.into());
        self
    }

    pub fn exclude(&mut self, rule: impl Into<String>) -> &mut Self {
        self.excludes.push(rule.into());
        self
    }

    pub fn build(&self) -> Result<IdentifierSet, IdentifierError> {
        Ok(IdentifierSet {
            includes: parse_rules(&self.includes)?,
            excludes: parse_rules(&self.excludes)?,
        })
    }
}

fn parse_rules(rules: &[String]) -> Result<Vec<Rule>, IdentifierError> {
    let mut parsed: Vec<Rule> = Vec::with_capacity(rules.len());
    for rule in rules {
        let rule = Rule::parse(rule)?;
        if !parsed.contains(&rule) {
            parsed.push(rule);
        }
    }
    Ok(parsed)
}

/// Records, per rule, whether it matched at least one type.
///
/// Every matching rule is marked, not only the first, so a rule is reported
/// unused only if it matched nothing.
#[derive(Debug)]
pub struct RuleTracker<'a> {
    set: &'a IdentifierSet,
    used_includes: Vec<bool>,
    used_excludes: Vec<bool>,
}

impl RuleTracker<'_> {
    pub fn is_included(&mut self, name: &str) -> bool {
        mark(&self.set.includes, &mut self.used_includes, name)
    }

    pub fn is_excluded(&mut self, name: &str) -> bool {
        mark(&self.set.excludes, &mut self.used_excludes, name)
    }

    /// Include rules that never matched, in the order given.
    pub fn unused_includes(&self) -> Vec<String> {
        unused(&self.set.includes, &self.used_includes)
    }

    /// Exclude rules that never matched, in the order given.
    pub fn unused_excludes(&self) -> Vec<String> {
        unused(&self.set.excludes, &self.used_excludes)
    }
}

fn mark(rules: &[Rule], used: &mut [bool], name: &str) -> bool {
    let mut matched = false;
    for (rule, used) in rules.iter().zip(used.iter_mut()) {
        if rule.matches(name) {
            *used = true;
            matched = true;
        }
    }
    matched
}

fn unused(rules: &[Rule], used: &[bool]) -> Vec<String> {
    rules
        .iter()
        .zip(used)
        .filter(|(_, used)| !**used)
        .map(|(rule, _)| rule.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(includes: &[&str], excludes: &[&str]) -> IdentifierSet {
        let mut builder = IdentifierSet::builder();
        for rule in includes {
            builder.include(*rule);
        }
        for rule in excludes {
            builder.exclude(*rule);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_exact_rule_matches_nested() {
        let rule = Rule::parse("a.b.Outer").unwrap();
        assert!(rule.matches("a.b.Outer"));
        assert!(rule.matches("a.b.Outer.Inner"));
        assert!(!rule.matches("a.b.OuterMost"));
        assert!(!rule.matches("a.b"));
    }

    #[test]
    fn test_namespace_rule() {
        let rule = Rule::parse("a.b.*").unwrap();
        assert!(rule.matches("a.b.C"));
        assert!(rule.matches("a.b.c.D"));
        assert!(!rule.matches("a.bc.D"));
        assert!(!rule.matches("a.b"));
        assert_eq!(rule.to_string(), "a.b.*");
    }

    #[test]
    fn test_malformed_rules() {
        assert_eq!(Rule::parse("  "), Err(IdentifierError::Empty));
        assert!(matches!(
            Rule::parse("*"),
            Err(IdentifierError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            Rule::parse("a.*.B"),
            Err(IdentifierError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            Rule::parse("a.B#field"),
            Err(IdentifierError::Member(_))
        ));
        assert!(matches!(
            Rule::parse("a-b.C"),
            Err(IdentifierError::InvalidCharacter { found: '-', .. })
        ));
        assert!(Rule::parse("a..C").is_err());
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(
            Rule::parse(" a.B ").unwrap(),
            Rule::Exact("a.B".to_string())
        );
    }

    #[test]
    fn test_empty_set_retains_everything() {
        let empty = IdentifierSet::default();
        assert!(empty.is_empty());
        assert!(empty.retains("anything.At.All"));
    }

    #[test]
    fn test_exclude_wins() {
        let rules = set(&["a.B"], &["a.*"]);
        assert!(!rules.retains("a.B"));

        let rules = set(&["a.*"], &["a.B"]);
        assert!(rules.retains("a.C"));
        assert!(!rules.retains("a.B"));
        assert!(!rules.retains("a.B.Nested"));
    }

    #[test]
    fn test_excludes_only_retains_nothing() {
        let rules = set(&[], &["a.B"]);
        assert!(!rules.is_empty());
        assert!(!rules.retains("a.C"));
    }

    #[test]
    fn test_tracker_reports_unused_in_order() {
        let rules = set(&["a.B", "z.*", "a.C"], &["q.Q", "a.B.X"]);
        let mut tracker = rules.tracker();
        assert!(tracker.is_included("a.B"));
        assert!(tracker.is_excluded("a.B.X"));
        assert!(!tracker.is_included("b.B"));
        assert_eq!(tracker.unused_includes(), ["z.*", "a.C"]);
        assert_eq!(tracker.unused_excludes(), ["q.Q"]);
    }

    #[test]
    fn test_duplicate_rules_collapse() {
        let rules = set(&["a.B", " a.B"], &[]);
        assert_eq!(rules.includes().len(), 1);
    }
}
