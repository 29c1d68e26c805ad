//! Location-path patterns used to pull attribute values out of a DSML document.
//!
//! Only the subset of XPath that attribute lookups need is supported: absolute
//! paths made of `/` (child) and `//` (descendant-or-self) steps, element name
//! tests with an optional namespace prefix, and at most one `[@attr='literal']`
//! predicate per step. A literal written as `%s` is a placeholder; it is bound
//! to the requested directory attribute name at evaluation time, as data, so
//! the name never becomes part of the pattern text.

use crate::Result;
use eds_core::Error;

/// The attribute-value query every lookup runs, with `%s` standing for the
/// directory attribute name.
pub const DSML_VALUE_QUERY: &str = "//dsml:entry/dsml:attr[@name='%s']/dsml:value";

/// Placeholder token inside predicate literals.
pub const PLACEHOLDER: &str = "%s";

/// How a step selects candidates relative to its context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Direct children (`/name`).
    Child,
    /// Any descendant (`//name`); for the first step this includes the root.
    Descendant,
}

/// A possibly prefixed XML name as written in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    prefix: Option<String>,
    local: String,
}

impl QName {
    fn parse(raw: &str, pattern: &str) -> Result<Self> {
        let raw = raw.trim();
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, raw),
        };

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(local) || prefix.is_some_and(|p| !valid(p)) {
            return Err(invalid(pattern, &format!("`{raw}` is not a valid name")));
        }

        Ok(Self {
            prefix: prefix.map(str::to_owned),
            local: local.to_owned(),
        })
    }

    /// Namespace prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Local part of the name.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A fixed string.
    Text(String),
    /// Bound to the requested attribute name at evaluation time.
    Placeholder,
}

impl Literal {
    /// Resolves the literal against the bound value.
    #[must_use]
    pub fn resolve<'a>(&'a self, bound: &'a str) -> &'a str {
        match self {
            Self::Text(text) => text,
            Self::Placeholder => bound,
        }
    }
}

/// `[@attribute='value']` filter on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Attribute being compared.
    pub attribute: QName,
    /// Expected value.
    pub value: Literal,
}

/// One location step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Selection axis.
    pub axis: Axis,
    /// Element name test.
    pub name: QName,
    /// Optional attribute filter.
    pub predicate: Option<Predicate>,
}

/// A parsed location-path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPattern {
    source: String,
    steps: Vec<Step>,
}

impl QueryPattern {
    /// Parses a pattern such as [`DSML_VALUE_QUERY`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the pattern is not absolute, uses
    /// unsupported syntax, or has no `%s` placeholder to bind.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut rest = pattern.trim();
        if rest.is_empty() {
            return Err(invalid(pattern, "pattern is empty"));
        }

        let mut steps = Vec::new();
        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::Descendant
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                Axis::Child
            } else {
                return Err(invalid(pattern, "steps must start with `/` or `//`"));
            };

            let end = rest.find(['/', '[']).unwrap_or(rest.len());
            let (name, after) = rest.split_at(end);
            let name = QName::parse(name, pattern)?;
            rest = after;

            let predicate = match rest.strip_prefix('[') {
                Some(body) => {
                    let close = predicate_end(body)
                        .ok_or_else(|| invalid(pattern, "unterminated predicate"))?;
                    let predicate = parse_predicate(&body[..close], pattern)?;
                    rest = &body[close + 1..];
                    Some(predicate)
                }
                None => None,
            };

            steps.push(Step {
                axis,
                name,
                predicate,
            });
        }

        let has_placeholder = steps.iter().any(|step| {
            matches!(
                step.predicate,
                Some(Predicate {
                    value: Literal::Placeholder,
                    ..
                })
            )
        });
        if !has_placeholder {
            return Err(invalid(pattern, "pattern has no `%s` placeholder"));
        }

        Ok(Self {
            source: pattern.to_owned(),
            steps,
        })
    }

    /// Pattern text as originally supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed steps, outermost first.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl std::fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Finds the closing `]`, skipping brackets inside quoted literals.
fn predicate_end(body: &str) -> Option<usize> {
    let mut quote = None;
    for (idx, ch) in body.char_indices() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, ']') => return Some(idx),
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str, pattern: &str) -> Result<Predicate> {
    let body = body.trim();
    let body = body
        .strip_prefix('@')
        .ok_or_else(|| invalid(pattern, "only `[@attr='value']` predicates are supported"))?;
    let (attribute, literal) = body
        .split_once('=')
        .ok_or_else(|| invalid(pattern, "predicate is missing `=`"))?;

    let attribute = QName::parse(attribute, pattern)?;
    let literal = literal.trim();

    let inner = ['\'', '"']
        .iter()
        .find_map(|q| literal.strip_prefix(*q).and_then(|l| l.strip_suffix(*q)))
        .ok_or_else(|| invalid(pattern, "predicate value must be quoted"))?;

    let value = if inner == PLACEHOLDER {
        Literal::Placeholder
    } else if inner.contains(PLACEHOLDER) {
        return Err(invalid(
            pattern,
            "`%s` must be the whole predicate value",
        ));
    } else {
        Literal::Text(inner.to_owned())
    };

    Ok(Predicate { attribute, value })
}

fn invalid(pattern: &str, reason: &str) -> Error {
    Error::ConfigError(format!("invalid query pattern `{pattern}`: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_query() {
        let query = QueryPattern::parse(DSML_VALUE_QUERY).unwrap();
        let steps = query.steps();
        assert_eq!(steps.len(), 3);

        assert_eq!(steps[0].axis, Axis::Descendant);
        assert_eq!(steps[0].name.prefix(), Some("dsml"));
        assert_eq!(steps[0].name.local(), "entry");
        assert!(steps[0].predicate.is_none());

        assert_eq!(steps[1].axis, Axis::Child);
        assert_eq!(steps[1].name.local(), "attr");
        let predicate = steps[1].predicate.as_ref().unwrap();
        assert_eq!(predicate.attribute.local(), "name");
        assert!(predicate.attribute.prefix().is_none());
        assert_eq!(predicate.value, Literal::Placeholder);

        assert_eq!(steps[2].name.local(), "value");
        assert_eq!(query.to_string(), DSML_VALUE_QUERY);
    }

    #[test]
    fn placeholder_binds_as_data() {
        assert_eq!(Literal::Placeholder.resolve("o'brien"), "o'brien");
        assert_eq!(Literal::Text("uid".into()).resolve("ignored"), "uid");
    }

    #[test]
    fn accepts_double_quotes_and_fixed_predicates() {
        let query =
            QueryPattern::parse("/dsml:dsml//dsml:entry[@dn=\"a]b\"]/dsml:attr[@name=\"%s\"]")
                .unwrap();
        let steps = query.steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].axis, Axis::Child);
        assert_eq!(
            steps[1].predicate.as_ref().unwrap().value,
            Literal::Text("a]b".into())
        );
    }

    #[test]
    fn rejects_relative_patterns() {
        let err = QueryPattern::parse("dsml:entry/dsml:attr[@name='%s']").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn rejects_missing_placeholder() {
        assert!(QueryPattern::parse("//dsml:entry/dsml:attr[@name='uid']").is_err());
        assert!(QueryPattern::parse("//dsml:entry").is_err());
    }

    #[test]
    fn rejects_malformed_predicates() {
        assert!(QueryPattern::parse("//a[@name='%s'").is_err());
        assert!(QueryPattern::parse("//a[name='%s']").is_err());
        assert!(QueryPattern::parse("//a[@name=%s]").is_err());
        assert!(QueryPattern::parse("//a[@name='x%s']").is_err());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(QueryPattern::parse("//[@name='%s']").is_err());
        assert!(QueryPattern::parse("//a b[@name='%s']").is_err());
        assert!(QueryPattern::parse("//:a[@name='%s']").is_err());
        assert!(QueryPattern::parse("").is_err());
    }
}
