//! `$search` expressions

use std::fmt;

/// A leaf search term: a bare word or a quoted phrase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm {
    pub text: String,
    pub phrase: bool,
}

impl SearchTerm {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phrase: false,
        }
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phrase: true,
        }
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.phrase {
            write!(f, "\"{}\"", self.text.replace('"', "\\\""))
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Boolean combination of search terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExpression {
    Term(SearchTerm),
    And(Box<SearchExpression>, Box<SearchExpression>),
    Or(Box<SearchExpression>, Box<SearchExpression>),
    Not(Box<SearchExpression>),
}

impl SearchExpression {
    pub fn word(text: impl Into<String>) -> Self {
        Self::Term(SearchTerm::word(text))
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self::Term(SearchTerm::phrase(text))
    }

    pub fn and(left: SearchExpression, right: SearchExpression) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: SearchExpression, right: SearchExpression) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(expr: SearchExpression) -> Self {
        Self::Not(Box::new(expr))
    }

    /// Leaf terms in left-to-right order
    pub fn terms(&self) -> Vec<&SearchTerm> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a SearchTerm>) {
        match self {
            Self::Term(term) => out.push(term),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_terms(out);
                right.collect_terms(out);
            }
            Self::Not(inner) => inner.collect_terms(out),
        }
    }
}

impl fmt::Display for SearchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{}", term),
            Self::And(left, right) => write!(f, "({} AND {})", left, right),
            Self::Or(left, right) => write!(f, "({} OR {})", left, right),
            Self::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_in_order() {
        let expr = SearchExpression::or(
            SearchExpression::and(SearchExpression::word("blue"), SearchExpression::phrase("sky high")),
            SearchExpression::negate(SearchExpression::word("red")),
        );
        let texts: Vec<_> = expr.terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["blue", "sky high", "red"]);
        assert_eq!(expr.to_string(), "((blue AND \"sky high\") OR NOT red)");
    }
}
