//! # Content Expressions
//!
//! A node type's `content` string restricts which children it may hold, e.g.
//! `"block+"`, `"inline*"` or `"paragraph block*"`. Each whitespace separated
//! token names a node type or a group, optionally followed by a quantifier:
//!
//! | suffix | meaning      |
//! |--------|--------------|
//! | (none) | exactly one  |
//! | `?`    | zero or one  |
//! | `*`    | zero or more |
//! | `+`    | one or more  |

use crate::error::{ModelError, ModelResult};
use crate::schema::NodeType;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    Node(String),
    Group(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Term {
    pub(crate) target: Target,
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
}

impl Term {
    pub(crate) fn accepts(&self, node_type: &NodeType) -> bool {
        match &self.target {
            Target::Node(name) => node_type.name() == name,
            Target::Group(group) => node_type.in_group(group),
        }
    }
}

/// Compiled content expression of a node type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentExpr {
    terms: Vec<Term>,
}

impl ContentExpr {
    /// Parse an expression. `is_node_name` decides whether a token names a
    /// node type; every other token is treated as a group.
    pub fn parse(source: &str, is_node_name: impl Fn(&str) -> bool) -> ModelResult<Self> {
        let mut terms = Vec::new();

        for token in source.split_whitespace() {
            let (name, min, max) = match token.as_bytes().last() {
                Some(b'*') => (&token[..token.len() - 1], 0, None),
                Some(b'+') => (&token[..token.len() - 1], 1, None),
                Some(b'?') => (&token[..token.len() - 1], 0, Some(1)),
                _ => (token, 1, Some(1)),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ModelError::InvalidContentExpr(source.to_string()));
            }

            let target = if is_node_name(name) {
                Target::Node(name.to_string())
            } else {
                Target::Group(name.to_string())
            };

            terms.push(Term { target, min, max });
        }

        Ok(Self { terms })
    }

    /// Leaf nodes have an empty expression
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Check a full sequence of child types against the expression
    pub fn matches(&self, types: &[&NodeType]) -> bool {
        match_terms(&self.terms, types)
    }

    /// Whether any term accepts the given type
    pub fn allows(&self, node_type: &NodeType) -> bool {
        self.terms.iter().any(|term| term.accepts(node_type))
    }

    pub(crate) fn terms(&self) -> &[Term] {
        &self.terms
    }
}

fn match_terms(terms: &[Term], types: &[&NodeType]) -> bool {
    let Some((term, rest)) = terms.split_first() else {
        return types.is_empty();
    };

    let limit = term.max.unwrap_or(usize::MAX).min(types.len());
    let mut run = 0;
    while run < limit && term.accepts(types[run]) {
        run += 1;
    }

    if run < term.min {
        return false;
    }

    // Greedy first, backtracking towards the minimum
    (term.min..=run).rev().any(|taken| match_terms(rest, &types[taken..]))
}
