use std::fmt::{self, Display};

use crate::ast::{Group, Node, Statement, Token};

/// Concatenates leaf lexemes left to right, descending into every group.
///
/// Nothing is cached at parse time, so the output always reflects the current
/// tree. Serializing an untouched tree reproduces the statement's source text.
pub fn rebuild_sql(nodes: &[Node]) -> String {
    let mut sql = String::new();
    for node in nodes {
        match node {
            Node::Token(token) => sql.push_str(&token.lexeme),
            Node::Group(group) => sql.push_str(&rebuild_sql(&group.children)),
        }
    }
    sql
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rebuild_sql(&self.children))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Token(token) => Display::fmt(token, f),
            Node::Group(group) => Display::fmt(group, f),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rebuild_sql(&self.nodes))
    }
}
