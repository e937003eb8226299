use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ast::{Group, GroupKind, Node, Statement, Token};
use crate::parser::parse_first_statement;
use crate::serializer::rebuild_sql;

/// Original bare name -> lowercase hex SHA-256 digest, in first-occurrence order.
pub type NameMap = IndexMap<String, String>;

/// Lowercase hex SHA-256 of the UTF-8 bytes of `name` (64 characters).
pub fn hash_name(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Rewrites bare name tokens into their digests.
///
/// A name token is rewritten unless it is a direct child of an
/// [`GroupKind::Identifier`] group, i.e. part of a qualified (`t.c`), aliased
/// (`c AS x`) or table reference, or a function name. Groups nested inside an
/// identifier, such as the arguments of `count(c) AS n`, are still visited.
#[derive(Debug, Default)]
pub struct Anonymizer {
    name_map: NameMap,
}

impl Anonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    pub fn into_name_map(self) -> NameMap {
        self.name_map
    }

    /// Consumes `nodes` and returns the rewritten tree.
    pub fn anonymize_nodes(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|node| self.anonymize_node(node))
            .collect()
    }

    fn anonymize_node(&mut self, node: Node) -> Node {
        match node {
            Node::Token(token) if token.is_name() => Node::Token(self.anonymize_token(token)),
            Node::Group(group) if group.kind == GroupKind::Identifier => {
                Node::Group(self.anonymize_identifier(group))
            }
            Node::Group(group) => Node::Group(Group::new(
                group.kind,
                self.anonymize_nodes(group.children),
            )),
            token => token,
        }
    }

    fn anonymize_identifier(&mut self, identifier: Group) -> Group {
        let children = identifier
            .children
            .into_iter()
            .map(|child| match child {
                Node::Group(group) => self.anonymize_node(Node::Group(group)),
                Node::Token(token) => {
                    if token.is_name() {
                        log::trace!("Keeping identifier part {:?}", token.lexeme);
                    }
                    Node::Token(token)
                }
            })
            .collect();
        Group::new(GroupKind::Identifier, children)
    }

    fn anonymize_token(&mut self, mut token: Token) -> Token {
        let digest = self
            .name_map
            .entry(token.lexeme.clone())
            .or_insert_with(|| hash_name(&token.lexeme))
            .clone();
        log::debug!(
            "[line {}, col {}] Replacing {:?} with {}",
            token.line,
            token.col,
            token.lexeme,
            digest
        );
        token.lexeme = digest;
        token
    }
}

#[derive(Debug, Clone)]
pub struct Anonymized {
    pub statement: Statement,
    pub name_map: NameMap,
}

/// Returns a new statement with its bare names replaced, plus the mapping of
/// every substituted name.
pub fn anonymize(statement: Statement) -> Anonymized {
    let mut anonymizer = Anonymizer::new();
    let nodes = anonymizer.anonymize_nodes(statement.nodes);
    Anonymized {
        statement: Statement { nodes },
        name_map: anonymizer.into_name_map(),
    }
}

/// Result of [`anonymize_sql`]: the input text, the anonymized first
/// statement and the substitutions made.
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizedSql {
    pub original: String,
    pub sql: String,
    pub name_map: NameMap,
}

/// Parses the first statement of `sql`, anonymizes it and serializes it back.
pub fn anonymize_sql(sql: &str) -> anyhow::Result<AnonymizedSql> {
    let statement = parse_first_statement(sql)?;
    let anonymized = anonymize(statement);
    Ok(AnonymizedSql {
        original: sql.to_string(),
        sql: rebuild_sql(&anonymized.statement.nodes),
        name_map: anonymized.name_map,
    })
}
