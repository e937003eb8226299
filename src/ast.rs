use serde::{Deserialize, Serialize};
use strum_macros::{EnumDiscriminants, IntoStaticStr};

/// Keyword vocabulary shared with `sqlparser`, so that every word its
/// tokenizer knows as a keyword is classified the same way here.
pub use sqlparser::keywords::Keyword;

/// Built-in type names. They are classified apart from bare names so that
/// column definitions such as `id INT` are not read as aliases.
pub(crate) const BUILTIN_TYPES: &[&str] = &[
    "bigint",
    "blob",
    "bool",
    "boolean",
    "char",
    "date",
    "datetime",
    "decimal",
    "double",
    "float",
    "int",
    "integer",
    "numeric",
    "nvarchar",
    "real",
    "serial",
    "smallint",
    "text",
    "timestamp",
    "tinyint",
    "varchar",
];

#[derive(PartialEq, Clone, Debug, EnumDiscriminants, Serialize, Deserialize)]
#[strum_discriminants(name(TokenTypeVariant))]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum TokenType {
    Whitespace,
    Newline,
    Comment,
    Keyword(Keyword),
    /// Unquoted identifier-like word: the only kind that gets anonymized.
    Name,
    QuotedName,
    Builtin,
    Number,
    String,
    Punctuation,
    Operator,
    Comparison,
    Wildcard,
    Placeholder,
    Error,
}

impl TokenTypeVariant {
    pub fn variant_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    pub line: u32,
    pub col: u32,
}

impl Token {
    pub fn variant(&self) -> TokenTypeVariant {
        TokenTypeVariant::from(&self.kind)
    }

    pub fn is_name(&self) -> bool {
        self.kind == TokenType::Name
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenType::Keyword(keyword)
    }

    pub fn is_punctuation(&self, value: &str) -> bool {
        self.kind == TokenType::Punctuation && self.lexeme == value
    }

    /// Whitespace, newlines and comments.
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.kind,
            TokenType::Whitespace | TokenType::Newline | TokenType::Comment
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Parenthesis,
    Function,
    /// Qualified (`t.c`), aliased (`c AS x`) or table reference.
    Identifier,
    IdentifierList,
    Comparison,
    Where,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Node>,
}

impl Group {
    pub fn new(kind: GroupKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Token(Token),
    Group(Group),
}

impl Node {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Token(_) => None,
            Node::Group(group) => Some(group),
        }
    }

    pub fn is_group(&self, kind: GroupKind) -> bool {
        self.as_group().is_some_and(|group| group.kind == kind)
    }

    /// A bare name token, the unit the anonymizer rewrites.
    pub fn is_name_token(&self) -> bool {
        self.as_token().is_some_and(Token::is_name)
    }

    pub fn is_identifier(&self) -> bool {
        self.is_group(GroupKind::Identifier)
    }

    pub fn is_whitespace(&self) -> bool {
        self.as_token().is_some_and(Token::is_whitespace)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_token().is_some_and(|tok| tok.is_keyword(keyword))
    }

    pub fn is_punctuation(&self, value: &str) -> bool {
        self.as_token().is_some_and(|tok| tok.is_punctuation(value))
    }

    pub(crate) fn is_token_type(&self, token_type: TokenTypeVariant) -> bool {
        self.as_token().is_some_and(|tok| tok.variant() == token_type)
    }

    /// Leaf tokens in source order.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Token>) {
        match self {
            Node::Token(token) => leaves.push(token),
            Node::Group(group) => group
                .children
                .iter()
                .for_each(|child| child.collect_leaves(leaves)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub nodes: Vec<Node>,
}

impl Statement {
    pub fn leaves(&self) -> Vec<&Token> {
        self.nodes.iter().flat_map(Node::leaves).collect()
    }
}
