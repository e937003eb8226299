use anyhow::anyhow;

use crate::ast::{Group, GroupKind, Keyword, Node, Statement, Token, TokenType, TokenTypeVariant};
use crate::scanner::Scanner;

/// Keywords that never stand for a column, table or function name. Every
/// other `sqlparser` keyword is only a keyword where a name cannot appear,
/// so `SELECT name, count(*) FROM data` still reads `name`, `count` and
/// `data` as names.
const RESERVED_KEYWORDS: &[Keyword] = &[
    Keyword::ALL,
    Keyword::AND,
    Keyword::ANY,
    Keyword::AS,
    Keyword::ASC,
    Keyword::BETWEEN,
    Keyword::BOTH,
    Keyword::BY,
    Keyword::CASE,
    Keyword::CAST,
    Keyword::CHECK,
    Keyword::COLLATE,
    Keyword::CONFLICT,
    Keyword::CONSTRAINT,
    Keyword::CREATE,
    Keyword::CROSS,
    Keyword::CURRENT,
    Keyword::CURRENT_CATALOG,
    Keyword::CURRENT_DATE,
    Keyword::CURRENT_ROLE,
    Keyword::CURRENT_SCHEMA,
    Keyword::CURRENT_TIME,
    Keyword::CURRENT_TIMESTAMP,
    Keyword::CURRENT_USER,
    Keyword::DEFAULT,
    Keyword::DELETE,
    Keyword::DESC,
    Keyword::DISTINCT,
    Keyword::DROP,
    Keyword::ELSE,
    Keyword::END,
    Keyword::ESCAPE,
    Keyword::EXCEPT,
    Keyword::EXISTS,
    Keyword::FALSE,
    Keyword::FETCH,
    Keyword::FOLLOWING,
    Keyword::FOR,
    Keyword::FOREIGN,
    Keyword::FROM,
    Keyword::FULL,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::IF,
    Keyword::ILIKE,
    Keyword::IN,
    Keyword::INNER,
    Keyword::INSERT,
    Keyword::INTERSECT,
    Keyword::INTERVAL,
    Keyword::INTO,
    Keyword::IS,
    Keyword::JOIN,
    Keyword::LATERAL,
    Keyword::LEADING,
    Keyword::LEFT,
    Keyword::LIKE,
    Keyword::LIMIT,
    Keyword::LOCALTIME,
    Keyword::LOCALTIMESTAMP,
    Keyword::MINUS,
    Keyword::NATURAL,
    Keyword::NOT,
    Keyword::NULL,
    Keyword::NULLS,
    Keyword::OFFSET,
    Keyword::ON,
    Keyword::OR,
    Keyword::ORDER,
    Keyword::OUTER,
    Keyword::OVER,
    Keyword::PARTITION,
    Keyword::PRECEDING,
    Keyword::PRIMARY,
    Keyword::QUALIFY,
    Keyword::RANGE,
    Keyword::RECURSIVE,
    Keyword::REFERENCES,
    Keyword::RETURNING,
    Keyword::RIGHT,
    Keyword::ROW,
    Keyword::ROWS,
    Keyword::SELECT,
    Keyword::SESSION_USER,
    Keyword::SET,
    Keyword::SOME,
    Keyword::TABLE,
    Keyword::THEN,
    Keyword::TOP,
    Keyword::TRAILING,
    Keyword::TRUE,
    Keyword::UNBOUNDED,
    Keyword::UNION,
    Keyword::UNIQUE,
    Keyword::UPDATE,
    Keyword::USING,
    Keyword::VALUES,
    Keyword::VIEW,
    Keyword::WHEN,
    Keyword::WHERE,
    Keyword::WINDOW,
    Keyword::WITH,
    Keyword::WITHIN,
];

/// Keywords that evaluate to a value on their own.
const VALUE_KEYWORDS: &[Keyword] = &[
    Keyword::NULL,
    Keyword::TRUE,
    Keyword::FALSE,
    Keyword::CURRENT_CATALOG,
    Keyword::CURRENT_DATE,
    Keyword::CURRENT_ROLE,
    Keyword::CURRENT_SCHEMA,
    Keyword::CURRENT_TIME,
    Keyword::CURRENT_TIMESTAMP,
    Keyword::CURRENT_USER,
    Keyword::LOCALTIME,
    Keyword::LOCALTIMESTAMP,
    Keyword::SESSION_USER,
];

/// Keywords after which a table reference is expected. `FROM` and `WITH`
/// are handled separately.
fn introduces_table(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::JOIN | Keyword::INTO | Keyword::UPDATE | Keyword::TABLE
    )
}

fn is_join_modifier(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::LEFT
            | Keyword::RIGHT
            | Keyword::INNER
            | Keyword::OUTER
            | Keyword::FULL
            | Keyword::CROSS
            | Keyword::NATURAL
    )
}

/// Keywords closing a `WHERE` clause at the same nesting level.
fn closes_where(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::GROUP
            | Keyword::ORDER
            | Keyword::HAVING
            | Keyword::LIMIT
            | Keyword::OFFSET
            | Keyword::UNION
            | Keyword::INTERSECT
            | Keyword::EXCEPT
            | Keyword::RETURNING
    )
}

/// Keywords after which a column, table or function name may follow.
fn opens_name(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::SELECT
            | Keyword::DISTINCT
            | Keyword::FROM
            | Keyword::JOIN
            | Keyword::INTO
            | Keyword::UPDATE
            | Keyword::TABLE
            | Keyword::WITH
            | Keyword::RECURSIVE
            | Keyword::AS
            | Keyword::WHERE
            | Keyword::AND
            | Keyword::OR
            | Keyword::NOT
            | Keyword::ON
            | Keyword::BY
            | Keyword::SET
            | Keyword::HAVING
            | Keyword::CASE
            | Keyword::WHEN
            | Keyword::THEN
            | Keyword::ELSE
            | Keyword::BETWEEN
            | Keyword::LIKE
            | Keyword::ILIKE
            | Keyword::RETURNING
    )
}

/// Splits a token stream into statements and groups each statement into a
/// tree of [`Node`]s. Grouping is lenient: it never fails and never drops or
/// reorders tokens.
pub struct Parser<'a> {
    source_tokens: &'a [Token],
    curr: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Self {
            source_tokens: tokens,
            curr: 0,
        }
    }

    pub fn parse(&mut self) -> Vec<Statement> {
        let mut statements = vec![];
        while !self.is_at_end() {
            let nodes = self.parse_statement_nodes();
            if nodes
                .iter()
                .all(|node| node.is_whitespace() || node.is_punctuation(";"))
            {
                log::debug!("Skipping statement without SQL tokens");
                continue;
            }
            statements.push(Statement {
                nodes: group_nodes(nodes, false),
            });
        }
        statements
    }

    fn is_at_end(&self) -> bool {
        self.curr >= self.source_tokens.len()
    }

    fn advance(&mut self) -> &Token {
        let token = &self.source_tokens[self.curr];
        self.curr += 1;
        token
    }

    // statement -> (token | parenthesis)* [";"]
    fn parse_statement_nodes(&mut self) -> Vec<Node> {
        let mut nodes = vec![];
        while !self.is_at_end() {
            let token = self.advance().clone();
            if token.is_punctuation("(") {
                nodes.push(self.parse_parenthesis(token));
                continue;
            }
            let ends_statement = token.is_punctuation(";");
            nodes.push(Node::Token(token));
            if ends_statement {
                break;
            }
        }
        nodes
    }

    // parenthesis -> "(" (token | parenthesis)* ")"
    fn parse_parenthesis(&mut self, open: Token) -> Node {
        let (line, col) = (open.line, open.col);
        let mut children = vec![Node::Token(open)];
        loop {
            if self.is_at_end() {
                log::warn!(
                    "[line {}, col {}] Unclosed parenthesis, grouping until end of input",
                    line,
                    col
                );
                break;
            }
            let token = self.advance().clone();
            if token.is_punctuation("(") {
                children.push(self.parse_parenthesis(token));
                continue;
            }
            let closes = token.is_punctuation(")");
            children.push(Node::Token(token));
            if closes {
                break;
            }
        }
        Node::Group(Group::new(GroupKind::Parenthesis, children))
    }
}

/// Groups one nesting level. `in_function_args` is set for the parenthesis
/// right after a function name, where `FROM` is part of the call syntax
/// (`EXTRACT(YEAR FROM d)`, `TRIM(BOTH FROM s)`) rather than a clause.
fn group_nodes(nodes: Vec<Node>, in_function_args: bool) -> Vec<Node> {
    let nodes = resolve_keywords(nodes);
    let mut grouped: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            Node::Group(group) if group.kind == GroupKind::Parenthesis => {
                let args = grouped.last().is_some_and(Node::is_name_token);
                Node::Group(Group::new(
                    GroupKind::Parenthesis,
                    group_nodes(group.children, args),
                ))
            }
            other => other,
        };
        grouped.push(node);
    }
    let nodes = group_table_references(grouped, in_function_args);
    let nodes = group_functions(nodes);
    let nodes = group_qualified_identifiers(nodes);
    let nodes = group_aliases(nodes);
    let nodes = group_comparisons(nodes);
    let nodes = group_identifier_lists(nodes);
    group_where(nodes)
}

fn next_significant(nodes: &[Node], from: usize) -> Option<usize> {
    (from..nodes.len()).find(|&i| !nodes[i].is_whitespace())
}

fn prev_significant(nodes: &[Node], before: usize) -> Option<usize> {
    (0..before).rev().find(|&i| !nodes[i].is_whitespace())
}

/// Replaces `nodes[start..=end]` with a single group of `kind`.
fn wrap(nodes: &mut Vec<Node>, start: usize, end: usize, kind: GroupKind) {
    let children: Vec<Node> = nodes.drain(start..=end).collect();
    nodes.insert(start, Node::Group(Group::new(kind, children)));
}

fn keyword_of(node: &Node) -> Option<Keyword> {
    match node.as_token().map(|token| &token.kind) {
        Some(TokenType::Keyword(keyword)) => Some(*keyword),
        _ => None,
    }
}

fn can_precede_name(node: &Node) -> bool {
    match node {
        Node::Token(token) => match &token.kind {
            TokenType::Keyword(keyword) => opens_name(*keyword),
            TokenType::Punctuation => token.lexeme == "," || token.lexeme == "(",
            TokenType::Comparison | TokenType::Operator | TokenType::Wildcard => true,
            _ => false,
        },
        Node::Group(_) => false,
    }
}

/// Turns non-reserved keywords standing where a name can start into
/// [`TokenType::Name`] tokens.
fn resolve_keywords(mut nodes: Vec<Node>) -> Vec<Node> {
    for i in 0..nodes.len() {
        let Some(keyword) = keyword_of(&nodes[i]) else {
            continue;
        };
        if RESERVED_KEYWORDS.contains(&keyword) {
            continue;
        }
        let Some(prev) = prev_significant(&nodes, i).filter(|&prev| can_precede_name(&nodes[prev]))
        else {
            continue;
        };
        // Date part in `EXTRACT(YEAR FROM d)`.
        let before_from = next_significant(&nodes, i + 1)
            .is_some_and(|next| nodes[next].is_keyword(Keyword::FROM));
        if nodes[prev].is_punctuation("(") && before_from {
            continue;
        }
        if let Node::Token(token) = &mut nodes[i] {
            log::trace!(
                "[line {}, col {}] Reading keyword {:?} as a name",
                token.line,
                token.col,
                token.lexeme
            );
            token.kind = TokenType::Name;
        }
    }
    nodes
}

fn is_name_like(node: &Node) -> bool {
    node.is_token_type(TokenTypeVariant::Name) || node.is_token_type(TokenTypeVariant::QuotedName)
}

fn is_value_keyword(node: &Node) -> bool {
    keyword_of(node).is_some_and(|keyword| VALUE_KEYWORDS.contains(&keyword))
}

fn is_operand(node: &Node) -> bool {
    match node {
        Node::Token(token) => {
            matches!(
                token.kind,
                TokenType::Name
                    | TokenType::QuotedName
                    | TokenType::Builtin
                    | TokenType::Number
                    | TokenType::String
                    | TokenType::Placeholder
            ) || is_value_keyword(node)
        }
        Node::Group(group) => matches!(
            group.kind,
            GroupKind::Parenthesis | GroupKind::Function | GroupKind::Identifier
        ),
    }
}

fn is_alias_target(node: &Node) -> bool {
    match node {
        // `CASE ... END AS x`
        Node::Token(token) => {
            matches!(
                token.kind,
                TokenType::Name | TokenType::QuotedName | TokenType::Number | TokenType::String
            ) || is_value_keyword(node)
                || token.is_keyword(Keyword::END)
        }
        Node::Group(group) => matches!(
            group.kind,
            GroupKind::Parenthesis | GroupKind::Function | GroupKind::Identifier
        ),
    }
}

fn is_list_item(node: &Node) -> bool {
    is_operand(node)
        || node.is_group(GroupKind::Comparison)
        || node.is_token_type(TokenTypeVariant::Wildcard)
}

/// `name (. name)*` following a clause `FROM`, `JOIN`, `INTO`, `UPDATE`,
/// `TABLE` or a comma inside a `FROM` list, and the CTE names of a `WITH`
/// list.
fn group_table_references(nodes: Vec<Node>, in_function_args: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut expect_table = false;
    let mut in_from_list = false;
    let mut in_with_list = false;
    let mut prev_keyword = None;
    let mut iter = nodes.into_iter().peekable();

    while let Some(node) = iter.next() {
        if node.is_whitespace() {
            out.push(node);
            continue;
        }
        let keyword = keyword_of(&node);
        let after = std::mem::replace(&mut prev_keyword, keyword);
        if let Some(keyword) = keyword {
            // Not `IS DISTINCT FROM x` nor `EXTRACT(YEAR FROM d)`.
            let clause_from = keyword == Keyword::FROM
                && !in_function_args
                && after != Some(Keyword::DISTINCT);
            // `WITH RECURSIVE`, `TABLE IF NOT EXISTS`
            let keeps_slot = expect_table
                && matches!(
                    keyword,
                    Keyword::RECURSIVE | Keyword::IF | Keyword::NOT | Keyword::EXISTS
                );
            if !keeps_slot {
                expect_table =
                    clause_from || keyword == Keyword::WITH || introduces_table(keyword);
            }
            if clause_from {
                in_from_list = true;
            } else if !(keyword == Keyword::JOIN
                || keyword == Keyword::AS
                || is_join_modifier(keyword))
            {
                in_from_list = false;
            }
            if keyword == Keyword::WITH {
                in_with_list = true;
            } else if !(keyword == Keyword::AS || keyword == Keyword::RECURSIVE) {
                in_with_list = false;
            }
            out.push(node);
            continue;
        }
        match node.as_token().map(|token| token.kind.clone()) {
            Some(TokenType::Punctuation) if node.is_punctuation(",") => {
                expect_table = in_from_list || in_with_list;
                out.push(node);
                continue;
            }
            Some(TokenType::Name | TokenType::QuotedName) if expect_table => {
                let mut children = vec![node];
                while let Some(dot) = iter.next_if(|next| next.is_punctuation(".")) {
                    children.push(dot);
                    match iter.next_if(is_name_like) {
                        Some(part) => children.push(part),
                        None => break,
                    }
                }
                out.push(Node::Group(Group::new(GroupKind::Identifier, children)));
                expect_table = false;
                continue;
            }
            _ => {}
        }
        expect_table = false;
        out.push(node);
    }
    out
}


/// `name(...)` becomes `Function[Identifier[name], Parenthesis]`.
fn group_functions(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter().peekable();

    while let Some(node) = iter.next() {
        if node.is_name_token() {
            if let Some(args) = iter.next_if(|next| next.is_group(GroupKind::Parenthesis)) {
                let name = Node::Group(Group::new(GroupKind::Identifier, vec![node]));
                out.push(Node::Group(Group::new(GroupKind::Function, vec![name, args])));
                continue;
            }
        }
        out.push(node);
    }
    out
}

/// Dotted chains: `a.b`, `a.b.c`, `t.*`, `schema.fn(x)`.
fn group_qualified_identifiers(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter().peekable();

    while let Some(node) = iter.next() {
        if !is_name_like(&node) || !iter.peek().is_some_and(|next| next.is_punctuation(".")) {
            out.push(node);
            continue;
        }
        let mut children = vec![node];
        while let Some(dot) = iter.next_if(|next| next.is_punctuation(".")) {
            children.push(dot);
            let Some(part) = iter.next_if(|next| {
                is_name_like(next)
                    || next.is_group(GroupKind::Function)
                    || next.is_token_type(TokenTypeVariant::Wildcard)
            }) else {
                break;
            };
            let last = !is_name_like(&part);
            children.push(part);
            if last {
                break;
            }
        }
        out.push(Node::Group(Group::new(GroupKind::Identifier, children)));
    }
    out
}

/// `operand AS alias` and `operand alias`.
fn group_aliases(mut nodes: Vec<Node>) -> Vec<Node> {
    let mut i = 0;
    while i < nodes.len() {
        if is_alias_target(&nodes[i]) {
            if let Some(end) = alias_end(&nodes, i) {
                wrap(&mut nodes, i, end, GroupKind::Identifier);
            }
        }
        i += 1;
    }
    nodes
}

fn alias_end(nodes: &[Node], start: usize) -> Option<usize> {
    let next = next_significant(nodes, start + 1)?;
    if nodes[next].is_keyword(Keyword::AS) {
        let alias = next_significant(nodes, next + 1)?;
        return is_name_like(&nodes[alias]).then_some(alias);
    }
    // Implicit aliases need whitespace between operand and alias.
    (next > start + 1 && is_name_like(&nodes[next])).then_some(next)
}

/// `operand <cmp> operand`.
fn group_comparisons(mut nodes: Vec<Node>) -> Vec<Node> {
    let mut i = 0;
    while i < nodes.len() {
        if nodes[i].is_token_type(TokenTypeVariant::Comparison) {
            let left = prev_significant(&nodes, i).filter(|&left| is_operand(&nodes[left]));
            let right = next_significant(&nodes, i + 1).filter(|&right| is_operand(&nodes[right]));
            if let (Some(left), Some(right)) = (left, right) {
                wrap(&mut nodes, left, right, GroupKind::Comparison);
                i = left;
            }
        }
        i += 1;
    }
    nodes
}

/// `item (, item)+`.
fn group_identifier_lists(mut nodes: Vec<Node>) -> Vec<Node> {
    let mut i = 0;
    while i < nodes.len() {
        if is_list_item(&nodes[i]) {
            let mut end = i;
            while let Some(comma) = next_significant(&nodes, end + 1) {
                if !nodes[comma].is_punctuation(",") {
                    break;
                }
                match next_significant(&nodes, comma + 1) {
                    Some(item) if is_list_item(&nodes[item]) => end = item,
                    _ => break,
                }
            }
            if end > i {
                wrap(&mut nodes, i, end, GroupKind::IdentifierList);
            }
        }
        i += 1;
    }
    nodes
}

fn ends_where(node: &Node) -> bool {
    match node.as_token().map(|token| &token.kind) {
        Some(TokenType::Keyword(keyword)) => closes_where(*keyword),
        Some(TokenType::Punctuation) => node.is_punctuation(";"),
        _ => false,
    }
}

/// `WHERE ...` up to the next clause keyword or `;`.
fn group_where(mut nodes: Vec<Node>) -> Vec<Node> {
    let mut search_from = 0;
    while let Some(offset) = nodes[search_from..]
        .iter()
        .position(|node| node.is_keyword(Keyword::WHERE))
    {
        let start = search_from + offset;
        let end = (start + 1..nodes.len())
            .find(|&i| ends_where(&nodes[i]))
            .unwrap_or(nodes.len());
        wrap(&mut nodes, start, end - 1, GroupKind::Where);
        search_from = start + 1;
    }
    nodes
}

/// Parses every statement in `sql`. Fails when the input holds no statement
/// at all (empty, whitespace, comments or bare `;`).
pub fn parse_sql(sql: &str) -> anyhow::Result<Vec<Statement>> {
    log::debug!("Parsing {}", sql.chars().take(50).collect::<String>());

    let mut scanner = Scanner::new(sql);
    scanner.scan();

    log::trace!("Tokens:");
    scanner
        .tokens()
        .iter()
        .for_each(|tok| log::trace!("{} {:?}", tok.variant().variant_str(), tok.lexeme));

    let mut parser = Parser::new(scanner.tokens());
    let statements = parser.parse();
    if statements.is_empty() {
        return Err(anyhow!("No statement found in SQL input."));
    }
    log::debug!("Parsed {} statement(s)", statements.len());
    Ok(statements)
}

/// Parses the first statement in `sql`, discarding any that follow.
pub fn parse_first_statement(sql: &str) -> anyhow::Result<Statement> {
    let mut statements = parse_sql(sql)?.into_iter();
    let statement = statements
        .next()
        .ok_or_else(|| anyhow!("No statement found in SQL input."))?;
    let discarded = statements.count();
    if discarded > 0 {
        log::debug!("Discarding {} statement(s) after the first", discarded);
    }
    Ok(statement)
}
