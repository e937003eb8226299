use sqlanon::{
    ast::{GroupKind, Keyword, Node, Statement, TokenType},
    parser::{parse_first_statement, parse_sql},
    scanner::scan_sql,
    test_utils::{PARSING_TESTS_FILE, TestParsingData, load_test_data},
};

fn test_sql(sql: &str, expected_statements: usize) {
    let statements = parse_sql(sql)
        .unwrap_or_else(|err| panic!("Could not parse sql due to: {:?}", &err));
    assert_eq!(statements.len(), expected_statements);

    let rebuilt: String = statements.iter().map(Statement::to_string).collect();
    assert_eq!(rebuilt, sql);

    if expected_statements == 1 {
        let leaves: Vec<&str> = statements[0]
            .leaves()
            .into_iter()
            .map(|tok| tok.lexeme.as_str())
            .collect();
        let tokens = scan_sql(sql);
        let lexemes: Vec<&str> = tokens.iter().map(|tok| tok.lexeme.as_str()).collect();
        assert_eq!(leaves, lexemes);
    }
}

#[test]
fn test_should_parse() {
    let test_parsing_data: TestParsingData =
        load_test_data(PARSING_TESTS_FILE).expect("Cannot load parsing test cases");

    for test in test_parsing_data.tests {
        let sql = &test.sql;
        println!("Testing parsing for SQL: {}", sql);
        test_sql(sql, test.statements);
        test_sql(&sql.to_uppercase(), test.statements);
        test_sql(&sql.to_lowercase(), test.statements);
    }
}

fn group_kind(node: &Node) -> Option<GroupKind> {
    node.as_group().map(|group| group.kind)
}

#[test]
fn test_groups_demo_query() {
    let statement = parse_first_statement("SELECT a, b FROM test WHERE a = 5").unwrap();
    let kinds: Vec<Option<GroupKind>> = statement.nodes.iter().map(group_kind).collect();
    assert_eq!(
        kinds,
        vec![
            None,
            None,
            Some(GroupKind::IdentifierList),
            None,
            None,
            None,
            Some(GroupKind::Identifier),
            None,
            Some(GroupKind::Where),
        ]
    );

    let list = statement.nodes[2].as_group().unwrap();
    assert!(list.children[0].is_name_token());
    assert!(list.children[3].is_name_token());

    let where_clause = statement.nodes[8].as_group().unwrap();
    assert!(
        where_clause
            .children
            .iter()
            .any(|child| child.is_group(GroupKind::Comparison))
    );
}

#[test]
fn test_qualified_and_aliased_identifiers() {
    let statement = parse_first_statement("SELECT t.a AS x FROM t").unwrap();
    let aliased = statement.nodes[2].as_group().unwrap();
    assert_eq!(aliased.kind, GroupKind::Identifier);
    assert!(aliased.children[0].is_identifier());
    assert_eq!(aliased.children[0].to_string(), "t.a");
    assert_eq!(aliased.to_string(), "t.a AS x");
}

#[test]
fn test_implicit_alias() {
    let statement = parse_first_statement("SELECT x FROM orders o").unwrap();
    let table = statement.nodes.last().unwrap().as_group().unwrap();
    assert_eq!(table.kind, GroupKind::Identifier);
    assert!(table.children[0].is_identifier());
    assert!(table.children.last().unwrap().is_name_token());
}

#[test]
fn test_function_grouping() {
    let statement = parse_first_statement("SELECT count(a) FROM t").unwrap();
    let function = statement.nodes[2].as_group().unwrap();
    assert_eq!(function.kind, GroupKind::Function);
    assert!(function.children[0].is_identifier());
    assert!(function.children[1].is_group(GroupKind::Parenthesis));
    assert_eq!(function.to_string(), "count(a)");
}

#[test]
fn test_table_references_in_from_list() {
    let statement = parse_first_statement("SELECT a FROM s.t1, t2 WHERE a = 1").unwrap();
    let list = statement.nodes[6].as_group().unwrap();
    assert_eq!(list.kind, GroupKind::IdentifierList);
    let tables: Vec<String> = list
        .children
        .iter()
        .filter(|child| child.is_identifier())
        .map(Node::to_string)
        .collect();
    assert_eq!(tables, vec!["s.t1", "t2"]);
}

#[test]
fn test_column_definitions_are_not_aliases() {
    let statement = parse_first_statement("CREATE TABLE p (id INT)").unwrap();
    let parenthesis = statement.nodes.last().unwrap().as_group().unwrap();
    assert_eq!(parenthesis.kind, GroupKind::Parenthesis);
    assert!(parenthesis.children[1].is_name_token());
}

#[test]
fn test_unclosed_parenthesis_extends_to_end() {
    let sql = "SELECT a FROM t WHERE (b = 1";
    let statement = parse_first_statement(sql).unwrap();
    assert_eq!(statement.to_string(), sql);
    let where_clause = statement.nodes.last().unwrap().as_group().unwrap();
    assert_eq!(where_clause.kind, GroupKind::Where);
    assert!(
        where_clause
            .children
            .last()
            .unwrap()
            .is_group(GroupKind::Parenthesis)
    );
}

#[test]
fn test_where_stops_at_clause_keyword() {
    let statement = parse_first_statement("SELECT a FROM t WHERE a > 1 ORDER BY a").unwrap();
    let where_clause = statement
        .nodes
        .iter()
        .find(|node| node.is_group(GroupKind::Where))
        .unwrap();
    assert_eq!(where_clause.to_string(), "WHERE a > 1 ");
}

#[test]
fn test_multiple_statements() {
    let statements = parse_sql("SELECT 1; SELECT 2").unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].to_string(), "SELECT 1;");
    assert_eq!(statements[1].to_string(), " SELECT 2");

    let first = parse_first_statement("SELECT 1; SELECT 2").unwrap();
    assert_eq!(first, statements[0]);
}

#[test]
fn test_lone_semicolons_are_skipped() {
    let statement = parse_first_statement("; SELECT a FROM t").unwrap();
    assert_eq!(statement.to_string(), " SELECT a FROM t");

    let statements = parse_sql("SELECT a FROM t;\n;\nSELECT b FROM u").unwrap();
    let sqls: Vec<String> = statements.iter().map(Statement::to_string).collect();
    assert_eq!(sqls, vec!["SELECT a FROM t;", "\nSELECT b FROM u"]);
}

#[test]
fn test_keywords_read_as_names() {
    let statement = parse_first_statement("SELECT name, count(*) FROM data").unwrap();
    let list = statement.nodes[2].as_group().unwrap();
    assert_eq!(list.kind, GroupKind::IdentifierList);
    assert!(list.children[0].is_name_token());
    assert!(list.children[3].is_group(GroupKind::Function));
    let table = statement.nodes.last().unwrap();
    assert!(table.is_identifier());
    assert_eq!(table.to_string(), "data");
}

#[test]
fn test_keywords_stay_keywords() {
    let sql = "SELECT a FROM t ORDER BY a NULLS FIRST";
    let statement = parse_first_statement(sql).unwrap();
    let last = statement.nodes.last().unwrap().as_token().unwrap();
    assert_eq!(last.kind, TokenType::Keyword(Keyword::FIRST));

    let statement = parse_first_statement("SELECT EXTRACT(YEAR FROM d) FROM t").unwrap();
    let function = statement.nodes[2].as_group().unwrap();
    assert_eq!(function.kind, GroupKind::Function);
    let args = function.children[1].as_group().unwrap();
    assert!(args.children[1].is_keyword(Keyword::YEAR));
    assert!(args.children.iter().all(|child| !child.is_identifier()));
}

#[test]
fn test_cte_names_are_identifiers() {
    let sql = "WITH c1 AS (SELECT a FROM t), c2 AS (SELECT b FROM c1) SELECT b FROM c2";
    let statement = parse_first_statement(sql).unwrap();
    assert!(statement.nodes[2].is_identifier());
    assert_eq!(statement.nodes[2].to_string(), "c1");
    let ctes: Vec<String> = statement
        .leaves()
        .into_iter()
        .filter(|tok| tok.lexeme.starts_with('c'))
        .map(|tok| tok.lexeme.clone())
        .collect();
    assert_eq!(ctes, vec!["c1", "c2", "c1", "c2"]);
    let list = statement.nodes[6].as_group().unwrap();
    assert_eq!(list.kind, GroupKind::IdentifierList);
    assert!(list.children.last().unwrap().is_identifier());
}

#[test]
fn test_from_outside_clause_is_not_a_table() {
    let statement = parse_first_statement("SELECT a FROM t WHERE a IS DISTINCT FROM b").unwrap();
    let where_clause = statement.nodes.last().unwrap().as_group().unwrap();
    assert_eq!(where_clause.kind, GroupKind::Where);
    assert!(where_clause.children.last().unwrap().is_name_token());
}

#[test]
fn test_should_not_parse() {
    let sqls = ["", "   ", "\n\t\n", "-- only a comment", "/* block */ ", ";", " ; ;\n"];
    for sql in sqls {
        println!("Testing parsing error for SQL: {:?}", sql);
        let err = parse_sql(sql).unwrap_err();
        assert!(err.to_string().contains("No statement found"));
        let err = parse_first_statement(sql).unwrap_err();
        assert!(err.to_string().contains("No statement found"));
    }
}

#[test]
fn test_tree_serializes_to_json() {
    let statement = parse_first_statement("SELECT a FROM t").unwrap();
    let json = serde_json::to_string(&statement).unwrap();
    let back: Statement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, statement);
}
