use sqlanon::{
    ast::{Keyword, Token, TokenType},
    scanner::scan_sql,
};

fn significant(tokens: &[Token]) -> Vec<(TokenType, &str)> {
    tokens
        .iter()
        .filter(|tok| !tok.is_whitespace())
        .map(|tok| (tok.kind.clone(), tok.lexeme.as_str()))
        .collect()
}

#[test]
fn test_scanning_is_lossless() {
    let sqls = [
        "SELECT a, b FROM test WHERE a = 5",
        "select\r\n\t*  from t -- trailing",
        "SELECT 'it''s', \"col\"\"x\", `b` FROM t /* c */ WHERE x <> 1e-3",
        "SELECT 'unterminated",
        "SELECT a ! b § c",
        "/* unterminated comment",
        "SELECT é, ß FROM données",
    ];
    for sql in sqls {
        let rebuilt: String = scan_sql(sql).iter().map(|tok| tok.lexeme.as_str()).collect();
        assert_eq!(rebuilt, sql);
    }
}

#[test]
fn test_token_classification() {
    let tokens = scan_sql("SELECT a, \"B\" FROM t WHERE c >= 1.5 -- x");
    assert_eq!(
        significant(&tokens),
        vec![
            (TokenType::Keyword(Keyword::SELECT), "SELECT"),
            (TokenType::Name, "a"),
            (TokenType::Punctuation, ","),
            (TokenType::QuotedName, "\"B\""),
            (TokenType::Keyword(Keyword::FROM), "FROM"),
            (TokenType::Name, "t"),
            (TokenType::Keyword(Keyword::WHERE), "WHERE"),
            (TokenType::Name, "c"),
            (TokenType::Comparison, ">="),
            (TokenType::Number, "1.5"),
        ]
    );
    assert_eq!(tokens.last().unwrap().kind, TokenType::Comment);
}

#[test]
fn test_keywords_are_case_insensitive() {
    for sql in ["select", "SELECT", "SeLeCt"] {
        assert_eq!(scan_sql(sql)[0].kind, TokenType::Keyword(Keyword::SELECT));
    }
}

#[test]
fn test_words_around_dots_are_names() {
    let tokens = scan_sql("order.select");
    assert_eq!(
        significant(&tokens),
        vec![
            (TokenType::Name, "order"),
            (TokenType::Punctuation, "."),
            (TokenType::Name, "select"),
        ]
    );
}

#[test]
fn test_builtin_types() {
    let tokens = scan_sql("id INT, name varchar");
    assert_eq!(tokens[2].kind, TokenType::Builtin);
    assert_eq!(tokens.last().unwrap().kind, TokenType::Builtin);
}

#[test]
fn test_placeholders() {
    let tokens = scan_sql("? :name $1 @var");
    let placeholders: Vec<&str> = significant(&tokens)
        .into_iter()
        .filter(|(kind, _)| *kind == TokenType::Placeholder)
        .map(|(_, lexeme)| lexeme)
        .collect();
    assert_eq!(placeholders, vec!["?", ":name", "$1", "@var"]);
}

#[test]
fn test_strings_and_escapes() {
    let tokens = scan_sql("'it''s' 'a\\'b'");
    assert_eq!(
        significant(&tokens),
        vec![(TokenType::String, "'it''s'"), (TokenType::String, "'a\\'b'")]
    );
}

#[test]
fn test_malformed_input_becomes_error_tokens() {
    let tokens = scan_sql("SELECT 'abc");
    let last = tokens.last().unwrap();
    assert_eq!(last.kind, TokenType::Error);
    assert_eq!(last.lexeme, "'abc");

    let tokens = scan_sql("a ! b");
    assert_eq!(tokens[2].kind, TokenType::Error);
    assert_eq!(tokens[2].lexeme, "!");

    let tokens = scan_sql("SELECT /* open");
    assert_eq!(tokens.last().unwrap().kind, TokenType::Error);
}

#[test]
fn test_token_positions() {
    let tokens = scan_sql("SELECT a\nFROM t");
    let a = tokens.iter().find(|tok| tok.lexeme == "a").unwrap();
    assert_eq!((a.line, a.col), (1, 8));
    let from = tokens.iter().find(|tok| tok.lexeme == "FROM").unwrap();
    assert_eq!((from.line, from.col), (2, 1));
}

#[test]
fn test_sql_vocabulary_is_keywords() {
    let tokens = scan_sql("nulls first current_date Interval RECURSIVE rows");
    let keywords: Vec<TokenType> = significant(&tokens)
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
    assert_eq!(
        keywords,
        vec![
            TokenType::Keyword(Keyword::NULLS),
            TokenType::Keyword(Keyword::FIRST),
            TokenType::Keyword(Keyword::CURRENT_DATE),
            TokenType::Keyword(Keyword::INTERVAL),
            TokenType::Keyword(Keyword::RECURSIVE),
            TokenType::Keyword(Keyword::ROWS),
        ]
    );
    assert_eq!(scan_sql("customer_id")[0].kind, TokenType::Name);
}
