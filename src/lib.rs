//! # sqlanon
//!
//! A library for anonymizing column references in SQL statements.
//!
//! # Features
//!
//! - Lossless scanning of SQL text: whitespace, comments and malformed input are kept verbatim.
//! - Grouping of tokens into parentheses, functions, identifiers, comparisons, lists and `WHERE` clauses.
//! - Replacement of bare column names with the lowercase hex SHA-256 of the name.
//! - Qualified (`t.c`), aliased (`c AS x`) and table references are left untouched.
//! - Returns the mapping from every replaced name to its digest.
//!
//! # Example
//!
//! ```rust
//! use sqlanon::anonymizer::{anonymize, hash_name};
//! use sqlanon::parser::parse_first_statement;
//! use sqlanon::serializer::rebuild_sql;
//!
//! fn main() -> anyhow::Result<()> {
//!     let sql = "SELECT a, b FROM test WHERE a = 5";
//!     let statement = parse_first_statement(sql)?;
//!     let anonymized = anonymize(statement);
//!
//!     let hashed_sql = rebuild_sql(&anonymized.statement.nodes);
//!     assert_ne!(hashed_sql, sql);
//!     assert_eq!(anonymized.name_map["a"], hash_name("a"));
//!     assert_eq!(anonymized.name_map.len(), 2);
//!     println!("{}", hashed_sql);
//!     Ok(())
//! }
//! ```
pub mod anonymizer;
pub mod ast;
pub mod parser;
pub mod scanner;
pub mod serializer;
#[doc(hidden)]
pub mod test_utils;
