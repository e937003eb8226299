use anyhow::anyhow;
use serde::Deserialize;

pub const PARSING_TESTS_FILE: &str = "tests/parsing_tests.toml";
pub const ANONYMIZING_TESTS_FILE: &str = "tests/anonymizing_tests.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsing {
    pub sql: String,
    pub statements: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsingData {
    pub tests: Vec<TestParsing>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestAnonymizing {
    pub sql: String,
    /// Names expected as keys of the name map.
    pub anonymized: Vec<String>,
    /// Fragments expected verbatim in the anonymized SQL.
    pub preserved: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestAnonymizingData {
    pub tests: Vec<TestAnonymizing>,
}

pub fn load_test_data<T: for<'de> Deserialize<'de>>(path: &str) -> anyhow::Result<T> {
    let test_file = std::fs::read_to_string(path)
        .map_err(|err| anyhow!("Cannot open test cases in {}: {}", path, err))?;
    toml::from_str(&test_file)
        .map_err(|err| anyhow!("Cannot parse test cases defined in {}: {}", path, err))
}
