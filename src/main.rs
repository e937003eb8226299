use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use indexmap::IndexMap;
use serde::Serialize;
use sqlanon::anonymizer::{AnonymizedSql, anonymize_sql};
use sqlanon::parser::parse_first_statement;
use std::time::Instant;

const DEMO_SQL: &str = "SELECT a, b FROM test WHERE a = 5";

#[derive(clap::Parser)]
#[command(name = "sqlanon")]
#[command(about = "SQL column name anonymizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize the first statement of one or more SQL files.
    Anonymize(AnonymizeCommand),
    /// Print the syntax tree of the first statement of a SQL file.
    Parse(ParseCommand),
    /// Anonymize a fixed demonstration query.
    Demo,
}

#[derive(clap::Args)]
struct AnonymizeCommand {
    /// Path to the SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct ParseCommand {
    /// Path to the SQL file.
    #[arg(value_name = "SQL_FILE")]
    sql: PathBuf,
    /// Pretty-print the output tree.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutAnonymized {
    Ok(AnonymizedSql),
    ErrAnonymized { error: String },
}

fn read_sql_file(sql_file_path: &PathBuf) -> anyhow::Result<String> {
    std::fs::read_to_string(sql_file_path).map_err(|_| {
        anyhow!(
            "Failed to read sql file {}",
            sql_file_path.display().to_string()
        )
    })
}

fn output_anonymized(sql_file_path: &PathBuf) -> anyhow::Result<OutAnonymized> {
    let sql = read_sql_file(sql_file_path)?;
    let out_anonymized = match anonymize_sql(&sql) {
        Ok(anonymized) => OutAnonymized::Ok(anonymized),
        Err(err) => OutAnonymized::ErrAnonymized {
            error: format!(
                "Could not anonymize SQL in file {} due to error: {}",
                sql_file_path.display(),
                err
            ),
        },
    };
    Ok(out_anonymized)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let out_str = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out_str)
}

fn run_anonymize(anonymize_command: &AnonymizeCommand) -> anyhow::Result<String> {
    let sql_file_or_dir = &anonymize_command.sql;
    if sql_file_or_dir.is_dir() {
        let mut file_outputs: IndexMap<String, OutAnonymized> = IndexMap::new();
        let sql_in_dir: Vec<_> = std::fs::read_dir(sql_file_or_dir)?
            .filter_map(|res| res.ok())
            .map(|entry| entry.path())
            .filter(|file| file.extension().is_some_and(|ext| ext == "sql"))
            .collect();

        for sql_file in sql_in_dir {
            let out_anonymized = output_anonymized(&sql_file)?;
            file_outputs.insert(
                std::path::absolute(sql_file)?.display().to_string(),
                out_anonymized,
            );
        }
        to_json(&file_outputs, anonymize_command.pretty)
    } else {
        to_json(
            &output_anonymized(sql_file_or_dir)?,
            anonymize_command.pretty,
        )
    }
}

fn run_demo() -> anyhow::Result<()> {
    let anonymized = anonymize_sql(DEMO_SQL)?;

    println!("Original SQL Query:");
    println!("{}", anonymized.original);
    println!("\nModified SQL Query:");
    println!("{}", anonymized.sql);
    println!("\nColumn Name Mapping:");
    println!("{}", serde_json::to_string_pretty(&anonymized.name_map)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Anonymize(anonymize_command) => {
            println!("{}", run_anonymize(anonymize_command)?);
        }
        Commands::Parse(parse_command) => {
            let sql = read_sql_file(&parse_command.sql)?;
            let statement = parse_first_statement(&sql)?;
            println!("{}", to_json(&statement, parse_command.pretty)?);
        }
        Commands::Demo => run_demo()?,
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
