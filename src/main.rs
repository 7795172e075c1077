//!
//! pgdoc binary
//! ------------
//! Command-line front end: connects to a PostgreSQL instance, loads one
//! catalog snapshot and renders schema reference documentation to stdout or
//! to one file per schema plus an index.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pgdoc::error::DocResult;
use pgdoc::model::Database;
use pgdoc::report::{self, ReportOptions};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--connect <dsn>] [--out <dir>] [--tables] [--functions] [schema...]\n\nFlags:\n  -c, --connect <dsn>      Postgres connection string (default: $PGDOC_DSN or $DATABASE_URL)\n  -o, --out <dir>          Write one <schema>.rst per schema plus index.rst under <dir>;\n                           without this flag all output goes to stdout\n  --tables                 Emit only the tables fragment\n  --functions              Emit only the functions fragment\n  -h, --help               Show this help\n\nArguments:\n  schema...                Explicit schema names, documented in the order given.\n                           Default: every schema not in the system exclusion list.\n\nExamples:\n  {program} --connect postgres://postgres@localhost:5432/minerva\n  {program} -c postgres://postgres@localhost/minerva --out doc/schemas trend attribute\n  {program} --functions public"
    );
}

struct Args {
    dsn: Option<String>,
    out_dir: Option<String>,
    tables: bool,
    functions: bool,
    schemas: Vec<String>,
}

fn parse_args(program: &str, args: Vec<String>) -> Result<Option<Args>> {
    let mut parsed = Args { dsn: None, out_dir: None, tables: false, functions: false, schemas: Vec::new() };
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--connect" | "-c" => {
                i += 1;
                parsed.dsn = Some(args.get(i).context("--connect requires a value")?.clone());
            }
            "--out" | "-o" => {
                i += 1;
                parsed.out_dir = Some(args.get(i).context("--out requires a value")?.clone());
            }
            "--tables" => parsed.tables = true,
            "--functions" => parsed.functions = true,
            "-h" | "--help" => {
                print_usage(program);
                return Ok(None);
            }
            other if other.starts_with('-') => {
                print_usage(program);
                anyhow::bail!("unknown flag: {}", other);
            }
            schema => parsed.schemas.push(schema.to_string()),
        }
        i += 1;
    }
    Ok(Some(parsed))
}

async fn generate(dsn: &str, opts: &ReportOptions) -> DocResult<()> {
    use tokio_postgres::{Config, NoTls};
    let cfg: Config = dsn
        .parse()
        .map_err(|e| pgdoc::error::DocError::connect("bad_dsn", format!("invalid postgres url: {}", e)))?;
    let (client, conn) = cfg
        .connect(NoTls)
        .await
        .map_err(|e| pgdoc::error::DocError::connect("connect_failed", e.to_string()))?;
    // drive the connection in background; it ends when the client is dropped
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            error!("connection error: {}", e);
        }
    });

    let db = Database::load(&client).await?;
    report::run(&db, opts)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let parsed = match parse_args(&program, args)? {
        Some(p) => p,
        None => return Ok(()),
    };

    let dsn = parsed
        .dsn
        .or_else(|| env::var("PGDOC_DSN").ok())
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("no connection string: pass --connect or set PGDOC_DSN / DATABASE_URL")?;

    // Neither fragment flag means both fragments.
    let opts = ReportOptions {
        tables: parsed.tables || !parsed.functions,
        functions: parsed.functions || !parsed.tables,
        schemas: parsed.schemas,
        out_dir: parsed.out_dir.map(PathBuf::from),
    };

    info!(
        output = %opts.out_dir.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "stdout".to_string()),
        schemas = ?opts.schemas,
        tables = opts.tables,
        functions = opts.functions,
        "pgdoc starting"
    );

    if let Err(err) = generate(&dsn, &opts).await {
        error!("{}", err);
        std::process::exit(err.exit_code());
    }
    Ok(())
}
