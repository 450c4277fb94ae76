use std::{fs, io::Write, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use pson::{Encoder, Renderer};
use tbl::{CellType, FileTable, Table, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(
        long,
        global = true,
        value_enum,
        default_value = "warn",
        help = "Log level (error, warn, info, debug, trace)"
    )]
    log_level: LogLevel,
}

#[derive(Subcommand, Clone)]
enum Commands {
    #[command(about = "Print the header of a table file")]
    Info(FileArgs),
    #[command(about = "Print every row of a table file")]
    Dump(FileArgs),
    #[command(about = "Print a table file as delimiter separated text")]
    Csv(CsvArgs),
    #[command(about = "Create a table file, or keep it if the schema matches")]
    Init(InitArgs),
    #[command(about = "Append one row to a table file")]
    Append(AppendArgs),
    #[command(about = "Drop every row from a table file")]
    Clear(FileArgs),
    #[command(about = "Encode the rows of a table file as a packed value stream")]
    Pack(PackArgs),
    #[command(about = "Render a packed value stream as JSON")]
    Render(RenderArgs),
}

#[derive(clap::Args, Clone, Debug)]
struct FileArgs {
    #[clap(help = "Path to the table file")]
    path: PathBuf,
}

#[derive(clap::Args, Clone, Debug)]
struct CsvArgs {
    #[clap(help = "Path to the table file")]
    path: PathBuf,
    #[clap(long, short, default_value = ";", help = "Column separator")]
    separator: char,
    #[clap(long, short, default_value = "2", help = "Digits printed after the decimal point")]
    decimals: usize,
}

#[derive(clap::Args, Clone, Debug)]
struct InitArgs {
    #[clap(help = "Path to the table file")]
    path: PathBuf,
    #[clap(
        long,
        short,
        required = true,
        value_delimiter = ',',
        help = "Column types, e.g. 'uint32,float,char16'"
    )]
    columns: Vec<CellType>,
}

#[derive(clap::Args, Clone, Debug)]
struct AppendArgs {
    #[clap(help = "Path to the table file")]
    path: PathBuf,
    #[clap(
        help = "One value per column, in column order. Char columns take a single character as itself and longer input as a byte value ('5' stores '5', '65' stores 'A')"
    )]
    values: Vec<String>,
    #[clap(long, help = "Evict the oldest rows beyond this count")]
    max_rows: Option<u16>,
}

#[derive(clap::Args, Clone, Debug)]
struct PackArgs {
    #[clap(help = "Path to the table file")]
    path: PathBuf,
    #[clap(help = "Path for the packed output")]
    output: PathBuf,
}

#[derive(clap::Args, Clone, Debug)]
struct RenderArgs {
    #[clap(help = "Path to a packed value stream")]
    path: PathBuf,
    #[clap(long, help = "Indent nested containers")]
    pretty: bool,
    #[clap(long, help = "Fail on malformed streams instead of rendering what fits")]
    checked: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() -> miette::Result<()> {
    let args = Cli::parse();
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        let level = args.log_level.as_str();
        EnvFilter::builder().parse_lossy(format!("tbl={level},pson={level}"))
    };

    let _ = tracing_subscriber::fmt::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .try_init();

    let mut stdout = std::io::stdout().lock();
    match args.command {
        Commands::Info(FileArgs { path }) => {
            let info = FileTable::new(path).info()?;
            let types = info
                .types
                .iter()
                .map(|ty| ty.to_string())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(stdout, "columns: {}", info.cols).into_diagnostic()?;
            writeln!(stdout, "rows: {}", info.rows).into_diagnostic()?;
            writeln!(stdout, "types: {types}").into_diagnostic()?;
            writeln!(stdout, "stride: {}", info.layout()?.stride()).into_diagnostic()?;
        }
        Commands::Dump(FileArgs { path }) => {
            let mut out = String::new();
            FileTable::new(path).dump(&mut out)?;
            stdout.write_all(out.as_bytes()).into_diagnostic()?;
        }
        Commands::Csv(CsvArgs {
            path,
            separator,
            decimals,
        }) => {
            let table = FileTable::new(path).load()?;
            writeln!(stdout, "{}", table.to_csv(separator, decimals)?).into_diagnostic()?;
        }
        Commands::Init(InitArgs { path, columns }) => {
            FileTable::new(&path).init(&columns)?;
            info!(?path, cols = columns.len(), "table ready");
        }
        Commands::Append(AppendArgs {
            path,
            values,
            max_rows,
        }) => {
            let mut file = FileTable::new(path);
            file.set_max_rows(max_rows);
            let info = file.info()?;
            if values.len() > info.types.len() {
                return Err(miette::miette!(
                    "{} values given for {} columns",
                    values.len(),
                    info.types.len()
                ));
            }
            let values = info
                .types
                .iter()
                .zip(&values)
                .map(|(ty, input)| ty.parse_value(input))
                .collect::<Result<Vec<_>, _>>()?;
            file.append(&values)?;
        }
        Commands::Clear(FileArgs { path }) => FileTable::new(path).remove_all()?,
        Commands::Pack(PackArgs { path, output }) => {
            let table = FileTable::new(path).load()?;
            let packed = pack(&table)?;
            fs::write(&output, packed.as_bytes()).into_diagnostic()?;
            info!(?output, bytes = packed.len(), rows = table.rows(), "packed table");
        }
        Commands::Render(RenderArgs {
            path,
            pretty,
            checked,
        }) => {
            let bytes = fs::read(path).into_diagnostic()?;
            let text = Renderer::new()
                .pretty(pretty)
                .checked(checked)
                .render_to_string(&bytes)?;
            writeln!(stdout, "{text}").into_diagnostic()?;
        }
    }
    Ok(())
}

/// Encodes a table as an array of row arrays.
fn pack(table: &Table) -> miette::Result<Encoder> {
    let mut enc = Encoder::with_capacity(table.write_size());
    enc.open_array();
    for row in table {
        enc.open_array();
        for cell in row.cells() {
            match cell.value()? {
                Value::Int(v) => enc.int(v),
                Value::Uint(v) if cell.cell_type() == CellType::Char => {
                    enc.str(&char::from(v as u8).to_string())
                }
                Value::Uint(v) => enc.uint(v),
                Value::Float(v) => enc.double(v, 2),
                Value::Str(s) => enc.str(s),
            };
        }
        enc.close_array();
    }
    enc.close_array();
    Ok(enc)
}
