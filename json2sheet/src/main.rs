use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use sheetjson_core::{FileType, JsonToExcelConverter, WriteOptions};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "json2sheet")]
#[command(about = "Convert JSON documents to Excel workbooks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the JSON document, or - for stdin
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output workbook (.xlsx)
    #[arg(short, long, value_name = "OUT")]
    output: PathBuf,

    /// Write rows with constant memory usage
    #[arg(long)]
    streaming: bool,

    /// Autofit columns: 0 off, N > 0 after the first N rows, N < 0 at sheet end
    #[arg(long, value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    auto_size_columns: i32,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_type = FileType::from_path(&cli.output).unwrap_or(FileType::Xlsx);
    let options = WriteOptions {
        streaming: cli.streaming,
        auto_size_columns: cli.auto_size_columns,
    };

    let input = open_input(&cli.file)?;

    // Render in memory so a failed conversion leaves no partial workbook
    let mut rendered = Vec::new();
    JsonToExcelConverter::new(options)
        .convert(input, &mut rendered, file_type)
        .with_context(|| format!("Failed to convert {}", cli.file.display()))?;

    fs::write(&cli.output, &rendered)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!("Wrote {}", cli.output.display());
    Ok(())
}
