use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use sheetjson_core::config::parse_assignment;
use sheetjson_core::{ConversionParameters, ExcelToJsonConverter, FileType, ReadOptions};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheet2json")]
#[command(about = "Convert Excel workbooks (xlsx/xlsb) to JSON", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel file to convert
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Path to parameters file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Conversion parameter, e.g. Sheet1.headerRows=2 (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    params: Vec<(String, String)>,

    /// Input file type
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    file_type: InputType,

    /// Emit integers, floats and booleans instead of strings where possible
    #[arg(long)]
    autodetect_types: bool,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputType {
    /// Use the file extension
    Auto,
    Xlsx,
    Xlsb,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_parameters(cli: &Cli) -> Result<ConversionParameters> {
    let mut parameters = match &cli.config {
        Some(config_path) => ConversionParameters::from_file(config_path)
            .with_context(|| format!("Failed to load parameters from {}", config_path.display()))?,
        None => {
            // Pick up a parameters file from the current directory if there is one
            let default_config_path = PathBuf::from("sheet2json.toml");
            if default_config_path.exists() {
                ConversionParameters::from_file(&default_config_path).with_context(|| {
                    format!(
                        "Failed to load parameters from {}",
                        default_config_path.display()
                    )
                })?
            } else {
                ConversionParameters::new()
            }
        }
    };

    // Command-line parameters override the file
    parameters.extend(cli.params.iter().cloned());
    Ok(parameters)
}

fn resolve_file_type(file_type: InputType, path: &Path) -> Result<FileType> {
    match file_type {
        InputType::Xlsx => Ok(FileType::Xlsx),
        InputType::Xlsb => Ok(FileType::Xlsb),
        InputType::Auto => FileType::from_path(path).with_context(|| {
            format!(
                "Cannot detect the file type of {} (use --type xlsx|xlsb)",
                path.display()
            )
        }),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let parameters = load_parameters(&cli)?;
    let file_type = resolve_file_type(cli.file_type, &cli.file)?;
    let options = ReadOptions {
        autodetect_types: cli.autodetect_types,
        pretty_printing: cli.pretty,
    };

    let input = File::open(&cli.file)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;

    // Render in memory so a failed conversion leaves no partial output
    let mut rendered = Vec::new();
    ExcelToJsonConverter::new(parameters, options)
        .convert(BufReader::new(input), &mut rendered, file_type)
        .with_context(|| format!("Failed to convert {}", cli.file.display()))?;

    match &cli.output {
        Some(output_path) => fs::write(output_path, &rendered)
            .with_context(|| format!("Failed to write {}", output_path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
