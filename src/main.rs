use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, error::ErrorKind};
use jsonlpq::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_ROWS_PER_ROW_GROUP, DEFAULT_PAGE_BUFFER_SIZE,
    DEFAULT_SAMPLE_SIZE,
};
use jsonlpq::io::compression::auto_detect_reader;
use jsonlpq::{
    Codec, ConvertConfig, Strategy, WriterConfig, convert, infer_schema, project_file,
    write_projection,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert between JSON Lines and Parquet.
///
/// With no FILE, reads JSON Lines from stdin and writes Parquet.
/// With FILE, reads that Parquet file and writes JSON Lines.
#[derive(Parser, Debug)]
#[command(name = "jsonlpq", version, about, long_about, disable_version_flag = true)]
struct Cli {
    /// Parquet file to convert to JSON Lines. Conversion flags only apply
    /// without it.
    file: Option<PathBuf>,

    /// Number of rows to read from the beginning
    #[arg(long, default_value_t = 0, conflicts_with = "tail")]
    head: usize,

    /// Number of rows to read from the end
    #[arg(long, default_value_t = 0)]
    tail: usize,

    /// Output path; stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Compression codec: none, snappy, gzip or zstd
    #[arg(long, default_value_t = Codec::Zstd, conflicts_with = "file")]
    compression: Codec,

    /// Data page size limit in bytes
    #[arg(long, default_value_t = DEFAULT_PAGE_BUFFER_SIZE, conflicts_with = "file")]
    page_buffer_size: usize,

    /// Maximum rows per row group
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS_PER_ROW_GROUP, conflicts_with = "file")]
    max_rows_per_row_group: usize,

    /// Data page format version
    #[arg(
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(1..=2),
        conflicts_with = "file"
    )]
    data_page_version: u8,

    /// Disable dictionary encoding
    #[arg(long, conflicts_with = "file")]
    no_dictionary: bool,

    /// Infer the schema from a sample and spill input to disk instead of buffering it
    #[arg(long, conflicts_with = "file")]
    streaming: bool,

    /// Rows sampled for schema inference with --streaming
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE, conflicts_with = "file")]
    sample_size: usize,

    /// Rows per write batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, conflicts_with = "file")]
    batch_size: usize,

    /// Directory for the temporary spill file used by --streaming
    #[arg(long, conflicts_with = "file")]
    spill_dir: Option<PathBuf>,

    /// Print the inferred schema as JSON instead of writing Parquet
    #[arg(long, conflicts_with = "file")]
    infer_schema: bool,
}

impl Cli {
    fn convert_config(&self) -> ConvertConfig {
        ConvertConfig {
            strategy: if self.streaming {
                Strategy::Sampled
            } else {
                Strategy::Buffered
            },
            sample_size: self.sample_size,
            batch_size: self.batch_size,
            spill_dir: self.spill_dir.clone(),
            writer: WriterConfig {
                compression: self.compression,
                page_buffer_size: self.page_buffer_size,
                max_rows_per_row_group: self.max_rows_per_row_group,
                data_page_version: self.data_page_version,
                use_dictionary: !self.no_dictionary,
            },
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.file.is_none() && (cli.head > 0 || cli.tail > 0) {
        Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--head and --tail can only be used when reading a parquet file",
            )
            .exit();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(file) = &cli.file {
        return to_json(file, cli);
    }
    let input = auto_detect_reader(std::io::stdin()).context("open stdin")?;
    let config = cli.convert_config();
    if cli.infer_schema {
        let schema = infer_schema(input, &config).context("infer schema")?;
        let mut out = open_text_output(cli.output.as_deref())?;
        serde_json::to_writer_pretty(&mut out, &schema).context("serialize schema")?;
        writeln!(out)?;
        out.flush()?;
        return Ok(());
    }
    match &cli.output {
        Some(path) => to_parquet_file(input, path, &config),
        None => {
            let stdout = BufWriter::new(std::io::stdout());
            convert(input, stdout, &config).context("convert JSON Lines to parquet")?;
            Ok(())
        }
    }
}

/// Write the table to a temporary sibling of `path` and rename it into place
/// only once the conversion has succeeded.
fn to_parquet_file(input: impl std::io::Read, path: &Path, config: &ConvertConfig) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".jsonlpq-")
        .suffix(".parquet.partial")
        .tempfile_in(dir)
        .with_context(|| format!("create temporary output in {}", dir.display()))?;
    convert(input, BufWriter::new(tmp.as_file_mut()), config)
        .context("convert JSON Lines to parquet")?;
    tmp.persist(path)
        .with_context(|| format!("create output file {}", path.display()))?;
    Ok(())
}

fn to_json(file: &Path, cli: &Cli) -> Result<()> {
    let rows = project_file(file, cli.head, cli.tail)
        .with_context(|| format!("read parquet file {}", file.display()))?;
    let out = open_text_output(cli.output.as_deref())?;
    write_projection(&rows, out).context("write JSON Lines")?;
    Ok(())
}

fn open_text_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            std::fs::File::create(p).with_context(|| format!("create {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("jsonlpq").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reading_a_file_keeps_default_conversion_settings() {
        let cli = parse(&["table.parquet", "--tail", "5", "-o", "out.jsonl"]).unwrap();
        assert_eq!(cli.tail, 5);
        assert_eq!(cli.convert_config(), ConvertConfig::default());
    }

    #[test]
    fn conversion_flags_conflict_with_file() {
        let flags: [&[&str]; 5] = [
            &["--infer-schema"],
            &["--streaming"],
            &["--sample-size", "10"],
            &["--compression", "gzip"],
            &["--spill-dir", "/tmp"],
        ];
        for flag in flags {
            let args = [&["table.parquet"][..], flag].concat();
            let err = parse(&args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict, "{flag:?}");
        }
    }

    #[test]
    fn head_conflicts_with_tail() {
        let err = parse(&["table.parquet", "--head", "1", "--tail", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn conversion_flags_map_onto_config() {
        let cli = parse(&[
            "--streaming",
            "--sample-size",
            "7",
            "--compression",
            "snappy",
            "--data-page-version",
            "1",
            "--no-dictionary",
        ])
        .unwrap();
        let config = cli.convert_config();
        assert_eq!(config.strategy, Strategy::Sampled);
        assert_eq!(config.sample_size, 7);
        assert_eq!(config.writer.compression, Codec::Snappy);
        assert_eq!(config.writer.data_page_version, 1);
        assert!(!config.writer.use_dictionary);
    }
}
