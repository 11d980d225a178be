//! Extract command - derive line items from a single PDF file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use lineitem_core::{DocumentExtractor, EngineKind, ExtractionResult, LineitemConfig};

use crate::output::{default_file_name, format_result, OutputFormat};
use crate::translate::Translator;

use super::config::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Text engine (overrides pdf.engine)
    #[arg(short, long, value_enum)]
    engine: Option<EngineArg>,

    /// Translate descriptions to Chinese
    #[arg(long)]
    translate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum EngineArg {
    /// Layout-aware extraction (pdf-extract)
    PdfExtract,
    /// Content-stream text operators (lopdf)
    Lopdf,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::PdfExtract => EngineKind::PdfExtract,
            EngineArg::Lopdf => EngineKind::Lopdf,
        }
    }
}

/// Apply a command line engine override.
pub fn apply_engine(config: &mut LineitemConfig, engine: Option<EngineArg>) {
    if let Some(engine) = engine {
        config.pdf.engine = engine.into();
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_engine(&mut config, args.engine);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting text...");

    let extractor = DocumentExtractor::from_config(&config);
    let result = extract_file(&extractor, &args.input);
    pb.finish_and_clear();
    let mut result = result?;

    if result.text_was_empty() {
        warn!("No text content found in {}", args.input.display());
        eprintln!(
            "{} No text content found in PDF (scanned document?)",
            style("⚠").yellow()
        );
    }

    if args.translate {
        Translator::new(&config.translation)?
            .translate_result(&mut result)
            .await;
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        let target = resolve_output_path(output_path, args.format);
        fs::write(&target, &output)?;
        eprintln!(
            "{} {} items written to {}",
            style("✓").green(),
            result.len(),
            target.display()
        );
    } else {
        println!("{}", output);
    }

    debug!(
        "Processed {} pages in {}ms",
        result.page_count, result.processing_time_ms
    );

    Ok(())
}

/// Read and extract one file.
pub fn extract_file(extractor: &DocumentExtractor, path: &Path) -> anyhow::Result<ExtractionResult> {
    let data = fs::read(path)?;
    extractor
        .extract(&data)
        .map_err(|e| anyhow::anyhow!("Failed to process PDF {}: {}", path.display(), e))
}

/// A directory gets the dated default export name appended.
fn resolve_output_path(path: &Path, format: OutputFormat) -> PathBuf {
    if path.is_dir() {
        path.join(default_file_name(format, chrono::Local::now().date_naive()))
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_engine() {
        let mut config = LineitemConfig::default();
        apply_engine(&mut config, None);
        assert_eq!(config.pdf.engine, EngineKind::PdfExtract);

        apply_engine(&mut config, Some(EngineArg::Lopdf));
        assert_eq!(config.pdf.engine, EngineKind::Lopdf);
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = tempfile::tempdir().unwrap();

        let in_dir = resolve_output_path(dir.path(), OutputFormat::Csv);
        let name = in_dir.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("extracted_data_"));
        assert!(name.ends_with(".csv"));

        let file = dir.path().join("out.json");
        assert_eq!(resolve_output_path(&file, OutputFormat::Json), file);
    }
}
