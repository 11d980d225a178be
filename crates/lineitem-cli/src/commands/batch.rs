//! Batch processing command for multiple PDF files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use lineitem_core::{DocumentExtractor, ExtractionResult};

use crate::output::{format_result, OutputFormat};
use crate::translate::Translator;

use super::config::load_config;
use super::extract::{apply_engine, extract_file, EngineArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Text engine (overrides pdf.engine)
    #[arg(short, long, value_enum)]
    engine: Option<EngineArg>,

    /// Combine all items into one de-duplicated output
    #[arg(long)]
    merge: bool,

    /// Translate descriptions to Chinese
    #[arg(long)]
    translate: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_engine(&mut config, args.engine);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = DocumentExtractor::from_config(&config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = extract_file(&extractor, &path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                results.push(ProcessResult {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("{}", error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("{}", error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if args.translate {
        let mut translator = Translator::new(&config.translation)?;
        for entry in &mut results {
            if let Some(result) = &mut entry.result {
                translator.translate_result(result).await;
            }
        }
    }

    let merged = args
        .merge
        .then(|| ExtractionResult::merge(results.iter().filter_map(|r| r.result.as_ref())));

    if let Some(output_dir) = &args.output_dir {
        let mut names = OutputNames::new(reserved_names(args.format, args.summary, args.merge));
        for entry in &results {
            if let Some(result) = &entry.result {
                let output_path = output_dir.join(names.claim(&entry.path, args.format));
                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
        if let Some(merged) = &merged {
            let merged_path = output_dir.join(merged_file_name(args.format));
            fs::write(&merged_path, format_result(&merged.result, args.format)?)?;
            eprintln!(
                "{} Merged output written to {}",
                style("✓").green(),
                merged_path.display()
            );
        }
    } else if let Some(merged) = &merged {
        println!("{}", format_result(&merged.result, args.format)?);
    } else {
        for entry in &results {
            if let Some(result) = &entry.result {
                println!("{}", format_result(result, args.format)?);
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join(SUMMARY_FILE))
            .unwrap_or_else(|| PathBuf::from(SUMMARY_FILE));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    let items: usize = results
        .iter()
        .filter_map(|r| r.result.as_ref())
        .map(ExtractionResult::len)
        .sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files ({} items) in {:?}",
        style("✓").green(),
        results.len() - failed,
        items,
        start.elapsed()
    );
    if let Some(merged) = &merged {
        eprintln!(
            "{} Total items found: {}, unique items: {} ({} duplicates removed)",
            style("ℹ").blue(),
            merged.total_items,
            merged.unique_items(),
            merged.duplicates()
        );
    }
    if failed > 0 {
        eprintln!("{} {} files failed", style("✗").red(), failed);
        for entry in results.iter().filter(|r| r.error.is_some()) {
            eprintln!("  - {}", entry.path.display());
        }
    }

    Ok(())
}

const SUMMARY_FILE: &str = "summary.csv";

fn merged_file_name(format: OutputFormat) -> String {
    format!("merged.{}", format.extension())
}

/// Output names the batch itself writes into the output directory.
fn reserved_names(format: OutputFormat, summary: bool, merge: bool) -> Vec<String> {
    let mut names = Vec::new();
    if summary {
        names.push(SUMMARY_FILE.to_string());
    }
    if merge {
        names.push(merged_file_name(format));
    }
    names
}

/// Hands out per-file output names, suffixing stems already in use so two
/// inputs never write the same file.
struct OutputNames {
    // Lowercased, so case-insensitive filesystems are covered too.
    taken: HashSet<String>,
}

impl OutputNames {
    fn new(reserved: Vec<String>) -> Self {
        Self {
            taken: reserved.into_iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    fn claim(&mut self, input: &Path, format: OutputFormat) -> String {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let ext = format.extension();

        let mut name = format!("{}.{}", stem, ext);
        let mut suffix = 1;
        while !self.taken.insert(name.to_lowercase()) {
            name = format!("{}-{}.{}", stem, suffix, ext);
            suffix += 1;
        }
        if suffix > 1 {
            warn!("{} shares its output name, writing {}", input.display(), name);
        }
        name
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "items", "pages", "processing_time_ms", "error"])?;

    for entry in results {
        let file = entry.path.display().to_string();
        let time = entry.processing_time_ms.to_string();
        match &entry.result {
            Some(result) => {
                let items = result.len().to_string();
                let pages = result.page_count.to_string();
                wtr.write_record([
                    file.as_str(),
                    "ok",
                    items.as_str(),
                    pages.as_str(),
                    time.as_str(),
                    "",
                ])?;
            }
            None => {
                let error = entry.error.as_deref().unwrap_or("");
                wtr.write_record([file.as_str(), "failed", "", "", time.as_str(), error])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineitem_core::ExtractedRecord;

    #[test]
    fn test_output_name_from_stem() {
        let mut names = OutputNames::new(Vec::new());
        assert_eq!(
            names.claim(Path::new("/in/order-17.pdf"), OutputFormat::Csv),
            "order-17.csv"
        );
    }

    #[test]
    fn test_output_names_never_collide() {
        let mut names = OutputNames::new(Vec::new());
        assert_eq!(names.claim(Path::new("a/x.pdf"), OutputFormat::Json), "x.json");
        assert_eq!(names.claim(Path::new("b/x.pdf"), OutputFormat::Json), "x-1.json");
        assert_eq!(names.claim(Path::new("c/X.PDF"), OutputFormat::Json), "X-2.json");
        assert_eq!(names.claim(Path::new("d/x-1.pdf"), OutputFormat::Json), "x-1-1.json");
    }

    #[test]
    fn test_output_names_skip_reserved() {
        let mut names = OutputNames::new(reserved_names(OutputFormat::Csv, true, true));
        assert_eq!(names.claim(Path::new("summary.pdf"), OutputFormat::Csv), "summary-1.csv");
        assert_eq!(names.claim(Path::new("merged.pdf"), OutputFormat::Csv), "merged-1.csv");

        let mut names = OutputNames::new(reserved_names(OutputFormat::Json, true, false));
        assert_eq!(names.claim(Path::new("summary.pdf"), OutputFormat::Json), "summary.json");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let mut ok = ExtractionResult::from_items(vec![ExtractedRecord::placeholder("item")]);
        ok.page_count = 2;
        let results = vec![
            ProcessResult {
                path: PathBuf::from("a.pdf"),
                result: Some(ok),
                error: None,
                processing_time_ms: 5,
            },
            ProcessResult {
                path: PathBuf::from("b.pdf"),
                result: None,
                error: Some("bad xref".to_string()),
                processing_time_ms: 1,
            },
        ];

        write_summary(&path, &results).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "file,status,items,pages,processing_time_ms,error");
        assert_eq!(lines[1], "a.pdf,ok,1,2,5,");
        assert_eq!(lines[2], "b.pdf,failed,,,1,bad xref");
    }
}
