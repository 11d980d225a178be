//! Output formats shared by the extract and batch commands.

use chrono::NaiveDate;

use lineitem_core::ExtractionResult;

/// Spreadsheet column headers, in field order.
pub const CSV_HEADER: [&str; 4] = ["Stock Code", "Description", "Quantity", "Unit Price"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (same body as the HTTP endpoint)
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Render a result in the requested format.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// Default export file name, e.g. `extracted_data_2024-01-15.csv`.
pub fn default_file_name(format: OutputFormat, date: NaiveDate) -> String {
    format!("extracted_data_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;
    for item in &result.items {
        wtr.write_record([
            &item.stock_code,
            &item.description,
            &item.quantity,
            &item.unit_price,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<10} {:<50} {:>8} {:>10}\n",
        "Code", "Description", "Qty", "Price"
    ));
    for item in &result.items {
        output.push_str(&format!(
            "{:<10} {:<50} {:>8} {:>10}\n",
            item.stock_code, item.description, item.quantity, item.unit_price
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Records:     {}\n", result.len()));
    output.push_str(&format!("  Pages:       {}\n", result.page_count));
    output.push_str(&format!("  Total value: {}\n", result.total_value()));

    output
}
