//! Markdown report generation
//!
//! Renders the final crawl report: unique page count, longest page,
//! subdomain counts and the most frequent words.

use crate::output::{CrawlReport, OutputResult, TOP_WORDS};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report to `output_path`
///
/// # Arguments
///
/// * `report` - The report snapshot
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# UCI Crawl Report\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n\n",
        report.generated_at.to_rfc3339()
    ));

    md.push_str("## Number of Unique Links\n\n");
    md.push_str(&format!("{}\n\n", report.unique_links));

    md.push_str("## Longest Page\n\n");
    let (url, count) = &report.longest_page;
    md.push_str(&format!("- **URL**: {}\n", url));
    md.push_str(&format!("- **Tokens**: {}\n\n", count));

    md.push_str(&format!("## {} Subdomains\n\n", report.subdomain_root));
    if report.subdomains.is_empty() {
        md.push_str("None found.\n\n");
    } else {
        md.push_str("| Subdomain | Pages |\n");
        md.push_str("|-----------|-------|\n");
        for (subdomain, pages) in &report.subdomains {
            md.push_str(&format!("| {} | {} |\n", subdomain, pages));
        }
        md.push('\n');
    }

    md.push_str(&format!("## Top {} Words\n\n", TOP_WORDS));
    for (rank, (token, freq)) in report.top_words.iter().enumerate() {
        md.push_str(&format!("{}. {} : {}\n", rank + 1, token, freq));
    }
    md.push('\n');

    md.push_str("## Low-Information Pages\n\n");
    md.push_str(&format!("{}\n", report.low_info_pages));

    md
}
