//! Shared output formatting for validation reports.
//!
//! Provides JSON and plain-text formatters for `ValidationReport`.
//! Colour belongs to the CLI layer.

use std::io::Write;

use crate::report::ValidationReport;

/// Format a `ValidationReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `ValidationReport` as human-readable plain text to a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  JEDEC FILE CHECK")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Files scanned:  {}", report.scanned_files)?;
    writeln!(writer, "  Files failed:   {}", report.failed_files)?;
    writeln!(writer, "  Rejected:       {}", report.rejections_count())?;
    writeln!(writer)?;

    if !report.scan_errors.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  SCAN ERRORS (files that could not be checked)")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for scan_err in &report.scan_errors {
            writeln!(writer, "{}", scan_err.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    if !report.rejections.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  REJECTED FILES")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for rejection in &report.rejections {
            writeln!(writer, "{}", rejection.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} All {} files may be uploaded",
            report.scanned_files
        )?;
    } else {
        if !report.scan_errors.is_empty() {
            writeln!(
                writer,
                "\u{2717} {} file(s) could not be checked",
                report.failed_files
            )?;
        }
        if !report.rejections.is_empty() {
            writeln!(
                writer,
                "\u{2717} {} file(s) must not be uploaded",
                report.rejections_count()
            )?;
            write_hints(report, writer)?;
        }
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}

fn write_hints(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let has_code = |code: &str| report.rejections.iter().any(|r| r.code == code);

    writeln!(writer)?;
    writeln!(writer, "  To fix:")?;
    if has_code("wrong_extension") || has_code("name_too_long") {
        writeln!(
            writer,
            "    - Fuse maps must be named *.jed, at most {} characters",
            jed_check::MAX_NAME_LEN
        )?;
    }
    if has_code("feature_disabled") {
        writeln!(
            writer,
            "    - Enable the SPI port in the fitter options (feabits bit {} must be 0)",
            jed_check::SPI_DISABLE_BIT
        )?;
    }
    if has_code("missing_marker")
        || has_code("end_of_stream")
        || has_code("malformed_field")
        || has_code("non_zero_address")
    {
        writeln!(
            writer,
            "    - Regenerate the file with the fitter; it is truncated or not a JEDEC fuse map"
        )?;
    }
    Ok(())
}
