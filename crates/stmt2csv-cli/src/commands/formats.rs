use stmt2csv_core::error::ConvertError;
use stmt2csv_core::formats::schema::SourceFormat;
use stmt2csv_core::registry::{all_adapters, find_adapter};
use std::path::Path;

use crate::output;

pub fn list() -> Result<(), ConvertError> {
    println!("Available formats:\n");
    for adapter in all_adapters() {
        let inputs = adapter
            .source_formats
            .iter()
            .map(|f| match f {
                SourceFormat::Pdf => ".pdf/.json".to_string(),
                SourceFormat::Eml => ".eml".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<14} {} (v{}) [{}]",
            adapter.key, adapter.name, adapter.spec.version, inputs
        );
        if let Some(ref desc) = adapter.spec.description {
            println!("                 {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(key: &str) -> Result<(), ConvertError> {
    let adapter = find_adapter(key)?;
    println!("{}", output::text::describe_format(&adapter.spec));
    Ok(())
}

pub fn schema() -> Result<(), ConvertError> {
    print!(
        r#"JSON Format Schema
==================

A format file describes one bank statement layout. `stmt2csv convert
--format <FILE>` uses it in place of a built-in adapter.

Top-level fields:
  key           (string, required)  Unique identifier, e.g. "demo_debit"
  name          (string, required)  Display name
  version       (string, required)  Version identifier
  description   (string, optional)  What this format covers
  source        (string, required)  "pdf" or "eml"
  headers       (array, required)   Expected header labels, in output order.
                                    A PDF header matches a text fragment
                                    exactly; missing labels drop the column.
  title         (object, optional)  {{"contains": text, "fallback": text}}
                                    First line of the CSV.
  header_pages  (array, optional)   Pages searched for the header row, in
                                    order. Default: [1]
  header_scope  (string, optional)  "document" (default) or "page"
  columns       (object, optional)  Column span rule:
      rule          "next_header" (default) or "own_width"
      left_margin   widen spans to the left (default 0)
      right_margin  widen spans to the right (default 0, may be negative)
      right_margin_overrides  {{label: margin}}
      last_right    right edge of the last "next_header" span (default 999)
      membership    "left_edge" (default), "overlap" or "contained"
  anchor        (object, pdf only)  Fragments that open a row:
      column          index into the located headers
      required_header conversion fails without this header
      patterns        regexes, the whole fragment text must match one
      alignment       "in_column" (default) or "header_x"
  rows          (object, optional)  Row detection:
      {{"policy": "sequence", "skip_headers": bool}}  (default)
      {{"policy": "span", "margin_below": n, "margin_above": n,
        "extend_below_by_height": bool, "overlap": bool}}
  first_page    (number, optional)  Pages before this give no rows. Default: 1
  end_marker    (string, optional)  Exact text that ends the listing
  sections      (object, optional)  {{"column_title", "default_label",
                                    "markers": [{{"contains", "label"}}]}}
  card_suffix   (object, optional)  {{"pattern", "column_title", "fallback"}}
  exclude_rows  (array, optional)   [{{"column", "contains"}}]
  short_dates   (object, optional)  {{"columns": [..], "title_pattern": regex
                                    with a "year" and optional "month" group}}
  email         (object, eml only)  {{"table_selector": css}}. Default: "table"

Example:
{{
  "key": "demo_debit",
  "name": "Demo Bank debit card",
  "version": "1.0",
  "source": "pdf",
  "headers": ["交易日期", "金额", "余额", "摘要"],
  "columns": {{ "right_margin": -0.01 }},
  "anchor": {{
    "column": 0,
    "required_header": "交易日期",
    "patterns": ["\\d{{4}}-\\d{{2}}-\\d{{2}}"]
  }},
  "rows": {{ "policy": "span", "margin_below": 1, "margin_above": 1 }}
}}

Run `stmt2csv fragments <FILE>` to see fragment positions when tuning margins.
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), ConvertError> {
    let spec = stmt2csv_core::formats::load_format(file)?;

    println!("Format '{}' (v{}) is valid.", spec.name, spec.version);
    println!("  Source: .{}", spec.source);
    println!("  Columns: {}", spec.headers.join(", "));

    let mut warnings = Vec::new();
    if all_adapters().iter().any(|a| a.key == spec.key) {
        warnings.push(format!("key '{}' shadows a built-in adapter", spec.key));
    }
    if spec.title.is_none() && spec.short_dates.is_some() {
        warnings.push("short_dates has no title to take the year from".to_string());
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
