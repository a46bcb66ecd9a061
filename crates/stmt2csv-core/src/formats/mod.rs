pub mod builtin;
pub mod schema;

use crate::error::ConvertError;
use regex::Regex;
use schema::{FormatSpec, SourceFormat};
use std::path::Path;

/// Load a format from a JSON file.
pub fn load_format(path: &Path) -> Result<FormatSpec, ConvertError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConvertError::FormatLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_format(&content, path)
}

/// Parse a format from a JSON string.
pub fn parse_format(json: &str, source: &Path) -> Result<FormatSpec, ConvertError> {
    let spec: FormatSpec = serde_json::from_str(json).map_err(|e| ConvertError::FormatLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_format(&spec)?;
    Ok(spec)
}

/// Parse a format from a JSON string (no file path context).
pub fn parse_format_str(json: &str) -> Result<FormatSpec, ConvertError> {
    let spec: FormatSpec = serde_json::from_str(json).map_err(ConvertError::Json)?;
    validate_format(&spec)?;
    Ok(spec)
}

/// Validate that a format is well-formed.
pub fn validate_format(spec: &FormatSpec) -> Result<(), ConvertError> {
    if spec.key.trim().is_empty() {
        return Err(ConvertError::FormatInvalid("key must not be empty".into()));
    }
    if spec.name.trim().is_empty() {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' has an empty name",
            spec.key
        )));
    }
    if spec.headers.is_empty() {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' has no headers",
            spec.key
        )));
    }
    if spec.headers.iter().any(|h| h.trim().is_empty()) {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' has an empty header label",
            spec.key
        )));
    }

    let margins = [
        spec.columns.left_margin,
        spec.columns.right_margin,
        spec.columns.last_right,
    ];
    if margins
        .iter()
        .chain(spec.columns.right_margin_overrides.values())
        .any(|m| !m.is_finite())
    {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' has a non-finite column margin",
            spec.key
        )));
    }

    match spec.source {
        SourceFormat::Pdf => validate_pdf_layout(spec)?,
        SourceFormat::Eml => {
            if spec.anchor.is_some() {
                return Err(ConvertError::FormatInvalid(format!(
                    "format '{}' reads HTML tables and cannot declare an anchor",
                    spec.key
                )));
            }
        }
    }

    for rule in &spec.exclude_rows {
        require_header(spec, &rule.column, "exclude_rows")?;
        if rule.contains.is_empty() {
            return Err(ConvertError::FormatInvalid(format!(
                "format '{}' has an empty exclusion phrase",
                spec.key
            )));
        }
    }

    if let Some(ref short_dates) = spec.short_dates {
        for column in &short_dates.columns {
            require_header(spec, column, "short_dates")?;
        }
        let re = compile(spec, &short_dates.title_pattern)?;
        if !re.capture_names().any(|n| n == Some("year")) {
            return Err(ConvertError::FormatInvalid(format!(
                "format '{}' short_dates.title_pattern needs a 'year' group",
                spec.key
            )));
        }
    }

    if let Some(ref card) = spec.card_suffix {
        compile(spec, &card.pattern)?;
    }

    Ok(())
}

fn validate_pdf_layout(spec: &FormatSpec) -> Result<(), ConvertError> {
    let anchor = spec.anchor.as_ref().ok_or_else(|| {
        ConvertError::FormatInvalid(format!("PDF format '{}' needs an anchor", spec.key))
    })?;

    if anchor.column >= spec.headers.len() {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' anchor column {} is out of range ({} headers)",
            spec.key,
            anchor.column,
            spec.headers.len()
        )));
    }
    require_header(spec, &anchor.required_header, "anchor.required_header")?;

    if anchor.patterns.is_empty() {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' anchor has no patterns",
            spec.key
        )));
    }
    for pattern in &anchor.patterns {
        compile(spec, pattern)?;
    }

    if spec.header_pages.is_empty() || spec.header_pages.contains(&0) {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' header_pages must list 1-based page numbers",
            spec.key
        )));
    }
    if spec.first_page == 0 {
        return Err(ConvertError::FormatInvalid(format!(
            "format '{}' first_page is 1-based",
            spec.key
        )));
    }

    if let Some(ref sections) = spec.sections {
        if sections.markers.is_empty() {
            return Err(ConvertError::FormatInvalid(format!(
                "format '{}' declares sections without markers",
                spec.key
            )));
        }
    }

    Ok(())
}

fn require_header(spec: &FormatSpec, label: &str, field: &str) -> Result<(), ConvertError> {
    if spec.headers.iter().any(|h| h == label) {
        Ok(())
    } else {
        Err(ConvertError::FormatInvalid(format!(
            "format '{}' {} references unknown header '{}'",
            spec.key, field, label
        )))
    }
}

fn compile(spec: &FormatSpec, pattern: &str) -> Result<Regex, ConvertError> {
    Regex::new(pattern).map_err(|e| {
        ConvertError::FormatInvalid(format!(
            "format '{}' has an invalid pattern '{}': {}",
            spec.key, pattern, e
        ))
    })
}
