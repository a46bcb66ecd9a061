use stmt2csv_core::extraction::{Page, TextFragment};
use stmt2csv_core::formats::schema::{FormatSpec, HeaderScope, RowPolicy, SpanRule};

pub fn print_ignored(fragments: &[TextFragment]) {
    eprintln!("\n{} fragment(s) ignored:", fragments.len());
    for f in fragments {
        eprintln!(
            "  page {:<3} x={:>7.2} y={:>7.2}  {}",
            f.page_index + 1,
            f.x,
            f.y,
            f.text
        );
    }
}

pub fn print_page_summary(pages: &[Page]) {
    for page in pages {
        eprintln!("  page {}: {} fragment(s)", page.page_number, page.fragments.len());
    }
}

/// Plain-language description of a format.
pub fn describe_format(spec: &FormatSpec) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} [{}] (version {})", spec.name, spec.key, spec.version));
    if let Some(ref desc) = spec.description {
        lines.push(String::new());
        lines.push(desc.clone());
    }
    lines.push(String::new());
    lines.push(format!("Input: .{}", spec.source));
    lines.push(format!("Columns: {}", spec.headers.join(" | ")));

    if let Some(ref anchor) = spec.anchor {
        let pages = spec
            .header_pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", then ");
        let scope = match spec.header_scope {
            HeaderScope::Document => format!("located once, on page {pages}"),
            HeaderScope::Page => "located on every page".into(),
        };
        lines.push(format!("Header row: {scope}"));

        let rule = match spec.columns.rule {
            SpanRule::NextHeader => "from each header to the next",
            SpanRule::OwnWidth => "the width of each header",
        };
        lines.push(format!(
            "Column spans: {rule} (left margin {}, right margin {}), membership {:?}",
            spec.columns.left_margin, spec.columns.right_margin, spec.columns.membership
        ));
        for (label, margin) in &spec.columns.right_margin_overrides {
            lines.push(format!("  {label}: right margin {margin}"));
        }

        lines.push(format!(
            "Rows open at '{}' (column {}) matching {}",
            spec.headers
                .get(anchor.column)
                .map(String::as_str)
                .unwrap_or("?"),
            anchor.column,
            anchor.patterns.join(" or ")
        ));
        lines.push(match spec.rows {
            RowPolicy::Span {
                margin_below,
                margin_above,
                extend_below_by_height,
                overlap,
            } => format!(
                "Row bands: anchor line -{margin_below}{} / +{margin_above}{}",
                if extend_below_by_height { " - height" } else { "" },
                if overlap { ", straddling fragments included" } else { "" }
            ),
            RowPolicy::Sequence { skip_headers } => format!(
                "Rows in reading order, each anchor starts a new row{}",
                if skip_headers { " (repeated headers skipped)" } else { "" }
            ),
        });
        lines.push(format!("Required header: {}", anchor.required_header));
        if spec.first_page > 1 {
            lines.push(format!("Rows read from page {}", spec.first_page));
        }
    } else {
        let selector = spec
            .email
            .as_ref()
            .map_or("table", |e| e.table_selector.as_str());
        lines.push(format!(
            "Rows read from HTML tables ({selector}) whose header cells match the columns"
        ));
    }

    if let Some(ref marker) = spec.end_marker {
        lines.push(format!("Listing ends at: {marker}"));
    }
    if let Some(ref title) = spec.title {
        lines.push(format!("Title line: text containing '{}'", title.contains));
    }
    if let Some(ref sections) = spec.sections {
        let markers = sections
            .markers
            .iter()
            .map(|m| format!("'{}' -> {}", m.contains, m.label))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "Extra column '{}': {} by default, {markers}",
            sections.column_title, sections.default_label
        ));
    }
    if let Some(ref card) = spec.card_suffix {
        lines.push(format!(
            "Extra column '{}': last four digits of text matching {}",
            card.column_title, card.pattern
        ));
    }
    for rule in &spec.exclude_rows {
        lines.push(format!("Drops rows whose {} contains '{}'", rule.column, rule.contains));
    }
    if let Some(ref dates) = spec.short_dates {
        lines.push(format!(
            "MM/DD dates in {} get the statement year",
            dates.columns.join(", ")
        ));
    }

    lines.join("\n")
}
