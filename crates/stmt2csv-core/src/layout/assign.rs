use crate::extraction::TextFragment;
use crate::formats::schema::Membership;
use crate::layout::anchor::{row_index, Classifier, Role};
use crate::layout::{ColumnSpec, PartialRow, PartialTable, RowSpec};
use std::collections::BTreeMap;

/// Lowest-index column the fragment belongs to.
pub fn column_index(
    columns: &[ColumnSpec],
    fragment: &TextFragment,
    membership: Membership,
) -> Option<usize> {
    columns
        .iter()
        .find(|col| {
            let left_inside = col.x_left <= fragment.x && fragment.x <= col.x_right;
            match membership {
                Membership::LeftEdge => left_inside,
                Membership::Overlap => {
                    left_inside || (fragment.x <= col.x_left && fragment.right() >= col.x_left)
                }
                Membership::Contained => left_inside && fragment.right() <= col.x_right,
            }
        })
        .map(|col| col.col_index)
}

/// Build rows from vertical bands.
///
/// Anchors always land in their own band. Rows come out grouped by section
/// (default section first), each group in band order.
pub fn assign_by_span(
    fragments: &[TextFragment],
    columns: &[ColumnSpec],
    membership: Membership,
    anchors: &[&TextFragment],
    spans: &[RowSpec],
    overlap: bool,
    section_of: impl Fn(&TextFragment) -> usize,
) -> PartialTable {
    let mut sections: BTreeMap<usize, BTreeMap<usize, PartialRow>> = BTreeMap::new();
    let mut ignored = Vec::new();

    for fragment in fragments {
        let row = anchors
            .iter()
            .position(|a| std::ptr::eq(*a, fragment))
            .or_else(|| row_index(spans, fragment, overlap));
        let col = column_index(columns, fragment, membership);
        let (Some(row), Some(col)) = (row, col) else {
            ignored.push(fragment.clone());
            continue;
        };
        let section = section_of(fragment);
        sections
            .entry(section)
            .or_default()
            .entry(row)
            .or_insert_with(|| PartialRow::new(section, columns.len()))
            .cells[col]
            .push(fragment.clone());
    }

    PartialTable {
        rows: sections
            .into_values()
            .flat_map(|rows| rows.into_values())
            .collect(),
        ignored,
    }
}

/// Build rows by reading order: each anchor opens a row that collects the
/// body fragments after it.
pub fn assign_by_sequence(
    fragments: &[TextFragment],
    columns: &[ColumnSpec],
    membership: Membership,
    classifier: &Classifier<'_>,
    anchor_column: usize,
    section_of: impl Fn(&TextFragment) -> usize,
) -> PartialTable {
    let mut rows: Vec<PartialRow> = Vec::new();
    let mut ignored = Vec::new();

    for fragment in fragments {
        match classifier.classify(fragment) {
            Role::Header => {}
            Role::Anchor => {
                let mut row = PartialRow::new(section_of(fragment), columns.len());
                row.cells[anchor_column].push(fragment.clone());
                rows.push(row);
            }
            Role::Body => {
                let col = column_index(columns, fragment, membership);
                match (rows.last_mut(), col) {
                    (Some(row), Some(col)) => row.cells[col].push(fragment.clone()),
                    _ => ignored.push(fragment.clone()),
                }
            }
        }
    }

    PartialTable { rows, ignored }
}
