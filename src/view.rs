//! Pure derivation of "rows to render now": sort, then filter, then
//! paginate. No state is held between calls; identical inputs always
//! produce identical output.

use crate::schema::Row;
use crate::store::{SortOrder, SortSpec};

/// Result of projecting the store through the current view state.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Rows of the requested page, in render order.
    pub rows: Vec<Row>,
    /// Rows surviving the filter, before pagination.
    pub filtered_count: usize,
    /// `ceil(filtered_count / page_size)`; 0 when nothing matches.
    pub total_pages: usize,
}

/// Indicator in the pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIndicator {
    Page(usize),
    Ellipsis,
}

pub fn project(
    rows: &[Row],
    sort: &SortSpec,
    query: &str,
    page: usize,
    page_size: usize,
) -> Projection {
    let sorted = sort_rows(rows, sort);
    let filtered = filter_rows(sorted, query);
    let filtered_count = filtered.len();
    let total_pages = filtered_count.div_ceil(page_size);
    Projection {
        rows: page_slice(filtered, page, page_size),
        filtered_count,
        total_pages,
    }
}

/// Stable sort by the active column. Descending reverses the comparator
/// rather than the output so ties keep their original relative order.
/// A row missing the sort key sorts below every row that has one.
fn sort_rows(rows: &[Row], sort: &SortSpec) -> Vec<Row> {
    let mut out = rows.to_vec();
    let Some(column) = sort.column.as_deref() else {
        return out;
    };
    let order = sort.order.unwrap_or(SortOrder::Ascending);
    out.sort_by(|a, b| {
        let cmp = match (a.get(column), b.get(column)) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(va), Some(vb)) => va.compare(vb),
        };
        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
    out
}

/// Keep rows where any cell, lower-cased, contains the lower-cased
/// query as a substring. An empty query keeps everything.
fn filter_rows(rows: Vec<Row>, query: &str) -> Vec<Row> {
    if query.is_empty() {
        return rows;
    }
    let needle = query.to_lowercase();
    rows.into_iter()
        .filter(|row| {
            row.cells
                .values()
                .any(|v| v.search_text().to_lowercase().contains(&needle))
        })
        .collect()
}

/// Slice out the 1-indexed page. A page past the end is empty, never an
/// error; clamping is the caller's job.
fn page_slice(rows: Vec<Row>, page: usize, page_size: usize) -> Vec<Row> {
    let start = page.saturating_sub(1) * page_size;
    rows.into_iter().skip(start).take(page_size).collect()
}

/// Bounded list of page indicators: all pages up to 5, otherwise a
/// window with ellipsis markers around the current page.
pub fn page_indicators(current_page: usize, total_pages: usize) -> Vec<PageIndicator> {
    use PageIndicator::*;
    const MAX_PAGES: usize = 5;

    if total_pages <= MAX_PAGES {
        return (1..=total_pages).map(Page).collect();
    }
    if current_page <= 3 {
        vec![Page(1), Page(2), Page(3), Ellipsis, Page(total_pages)]
    } else if current_page >= total_pages - 2 {
        vec![
            Page(1),
            Ellipsis,
            Page(total_pages - 2),
            Page(total_pages - 1),
            Page(total_pages),
        ]
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(current_page - 1),
            Page(current_page),
            Page(current_page + 1),
            Ellipsis,
            Page(total_pages),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageIndicator::{Ellipsis, Page};
    use crate::schema::CellValue;

    fn by(column: &str, order: SortOrder) -> SortSpec {
        SortSpec {
            column: Some(column.to_string()),
            order: Some(order),
        }
    }

    fn unsorted() -> SortSpec {
        SortSpec::default()
    }

    fn numbered(id: &str, n: f64) -> Row {
        Row::new(id).with_cell("n", CellValue::Number(n))
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let rows = vec![
            numbered("1", 5.0),
            numbered("2", 5.0),
            numbered("3", 1.0),
        ];
        let p = project(&rows, &by("n", SortOrder::Ascending), "", 1, 10);
        let ids: Vec<&str> = p.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[test]
    fn descending_reverses_comparator_not_output() {
        let rows = vec![
            numbered("1", 5.0),
            numbered("2", 5.0),
            numbered("3", 1.0),
        ];
        let p = project(&rows, &by("n", SortOrder::Descending), "", 1, 10);
        let ids: Vec<&str> = p.rows.iter().map(|r| r.id.as_str()).collect();
        // Ties keep original relative order under desc too.
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn missing_sort_key_sorts_first_ascending() {
        let rows = vec![numbered("1", 5.0), Row::new("2"), numbered("3", 1.0)];
        let p = project(&rows, &by("n", SortOrder::Ascending), "", 1, 10);
        let ids: Vec<&str> = p.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[test]
    fn iso_dates_sort_chronologically() {
        let rows = vec![
            Row::new("1").with_cell("dob", CellValue::Text("1999-12-31".into())),
            Row::new("2").with_cell("dob", CellValue::Text("1980-01-02".into())),
            Row::new("3").with_cell("dob", CellValue::Text("1980-01-15".into())),
        ];
        let p = project(&rows, &by("dob", SortOrder::Ascending), "", 1, 10);
        let ids: Vec<&str> = p.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[test]
    fn filter_matches_any_column_case_insensitive() {
        let rows = vec![
            Row::new("1").with_cell("name", CellValue::Text("John".into())),
            Row::new("2").with_cell("name", CellValue::Text("Jane".into())),
        ];
        let p = project(&rows, &unsorted(), "jo", 1, 10);
        assert_eq!(p.rows.len(), 1);
        assert_eq!(p.rows[0].id, "1");

        let p = project(&rows, &unsorted(), "", 1, 10);
        assert_eq!(p.rows.len(), 2);
    }

    #[test]
    fn filter_sees_numeric_cells_as_text() {
        let rows = vec![
            Row::new("1").with_cell("age", CellValue::Number(30.0)),
            Row::new("2").with_cell("age", CellValue::Number(25.0)),
        ];
        let p = project(&rows, &unsorted(), "30", 1, 10);
        assert_eq!(p.rows.len(), 1);
        assert_eq!(p.rows[0].id, "1");
    }

    #[test]
    fn pagination_bounds() {
        let rows: Vec<Row> = (1..=25).map(|i| numbered(&i.to_string(), i as f64)).collect();

        let p = project(&rows, &unsorted(), "", 1, 10);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.filtered_count, 25);
        assert_eq!(p.rows.len(), 10);
        assert_eq!(p.rows[0].id, "1");
        assert_eq!(p.rows[9].id, "10");

        let p = project(&rows, &unsorted(), "", 3, 10);
        assert_eq!(p.rows.len(), 5);

        // Past the last page: empty slice, no error.
        let p = project(&rows, &unsorted(), "", 4, 10);
        assert!(p.rows.is_empty());
    }

    #[test]
    fn no_matches_means_zero_pages() {
        let rows = vec![Row::new("1").with_cell("name", CellValue::Text("John".into()))];
        let p = project(&rows, &unsorted(), "zzz", 1, 10);
        assert_eq!(p.total_pages, 0);
        assert!(p.rows.is_empty());
    }

    #[test]
    fn indicator_window_literal_cases() {
        assert_eq!(
            page_indicators(2, 3),
            vec![Page(1), Page(2), Page(3)]
        );
        assert_eq!(
            page_indicators(1, 10),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_indicators(5, 10),
            vec![
                Page(1),
                Ellipsis,
                Page(4),
                Page(5),
                Page(6),
                Ellipsis,
                Page(10)
            ]
        );
        assert_eq!(
            page_indicators(10, 10),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn projection_is_pure() {
        let rows = vec![numbered("1", 2.0), numbered("2", 1.0)];
        let sort = by("n", SortOrder::Ascending);
        let first = project(&rows, &sort, "", 1, 10);
        let second = project(&rows, &sort, "", 1, 10);
        assert_eq!(first, second);
    }
}
