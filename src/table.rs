//! Fixed width text tables.
use crate::output::Console;
use crate::parse::Tabular;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Line printed instead of a table when there is nothing to show.
pub const NO_RESULTS: &str = "(no results)";

/// Smallest width of a column sized from its content.
const MIN_WIDTH: usize = 6;

/// Space between two columns.
const GUTTER: &str = "  ";

/// Description of one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// key looked up with [`Tabular::cell`]
    pub key: &'static str,
    /// header text
    pub header: &'static str,
    /// fixed width, computed from the content when `None`
    pub width: Option<usize>,
}

impl Column {
    /// Column with a fixed `width`.
    pub const fn fixed(key: &'static str, header: &'static str, width: usize) -> Self {
        Column {
            key,
            header,
            width: Some(width),
        }
    }

    /// Column sized from its header and values.
    pub const fn auto(key: &'static str, header: &'static str) -> Self {
        Column {
            key,
            header,
            width: None,
        }
    }
}

/// Pad `s` with spaces up to `width` terminal columns, or cut it to `width - 1`
/// columns followed by an ellipsis. Wide characters count for two columns.
///
/// ```
/// use dok::table::fit;
/// assert_eq!(fit("nginx", 8), "nginx   ");
/// assert_eq!(fit("registry.local/nginx", 8), "registr…");
/// ```
pub fn fit(s: &str, width: usize) -> String {
    let len = s.width();
    if len <= width {
        let mut res = s.to_owned();
        res.push_str(&" ".repeat(width - len));
        return res;
    }
    let room = width.saturating_sub(1);
    let mut res = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        res.push(c);
        used += w;
    }
    res.push('…');
    // a wide character that did not fit leaves a gap
    res.push_str(&" ".repeat(width.saturating_sub(used + 1)));
    res
}

fn widths<R: Tabular>(rows: &[R], columns: &[Column]) -> Vec<usize> {
    columns
        .iter()
        .map(|c| {
            c.width.unwrap_or_else(|| {
                rows.iter()
                    .map(|r| r.cell(c.key).unwrap_or("").width())
                    .chain([c.header.width(), MIN_WIDTH])
                    .max()
                    .unwrap_or(MIN_WIDTH)
            })
        })
        .collect()
}

/// Render `rows` as a table, or the [`NO_RESULTS`] line when empty.
pub fn render<R: Tabular>(rows: &[R], columns: &[Column]) -> Vec<String> {
    if rows.is_empty() {
        return vec![NO_RESULTS.to_owned()];
    }
    let widths = widths(rows, columns);
    let join = |cells: Vec<String>| cells.join(GUTTER);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join(
        columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| fit(c.header, *w))
            .collect(),
    ));
    lines.push(join(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        lines.push(join(
            columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| fit(row.cell(c.key).unwrap_or(""), *w))
                .collect(),
        ));
    }
    lines
}

/// Print `rows` as a table on `console`.
pub fn print_table<R: Tabular>(console: &mut dyn Console, rows: &[R], columns: &[Column]) {
    for line in render(rows, columns) {
        console.out(&line);
    }
}

/// Print a section title on `console`.
pub fn print_title(console: &mut dyn Console, title: &str) {
    console.out("");
    console.out(&format!("=== {title} ==="));
}

#[cfg(test)]
mod render_should {
    use super::*;
    use crate::parse::{parse_record, Container, Record};

    const COLUMNS: [Column; 2] = [Column::fixed("ID", "ID", 4), Column::auto("NAME", "NAME")];

    fn container(id: &str, name: &str) -> Container {
        Container {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn print_placeholder_only_without_rows() {
        let rows: Vec<Container> = vec![];
        assert_eq!(render(&rows, &COLUMNS), vec![NO_RESULTS]);
    }

    #[test]
    fn print_header_separator_and_rows() {
        let res = render(&[container("ab", "web")], &COLUMNS);
        assert_eq!(
            res,
            vec!["ID    NAME  ", "----  ------", "ab    web   "]
        );
    }

    #[test]
    fn size_auto_columns_from_longest_value() {
        let res = render(
            &[container("a", "web"), container("b", "a-rather-long-name")],
            &COLUMNS,
        );
        assert_eq!(res[1], format!("----  {}", "-".repeat(18)));
        assert_eq!(res[3], "b     a-rather-long-name");
    }

    #[test]
    fn truncate_overflowing_values_with_ellipsis() {
        let res = render(&[container("abcdef", "x")], &COLUMNS);
        let cell: String = res[2].chars().take(4).collect();
        assert_eq!(cell, "abc…");
        assert_eq!(cell.chars().count(), 4);
    }

    #[test]
    fn size_auto_columns_from_display_width() {
        let res = render(&[container("a", "コンテナ名前")], &COLUMNS);
        assert_eq!(res[1], format!("----  {}", "-".repeat(12)));
        assert_eq!(res[2].width(), res[1].width());
    }

    #[test]
    fn render_missing_cells_as_blank() {
        let rows: Vec<Record> = vec![parse_record("NAME=db")];
        let res = render(&rows, &COLUMNS);
        assert_eq!(res[2], "      db    ");
    }

    #[test]
    fn print_title_after_blank_line() {
        let mut console = crate::output::MemoryConsole::new();
        print_title(&mut console, "Containers");
        assert_eq!(console.out, vec!["", "=== Containers ==="]);
    }
}
