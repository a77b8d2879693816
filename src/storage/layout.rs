use super::types::{NoticeRow, HEADER};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Fixed-width presentation of the notice columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<(&'static str, usize)>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        let labels = [
            "No",
            "제안공고번호",
            "수요기관",
            "제안공고명",
            "공고게시일자",
            "공고마감일시",
            "공고상태",
            "사유",
            "기타",
        ];
        let widths = [5, 16, 20, 40, 12, 16, 10, 10, 10];

        Self {
            columns: labels.into_iter().zip(widths).collect(),
        }
    }
}

impl ColumnLayout {
    pub fn label(&self, key: &str) -> Option<&'static str> {
        HEADER
            .iter()
            .position(|h| *h == key)
            .and_then(|i| self.columns.get(i))
            .map(|(label, _)| *label)
    }

    pub fn widths(&self) -> Vec<usize> {
        self.columns.iter().map(|(_, w)| *w).collect()
    }

    /// Centered, pipe-separated table with a rule under the header.
    pub fn render_table(&self, rows: &[NoticeRow]) -> String {
        let mut out = String::new();
        let labels: Vec<&str> = self.columns.iter().map(|(label, _)| *label).collect();
        out.push_str(&self.render_line(&labels));
        out.push('\n');

        let rule: Vec<String> = self.widths().iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');

        for row in rows {
            out.push_str(&self.render_line(&row.to_record()));
            out.push('\n');
        }
        out
    }

    fn render_line(&self, cells: &[&str]) -> String {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, (_, width))| center(cells.get(i).copied().unwrap_or(""), *width))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Terminal columns taken by `text`; Hangul and other wide characters take
/// two, combining marks none.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn truncate(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('~');
    out
}

fn center(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let pad = width.saturating_sub(display_width(&text));
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}
