use serde::{Deserialize, Serialize};

/// Logical column keys, in grid order.
pub const HEADER: [&str; 9] = [
    "No",
    "NoticeNumber",
    "Org",
    "Title",
    "PostedDate",
    "Deadline",
    "Status",
    "Reason",
    "Other",
];

/// One procurement notice as shown in the results grid. Missing trailing
/// columns are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoticeRow {
    #[serde(rename = "No", default)]
    pub no: String,
    #[serde(rename = "NoticeNumber", default)]
    pub notice_number: String,
    #[serde(rename = "Org", default)]
    pub org: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "PostedDate", default)]
    pub posted_date: String,
    #[serde(rename = "Deadline", default)]
    pub deadline: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Reason", default)]
    pub reason: String,
    #[serde(rename = "Other", default)]
    pub other: String,
}

impl NoticeRow {
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |i: usize| {
            cells
                .get(i)
                .map(|c| c.as_ref().trim().to_string())
                .unwrap_or_default()
        };

        Self {
            no: cell(0),
            notice_number: cell(1),
            org: cell(2),
            title: cell(3),
            posted_date: cell(4),
            deadline: cell(5),
            status: cell(6),
            reason: cell(7),
            other: cell(8),
        }
    }

    pub fn to_record(&self) -> [&str; 9] {
        [
            self.no.as_str(),
            self.notice_number.as_str(),
            self.org.as_str(),
            self.title.as_str(),
            self.posted_date.as_str(),
            self.deadline.as_str(),
            self.status.as_str(),
            self.reason.as_str(),
            self.other.as_str(),
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.to_record().iter().all(|c| c.trim().is_empty())
    }
}

pub type ResultSet = Vec<NoticeRow>;
