//! Scripted portal fixtures shared by the pipeline and crawler tests.

use crate::browser::{MockAction, MockBrowser, MockElement, PageId};
use crate::core::retry::RetryConfig;
use crate::core::{CrawlConfig, SettleDelays, Timeouts};
use std::time::Duration;

pub(crate) const GRID_ID: &str = "mf_wfm_container_tacPrpsPbanc_contents_content1_body_grdPrpsPbanc_body_table";

/// Millisecond waits, no settle pauses, no retry back-off.
pub(crate) fn fast_config() -> CrawlConfig {
    let timeouts = Timeouts {
        navigation: Duration::from_millis(200),
        network_idle: Duration::from_millis(10),
        request: Duration::from_millis(200),
        popup: Duration::from_millis(20),
        popup_close: Duration::ZERO,
        locate: Duration::from_millis(30),
        context: Duration::from_millis(40),
        results: Duration::from_millis(40),
        query: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
    };

    CrawlConfig::default()
        .with_timeouts(timeouts)
        .with_settle(SettleDelays::none())
        .with_retry(RetryConfig::default().without_delays())
}

pub(crate) fn grid_html(rows: &[Vec<&str>]) -> String {
    let body: String = rows
        .iter()
        .map(|cells| {
            let tds: String = cells
                .iter()
                .map(|c| format!(r#"<td class="w2grid_td"><nobr>{}</nobr></td>"#, c))
                .collect();
            format!(r#"<tr class="grid_body_row">{}</tr>"#, tds)
        })
        .collect();
    format!(
        r#"<table id="{}" class="w2grid_body_table"><tbody>{}</tbody></table>"#,
        GRID_ID, body
    )
}

pub(crate) fn notice_cells<'a>(no: &'a str, number: &'a str, title: &'a str) -> Vec<&'a str> {
    vec![
        no,
        number,
        "조달청",
        title,
        "2025/01/02",
        "2025/01/10 10:00",
        "공고중",
        "",
        "",
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SublistLayout {
    Overlay,
    Frame,
    Region,
    NewTab,
    /// The entry link is absent.
    NoEntry,
    /// The entry link does nothing.
    NoContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryField {
    Normal,
    IgnoresTyping,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Grid {
    Rows(Vec<Vec<String>>),
    Absent,
}

/// Builds a `MockBrowser` shaped like the procurement portal.
#[derive(Debug, Clone)]
pub(crate) struct Portal {
    closable_overlays: usize,
    stuck_overlays: usize,
    layout: SublistLayout,
    query: QueryField,
    has_search_trigger: bool,
    grid: Grid,
}

impl Portal {
    pub(crate) fn new() -> Self {
        Self {
            closable_overlays: 1,
            stuck_overlays: 0,
            layout: SublistLayout::Overlay,
            query: QueryField::Normal,
            has_search_trigger: true,
            grid: Grid::Rows(Vec::new()),
        }
    }

    pub(crate) fn overlays(mut self, closable: usize, stuck: usize) -> Self {
        self.closable_overlays = closable;
        self.stuck_overlays = stuck;
        self
    }

    pub(crate) fn layout(mut self, layout: SublistLayout) -> Self {
        self.layout = layout;
        self
    }

    pub(crate) fn query_field(mut self, query: QueryField) -> Self {
        self.query = query;
        self
    }

    pub(crate) fn without_search_trigger(mut self) -> Self {
        self.has_search_trigger = false;
        self
    }

    pub(crate) fn rows(mut self, rows: &[Vec<&str>]) -> Self {
        self.grid = Grid::Rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        self
    }

    pub(crate) fn without_grid(mut self) -> Self {
        self.grid = Grid::Absent;
        self
    }

    pub(crate) fn build(self) -> MockBrowser {
        let mut browser = MockBrowser::new().with_title("나라장터 종합쇼핑몰");

        for i in 0..self.closable_overlays {
            let key = format!("notice_{}", i);
            browser = browser
                .with_element(
                    MockElement::new(&key, "div")
                        .attr("id", &format!("mf_wq_uuid_{}_noticePop", i))
                        .attr("class", "w2popup_window"),
                )
                .with_element(
                    MockElement::new(&format!("{}_today", key), "input")
                        .attr("type", "checkbox")
                        .attr("title", "오늘 하루 이 창을 열지 않음")
                        .inside(&key),
                )
                .with_element(
                    MockElement::new(&format!("{}_close", key), "button")
                        .attr("class", "w2window_close")
                        .text("닫기")
                        .inside(&key)
                        .on_click(MockAction::Hide(key.clone())),
                );
        }

        for i in 0..self.stuck_overlays {
            let key = format!("stuck_{}", i);
            browser = browser
                .with_element(
                    MockElement::new(&key, "div")
                        .attr("id", &format!("mf_wq_uuid_{}_bannerPop", i))
                        .attr("class", "w2popup_window"),
                )
                .with_element(
                    MockElement::new(&format!("{}_body", key), "span")
                        .text("시스템 점검 안내")
                        .inside(&key),
                );
        }

        let (container, page, reveal): (Option<String>, PageId, Option<MockAction>) =
            match self.layout {
                SublistLayout::Overlay => {
                    browser = browser.with_element(
                        MockElement::new("sublist", "div")
                            .attr("id", "mf_wfm_container_wq_uuid_427_popPrpbList")
                            .attr("class", "w2popup_window")
                            .hidden(),
                    );
                    (Some("sublist".into()), 0, Some(MockAction::Show("sublist".into())))
                }
                SublistLayout::Frame => {
                    browser = browser.with_element(
                        MockElement::new("sublist_frame", "iframe")
                            .attr("src", "/pn/popNoticeList.do")
                            .hidden(),
                    );
                    (
                        Some("sublist_frame".into()),
                        0,
                        Some(MockAction::Show("sublist_frame".into())),
                    )
                }
                SublistLayout::Region => {
                    browser = browser.with_element(
                        MockElement::new("sublist_region", "div")
                            .attr("id", "mf_wfm_container_PrpsPbancList")
                            .hidden(),
                    );
                    (
                        Some("sublist_region".into()),
                        0,
                        Some(MockAction::Show("sublist_region".into())),
                    )
                }
                SublistLayout::NewTab => (None, 1, Some(MockAction::OpenPage)),
                SublistLayout::NoEntry | SublistLayout::NoContext => (None, 0, None),
            };

        if self.layout != SublistLayout::NoEntry {
            let mut entry = MockElement::new("entry", "a")
                .attr("id", "mf_wfm_container_btnPrpblist")
                .attr("href", "javascript:void(null)")
                .text("제안공고목록");
            if let Some(action) = reveal {
                entry = entry.on_click(action);
            }
            browser = browser.with_element(entry);
        }

        if matches!(self.layout, SublistLayout::NoEntry | SublistLayout::NoContext) {
            return browser;
        }

        let place = |el: MockElement| match &container {
            Some(parent) => el.on_page(page).inside(parent),
            None => el.on_page(page),
        };

        browser = browser
            .with_element(place(
                MockElement::new("range_3m", "input")
                    .attr("type", "radio")
                    .attr("name", "rdoTerm")
                    .attr("title", "3개월"),
            ))
            .with_element(place(
                MockElement::new("query_cell", "td").attr("data-title", "제안공고명"),
            ));

        let query = MockElement::new("query", "input")
            .attr("type", "text")
            .attr("id", "mf_wfm_container_txtPrpsPbancNm")
            .on_page(page)
            .inside("query_cell");
        let query = match self.query {
            QueryField::Normal => query,
            QueryField::IgnoresTyping => query.ignoring_input(),
            QueryField::Locked => query.locked(),
        };
        browser = browser.with_element(query).with_element(place(
            MockElement::new("page_size", "select")
                .attr("id", "mf_wfm_container_sbxRecordCountPerPage")
                .options(&["10", "30", "50", "100"])
                .value("10"),
        ));

        let grid_shown = !matches!(self.grid, Grid::Absent);
        if self.has_search_trigger {
            let mut trigger = MockElement::new("search", "input")
                .attr("type", "button")
                .attr("value", "적용");
            if grid_shown {
                trigger = trigger.on_click(MockAction::Show("grid".into()));
            }
            browser = browser.with_element(place(trigger));
        }

        if let Grid::Rows(rows) = &self.grid {
            let borrowed: Vec<Vec<&str>> = rows
                .iter()
                .map(|r| r.iter().map(String::as_str).collect())
                .collect();
            browser = browser.with_element(place(
                MockElement::new("grid", "table")
                    .attr("id", GRID_ID)
                    .html(&grid_html(&borrowed))
                    .hidden(),
            ));
        }

        browser
    }
}
