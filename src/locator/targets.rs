use super::rule::{ElementPattern, SelectionRule};
use super::target::Target;
use crate::core::CrawlConfig;

pub const NOTICE_OVERLAY: &str = "NOTICE_OVERLAY";
pub const OVERLAY_DONT_SHOW_AGAIN: &str = "OVERLAY_DONT_SHOW_AGAIN";
pub const OVERLAY_CLOSE: &str = "OVERLAY_CLOSE";
pub const PROPOSAL_LIST_ENTRY: &str = "PROPOSAL_LIST_ENTRY";
pub const PROPOSAL_LIST_POPUP: &str = "PROPOSAL_LIST_POPUP";
pub const PROPOSAL_LIST_FRAME: &str = "PROPOSAL_LIST_FRAME";
pub const PROPOSAL_LIST_REGION: &str = "PROPOSAL_LIST_REGION";
pub const DATE_RANGE: &str = "DATE_RANGE";
pub const QUERY_INPUT: &str = "QUERY_INPUT";
pub const PAGE_SIZE: &str = "PAGE_SIZE";
pub const SEARCH_TRIGGER: &str = "SEARCH_TRIGGER";
pub const RESULTS_GRID: &str = "RESULTS_GRID";

/// Every element the pipeline looks for on the portal, with its fallback
/// rules in priority order. Built once per run from the crawl configuration.
#[derive(Debug, Clone)]
pub struct TargetTable {
    pub notice_overlay: Target,
    pub overlay_dont_show_again: Target,
    pub overlay_close: Target,
    pub proposal_list_entry: Target,
    pub proposal_list_popup: Target,
    pub proposal_list_frame: Target,
    pub proposal_list_region: Target,
    pub date_range: Target,
    pub query_input: Target,
    pub page_size: Target,
    pub search_trigger: Target,
    pub results_grid: Target,
}

impl TargetTable {
    pub fn new(config: &CrawlConfig) -> Self {
        let t = &config.timeouts;
        let label = config.date_range_label.as_str();

        Self {
            notice_overlay: Target::new(NOTICE_OVERLAY, t.popup)
                .rule(SelectionRule::class_fragment(Some("div"), "w2popup_window"))
                .rule(SelectionRule::class_fragment(Some("div"), "layerPopup"))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("div").attr_contains("id", "popup"),
                )),

            overlay_dont_show_again: Target::new(OVERLAY_DONT_SHOW_AGAIN, t.popup_close)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input")
                        .attr_eq("type", "checkbox")
                        .attr_contains("title", "오늘"),
                ))
                .rule(SelectionRule::text_contains(Some("label"), "오늘 하루"))
                .rule(SelectionRule::text_contains(Some("label"), "다시 보지")),

            overlay_close: Target::new(OVERLAY_CLOSE, t.popup_close)
                .rule(SelectionRule::class_fragment(Some("button"), "w2window_close"))
                .rule(SelectionRule::text_exact(None, "닫기"))
                .rule(SelectionRule::class_fragment(None, "close")),

            proposal_list_entry: Target::new(PROPOSAL_LIST_ENTRY, t.locate)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("a").attr_suffix("id", "_btnPrpblist"),
                ))
                .rule(SelectionRule::text_exact(Some("a"), "제안공고목록"))
                .rule(SelectionRule::text_pattern(Some("a"), r"제안\s*공고\s*목록"))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("a").attr_contains("onclick", "popNoticeList"),
                )),

            proposal_list_popup: Target::new(PROPOSAL_LIST_POPUP, t.context)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("div")
                        .attr_contains("id", "popPrpbList")
                        .attr_contains("class", "w2popup_window"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("div").attr_contains("id", "popPrpbList"),
                )),

            proposal_list_frame: Target::new(PROPOSAL_LIST_FRAME, t.context)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("iframe").attr_contains("src", "popNoticeList"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("iframe").attr_contains("id", "PrpbList"),
                )),

            proposal_list_region: Target::new(PROPOSAL_LIST_REGION, t.context)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("div").attr_contains("id", "PrpbList"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("div").attr_contains("id", "PrpsPbanc"),
                )),

            date_range: Target::new(DATE_RANGE, t.locate)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input")
                        .attr_eq("type", "radio")
                        .attr_eq("title", label),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input").attr_eq("title", label),
                ))
                .rule(SelectionRule::text_exact(Some("label"), label)),

            query_input: Target::new(QUERY_INPUT, t.locate)
                .rule(SelectionRule::within(
                    ElementPattern::tag("td").attr_eq("data-title", "제안공고명"),
                    ElementPattern::tag("input").attr_eq("type", "text"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input").attr_eq("name", "searchWrd"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input")
                        .attr_eq("type", "text")
                        .attr_contains("title", "제안공고명"),
                )),

            page_size: Target::new(PAGE_SIZE, t.locate)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("select").attr_contains("id", "RecordCountPerPage"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("select").attr_contains("name", "RecordCount"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("select").attr_contains("title", "건수"),
                )),

            search_trigger: Target::new(SEARCH_TRIGGER, t.locate)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input")
                        .attr_eq("type", "button")
                        .attr_eq("value", "적용"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("input")
                        .attr_eq("type", "button")
                        .attr_eq("value", "검색"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("button").attr_contains("onclick", "fn_search"),
                ))
                .rule(SelectionRule::text_exact(Some("button"), "검색")),

            results_grid: Target::new(RESULTS_GRID, t.results)
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("table").attr_suffix("id", "grdPrpsPbanc_body_table"),
                ))
                .rule(SelectionRule::attribute(
                    ElementPattern::tag("table").attr_contains("id", "grdPrpsPbanc"),
                ))
                .rule(SelectionRule::class_fragment(Some("table"), "tb_list")),
        }
    }

    pub fn all(&self) -> [&Target; 12] {
        [
            &self.notice_overlay,
            &self.overlay_dont_show_again,
            &self.overlay_close,
            &self.proposal_list_entry,
            &self.proposal_list_popup,
            &self.proposal_list_frame,
            &self.proposal_list_region,
            &self.date_range,
            &self.query_input,
            &self.page_size,
            &self.search_trigger,
            &self.results_grid,
        ]
    }
}
