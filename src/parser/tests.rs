use super::*;
use crate::storage::HEADER;

fn grid(rows: &str) -> String {
    format!(
        r#"<table id="mf_wfm_container_grdPrpsPbanc_body_table" class="w2grid_body_table">
            <tbody>{}</tbody>
        </table>"#,
        rows
    )
}

fn row(cells: &[&str]) -> String {
    let tds: String = cells
        .iter()
        .map(|c| format!("<td><nobr class=\"w2grid_input\">{}</nobr></td>", c))
        .collect();
    format!("<tr>{}</tr>", tds)
}

#[test]
fn test_extracts_rows_in_document_order() {
    let html = grid(&format!(
        "{}{}",
        row(&["1", "R25BK00001", "조달청", "컴퓨터 구매", "2025/01/02", "2025/01/10", "공고중", "", ""]),
        row(&["2", "R25BK00002", "서울시", "노트북 임차", "2025/01/03", "2025/01/11", "마감", "", ""]),
    ));

    let table = extract(&html).unwrap();

    assert_eq!(table.header, HEADER.to_vec());
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][1], "R25BK00001");
    assert_eq!(table.rows[1][3], "노트북 임차");
}

#[test]
fn test_empty_rows_are_dropped() {
    let html = grid(&format!(
        "{}{}{}",
        row(&["", " ", "\n"]),
        row(&["1", "R25BK00001", "조달청"]),
        "<tr></tr>",
    ));

    let table = extract(&html).unwrap();

    assert_eq!(table.rows.len(), 1);
    assert!(table
        .rows
        .iter()
        .all(|r| r.iter().any(|c| !c.trim().is_empty())));
}

#[test]
fn test_width_matches_widest_row_up_to_header() {
    for width in 1..=HEADER.len() {
        let cells: Vec<String> = (0..width).map(|i| format!("c{}", i)).collect();
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        let html = grid(&format!("{}{}", row(&refs), row(&refs[..1])));

        let table = extract(&html).unwrap();

        assert_eq!(table.header.len(), width);
        assert!(table.rows.iter().all(|r| r.len() == width));
        assert_eq!(table.rows[1][0], "c0");
        assert!(table.rows[1][1..].iter().all(String::is_empty));
    }
}

#[test]
fn test_rows_wider_than_header_are_truncated() {
    let cells: Vec<String> = (0..12).map(|i| i.to_string()).collect();
    let refs: Vec<&str> = cells.iter().map(String::as_str).collect();

    let table = extract(&grid(&row(&refs))).unwrap();

    assert_eq!(table.width(), HEADER.len());
    assert_eq!(table.rows[0].len(), HEADER.len());
    assert_eq!(table.rows[0].last().unwrap(), "8");
}

#[test]
fn test_cell_text_prefers_nowrap_then_link_then_own_text() {
    let html = grid(
        r#"<tr>
            <td><span class="tooltip">hidden hint</span><nobr>  R25BK
                00003 </nobr></td>
            <td><a href="javascript:void(0)" onclick="fn_view()">컴퓨터   구매</a><span>(긴급)</span></td>
            <td>  조달청
                본청 </td>
            <td><div class="w2grid_nowrap">마감</div></td>
        </tr>"#,
    );

    let table = extract(&html).unwrap();

    assert_eq!(table.rows[0], vec!["R25BK 00003", "컴퓨터 구매", "조달청 본청", "마감"]);
}

#[test]
fn test_nested_tables_do_not_leak_rows() {
    let html = grid(
        r#"<tr><td>1</td><td><table><tr><td>inner</td><td>x</td><td>y</td></tr></table></td></tr>"#,
    );

    let table = extract(&html).unwrap();

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.width(), 2);
}

#[test]
fn test_header_only_grid_has_no_rows() {
    let html = r#"<table><thead><tr><th>No</th><th>공고번호</th></tr></thead><tbody></tbody></table>"#;

    let table = extract(html).unwrap();

    assert!(table.rows.is_empty());
    assert_eq!(table.header.len(), HEADER.len());
}

#[test]
fn test_markup_without_table_is_an_error() {
    assert!(extract("<div>no grid here</div>").is_err());
}

#[test]
fn test_into_notice_rows_maps_columns() {
    let html = grid(&row(&["7", "R25BK00007", "조달청", "서버 구매", "2025/02/01"]));

    let rows = extract(&html).unwrap().into_notice_rows();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].no, "7");
    assert_eq!(rows[0].notice_number, "R25BK00007");
    assert_eq!(rows[0].posted_date, "2025/02/01");
    assert_eq!(rows[0].deadline, "");
}
