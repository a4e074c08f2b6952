use arxiv_digest::record::{
    escape_separators, make_collapsible, split_cells, strip_version, PaperRecord, COLLAPSIBLE_MARKER,
};
use chrono::NaiveDate;

fn sample_record(repo_url: Option<&str>) -> PaperRecord {
    PaperRecord {
        full_id: "2301.00001v2".to_string(),
        updated: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        title: "Agents\n  that Co-Evolve".to_string(),
        categories: vec!["cs.CL".to_string(), "cs.LG".to_string()],
        abstract_text: "We study A | B pipelines.".to_string(),
        url: "http://arxiv.org/abs/2301.00001v2".to_string(),
        repo_url: repo_url.map(|s| s.to_string()),
    }
}

#[test]
fn test_row_with_repository() {
    let row = sample_record(Some("https://github.com/org/repo")).to_row();
    assert_eq!(
        row,
        "|**2023-01-02**|**Agents that Co-Evolve**|cs.CL, cs.LG| \
         <details><summary>Full Abstract</summary>We study A \\| B pipelines.</details>|\
         [2301.00001v2](http://arxiv.org/abs/2301.00001v2)| **[code](https://github.com/org/repo)**|"
    );
}

#[test]
fn test_row_without_repository_ends_with_null() {
    let row = sample_record(None).to_row();
    assert!(row.ends_with("| null|"));
    assert!(row.contains(COLLAPSIBLE_MARKER));
}

#[test]
fn test_row_has_six_columns() {
    let row = sample_record(None).to_row();
    // Escaped separators in the abstract must not create extra cells.
    assert_eq!(split_cells(&row).len(), 8);
}

#[test]
fn test_title_separators_are_escaped() {
    let mut record = sample_record(None);
    record.title = "Left|Right".to_string();
    assert!(record.to_row().contains("**Left\\|Right**"));
}

#[test]
fn test_escape_separators_does_not_double_escape() {
    assert_eq!(escape_separators("a|b"), "a\\|b");
    assert_eq!(escape_separators("a\\|b"), "a\\|b");
    assert_eq!(escape_separators(&escape_separators("x|y|z")), "x\\|y\\|z");
}

#[test]
fn test_make_collapsible() {
    assert_eq!(
        make_collapsible("text"),
        "<details><summary>Full Abstract</summary>text</details>"
    );
}

#[test]
fn test_strip_version() {
    assert_eq!(strip_version("2301.00001v2"), "2301.00001");
    assert_eq!(strip_version("2301.00001v12"), "2301.00001");
    assert_eq!(strip_version("2301.00001"), "2301.00001");
    assert_eq!(strip_version("hep-th/9901001v1"), "hep-th/9901001");
    assert_eq!(strip_version("solv-int/9901001"), "solv-int/9901001");
}

#[test]
fn test_stable_id() {
    assert_eq!(sample_record(None).stable_id(), "2301.00001");
}
