use arxiv_digest::arxiv::repo::official_repo_url;
use arxiv_digest::arxiv::{parse_feed, ArxivClient, PapersWithCode, RepoLookup, SortOrder};
use arxiv_digest::config::{ArxivConfig, RepoLookupConfig};
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;

fn entry_xml(id: &str, categories: &[&str]) -> String {
    let cats: String = categories
        .iter()
        .map(|c| format!(r#"<category term="{}" scheme="http://arxiv.org/schemas/atom"/>"#, c))
        .collect();
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}</id>
    <updated>2024-01-16T10:00:00Z</updated>
    <published>2024-01-15T18:30:00Z</published>
    <title>Paper {id}:
      A &amp; B</title>
    <summary>  First line
second line.  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/{id}" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/{id}" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="{first}" scheme="http://arxiv.org/schemas/atom"/>
    {cats}
  </entry>"#,
        id = id,
        first = categories.first().copied().unwrap_or(""),
        cats = cats
    )
}

fn feed_xml(total: usize, entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:test</title>
  <id>http://arxiv.org/api/abc</id>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">{}</opensearch:totalResults>
  <opensearch:startIndex xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:startIndex>
  {}
</feed>"#,
        total,
        entries.join("\n")
    )
}

fn arxiv_config(base_url: String, page_size: usize) -> ArxivConfig {
    ArxivConfig {
        base_url,
        page_size,
        page_delay_secs: 0,
        retry_max_elapsed_secs: 0,
    }
}

#[test]
fn test_parse_feed_entry_fields() {
    let xml = feed_xml(1, &[entry_xml("2401.00001v2", &["cs.CL", "cs.LG"])]);
    let feed = parse_feed(&xml).unwrap();

    assert_eq!(feed.total_results, Some(1));
    assert_eq!(feed.entries.len(), 1);
    let entry = &feed.entries[0];
    assert_eq!(entry.short_id(), "2401.00001v2");
    assert_eq!(entry.updated, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    assert_eq!(entry.published, NaiveDate::from_ymd_opt(2024, 1, 15));
    assert!(entry.title.starts_with("Paper 2401.00001v2:"));
    assert!(entry.title.ends_with("A & B"));
    assert_eq!(entry.summary, "First line\nsecond line.");
    assert_eq!(entry.categories, vec!["cs.CL", "cs.LG"]);
}

#[test]
fn test_parse_feed_skips_error_entries() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2024-01-16T00:00:00-05:00</updated>
  </entry>
</feed>"#;
    let feed = parse_feed(xml).unwrap();
    assert!(feed.entries.is_empty());
}

#[test]
fn test_parse_empty_feed() {
    let feed = parse_feed(&feed_xml(0, &[])).unwrap();
    assert_eq!(feed.total_results, Some(0));
    assert!(feed.entries.is_empty());
}

#[test]
fn test_parse_malformed_feed_is_error() {
    assert!(parse_feed("<feed><entry></feed>").is_err());
}

#[test]
fn test_into_record_strips_newlines() {
    let feed = parse_feed(&feed_xml(1, &[entry_xml("2401.00001v2", &["cs.CL"])])).unwrap();
    let record = feed.entries[0].clone().into_record(None);
    assert_eq!(record.full_id, "2401.00001v2");
    assert_eq!(record.stable_id(), "2401.00001");
    assert_eq!(record.abstract_text, "First line second line.");
    assert_eq!(record.url, "http://arxiv.org/abs/2401.00001v2");
}

#[test]
fn test_search_pages_until_cap() {
    let mut server = Server::new();
    let page_one = server
        .mock("GET", "/api/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "0".into()),
            Matcher::UrlEncoded("max_results".into(), "2".into()),
            Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
            Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            Matcher::UrlEncoded("search_query".into(), r#"all:"code generation""#.into()),
        ]))
        .with_status(200)
        .with_body(feed_xml(
            10,
            &[entry_xml("2401.00004v1", &["cs.CL"]), entry_xml("2401.00003v1", &["cs.CL"])],
        ))
        .expect(1)
        .create();
    let page_two = server
        .mock("GET", "/api/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "2".into()),
            Matcher::UrlEncoded("max_results".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(feed_xml(10, &[entry_xml("2401.00002v1", &["cs.LG"])]))
        .expect(1)
        .create();

    let client = ArxivClient::new(&arxiv_config(server.url(), 2)).unwrap();
    let ids: Vec<String> = client
        .search(r#"all:"code generation""#, 3, SortOrder::SubmittedDate)
        .map(|e| e.short_id().to_string())
        .collect();

    assert_eq!(ids, vec!["2401.00004v1", "2401.00003v1", "2401.00002v1"]);
    page_one.assert();
    page_two.assert();
}

#[test]
fn test_search_stops_at_total_results() {
    let mut server = Server::new();
    let page = server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded("start".into(), "0".into()))
        .with_status(200)
        .with_body(feed_xml(1, &[entry_xml("2401.00001v1", &["cs.CL"])]))
        .expect(1)
        .create();

    let client = ArxivClient::new(&arxiv_config(server.url(), 20)).unwrap();
    let entries: Vec<_> = client.search("all:test", 50, SortOrder::SubmittedDate).collect();

    assert_eq!(entries.len(), 1);
    page.assert();
}

#[test]
fn test_search_ends_quietly_on_empty_page() {
    let mut server = Server::new();
    let _first = server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded("start".into(), "0".into()))
        .with_status(200)
        .with_body(feed_xml(
            6,
            &[entry_xml("2401.00002v1", &["cs.CL"]), entry_xml("2401.00001v1", &["cs.CL"])],
        ))
        .create();
    let empty = server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded("start".into(), "2".into()))
        .with_status(200)
        .with_body(feed_xml(6, &[]))
        .expect(1)
        .create();

    let client = ArxivClient::new(&arxiv_config(server.url(), 2)).unwrap();
    let entries: Vec<_> = client.search("all:test", 6, SortOrder::SubmittedDate).collect();

    assert_eq!(entries.len(), 2);
    empty.assert();
}

#[test]
fn test_search_ends_quietly_on_server_error() {
    let mut server = Server::new();
    let _failing = server
        .mock("GET", "/api/query")
        .match_query(Matcher::Any)
        .with_status(503)
        .create();

    let client = ArxivClient::new(&arxiv_config(server.url(), 20)).unwrap();
    let entries: Vec<_> = client.search("all:test", 10, SortOrder::SubmittedDate).collect();
    assert!(entries.is_empty());
}

#[test]
fn test_fetch_page_reports_error_after_budget() {
    let mut server = Server::new();
    let _failing = server
        .mock("GET", "/api/query")
        .match_query(Matcher::Any)
        .with_status(500)
        .create();

    let client = ArxivClient::new(&arxiv_config(server.url(), 20)).unwrap();
    assert!(client.fetch_page("all:test", 0, 20, SortOrder::Relevance).is_err());
}

fn lookup_config(base_url: String) -> RepoLookupConfig {
    RepoLookupConfig {
        base_url,
        timeout_secs: 2,
    }
}

#[test]
fn test_repo_lookup_official_url() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/v0/papers/2401.00001v2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"official": {"url": "https://github.com/org/repo"}, "all": []}"#)
        .create();

    let lookup = PapersWithCode::new(&lookup_config(server.url())).unwrap();
    assert_eq!(
        lookup.lookup("2401.00001v2").as_deref(),
        Some("https://github.com/org/repo")
    );
}

#[test]
fn test_repo_lookup_failures_are_absent() {
    let mut server = Server::new();
    let _no_official = server
        .mock("GET", "/api/v0/papers/2401.00001v1")
        .with_status(200)
        .with_body(r#"{"official": null}"#)
        .create();
    let _server_error = server
        .mock("GET", "/api/v0/papers/2401.00002v1")
        .with_status(500)
        .create();
    let _malformed = server
        .mock("GET", "/api/v0/papers/2401.00003v1")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create();

    let lookup = PapersWithCode::new(&lookup_config(server.url())).unwrap();
    assert_eq!(lookup.lookup("2401.00001v1"), None);
    assert_eq!(lookup.lookup("2401.00002v1"), None);
    assert_eq!(lookup.lookup("2401.00003v1"), None);
    assert_eq!(lookup.lookup("2401.00404v1"), None);
}

#[test]
fn test_repo_lookup_unreachable_host_is_absent() {
    let lookup = PapersWithCode::new(&lookup_config("http://127.0.0.1:9".to_string())).unwrap();
    assert_eq!(lookup.lookup("2401.00001v1"), None);
}

#[test]
fn test_official_repo_url() {
    assert_eq!(
        official_repo_url(&json!({"official": {"url": "https://x/y"}})).as_deref(),
        Some("https://x/y")
    );
    assert_eq!(official_repo_url(&json!({"official": {"url": ""}})), None);
    assert_eq!(official_repo_url(&json!({})), None);
}
