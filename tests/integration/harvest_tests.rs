//! Full harvest runs against a mock site

use crate::common::{find_file, holdings_page, listing_page, test_config};
use nav_harvest::config::{DelayRange, SectionEntry};
use nav_harvest::harvest::{run_daily, run_harvest, SectionOutcome};
use nav_harvest::output::BUDGET_EXCEEDED_MARKER;
use nav_harvest::{ExtractionError, HarvestError};
use std::io::Write;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_listing(mock_server: &MockServer, funds: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(funds)))
        .mount(mock_server)
        .await;
}

async fn mount_fund(mock_server: &MockServer, key: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/funds/{}", key)))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

async fn requests_to(mock_server: &MockServer, request_path: &str) -> usize {
    mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

#[tokio::test]
async fn test_full_harvest() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_listing(
        &mock_server,
        &[("AAA", "Alpha Fund"), ("BBB", "Beta Fund"), ("CCC", "Gamma Fund")],
    )
    .await;
    mount_fund(
        &mock_server,
        "AAA",
        ResponseTemplate::new(200).set_body_string(holdings_page(&[("NABIL", "1,200")])),
    )
    .await;
    mount_fund(&mock_server, "BBB", ResponseTemplate::new(500)).await;
    mount_fund(
        &mock_server,
        "CCC",
        ResponseTemplate::new(200)
            .set_body_string(holdings_page(&[("UPPER", "300"), ("NICA", "45")])),
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path());
    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.total_items(), 3);
    assert_eq!(report.succeeded(), vec!["AAA", "CCC"]);
    assert_eq!(report.failed(), vec![("BBB", "Failed after 2 attempts")]);
    assert!(report.abandoned().is_empty());
    assert_eq!(requests_to(&mock_server, "/funds/BBB").await, 2);

    let out_dir = temp_dir.path().join("out");
    let alpha = find_file(&out_dir, "assets-AAA-Alpha Fund-").expect("AAA file written");
    let content = std::fs::read_to_string(alpha).unwrap();
    assert_eq!(content, "\u{feff}Stock,Units\nNABIL,\"1,200\"\n");
    assert!(find_file(&out_dir, "assets-CCC-Gamma Fund-").is_some());
    assert!(find_file(&out_dir, "assets-BBB-").is_none());

    let log = std::fs::read_to_string(temp_dir.path().join("scraping_errors.log")).unwrap();
    assert_eq!(
        log,
        "\u{feff}BBB: Failed after 2 attempts\n\nTotal Funds Attempted: 3\n"
    );
}

#[tokio::test]
async fn test_clean_run_writes_no_failure_log() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &[("AAA", "Alpha Fund")]).await;
    mount_fund(
        &mock_server,
        "AAA",
        ResponseTemplate::new(200).set_body_string(holdings_page(&[("NABIL", "10")])),
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path());
    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.succeeded(), vec!["AAA"]);
    assert!(!temp_dir.path().join("scraping_errors.log").exists());
}

#[tokio::test]
async fn test_throttled_fund_retried_after_others() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_listing(&mock_server, &[("AAA", "Alpha Fund"), ("BBB", "Beta Fund")]).await;
    Mock::given(method("GET"))
        .and(path("/funds/AAA"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_fund(
        &mock_server,
        "AAA",
        ResponseTemplate::new(200).set_body_string(holdings_page(&[("NABIL", "10")])),
    )
    .await;
    mount_fund(
        &mock_server,
        "BBB",
        ResponseTemplate::new(200).set_body_string(holdings_page(&[("UPPER", "5")])),
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path());
    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.succeeded(), vec!["BBB", "AAA"]);
    assert!(report.failed().is_empty());

    let order: Vec<String> = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.url.path().to_string())
        .filter(|p| p.starts_with("/funds/"))
        .collect();
    assert_eq!(order, vec!["/funds/AAA", "/funds/BBB", "/funds/AAA"]);
}

#[tokio::test]
async fn test_budget_stops_run_and_logs_marker() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_listing(
        &mock_server,
        &[("AAA", "Alpha Fund"), ("BBB", "Beta Fund"), ("CCC", "Gamma Fund")],
    )
    .await;
    for key in ["AAA", "BBB", "CCC"] {
        mount_fund(
            &mock_server,
            key,
            ResponseTemplate::new(200).set_body_string(holdings_page(&[("NABIL", "10")])),
        )
        .await;
    }

    let mut config = test_config(&mock_server.uri(), temp_dir.path());
    config.scheduler.normal_delay = DelayRange::new(1.0, 1.1);
    config.scheduler.time_budget_secs = 1;

    let report = run_harvest(&config).await.unwrap();

    assert!(report.budget_exceeded());
    assert_eq!(report.succeeded(), vec!["AAA"]);
    assert_eq!(report.abandoned(), vec!["BBB", "CCC"]);
    assert_eq!(requests_to(&mock_server, "/funds/BBB").await, 0);

    let log = std::fs::read_to_string(temp_dir.path().join("scraping_errors.log")).unwrap();
    assert_eq!(log.matches(BUDGET_EXCEEDED_MARKER).count(), 1);
    assert!(log.ends_with("Total Funds Attempted: 3\n"));
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), temp_dir.path());
    let result = run_harvest(&config).await;

    assert!(matches!(
        result,
        Err(HarvestError::Extraction(ExtractionError::Status { status: 503, .. }))
    ));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_listing_without_table_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>maintenance</p>"))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), temp_dir.path());
    let result = run_harvest(&config).await;

    assert!(matches!(
        result,
        Err(HarvestError::Extraction(ExtractionError::TableMissing { .. }))
    ));
}

#[tokio::test]
async fn test_harvest_from_listing_csv() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    let csv_path = temp_dir.path().join("funds.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    write!(file, "\u{feff}Symbol,Name,NAV\nAAA,Alpha Fund,10.1\n,Blank,1\n").unwrap();

    mount_fund(
        &mock_server,
        "AAA",
        ResponseTemplate::new(200).set_body_string(holdings_page(&[("NABIL", "10")])),
    )
    .await;

    let mut config = test_config(&mock_server.uri(), temp_dir.path());
    config.listing.url = None;
    config.listing.table_id = None;
    config.listing.csv_path = Some(csv_path.to_string_lossy().into_owned());

    let report = run_harvest(&config).await.unwrap();

    assert_eq!(report.total_items(), 1);
    assert_eq!(report.succeeded(), vec!["AAA"]);
}

#[tokio::test]
async fn test_daily_snapshot() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/nav"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table id="nav-table"><tr><th>Fund</th><th>NAV</th></tr>
               <tr><td>Alpha</td><td>10.5</td></tr></table>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dividends"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri(), temp_dir.path());
    config.sections = vec![
        SectionEntry {
            name: "NAV".to_string(),
            url: format!("{}/nav", mock_server.uri()),
            table_id: "nav-table".to_string(),
        },
        SectionEntry {
            name: "Dividends".to_string(),
            url: format!("{}/dividends", mock_server.uri()),
            table_id: "div-table".to_string(),
        },
    ];

    let results = run_daily(&config).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0].1, SectionOutcome::Saved(_)));
    assert_eq!(results[1].1, SectionOutcome::Failed("HTTP 404".to_string()));

    let nav = find_file(&temp_dir.path().join("out"), "NAV-").expect("NAV snapshot written");
    let content = std::fs::read_to_string(nav).unwrap();
    assert_eq!(content, "\u{feff}Fund,NAV\nAlpha,10.5\n");
}
