//! Fetcher behaviour against a mock site

use crate::common::{client_config, holdings_page, TEST_USER_AGENT};
use nav_harvest::harvest::{FetchOutcome, Fetcher, HttpFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHALLENGE: &str =
    "<html><head><title>Just a moment...</title></head><body>Checking your browser</body></html>";

async fn fetch_with_status(status: u16) -> FetchOutcome {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&client_config(&mock_server.uri())).unwrap();
    fetcher.fetch("NBF2").await
}

#[tokio::test]
async fn test_fetch_success_sends_user_agent() {
    let mock_server = MockServer::start().await;
    let page = holdings_page(&[("NABIL", "100")]);

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .and(header("user-agent", TEST_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(page.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&client_config(&mock_server.uri())).unwrap();

    assert_eq!(fetcher.fetch("NBF2").await, FetchOutcome::Success(page));
}

#[tokio::test]
async fn test_throttle_statuses_are_rate_limited() {
    assert_eq!(fetch_with_status(403).await, FetchOutcome::RateLimited);
    assert_eq!(fetch_with_status(429).await, FetchOutcome::RateLimited);
}

#[tokio::test]
async fn test_other_statuses_are_unexpected() {
    assert_eq!(fetch_with_status(500).await, FetchOutcome::UnexpectedStatus(500));
    assert_eq!(fetch_with_status(404).await, FetchOutcome::UnexpectedStatus(404));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let fetcher = HttpFetcher::new(&client_config(&uri)).unwrap();

    assert!(matches!(
        fetcher.fetch("NBF2").await,
        FetchOutcome::TransportError(_)
    ));
}

#[tokio::test]
async fn test_challenge_reported_without_wait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&client_config(&mock_server.uri())).unwrap();

    assert!(!fetcher.can_wait_out_challenge());
    assert_eq!(fetcher.fetch("NBF2").await, FetchOutcome::ChallengePage);
}

#[tokio::test]
async fn test_challenge_cleared_by_polling() {
    let mock_server = MockServer::start().await;
    let page = holdings_page(&[("NABIL", "100")]);

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page.clone()))
        .mount(&mock_server)
        .await;

    let mut config = client_config(&mock_server.uri());
    config.challenge_wait_secs = 5;
    let fetcher = HttpFetcher::new(&config).unwrap();

    assert!(fetcher.can_wait_out_challenge());
    assert_eq!(fetcher.fetch("NBF2").await, FetchOutcome::Success(page));
}

#[tokio::test]
async fn test_challenge_not_cleared_within_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .mount(&mock_server)
        .await;

    let mut config = client_config(&mock_server.uri());
    config.challenge_wait_secs = 2;
    let fetcher = HttpFetcher::new(&config).unwrap();

    let started = std::time::Instant::now();
    assert_eq!(fetcher.fetch("NBF2").await, FetchOutcome::ChallengePage);
    assert!(started.elapsed() >= std::time::Duration::from_secs(2));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.len() >= 2, "expected re-polls, got {}", requests.len());
}

#[tokio::test]
async fn test_slow_repoll_does_not_extend_challenge_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/funds/NBF2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(CHALLENGE)
                .set_delay(std::time::Duration::from_secs(4)),
        )
        .mount(&mock_server)
        .await;

    let mut config = client_config(&mock_server.uri());
    config.challenge_wait_secs = 2;
    let fetcher = HttpFetcher::new(&config).unwrap();

    let started = std::time::Instant::now();
    assert_eq!(fetcher.fetch("NBF2").await, FetchOutcome::ChallengePage);

    let elapsed = started.elapsed();
    assert!(
        elapsed < std::time::Duration::from_secs(3),
        "challenge wait ran for {:?}",
        elapsed
    );
}
