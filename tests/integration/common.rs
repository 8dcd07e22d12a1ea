use nav_harvest::config::{
    ClientConfig, Config, DelayRange, ListingConfig, OutputConfig, SchedulerConfig,
};
use std::path::Path;

pub const TEST_USER_AGENT: &str = "NavHarvestTest/1.0";

pub fn holdings_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(stock, units)| format!("<tr><td>{}</td><td>{}</td></tr>", stock, units))
        .collect();
    format!(
        r#"<html><body><h1>Holdings</h1><table>
        <thead><tr><th>Stock</th><th>Units</th></tr></thead>
        <tbody>{}</tbody></table></body></html>"#,
        body
    )
}

pub fn listing_page(funds: &[(&str, &str)]) -> String {
    let body: String = funds
        .iter()
        .map(|(key, label)| format!("<tr><td>{}</td><td>{}</td><td>10.0</td></tr>", key, label))
        .collect();
    format!(
        r#"<html><body><table id="other"><tr><th>Ignore</th></tr></table>
        <table id="fund-list"><thead><tr><th>Symbol</th><th>Name</th><th>NAV</th></tr></thead>
        <tbody>{}</tbody></table></body></html>"#,
        body
    )
}

pub fn client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        detail_path: "/funds/{key}".to_string(),
        user_agent: TEST_USER_AGENT.to_string(),
        request_timeout_secs: 5,
        challenge_wait_secs: 0,
        challenge_poll_secs: 1,
    }
}

/// Scheduler with near-zero pauses so runs finish in real time
pub fn fast_scheduler() -> SchedulerConfig {
    SchedulerConfig {
        max_attempts: 2,
        cooldown_secs: 0,
        rate_limit_delay: DelayRange::new(0.0, 0.01),
        normal_delay: DelayRange::new(0.0, 0.01),
        time_budget_secs: 600,
        ..SchedulerConfig::default()
    }
}

pub fn test_config(base_url: &str, out_dir: &Path) -> Config {
    Config {
        client: client_config(base_url),
        scheduler: fast_scheduler(),
        listing: ListingConfig {
            url: Some(format!("{}/listing", base_url)),
            table_id: Some("fund-list".to_string()),
            csv_path: None,
            key_column: "Symbol".to_string(),
            label_column: "Name".to_string(),
        },
        output: OutputConfig {
            directory: out_dir.join("out").to_string_lossy().into_owned(),
            failure_log: out_dir
                .join("scraping_errors.log")
                .to_string_lossy()
                .into_owned(),
        },
        sections: vec![],
    }
}

/// Finds the single file in `dir` whose name starts with `prefix`
pub fn find_file(dir: &Path, prefix: &str) -> Option<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(prefix))
                .unwrap_or(false)
        })
}
