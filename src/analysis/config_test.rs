use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_unset() {
    let cfg = AnalysisConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, AnalysisConfig::default());
    assert_eq!(cfg.url, DEFAULT_ANALYSIS_URL);
    assert_eq!(
        cfg.timeouts,
        AnalysisTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
}

#[test]
fn parses_overrides() {
    let cfg = AnalysisConfig::from_lookup(lookup(&[
        ("ANALYSIS_URL", " https://calc.example.test/calculate "),
        ("ANALYSIS_REQUEST_TIMEOUT_SECS", "42"),
        ("ANALYSIS_CONNECT_TIMEOUT_SECS", "7"),
    ]))
    .unwrap();
    assert_eq!(cfg.url, "https://calc.example.test/calculate");
    assert_eq!(cfg.timeouts, AnalysisTimeouts { request_secs: 42, connect_secs: 7 });
}

#[test]
fn bad_timeouts_fall_back() {
    let cfg = AnalysisConfig::from_lookup(lookup(&[
        ("ANALYSIS_REQUEST_TIMEOUT_SECS", "soon"),
        ("ANALYSIS_CONNECT_TIMEOUT_SECS", "0"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts, AnalysisTimeouts::default());
}

#[test]
fn rejects_non_http_url() {
    let err = AnalysisConfig::from_lookup(lookup(&[("ANALYSIS_URL", "ftp://calc")])).unwrap_err();
    assert!(matches!(err, AnalysisError::ConfigParse(_)));
    assert_eq!(err.error_code(), "E_CONFIG_PARSE");
}

#[test]
fn with_url_overrides_endpoint() {
    let cfg = AnalysisConfig::default().with_url("http://127.0.0.1:9000/calculate").unwrap();
    assert_eq!(cfg.url, "http://127.0.0.1:9000/calculate");
    assert!(AnalysisConfig::default().with_url("localhost").is_err());
}
