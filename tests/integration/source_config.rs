//! Loading source configuration from disk.

use std::io::Write;
use std::sync::Arc;

use querywire::config::ConfigError;
use querywire::query::{field, Dynamic};
use querywire::transport::StaticTransport;
use querywire::{PayloadFormat, Source, SourceConfig};

#[test]
fn loads_explicit_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "endpoint = \"https://data.example.org/rest\"\nquery_param = \"q\"\nformat = \"json-lines\""
    )
    .unwrap();
    let config = SourceConfig::load(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.query_param, "q");
    assert_eq!(config.format, PayloadFormat::JsonLines);

    let transport = Arc::new(StaticTransport::ok("{\"ID\":1}\n"));
    let source = Source::with_config(&config, transport.clone()).unwrap();
    let query = source
        .table::<Dynamic>("Items")
        .unwrap()
        .r#where(field("ID").eq(1))
        .select::<serde_json::Value, _, _>(["ID"]);
    let rows = query.fetch_all().unwrap();
    assert_eq!(rows, vec![serde_json::json!({ "ID": 1 })]);

    let url = &transport.requested_urls()[0];
    assert_eq!(url.host_str(), Some("data.example.org"));
    assert_eq!(url.path(), "/rest");
    assert_eq!(url.query_pairs().next().unwrap().0, "q");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SourceConfig::load(Some(dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_file_reports_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timeout_ms = \"soon\"").unwrap();
    let err = SourceConfig::load(Some(file.path().to_path_buf())).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("unexpected: {other}"),
    }
}
