//! Fetch and decode happen on first pull, once per iteration.

use std::sync::Arc;

use querywire::decode::JsonLines;
use querywire::query::{field, ExecState, RecordShape};
use querywire::transport::StaticTransport;
use querywire::{ErrorKind, QueryError, Source};
use serde::Deserialize;

struct OreOre;

impl RecordShape for OreOre {
    const NAME: &'static str = "OreOre";
    const FIELDS: &'static [&'static str] = &["ID", "Name"];
}

#[derive(Debug, Deserialize, PartialEq)]
struct IdName {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Name")]
    name: String,
}

fn source(transport: &Arc<StaticTransport>) -> Source {
    Source::new(
        "http://api.example.com/v1".parse().unwrap(),
        transport.clone(),
    )
}

#[test]
fn end_to_end_oreore_example() {
    let transport = Arc::new(StaticTransport::ok(r#"[{"ID":123,"Name":"abc"}]"#));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").eq(123))
        .select::<IdName, _, _>(["ID", "Name"]);

    assert_eq!(
        query.render().unwrap(),
        "SELECT ID,Name FROM [OreOre] WHERE (ID == 123)"
    );
    assert_eq!(transport.calls(), 0);

    let rows: Vec<IdName> = query.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        rows,
        vec![IdName {
            id: 123,
            name: "abc".into()
        }]
    );
    assert_eq!(transport.calls(), 1);

    let urls = transport.requested_urls();
    let (param, text) = urls[0].query_pairs().next().unwrap();
    assert_eq!(param, "query");
    assert_eq!(text, "SELECT ID,Name FROM [OreOre] WHERE (ID == 123)");
}

#[test]
fn nothing_is_fetched_until_first_pull() {
    let transport = Arc::new(StaticTransport::ok("[]"));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").gt(1))
        .select::<IdName, _, _>(["ID", "Name"]);
    let _ = query.render().unwrap();
    let mut rows = query.iter();
    assert_eq!(rows.state(), ExecState::Constructed);
    assert_eq!(transport.calls(), 0);

    assert!(rows.next().is_none());
    assert_eq!(rows.state(), ExecState::Ready);
    assert_eq!(transport.calls(), 1);
}

#[test]
fn each_iteration_fetches_again() {
    let transport = Arc::new(StaticTransport::ok(
        r#"[{"ID":1,"Name":"a"},{"ID":2,"Name":"b"}]"#,
    ));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").gt(0))
        .select::<IdName, _, _>(["ID", "Name"]);

    let mut seen = 0;
    for row in &query {
        row.unwrap();
        seen += 1;
    }
    assert_eq!(seen, 2);
    assert_eq!(query.fetch_all().unwrap().len(), 2);
    assert_eq!(transport.calls(), 2);
}

#[test]
fn transport_failure_surfaces_as_fetch_failed() {
    let transport = Arc::new(StaticTransport::failing("connection refused"));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").eq(1))
        .select::<IdName, _, _>(["ID", "Name"]);
    let mut rows = query.iter();
    match rows.next() {
        Some(Err(QueryError::FetchFailed { url, source })) => {
            assert!(url.starts_with("http://api.example.com/v1?query="));
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(rows.state(), ExecState::Failed(ErrorKind::FetchFailed));
    assert!(rows.next().is_none());
}

#[test]
fn non_success_status_surfaces_as_rejected() {
    let transport = Arc::new(StaticTransport::with_status(404, "no such table"));
    let query = source(&transport)
        .table::<OreOre>("Missing")
        .unwrap()
        .r#where(field("ID").eq(1))
        .select::<IdName, _, _>(["ID", "Name"]);
    let err = query.fetch_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestRejected);
    assert_eq!(
        err.to_string(),
        "request rejected with status 404: no such table"
    );
}

#[test]
fn payload_shape_mismatch_surfaces_as_decode_failed() {
    let transport = Arc::new(StaticTransport::ok(r#"{"ID":1,"Name":"a"}"#));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").eq(1))
        .select::<IdName, _, _>(["ID", "Name"]);
    match query.fetch_all() {
        Err(QueryError::DecodeFailed { expected, actual }) => {
            assert_eq!(expected, "JSON array");
            assert_eq!(actual, "JSON object");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn no_partial_results_on_bad_element() {
    let transport = Arc::new(StaticTransport::ok(
        r#"[{"ID":1,"Name":"a"},{"ID":2}]"#,
    ));
    let query = source(&transport)
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").gt(0))
        .select::<IdName, _, _>(["ID", "Name"]);
    let mut rows = query.iter();
    assert!(matches!(rows.next(), Some(Err(QueryError::DecodeFailed { .. }))));
    assert!(rows.next().is_none());
}

#[test]
fn json_lines_decoder_is_pluggable() {
    let transport = Arc::new(StaticTransport::ok(
        "{\"ID\":1,\"Name\":\"a\"}\n{\"ID\":2,\"Name\":\"b\"}\n",
    ));
    let query = source(&transport)
        .with_decoder(Arc::new(JsonLines))
        .table::<OreOre>("OreOre")
        .unwrap()
        .r#where(field("ID").gt(0))
        .select::<IdName, _, _>(["ID", "Name"]);
    let rows = query.fetch_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].name, "b");
}

#[test]
fn independent_chains_run_concurrently() {
    let transport = Arc::new(StaticTransport::ok(r#"[{"ID":5,"Name":"e"}]"#));
    let source = source(&transport);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let source = source.clone();
            std::thread::spawn(move || {
                let query = source
                    .table::<OreOre>("OreOre")
                    .unwrap()
                    .r#where(field("ID").ge(i))
                    .select::<IdName, _, _>(["ID", "Name"]);
                query.fetch_all().unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().len(), 1);
    }
    assert_eq!(transport.calls(), 4);
}
