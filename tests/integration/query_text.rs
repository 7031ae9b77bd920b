//! Query text produced by each builder stage.

use std::sync::Arc;

use querywire::query::{call, field, lit, parse_predicate, Expr, RecordShape, Value};
use querywire::transport::StaticTransport;
use querywire::{QueryError, Source};
use serde::Deserialize;

struct Employee;

impl RecordShape for Employee {
    const NAME: &'static str = "Employee";
    const FIELDS: &'static [&'static str] = &["ID", "Name", "Dept", "Salary", "Active"];
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Summary {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Name")]
    name: String,
}

fn source() -> (Source, Arc<StaticTransport>) {
    let transport = Arc::new(StaticTransport::ok("[]"));
    let source = Source::new(
        "http://api.example.com/v1".parse().unwrap(),
        transport.clone(),
    );
    (source, transport)
}

#[test]
fn bare_table_renders_select_star() {
    let (source, _) = source();
    let table = source.table::<Employee>("Employees").unwrap();
    assert_eq!(table.render(), "SELECT * FROM [Employees]");
}

#[test]
fn filter_stage_omits_brackets() {
    let (source, _) = source();
    let filter = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(field("Dept").eq("R&D").and(field("Salary").gt(50_000)));
    assert_eq!(
        filter.render().unwrap(),
        "SELECT * FROM Employees WHERE ((Dept == \"R&D\") && (Salary > 50000))"
    );
}

#[test]
fn select_stage_restores_brackets_and_lists_fields() {
    let (source, transport) = source();
    let query = source
        .table::<Employee>("OreOre")
        .unwrap()
        .r#where(field("ID").eq(123))
        .select::<Summary, _, _>(["ID", "Name"]);
    let first = query.render().unwrap();
    assert_eq!(first, "SELECT ID,Name FROM [OreOre] WHERE (ID == 123)");
    assert_eq!(query.render().unwrap(), first);
    assert_eq!(transport.calls(), 0);
}

#[test]
fn predicate_with_every_operator() {
    let (source, _) = source();
    let predicate = field("Salary")
        .ge(1000)
        .and(field("Salary").le(2000.5))
        .and(field("ID").ne(0))
        .or(field("Dept").lt("M").and(!field("Active")))
        .or(field("Name").eq(lit(Value::Null)));
    let filter = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(predicate);
    assert_eq!(
        filter.render_predicate().unwrap(),
        "(((Salary >= 1000) && (Salary <= 2000.5) && (ID != 0)) || \
         ((Dept < \"M\") && !Active) || (Name == null))"
    );
}

#[test]
fn parsed_predicate_renders_like_built_one() {
    let (source, _) = source();
    let built = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(field("ID").eq(123).or(field("Name").eq("abc")));
    let parsed = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(parse_predicate("ID == 123 || Name == \"abc\"").unwrap());
    assert_eq!(built.render().unwrap(), parsed.render().unwrap());
}

#[test]
fn computed_projection_fails_without_fetching() {
    let (source, transport) = source();
    let query = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(field("Active").eq(true))
        .select::<serde_json::Value, _, Expr>([field("ID"), field("Salary").times(12)]);
    let err = query.render().unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedProjection {
            position: 1,
            kind: "arithmetic"
        }
    ));
    let mut rows = query.iter();
    assert!(matches!(
        rows.next(),
        Some(Err(QueryError::UnsupportedProjection { .. }))
    ));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn unsupported_predicate_fails_without_fetching() {
    let (source, transport) = source();
    let query = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(call("upper", [field("Name")]).eq("ADA"))
        .select::<serde_json::Value, _, _>(["Name"]);
    let err = query.fetch_all().unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedExpression { kind: "call" }));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn undeclared_field_is_reported_with_shape() {
    let (source, _) = source();
    let query = source
        .table::<Employee>("Employees")
        .unwrap()
        .r#where(field("ID").eq(1))
        .select::<serde_json::Value, _, _>(["ID", "Manager"]);
    let err = query.render().unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'Manager' is not declared by record shape 'Employee'"
    );
}

#[test]
fn empty_table_name_fails_at_construction() {
    let (source, _) = source();
    let err = source.table::<Employee>("").unwrap_err();
    assert!(matches!(err, QueryError::InvalidArgument(_)));
}
