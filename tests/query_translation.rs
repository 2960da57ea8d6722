//! Query Translation Tests
//!
//! End-to-end checks from request parameters to the statement handed to the
//! warehouse:
//! - Literals only ever reach the warehouse as bound parameters
//! - Unknown identifiers fail before anything is executed
//! - Count-only requests produce a single count

use std::sync::Arc;

use gbads_engine::catalog::SchemaCatalog;
use gbads_engine::query::{
    build, parse, ColumnScope, FieldSelection, JoinPlan, OutputFormat, QueryEngine,
    QueryErrorKind, QueryParams, QueryRequest, QuerySpec, ResultSet, SqlValue, Stage,
};
use gbads_engine::warehouse::InMemoryWarehouse;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_table(
            "livestock_production_faostat",
            &[
                ("country", "character varying"),
                ("year", "integer"),
                ("species", "text"),
                ("population", "numeric"),
                ("flag", "boolean"),
                ("reported", "date"),
            ],
        )
        .with_table(
            "biomass_oie",
            &[
                ("member_country", "text"),
                ("year", "integer"),
                ("biomass", "double precision"),
            ],
        )
}

fn engine() -> (QueryEngine, Arc<InMemoryWarehouse>) {
    let warehouse = Arc::new(InMemoryWarehouse::new(catalog()));
    let engine = QueryEngine::new(Arc::new(catalog()), warehouse.clone());
    (engine, warehouse)
}

fn spec_for(catalog: &SchemaCatalog, table: &str, filter: &str) -> QuerySpec {
    let joins = JoinPlan::empty(table);
    let scope = ColumnScope::for_plan(catalog, &joins).unwrap();
    QuerySpec {
        table: table.to_string(),
        fields: FieldSelection::All,
        predicate: Some(parse(filter, &scope).unwrap()),
        joins,
        order: Vec::new(),
        format: OutputFormat::Text,
        count_only: false,
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Four projected columns, two bound values.
#[tokio::test]
async fn test_goats_2017_scenario() {
    let (engine, warehouse) = engine();
    let params = QueryParams {
        fields: Some("country,year,species,population".into()),
        query: Some("year=2017 AND species='Goats'".into()),
        format: Some("json".into()),
        ..Default::default()
    };
    let request = QueryRequest::from_params("livestock_production_faostat", &params).unwrap();
    engine.handle(&request).await.unwrap();

    let executed = warehouse.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].template,
        "SELECT \"country\", \"year\", \"species\", \"population\" \
         FROM \"livestock_production_faostat\" \
         WHERE (\"year\" = $1::bigint AND \"species\" = $2::text)"
    );
    assert_eq!(
        executed[0].params,
        vec![SqlValue::Integer(2017), SqlValue::Text("Goats".into())]
    );
}

/// Count-only ignores the field list and yields one value.
#[tokio::test]
async fn test_count_only_scenario() {
    let (engine, warehouse) = engine();
    warehouse.push_result(ResultSet::new(vec!["count".into()], vec![vec![json!(7)]]));

    let params = QueryParams {
        fields: Some("country,species".into()),
        query: Some("year>=2010".into()),
        format: Some("text".into()),
        count: Some("yes".into()),
        ..Default::default()
    };
    let request = QueryRequest::from_params("livestock_production_faostat", &params).unwrap();
    let rendered = engine.handle(&request).await.unwrap();

    assert_eq!(rendered.body, "count\n7\n");
    assert!(warehouse.executed()[0]
        .template
        .starts_with("SELECT COUNT(*) AS \"count\" FROM"));
}

/// An unknown filter column never reaches the warehouse.
#[tokio::test]
async fn test_bogus_column_scenario() {
    let (engine, warehouse) = engine();
    let request = QueryRequest {
        filter: Some("bogus_col=1".into()),
        ..QueryRequest::new("livestock_production_faostat")
    };
    let err = engine.handle(&request).await.unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
    assert_eq!(err.stage(), Stage::Parse);
    assert_eq!(warehouse.execution_count(), 0);
}

#[tokio::test]
async fn test_unknown_projected_field() {
    let (engine, warehouse) = engine();
    let request = QueryRequest {
        fields: FieldSelection::parse("country,nope"),
        ..QueryRequest::new("livestock_production_faostat")
    };
    let err = engine.handle(&request).await.unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
    assert_eq!(warehouse.execution_count(), 0);
}

/// Unquoted identifiers fold to lowercase; output keeps the caller's names.
#[tokio::test]
async fn test_mixed_case_identifiers() {
    let (engine, warehouse) = engine();
    let params = QueryParams {
        fields: Some("Country,Year".into()),
        query: Some("Year=2017".into()),
        order: Some("YEAR desc".into()),
        ..Default::default()
    };
    let request = QueryRequest::from_params("livestock_production_faostat", &params).unwrap();
    let rendered = engine.handle(&request).await.unwrap();

    assert_eq!(rendered.body, "Country,Year\n");
    assert_eq!(
        warehouse.executed()[0].template,
        "SELECT \"country\" AS \"Country\", \"year\" AS \"Year\" \
         FROM \"livestock_production_faostat\" \
         WHERE \"year\" = $1::bigint ORDER BY \"year\" DESC"
    );
}

// =============================================================================
// Injection Safety Tests
// =============================================================================

/// Literal text never appears in the template.
#[test]
fn test_literals_are_never_inlined() {
    let catalog = catalog();
    let hostile = [
        "country='x'' OR 1=1 --'",
        "country='Robert''); DROP TABLE livestock_production_faostat;--'",
        "species='a\"b' OR country='<script>'",
        "year=31337",
    ];
    for filter in hostile {
        let spec = spec_for(&catalog, "livestock_production_faostat", filter);
        let stmt = build(&catalog, &spec).unwrap();
        for param in &stmt.params {
            let text = match param {
                SqlValue::Text(s) => s.clone(),
                SqlValue::Integer(i) => i.to_string(),
                other => panic!("unexpected param {:?}", other),
            };
            assert!(
                !stmt.template.contains(&text),
                "literal '{}' leaked into '{}'",
                text,
                stmt.template
            );
        }
        assert!(!stmt.template.contains("DROP"));
    }
}

#[test]
fn test_identifier_injection_rejected() {
    let catalog = catalog();
    let scope = ColumnScope::for_table(&catalog, "livestock_production_faostat").unwrap();
    for filter in ["\"year\"=1", "year;DROP=1", "1=year"] {
        assert!(parse(filter, &scope).is_err(), "{}", filter);
    }
}

// =============================================================================
// Typing Tests
// =============================================================================

#[test]
fn test_column_types_drive_binding() {
    let catalog = catalog();
    let spec = spec_for(
        &catalog,
        "livestock_production_faostat",
        "flag=true AND reported>='2020-01-01' AND population<>'12'",
    );
    let stmt = build(&catalog, &spec).unwrap();

    assert!(stmt.template.contains("\"flag\" = $1::boolean"));
    assert!(stmt.template.contains("\"reported\" >= $2::text::date"));
    assert!(stmt.template.contains("\"population\" <> $3::double precision"));
    assert_eq!(
        stmt.params,
        vec![
            SqlValue::Boolean(true),
            SqlValue::Text("2020-01-01".into()),
            SqlValue::Float(12.0),
        ]
    );
}

#[test]
fn test_malformed_filters() {
    let catalog = catalog();
    let scope = ColumnScope::for_table(&catalog, "biomass_oie").unwrap();
    for filter in [
        "year=",
        "year=2017 AND",
        "(year=2017",
        "year=2017)",
        "year 2017",
        "member_country='open",
        "year='abc'",
    ] {
        assert_eq!(
            parse(filter, &scope).unwrap_err().kind(),
            QueryErrorKind::MalformedFilter,
            "{}",
            filter
        );
    }
}

#[tokio::test]
async fn test_ordering_reaches_statement() {
    let (engine, warehouse) = engine();
    let params = QueryParams {
        order: Some("year desc, member_country".into()),
        ..Default::default()
    };
    let request = QueryRequest::from_params("biomass_oie", &params).unwrap();
    engine.handle(&request).await.unwrap();

    assert!(warehouse.executed()[0]
        .template
        .ends_with(" ORDER BY \"year\" DESC, \"member_country\" ASC"));
}
