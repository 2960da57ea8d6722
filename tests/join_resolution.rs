//! Join Resolution Tests
//!
//! - Connected chains resolve in input order
//! - A step whose left table is not yet in scope is disconnected
//! - Joined statements qualify every column reference

use gbads_engine::catalog::SchemaCatalog;
use gbads_engine::query::{
    build, parse, parse_order, resolve, ColumnScope, FieldSelection, JoinSpec, OutputFormat,
    QueryErrorKind, QuerySpec, SqlValue, Stage,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_table(
            "biomass_oie",
            &[
                ("member_country", "text"),
                ("year", "integer"),
                ("biomass", "double precision"),
            ],
        )
        .with_table(
            "countries_geo_area",
            &[("country", "text"), ("area", "numeric")],
        )
        .with_table(
            "countries_iso",
            &[("country", "text"), ("iso3", "text"), ("area", "numeric")],
        )
}

fn geo_join() -> JoinSpec {
    JoinSpec::new("biomass_oie", "member_country", "countries_geo_area", "country")
}

// =============================================================================
// Plan Tests
// =============================================================================

/// One step from the primary table.
#[test]
fn test_single_step_plan() {
    let plan = resolve(&[geo_join()], "biomass_oie", &catalog()).unwrap();
    assert_eq!(plan.primary(), "biomass_oie");
    assert_eq!(plan.steps().len(), 1);
    assert_eq!(plan.steps()[0].right_table, "countries_geo_area");
    assert_eq!(
        plan.tables().collect::<Vec<_>>(),
        vec!["biomass_oie", "countries_geo_area"]
    );
}

/// Steps may start from any table already introduced.
#[test]
fn test_chain_resolves_in_input_order() {
    let joins = [
        geo_join(),
        JoinSpec::new("countries_geo_area", "country", "countries_iso", "country"),
    ];
    let plan = resolve(&joins, "biomass_oie", &catalog()).unwrap();
    assert_eq!(
        plan.tables().collect::<Vec<_>>(),
        vec!["biomass_oie", "countries_geo_area", "countries_iso"]
    );
}

/// First step not anchored on the primary table.
#[test]
fn test_disconnected_first_step() {
    let joins = [JoinSpec::new(
        "countries_geo_area",
        "country",
        "countries_iso",
        "country",
    )];
    let err = resolve(&joins, "biomass_oie", &catalog()).unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::DisconnectedJoin);
    assert_eq!(err.stage(), Stage::Join);
}

/// Reordering a valid chain breaks it.
#[test]
fn test_out_of_order_chain_is_disconnected() {
    let joins = [
        JoinSpec::new("countries_geo_area", "country", "countries_iso", "country"),
        geo_join(),
    ];
    let err = resolve(&joins, "biomass_oie", &catalog()).unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::DisconnectedJoin);
}

#[test]
fn test_unknown_tables_and_keys() {
    let catalog = catalog();

    let err = resolve(&[geo_join()], "nope", &catalog).unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::UnknownTable);
    assert_eq!(err.stage(), Stage::Validate);

    let missing_table = JoinSpec::new("biomass_oie", "member_country", "ghost", "country");
    assert_eq!(
        resolve(&[missing_table], "biomass_oie", &catalog)
            .unwrap_err()
            .kind(),
        QueryErrorKind::UnknownTable
    );

    let missing_key = JoinSpec::new("biomass_oie", "ghost", "countries_geo_area", "country");
    let err = resolve(&[missing_key], "biomass_oie", &catalog).unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
    assert_eq!(err.stage(), Stage::Join);
}

#[test]
fn test_table_joined_twice() {
    let joins = [geo_join(), geo_join()];
    assert_eq!(
        resolve(&joins, "biomass_oie", &catalog()).unwrap_err().kind(),
        QueryErrorKind::MalformedJoin
    );
}

// =============================================================================
// Wire Form Tests
// =============================================================================

#[test]
fn test_parse_wire_list() {
    let joins = JoinSpec::parse_list(
        "biomass_oie,countries_geo_area,member_country,country; \
         countries_geo_area,countries_iso,country,country",
    )
    .unwrap();
    assert_eq!(joins.len(), 2);
    assert_eq!(joins[0], geo_join());

    for raw in ["a,b,c", "a,b,c,d,e", "a,,c,d"] {
        assert_eq!(
            JoinSpec::parse_list(raw).unwrap_err().kind(),
            QueryErrorKind::MalformedJoin,
            "{}",
            raw
        );
    }
}

// =============================================================================
// Scope And Statement Tests
// =============================================================================

#[test]
fn test_ambiguous_unqualified_column() {
    let catalog = catalog();
    let joins = [
        geo_join(),
        JoinSpec::new("countries_geo_area", "country", "countries_iso", "country"),
    ];
    let plan = resolve(&joins, "biomass_oie", &catalog).unwrap();
    let scope = ColumnScope::for_plan(&catalog, &plan).unwrap();

    let err = parse("area>100", &scope).unwrap_err();
    assert_eq!(err.kind(), QueryErrorKind::AmbiguousColumn);

    // Qualified names and primary-table columns resolve
    assert!(parse("countries_iso.area>100 AND year=2019", &scope).is_ok());
    assert!(parse("iso3='ETH'", &scope).is_ok());
}

#[test]
fn test_joined_statement_is_qualified() {
    let catalog = catalog();
    let plan = resolve(&[geo_join()], "biomass_oie", &catalog).unwrap();
    let scope = ColumnScope::for_plan(&catalog, &plan).unwrap();

    let spec = QuerySpec {
        table: "biomass_oie".to_string(),
        fields: FieldSelection::parse("member_country,area"),
        predicate: Some(parse("year=2019", &scope).unwrap()),
        order: parse_order("area desc", &scope).unwrap(),
        joins: plan,
        format: OutputFormat::Structured,
        count_only: false,
    };
    let stmt = build(&catalog, &spec).unwrap();

    assert_eq!(
        stmt.template,
        "SELECT \"biomass_oie\".\"member_country\" AS \"member_country\", \
         \"countries_geo_area\".\"area\" AS \"area\" \
         FROM \"biomass_oie\" \
         INNER JOIN \"countries_geo_area\" \
         ON \"biomass_oie\".\"member_country\" = \"countries_geo_area\".\"country\" \
         WHERE \"biomass_oie\".\"year\" = $1::bigint \
         ORDER BY \"countries_geo_area\".\"area\" DESC"
    );
    assert_eq!(stmt.params, vec![SqlValue::Integer(2019)]);
    assert_eq!(stmt.columns, vec!["member_country", "area"]);
}

#[test]
fn test_joined_wildcard_aliases_every_column() {
    let catalog = catalog();
    let plan = resolve(&[geo_join()], "biomass_oie", &catalog).unwrap();
    let spec = QuerySpec {
        table: "biomass_oie".to_string(),
        fields: FieldSelection::All,
        predicate: None,
        joins: plan,
        order: Vec::new(),
        format: OutputFormat::Text,
        count_only: false,
    };
    let stmt = build(&catalog, &spec).unwrap();
    assert_eq!(
        stmt.columns,
        vec![
            "biomass_oie.member_country",
            "biomass_oie.year",
            "biomass_oie.biomass",
            "countries_geo_area.country",
            "countries_geo_area.area",
        ]
    );
}
