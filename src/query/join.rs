//! Join resolution
//!
//! Caller-supplied join tuples become an ordered plan. Each step must start
//! from a table already in scope and introduce exactly one new table.

use crate::catalog::SchemaCatalog;

use super::errors::{QueryError, QueryResult, Stage};

/// One caller-supplied join tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub left_table: String,
    pub left_key: String,
    pub right_table: String,
    pub right_key: String,
}

impl JoinSpec {
    /// Create a join tuple
    pub fn new(
        left_table: impl Into<String>,
        left_key: impl Into<String>,
        right_table: impl Into<String>,
        right_key: impl Into<String>,
    ) -> Self {
        Self {
            left_table: left_table.into(),
            left_key: left_key.into(),
            right_table: right_table.into(),
            right_key: right_key.into(),
        }
    }

    /// Parse the wire form: `;`-separated entries of
    /// `left_table,right_table,left_key,right_key`.
    ///
    /// Blank input yields no joins.
    pub fn parse_list(raw: &str) -> QueryResult<Vec<JoinSpec>> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        raw.split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
                match parts.as_slice() {
                    [t1, t2, f1, f2]
                        if !t1.is_empty() && !t2.is_empty() && !f1.is_empty() && !f2.is_empty() =>
                    {
                        Ok(JoinSpec::new(*t1, *f1, *t2, *f2))
                    }
                    _ => Err(QueryError::malformed_join(format!(
                        "join entry '{}' must be table1,table2,field1,field2",
                        entry
                    ))),
                }
            })
            .collect()
    }
}

/// A validated join step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub left_table: String,
    pub left_key: String,
    pub right_table: String,
    pub right_key: String,
}

/// Primary table plus ordered join steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    primary: String,
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    /// Plan with no joins
    pub fn empty(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            steps: Vec::new(),
        }
    }

    /// Primary table
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Steps in input order
    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    /// Returns true if the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Tables in scope order, primary first
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str())
            .chain(self.steps.iter().map(|s| s.right_table.as_str()))
    }

    fn in_scope(&self, table: &str) -> bool {
        self.tables().any(|t| t == table)
    }
}

/// Validate join tuples against the catalog and the growing scope
pub fn resolve(
    joins: &[JoinSpec],
    primary: &str,
    catalog: &SchemaCatalog,
) -> QueryResult<JoinPlan> {
    if !catalog.contains_table(primary) {
        return Err(QueryError::unknown_table(Stage::Validate, primary));
    }

    let mut plan = JoinPlan::empty(primary);

    for join in joins {
        let left = catalog
            .table(&join.left_table)
            .ok_or_else(|| QueryError::unknown_table(Stage::Join, &join.left_table))?;
        let right = catalog
            .table(&join.right_table)
            .ok_or_else(|| QueryError::unknown_table(Stage::Join, &join.right_table))?;

        if !plan.in_scope(left.name()) {
            return Err(QueryError::disconnected_join(left.name(), primary));
        }
        if plan.in_scope(right.name()) {
            return Err(QueryError::malformed_join(format!(
                "table '{}' is already part of this query",
                right.name()
            )));
        }

        let left_key = left.column(&join.left_key).ok_or_else(|| {
            QueryError::unknown_column_in(Stage::Join, left.name(), &join.left_key)
        })?;
        let right_key = right.column(&join.right_key).ok_or_else(|| {
            QueryError::unknown_column_in(Stage::Join, right.name(), &join.right_key)
        })?;

        plan.steps.push(JoinStep {
            left_table: join.left_table.clone(),
            left_key: left_key.name.clone(),
            right_table: join.right_table.clone(),
            right_key: right_key.name.clone(),
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::errors::QueryErrorKind;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_table("biomass_oie", &[("member_country", "text"), ("year", "integer")])
            .with_table("countries_geo_area", &[("country", "text"), ("region", "text")])
            .with_table("regions", &[("region", "text")])
    }

    #[test]
    fn test_single_step() {
        let plan = resolve(
            &[JoinSpec::new("biomass_oie", "member_country", "countries_geo_area", "country")],
            "biomass_oie",
            &catalog(),
        )
        .unwrap();
        assert_eq!(plan.steps().len(), 1);
        assert_eq!(
            plan.tables().collect::<Vec<_>>(),
            vec!["biomass_oie", "countries_geo_area"]
        );
    }

    #[test]
    fn test_chain_keeps_input_order() {
        let plan = resolve(
            &[
                JoinSpec::new("biomass_oie", "member_country", "countries_geo_area", "country"),
                JoinSpec::new("countries_geo_area", "region", "regions", "region"),
            ],
            "biomass_oie",
            &catalog(),
        )
        .unwrap();
        assert_eq!(plan.steps()[1].right_table, "regions");
    }

    #[test]
    fn test_disconnected_first_step() {
        let err = resolve(
            &[JoinSpec::new("countries_geo_area", "region", "regions", "region")],
            "biomass_oie",
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::DisconnectedJoin);
        assert_eq!(err.stage(), Stage::Join);
    }

    #[test]
    fn test_table_joined_twice() {
        let err = resolve(
            &[JoinSpec::new("biomass_oie", "year", "biomass_oie", "year")],
            "biomass_oie",
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::MalformedJoin);
    }

    #[test]
    fn test_catalog_misses() {
        let catalog = catalog();
        let err = resolve(
            &[JoinSpec::new("biomass_oie", "member_country", "nowhere", "country")],
            "biomass_oie",
            &catalog,
        )
        .unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownTable);

        let err = resolve(
            &[JoinSpec::new("biomass_oie", "nope", "countries_geo_area", "country")],
            "biomass_oie",
            &catalog,
        )
        .unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
    }

    #[test]
    fn test_join_keys_take_catalog_spelling() {
        let plan = resolve(
            &[JoinSpec::new("biomass_oie", "Member_Country", "countries_geo_area", "COUNTRY")],
            "biomass_oie",
            &catalog(),
        )
        .unwrap();
        assert_eq!(plan.steps()[0].left_key, "member_country");
        assert_eq!(plan.steps()[0].right_key, "country");
    }

    #[test]
    fn test_parse_wire_list() {
        let joins = JoinSpec::parse_list(
            "biomass_oie,countries_geo_area,member_country,country; countries_geo_area,regions,region,region",
        )
        .unwrap();
        assert_eq!(joins.len(), 2);
        assert_eq!(
            joins[0],
            JoinSpec::new("biomass_oie", "member_country", "countries_geo_area", "country")
        );
        assert!(JoinSpec::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_wire_list_malformed() {
        for raw in ["a,b,c", "a,b,c,d,e", "a,,c,d"] {
            let err = JoinSpec::parse_list(raw).unwrap_err();
            assert_eq!(err.kind(), QueryErrorKind::MalformedJoin, "{}", raw);
        }
    }
}
