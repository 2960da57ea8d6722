//! Result ordering
//!
//! `column [ASC|DESC]` items separated by commas. Columns resolve through the
//! same scope as filter columns.

use super::errors::{QueryError, QueryResult, Stage};
use super::scope::{ColumnRef, ColumnScope};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A resolved ordering key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub column: ColumnRef,
    pub direction: Direction,
}

/// Parse and resolve an ordering clause. Blank input yields no keys.
pub fn parse_order(raw: &str, scope: &ColumnScope<'_>) -> QueryResult<Vec<OrderKey>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|item| {
            let words: Vec<&str> = item.split_whitespace().collect();
            let (name, direction) = match words.as_slice() {
                [name] => (*name, Direction::Asc),
                [name, dir] if dir.eq_ignore_ascii_case("asc") => (*name, Direction::Asc),
                [name, dir] if dir.eq_ignore_ascii_case("desc") => (*name, Direction::Desc),
                _ => {
                    return Err(QueryError::malformed_order(format!(
                        "order item '{}' must be 'column [ASC|DESC]'",
                        item.trim()
                    )))
                }
            };
            let column = scope.resolve(name, Stage::Order)?;
            Ok(OrderKey { column, direction })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::query::errors::QueryErrorKind;

    fn keys(raw: &str) -> QueryResult<Vec<OrderKey>> {
        let catalog = SchemaCatalog::new()
            .with_table("t", &[("year", "integer"), ("country", "text")]);
        let scope = ColumnScope::for_table(&catalog, "t").unwrap();
        parse_order(raw, &scope)
    }

    #[test]
    fn test_directions() {
        let keys = keys("year desc, country").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].direction, Direction::Desc);
        assert_eq!(keys[1].direction, Direction::Asc);
        assert_eq!(keys[1].column.column, "country");
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(keys("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed() {
        for raw in ["year sideways", "year asc extra", "year,,country", ","] {
            assert_eq!(keys(raw).unwrap_err().kind(), QueryErrorKind::MalformedOrder, "{}", raw);
        }
    }

    #[test]
    fn test_unknown_column() {
        let err = keys("bogus").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
        assert_eq!(err.stage(), Stage::Order);
    }
}
