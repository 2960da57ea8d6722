//! Livestock population shortcut
//!
//! Fixed projections over the two national population tables. Optional
//! filters are composed as filter-grammar text with every value quoted, so
//! they go through the ordinary parser and end up bound.

use std::str::FromStr;

use serde::Deserialize;

use super::builder::FieldSelection;
use super::engine::QueryRequest;
use super::errors::{QueryError, QueryErrorKind, QueryResult, Stage};
use super::render::OutputFormat;

/// Population data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationSource {
    /// WOAH (OIE) national reports
    Oie,
    /// FAOSTAT country estimates
    Faostat,
}

impl PopulationSource {
    pub fn table(&self) -> &'static str {
        match self {
            PopulationSource::Oie => "livestock_national_population_oie",
            PopulationSource::Faostat => "livestock_countries_population_faostat",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            PopulationSource::Oie => &["country", "year", "species", "population", "metadataflags"],
            PopulationSource::Faostat => &["iso3", "country", "year", "species", "population"],
        }
    }

    /// Member species of an aggregate name, if it is one
    pub fn species_group(&self, species: &str) -> Option<&'static [&'static str]> {
        let group: &'static [&'static str] = match (self, species) {
            (PopulationSource::Oie, "Poultry") => &[
                "Birds",
                "Layers",
                "Broilers",
                "Turkeys",
                "Other commercial poultry",
                "Backyard poultry",
            ],
            (PopulationSource::Oie, "All Cattle") => &[
                "Cattle",
                "Male and female cattle",
                "Adult beef cattle",
                "Adult dairy cattle",
                "Calves",
            ],
            (PopulationSource::Oie, "All Swine") => &[
                "Swine",
                "Adult pigs",
                "Backyard pigs",
                "Commercial pigs",
                "Fattening pigs",
                "Piglets",
            ],
            (PopulationSource::Oie, "All Sheep") => &["Sheep", "Adult sheep", "Lambs"],
            (PopulationSource::Oie, "All Goats") => &["Goats", "Adult goats", "Kids"],
            (PopulationSource::Oie, "All Equids") => {
                &["Equidae", "Domestic Horses", "Donkeys/ Mules/ Hinnies"]
            }
            (PopulationSource::Faostat, "Poultry") => {
                &["Chickens", "Turkeys", "Ducks", "Geese and guinea fowls"]
            }
            _ => return None,
        };
        Some(group)
    }
}

impl FromStr for PopulationSource {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oie" => Ok(PopulationSource::Oie),
            "faostat" => Ok(PopulationSource::Faostat),
            other => Err(QueryError::new(
                Stage::Validate,
                QueryErrorKind::UnknownTable,
                format!("unknown data source '{}'; use oie or faostat", other),
            )),
        }
    }
}

/// Optional filters; `*` or absent means no filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopulationFilter {
    pub year: Option<String>,
    pub iso3: Option<String>,
    pub country: Option<String>,
    pub species: Option<String>,
}

fn given(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "*")
}

fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the engine request for a population lookup
pub fn population_request(
    source: &str,
    filter: &PopulationFilter,
    format: OutputFormat,
) -> QueryResult<QueryRequest> {
    let source: PopulationSource = source.parse()?;

    let mut clauses = Vec::new();
    if let Some(year) = given(&filter.year) {
        clauses.push(format!("year={}", quoted(year)));
    }
    if let Some(country) = given(&filter.country) {
        clauses.push(format!("country={}", quoted(country)));
    }
    if source == PopulationSource::Faostat {
        if let Some(iso3) = given(&filter.iso3) {
            clauses.push(format!("iso3={}", quoted(iso3)));
        }
    }
    if let Some(species) = given(&filter.species) {
        match source.species_group(species) {
            Some(members) => {
                let alternatives: Vec<String> = members
                    .iter()
                    .map(|m| format!("species={}", quoted(m)))
                    .collect();
                clauses.push(format!("({})", alternatives.join(" OR ")));
            }
            None => clauses.push(format!("species={}", quoted(species))),
        }
    }

    let fields = source.fields().iter().map(|f| f.to_string()).collect();
    Ok(QueryRequest {
        table: source.table().to_string(),
        fields: FieldSelection::Columns(fields),
        filter: (!clauses.is_empty()).then(|| clauses.join(" AND ")),
        format,
        ..QueryRequest::default()
    })
}
