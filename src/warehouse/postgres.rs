//! # PostgreSQL Warehouse
//!
//! One connection per call, dropped on every exit path. Statements are
//! prepared first so the projected column names are known even when no row
//! comes back. Rows are decoded cell by cell from the prepared statement's
//! own result, so the statement's `ORDER BY` is the row order.
//!
//! Cells become JSON the way `row_to_json` would render them: numbers stay
//! numbers, dates and timestamps become ISO strings. Types with no decoder
//! here come back as null.

use std::error::Error;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

use crate::catalog::SchemaCatalog;
use crate::observability::Logger;
use crate::query::{ResultSet, SqlValue};

use super::backend::Warehouse;
use super::errors::{WarehouseError, WarehouseResult};

const INTROSPECTION_SQL: &str = "SELECT table_name::text, column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_schema = $1 \
     ORDER BY table_name, ordinal_position";

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    #[serde(default)]
    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Schema whose tables are exposed
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "gbads".to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: String::new(),
            password: String::new(),
            schema: default_schema(),
        }
    }
}

impl PgConfig {
    fn to_pg(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .application_name("gbads-engine");
        if !self.user.is_empty() {
            config.user(&self.user);
        }
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

/// Warehouse backed by a PostgreSQL server
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    config: PgConfig,
}

impl PgWarehouse {
    pub fn new(config: PgConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> WarehouseResult<Client> {
        let (client, connection) = self
            .config
            .to_pg()
            .connect(NoTls)
            .await
            .map_err(map_pg_error)?;

        // The driver task ends once the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                Logger::warn("WAREHOUSE_CONNECTION_ERROR", &[("error", &e.to_string())]);
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn introspect_schema(&self) -> WarehouseResult<SchemaCatalog> {
        let client = self.connect().await?;
        let rows = client
            .query(INTROSPECTION_SQL, &[&self.config.schema])
            .await
            .map_err(map_pg_error)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let table: String = row.try_get(0).map_err(map_pg_error)?;
            let column: String = row.try_get(1).map_err(map_pg_error)?;
            let data_type: String = row.try_get(2).map_err(map_pg_error)?;
            entries.push((table, column, data_type));
        }

        Logger::info(
            "WAREHOUSE_INTROSPECTED",
            &[
                ("schema", &self.config.schema),
                ("columns", &entries.len().to_string()),
            ],
        );
        Ok(SchemaCatalog::from_introspection(entries))
    }

    async fn execute(&self, template: &str, params: &[SqlValue]) -> WarehouseResult<ResultSet> {
        let client = self.connect().await?;

        let prepared = client.prepare(template).await.map_err(map_pg_error)?;
        let columns: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client
            .query(&prepared, &bound)
            .await
            .map_err(map_pg_error)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(
                (0..columns.len())
                    .map(|idx| decode_cell(row, idx))
                    .collect::<WarehouseResult<Vec<_>>>()?,
            );
        }

        Ok(ResultSet::new(columns, out))
    }
}

fn decode_cell(row: &Row, idx: usize) -> WarehouseResult<Value> {
    let ty = row.columns()[idx].type_().clone();
    let cell = match ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::from)),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx).map(|v| v.map(Value::from)),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx).map(|v| v.map(Value::from)),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::from)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|f| Value::from(f64::from(f)))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map(|v| v.map(Value::from)),
        Type::NUMERIC => row
            .try_get::<_, Option<NumericText>>(idx)
            .map(|v| v.map(NumericText::into_json)),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map(|v| v.map(|d| Value::String(d.to_string()))),
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx).map(|v| {
            v.map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        }),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx).map(|v| {
            v.map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, false)))
        }),
        Type::UUID => row
            .try_get::<_, Option<Uuid>>(idx)
            .map(|v| v.map(|u| Value::String(u.to_string()))),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(Value::String)),
        ref other if matches!(other.kind(), Kind::Enum(_)) => row
            .try_get::<_, Option<EnumText>>(idx)
            .map(|v| v.map(|e| Value::String(e.0))),
        _ => Ok(None),
    };
    Ok(cell.map_err(map_pg_error)?.unwrap_or(Value::Null))
}

type DecodeError = Box<dyn Error + Sync + Send>;

/// `numeric` cell rendered as decimal text from the binary wire format
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumericText(String);

impl NumericText {
    const NEGATIVE: u16 = 0x4000;
    const NAN: u16 = 0xC000;

    /// JSON number when representable, else the decimal text
    fn into_json(self) -> Value {
        serde_json::from_str::<serde_json::Number>(&self.0)
            .map(Value::Number)
            .unwrap_or(Value::String(self.0))
    }
}

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        let word = |i: usize| -> Result<u16, DecodeError> {
            raw.get(i * 2..i * 2 + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "truncated numeric".into())
        };

        let ndigits = usize::from(word(0)?);
        let weight = i32::from(word(1)? as i16);
        let sign = word(2)?;
        let dscale = usize::from(word(3)?);
        if sign == Self::NAN {
            return Ok(NumericText("NaN".to_string()));
        }
        let digits = (0..ndigits)
            .map(|i| word(4 + i))
            .collect::<Result<Vec<_>, _>>()?;

        // Base-10000 digit for 10000^exp
        let digit_at = |exp: i32| -> u16 {
            usize::try_from(weight - exp)
                .ok()
                .and_then(|i| digits.get(i).copied())
                .unwrap_or(0)
        };

        let mut text = String::new();
        if sign == Self::NEGATIVE {
            text.push('-');
        }
        if weight < 0 {
            text.push('0');
        } else {
            text.push_str(&digit_at(weight).to_string());
            for exp in (0..weight).rev() {
                text.push_str(&format!("{:04}", digit_at(exp)));
            }
        }
        if dscale > 0 {
            let mut fraction = String::new();
            let mut exp = -1;
            while fraction.len() < dscale {
                fraction.push_str(&format!("{:04}", digit_at(exp)));
                exp -= 1;
            }
            fraction.truncate(dscale);
            text.push('.');
            text.push_str(&fraction);
        }
        Ok(NumericText(text))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Enum labels travel as UTF-8 text
struct EnumText(String);

impl<'a> FromSql<'a> for EnumText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        Ok(EnumText(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn map_pg_error(err: tokio_postgres::Error) -> WarehouseError {
    match err.as_db_error() {
        Some(db) if db.code() == &SqlState::INSUFFICIENT_PRIVILEGE => {
            WarehouseError::Permission(db.message().to_string())
        }
        Some(db) => WarehouseError::Query(db.message().to_string()),
        None => WarehouseError::Connection(err.to_string()),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Integer(i) if <i64 as ToSql>::accepts(ty) => i.to_sql(ty, out),
            SqlValue::Float(f) if <f64 as ToSql>::accepts(ty) => f.to_sql(ty, out),
            SqlValue::Boolean(b) if <bool as ToSql>::accepts(ty) => b.to_sql(ty, out),
            SqlValue::Text(s) if <&str as ToSql>::accepts(ty) => s.as_str().to_sql(ty, out),
            SqlValue::Null => Ok(IsNull::Yes),
            other => Err(format!("cannot bind {:?} as {}", other, ty).into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT8 | Type::FLOAT8 | Type::BOOL | Type::TEXT | Type::VARCHAR | Type::UNKNOWN
        )
    }

    to_sql_checked!();
}
