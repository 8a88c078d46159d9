//! Verbatim execution of console commands that passed the guard.

use crate::config::ConsoleConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::{StreamExt, TryStreamExt};
use pgwarden_schema::ConsoleResponse;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column, Executor as _, PgConnection, PgPool, Row, TypeInfo};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Runs `command` and collects at most `max_rows` rows.
///
/// In read-only mode the command runs inside a `READ ONLY` transaction that is rolled
/// back afterwards, so a write that slips past the guard fails in the database.
pub async fn execute(
    pool: &PgPool,
    command: &str,
    settings: &ConsoleConfig,
) -> Result<ConsoleResponse, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let (rows, truncated) = match run_in(&mut tx, command, settings).await {
        Ok(fetched) => fetched,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Console rollback failed");
            }
            return Err(err);
        }
    };

    if settings.read_only {
        tx.rollback().await?;
    } else {
        tx.commit().await?;
    }
    debug!(rows = rows.len(), truncated, "Console command finished");
    Ok(ConsoleResponse::from_rows(rows, truncated))
}

async fn run_in(
    conn: &mut PgConnection,
    command: &str,
    settings: &ConsoleConfig,
) -> Result<(Vec<Map<String, Value>>, bool), sqlx::Error> {
    if settings.read_only {
        (&mut *conn)
            .execute(sqlx::raw_sql("SET TRANSACTION READ ONLY"))
            .await?;
    }
    let (rows, truncated) = fetch_capped(conn, command, settings.max_rows).await?;
    Ok((rows.iter().map(row_to_json).collect(), truncated))
}

/// Reads one row past the cap to learn whether the result was cut short.
async fn fetch_capped(
    conn: &mut PgConnection,
    command: &str,
    max_rows: usize,
) -> Result<(Vec<PgRow>, bool), sqlx::Error> {
    let mut rows: Vec<PgRow> = sqlx::query(command)
        .persistent(false)
        .fetch(conn)
        .take(max_rows.saturating_add(1))
        .try_collect()
        .await?;
    let truncated = rows.len() > max_rows;
    rows.truncate(max_rows);
    Ok((rows, truncated))
}

pub fn row_to_json(row: &PgRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| {
            (
                column.name().to_string(),
                column_value(row, column.ordinal(), column.type_info().name()),
            )
        })
        .collect()
}

fn decode<'r, T>(row: &'r PgRow, idx: usize, to_json: impl FnOnce(T) -> Value) -> Result<Value, sqlx::Error>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(idx)
        .map(|value| value.map_or(Value::Null, to_json))
}

fn display_array<T: ToString>(values: Vec<T>) -> Value {
    Value::Array(values.iter().map(|v| Value::from(v.to_string())).collect())
}

/// `\x`-prefixed lowercase hex, as psql prints `bytea`.
pub fn format_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Interval in PostgreSQL's default output style, e.g. `1 year 2 mons 3 days 04:05:06.5`.
pub fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    for (n, unit) in [(years, "year"), (months, "mon"), (interval.days, "day")] {
        match n {
            0 => {}
            1 | -1 => parts.push(format!("{n} {unit}")),
            _ => parts.push(format!("{n} {unit}s")),
        }
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let frac = micros % 1_000_000;
        if frac != 0 {
            let digits = format!("{frac:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

/// `money` at the default two-digit scale.
pub fn format_money(money: PgMoney) -> String {
    let sign = if money.0 < 0 { "-" } else { "" };
    let cents = money.0.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// JSON rendering for one column. Exact numerics, identifiers and addresses come back
/// as strings so no precision is lost. Types without a mapping are tried as text and
/// otherwise shown as `<TYPE>`; cast them to `text` in the query to see the value.
fn column_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOL" => decode::<bool>(row, idx, Value::from),
        "INT2" => decode::<i16>(row, idx, Value::from),
        "INT4" => decode::<i32>(row, idx, Value::from),
        "INT8" => decode::<i64>(row, idx, Value::from),
        "FLOAT4" => decode::<f32>(row, idx, |v| Value::from(f64::from(v))),
        "FLOAT8" => decode::<f64>(row, idx, Value::from),
        "OID" => decode::<Oid>(row, idx, |v| Value::from(v.0)),
        "NUMERIC" => decode::<BigDecimal>(row, idx, |v| Value::from(v.to_string())),
        "MONEY" => decode::<PgMoney>(row, idx, |v| Value::from(format_money(v))),
        "UUID" => decode::<Uuid>(row, idx, |v| Value::from(v.to_string())),
        "INET" | "CIDR" => decode::<IpNetwork>(row, idx, |v| Value::from(v.to_string())),
        "INTERVAL" => decode::<PgInterval>(row, idx, |v| Value::from(format_interval(&v))),
        "BYTEA" => decode::<Vec<u8>>(row, idx, |v| Value::from(format_bytea(&v))),
        "\"CHAR\"" => decode::<i8>(row, idx, |v| {
            Value::from(char::from(v.to_ne_bytes()[0]).to_string())
        }),
        "JSON" | "JSONB" => decode::<Value>(row, idx, |v| v),
        "TIMESTAMPTZ" => decode::<DateTime<Utc>>(row, idx, |v| Value::from(v.to_rfc3339())),
        "TIMESTAMP" => decode::<NaiveDateTime>(row, idx, |v| Value::from(v.to_string())),
        "DATE" => decode::<NaiveDate>(row, idx, |v| Value::from(v.to_string())),
        "TIME" => decode::<NaiveTime>(row, idx, |v| Value::from(v.to_string())),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" | "BPCHAR[]" => {
            decode::<Vec<String>>(row, idx, Value::from)
        }
        "BOOL[]" => decode::<Vec<bool>>(row, idx, Value::from),
        "INT2[]" => decode::<Vec<i16>>(row, idx, Value::from),
        "INT4[]" => decode::<Vec<i32>>(row, idx, Value::from),
        "INT8[]" => decode::<Vec<i64>>(row, idx, Value::from),
        "FLOAT8[]" => decode::<Vec<f64>>(row, idx, Value::from),
        "NUMERIC[]" => decode::<Vec<BigDecimal>>(row, idx, display_array),
        "UUID[]" => decode::<Vec<Uuid>>(row, idx, display_array),
        _ => decode::<String>(row, idx, Value::from),
    };
    decoded.unwrap_or_else(|_| Value::String(format!("<{type_name}>")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytea_renders_as_escaped_hex() {
        assert_eq!(format_bytea(&[0xde, 0xad, 0x01]), "\\xdead01");
        assert_eq!(format_bytea(&[]), "\\x");
    }

    #[test]
    fn interval_renders_like_postgres() {
        let interval = PgInterval {
            months: 14,
            days: 3,
            microseconds: 4 * 3_600_000_000 + 5 * 60_000_000 + 6_500_000,
        };
        assert_eq!(format_interval(&interval), "1 year 2 mons 3 days 04:05:06.5");

        let zero = PgInterval {
            months: 0,
            days: 0,
            microseconds: 0,
        };
        assert_eq!(format_interval(&zero), "00:00:00");

        let negative = PgInterval {
            months: 0,
            days: 1,
            microseconds: -90_000_000,
        };
        assert_eq!(format_interval(&negative), "1 day -00:01:30");
    }

    #[test]
    fn money_keeps_two_decimals() {
        assert_eq!(format_money(PgMoney(1250)), "12.50");
        assert_eq!(format_money(PgMoney(-5)), "-0.05");
    }
}
