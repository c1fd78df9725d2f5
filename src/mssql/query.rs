use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use tiberius::{ColumnData, FromSql, QueryItem, QueryStream, Row};

use crate::error::QueryManagerError;
use crate::results::{DbRow, ResultSet};
use crate::types::RowValues;

fn stream_error(e: tiberius::error::Error) -> QueryManagerError {
    QueryManagerError::ExecutionError(format!("SQL Server row fetch error: {e}"))
}

/// Collect the first result set of `stream`.
///
/// Later result sets are drained and discarded. A batch that produces no
/// result set at all (a procedure that only modifies data) yields an empty
/// result set.
pub async fn build_result_set(mut stream: QueryStream<'_>) -> Result<ResultSet, QueryManagerError> {
    let mut result_set: Option<ResultSet> = None;
    while let Some(item) = stream.try_next().await.map_err(stream_error)? {
        match item {
            QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                let names = meta.columns().iter().map(|c| c.name().to_string()).collect();
                result_set = Some(ResultSet::new(names));
            }
            QueryItem::Metadata(_) => {}
            QueryItem::Row(row) if row.result_index() == 0 => {
                if let Some(result_set) = result_set.as_mut() {
                    result_set.add_row_values(decode_row(row)?);
                }
            }
            QueryItem::Row(_) => {}
        }
    }
    Ok(result_set.unwrap_or_default())
}

/// Pull items until the first row of the first result set; the rest of the
/// stream is left unread.
async fn next_first_row(stream: &mut QueryStream<'_>) -> Result<Option<Row>, QueryManagerError> {
    while let Some(item) = stream.try_next().await.map_err(stream_error)? {
        match item {
            QueryItem::Row(row) if row.result_index() == 0 => return Ok(Some(row)),
            QueryItem::Row(_) => return Ok(None),
            QueryItem::Metadata(meta) if meta.result_index() > 0 => return Ok(None),
            QueryItem::Metadata(_) => {}
        }
    }
    Ok(None)
}

/// Read the first row of the first result set; nothing after it is fetched.
pub async fn first_row(mut stream: QueryStream<'_>) -> Result<Option<DbRow>, QueryManagerError> {
    let Some(row) = next_first_row(&mut stream).await? else {
        return Ok(None);
    };
    let column_names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = decode_row(row)?;
    Ok(Some(DbRow::new(Arc::new(column_names), values)))
}

/// First column of the first row.
pub async fn first_value(mut stream: QueryStream<'_>) -> Result<Option<RowValues>, QueryManagerError> {
    let Some(row) = next_first_row(&mut stream).await? else {
        return Ok(None);
    };
    row.into_iter().next().map(decode_column).transpose()
}

fn decode_row(row: Row) -> Result<Vec<RowValues>, QueryManagerError> {
    row.into_iter().map(decode_column).collect()
}

fn temporal<T>(
    data: &ColumnData<'static>,
    into: impl FnOnce(T) -> RowValues,
) -> Result<RowValues, QueryManagerError>
where
    T: for<'a> FromSql<'a>,
{
    let value = T::from_sql(data).map_err(stream_error)?;
    Ok(value.map_or(RowValues::Null, into))
}

/// Map a column value onto `RowValues`. Exact numerics (decimal, money)
/// become `Float`; GUIDs, times and XML become `Text`.
fn decode_column(data: ColumnData<'static>) -> Result<RowValues, QueryManagerError> {
    let value = match data {
        ColumnData::U8(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(RowValues::Null, RowValues::Int),
        ColumnData::F32(v) => v.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(RowValues::Null, RowValues::Float),
        ColumnData::Bit(v) => v.map_or(RowValues::Null, RowValues::Bool),
        ColumnData::String(v) => v.map_or(RowValues::Null, |s| RowValues::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(RowValues::Null, |g| RowValues::Text(g.to_string())),
        ColumnData::Binary(v) => v.map_or(RowValues::Null, |b| RowValues::Blob(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(RowValues::Null, |n| RowValues::Float(f64::from(n))),
        ColumnData::Xml(v) => v.map_or(RowValues::Null, |x| {
            RowValues::Text(x.into_owned().into_string())
        }),
        ref data @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => temporal::<NaiveDateTime>(data, RowValues::Timestamp)?,
        ref data @ ColumnData::Date(_) => temporal::<NaiveDate>(data, |d| {
            RowValues::Timestamp(d.and_time(NaiveTime::MIN))
        })?,
        ref data @ ColumnData::Time(_) => temporal::<NaiveTime>(data, |t| RowValues::Text(t.to_string()))?,
        ref data @ ColumnData::DateTimeOffset(_) => temporal::<DateTime<Utc>>(data, |dt| {
            RowValues::Timestamp(dt.naive_utc())
        })?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(QueryManagerError::ExecutionError(format!(
                "unsupported column type: {other:?}"
            )));
        }
    };
    Ok(value)
}
