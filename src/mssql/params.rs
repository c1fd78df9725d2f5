use std::borrow::Cow;

use tiberius::{ColumnData, IntoSql, Query};

use super::command::render_command;
use crate::command::Command;
use crate::types::RowValues;

impl<'a> IntoSql<'a> for RowValues {
    fn into_sql(self) -> ColumnData<'a> {
        match self {
            RowValues::Int(i) => ColumnData::I64(Some(i)),
            RowValues::Float(f) => ColumnData::F64(Some(f)),
            RowValues::Text(s) => ColumnData::String(Some(Cow::Owned(s))),
            RowValues::Bool(b) => ColumnData::Bit(Some(b)),
            RowValues::Timestamp(dt) => dt.into_sql(),
            // Untyped NULL; the server converts it to the target column type.
            RowValues::Null => ColumnData::String(None),
            RowValues::JSON(json) => ColumnData::String(Some(Cow::Owned(json.to_string()))),
            RowValues::Blob(bytes) => ColumnData::Binary(Some(Cow::Owned(bytes))),
        }
    }
}

/// Render `command` and bind its parameters positionally.
pub fn bind_command(command: &Command) -> Query<'static> {
    let mut query = Query::new(render_command(command));
    for param in command.parameters() {
        query.bind(param.value.clone());
    }
    query
}
