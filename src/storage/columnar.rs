use parquet::basic::{LogicalType, Repetition, Type as PhysicalType};
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::errors::{ParquetError, Result};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use std::sync::Arc;

use crate::data::{Cell, CellKind, MatchTable};

/// Parquet schema for a table: every column optional, text as UTF-8 byte
/// arrays, integers as INT64, floats as DOUBLE.
fn schema_for(table: &MatchTable) -> Result<Type> {
    let fields = table
        .columns()
        .iter()
        .map(|col| {
            let builder = match col.kind {
                CellKind::Text => Type::primitive_type_builder(&col.name, PhysicalType::BYTE_ARRAY)
                    .with_logical_type(Some(LogicalType::String)),
                CellKind::Integer => Type::primitive_type_builder(&col.name, PhysicalType::INT64),
                CellKind::Float => Type::primitive_type_builder(&col.name, PhysicalType::DOUBLE),
            };
            builder
                .with_repetition(Repetition::OPTIONAL)
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>>>()?;

    Type::group_type_builder("match").with_fields(fields).build()
}

/// Encode the table as a single-row-group Parquet file.
pub fn encode(table: &MatchTable) -> Result<Vec<u8>> {
    let schema = Arc::new(schema_for(table)?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_created_by(format!("soccer-predict {}", env!("CARGO_PKG_VERSION")))
            .build(),
    );

    let mut buf = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buf, schema, props)?;
    let mut row_group = writer.next_row_group()?;

    for (idx, column) in table.columns().iter().enumerate() {
        let mut col_writer = row_group.next_column()?.ok_or_else(|| {
            ParquetError::General(format!("no column writer for '{}'", column.name))
        })?;

        let cells = table.rows().iter().map(|row| row[idx].as_ref());
        let def_levels: Vec<i16> = cells.clone().map(|c| i16::from(c.is_some())).collect();

        match column.kind {
            CellKind::Text => {
                let values: Vec<ByteArray> = cells
                    .filter_map(|c| c.and_then(Cell::as_text).map(ByteArray::from))
                    .collect();
                col_writer
                    .typed::<ByteArrayType>()
                    .write_batch(&values, Some(&def_levels), None)?;
            }
            CellKind::Integer => {
                let values: Vec<i64> = cells
                    .filter_map(|c| match c {
                        Some(Cell::Integer(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                col_writer
                    .typed::<Int64Type>()
                    .write_batch(&values, Some(&def_levels), None)?;
            }
            CellKind::Float => {
                let values: Vec<f64> = cells
                    .filter_map(|c| match c {
                        Some(Cell::Float(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                col_writer
                    .typed::<DoubleType>()
                    .write_batch(&values, Some(&def_levels), None)?;
            }
        }
        col_writer.close()?;
    }

    row_group.close()?;
    writer.close()?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    #[test]
    fn test_schema_maps_kinds() {
        let table = MatchTable::with_columns(vec![
            Column::text("match_id"),
            Column::integer("home_score"),
            Column::float("odds_home"),
        ])
        .unwrap();
        let schema = schema_for(&table).unwrap();
        let fields = schema.get_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].get_physical_type(), PhysicalType::BYTE_ARRAY);
        assert_eq!(fields[1].get_physical_type(), PhysicalType::INT64);
        assert_eq!(fields[2].get_physical_type(), PhysicalType::DOUBLE);
    }

    #[test]
    fn test_encode_starts_with_magic() {
        let mut table =
            MatchTable::with_columns(vec![Column::text("match_id"), Column::float("odds_home")])
                .unwrap();
        table.push_row(vec![Some("m1".into()), None]).unwrap();
        let bytes = encode(&table).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");
        assert_eq!(&bytes[bytes.len() - 4..], b"PAR1");
    }
}
