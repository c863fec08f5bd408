//! Column-definition packets (protocol 4.1).

use sqlbind_core::{ColumnDescriptor, FieldType, Result};

use crate::protocol::PacketReader;

/// Parse a column definition packet into a descriptor.
///
/// Layout: catalog, schema, table, org_table, name, org_name (all lenenc
/// strings), the lenenc length of the fixed fields, then charset (2),
/// column length (4), type (1), flags (2) and decimals (1).
pub fn parse_column_definition(payload: &[u8]) -> Result<ColumnDescriptor> {
    let mut reader = PacketReader::new(payload);

    let _catalog = reader.read_lenenc_bytes()?;
    let _schema = reader.read_lenenc_bytes()?;
    let table = reader.read_lenenc_string()?;
    let _org_table = reader.read_lenenc_bytes()?;
    let name = reader.read_lenenc_string()?;
    let _org_name = reader.read_lenenc_bytes()?;

    // Length of fixed fields
    let _fixed_len = reader.read_lenenc_int()?;

    let charset = reader.read_u16_le()?;
    let column_length = reader.read_u32_le()?;
    let field_type = FieldType::from_u8(reader.read_u8()?);
    let flags = reader.read_u16_le()?;
    let _decimals = reader.read_u8()?;

    Ok(ColumnDescriptor::from_flags(
        name,
        Some(table),
        field_type,
        flags,
        charset,
        column_length,
    ))
}
