//! DataForge database parser.
//!
//! One pass over a single contiguous buffer produces a read-only view:
//! schema definitions, records, typed value pools, the two string tables
//! and the data region. Nothing here is mutated after construction; the
//! instance reader only computes offsets into what this module indexed.

use std::collections::HashMap;

use binrw::BinRead;
use binrw::io::Cursor;
use tracing::warn;

use crate::defs::{
    DataMapping, DataType, NarrowDataMapping, PropertyDef, RawPropertyDef, RawRecordDef,
    RawStructDef, Record, StructDef, WideDataMapping, NO_INDEX,
};
use crate::error::{ForgeError, ForgeResult};
use crate::guid::Guid;

/// Highest database format version this decoder understands.
pub const MAX_SUPPORTED_VERSION: u32 = 6;

/// Data mappings switch to 32-bit fields at this version.
const WIDE_MAPPING_VERSION: u32 = 5;

/// A second, schema-only string table appears at this version.
const SECOND_TABLE_VERSION: u32 = 6;

#[derive(Debug, Clone, Copy, Default)]
struct Pool {
    offset: usize,
    count: usize,
}

impl Pool {
    fn element<'a>(&self, index: usize, width: usize, buf: &'a [u8]) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = self.offset + index * width;
        buf.get(start..start + width)
    }
}

/// Value pools in their fixed on-disk order.
#[derive(Debug, Clone, Copy, Default)]
struct Pools {
    int8: Pool,
    int16: Pool,
    int32: Pool,
    int64: Pool,
    uint8: Pool,
    uint16: Pool,
    uint32: Pool,
    uint64: Pool,
    boolean: Pool,
    single: Pool,
    double: Pool,
    guid: Pool,
    string_id: Pool,
    locale: Pool,
    enum_value: Pool,
    strong: Pool,
    weak: Pool,
    reference: Pool,
    enum_option: Pool,
}

/// Parsed, read-only view of the database.
pub struct ForgeView {
    buf: Vec<u8>,
    version: u32,
    structs: Vec<StructDef>,
    properties: Vec<PropertyDef>,
    mappings: Vec<DataMapping>,
    records: Vec<Record>,
    pools: Pools,
    table1: (usize, usize),
    table2: Option<(usize, usize)>,
    data_region_offset: usize,
    /// First byte offset of each struct's instance run, relative to the
    /// data region. First mapping wins when a struct appears twice.
    struct_data_offsets: HashMap<usize, usize>,
    struct_by_name: HashMap<String, usize>,
}

impl ForgeView {
    /// Parse a database buffer into a view. The buffer is moved in; all
    /// later access goes through indexed slices of it.
    pub fn parse(buf: Vec<u8>) -> ForgeResult<Self> {
        let mut cursor = Cursor::new(buf.as_slice());

        // Signature, version, reserved.
        cursor.set_position(4);
        let version = u32::read_le(&mut cursor)?;
        if version > MAX_SUPPORTED_VERSION {
            return Err(ForgeError::UnsupportedVersion(version));
        }
        cursor.set_position(cursor.position() + 8);

        // Counters: five definition counts, then the 19 pool element counts
        // in declaration order, then the string-table byte lengths.
        let struct_count = u32::read_le(&mut cursor)? as usize;
        let property_count = u32::read_le(&mut cursor)? as usize;
        let enum_count = u32::read_le(&mut cursor)? as usize;
        let mapping_count = u32::read_le(&mut cursor)? as usize;
        let record_count = u32::read_le(&mut cursor)? as usize;

        let bool_count = u32::read_le(&mut cursor)? as usize;
        let int8_count = u32::read_le(&mut cursor)? as usize;
        let int16_count = u32::read_le(&mut cursor)? as usize;
        let int32_count = u32::read_le(&mut cursor)? as usize;
        let int64_count = u32::read_le(&mut cursor)? as usize;
        let uint8_count = u32::read_le(&mut cursor)? as usize;
        let uint16_count = u32::read_le(&mut cursor)? as usize;
        let uint32_count = u32::read_le(&mut cursor)? as usize;
        let uint64_count = u32::read_le(&mut cursor)? as usize;
        let single_count = u32::read_le(&mut cursor)? as usize;
        let double_count = u32::read_le(&mut cursor)? as usize;
        let guid_count = u32::read_le(&mut cursor)? as usize;
        let string_id_count = u32::read_le(&mut cursor)? as usize;
        let locale_count = u32::read_le(&mut cursor)? as usize;
        let enum_value_count = u32::read_le(&mut cursor)? as usize;
        let strong_count = u32::read_le(&mut cursor)? as usize;
        let weak_count = u32::read_le(&mut cursor)? as usize;
        let reference_count = u32::read_le(&mut cursor)? as usize;
        let enum_option_count = u32::read_le(&mut cursor)? as usize;

        let text_length1 = u32::read_le(&mut cursor)? as usize;
        let text_length2 = if version >= SECOND_TABLE_VERSION {
            u32::read_le(&mut cursor)? as usize
        } else {
            0
        };

        // Definition tables.
        let raw_structs: Vec<RawStructDef> = read_many(&mut cursor, struct_count)?;
        let raw_properties: Vec<RawPropertyDef> = read_many(&mut cursor, property_count)?;

        // Enum definitions carry nothing the extractors need.
        cursor.set_position(cursor.position() + (enum_count as u64) * 8);

        let mappings: Vec<DataMapping> = if version >= WIDE_MAPPING_VERSION {
            read_many::<WideDataMapping>(&mut cursor, mapping_count)?
                .into_iter()
                .map(|m| DataMapping {
                    struct_count: m.struct_count,
                    struct_index: m.struct_index,
                })
                .collect()
        } else {
            read_many::<NarrowDataMapping>(&mut cursor, mapping_count)?
                .into_iter()
                .map(|m| DataMapping {
                    struct_count: u32::from(m.struct_count),
                    struct_index: u32::from(m.struct_index),
                })
                .collect()
        };

        let raw_records: Vec<RawRecordDef> = read_many(&mut cursor, record_count)?;

        // Value pools, fixed order, element widths per type.
        let mut offset = cursor.position() as usize;
        let mut take = |count: usize, width: usize| {
            let pool = Pool { offset, count };
            offset += count * width;
            pool
        };
        let pools = Pools {
            int8: take(int8_count, 1),
            int16: take(int16_count, 2),
            int32: take(int32_count, 4),
            int64: take(int64_count, 8),
            uint8: take(uint8_count, 1),
            uint16: take(uint16_count, 2),
            uint32: take(uint32_count, 4),
            uint64: take(uint64_count, 8),
            boolean: take(bool_count, 1),
            single: take(single_count, 4),
            double: take(double_count, 8),
            guid: take(guid_count, 16),
            string_id: take(string_id_count, 4),
            locale: take(locale_count, 4),
            enum_value: take(enum_value_count, 4),
            strong: take(strong_count, 8),
            weak: take(weak_count, 8),
            reference: take(reference_count, 20),
            enum_option: take(enum_option_count, 4),
        };

        let table1 = (offset, text_length1);
        offset += text_length1;
        let table2 = (version >= SECOND_TABLE_VERSION && text_length2 > 0)
            .then_some((offset, text_length2));
        offset += text_length2;

        let data_region_offset = offset;
        if data_region_offset > buf.len() {
            return Err(ForgeError::Truncated {
                region: "value pools and string tables",
                needed: data_region_offset,
                available: buf.len(),
            });
        }

        // Resolve names. Schema identifiers prefer table #2; file names
        // always come from table #1.
        let schema = |raw: &[u8], off: i64| -> String {
            table_string(raw, table2.unwrap_or(table1), off)
        };

        let structs: Vec<StructDef> = raw_structs
            .iter()
            .map(|raw| StructDef {
                name: schema(&buf, i64::from(raw.name_offset)),
                parent_index: (raw.parent_index >= 0
                    && raw.parent_index as u32 != NO_INDEX)
                    .then_some(raw.parent_index as usize),
                attribute_count: raw.attribute_count,
                first_attribute_index: raw.first_attribute_index,
                struct_size: raw.struct_size,
            })
            .collect();

        let properties: Vec<PropertyDef> = raw_properties
            .iter()
            .map(|raw| PropertyDef {
                name: schema(&buf, i64::from(raw.name_offset)),
                struct_index: raw.struct_index,
                data_type: DataType::from_tag(raw.data_type),
                conversion: (raw.conversion_type & 0xFF) as u8,
            })
            .collect();

        let records: Vec<Record> = raw_records
            .iter()
            .map(|raw| Record {
                name: schema(&buf, i64::from(raw.name_offset)),
                file_name: table_string(&buf, table1, i64::from(raw.file_name_offset)),
                struct_index: raw.struct_index.max(0) as usize,
                guid: Guid::from_bytes(&raw.guid),
                instance_index: raw.instance_index,
            })
            .collect();

        // Instance run offsets, relative to the data region; first mapping
        // wins for structs that appear in several mappings.
        let mut struct_data_offsets = HashMap::new();
        let mut running = 0usize;
        for mapping in &mappings {
            let index = mapping.struct_index as usize;
            let size = structs.get(index).map_or(0, |s| s.struct_size as usize);
            struct_data_offsets.entry(index).or_insert(running);
            running += size * mapping.struct_count as usize;
        }

        let declared = running;
        let actual = buf.len() - data_region_offset;
        if declared != actual {
            warn!(
                declared,
                actual, "data region size disagrees with the mapping table"
            );
        }

        let mut struct_by_name = HashMap::new();
        for (i, def) in structs.iter().enumerate() {
            struct_by_name.entry(def.name.clone()).or_insert(i);
        }

        Ok(Self {
            buf,
            version,
            structs,
            properties,
            mappings,
            records,
            pools,
            table1,
            table2,
            data_region_offset,
            struct_data_offsets,
            struct_by_name,
        })
    }

    /// Database format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Struct definitions in schema order.
    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    /// Property definitions in schema order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Records in database order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Data mappings in layout order.
    pub fn mappings(&self) -> &[DataMapping] {
        &self.mappings
    }

    /// The whole backing buffer.
    pub(crate) fn data(&self) -> &[u8] {
        &self.buf
    }

    /// First struct index carrying the given schema name.
    pub fn find_struct(&self, name: &str) -> Option<usize> {
        self.struct_by_name.get(name).copied()
    }

    /// Absolute buffer offset of one instance, or `None` when the struct
    /// never received a data mapping.
    pub fn instance_offset(&self, struct_index: usize, variant_index: usize) -> Option<usize> {
        let relative = *self.struct_data_offsets.get(&struct_index)?;
        let size = self.structs.get(struct_index)?.struct_size as usize;
        Some(self.data_region_offset + relative + variant_index * size)
    }

    /// Effective property list: ancestors first, then own properties.
    ///
    /// A visited set breaks parent cycles in malformed schemas.
    pub fn effective_properties(&self, struct_index: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut visited = std::collections::HashSet::new();
        let mut current = Some(struct_index);
        while let Some(index) = current {
            if !visited.insert(index) {
                warn!(struct_index = index, "parent chain cycle");
                break;
            }
            chain.push(index);
            current = self.structs.get(index).and_then(|s| s.parent_index);
        }
        chain.reverse();

        let mut out = Vec::new();
        for index in chain {
            if let Some(def) = self.structs.get(index) {
                let first = def.first_attribute_index as usize;
                let end = first + def.attribute_count as usize;
                out.extend((first..end).filter(|&p| p < self.properties.len()));
            }
        }
        out
    }

    /// String from the data table (table #1).
    pub fn data_string(&self, offset: u32) -> String {
        table_string(&self.buf, self.table1, i64::from(offset))
    }

    // Typed pool element accessors. Each returns `None` past the pool's end.

    /// Bool pool element.
    pub fn bool_value(&self, index: usize) -> Option<bool> {
        self.pools
            .boolean
            .element(index, 1, &self.buf)
            .map(|b| b[0] != 0)
    }

    /// Int8 pool element.
    pub fn int8_value(&self, index: usize) -> Option<i8> {
        self.pools
            .int8
            .element(index, 1, &self.buf)
            .map(|b| b[0] as i8)
    }

    /// Int16 pool element.
    pub fn int16_value(&self, index: usize) -> Option<i16> {
        self.pools
            .int16
            .element(index, 2, &self.buf)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
    }

    /// Int32 pool element.
    pub fn int32_value(&self, index: usize) -> Option<i32> {
        self.pools
            .int32
            .element(index, 4, &self.buf)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Int64 pool element.
    pub fn int64_value(&self, index: usize) -> Option<i64> {
        self.pools.int64.element(index, 8, &self.buf).map(|b| {
            i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// UInt8 pool element.
    pub fn uint8_value(&self, index: usize) -> Option<u8> {
        self.pools.uint8.element(index, 1, &self.buf).map(|b| b[0])
    }

    /// UInt16 pool element.
    pub fn uint16_value(&self, index: usize) -> Option<u16> {
        self.pools
            .uint16
            .element(index, 2, &self.buf)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// UInt32 pool element.
    pub fn uint32_value(&self, index: usize) -> Option<u32> {
        self.pools
            .uint32
            .element(index, 4, &self.buf)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// UInt64 pool element.
    pub fn uint64_value(&self, index: usize) -> Option<u64> {
        self.pools.uint64.element(index, 8, &self.buf).map(|b| {
            u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// Single pool element.
    pub fn single_value(&self, index: usize) -> Option<f32> {
        self.pools
            .single
            .element(index, 4, &self.buf)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Double pool element.
    pub fn double_value(&self, index: usize) -> Option<f64> {
        self.pools.double.element(index, 8, &self.buf).map(|b| {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// GUID pool element.
    pub fn guid_value(&self, index: usize) -> Option<Guid> {
        self.pools.guid.element(index, 16, &self.buf).map(|b| {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(b);
            Guid::from_bytes(&raw)
        })
    }

    /// String pool element, resolved through table #1.
    pub fn string_id_value(&self, index: usize) -> Option<String> {
        self.pools
            .string_id
            .element(index, 4, &self.buf)
            .map(|b| self.data_string(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }

    /// Locale pool element, resolved through table #1.
    pub fn locale_value(&self, index: usize) -> Option<String> {
        self.pools
            .locale
            .element(index, 4, &self.buf)
            .map(|b| self.data_string(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }

    /// Enum-choice pool element, resolved through table #1.
    pub fn enum_value(&self, index: usize) -> Option<String> {
        self.pools
            .enum_value
            .element(index, 4, &self.buf)
            .map(|b| self.data_string(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }

    /// Strong-pointer pool element: `(struct_index, variant_index)`.
    pub fn strong_value(&self, index: usize) -> Option<(u32, u16)> {
        self.pools.strong.element(index, 8, &self.buf).map(|b| {
            (
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
                u16::from_le_bytes([b[4], b[5]]),
            )
        })
    }

    /// Weak-pointer pool element: `(struct_index, variant_index)`.
    pub fn weak_value(&self, index: usize) -> Option<(u32, u16)> {
        self.pools.weak.element(index, 8, &self.buf).map(|b| {
            (
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
                u16::from_le_bytes([b[4], b[5]]),
            )
        })
    }

    /// Reference pool element: the record GUID after the 4-byte tag.
    pub fn reference_value(&self, index: usize) -> Option<Guid> {
        self.pools.reference.element(index, 20, &self.buf).map(|b| {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&b[4..20]);
            Guid::from_bytes(&raw)
        })
    }
}

impl std::fmt::Debug for ForgeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeView")
            .field("version", &self.version)
            .field("structs", &self.structs.len())
            .field("properties", &self.properties.len())
            .field("records", &self.records.len())
            .finish()
    }
}

fn read_many<T: for<'a> BinRead<Args<'a> = ()>>(
    cursor: &mut Cursor<&[u8]>,
    count: usize,
) -> ForgeResult<Vec<T>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(T::read_le(cursor)?);
    }
    Ok(out)
}

/// Read a NUL-terminated string at `offset` within a table.
///
/// Offset 0 is the canonical empty string; an offset past the table's end
/// yields a stable placeholder so downstream matching stays deterministic.
fn table_string(buf: &[u8], (start, len): (usize, usize), offset: i64) -> String {
    if offset <= 0 {
        return String::new();
    }
    let offset = offset as usize;
    if offset >= len {
        return format!("unresolved:{offset}");
    }
    let table = &buf[start..start + len];
    let end = table[offset..]
        .iter()
        .position(|&b| b == 0)
        .map_or(len, |p| offset + p);
    String::from_utf8_lossy(&table[offset..end]).into_owned()
}
