//! 集成测试共享工具模块
//!
//! 库本身不提供解码，这里按行格式写了一个只用于测试的解码器，
//! 用来检查字段数、零值填充和块偏移。

#![allow(dead_code)]

pub mod fixtures;

use prost::encoding::decode_varint;
use rowcodec::{FieldType, SchemaProvider};

/// 解码出的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Str(Vec<u8>),
    Vid(u64),
}

#[derive(Debug)]
pub struct DecodedRow {
    pub offset_bytes: usize,
    pub version: u64,
    pub block_offsets: Vec<u64>,
    pub fields: Vec<Field>,
    /// 每个字段结束时在数据区中的位置
    pub field_ends: Vec<usize>,
    pub data_len: usize,
}

fn read_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn take<'a>(cursor: &mut &'a [u8], len: usize) -> &'a [u8] {
    assert!(cursor.len() >= len, "row truncated: need {} bytes, have {}", len, cursor.len());
    let (head, rest) = cursor.split_at(len);
    *cursor = rest;
    head
}

/// 按 schema 解码一行，布局不合法时直接 panic
pub fn decode_row(bytes: &[u8], schema: &dyn SchemaProvider) -> DecodedRow {
    let mut cursor = bytes;
    let header = take(&mut cursor, 1)[0];
    let offset_bytes = (header & 0x07) as usize + 1;
    let ver_bytes = (header >> 5) as usize;
    let version = if ver_bytes > 0 {
        read_le(take(&mut cursor, ver_bytes))
    } else {
        0
    };

    let num_fields = schema.num_fields();
    let block_offsets: Vec<u64> = (0..num_fields / 16)
        .map(|_| read_le(take(&mut cursor, offset_bytes)))
        .collect();

    let data = cursor;
    let mut fields = Vec::with_capacity(num_fields);
    let mut field_ends = Vec::with_capacity(num_fields);
    for index in 0..num_fields {
        let field_type = schema.field_type(index).expect("schema should cover every field");
        let field = match field_type {
            FieldType::Bool => Field::Bool(take(&mut cursor, 1)[0] != 0),
            FieldType::Int | FieldType::Timestamp => {
                Field::Int(decode_varint(&mut cursor).expect("valid varint") as i64)
            }
            FieldType::Float => {
                Field::Float(f32::from_le_bytes(take(&mut cursor, 4).try_into().unwrap()))
            }
            FieldType::Double => {
                Field::Double(f64::from_le_bytes(take(&mut cursor, 8).try_into().unwrap()))
            }
            FieldType::String => {
                let len = decode_varint(&mut cursor).expect("valid varint") as usize;
                Field::Str(take(&mut cursor, len).to_vec())
            }
            FieldType::Vid => Field::Vid(read_le(take(&mut cursor, 8))),
        };
        fields.push(field);
        field_ends.push(data.len() - cursor.len());
    }
    assert!(cursor.is_empty(), "{} trailing bytes after last field", cursor.len());

    for (k, offset) in block_offsets.iter().enumerate() {
        assert_eq!(
            *offset as usize,
            field_ends[(k + 1) * 16 - 1],
            "block offset {} does not match end of field {}",
            k,
            (k + 1) * 16 - 1
        );
    }

    DecodedRow {
        offset_bytes,
        version,
        block_offsets,
        fields,
        field_ends,
        data_len: data.len(),
    }
}

/// 按 varint 长度前缀拆分行集合
pub fn split_row_set(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut cursor = bytes;
    let mut rows = Vec::new();
    while !cursor.is_empty() {
        let len = decode_varint(&mut cursor).expect("valid length prefix") as usize;
        rows.push(take(&mut cursor, len).to_vec());
    }
    rows
}

/// 类型零值
pub fn zero_of(field_type: FieldType) -> Field {
    match field_type {
        FieldType::Bool => Field::Bool(false),
        FieldType::Int | FieldType::Timestamp => Field::Int(0),
        FieldType::Float => Field::Float(0.0),
        FieldType::Double => Field::Double(0.0),
        FieldType::String => Field::Str(Vec::new()),
        FieldType::Vid => Field::Vid(0),
    }
}
