//! 编码性质测试
//!
//! 随机 schema 和随机写入序列下检查：
//! - 分段缓冲区的长度与内容一致
//! - 偏移宽度在 1..=8 之间
//! - computed_size 等于编码长度，finalize 幂等
//! - 任意写入序列产生的行都能按 schema 解码

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use common::fixtures::schema_of;
use common::{decode_row, split_row_set};
use rowcodec::core::codec::calc_occupied_bytes;
use rowcodec::{ChainBuffer, FieldType, RowSetWriter, RowWriter, SchemaProvider};

#[derive(Debug, Clone)]
enum Input {
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Skip(usize),
}

fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Bool),
        Just(FieldType::Int),
        Just(FieldType::Timestamp),
        Just(FieldType::Float),
        Just(FieldType::Double),
        Just(FieldType::String),
        Just(FieldType::Vid),
    ]
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        any::<bool>().prop_map(Input::Bool),
        any::<i64>().prop_map(Input::Int),
        any::<f32>().prop_map(Input::Float),
        any::<f64>().prop_map(Input::Double),
        prop::collection::vec(any::<u8>(), 0..600).prop_map(Input::Bytes),
        (0usize..4).prop_map(Input::Skip),
    ]
}

fn apply(writer: &mut RowWriter, input: &Input) {
    match input {
        Input::Bool(v) => writer.write(*v),
        Input::Int(v) => writer.write(*v),
        Input::Float(v) => writer.write(*v),
        Input::Double(v) => writer.write(*v),
        Input::Bytes(v) => writer.write(v),
        Input::Skip(n) => writer.skip(*n),
    };
}

proptest! {
    #[test]
    fn chain_buffer_matches_concatenation(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..2000), 0..20)
    ) {
        let mut buffer = ChainBuffer::new();
        let mut expected = Vec::new();
        for chunk in &chunks {
            buffer.append_bytes(chunk);
            expected.extend_from_slice(chunk);
        }

        prop_assert_eq!(buffer.len(), expected.len());
        prop_assert_eq!(buffer.compute_chain_len(), expected.len());
        prop_assert_eq!(buffer.to_bytes(), expected.clone());
        prop_assert_eq!(buffer.clone_coalesced().to_bytes(), expected);
    }

    #[test]
    fn occupied_bytes_is_minimal(v in any::<u64>()) {
        let width = calc_occupied_bytes(v);
        prop_assert!((1..=8).contains(&width));
        if width < 8 {
            prop_assert!(v < 1u64 << (8 * width));
        }
        if width > 1 {
            prop_assert!(v >= 1u64 << (8 * (width - 1)));
        }
    }

    #[test]
    fn encoded_row_is_consistent(
        types in prop::collection::vec(field_type_strategy(), 0..40),
        inputs in prop::collection::vec(input_strategy(), 0..50),
        version in 0i64..(1 << 40),
    ) {
        let schema: Arc<dyn SchemaProvider> = Arc::new(schema_of(version, &types));
        let mut writer = RowWriter::new(Arc::clone(&schema));
        for input in &inputs {
            apply(&mut writer, input);
        }

        let size = writer.computed_size();
        let first = writer.finalize().to_bytes();
        let second = writer.finalize().to_bytes();
        prop_assert_eq!(first.len(), size);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(writer.col_num(), types.len());

        let row = decode_row(&first, schema.as_ref());
        prop_assert_eq!(row.fields.len(), types.len());
        prop_assert_eq!(row.version, version as u64);
        prop_assert_eq!(row.block_offsets.len(), types.len() / 16);
    }

    #[test]
    fn row_set_preserves_rows(
        rows in prop::collection::vec(
            (prop::collection::vec(any::<u8>(), 0..400), any::<bool>()),
            0..30,
        )
    ) {
        let mut row_set = RowSetWriter::new(None, 0);
        for (row, zero_copy) in &rows {
            if *zero_copy {
                row_set.add_row_buffer(ChainBuffer::from(row.as_slice()));
            } else {
                row_set.add_row_bytes(row);
            }
        }

        let expected: Vec<Vec<u8>> = rows.into_iter().map(|(row, _)| row).collect();
        prop_assert_eq!(split_row_set(&row_set.to_bytes()), expected.clone());
        prop_assert_eq!(split_row_set(&row_set.finish().to_bytes()), expected);
    }
}
