//! 测试数据构造

use rowcodec::{FieldDef, FieldType, Schema, SchemaProvider, SchemaVer};
use std::sync::Arc;

/// name: string, age: int, score: double, vip: bool
pub fn player_schema() -> Arc<dyn SchemaProvider> {
    Arc::new(
        Schema::new("player", 1)
            .add_field(FieldDef::new("name", FieldType::String))
            .add_field(FieldDef::new("age", FieldType::Int))
            .add_field(FieldDef::new("score", FieldType::Double))
            .add_field(FieldDef::new("vip", FieldType::Bool)),
    )
}

/// 由类型列表构造 schema，字段名为 `c0`, `c1`, ...
pub fn schema_of(version: SchemaVer, types: &[FieldType]) -> Schema {
    types
        .iter()
        .enumerate()
        .fold(Schema::new("generated", version), |schema, (i, t)| {
            schema.add_field(FieldDef::new(format!("c{}", i), *t))
        })
}

/// `num_fields` 个字段，类型依次循环
pub fn wide_schema(version: SchemaVer, num_fields: usize) -> Arc<dyn SchemaProvider> {
    const CYCLE: [FieldType; 7] = [
        FieldType::Bool,
        FieldType::Int,
        FieldType::Timestamp,
        FieldType::Float,
        FieldType::Double,
        FieldType::String,
        FieldType::Vid,
    ];
    let types: Vec<FieldType> = (0..num_fields).map(|i| CYCLE[i % CYCLE.len()]).collect();
    Arc::new(schema_of(version, &types))
}
