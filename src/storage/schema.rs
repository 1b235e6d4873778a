//! Schema定义
//!
//! 行编码依赖的 schema 接口：
//! - `SchemaProvider`：只读访问字段数量、字段类型和版本号
//! - `Schema`：不可变的有序字段列表，通常以 `Arc` 在多个编码器之间共享
//! - `SchemaWriter`：没有 schema 时由编码器边写边构建

use super::types::{FieldDef, FieldType};
use crate::core::codec::MAX_SCHEMA_VERSION;
use crate::core::error::{CodecError, CodecResult};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::mem;

/// Schema 版本号
pub type SchemaVer = i64;

/// 编码器读取 schema 的接口
///
/// 实现者在被编码器引用期间必须保持不变。
pub trait SchemaProvider: fmt::Debug + Send + Sync {
    fn num_fields(&self) -> usize;

    fn field_type(&self, index: usize) -> Option<FieldType>;

    fn field_name(&self, index: usize) -> Option<&str>;

    fn version(&self) -> SchemaVer;
}

/// Schema定义
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub version: SchemaVer,
}

impl Schema {
    pub fn new(name: impl Into<String>, version: SchemaVer) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            version,
        }
    }

    pub fn add_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get_field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// 检查版本号范围和字段名唯一性
    pub fn validate(&self) -> CodecResult<()> {
        if self.version < 0 || (self.version as u64) > MAX_SCHEMA_VERSION {
            return Err(CodecError::InvalidSchema(format!(
                "version {} out of range [0, {}]",
                self.version, MAX_SCHEMA_VERSION
            )));
        }

        let mut names = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(CodecError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> CodecResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CodecResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }
}

impl SchemaProvider for Schema {
    fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn field_type(&self, index: usize) -> Option<FieldType> {
        self.fields.get(index).map(|field| field.field_type)
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|field| field.name.as_str())
    }

    fn version(&self) -> SchemaVer {
        self.version
    }
}

/// 边写边构建的 schema
///
/// 只追加字段，`extract_schema` 取走结果后重新变为空。
#[derive(Debug, Default)]
pub struct SchemaWriter {
    schema: Schema,
}

impl SchemaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_col(&mut self, name: impl Into<String>, field_type: FieldType) -> &FieldDef {
        self.schema.fields.push(FieldDef::new(name, field_type));
        &self.schema.fields[self.schema.fields.len() - 1]
    }

    pub fn extract_schema(&mut self) -> Schema {
        mem::take(&mut self.schema)
    }
}

impl SchemaProvider for SchemaWriter {
    fn num_fields(&self) -> usize {
        self.schema.num_fields()
    }

    fn field_type(&self, index: usize) -> Option<FieldType> {
        self.schema.field_type(index)
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        self.schema.field_name(index)
    }

    fn version(&self) -> SchemaVer {
        self.schema.version
    }
}
