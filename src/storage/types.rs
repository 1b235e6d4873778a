//! 字段类型定义
//!
//! 定义了行编码支持的字段类型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 字段类型定义
///
/// 类型集合是封闭的：编码器对它做穷举匹配，新增类型时编译器会指出所有需要处理的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 布尔类型，1字节
    Bool,
    /// 整数，varint 编码
    Int,
    /// 时间戳，按整数编码
    Timestamp,
    /// 单精度浮点数，4字节
    Float,
    /// 双精度浮点数，8字节
    Double,
    /// 变长字符串：varint 长度 + 原始字节
    String,
    /// 顶点ID，8字节
    Vid,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Timestamp => "timestamp",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::Vid => "vid",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}
