//! RowWriter - 流式行编码器
//!
//! 按列顺序写入值，`finalize` 时在数据区前拼上头部、版本号和块偏移。
//!
//! 两种模式在构造时确定：
//! - 绑定 schema：按 schema 的字段类型编码，可以用 `skip` 跳过若干列（写入零值）
//! - 推断 schema：没有 schema，用 `col_name` / `col_type` 声明下一列，边写边构建 schema
//!
//! 写入值与列类型不匹配时不会中断整行：记录错误日志后写入该列类型的零值，
//! 保证行的字段数和字节布局仍然正确。

use super::{
    calc_occupied_bytes, encode_varint_to, BLOCK_FIELDS, MAX_SCHEMA_VERSION, MAX_VARINT_LEN,
};
use crate::config::CodecConfig;
use crate::core::cord::ChainBuffer;
use crate::storage::schema::{Schema, SchemaProvider, SchemaVer, SchemaWriter};
use crate::storage::types::FieldType;

use std::sync::Arc;

/// 写入编码器的单个值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum<'a> {
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Bytes(&'a [u8]),
}

impl Datum<'_> {
    fn kind_name(&self) -> &'static str {
        match self {
            Datum::Bool(_) => "bool",
            Datum::Int(_) => "int",
            Datum::Float(_) => "float",
            Datum::Double(_) => "double",
            Datum::Bytes(_) => "string",
        }
    }

    /// 推断模式下没有声明列类型时使用的类型
    fn natural_type(&self) -> FieldType {
        match self {
            Datum::Bool(_) => FieldType::Bool,
            Datum::Int(_) => FieldType::Int,
            Datum::Float(_) => FieldType::Float,
            Datum::Double(_) => FieldType::Double,
            Datum::Bytes(_) => FieldType::String,
        }
    }
}

impl From<bool> for Datum<'_> {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

macro_rules! impl_datum_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Datum<'_> {
                fn from(v: $t) -> Self {
                    Datum::Int(v as i64)
                }
            }
        )*
    };
}

impl_datum_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for Datum<'_> {
    fn from(v: f32) -> Self {
        Datum::Float(v)
    }
}

impl From<f64> for Datum<'_> {
    fn from(v: f64) -> Self {
        Datum::Double(v)
    }
}

impl<'a> From<&'a str> for Datum<'a> {
    fn from(v: &'a str) -> Self {
        Datum::Bytes(v.as_bytes())
    }
}

impl<'a> From<&'a String> for Datum<'a> {
    fn from(v: &'a String) -> Self {
        Datum::Bytes(v.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Datum<'a> {
    fn from(v: &'a [u8]) -> Self {
        Datum::Bytes(v)
    }
}

impl<'a> From<&'a Vec<u8>> for Datum<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        Datum::Bytes(v)
    }
}

/// 字段类型零值编码后的字节数
fn zero_value_len(field_type: FieldType) -> usize {
    match field_type {
        FieldType::Bool => 1,
        FieldType::Int | FieldType::Timestamp | FieldType::String => 1,
        FieldType::Float => 4,
        FieldType::Double => 8,
        FieldType::Vid => 8,
    }
}

/// schema 声明了 `index` 列却给不出类型，说明 schema 元数据本身有问题
fn field_type_at(schema: &dyn SchemaProvider, index: usize) -> FieldType {
    match schema.field_type(index) {
        Some(field_type) => field_type,
        None => panic!(
            "schema reports {} fields but has no type for field {}",
            schema.num_fields(),
            index
        ),
    }
}

#[derive(Debug)]
enum SchemaSource {
    Bound(Arc<dyn SchemaProvider>),
    Inferred(SchemaWriter),
}

#[derive(Debug)]
pub struct RowWriter {
    schema: SchemaSource,
    cord: ChainBuffer,
    col_num: usize,
    block_offsets: Vec<u64>,
    encoded: bool,
    col_name: Option<String>,
    col_type: Option<FieldType>,
}

impl RowWriter {
    /// 绑定已有 schema
    pub fn new(schema: Arc<dyn SchemaProvider>) -> Self {
        Self::with_capacity(schema, 0)
    }

    pub fn with_capacity(schema: Arc<dyn SchemaProvider>, reserve: usize) -> Self {
        Self::build(SchemaSource::Bound(schema), reserve)
    }

    /// 不带 schema，边写边推断
    pub fn without_schema() -> Self {
        Self::build(SchemaSource::Inferred(SchemaWriter::new()), 0)
    }

    /// `schema` 为 `None` 时进入推断模式
    pub fn with_config(schema: Option<Arc<dyn SchemaProvider>>, config: &CodecConfig) -> Self {
        let source = match schema {
            Some(schema) => SchemaSource::Bound(schema),
            None => SchemaSource::Inferred(SchemaWriter::new()),
        };
        Self::build(source, config.row_reserved_size)
    }

    fn build(schema: SchemaSource, reserve: usize) -> Self {
        Self {
            schema,
            cord: ChainBuffer::with_capacity(reserve),
            col_num: 0,
            block_offsets: Vec::new(),
            encoded: false,
            col_name: None,
            col_type: None,
        }
    }

    pub fn is_inferring(&self) -> bool {
        matches!(self.schema, SchemaSource::Inferred(_))
    }

    pub fn is_finalized(&self) -> bool {
        self.encoded
    }

    /// 当前列号，即已写入的列数
    pub fn col_num(&self) -> usize {
        self.col_num
    }

    pub fn block_offsets(&self) -> &[u64] {
        &self.block_offsets
    }

    pub fn schema_version(&self) -> SchemaVer {
        self.provider().version()
    }

    fn provider(&self) -> &dyn SchemaProvider {
        match &self.schema {
            SchemaSource::Bound(schema) => schema.as_ref(),
            SchemaSource::Inferred(writer) => writer,
        }
    }

    /// 写入当前列的值
    pub fn write<'a, V: Into<Datum<'a>>>(&mut self, value: V) -> &mut Self {
        self.check_not_finished();

        let datum = value.into();
        let Some(field_type) = self.current_column_type(&datum) else {
            return self;
        };
        self.write_datum(field_type, datum);
        self.finish_column();
        self
    }

    /// 声明下一列的名字，只能在推断模式下使用
    pub fn col_name(&mut self, name: impl Into<String>) -> &mut Self {
        debug_assert!(
            self.is_inferring(),
            "col_name can only be used when a schema is missing"
        );
        self.col_name = Some(name.into());
        self
    }

    /// 声明下一列的类型，只能在推断模式下使用
    pub fn col_type(&mut self, field_type: FieldType) -> &mut Self {
        debug_assert!(
            self.is_inferring(),
            "col_type can only be used when a schema is missing"
        );
        self.col_type = Some(field_type);
        self
    }

    /// 跳过 `count` 列，被跳过的列写入对应类型的零值，只能在绑定 schema 时使用
    pub fn skip(&mut self, count: usize) -> &mut Self {
        self.check_not_finished();
        debug_assert!(
            !self.is_inferring(),
            "skip can only be used when a schema is provided"
        );
        if count == 0 {
            log::trace!("Nothing to skip");
            return self;
        }

        let SchemaSource::Bound(schema) = &self.schema else {
            return self;
        };
        let schema = Arc::clone(schema);
        let skip_to = self.col_num.saturating_add(count).min(schema.num_fields());
        while self.col_num < skip_to {
            self.write_zero(field_type_at(schema.as_ref(), self.col_num));
            self.finish_column();
        }
        self
    }

    /// 编码后的总字节数，不触发 finalize
    ///
    /// 绑定 schema 且尚未写满时，包含 finalize 补齐剩余列所需的字节。
    pub fn computed_size(&self) -> usize {
        if self.encoded {
            return self.cord.len();
        }

        let mut data_len = self.cord.len();
        let mut num_offsets = self.block_offsets.len();
        if let SchemaSource::Bound(schema) = &self.schema {
            for index in self.col_num..schema.num_fields() {
                data_len += zero_value_len(field_type_at(schema.as_ref(), index));
                if (index + 1) % BLOCK_FIELDS == 0 {
                    num_offsets += 1;
                }
            }
        }

        let offset_bytes = calc_occupied_bytes(data_len as u64);
        let version = self.schema_version();
        let ver_bytes = if version > 0 {
            calc_occupied_bytes(version as u64)
        } else {
            0
        };

        data_len + offset_bytes * num_offsets + ver_bytes + 1
    }

    /// 完成编码，返回整行字节
    ///
    /// 只有第一次调用会生成头部，之后的调用直接返回已生成的结果。
    pub fn finalize(&mut self) -> &ChainBuffer {
        if self.encoded {
            return &self.cord;
        }

        if let SchemaSource::Bound(schema) = &self.schema {
            let remaining = schema.num_fields() - self.col_num;
            if remaining > 0 {
                self.skip(remaining);
            }
        }

        let version = self.schema_version();
        // 头部只有 3 bit 记录版本宽度，超出范围会写出无法解码的行
        assert!(
            version >= 0 && (version as u64) <= MAX_SCHEMA_VERSION,
            "schema version {} cannot be encoded",
            version
        );

        let offset_bytes = calc_occupied_bytes(self.cord.len() as u64);
        let ver_bytes = if version > 0 {
            calc_occupied_bytes(version as u64)
        } else {
            0
        };
        let header_bytes = offset_bytes * self.block_offsets.len() + ver_bytes + 1;

        // 头部预留 varint 空间，行集合零拷贝写入长度前缀时无需重新分配
        let mut header = ChainBuffer::with_headroom(MAX_VARINT_LEN, header_bytes);
        let flag = (offset_bytes - 1) as u8 | ((ver_bytes as u8) << 5);
        header.append_value(flag);
        if version > 0 {
            header.append_bytes(&(version as u64).to_le_bytes()[..ver_bytes]);
        }
        for offset in &self.block_offsets {
            header.append_bytes(&offset.to_le_bytes()[..offset_bytes]);
        }
        debug_assert_eq!(header.len(), header_bytes);

        self.cord.prepend_header(header);
        self.encoded = true;
        &self.cord
    }

    /// 编码为新的字节数组
    pub fn encode(&mut self) -> Vec<u8> {
        let mut encoded =
            Vec::with_capacity(8 * self.block_offsets.len() + self.cord.len() + 11);
        self.encode_to(&mut encoded);
        encoded
    }

    /// 追加编码结果到 `out`，返回追加的字节数
    pub fn encode_to(&mut self, out: &mut Vec<u8>) -> usize {
        self.finalize().append_to(out)
    }

    /// 完成编码并取走整行缓冲区
    pub fn into_buffer(mut self) -> ChainBuffer {
        self.finalize();
        self.cord.take()
    }

    /// 取走推断出的 schema；绑定 schema 时返回空 schema
    pub fn extract_schema(&mut self) -> Schema {
        match &mut self.schema {
            SchemaSource::Inferred(writer) => writer.extract_schema(),
            SchemaSource::Bound(_) => Schema::default(),
        }
    }

    fn check_not_finished(&self) {
        assert!(!self.encoded, "Cannot write to finalized RowWriter");
    }

    fn current_column_type(&mut self, datum: &Datum<'_>) -> Option<FieldType> {
        match &mut self.schema {
            SchemaSource::Bound(schema) => {
                if self.col_num >= schema.num_fields() {
                    log::error!(
                        "Too many columns, schema has only {} fields, {} value dropped",
                        schema.num_fields(),
                        datum.kind_name()
                    );
                    self.col_name = None;
                    self.col_type = None;
                    return None;
                }
                Some(field_type_at(schema.as_ref(), self.col_num))
            }
            SchemaSource::Inferred(writer) => {
                let name = self
                    .col_name
                    .take()
                    .unwrap_or_else(|| format!("Column{}", self.col_num + 1));
                let field_type = self.col_type.take().unwrap_or(datum.natural_type());
                Some(writer.append_col(name, field_type).field_type)
            }
        }
    }

    fn write_datum(&mut self, field_type: FieldType, datum: Datum<'_>) {
        match (field_type, datum) {
            (FieldType::Bool, Datum::Bool(v)) => {
                self.cord.append_value(v);
            }
            (FieldType::Int | FieldType::Timestamp, Datum::Int(v)) => {
                self.write_int(v as u64);
            }
            (FieldType::Float, Datum::Float(v)) => {
                self.cord.append_value(v);
            }
            (FieldType::Float, Datum::Double(v)) => {
                self.cord.append_value(v as f32);
            }
            (FieldType::Double, Datum::Float(v)) => {
                self.cord.append_value(v as f64);
            }
            (FieldType::Double, Datum::Double(v)) => {
                self.cord.append_value(v);
            }
            (FieldType::String, Datum::Bytes(v)) => {
                self.write_int(v.len() as u64);
                self.cord.append_bytes(v);
            }
            (FieldType::Vid, Datum::Int(v)) => {
                self.cord.append_value(v as u64);
            }
            (field_type, datum) => {
                log::error!(
                    "Incompatible value type \"{}\" for column {} of type {}",
                    datum.kind_name(),
                    self.col_num,
                    field_type
                );
                self.write_zero(field_type);
            }
        }
    }

    fn write_zero(&mut self, field_type: FieldType) {
        match field_type {
            FieldType::Bool => {
                self.cord.append_value(false);
            }
            FieldType::Int | FieldType::Timestamp | FieldType::String => {
                self.write_int(0);
            }
            FieldType::Float => {
                self.cord.append_value(0.0f32);
            }
            FieldType::Double => {
                self.cord.append_value(0.0f64);
            }
            FieldType::Vid => {
                self.cord.append_value(0u64);
            }
        }
    }

    fn write_int(&mut self, v: u64) {
        let mut buf = [0u8; MAX_VARINT_LEN];
        self.cord.append_bytes(encode_varint_to(v, &mut buf));
    }

    fn finish_column(&mut self) {
        self.col_num += 1;
        if self.col_num % BLOCK_FIELDS == 0 {
            // 每 16 个字段记录一次块偏移
            self.block_offsets.push(self.cord.len() as u64);
        }
        self.col_name = None;
        self.col_type = None;
    }
}
