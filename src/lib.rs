//! RowCodec - schema 驱动的行二进制编码
//!
//! 为图数据库存储层把一行带类型的值编码为紧凑、自描述的字节序列，
//! 并把多行拼接为带长度前缀的行集合，用于批量存储和传输。

pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

pub use crate::core::codec::{Datum, RowSetWriter, RowWriter};
pub use crate::core::cord::ChainBuffer;
pub use crate::core::error::{CodecError, CodecResult};
pub use crate::storage::schema::{Schema, SchemaProvider, SchemaVer, SchemaWriter};
pub use crate::storage::types::{FieldDef, FieldType};
