//! Codec 模块 - 行二进制编码
//!
//! 按 schema 把一行值编码为紧凑的自描述字节序列，并把多行拼接成带长度前缀的行集合。
//!
//! ## 架构
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │            codec::mod.rs            │
//! │     宽度/varint 工具和格式常量       │
//! └─────────────────────────────────────┘
//!              │
//!        ┌─────┴──────────┐
//!        ▼                ▼
//! ┌────────────┐   ┌────────────────┐
//! │ row_writer │──▶│ row_set_writer │
//! └────────────┘   └────────────────┘
//!        │
//!        ▼
//! ┌────────────┐
//! │ core::cord │
//! └────────────┘
//! ```
//!
//! ## 行格式
//!
//! - 头部：1字节，bit 0-2 为 offset 宽度减一，bit 5-7 为版本号宽度（版本为 0 时为 0）
//! - 版本号：版本大于 0 时存在，按最小宽度小端存储
//! - 块偏移：每 16 个字段记录一次数据区累计长度，统一使用 offset 宽度
//! - 数据区：按列顺序排列的字段编码
//!
//! 行集合格式为重复的 `[varint 行长度][行数据]`。
//!
//! ## 使用示例
//!
//! ```ignore
//! use rowcodec::core::codec::{RowWriter, RowSetWriter};
//!
//! let mut writer = RowWriter::new(schema.clone());
//! writer.write(25i64).write("test");
//!
//! let mut rows = RowSetWriter::new(Some(schema), 1024);
//! rows.add_row(&mut writer);
//! let bytes = rows.to_bytes();
//! ```

pub mod row_set_writer;
pub mod row_writer;

pub use row_set_writer::RowSetWriter;
pub use row_writer::{Datum, RowWriter};

use prost::encoding::{encode_varint, encoded_len_varint};

/// 每隔多少个字段记录一次块偏移
pub const BLOCK_FIELDS: usize = 16;

/// u64 varint 的最大字节数
pub const MAX_VARINT_LEN: usize = 10;

/// 版本号宽度在头部只占 3 bit
pub const MAX_SCHEMA_VERSION: u64 = (1 << 56) - 1;

/// 表示 `v` 所需的最少字节数，0 也占 1 字节
pub fn calc_occupied_bytes(v: u64) -> usize {
    if v == 0 {
        return 1;
    }
    8 - v.leading_zeros() as usize / 8
}

/// 把 `value` 编码为 varint，返回 `buf` 中实际使用的部分
pub fn encode_varint_to(value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> &[u8] {
    let mut temp = &mut buf[..];
    encode_varint(value, &mut temp);
    &buf[..encoded_len_varint(value)]
}
