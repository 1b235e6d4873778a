//! RowSetWriter - 行集合编码器
//!
//! 把多行编码结果拼接为 `[varint 行长度][行数据]` 序列。
//!
//! 两条写入通道：
//! - 拷贝通道：行数据复制进连续的 `data` 缓冲区
//! - 零拷贝通道：独占的 `ChainBuffer` 在自身头部写入长度前缀后直接链接进 `head`
//!
//! 链接零拷贝行之前，`data` 中尚未输出的内容会先整体移入 `head`（移动而不是复制），
//! 因此输出始终保持行的加入顺序。

use super::{encode_varint_to, RowWriter, MAX_VARINT_LEN};
use crate::config::CodecConfig;
use crate::core::cord::ChainBuffer;
use crate::storage::schema::SchemaProvider;

use std::mem;
use std::sync::Arc;

#[derive(Debug)]
pub struct RowSetWriter {
    schema: Option<Arc<dyn SchemaProvider>>,
    data: Vec<u8>,
    head: ChainBuffer,
    reserved_size: usize,
}

impl RowSetWriter {
    pub fn new(schema: Option<Arc<dyn SchemaProvider>>, reserved_size: usize) -> Self {
        Self {
            schema,
            data: Vec::with_capacity(reserved_size),
            head: ChainBuffer::new(),
            reserved_size,
        }
    }

    pub fn with_config(schema: Option<Arc<dyn SchemaProvider>>, config: &CodecConfig) -> Self {
        Self::new(schema, config.row_set_reserved_size)
    }

    pub fn schema(&self) -> Option<&Arc<dyn SchemaProvider>> {
        self.schema.as_ref()
    }

    /// 拷贝通道中尚未移入链的数据
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 已链接的行
    pub fn chain(&self) -> &ChainBuffer {
        &self.head
    }

    pub fn len(&self) -> usize {
        self.head.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 拷贝通道：先写长度前缀，再把编码结果复制进 `data`
    pub fn add_row(&mut self, writer: &mut RowWriter) {
        let len = writer.computed_size();
        self.write_row_length(len);
        let written = writer.encode_to(&mut self.data);
        debug_assert_eq!(written, len);
    }

    /// 零拷贝通道：取走编码器的缓冲区
    pub fn add_row_writer(&mut self, writer: RowWriter) {
        self.add_row_buffer(writer.into_buffer());
    }

    /// 零拷贝通道：`row` 必须没有被其他缓冲区共享
    pub fn add_row_buffer(&mut self, mut row: ChainBuffer) {
        debug_assert!(!row.is_shared(), "row buffer must be exclusively owned");
        let mut buf = [0u8; MAX_VARINT_LEN];
        let prefix = encode_varint_to(row.len() as u64, &mut buf);
        log::trace!("Write row length {}", row.len());
        row.prepend_bytes(prefix);
        self.link(row);
    }

    /// 拷贝通道：原始行字节
    pub fn add_row_bytes(&mut self, row: &[u8]) {
        self.write_row_length(row.len());
        self.data.extend_from_slice(row);
    }

    /// 追加已经带长度前缀的内容
    pub fn add_all_bytes(&mut self, rows: &[u8]) {
        self.data.extend_from_slice(rows);
    }

    /// 链接已经带长度前缀的缓冲区
    pub fn add_all_buffer(&mut self, rows: ChainBuffer) {
        self.link(rows);
    }

    /// 按加入顺序输出全部行
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        self.head.append_to(&mut bytes);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// 取走全部行
    pub fn finish(mut self) -> ChainBuffer {
        self.seal_pending();
        self.head.take()
    }

    /// 清空已写入的行，保留 schema 和容量提示
    pub fn reset(&mut self) {
        self.head.clear();
        self.data = Vec::with_capacity(self.reserved_size);
    }

    fn write_row_length(&mut self, len: usize) {
        log::trace!("Write row length {}", len);
        let mut buf = [0u8; MAX_VARINT_LEN];
        let prefix = encode_varint_to(len as u64, &mut buf);
        debug_assert!(!prefix.is_empty());
        self.data.extend_from_slice(prefix);
    }

    fn link(&mut self, rows: ChainBuffer) {
        self.seal_pending();
        self.head.append_owned(rows);
    }

    fn seal_pending(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let pending = mem::replace(&mut self.data, Vec::with_capacity(self.reserved_size));
        self.head.append_owned(ChainBuffer::from(pending));
    }
}
