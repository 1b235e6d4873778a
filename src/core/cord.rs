//! ChainBuffer - 分段字节缓冲区
//!
//! 由若干字节段组成的只追加缓冲区（cord），用作行编码的写入目标。
//!
//! ## 增长策略
//!
//! 尾段空间不足时：
//! - 尾段已用空间不超过容量的一半：原地扩容到对齐后的 `capacity + need`
//! - 否则：追加一个新段，容量为 `min(capacity * 2, MAX_GROWTH_SIZE)` 与请求大小中的较大者
//!
//! 段之间通过 `Arc` 共享，`clone_shared` 只复制段引用；
//! 对共享段的写入会先复制该段（写时复制）。

use std::fmt;
use std::mem;
use std::sync::Arc;

/// 新段容量对齐边界
pub const BUFFER_ALIGNMENT: usize = 256;
/// 单次倍增扩容的上限
pub const MAX_GROWTH_SIZE: usize = 256 << 10;

const _: () = assert!(BUFFER_ALIGNMENT.is_power_of_two());

fn aligned_size(size: usize) -> usize {
    (size + BUFFER_ALIGNMENT - 1) & !(BUFFER_ALIGNMENT - 1)
}

/// 可以按固定宽度小端写入的基本类型
pub trait FixedWidth: Copy {
    const WIDTH: usize;

    fn put_le(self, dst: &mut [u8]);
}

macro_rules! impl_fixed_width {
    ($($t:ty),*) => {
        $(
            impl FixedWidth for $t {
                const WIDTH: usize = mem::size_of::<$t>();

                fn put_le(self, dst: &mut [u8]) {
                    dst[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FixedWidth for bool {
    const WIDTH: usize = 1;

    fn put_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
}

/// 单个字节段
///
/// `buf` 的长度即段容量，有效数据位于 `head..tail`。
#[derive(Clone)]
struct Segment {
    buf: Vec<u8>,
    head: usize,
    tail: usize,
}

impl Segment {
    fn with_capacity(capacity: usize) -> Self {
        Self::with_headroom(0, capacity)
    }

    fn with_headroom(headroom: usize, capacity: usize) -> Self {
        Self {
            buf: vec![0; headroom + capacity],
            head: headroom,
            tail: headroom,
        }
    }

    fn from_vec(buf: Vec<u8>) -> Self {
        let tail = buf.len();
        Self { buf, head: 0, tail }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn len(&self) -> usize {
        self.tail - self.head
    }

    fn headroom(&self) -> usize {
        self.head
    }

    fn tailroom(&self) -> usize {
        self.buf.len() - self.tail
    }

    fn data(&self) -> &[u8] {
        &self.buf[self.head..self.tail]
    }

    fn writable_tail(&mut self) -> &mut [u8] {
        &mut self.buf[self.tail..]
    }

    fn append(&mut self, amount: usize) {
        debug_assert!(amount <= self.tailroom());
        self.tail += amount;
    }

    fn put(&mut self, bytes: &[u8]) {
        self.writable_tail()[..bytes.len()].copy_from_slice(bytes);
        self.append(bytes.len());
    }

    fn prepend(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.headroom());
        self.head -= bytes.len();
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
    }

    fn grow(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.capacity());
        self.buf.resize(new_capacity, 0);
    }
}

/// 分段字节缓冲区
///
/// 自行维护总长度，避免每次 `len()` 都遍历所有段。
/// `Clone` 与 `clone_shared` 相同：共享段，不复制数据。
#[derive(Clone, Default)]
pub struct ChainBuffer {
    segments: Vec<Arc<Segment>>,
    len: usize,
}

impl ChainBuffer {
    /// 创建空缓冲区，不分配任何段
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建缓冲区并预留至少 `reserve` 字节的写入空间
    pub fn with_capacity(reserve: usize) -> Self {
        let mut buffer = Self::new();
        if reserve > 0 {
            buffer.ensure_capacity(reserve);
        }
        buffer
    }

    /// 创建单段缓冲区，段头部留出 `headroom` 字节供之后 `prepend_bytes` 使用
    pub fn with_headroom(headroom: usize, capacity: usize) -> Self {
        Self {
            segments: vec![Arc::new(Segment::with_headroom(headroom, capacity))],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        debug_assert!(!self.segments.is_empty() || self.len == 0);
        debug_assert_eq!(self.len, self.compute_chain_len());
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 遍历所有段重新计算总长度，用于校验缓存的长度
    pub fn compute_chain_len(&self) -> usize {
        self.segments.iter().map(|segment| segment.len()).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// 首段头部的空闲字节数
    pub fn headroom(&self) -> usize {
        self.segments.first().map_or(0, |segment| segment.headroom())
    }

    /// 是否有段同时被其他缓冲区引用
    pub fn is_shared(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| Arc::strong_count(segment) > 1)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.len = 0;
    }

    /// 保证尾段至少有 `size` 字节的空闲空间
    pub fn ensure_capacity(&mut self, size: usize) {
        let Some(last) = self.segments.last() else {
            self.segments
                .push(Arc::new(Segment::with_capacity(aligned_size(size))));
            return;
        };

        if size <= last.tailroom() {
            return;
        }
        self.ensure_capacity_slow(size);
    }

    fn ensure_capacity_slow(&mut self, size: usize) {
        let Some(last) = self.segments.last_mut() else {
            return;
        };
        let room = last.tailroom();
        let length = last.len();
        let capacity = last.capacity();

        if length <= capacity / 2 {
            let need = size - room;
            Arc::make_mut(last).grow(aligned_size(capacity + need));
            return;
        }

        let new_capacity = (capacity * 2).min(MAX_GROWTH_SIZE).max(size);
        self.segments
            .push(Arc::new(Segment::with_capacity(new_capacity)));
    }

    /// 尾段的可写区域，写入后需调用 `advance` 提交
    pub fn tail_mut(&mut self) -> &mut [u8] {
        match self.segments.last_mut() {
            Some(last) => Arc::make_mut(last).writable_tail(),
            None => &mut [],
        }
    }

    /// 提交 `amount` 字节已写入尾段的数据
    pub fn advance(&mut self, amount: usize) {
        if amount == 0 {
            return;
        }
        if let Some(last) = self.segments.last_mut() {
            Arc::make_mut(last).append(amount);
            self.len += amount;
        }
    }

    pub fn append_value<T: FixedWidth>(&mut self, value: T) -> &mut Self {
        self.ensure_capacity(T::WIDTH);
        value.put_le(self.tail_mut());
        self.advance(T::WIDTH);
        self
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        if bytes.is_empty() {
            return self;
        }
        self.ensure_capacity(bytes.len());
        self.tail_mut()[..bytes.len()].copy_from_slice(bytes);
        self.advance(bytes.len());
        self
    }

    /// 把 `other` 的全部内容复制成一个新的尾段
    pub fn append_chain(&mut self, other: &ChainBuffer) -> &mut Self {
        let other_len = other.len();
        if other_len == 0 {
            return self;
        }

        let mut new_tail = Segment::with_capacity(other_len);
        other.apply_to(|block| {
            new_tail.put(block);
            true
        });
        self.segments.push(Arc::new(new_tail));
        self.len += other_len;
        self
    }

    /// 把 `other` 的段直接链接到尾部，不复制数据
    pub fn append_owned(&mut self, mut other: ChainBuffer) -> &mut Self {
        self.len += other.len;
        self.segments.append(&mut other.segments);
        self
    }

    /// 把 `header` 的段链接到头部
    ///
    /// 之后还要写入时，调用方需保证 `header` 没有被其他缓冲区共享。
    pub fn prepend_header(&mut self, mut header: ChainBuffer) {
        let header_len = header.len;
        self.segments.splice(0..0, header.segments.drain(..));
        self.len += header_len;
    }

    /// 在头部写入 `bytes`：首段头部空间足够时原地写入，否则新建一个头段
    pub fn prepend_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        if let Some(first) = self.segments.first_mut() {
            if first.headroom() >= bytes.len() {
                Arc::make_mut(first).prepend(bytes);
                self.len += bytes.len();
                return;
            }
        }

        let capacity = aligned_size(bytes.len());
        let mut head = Segment::with_headroom(capacity, 0);
        head.prepend(bytes);
        self.segments.insert(0, Arc::new(head));
        self.len += bytes.len();
    }

    /// 依次把每个段交给 `visitor`，`visitor` 返回 `false` 时提前停止
    ///
    /// 返回是否遍历完所有段。
    pub fn apply_to<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&[u8]) -> bool,
    {
        for segment in &self.segments {
            if !visitor(segment.data()) {
                return false;
            }
        }
        true
    }

    /// 追加全部内容到 `out`，返回追加的字节数
    pub fn append_to(&self, out: &mut Vec<u8>) -> usize {
        let size = self.len();
        if size == 0 {
            return 0;
        }

        out.reserve(size);
        self.apply_to(|block| {
            out.extend_from_slice(block);
            true
        });
        size
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        self.append_to(&mut bytes);
        bytes
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    pub fn clone_shared(&self) -> ChainBuffer {
        self.clone()
    }

    /// 复制为只有一个段的新缓冲区
    pub fn clone_coalesced(&self) -> ChainBuffer {
        let mut coalesced = ChainBuffer::new();
        coalesced.append_chain(self);
        coalesced
    }

    /// 取走全部段，原缓冲区变为空
    pub fn take(&mut self) -> ChainBuffer {
        mem::take(self)
    }
}

impl From<Vec<u8>> for ChainBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            segments: vec![Arc::new(Segment::from_vec(bytes))],
            len,
        }
    }
}

impl From<&[u8]> for ChainBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

impl fmt::Debug for ChainBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuffer")
            .field("len", &self.len)
            .field("segments", &self.segments.len())
            .finish()
    }
}
