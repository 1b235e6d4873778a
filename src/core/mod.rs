pub mod codec;
pub mod cord;
pub mod error;

// 错误和结果类型
pub use error::{CodecError, CodecResult};

// 编码核心类型
pub use codec::{Datum, RowSetWriter, RowWriter};
pub use cord::ChainBuffer;
