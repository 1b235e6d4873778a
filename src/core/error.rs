//! 错误类型定义
//!
//! 行编码本身不返回错误：类型不匹配记录日志后写入零值。
//! 这里的错误来自 schema 校验、配置加载和日志初始化。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Schema serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
