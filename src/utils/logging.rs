// 日志工具模块
//
// 封装 flexi_logger 的初始化和关闭操作，确保异步日志正确 flush

use crate::config::{Config, LogConfig};
use crate::core::error::CodecResult;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::sync::Mutex;

/// 全局日志句柄，用于程序退出时 flush
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// 初始化日志系统
///
/// 库本身不会调用它，由嵌入方在启动时调用；重复调用不会替换已有的 logger。
///
/// # Examples
/// ```no_run
/// use rowcodec::config::Config;
/// use rowcodec::utils::logging;
///
/// let config = Config::default();
/// logging::init(&config).expect("日志初始化失败");
/// ```
pub fn init(config: &Config) -> CodecResult<()> {
    let mut guard = LOGGER_HANDLE.lock().unwrap_or_else(|e| e.into_inner());
    if guard.is_some() {
        log::warn!("日志系统已初始化，忽略重复的初始化");
        return Ok(());
    }

    let log_config = &config.log;
    let handle = Logger::try_with_str(&log_config.level)?
        .log_to_file(file_spec(log_config))
        .rotate(
            Criterion::Size(log_config.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(log_config.max_files),
        )
        .write_mode(WriteMode::Async)
        .append()
        .start()?;
    *guard = Some(handle);

    log::info!("日志系统初始化完成: {}/{}", log_config.dir, log_config.file);
    Ok(())
}

fn file_spec(log_config: &LogConfig) -> FileSpec {
    FileSpec::default()
        .basename(&log_config.file)
        .directory(&log_config.dir)
}

/// 刷新并关闭日志系统
///
/// 在程序退出前调用，确保所有异步日志都已写入文件
pub fn shutdown() {
    let handle = LOGGER_HANDLE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take();
    if let Some(handle) = handle {
        handle.flush();
    }
}

/// 检查日志系统是否已初始化
pub fn is_initialized() -> bool {
    LOGGER_HANDLE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .is_some()
}
