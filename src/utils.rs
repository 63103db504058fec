use std::io::{self, Write};
use std::str::FromStr;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

static LOGGING: OnceCell<Result<Level, LoggingError>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    #[error("console logging not installed: {0}")]
    AlreadyInstalled(String),
}

pub fn set_panic_hook() {
    // 出现 panic 时把信息打印到浏览器控制台。
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// 未识别的级别回退到 `info`。
pub fn parse_level(level: Option<&str>) -> Level {
    level
        .and_then(|value| Level::from_str(value.trim()).ok())
        .unwrap_or(Level::INFO)
}

/// 安装把 `tracing` 输出转发到浏览器控制台的订阅者，只尝试一次，
/// 之后的调用返回第一次的结果。已有其他全局订阅者时返回错误。
pub fn init_logging(level: Level) -> Result<Level, LoggingError> {
    LOGGING
        .get_or_init(|| {
            tracing_subscriber::fmt()
                .with_writer(ConsoleMakeWriter)
                .with_max_level(level)
                .without_time()
                .with_target(false)
                .try_init()
                .map(|()| level)
                .map_err(|error| LoggingError::AlreadyInstalled(error.to_string()))
        })
        .clone()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// 缓存一条格式化好的日志，drop 时按级别写入 `console`。
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&self.buffer);
        let message = JsValue::from_str(line.trim_end());
        match self.level {
            Level::ERROR => web_sys::console::error_1(&message),
            Level::WARN => web_sys::console::warn_1(&message),
            Level::INFO => web_sys::console::info_1(&message),
            _ => web_sys::console::debug_1(&message),
        }
        self.buffer.clear();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
