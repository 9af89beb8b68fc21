//! Location 错误类型

use thiserror::Error;

/// Location provider 错误
#[derive(Debug, Error)]
pub enum LocationError {
    /// 回放文件读取失败
    #[error("failed to read track file: {0}")]
    Io(#[from] std::io::Error),

    /// 回放记录解析失败
    #[error("invalid fix on line {line}: {message}")]
    ParseFailed {
        /// 行号 (1-based)
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 回放文件为空
    #[error("track file contains no fixes")]
    EmptyTrack,

    /// Contract 层错误
    #[error(transparent)]
    Contract(#[from] contracts::TrackerError),
}

/// Location Result 类型别名
pub type Result<T> = std::result::Result<T, LocationError>;
