use thiserror::Error;

/// 服务器生命周期错误
///
/// 请求处理期间的错误走 [`crate::utils::AppError`]；
/// 这里只覆盖启动和关闭阶段。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// 服务器生命周期的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
