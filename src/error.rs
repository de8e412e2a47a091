/// 错误处理模块
///
/// 通过重新导出utils::error中的所有错误类型，简化错误类型的导入路径，
/// 其他模块可以通过 use crate::error::{AppError, AppResult} 使用。
pub use crate::utils::error::*;
