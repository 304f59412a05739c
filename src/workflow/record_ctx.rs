//! 记录处理上下文
//!
//! 封装"我正在处理哪个文件的第几条记录"这一信息

use crate::models::ExamType;
use std::fmt::Display;

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 源文件名（仅用于日志显示）
    pub file: String,

    /// 文件在本次入库中的序号（从1开始）
    pub file_index: usize,

    /// 记录在文件中的序号（从1开始）
    pub record_index: usize,

    /// 考试类型
    pub exam: ExamType,
}

impl RecordCtx {
    pub fn new(file: impl Into<String>, file_index: usize, exam: ExamType) -> Self {
        Self {
            file: file.into(),
            file_index,
            record_index: 0,
            exam,
        }
    }

    /// 切换到下一条记录
    pub fn at(&self, record_index: usize) -> Self {
        Self {
            record_index,
            ..self.clone()
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} 文件#{} {} 记录#{}]",
            self.exam, self.file_index, self.file, self.record_index
        )
    }
}
