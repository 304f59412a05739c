use crate::models::exam_type::ExamType;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 入库（数据清洗）错误
    #[error("入库错误: {0}")]
    Ingestion(#[from] IngestionError),
    /// 查询（组卷）错误
    #[error("查询错误: {0}")]
    Query(#[from] QueryError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 规则表错误
    #[error("规则表错误: {0}")]
    Rules(#[from] RulesError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 入库错误：只影响单个文件或单条记录，不会中断整个批次
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 文件不是合法的题目数组或题库对象
    #[error("数据文件格式错误 ({path}): {source}")]
    MalformedFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 单条记录无法解析
    #[error("第 {index} 条记录格式错误: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    /// 题干为空或过短
    #[error("第 {index} 条记录题干过短 ({len} 个字符)")]
    QuestionTooShort { index: usize, len: usize },
}

/// 查询错误：直接映射为客户端可见的状态
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// 该考试类型的题库为空
    #[error("{exam} 题库为空，暂不提供服务")]
    EmptyDatabase { exam: ExamType },
    /// 筛选条件排除了所有题组
    #[error("{exam} 没有符合筛选条件的题目")]
    EmptyPool { exam: ExamType },
    /// 无法识别的考试类型
    #[error("无法识别的考试类型: {value}")]
    UnknownExamType { value: String },
}

impl QueryError {
    /// 对应的 HTTP 状态码（供外部请求层使用）
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::EmptyDatabase { .. } => 503,
            QueryError::EmptyPool { .. } => 404,
            QueryError::UnknownExamType { .. } => 400,
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 规则表错误
#[derive(Debug, Error)]
pub enum RulesError {
    /// TOML 解析失败
    #[error("TOML解析失败 ({origin}): {source}")]
    TomlParseFailed {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    /// 规则表内容不合法
    #[error("规则表 {origin} 不合法: {reason}")]
    Invalid { origin: String, reason: String },
    /// 规则表声明的考试类型与文件不一致
    #[error("规则表 {origin} 声明的考试类型为 {found}，期望 {expected}")]
    ExamMismatch {
        origin: String,
        expected: ExamType,
        found: ExamType,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {name} 的值 '{value}' 不合法: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed {
            path: String::new(), // serde_json 错误不包含路径信息
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Rules(RulesError::TomlParseFailed {
            origin: String::new(),
            source: err,
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建规则表校验错误
    pub fn invalid_rules(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Rules(RulesError::Invalid {
            origin: origin.into(),
            reason: reason.into(),
        })
    }

    /// 是否为查询错误（客户端可见）
    pub fn as_query(&self) -> Option<&QueryError> {
        match self {
            AppError::Query(e) => Some(e),
            _ => None,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
