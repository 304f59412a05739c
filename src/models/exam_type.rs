use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 考试类型枚举
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    /// Common Admission Test
    Cat,
    /// Management Aptitude Test
    Mat,
    /// Xavier Aptitude Test
    Xat,
    /// Common Management Admission Test
    Cmat,
}

/// 考试代码别名表（键统一为大写）
static EXAM_ALIASES: phf::Map<&'static str, ExamType> = phf::phf_map! {
    "CAT" => ExamType::Cat,
    "IIM CAT" => ExamType::Cat,
    "MAT" => ExamType::Mat,
    "AIMA MAT" => ExamType::Mat,
    "XAT" => ExamType::Xat,
    "CMAT" => ExamType::Cmat,
    "NTA CMAT" => ExamType::Cmat,
};

impl ExamType {
    /// 所有支持的考试类型
    pub const ALL: [ExamType; 4] = [ExamType::Cat, ExamType::Mat, ExamType::Xat, ExamType::Cmat];

    /// 获取考试代码
    pub fn code(self) -> &'static str {
        match self {
            ExamType::Cat => "CAT",
            ExamType::Mat => "MAT",
            ExamType::Xat => "XAT",
            ExamType::Cmat => "CMAT",
        }
    }

    /// 获取完整名称
    pub fn name(self) -> &'static str {
        match self {
            ExamType::Cat => "Common Admission Test",
            ExamType::Mat => "Management Aptitude Test",
            ExamType::Xat => "Xavier Aptitude Test",
            ExamType::Cmat => "Common Management Admission Test",
        }
    }

    /// 文件名前缀（`cat_db.json`、`rules/cat.toml`、`raw/cat/`）
    pub fn file_stem(self) -> &'static str {
        match self {
            ExamType::Cat => "cat",
            ExamType::Mat => "mat",
            ExamType::Xat => "xat",
            ExamType::Cmat => "cmat",
        }
    }

    /// 从代码解析考试类型（忽略大小写和首尾空白）
    pub fn from_code(code: &str) -> Option<Self> {
        let key = code.trim().to_uppercase();
        EXAM_ALIASES.get(key.as_str()).copied()
    }

    /// 智能查找考试类型（支持模糊匹配）
    pub fn find(s: &str) -> Option<Self> {
        // 先尝试精确匹配
        if let Some(exam) = Self::from_code(s) {
            return Some(exam);
        }

        // CMAT 必须先于 MAT 检查，否则会被 "MAT" 子串截获
        let upper = s.to_uppercase();
        [ExamType::Cmat, ExamType::Xat, ExamType::Mat, ExamType::Cat]
            .into_iter()
            .find(|exam| upper.contains(exam.code()))
    }
}

impl FromStr for ExamType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| QueryError::UnknownExamType {
            value: s.to_string(),
        })
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
