use crate::models::exam_type::ExamType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 单道题目（已清洗、已分类）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub exam_type: ExamType,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub exam_year: u32,
    pub section: String,
    #[serde(default)]
    pub topic: String,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub correct_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 只在组卷时填充，题库中始终为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_passage: Option<String>,
}

/// 题组：一道独立题，或一篇材料及其下所有题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub is_set: bool,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_text: Option<String>,
    pub questions: Vec<Question>,
}

impl Group {
    /// 检查题组结构，返回第一条不满足的约束
    ///
    /// 题组至少一道题；独立题组只有一道题；材料题组带材料；所有题目与题组同一 section
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.questions.is_empty() {
            return Some("题组没有题目");
        }
        if !self.is_set && self.questions.len() > 1 {
            return Some("独立题组包含多道题");
        }
        if self.is_set && self.passage_text.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Some("材料题组缺少材料");
        }
        if self.questions.iter().any(|q| q.section != self.section) {
            return Some("题目 section 与题组不一致");
        }
        None
    }

    /// 题组年份取第一道题的年份，空题组视为 0
    pub fn exam_year(&self) -> u32 {
        self.questions.first().map(|q| q.exam_year).unwrap_or(0)
    }

    /// 是否包含指定知识点的题目
    pub fn has_topic(&self, topic: &str) -> bool {
        self.questions.iter().any(|q| q.topic == topic)
    }

    /// 复制题目列表，材料题组会把材料注入每道题的 `context_passage`
    ///
    /// 返回的是请求级副本，共享题库中的题目不会被修改
    pub fn detached_questions(&self) -> impl Iterator<Item = Question> + '_ {
        let passage = if self.is_set {
            self.passage_text.as_deref()
        } else {
            None
        };
        self.questions.iter().map(move |q| {
            let mut copy = q.clone();
            if let Some(text) = passage {
                copy.context_passage = Some(text.to_string());
            }
            copy
        })
    }
}

/// 原始题目记录（入库前）
///
/// 字段类型故意放宽：年份可以是字符串，选项可以是列表或一整段文本
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub question_text: Option<String>,
    #[serde(default)]
    pub options: JsonValue,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub correct_option: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub exam_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub exam_year: u32,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub context_passage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub image_url: Option<String>,
}

impl RawQuestion {
    /// 把选项统一为字符串列表（未清洗）
    ///
    /// 列表按元素展开；单个字符串优先按换行拆分，其次按逗号拆分
    pub fn option_texts(&self) -> Vec<String> {
        match &self.options {
            JsonValue::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect(),
            JsonValue::String(s) => {
                let parts: Vec<&str> = if s.contains('\n') {
                    s.split('\n').collect()
                } else if s.contains(',') {
                    s.split(',').collect()
                } else {
                    vec![s.as_str()]
                };
                parts
                    .into_iter()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

/// 答案键（`answer_keys` 数组中的元素）
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerKey {
    #[serde(deserialize_with = "deserialize_required_string")]
    pub question_id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub correct_option: Option<String>,
}

/// 一个原始数据文件的两种合法形态
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBatch {
    /// 题目记录数组
    Records(Vec<JsonValue>),
    /// 题库 + 答案键
    Bank {
        question_bank: Vec<JsonValue>,
        #[serde(default)]
        answer_keys: Vec<JsonValue>,
    },
}

// Helper function to deserialize year as either string or integer
fn deserialize_year<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a year")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().parse().unwrap_or(0))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).unwrap_or(0))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).unwrap_or(0))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
                Ok(value as u32)
            } else {
                Ok(0)
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(0)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(YearVisitor)
}

/// 字符串字段：接受字符串、数字、布尔，`null` 视为缺失
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        JsonValue::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string-like value, found {}",
            other
        ))),
    }
}

fn deserialize_required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_lenient_string(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a non-null string"))
}
