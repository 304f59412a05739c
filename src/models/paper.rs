use crate::models::exam_type::ExamType;
use crate::models::question::Question;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 分区题目表：区块标签 → 有序题目列表
///
/// 保持组卷模式中的区块顺序，序列化为 JSON 对象
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMap {
    entries: Vec<(String, Vec<Question>)>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加题目到指定区块，区块不存在时按出现顺序新建
    pub fn extend(&mut self, label: &str, questions: Vec<Question>) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, existing)) => existing.extend(questions),
            None => self.entries.push((label.to_string(), questions)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[Question]> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, qs)| qs.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有区块的题目总数
    pub fn question_count(&self) -> usize {
        self.entries.iter().map(|(_, qs)| qs.len()).sum()
    }
}

impl Serialize for SectionMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, questions) in &self.entries {
            map.serialize_entry(label, questions)?;
        }
        map.end()
    }
}

/// 模拟考试卷
#[derive(Debug, Clone, serde::Serialize)]
pub struct MockTest {
    pub id: String,
    pub exam_type: ExamType,
    pub sections: SectionMap,
}

/// 专项练习
#[derive(Debug, Clone, serde::Serialize)]
pub struct PracticeSet {
    pub id: String,
    pub exam_type: ExamType,
    pub mode: &'static str,
    pub questions: Vec<Question>,
}
