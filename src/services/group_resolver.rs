//! 题组分组服务 - 业务能力层
//!
//! 同一篇材料下的题目通过材料内容哈希归入同一题组，
//! 没有材料（或材料过短）的题目各自成组

use crate::models::{Group, Question};
use crate::services::text_normalizer::{normalize, normalize_key};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// 默认材料长度阈值（字符数）
pub const DEFAULT_PASSAGE_MIN_LEN: usize = 50;

/// 分组键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    pub key: String,
    pub is_set: bool,
}

/// 分组键计算
#[derive(Debug, Clone, Copy)]
pub struct GroupKeyResolver {
    passage_min_len: usize,
}

impl GroupKeyResolver {
    pub fn new(passage_min_len: usize) -> Self {
        Self { passage_min_len }
    }

    /// 计算题目的分组键
    ///
    /// 材料清洗后长度超过阈值时按材料哈希分组，否则使用题目自身 ID
    pub fn resolve(&self, question_id: &str, passage: Option<&str>) -> GroupKey {
        if let Some(passage) = passage {
            let cleaned = normalize(passage);
            if cleaned.chars().count() > self.passage_min_len {
                return GroupKey {
                    key: passage_digest(&cleaned),
                    is_set: true,
                };
            }
        }

        GroupKey {
            key: question_id.to_string(),
            is_set: false,
        }
    }
}

impl Default for GroupKeyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PASSAGE_MIN_LEN)
    }
}

/// 材料摘要：清洗并转小写后取 SHA-256 的前 128 位，十六进制编码
pub fn passage_digest(passage: &str) -> String {
    let digest = Sha256::digest(normalize_key(passage).as_bytes());
    hex::encode(&digest[..16])
}

/// 题目加入题组的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// 新建了题组
    Created,
    /// 追加到已有材料题组
    Appended,
    /// 题目 ID 在批次内重复，被丢弃
    Duplicate,
}

/// 单个批次内的题组累加器
///
/// 同一分组键下第一道题创建题组（确定 section、材料和 is_set），
/// 后续题目追加到该题组并继承题组的 section
#[derive(Debug, Default)]
pub struct GroupBuilder {
    resolver: GroupKeyResolver,
    index: HashMap<String, usize>,
    seen_ids: HashSet<String>,
    groups: Vec<Group>,
}

impl GroupBuilder {
    pub fn new(resolver: GroupKeyResolver) -> Self {
        Self {
            resolver,
            index: HashMap::new(),
            seen_ids: HashSet::new(),
            groups: Vec::new(),
        }
    }

    /// 加入一道题
    ///
    /// 题目 ID 在批次内已出现过（无论属于材料题组还是独立题）时返回 `Duplicate`
    pub fn push(&mut self, mut question: Question, passage: Option<&str>) -> PushOutcome {
        if self.seen_ids.contains(&question.id) {
            return PushOutcome::Duplicate;
        }
        let GroupKey { key, is_set } = self.resolver.resolve(&question.id, passage);

        if let Some(&idx) = self.index.get(&key) {
            let group = &mut self.groups[idx];
            if !group.is_set || !is_set {
                return PushOutcome::Duplicate;
            }
            question.section = group.section.clone();
            self.seen_ids.insert(question.id.clone());
            group.questions.push(question);
            return PushOutcome::Appended;
        }

        let passage_text = if is_set {
            passage.map(normalize)
        } else {
            None
        };

        self.seen_ids.insert(question.id.clone());
        self.index.insert(key.clone(), self.groups.len());
        self.groups.push(Group {
            group_id: key,
            is_set,
            section: question.section.clone(),
            passage_text,
            questions: vec![question],
        });
        PushOutcome::Created
    }

    /// 已累计的题组数量
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 按首次出现顺序返回所有题组
    pub fn finish(self) -> Vec<Group> {
        self.groups
    }
}
