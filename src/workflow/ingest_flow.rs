//! 入库流程 - 流程层
//!
//! 核心职责：定义"一个原始文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 合并答案键（题库 + 答案键形态）
//! 2. 逐条解析记录 → 清洗题干/选项 → 跳过过短的题目
//! 3. 规则分类（题干无法判断时参考材料）
//! 4. 按材料哈希归组，同组题目继承第一道题的 section

use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::IngestionError;
use crate::models::{AnswerKey, ExamType, Group, Question, RawBatch, RawQuestion};
use crate::services::text_normalizer::{normalize, normalize_opt};
use crate::services::{ExamProfile, GroupBuilder, GroupKeyResolver, PushOutcome, RuleBasedClassifier};
use crate::utils::logging::truncate_text;
use crate::workflow::record_ctx::RecordCtx;

/// 入库统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub files_ok: usize,
    pub files_failed: usize,
    pub records_read: usize,
    pub malformed: usize,
    pub too_short: usize,
    pub duplicates: usize,
    pub groups: usize,
    pub questions: usize,
}

impl IngestStats {
    /// 累加另一份统计
    pub fn merge(&mut self, other: &IngestStats) {
        self.files_ok += other.files_ok;
        self.files_failed += other.files_failed;
        self.records_read += other.records_read;
        self.malformed += other.malformed;
        self.too_short += other.too_short;
        self.duplicates += other.duplicates;
        self.groups += other.groups;
        self.questions += other.questions;
    }

    /// 被跳过的记录总数
    pub fn skipped(&self) -> usize {
        self.malformed + self.too_short + self.duplicates
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub groups: Vec<Group>,
    pub stats: IngestStats,
}

/// 入库流程
///
/// - 只依赖业务能力（services），不做文件读写
/// - 单条记录出错只跳过该记录
pub struct IngestFlow {
    exam: ExamType,
    classifier: RuleBasedClassifier,
    resolver: GroupKeyResolver,
    min_question_len: usize,
    keep_source_labels: bool,
    verbose_logging: bool,
}

impl IngestFlow {
    pub fn new(config: &Config, profile: ExamProfile) -> Self {
        Self {
            exam: profile.exam,
            classifier: RuleBasedClassifier::new(profile),
            resolver: GroupKeyResolver::new(config.passage_min_len),
            min_question_len: config.min_question_len,
            keep_source_labels: config.keep_source_labels,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 处理一个文件的全部记录
    pub fn run(&self, batch: RawBatch, ctx: &RecordCtx) -> FileOutcome {
        let (records, answers) = match batch {
            RawBatch::Records(records) => (records, HashMap::new()),
            RawBatch::Bank {
                question_bank,
                answer_keys,
            } => (question_bank, self.answer_map(answer_keys, ctx)),
        };

        let mut stats = IngestStats {
            files_ok: 1,
            records_read: records.len(),
            ..Default::default()
        };
        let mut builder = GroupBuilder::new(self.resolver);

        for (idx, value) in records.into_iter().enumerate() {
            let ctx = ctx.at(idx + 1);

            let raw: RawQuestion = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    let err = IngestionError::MalformedRecord {
                        index: idx + 1,
                        source: e,
                    };
                    warn!("{} ⚠️ 跳过: {}", ctx, err);
                    stats.malformed += 1;
                    continue;
                }
            };

            if let Some(declared) = raw.exam_type.as_deref().and_then(ExamType::find) {
                if declared != self.exam {
                    debug!("{} 记录声明的考试类型为 {}，按目录归入 {}", ctx, declared, self.exam);
                }
            }

            let (question, passage) = match self.build_question(raw, &answers, idx + 1) {
                Ok(built) => built,
                Err(err) => {
                    debug!("{} 跳过: {}", ctx, err);
                    stats.too_short += 1;
                    continue;
                }
            };

            if self.verbose_logging {
                info!(
                    "{} {} / {} | {}",
                    ctx,
                    question.section,
                    question.topic,
                    truncate_text(&question.question_text, 60)
                );
            }

            if builder.push(question, passage.as_deref()) == PushOutcome::Duplicate {
                warn!("{} ⚠️ 题目 ID 重复，已跳过", ctx);
                stats.duplicates += 1;
            }
        }

        let groups = builder.finish();
        stats.groups = groups.len();
        stats.questions = groups.iter().map(|g| g.questions.len()).sum();

        info!(
            "[{} 文件#{}] ✓ {}: {} 条记录 → {} 个题组 / {} 道题（跳过 {}）",
            self.exam,
            ctx.file_index,
            ctx.file,
            stats.records_read,
            stats.groups,
            stats.questions,
            stats.skipped()
        );

        FileOutcome { groups, stats }
    }

    /// 解析答案键，格式错误的条目跳过
    fn answer_map(&self, answer_keys: Vec<JsonValue>, ctx: &RecordCtx) -> HashMap<String, String> {
        let mut answers = HashMap::with_capacity(answer_keys.len());
        for value in answer_keys {
            match serde_json::from_value::<AnswerKey>(value) {
                Ok(AnswerKey {
                    question_id,
                    correct_option: Some(answer),
                }) => {
                    answers.insert(question_id.trim().to_string(), answer);
                }
                Ok(_) => {}
                Err(e) => warn!("{} ⚠️ 答案键格式错误: {}", ctx, e),
            }
        }
        answers
    }

    /// 清洗并分类一条记录，返回题目和（未清洗的）材料
    fn build_question(
        &self,
        raw: RawQuestion,
        answers: &HashMap<String, String>,
        index: usize,
    ) -> Result<(Question, Option<String>), IngestionError> {
        let question_text = normalize_opt(raw.question_text.as_deref());
        let len = question_text.chars().count();
        if len < self.min_question_len {
            return Err(IngestionError::QuestionTooShort { index, len });
        }

        let options: Vec<String> = raw
            .option_texts()
            .iter()
            .map(|o| normalize(o))
            .filter(|o| !o.is_empty())
            .collect();

        let id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generated_id(self.exam, &question_text));

        let correct_option = answers
            .get(&id)
            .cloned()
            .or(raw.correct_option)
            .map(|a| normalize(&a))
            .filter(|a| !a.is_empty());

        let passage = raw.context_passage.filter(|p| !p.trim().is_empty());
        let classified = self
            .classifier
            .classify_with_context(&question_text, &options, passage.as_deref());

        let (section, topic) = if self.keep_source_labels {
            (
                source_label(raw.section.as_deref()).unwrap_or(classified.section),
                source_label(raw.topic.as_deref()).unwrap_or(classified.topic),
            )
        } else {
            (classified.section, classified.topic)
        };

        let question = Question {
            id,
            exam_type: self.exam,
            exam_year: raw.exam_year,
            section,
            topic,
            question_text,
            options,
            correct_option,
            image_url: raw.image_url.filter(|u| !u.trim().is_empty()),
            context_passage: None,
        };

        Ok((question, passage))
    }
}

/// 缺少 ID 的记录按题干生成稳定 ID：`<EXAM>_<8 位十六进制>`
fn generated_id(exam: ExamType, question_text: &str) -> String {
    let digest = Sha256::digest(question_text.to_lowercase().as_bytes());
    format!("{}_{}", exam.code(), hex::encode_upper(&digest[..4]))
}

fn source_label(label: Option<&str>) -> Option<String> {
    label.map(normalize).filter(|l| !l.is_empty())
}
