//! 组卷抽样服务 - 业务能力层
//!
//! 按组卷模式逐项抽取题组：
//! 1. 按区块名（精确或包含）和题组类型过滤候选池
//! 2. 候选池为空则跳过该项，结果中不出现该区块
//! 3. 无放回随机抽取 `min(候选数, count)` 个题组，题组整体进出
//! 4. 按抽取顺序展开题目，材料题注入 `context_passage`（请求级副本）
//! 5. 按题目计数的项展开后截断到 `count`，最后一个题组可能被截断

use crate::models::{Group, Question, SectionMap};
use crate::services::rules::PatternEntry;
use rand::seq::index;
use rand::Rng;

/// 年份区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: u32,
    pub end: u32,
}

impl YearRange {
    /// 不限年份，年份未知（0）的题组同样可选
    pub const ALL: YearRange = YearRange {
        start: 0,
        end: u32::MAX,
    };

    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self {
            start: start.unwrap_or(Self::ALL.start),
            end: end.unwrap_or(Self::ALL.end),
        }
    }

    pub fn contains(&self, year: u32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::ALL
    }
}

/// 按题组第一道题的年份过滤
pub fn filter_by_year(groups: &[Group], years: YearRange) -> Vec<&Group> {
    groups
        .iter()
        .filter(|group| years.contains(group.exam_year()))
        .collect()
}

/// 按组卷模式抽样
#[derive(Debug, Clone, Copy)]
pub struct ExamPatternSampler<'p> {
    pattern: &'p [PatternEntry],
}

impl<'p> ExamPatternSampler<'p> {
    pub fn new(pattern: &'p [PatternEntry]) -> Self {
        Self { pattern }
    }

    /// 从候选池组卷，返回 区块标签 → 题目列表
    ///
    /// 多个模式项可以共用同一标签，题目按模式项顺序追加
    pub fn assemble<R: Rng + ?Sized>(&self, pool: &[&Group], rng: &mut R) -> SectionMap {
        let mut sections = SectionMap::new();

        for entry in self.pattern {
            let sub_pool: Vec<&Group> = pool.iter().copied().filter(|g| entry.accepts(g)).collect();
            if sub_pool.is_empty() {
                tracing::debug!("组卷模式 {} ({}) 没有候选题组，跳过", entry.label, entry.section);
                continue;
            }

            let questions = sample_entry(entry, &sub_pool, rng);
            if questions.is_empty() {
                continue;
            }

            tracing::debug!(
                "组卷模式 {}: 候选 {} 组，取得 {} 道题",
                entry.label,
                sub_pool.len(),
                questions.len()
            );
            sections.extend(&entry.label, questions);
        }

        sections
    }
}

/// 单个模式项：无放回抽取题组 → 展开 → 按需截断
fn sample_entry<R: Rng + ?Sized>(
    entry: &PatternEntry,
    sub_pool: &[&Group],
    rng: &mut R,
) -> Vec<Question> {
    let amount = sub_pool.len().min(entry.count);
    let picked = index::sample(rng, sub_pool.len(), amount);

    let mut questions: Vec<Question> = picked
        .iter()
        .flat_map(|i| sub_pool[i].detached_questions())
        .collect();

    if let Some(cap) = entry.question_cap() {
        questions.truncate(cap);
    }
    questions
}
