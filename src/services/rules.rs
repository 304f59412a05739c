//! 规则表 - 业务能力层
//!
//! 每个考试类型一份 TOML 规则表（`rules/<exam>.toml`），包含：
//! - 有序的区块规则列表，每条区块规则下有有序的知识点规则列表
//! - 组卷模式（区块 → 目标数量）
//!
//! 规则顺序即优先级，匹配引擎见 `classifier`

use crate::error::{AppError, AppResult, RulesError};
use crate::models::{ExamType, Group};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 关键词匹配范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 题干 + 所有选项
    Combined,
    /// 仅题干
    Question,
}

/// 触发条件
///
/// `any` 为空时视为命中；`all` 必须全部出现；`none` 任意出现即否决
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub none: Vec<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl Trigger {
    /// 判断是否命中（文本须已转小写）
    pub fn fires(&self, question: &str, combined: &str, default_scope: Scope) -> bool {
        let haystack = match self.scope.unwrap_or(default_scope) {
            Scope::Combined => combined,
            Scope::Question => question,
        };

        (self.any.is_empty() || self.any.iter().any(|k| haystack.contains(k.as_str())))
            && self.all.iter().all(|k| haystack.contains(k.as_str()))
            && !self.none.iter().any(|k| haystack.contains(k.as_str()))
    }

    fn keywords_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.any
            .iter_mut()
            .chain(self.all.iter_mut())
            .chain(self.none.iter_mut())
    }
}

/// 知识点规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRule {
    pub label: String,
    #[serde(flatten)]
    pub trigger: Trigger,
}

/// 区块规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRule {
    pub label: String,
    pub default_topic: String,
    #[serde(flatten)]
    pub trigger: Trigger,
    #[serde(default, rename = "topic")]
    pub topics: Vec<TopicRule>,
}

/// 区块名匹配方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Exact,
    Contains,
}

/// 题组类型过滤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetFilter {
    #[default]
    Any,
    /// 只要材料题组
    Sets,
    /// 只要独立题
    Standalone,
}

/// 目标数量的含义
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    /// 抽取 `count` 个题组，展开后截断到 `count` 道题
    #[default]
    Questions,
    /// 抽取 `count` 个题组，展开后不截断
    Groups,
}

/// 组卷模式中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    /// 结果中的区块标签，多项可共用同一标签（按顺序追加）
    pub label: String,
    /// 匹配题组 section 的名称
    pub section: String,
    #[serde(default, rename = "match")]
    pub matcher: MatchKind,
    #[serde(default)]
    pub sets: SetFilter,
    #[serde(default)]
    pub quota: QuotaKind,
    pub count: usize,
}

impl PatternEntry {
    /// 题组是否属于该项的候选池
    pub fn accepts(&self, group: &Group) -> bool {
        let section_ok = match self.matcher {
            MatchKind::Exact => group.section == self.section,
            MatchKind::Contains => group.section.contains(self.section.as_str()),
        };
        let kind_ok = match self.sets {
            SetFilter::Any => true,
            SetFilter::Sets => group.is_set,
            SetFilter::Standalone => !group.is_set,
        };
        section_ok && kind_ok
    }

    /// 展开后的题目上限，`None` 表示不截断
    pub fn question_cap(&self) -> Option<usize> {
        match self.quota {
            QuotaKind::Questions => Some(self.count),
            QuotaKind::Groups => None,
        }
    }
}

/// 一个考试类型的完整规则表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamProfile {
    pub version: String,
    pub exam: ExamType,
    pub fallback_section: String,
    pub fallback_topic: String,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionRule>,
    #[serde(default, rename = "pattern")]
    pub pattern: Vec<PatternEntry>,
}

const CAT_RULES: &str = include_str!("../../rules/cat.toml");
const MAT_RULES: &str = include_str!("../../rules/mat.toml");
const XAT_RULES: &str = include_str!("../../rules/xat.toml");
const CMAT_RULES: &str = include_str!("../../rules/cmat.toml");

impl ExamProfile {
    /// 内置规则表
    pub fn builtin(exam: ExamType) -> AppResult<Self> {
        let source = match exam {
            ExamType::Cat => CAT_RULES,
            ExamType::Mat => MAT_RULES,
            ExamType::Xat => XAT_RULES,
            ExamType::Cmat => CMAT_RULES,
        };
        Self::from_toml_str(source, exam, &format!("builtin:{}", exam.file_stem()))
    }

    /// 加载规则表：外部文件存在时优先，否则使用内置规则表
    pub async fn load(exam: ExamType, override_path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = override_path {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
                tracing::info!("📐 使用外部规则表: {}", path.display());
                return Self::from_toml_str(&content, exam, &path.display().to_string());
            }
            tracing::debug!("外部规则表不存在，使用内置规则表: {}", path.display());
        }
        Self::builtin(exam)
    }

    /// 解析并校验规则表，关键词统一转为小写
    pub fn from_toml_str(source: &str, exam: ExamType, origin: &str) -> AppResult<Self> {
        let mut profile: ExamProfile =
            toml::from_str(source).map_err(|e| RulesError::TomlParseFailed {
                origin: origin.to_string(),
                source: e,
            })?;

        if profile.exam != exam {
            return Err(RulesError::ExamMismatch {
                origin: origin.to_string(),
                expected: exam,
                found: profile.exam,
            }
            .into());
        }

        profile.validate(origin)?;
        profile.lowercase_keywords();
        Ok(profile)
    }

    fn validate(&self, origin: &str) -> AppResult<()> {
        if self.fallback_section.trim().is_empty() || self.fallback_topic.trim().is_empty() {
            return Err(AppError::invalid_rules(origin, "兜底区块和兜底知识点不能为空"));
        }
        for rule in &self.sections {
            if rule.label.trim().is_empty() || rule.default_topic.trim().is_empty() {
                return Err(AppError::invalid_rules(origin, "区块规则缺少名称或默认知识点"));
            }
            if let Some(topic) = rule.topics.iter().find(|t| t.label.trim().is_empty()) {
                return Err(AppError::invalid_rules(
                    origin,
                    format!("区块 {} 下存在空名称的知识点规则 {:?}", rule.label, topic.trigger),
                ));
            }
        }
        if self.pattern.is_empty() {
            return Err(AppError::invalid_rules(origin, "组卷模式不能为空"));
        }
        if let Some(entry) = self.pattern.iter().find(|e| e.count == 0) {
            return Err(AppError::invalid_rules(
                origin,
                format!("组卷模式 {} 的数量必须大于 0", entry.label),
            ));
        }
        Ok(())
    }

    fn lowercase_keywords(&mut self) {
        for rule in &mut self.sections {
            for keyword in rule.trigger.keywords_mut() {
                *keyword = keyword.to_lowercase();
            }
            for topic in &mut rule.topics {
                for keyword in topic.trigger.keywords_mut() {
                    *keyword = keyword.to_lowercase();
                }
            }
        }
    }

    /// 组卷模式中出现的区块标签（去重、保持顺序）
    pub fn pattern_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for entry in &self.pattern {
            if !labels.contains(&entry.label.as_str()) {
                labels.push(entry.label.as_str());
            }
        }
        labels
    }
}
