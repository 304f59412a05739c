//! 规则分类服务 - 业务能力层
//!
//! 按规则表的顺序匹配：第一个命中的区块规则决定 section，
//! 再在该区块内按顺序匹配知识点规则，都不命中时使用默认值

use crate::models::ExamType;
use crate::services::rules::{ExamProfile, Scope, SectionRule};
use serde::Serialize;

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub section: String,
    pub topic: String,
    /// 是否由区块规则命中（false 表示使用了兜底区块）
    #[serde(skip)]
    pub matched: bool,
}

/// 基于有序规则表的分类器
#[derive(Debug, Clone)]
pub struct RuleBasedClassifier {
    profile: ExamProfile,
}

impl RuleBasedClassifier {
    pub fn new(profile: ExamProfile) -> Self {
        Self { profile }
    }

    /// 使用内置规则表
    pub fn builtin(exam: ExamType) -> crate::error::AppResult<Self> {
        Ok(Self::new(ExamProfile::builtin(exam)?))
    }

    pub fn profile(&self) -> &ExamProfile {
        &self.profile
    }

    /// 对题干和选项分类，任何输入都会返回非空的 section/topic
    pub fn classify<S: AsRef<str>>(&self, question_text: &str, options: &[S]) -> Classification {
        let question = question_text.to_lowercase();
        let mut combined = question.clone();
        for option in options {
            combined.push(' ');
            combined.push_str(&option.as_ref().to_lowercase());
        }

        match self.match_section(&question, &combined) {
            Some(rule) => Classification {
                section: rule.label.clone(),
                topic: Self::match_topic(rule, &question, &combined),
                matched: true,
            },
            None => Classification {
                section: self.profile.fallback_section.clone(),
                topic: self.profile.fallback_topic.clone(),
                matched: false,
            },
        }
    }

    /// 题干本身无法判断时，把材料拼到题干后再分类一次
    ///
    /// 材料题的单个小问往往不含区块特征（如 "How many teams qualified?"）
    pub fn classify_with_context<S: AsRef<str>>(
        &self,
        question_text: &str,
        options: &[S],
        context: Option<&str>,
    ) -> Classification {
        let first = self.classify(question_text, options);
        match context {
            Some(context) if !first.matched && !context.trim().is_empty() => {
                self.classify(&format!("{} {}", question_text, context), options)
            }
            _ => first,
        }
    }

    /// 命中的区块规则序号（用于排查规则表）
    pub fn explain<S: AsRef<str>>(&self, question_text: &str, options: &[S]) -> Option<(usize, &str)> {
        let question = question_text.to_lowercase();
        let combined = std::iter::once(question.clone())
            .chain(options.iter().map(|o| o.as_ref().to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ");

        self.profile
            .sections
            .iter()
            .position(|rule| rule.trigger.fires(&question, &combined, Scope::Combined))
            .map(|idx| (idx, self.profile.sections[idx].label.as_str()))
    }

    fn match_section(&self, question: &str, combined: &str) -> Option<&SectionRule> {
        self.profile
            .sections
            .iter()
            .find(|rule| rule.trigger.fires(question, combined, Scope::Combined))
    }

    fn match_topic(rule: &SectionRule, question: &str, combined: &str) -> String {
        rule.topics
            .iter()
            .find(|topic| topic.trigger.fires(question, combined, Scope::Question))
            .map(|topic| topic.label.clone())
            .unwrap_or_else(|| rule.default_topic.clone())
    }
}
