//! 结果组装服务 - 业务能力层
//!
//! 生成试卷 ID，并把抽样结果包装成模拟考试或专项练习

use crate::models::{ExamType, Group, MockTest, PracticeSet, Question};
use crate::services::rules::ExamProfile;
use crate::services::sampler::ExamPatternSampler;
use rand::seq::SliceRandom;
use rand::Rng;

/// 练习模式下表示“不限”的取值
pub const ALL: &str = "ALL";

/// 模拟考试 ID：`<EXAM>_MOCK_<3 位随机数>`
pub fn mock_id<R: Rng + ?Sized>(exam: ExamType, rng: &mut R) -> String {
    format!("{}_MOCK_{}", exam.code(), rng.gen_range(100..=999))
}

/// 专项练习 ID：`PRAC_<EXAM>_<4 位随机数>`
pub fn practice_id<R: Rng + ?Sized>(exam: ExamType, rng: &mut R) -> String {
    format!("PRAC_{}_{}", exam.code(), rng.gen_range(1000..=9999))
}

/// 按考试的组卷模式生成模拟考试
pub fn assemble_mock<R: Rng + ?Sized>(
    profile: &ExamProfile,
    pool: &[&Group],
    rng: &mut R,
) -> MockTest {
    let sections = ExamPatternSampler::new(&profile.pattern).assemble(pool, rng);
    MockTest {
        id: mock_id(profile.exam, rng),
        exam_type: profile.exam,
        sections,
    }
}

/// 练习请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeRequest {
    /// `ALL` 或区块名的一部分
    pub section: String,
    pub count: usize,
    /// `None` 或 `ALL` 表示不限知识点
    pub topic: Option<String>,
}

impl PracticeRequest {
    pub fn new(section: impl Into<String>, count: usize, topic: Option<String>) -> Self {
        Self {
            section: section.into(),
            count,
            topic,
        }
    }

    /// 实际生效的知识点过滤条件
    pub fn topic_filter(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty() && *t != ALL)
    }

    /// 题组是否符合区块和知识点条件
    pub fn accepts(&self, group: &Group) -> bool {
        let section_ok = self.section == ALL || group.section.contains(self.section.as_str());
        let topic_ok = self.topic_filter().map_or(true, |topic| group.has_topic(topic));
        section_ok && topic_ok
    }
}

impl Default for PracticeRequest {
    fn default() -> Self {
        Self::new(ALL, 10, None)
    }
}

/// 专项练习：打乱题组顺序后逐组取题，直到凑够数量
///
/// 最后一个题组可能只取一部分；指定知识点时只取该知识点的题目
pub fn collect_practice_questions<R: Rng + ?Sized>(
    pool: &[&Group],
    request: &PracticeRequest,
    rng: &mut R,
) -> Vec<Question> {
    let mut shuffled: Vec<&Group> = pool.iter().copied().filter(|g| request.accepts(g)).collect();
    shuffled.shuffle(rng);

    let topic = request.topic_filter();
    let mut questions = Vec::with_capacity(request.count);

    for group in shuffled {
        if questions.len() >= request.count {
            break;
        }
        let remaining = request.count - questions.len();
        questions.extend(
            group
                .detached_questions()
                .filter(|q| topic.map_or(true, |t| q.topic == t))
                .take(remaining),
        );
    }

    questions
}

/// 生成专项练习
pub fn assemble_practice<R: Rng + ?Sized>(
    exam: ExamType,
    pool: &[&Group],
    request: &PracticeRequest,
    rng: &mut R,
) -> PracticeSet {
    let questions = collect_practice_questions(pool, request, rng);
    PracticeSet {
        id: practice_id(exam, rng),
        exam_type: exam,
        mode: "practice",
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn group(id: &str, section: &str, topics: &[&str], is_set: bool) -> Group {
        Group {
            group_id: id.to_string(),
            is_set,
            section: section.to_string(),
            passage_text: is_set.then(|| "Shared passage text".to_string()),
            questions: topics
                .iter()
                .enumerate()
                .map(|(i, topic)| Question {
                    id: format!("{}-{}", id, i),
                    exam_type: ExamType::Xat,
                    exam_year: 2022,
                    section: section.to_string(),
                    topic: topic.to_string(),
                    question_text: format!("Question {}", i),
                    options: vec![],
                    correct_option: None,
                    image_url: None,
                    context_passage: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_ids_follow_format() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let id = mock_id(ExamType::Cat, &mut rng);
            let suffix: u32 = id.strip_prefix("CAT_MOCK_").unwrap().parse().unwrap();
            assert!((100..=999).contains(&suffix));

            let id = practice_id(ExamType::Cmat, &mut rng);
            let suffix: u32 = id.strip_prefix("PRAC_CMAT_").unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }

    #[test]
    fn test_practice_stops_at_count_and_may_split_group() {
        let groups = vec![
            group("a", "Decision Making (BDM)", &["Ethics", "Ethics", "Ethics"], true),
            group("b", "Decision Making (BDM)", &["Ethics", "Ethics", "Ethics"], true),
        ];
        let pool: Vec<&Group> = groups.iter().collect();
        let request = PracticeRequest::new("BDM", 4, None);

        let mut rng = StdRng::seed_from_u64(8);
        let questions = collect_practice_questions(&pool, &request, &mut rng);
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.context_passage.is_some()));
    }

    #[test]
    fn test_practice_section_is_substring_match() {
        let groups = vec![
            group("v", "Verbal & Logical Ability (VALR)", &["RC"], false),
            group("q", "Quantitative Ability & Data Interpretation (QADI)", &["Algebra"], false),
        ];
        let pool: Vec<&Group> = groups.iter().collect();

        let mut rng = StdRng::seed_from_u64(2);
        let only_valr = collect_practice_questions(&pool, &PracticeRequest::new("VALR", 10, None), &mut rng);
        assert_eq!(only_valr.len(), 1);
        assert_eq!(only_valr[0].id, "v-0");

        let all = collect_practice_questions(&pool, &PracticeRequest::new(ALL, 10, None), &mut rng);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_practice_topic_filters_questions_inside_groups() {
        let groups = vec![
            group("mixed", "QADI", &["Algebra", "Geometry", "Algebra"], true),
            group("geo", "QADI", &["Geometry"], false),
        ];
        let pool: Vec<&Group> = groups.iter().collect();
        let request = PracticeRequest::new(ALL, 10, Some("Algebra".into()));

        let mut rng = StdRng::seed_from_u64(4);
        let questions = collect_practice_questions(&pool, &request, &mut rng);
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.topic == "Algebra"));

        let unfiltered = PracticeRequest::new(ALL, 10, Some(ALL.into()));
        assert_eq!(unfiltered.topic_filter(), None);
        assert_eq!(collect_practice_questions(&pool, &unfiltered, &mut rng).len(), 4);
    }

    #[test]
    fn test_practice_set_shape() {
        let groups = vec![group("g", "QADI", &["Algebra"], false)];
        let pool: Vec<&Group> = groups.iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        let set = assemble_practice(ExamType::Xat, &pool, &PracticeRequest::default(), &mut rng);

        assert!(set.id.starts_with("PRAC_XAT_"));
        assert_eq!(set.mode, "practice");
        assert_eq!(set.questions.len(), 1);
    }

    #[test]
    fn test_mock_uses_profile_pattern() {
        let profile = ExamProfile::builtin(ExamType::Xat).unwrap();
        let groups = vec![
            group("b", "Decision Making (BDM)", &["Ethics"], false),
            group("g", "General Knowledge (GK)", &["Awards"], false),
        ];
        let pool: Vec<&Group> = groups.iter().collect();

        let mut rng = StdRng::seed_from_u64(6);
        let mock = assemble_mock(&profile, &pool, &mut rng);
        assert!(mock.id.starts_with("XAT_MOCK_"));
        // GK 不在 XAT 组卷模式中，VALR/QADI 没有题组
        assert_eq!(mock.sections.labels().collect::<Vec<_>>(), vec!["BDM"]);
    }
}
