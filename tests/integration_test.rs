use mock_exam_engine::models::load_group_database;
use mock_exam_engine::{
    logger, BatchProcessor, Config, ExamEngine, ExamType, PracticeRequest, QueryError, YearRange,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

fn config_in(dir: &Path, seed: u64) -> Config {
    Config {
        data_dir: dir.join("db"),
        raw_dir: dir.join("raw"),
        rng_seed: Some(seed),
        ..Config::default()
    }
}

fn write_raw(config: &Config, exam: ExamType, name: &str, value: Value) {
    let dir = config.raw_exam_dir(exam);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn passage(n: usize) -> String {
    format!(
        "Passage number {}: the committee debated the merits of the proposed transit plan \
         for several hours before adjourning without a vote.",
        n
    )
}

/// CAT 原始数据：5 篇阅读材料 + 若干独立题，全部带来源标签
async fn ingest_cat_fixture(config: &Config) {
    let mut records = Vec::new();
    for (set, size) in [2usize, 3, 4, 2, 3].into_iter().enumerate() {
        for i in 0..size {
            records.push(json!({
                "id": format!("rc{}-{}", set, i),
                "question_text": format!("According to passage {}, which statement {} holds?", set, i),
                "options": ["A", "B", "C", "D"],
                "correct_option": "A",
                "exam_year": 2022,
                "context_passage": passage(set),
                "section": "VARC",
                "topic": "Grammar"
            }));
        }
    }
    // 年份既有整数也有字符串
    let standalone = [
        ("qa1", "Arithmetic", json!(2021)),
        ("qa2", "Algebra", json!(2022)),
        ("qa3", "Arithmetic", json!("2023")),
    ];
    for (id, topic, year) in standalone {
        records.push(json!({
            "id": id,
            "question_text": format!("Quantitative question {}", id),
            "options": "1, 2, 3, 4",
            "exam_year": year,
            "section": "QA",
            "topic": topic
        }));
    }
    write_raw(config, ExamType::Cat, "cat_2022.json", Value::Array(records));

    let config = Config {
        keep_source_labels: true,
        ..config.clone()
    };
    BatchProcessor::new(config).ingest_exam(ExamType::Cat).await.unwrap();
}

#[tokio::test]
async fn test_list_topics_over_fixture_database() {
    logger::init(false);
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 1);
    ingest_cat_fixture(&config).await;

    let engine = ExamEngine::load(config).await.unwrap();
    assert_eq!(engine.list_topics(ExamType::Cat, "QA"), vec!["Algebra", "Arithmetic"]);
    assert_eq!(engine.list_topics(ExamType::Cat, "VARC"), vec!["Grammar"]);
}

#[tokio::test]
async fn test_cat_mock_draws_exactly_four_whole_sets() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 42);
    ingest_cat_fixture(&config).await;

    let groups = load_group_database(&config.database_path(ExamType::Cat))
        .await
        .unwrap()
        .unwrap();
    let set_sizes: HashMap<String, usize> = groups
        .iter()
        .filter(|g| g.is_set)
        .map(|g| (g.passage_text.clone().unwrap(), g.questions.len()))
        .collect();
    assert_eq!(set_sizes.len(), 5);

    let engine = ExamEngine::load(config).await.unwrap();
    for _ in 0..10 {
        let mock = engine.generate_mock(ExamType::Cat, YearRange::ALL).unwrap();
        let varc = mock.sections.get("VARC").unwrap();

        let mut per_passage: HashMap<&str, usize> = HashMap::new();
        for q in varc {
            *per_passage.entry(q.context_passage.as_deref().unwrap()).or_default() += 1;
        }
        assert_eq!(per_passage.len(), 4);
        for (text, count) in &per_passage {
            assert_eq!(set_sizes[*text], *count, "set must be included whole");
        }
        let expected: usize = per_passage.keys().map(|text| set_sizes[*text]).sum();
        assert_eq!(varc.len(), expected);

        assert_eq!(mock.sections.get("QA").unwrap().len(), 3);
        assert!(mock.sections.get("DILR").is_none());
    }
}

#[tokio::test]
async fn test_mock_does_not_mutate_database() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 3);
    ingest_cat_fixture(&config).await;

    let engine = ExamEngine::load(config).await.unwrap();
    let before = engine.snapshot();
    let mock = engine.generate_mock(ExamType::Cat, YearRange::ALL).unwrap();
    assert!(mock.sections.get("VARC").unwrap().iter().all(|q| q.context_passage.is_some()));

    let after = engine.snapshot();
    let db = after.database(ExamType::Cat).unwrap();
    assert!(db
        .groups
        .iter()
        .flat_map(|g| &g.questions)
        .all(|q| q.context_passage.is_none()));
    assert_eq!(
        before.database(ExamType::Cat).unwrap().groups,
        db.groups
    );
}

#[tokio::test]
async fn test_mat_pipeline_classifies_and_serves() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 9);
    write_raw(
        &config,
        ExamType::Mat,
        "mat_2019.json",
        json!({
            "question_bank": [
                {"id": "m1", "question_text": "Two pipes can fill a tank in 4 and 6 hours. How long together?", "options": ["2.4 hours", "5 hours"], "exam_year": "2019"},
                {"id": "m2", "question_text": "<p>Choose the grammatically incorrect sentence.</p>", "options": "A\nB\nC\nD", "exam_year": 2019},
                {"id": "m3", "question_text": "Who was awarded the Ramon Magsaysay prize this year?", "options": ["X", "Y"], "exam_year": 2019},
                {"id": "m4", "question_text": "ok"}
            ],
            "answer_keys": [
                {"question_id": "m1", "correct_option": "2.4 hours"},
                {"question_id": "m2", "correct_option": "C"}
            ]
        }),
    );

    let reports = BatchProcessor::new(config.clone())
        .ingest_all(&[ExamType::Mat])
        .await
        .unwrap();
    assert_eq!(reports[0].stats.questions, 3);
    assert_eq!(reports[0].stats.too_short, 1);

    let engine = ExamEngine::load(config).await.unwrap();
    assert_eq!(engine.list_topics(ExamType::Mat, "Mathematical Skills"), vec!["Time & Work"]);

    let mock = engine.generate_mock(ExamType::Mat, YearRange::new(Some(2019), Some(2019))).unwrap();
    assert!(mock.id.starts_with("MAT_MOCK_"));
    assert_eq!(
        mock.sections.labels().collect::<Vec<_>>(),
        vec!["Language Comprehension", "Mathematical Skills", "Indian & Global Environment"]
    );
    let maths = &mock.sections.get("Mathematical Skills").unwrap()[0];
    assert_eq!(maths.correct_option.as_deref(), Some("2.4 hours"));
    assert_eq!(
        mock.sections.get("Language Comprehension").unwrap()[0].question_text,
        "Choose the grammatically incorrect sentence."
    );

    let json = serde_json::to_value(&mock).unwrap();
    assert!(json["sections"]["Mathematical Skills"].is_array());
}

#[tokio::test]
async fn test_query_failures_are_distinct() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 5);
    ingest_cat_fixture(&config).await;

    let engine = ExamEngine::load(config).await.unwrap();

    let missing = engine.generate_mock(ExamType::Xat, YearRange::ALL).unwrap_err();
    assert_eq!(missing, QueryError::EmptyDatabase { exam: ExamType::Xat });
    assert_eq!(missing.status_code(), 503);

    let filtered = engine
        .generate_mock(ExamType::Cat, YearRange::new(Some(2030), None))
        .unwrap_err();
    assert_eq!(filtered, QueryError::EmptyPool { exam: ExamType::Cat });
    assert_eq!(filtered.status_code(), 404);
}

#[tokio::test]
async fn test_practice_walks_groups_until_count() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 11);
    ingest_cat_fixture(&config).await;

    let engine = ExamEngine::load(config).await.unwrap();

    let request = PracticeRequest::new("VARC", 5, None);
    let practice = engine.generate_practice(ExamType::Cat, &request, YearRange::ALL).unwrap();
    assert!(practice.id.starts_with("PRAC_CAT_"));
    assert_eq!(practice.questions.len(), 5);
    assert!(practice.questions.iter().all(|q| q.section == "VARC" && q.context_passage.is_some()));

    let request = PracticeRequest::new("ALL", 10, Some("Arithmetic".into()));
    let practice = engine
        .generate_practice(ExamType::Cat, &request, YearRange::new(Some(2021), Some(2023)))
        .unwrap();
    let mut ids: Vec<&str> = practice.questions.iter().map(|q| q.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["qa1", "qa3"]);
}
