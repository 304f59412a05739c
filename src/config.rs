use crate::error::{AppResult, ConfigError};
use crate::models::ExamType;
use std::path::PathBuf;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 题库文件目录（`<data_dir>/<exam>_db.json`）
    pub data_dir: PathBuf,
    /// 原始数据目录（`<raw_dir>/<exam>/*.json`）
    pub raw_dir: PathBuf,
    /// 外部规则表目录，未设置时使用内置规则表
    pub rules_dir: Option<PathBuf>,
    /// 同时处理的原始文件数量
    pub max_concurrent_files: usize,
    /// 材料长度超过该值才按材料分组
    pub passage_min_len: usize,
    /// 题干最短长度，低于该值的记录被跳过
    pub min_question_len: usize,
    /// 固定随机种子（用于可复现的测试），未设置时使用全局随机数
    pub rng_seed: Option<u64>,
    /// 原始记录自带的 section/topic 优先于规则分类
    pub keep_source_labels: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            raw_dir: PathBuf::from("data/raw"),
            rules_dir: None,
            max_concurrent_files: 8,
            passage_min_len: 50,
            min_question_len: 5,
            rng_seed: None,
            keep_source_labels: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            raw_dir: std::env::var("RAW_DATA_DIR").map(PathBuf::from).unwrap_or(default.raw_dir),
            rules_dir: std::env::var("EXAM_RULES_DIR").ok().map(PathBuf::from).or(default.rules_dir),
            max_concurrent_files: std::env::var("MAX_CONCURRENT_FILES").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_files),
            passage_min_len: std::env::var("PASSAGE_MIN_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.passage_min_len),
            min_question_len: std::env::var("MIN_QUESTION_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_question_len),
            rng_seed: std::env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()).or(default.rng_seed),
            keep_source_labels: std::env::var("KEEP_SOURCE_LABELS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.keep_source_labels),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 校验配置，手动构造的配置也要经过这里
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_files == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_concurrent_files".to_string(),
                value: "0".to_string(),
                reason: "并发数必须大于 0".to_string(),
            }
            .into());
        }
        if self.raw_dir == self.data_dir {
            return Err(ConfigError::InvalidValue {
                name: "raw_dir".to_string(),
                value: self.raw_dir.display().to_string(),
                reason: "原始数据目录不能与题库目录相同".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 某考试类型的题库文件路径
    pub fn database_path(&self, exam: ExamType) -> PathBuf {
        self.data_dir.join(format!("{}_db.json", exam.file_stem()))
    }

    /// 某考试类型的原始数据目录
    pub fn raw_exam_dir(&self, exam: ExamType) -> PathBuf {
        self.raw_dir.join(exam.file_stem())
    }

    /// 某考试类型的外部规则表路径
    pub fn rules_path(&self, exam: ExamType) -> Option<PathBuf> {
        self.rules_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.toml", exam.file_stem())))
    }
}
