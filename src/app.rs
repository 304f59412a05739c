use crate::config::Config;
use crate::error::QueryError;
use crate::models::ExamType;
use crate::orchestrator::{BatchProcessor, ExamEngine};
use crate::services::assembler::{PracticeRequest, ALL};
use crate::services::YearRange;
use crate::utils::logging::log_startup;
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::error;

/// 模拟考试组卷引擎
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// 题库目录（覆盖 DATA_DIR）
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 原始数据目录（覆盖 RAW_DATA_DIR）
    #[arg(long, global = true)]
    pub raw_dir: Option<PathBuf>,

    /// 外部规则表目录（覆盖 EXAM_RULES_DIR）
    #[arg(long, global = true)]
    pub rules_dir: Option<PathBuf>,

    /// 固定随机种子（覆盖 RNG_SEED）
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 清洗、分类原始数据并写入题库
    Ingest {
        /// 只处理指定考试类型，默认全部
        #[arg(long, value_parser = parse_exam)]
        exam: Option<ExamType>,

        /// 原始记录自带的 section/topic 优先于规则分类
        #[arg(long)]
        keep_source_labels: bool,
    },
    /// 列出知识点
    Topics {
        #[arg(value_parser = parse_exam)]
        exam: ExamType,

        #[arg(long, default_value = ALL)]
        section: String,
    },
    /// 生成模拟考试
    Mock {
        #[arg(value_parser = parse_exam)]
        exam: ExamType,

        #[arg(long)]
        year_start: Option<u32>,

        #[arg(long)]
        year_end: Option<u32>,
    },
    /// 生成专项练习
    Practice {
        #[arg(value_parser = parse_exam)]
        exam: ExamType,

        /// `ALL` 或区块名的一部分
        #[arg(long, default_value = ALL)]
        section: String,

        #[arg(long, default_value_t = 10)]
        count: usize,

        #[arg(long)]
        topic: Option<String>,

        #[arg(long)]
        year_start: Option<u32>,

        #[arg(long)]
        year_end: Option<u32>,
    },
    /// 题库统计
    Stats,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Ingest { .. } => "ingest",
            Command::Topics { .. } => "topics",
            Command::Mock { .. } => "mock",
            Command::Practice { .. } => "practice",
            Command::Stats => "stats",
        }
    }
}

fn parse_exam(value: &str) -> Result<ExamType, QueryError> {
    value.parse()
}

impl Cli {
    /// 命令行参数覆盖环境变量配置
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(dir) = &self.rules_dir {
            config.rules_dir = Some(dir.clone());
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Command::Ingest {
            keep_source_labels: true,
            ..
        } = self.command
        {
            config.keep_source_labels = true;
        }
        config.verbose_logging |= self.verbose;
        config
    }
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 运行子命令，结果以 JSON 输出到 stdout
    pub async fn run(&self, command: Command) -> Result<()> {
        log_startup(command.name(), &self.config);

        match command {
            Command::Ingest { exam, .. } => {
                let processor = BatchProcessor::new(self.config.clone());
                let reports = match exam {
                    Some(exam) => vec![processor.ingest_exam(exam).await?],
                    None => processor.ingest_all(&ExamType::ALL).await?,
                };
                print_json(&reports)
            }
            Command::Topics { exam, section } => {
                let engine = ExamEngine::load(self.config.clone()).await?;
                let topics = engine.list_topics(exam, &section);
                print_json(&json!({ "topics": topics }))
            }
            Command::Mock {
                exam,
                year_start,
                year_end,
            } => {
                let engine = ExamEngine::load(self.config.clone()).await?;
                let years = YearRange::new(year_start, year_end);
                respond(engine.generate_mock(exam, years))
            }
            Command::Practice {
                exam,
                section,
                count,
                topic,
                year_start,
                year_end,
            } => {
                let engine = ExamEngine::load(self.config.clone()).await?;
                let request = PracticeRequest::new(section, count, topic);
                let years = YearRange::new(year_start, year_end);
                respond(engine.generate_practice(exam, &request, years))
            }
            Command::Stats => {
                let engine = ExamEngine::load(self.config.clone()).await?;
                print_json(&engine.stats())
            }
        }
    }
}

/// 查询结果：成功输出结果本身，失败输出 `{status, detail}` 并返回错误
fn respond<T: Serialize>(result: Result<T, QueryError>) -> Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => {
            error!("❌ {}", e);
            print_json(&json!({ "status": e.status_code(), "detail": e.to_string() }))?;
            Err(e.into())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "mock_exam_engine",
            "--data-dir",
            "/tmp/db",
            "--seed",
            "7",
            "ingest",
            "--exam",
            "cmat",
            "--keep-source-labels",
        ]);
        let config = cli.apply(Config::default());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/db"));
        assert_eq!(config.rng_seed, Some(7));
        assert!(config.keep_source_labels);
        assert!(matches!(
            cli.command,
            Command::Ingest {
                exam: Some(ExamType::Cmat),
                ..
            }
        ));
    }

    #[test]
    fn test_practice_defaults() {
        let cli = Cli::parse_from(["mock_exam_engine", "practice", "XAT"]);
        match cli.command {
            Command::Practice {
                exam,
                section,
                count,
                topic,
                ..
            } => {
                assert_eq!(exam, ExamType::Xat);
                assert_eq!(section, ALL);
                assert_eq!(count, 10);
                assert!(topic.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_exam_is_rejected() {
        assert!(Cli::try_parse_from(["mock_exam_engine", "mock", "GMAT"]).is_err());
    }

    #[test]
    fn test_initialize_validates_config() {
        let config = Config {
            max_concurrent_files: 0,
            ..Config::default()
        };
        assert!(App::initialize(config).is_err());
    }
}
