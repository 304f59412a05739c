//! 组卷引擎 - 编排层
//!
//! 两阶段生命周期：
//! - **加载阶段**：读取所有考试类型的题库和规则表，构建不可变快照（可能失败）
//! - **服务阶段**：所有查询只读快照，不做任何 I/O
//!
//! `reload` 构建新快照后整体替换，进行中的请求继续使用旧快照。

use crate::config::Config;
use crate::error::{AppResult, QueryError};
use crate::models::{load_group_database, ExamType, Group, MockTest, PracticeSet};
use crate::services::assembler::{self, PracticeRequest, ALL};
use crate::services::sampler::{filter_by_year, YearRange};
use crate::services::ExamProfile;
use crate::utils::logging::log_databases_loaded;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

/// 单个考试类型的题库
#[derive(Debug, Clone)]
pub struct ExamDatabase {
    pub profile: ExamProfile,
    pub groups: Vec<Group>,
}

impl ExamDatabase {
    pub fn question_count(&self) -> usize {
        self.groups.iter().map(|g| g.questions.len()).sum()
    }
}

/// 不可变的题库快照
#[derive(Debug)]
pub struct Snapshot {
    databases: HashMap<ExamType, ExamDatabase>,
    loaded_at: DateTime<Local>,
}

impl Snapshot {
    pub fn new(databases: HashMap<ExamType, ExamDatabase>) -> Self {
        Self {
            databases,
            loaded_at: Local::now(),
        }
    }

    /// 读取所有考试类型的题库，题库文件不存在视为空题库
    pub async fn load(config: &Config) -> AppResult<Self> {
        let mut databases = HashMap::with_capacity(ExamType::ALL.len());

        for exam in ExamType::ALL {
            let rules_path = config.rules_path(exam);
            let profile = ExamProfile::load(exam, rules_path.as_deref()).await?;

            let path = config.database_path(exam);
            let groups = match load_group_database(&path).await? {
                Some(groups) => valid_groups(exam, groups),
                None => {
                    warn!("⚠️ [{}] 题库文件不存在，视为空题库: {}", exam, path.display());
                    Vec::new()
                }
            };
            databases.insert(exam, ExamDatabase { profile, groups });
        }

        Ok(Self::new(databases))
    }

    pub fn database(&self, exam: ExamType) -> Option<&ExamDatabase> {
        self.databases.get(&exam)
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    /// 取出非空题库，否则返回 EmptyDatabase
    fn require(&self, exam: ExamType) -> Result<&ExamDatabase, QueryError> {
        self.databases
            .get(&exam)
            .filter(|db| !db.groups.is_empty())
            .ok_or(QueryError::EmptyDatabase { exam })
    }
}

/// 丢弃不满足题组约束的记录，只记录日志不中断加载
fn valid_groups(exam: ExamType, groups: Vec<Group>) -> Vec<Group> {
    let total = groups.len();
    let kept: Vec<Group> = groups
        .into_iter()
        .filter(|group| match group.invariant_violation() {
            Some(reason) => {
                warn!("⚠️ [{}] 丢弃题组 {}: {}", exam, group.group_id, reason);
                false
            }
            None => true,
        })
        .collect();
    if kept.len() < total {
        warn!("⚠️ [{}] 题库中 {} 个题组不合法，已丢弃", exam, total - kept.len());
    }
    kept
}

/// 单个考试类型的题库统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamStats {
    pub exam: ExamType,
    pub name: &'static str,
    pub rules_version: String,
    /// 组卷模式中的区块（按出卷顺序）
    pub sections: Vec<String>,
    pub groups: usize,
    pub sets: usize,
    pub questions: usize,
}

/// 引擎状态
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub status: &'static str,
    pub loaded_at: String,
    pub exams: Vec<ExamStats>,
}

/// 组卷引擎
pub struct ExamEngine {
    config: Config,
    snapshot: RwLock<Arc<Snapshot>>,
    /// 固定种子时共享一个随机数生成器，保证调用序列可复现
    seeded_rng: Option<Mutex<StdRng>>,
}

impl ExamEngine {
    /// 加载阶段：完成后才能开始服务
    pub async fn load(config: Config) -> AppResult<Self> {
        let snapshot = Snapshot::load(&config).await?;
        Ok(Self::with_snapshot(config, snapshot))
    }

    /// 使用已构建的快照
    pub fn with_snapshot(config: Config, snapshot: Snapshot) -> Self {
        log_databases_loaded(&Self::group_counts(&snapshot));
        let seeded_rng = config.rng_seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed)));
        Self {
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
            seeded_rng,
        }
    }

    /// 重新加载题库并整体替换快照
    pub async fn reload(&self) -> AppResult<()> {
        let fresh = Arc::new(Snapshot::load(&self.config).await?);
        log_databases_loaded(&Self::group_counts(&fresh));

        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
        info!("🔄 题库快照已替换");
        Ok(())
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 某考试类型（可限定区块）下的全部知识点，排序去重
    ///
    /// `section` 为 `ALL` 时不限区块，否则精确匹配
    pub fn list_topics(&self, exam: ExamType, section: &str) -> Vec<String> {
        let snapshot = self.snapshot();
        let Some(db) = snapshot.database(exam) else {
            return Vec::new();
        };

        db.groups
            .iter()
            .filter(|g| section == ALL || g.section == section)
            .flat_map(|g| g.questions.iter())
            .filter(|q| !q.topic.is_empty())
            .map(|q| q.topic.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 生成模拟考试
    pub fn generate_mock(&self, exam: ExamType, years: YearRange) -> Result<MockTest, QueryError> {
        let snapshot = self.snapshot();
        let db = snapshot.require(exam)?;

        let pool = filter_by_year(&db.groups, years);
        if pool.is_empty() {
            return Err(QueryError::EmptyPool { exam });
        }

        let mock = self.with_rng(|rng| assembler::assemble_mock(&db.profile, &pool, rng));
        // 候选题组都不在组卷模式的区块里
        if mock.sections.question_count() == 0 {
            return Err(QueryError::EmptyPool { exam });
        }
        info!(
            "📝 生成模拟考试 {}: {} 个区块 / {} 道题",
            mock.id,
            mock.sections.len(),
            mock.sections.question_count()
        );
        Ok(mock)
    }

    /// 生成专项练习
    pub fn generate_practice(
        &self,
        exam: ExamType,
        request: &PracticeRequest,
        years: YearRange,
    ) -> Result<PracticeSet, QueryError> {
        let snapshot = self.snapshot();
        let db = snapshot.require(exam)?;

        let pool: Vec<&Group> = filter_by_year(&db.groups, years)
            .into_iter()
            .filter(|g| request.accepts(g))
            .collect();
        if pool.is_empty() {
            return Err(QueryError::EmptyPool { exam });
        }

        let practice = self.with_rng(|rng| assembler::assemble_practice(exam, &pool, request, rng));
        info!("📝 生成专项练习 {}: {} 道题", practice.id, practice.questions.len());
        Ok(practice)
    }

    /// 各考试类型的题库规模
    pub fn stats(&self) -> EngineStats {
        let snapshot = self.snapshot();
        let exams = ExamType::ALL
            .iter()
            .filter_map(|&exam| snapshot.database(exam).map(|db| (exam, db)))
            .map(|(exam, db)| ExamStats {
                exam,
                name: exam.name(),
                rules_version: db.profile.version.clone(),
                sections: db.profile.pattern_labels().into_iter().map(str::to_string).collect(),
                groups: db.groups.len(),
                sets: db.groups.iter().filter(|g| g.is_set).count(),
                questions: db.question_count(),
            })
            .collect();

        EngineStats {
            status: "online",
            loaded_at: snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            exams,
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        match &self.seeded_rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
                f(&mut *guard)
            }
            None => f(&mut rand::thread_rng()),
        }
    }

    fn group_counts(snapshot: &Snapshot) -> Vec<(ExamType, usize)> {
        ExamType::ALL
            .iter()
            .map(|&exam| (exam, snapshot.database(exam).map_or(0, |db| db.groups.len())))
            .collect()
    }
}
