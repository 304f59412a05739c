//! 批量入库处理器 - 编排层
//!
//! ## 职责
//!
//! 把 `<raw_dir>/<exam>/*.json` 下的全部原始文件处理成一个题库文件。
//!
//! ## 核心功能
//!
//! 1. **加载规则表**：内置规则表或 `EXAM_RULES_DIR` 下的外部规则表
//! 2. **并发控制**：使用 Semaphore 限制同时处理的文件数量
//! 3. **分批处理**：将文件分批次处理，每批完成后再开始下一批
//! 4. **容错**：单个文件读取或解析失败只记录错误，不中断整批
//! 5. **写入题库**：按文件顺序合并题组，写入 `<data_dir>/<exam>_db.json`
//!
//! ## 设计特点
//!
//! - **向下委托**：单个文件的处理交给 `workflow::IngestFlow`
//! - **结果有序**：并发处理，但按文件名顺序合并，保证题库内容稳定

use crate::config::Config;
use crate::error::{AppError, AppResult, FileError};
use crate::models::{list_raw_files, load_raw_batch, save_group_database, ExamType, Group};
use crate::services::ExamProfile;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_files_found, print_ingest_stats,
};
use crate::workflow::{FileOutcome, IngestFlow, IngestStats, RecordCtx};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 单个考试类型的入库报告
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub exam: ExamType,
    pub rules_version: String,
    pub database_path: PathBuf,
    pub stats: IngestStats,
}

/// 批量入库处理器
pub struct BatchProcessor {
    config: Config,
}

impl BatchProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 依次处理多个考试类型
    ///
    /// 原始数据目录不存在的考试类型会被跳过（不写题库文件）
    pub async fn ingest_all(&self, exams: &[ExamType]) -> AppResult<Vec<IngestReport>> {
        let mut reports = Vec::with_capacity(exams.len());
        for &exam in exams {
            match self.ingest_exam(exam).await {
                Ok(report) => reports.push(report),
                Err(AppError::File(FileError::DirectoryNotFound { path })) => {
                    warn!("⚠️ [{}] 原始数据目录不存在，跳过: {}", exam, path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(reports)
    }

    /// 处理一个考试类型的全部原始文件并写入题库
    pub async fn ingest_exam(&self, exam: ExamType) -> AppResult<IngestReport> {
        let rules_path = self.config.rules_path(exam);
        let profile = ExamProfile::load(exam, rules_path.as_deref()).await?;
        let rules_version = profile.version.clone();

        info!("📁 [{}] 正在扫描原始数据...", exam);
        let files = list_raw_files(&self.config.raw_exam_dir(exam)).await?;
        if files.is_empty() {
            warn!("⚠️ [{}] 没有找到原始数据文件，题库将为空", exam);
        } else {
            log_files_found(exam, files.len(), self.config.max_concurrent_files);
        }

        let flow = Arc::new(IngestFlow::new(&self.config, profile));
        let (groups, stats) = self.process_files(flow, exam, files).await?;

        let database_path = self.config.database_path(exam);
        save_group_database(&database_path, &groups).await?;
        print_ingest_stats(exam, &stats, &database_path.display().to_string());

        Ok(IngestReport {
            exam,
            rules_version,
            database_path,
            stats,
        })
    }

    /// 分批并发处理文件，按文件顺序合并结果
    async fn process_files(
        &self,
        flow: Arc<IngestFlow>,
        exam: ExamType,
        files: Vec<PathBuf>,
    ) -> AppResult<(Vec<Group>, IngestStats)> {
        let batch_size = self.config.max_concurrent_files.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_files = files.len();
        let total_batches = total_files.div_ceil(batch_size);

        let mut groups = Vec::new();
        let mut stats = IngestStats::default();

        for (batch_idx, batch) in files.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total_files,
            );

            let mut handles = Vec::with_capacity(batch.len());
            for (offset, path) in batch.iter().enumerate() {
                let file_index = batch_start + offset + 1;
                let permit = semaphore.clone().acquire_owned().await.map_err(|e| {
                    AppError::file_read_failed(path.display().to_string(), e)
                })?;

                let flow = flow.clone();
                let path = path.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    let ctx = RecordCtx::new(file_name, file_index, exam);

                    match load_raw_batch(&path).await {
                        Ok(raw) => Some(flow.run(raw, &ctx)),
                        Err(e) => {
                            error!("{} ❌ 文件处理失败: {}", ctx, e);
                            None
                        }
                    }
                });
                handles.push((file_index, handle));
            }

            // 等待本批所有任务完成
            let (indices, handles): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
            let mut success = 0;
            for (file_index, joined) in indices.into_iter().zip(join_all(handles).await) {
                match joined {
                    Ok(Some(FileOutcome {
                        groups: file_groups,
                        stats: file_stats,
                    })) => {
                        success += 1;
                        stats.merge(&file_stats);
                        groups.extend(file_groups);
                    }
                    Ok(None) => stats.files_failed += 1,
                    Err(e) => {
                        error!("[{} 文件#{}] 任务执行失败: {}", exam, file_index, e);
                        stats.files_failed += 1;
                    }
                }
            }

            log_batch_complete(batch_idx + 1, success, batch.len());
        }

        Ok((groups, stats))
    }
}
