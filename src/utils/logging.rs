/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::ExamType;
use crate::workflow::IngestStats;
use tracing::info;

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 记录程序启动信息
///
/// # 参数
/// - `command`: 当前执行的子命令
/// - `config`: 程序配置
pub fn log_startup(command: &str, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} ({})", command, now());
    info!("📁 题库目录: {}", config.data_dir.display());
    info!("📁 原始数据目录: {}", config.raw_dir.display());
    match &config.rules_dir {
        Some(dir) => info!("📐 外部规则表目录: {}", dir.display()),
        None => info!("📐 使用内置规则表"),
    }
    if let Some(seed) = config.rng_seed {
        info!("🎲 固定随机种子: {}", seed);
    }
    info!("{}", "=".repeat(60));
}

/// 记录原始文件扫描结果
pub fn log_files_found(exam: ExamType, total: usize, max_concurrent: usize) {
    info!("✓ [{}] 找到 {} 个原始数据文件", exam, total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始文件编号
/// - `end`: 结束文件编号
/// - `total`: 文件总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批文件: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印单个考试类型的入库统计
pub fn print_ingest_stats(exam: ExamType, stats: &IngestStats, db_path: &str) {
    info!("{}", "=".repeat(60));
    info!("📊 [{}] 入库完成统计", exam);
    info!("完成时间: {}", now());
    info!("{}", "=".repeat(60));
    info!(
        "✅ 文件: 成功 {} / 失败 {}",
        stats.files_ok, stats.files_failed
    );
    info!(
        "📝 记录: 读取 {} / 跳过 {} (格式错误 {}, 题干过短 {}, ID 重复 {})",
        stats.records_read,
        stats.skipped(),
        stats.malformed,
        stats.too_short,
        stats.duplicates
    );
    info!("📚 题组 {} / 题目 {}", stats.groups, stats.questions);
    info!("{}", "=".repeat(60));
    info!("题库已保存至: {}", db_path);
}

/// 记录题库加载结果，如 `CAT(120), MAT(0), ...`
pub fn log_databases_loaded(counts: &[(ExamType, usize)]) {
    let summary = counts
        .iter()
        .map(|(exam, groups)| format!("{}({})", exam, groups))
        .collect::<Vec<_>>()
        .join(", ");
    info!("📚 题库加载完成: {}", summary);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
