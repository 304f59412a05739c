//! # Mock Exam Engine
//!
//! 管理类入学考试（CAT / MAT / XAT / CMAT）的题库清洗与组卷引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 题目、题组、试卷结构，以及 JSON 题库文件的读写
//! - `ExamType` - 考试类型及其别名
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，全部是纯内存计算
//! - `text_normalizer` - 文本清洗（幂等）
//! - `group_resolver` - 按材料哈希归组
//! - `rules` / `classifier` - 有序规则表 + 通用匹配循环
//! - `sampler` / `assembler` - 按组卷模式抽样、生成试卷
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个原始文件"的完整入库流程
//! - `RecordCtx` - 上下文封装（文件 + 记录序号）
//! - `IngestFlow` - 解析 → 清洗 → 分类 → 归组
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量入库，管理并发
//! - `orchestrator/exam_engine` - 加载题库快照，提供查询
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, QueryError};
pub use models::{ExamType, Group, MockTest, PracticeSet, Question};
pub use orchestrator::{BatchProcessor, ExamEngine};
pub use services::{PracticeRequest, YearRange};
pub use workflow::{IngestFlow, IngestStats};
