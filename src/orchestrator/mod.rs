//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和查询调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量入库处理器
//! - 扫描原始数据目录（Vec<PathBuf>）
//! - 控制并发数量（Semaphore）
//! - 委托 `IngestFlow` 处理单个文件
//! - 合并题组并写入题库文件
//! - 输出入库统计信息
//!
//! ### `exam_engine` - 组卷引擎
//! - 加载阶段：读取题库和规则表，构建不可变快照
//! - 服务阶段：知识点列表、模拟考试、专项练习、统计
//! - 重新加载：整体替换快照
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文件>)          exam_engine (处理查询)
//!     ↓                                         ↓
//! workflow::IngestFlow (处理单个文件)        services::assembler / sampler
//!     ↓
//! services (能力层：normalizer / resolver / classifier)
//! ```

pub mod batch_processor;
pub mod exam_engine;

// 重新导出主要类型
pub use batch_processor::{BatchProcessor, IngestReport};
pub use exam_engine::{EngineStats, ExamDatabase, ExamEngine, ExamStats, Snapshot};
