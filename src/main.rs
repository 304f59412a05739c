use anyhow::Result;
use clap::Parser;
use mock_exam_engine::app::{App, Cli};
use mock_exam_engine::{logger, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（命令行参数优先于环境变量）
    let config = cli.apply(Config::from_env());

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)?.run(cli.command).await
}
