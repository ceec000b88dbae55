//! mqtt2influx 桥接进程入口：参数解析、配置加载、启动期连接、接收循环。

mod bridge;
mod cli;

use clap::Parser;
use mqtt2influx_config::BridgeConfig;
use mqtt2influx_telemetry::init_tracing;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    // 初始化结构化日志（级别来自 --log）
    init_tracing(&args.log);

    // 从分节配置文件加载运行配置（仅启动时一次）
    let config = match BridgeConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    // 两个外部连接任一失败即退出：不重试、无部分启动
    let bridge = match bridge::Bridge::initialize(&config).await {
        Ok(bridge) => bridge,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    info!("started mqtt2influx client");
    bridge.run().await;
}
