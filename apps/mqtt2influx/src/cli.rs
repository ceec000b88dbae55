use clap::Parser;

/// 命令行参数。
#[derive(Parser)]
#[command(name = "mqtt2influx")]
#[command(about = "MQTT client which saves received messages in an InfluxDB instance")]
pub struct Args {
    /// File containing configuration
    #[arg(long, default_value = "mqtt2influx.toml")]
    pub config: String,

    /// Log level
    #[arg(long, default_value = "INFO")]
    pub log: String,
}
