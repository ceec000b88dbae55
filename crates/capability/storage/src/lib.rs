//! # mqtt2influx Storage 模块
//!
//! 本模块提供桥接进程的时序存储访问层。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：数据点写入的异步 Trait 接口
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **编码层** (`line.rs`)：数据点 → InfluxDB Line Protocol
//! 4. **实现层** (`influx.rs`)：基于 HTTP 的 InfluxDB v1 客户端
//!
//! ## 设计约束
//!
//! - 每条入站报文恰好对应一次写入调用，不做跨报文批量
//! - 写入失败不重试、不落盘，由调用方记录日志后继续
//! - 库存在性检查只在启动期执行一次（SHOW DATABASES / CREATE DATABASE）

// 模块导出：将子模块的内容导出到 crate 根目录
pub mod error;
pub mod influx;
pub mod line;
pub mod traits;

// 导出常用类型到 crate 根目录，方便外部引用
pub use error::StorageError;
pub use influx::InfluxClient;
pub use line::encode_point;
pub use traits::PointWriter;
