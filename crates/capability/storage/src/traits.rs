//! 存储接口 Trait 定义
//!
//! 设计原则：
//! - 接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use async_trait::async_trait;
use domain::DataPoint;

/// 数据点写入接口
///
/// 每条入站报文对应一次写入调用，不跨报文攒批。
#[async_trait]
pub trait PointWriter: Send + Sync {
    async fn write_points(&self, points: &[DataPoint]) -> Result<(), StorageError>;
}
