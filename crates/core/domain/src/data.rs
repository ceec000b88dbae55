use chrono::DateTime;
use chrono_tz::Tz;

/// 代理投递的原始报文。
///
/// 生命周期仅覆盖一次处理器调用：接收 → 转换 → 写入。
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// 数据点字段值的数据类型。
///
/// `value` 字段数值强转成功时为 F64，失败时保留原始标量。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    F64(f64),
    Bool(bool),
    String(String),
}

/// 写入时序数据库的单个数据点。
///
/// 不变量：measurement 恒等于报文到达的主题，不存在重映射表。
/// 每个数据点由恰好一条原始报文构造，且只交给存储客户端一次。
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub measurement: String,
    pub time: DateTime<Tz>,
    pub value: FieldValue,
}
