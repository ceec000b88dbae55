//! 原始报文 → 数据点的纯转换（无 I/O、无共享状态）。

use chrono::DateTime;
use chrono_tz::Tz;
use domain::{DataPoint, FieldValue};

/// 数据点时间戳的固定时区。
pub const MEASUREMENT_TZ: Tz = chrono_tz::Europe::Berlin;

/// 转换错误。
///
/// 调用方统一按可恢复处理：记录日志后继续接收循环。
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("invalid json payload: {0}")]
    Json(String),
    #[error("payload is not a json object")]
    NotAnObject,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

/// 解码报文并构造单个数据点。
///
/// - `timestamp`：必需，强转为 epoch 秒并本地化到固定时区；
/// - `value`：必需，优先强转为 64 位浮点，失败时保留原始标量；
/// - measurement 恒等于入站主题。
///
/// 输出为单元素序列；同一输入两次调用产出完全相同的数据点。
pub fn transform(topic: &str, payload: &[u8]) -> Result<Vec<DataPoint>, TransformError> {
    let json: serde_json::Value =
        serde_json::from_slice(payload).map_err(|err| TransformError::Json(err.to_string()))?;
    let object = json.as_object().ok_or(TransformError::NotAnObject)?;

    let timestamp = object
        .get("timestamp")
        .ok_or(TransformError::MissingField("timestamp"))?;
    let seconds = coerce_epoch_seconds(timestamp)?;
    let time = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TransformError::InvalidTimestamp(seconds.to_string()))?
        .with_timezone(&MEASUREMENT_TZ);

    let value = object
        .get("value")
        .ok_or(TransformError::MissingField("value"))?;
    let value = coerce_field_value(value)?;

    Ok(vec![DataPoint {
        measurement: topic.to_string(),
        time,
        value,
    }])
}

/// `timestamp` 强转：整数、浮点（截断）或数字字符串。
fn coerce_epoch_seconds(value: &serde_json::Value) -> Result<i64, TransformError> {
    match value {
        serde_json::Value::Number(number) => {
            if let Some(seconds) = number.as_i64() {
                Ok(seconds)
            } else if let Some(seconds) = number.as_f64() {
                Ok(seconds as i64)
            } else {
                Err(TransformError::InvalidTimestamp(number.to_string()))
            }
        }
        serde_json::Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| TransformError::InvalidTimestamp(text.clone())),
        other => Err(TransformError::InvalidTimestamp(other.to_string())),
    }
}

/// `value` 强转：数值与可解析字符串归为 F64，其余标量原样保留。
fn coerce_field_value(value: &serde_json::Value) -> Result<FieldValue, TransformError> {
    match value {
        serde_json::Value::Number(number) => match number.as_f64() {
            Some(v) => Ok(FieldValue::F64(v)),
            None => Ok(FieldValue::String(number.to_string())),
        },
        serde_json::Value::String(text) => match text.trim().parse::<f64>() {
            Ok(v) => Ok(FieldValue::F64(v)),
            Err(_) => Ok(FieldValue::String(text.clone())),
        },
        serde_json::Value::Bool(flag) => Ok(FieldValue::Bool(*flag)),
        other => Err(TransformError::UnsupportedValue(other.to_string())),
    }
}
