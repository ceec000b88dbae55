//! InfluxDB Line Protocol 编码
//!
//! 行格式：`measurement field=value timestamp_ns`。
//! 本桥的数据点只有一个 `value` 字段，不写 tag。

use crate::error::StorageError;
use domain::{DataPoint, FieldValue};

/// 将单个数据点编码为一行 Line Protocol。
///
/// 时间戳以纳秒写出；超出纳秒可表示范围的时间点返回 `Encode` 错误。
pub fn encode_point(point: &DataPoint) -> Result<String, StorageError> {
    let timestamp_ns = point
        .time
        .timestamp_nanos_opt()
        .ok_or_else(|| StorageError::Encode(format!("timestamp out of range: {}", point.time)))?;
    Ok(format!(
        "{} value={} {}",
        escape_measurement(&point.measurement),
        format_field_value(&point.value),
        timestamp_ns
    ))
}

/// 字段值渲染：浮点原样、布尔为字面量、字符串加引号并转义。
fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::F64(v) => format!("{}", v),
        FieldValue::Bool(v) => {
            if *v {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
    }
}

/// measurement 名中的逗号与空格需要反斜杠转义。
fn escape_measurement(name: &str) -> String {
    name.replace(',', "\\,").replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn point(measurement: &str, seconds: i64, value: FieldValue) -> DataPoint {
        DataPoint {
            measurement: measurement.to_string(),
            time: DateTime::from_timestamp(seconds, 0)
                .expect("in range")
                .with_timezone(&chrono_tz::Europe::Berlin),
            value,
        }
    }

    #[test]
    fn float_point_renders_bare_number() {
        let line = encode_point(&point("sensors/temp1", 1700000000, FieldValue::F64(21.5)))
            .expect("encode");
        assert_eq!(line, "sensors/temp1 value=21.5 1700000000000000000");
    }

    #[test]
    fn string_point_is_quoted_and_escaped() {
        let line = encode_point(&point(
            "sensors/door1",
            1700000000,
            FieldValue::String("say \"hi\"".to_string()),
        ))
        .expect("encode");
        assert_eq!(
            line,
            "sensors/door1 value=\"say \\\"hi\\\"\" 1700000000000000000"
        );
    }

    #[test]
    fn boolean_point_renders_literal() {
        let line = encode_point(&point("sensors/door1", 1700000000, FieldValue::Bool(true)))
            .expect("encode");
        assert_eq!(line, "sensors/door1 value=true 1700000000000000000");
    }

    #[test]
    fn measurement_spaces_and_commas_are_escaped() {
        let line = encode_point(&point("room a,b", 1700000000, FieldValue::F64(1.0)))
            .expect("encode");
        assert_eq!(line, "room\\ a\\,b value=1 1700000000000000000");
    }
}
