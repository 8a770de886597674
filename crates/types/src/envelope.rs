//! The `{code, data, msg}` response envelope returned by the backend.

use crate::{Error, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Business code reported by a successful call.
pub const SUCCESS_CODE: i64 = 200;

/// Business code reported when the session token has expired.
pub const SESSION_EXPIRED_CODE: i64 = 401;

/// A parsed response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Envelope {
    /// Interpret a JSON value as an envelope.
    ///
    /// Returns `None` unless the value is an object carrying an integral numeric
    /// `code` (`200` and `200.0` are the same code).
    /// A `null` `data` is treated as absent and a non-string `msg` is ignored.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };
        let code = map.get("code").and_then(integer_code)?;
        let data = map.remove("data").filter(|d| !d.is_null());
        let msg = map
            .get("msg")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { code, data, msg })
    }

    /// Parse a raw response body into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnvelope`] if the body is not JSON or lacks a `code`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(Self::from_value)
            .ok_or(Error::InvalidEnvelope)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        self.code == SESSION_EXPIRED_CODE
    }

    /// Returns `data` as a string slice, if it is one.
    #[must_use]
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }

    /// Deserialize `data` into a typed value. A missing `data` decodes from `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `data` does not match `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data.unwrap_or(Value::Null))
            .map_err(|e| Error::Decode(e.to_string()))
    }

    /// Convert a non-success envelope into [`Error::Business`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::Business {
            code: self.code,
            msg: self.msg,
            data: self.data,
        }
    }
}

/// An integral JSON number as `i64`; fractional or out-of-range codes are rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integer_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full() {
        let env = Envelope::from_value(json!({"code": 200, "data": {"id": 7}, "msg": "ok"})).unwrap();
        assert!(env.is_success());
        assert_eq!(env.data, Some(json!({"id": 7})));
        assert_eq!(env.msg.as_deref(), Some("ok"));
    }

    #[test]
    fn test_from_value_code_only() {
        let env = Envelope::from_value(json!({"code": 401})).unwrap();
        assert!(env.is_session_expired());
        assert!(env.data.is_none());
        assert!(env.msg.is_none());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Envelope::from_value(json!([1, 2])).is_none());
        assert!(Envelope::from_value(json!("code")).is_none());
        assert!(Envelope::from_value(Value::Null).is_none());
    }

    #[test]
    fn test_from_value_rejects_missing_code() {
        assert!(Envelope::from_value(json!({"data": 1, "msg": "x"})).is_none());
    }

    #[test]
    fn test_from_value_null_data_is_absent() {
        let env = Envelope::from_value(json!({"code": 200, "data": null})).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn test_from_slice_not_json() {
        let err = Envelope::from_slice(b"<html>gateway</html>").unwrap_err();
        assert!(matches!(err, Error::InvalidEnvelope));
    }

    #[test]
    fn test_into_data_typed() {
        #[derive(Deserialize)]
        struct Task {
            id: u32,
        }
        let env = Envelope::from_value(json!({"code": 200, "data": {"id": 3}})).unwrap();
        let task: Task = env.into_data().unwrap();
        assert_eq!(task.id, 3);
    }

    #[test]
    fn test_into_data_mismatch() {
        let env = Envelope::from_value(json!({"code": 200, "data": "text"})).unwrap();
        let err = env.into_data::<Vec<u32>>().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_into_error_keeps_fields() {
        let env = Envelope::from_value(json!({"code": 500, "msg": "boom"})).unwrap();
        match env.into_error() {
            Error::Business { code, msg, .. } => {
                assert_eq!(code, 500);
                assert_eq!(msg.as_deref(), Some("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_value_accepts_integral_float_code() {
        let env = Envelope::from_value(json!({"code": 200.0, "data": 1})).unwrap();
        assert!(env.is_success());
        let env = Envelope::from_value(json!({"code": 401.0})).unwrap();
        assert!(env.is_session_expired());
    }

    #[test]
    fn test_from_value_rejects_fractional_or_non_numeric_code() {
        assert!(Envelope::from_value(json!({"code": 200.5})).is_none());
        assert!(Envelope::from_value(json!({"code": "200"})).is_none());
    }
}
