// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Uniform JSON result envelope
//!
//! Success serializes as `{"msg": .., "data": ..}`, failure as
//! `{"code": .., "msg": ..}`.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonResult<T = serde_json::Value> {
    Success {
        msg: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<T>,
    },
    Failed {
        code: i32,
        msg: String,
    },
}

impl<T> JsonResult<T> {
    pub fn success(msg: impl Into<String>, data: T) -> Self {
        Self::Success {
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Success without a payload
    pub fn success_empty(msg: impl Into<String>) -> Self {
        Self::Success {
            msg: msg.into(),
            data: None,
        }
    }

    pub fn failed(code: i32, msg: impl Into<String>) -> Self {
        Self::Failed {
            code,
            msg: msg.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let result = JsonResult::success("OK", json!({ "extra": "extra data" }));
        assert!(result.is_success());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "msg": "OK", "data": { "extra": "extra data" } })
        );
    }

    #[test]
    fn test_success_without_data() {
        let result: JsonResult = JsonResult::success_empty("Deleted");
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "msg": "Deleted" }));
    }

    #[test]
    fn test_failed_shape() {
        let result: JsonResult = JsonResult::failed(1, "error msg");
        assert!(!result.is_success());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "code": 1, "msg": "error msg" })
        );
    }
}
