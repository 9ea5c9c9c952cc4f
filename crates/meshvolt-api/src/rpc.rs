// ubus JSON-RPC envelope handling.
//
// Every control call is a POST of `{jsonrpc:"2.0", id:1, method:"call",
// params:[session, namespace, procedure, args]}`. Successful responses
// carry `result: [status, payload]`; an `error` member, a missing
// `result`, or a nonzero status all denote failure.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Placeholder session token for unauthenticated calls (`session.login`).
pub(crate) const NULL_SESSION: &str = "00000000000000000000000000000000";

/// Raw response envelope. Exactly one of `result` / `error` is present
/// on a well-behaved radio; we tolerate neither being present too.
#[derive(Debug, Deserialize)]
pub(crate) struct UbusResponse {
    pub result: Option<Value>,
    pub error: Option<Value>,
}

impl UbusResponse {
    /// Unwrap the `[status, payload]` result pair.
    ///
    /// Procedures without a payload (e.g. `session.destroy`) return a
    /// bare `[0]`; those yield `Value::Null`.
    pub(crate) fn into_payload(self) -> Result<Value, Error> {
        if let Some(err) = self.error {
            return Err(Error::Rpc {
                message: err.to_string(),
            });
        }

        let result = self.result.ok_or_else(|| Error::Protocol {
            message: "response carries neither result nor error".into(),
        })?;

        let Value::Array(mut parts) = result else {
            return Err(Error::Protocol {
                message: format!("unexpected result shape: {result}"),
            });
        };

        // Some firmwares report access-denied as a bare nonzero status
        // with no error member.
        let status = parts.first().and_then(Value::as_i64).unwrap_or(-1);
        if status != 0 {
            return Err(Error::Rpc {
                message: format!("ubus status {status}"),
            });
        }

        if parts.len() >= 2 {
            Ok(parts.swap_remove(1))
        } else {
            Ok(Value::Null)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> UbusResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn payload_unwrapped() {
        let resp = parse(json!({ "result": [0, { "key": "value" }] }));
        assert_eq!(resp.into_payload().unwrap(), json!({ "key": "value" }));
    }

    #[test]
    fn bare_status_ok_yields_null() {
        let resp = parse(json!({ "result": [0] }));
        assert_eq!(resp.into_payload().unwrap(), Value::Null);
    }

    #[test]
    fn error_member_is_rpc_error() {
        let resp = parse(json!({ "error": { "code": -32002, "message": "Access denied" } }));
        assert!(matches!(resp.into_payload(), Err(Error::Rpc { .. })));
    }

    #[test]
    fn nonzero_status_is_rpc_error() {
        let resp = parse(json!({ "result": [6] }));
        match resp.into_payload() {
            Err(Error::Rpc { message }) => assert!(message.contains('6')),
            other => panic!("expected Rpc error, got: {other:?}"),
        }
    }

    #[test]
    fn missing_result_is_protocol_error() {
        let resp = parse(json!({ "id": 1 }));
        assert!(matches!(resp.into_payload(), Err(Error::Protocol { .. })));
    }
}
