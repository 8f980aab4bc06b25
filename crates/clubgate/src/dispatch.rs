//! Request dispatcher: one inbound frame in, one or two replies out.
//!
//! ```text
//! frame ──decode──→ RpcRequest ──"authenticate"──→ AuthState::authenticate ──→ {id:"auth"}
//!   │                    │
//!   │                    └──other──→ registry ──spawn_blocking──→ result ──→ {id, result}
//!   │                                                               │
//!   │                                   complete_phone_number_auth ─┴→ {id:"auth"} push
//!   └──invalid──→ {id | 0, error: -32602}
//! ```
//!
//! Every failure on the way is turned into a [`Fault`] and answered. The
//! dispatcher never returns an error to the connection loop.

use clubgate_protocol::{Codec, JsonCodec, RpcRequest, RpcResponse};
use clubgate_session::{
    AuthState, Collaborator, CredentialSet, CredentialValue, Credentials,
    DEVICE_ID_HEADER,
};
use serde_json::Value;

use crate::{Fault, MethodRegistry};

/// The pseudo-method that installs new credentials.
pub const AUTHENTICATE_METHOD: &str = "authenticate";

/// The operation whose success carries freshly issued credentials.
pub const COMPLETE_PHONE_AUTH_METHOD: &str = "complete_phone_number_auth";

/// Routes decoded requests to the collaborator of one connection.
///
/// Shared by all connections; all per-connection state lives in the
/// [`AuthState`] passed to [`dispatch`](Self::dispatch).
pub struct Dispatcher<C: Collaborator, K: Codec = JsonCodec> {
    registry: MethodRegistry<C>,
    codec: K,
}

impl<C: Collaborator, K: Codec> Dispatcher<C, K> {
    /// Creates a dispatcher over `registry`, decoding frames with `codec`.
    pub fn new(registry: MethodRegistry<C>, codec: K) -> Self {
        Self { registry, codec }
    }

    /// The codec frames are decoded (and replies encoded) with.
    pub fn codec(&self) -> &K {
        &self.codec
    }

    /// Handles one inbound frame.
    ///
    /// Returns the primary reply first, followed by a re-authentication push
    /// when one was triggered. Collaborator calls run on the blocking pool;
    /// this future just waits for them.
    pub async fn dispatch(
        &self,
        session: &mut AuthState<C>,
        data: &[u8],
    ) -> Vec<RpcResponse> {
        let request = match RpcRequest::decode(&self.codec, data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "rejected envelope");
                let id = e.response_id();
                return vec![RpcResponse::failure(
                    id,
                    Fault::from(e).to_error_object(),
                )];
            }
        };

        let RpcRequest {
            id, method, params, ..
        } = request;
        tracing::info!(%id, %method, "received request");

        if method == AUTHENTICATE_METHOD {
            let reply = match authenticate(session, &params) {
                Ok(result) => RpcResponse::auth(result),
                Err(fault) => fail(session, id, &method, fault),
            };
            return vec![reply];
        }

        match self.invoke(session, &method, params).await {
            Ok(result) => {
                let push = if method == COMPLETE_PHONE_AUTH_METHOD {
                    reauthenticate(session, &result)
                } else {
                    None
                };
                let mut replies = vec![RpcResponse::success(id, result)];
                replies.extend(push);
                replies
            }
            Err(fault) => vec![fail(session, id, &method, fault)],
        }
    }

    /// Runs a registered operation against the current collaborator on the
    /// blocking pool.
    async fn invoke(
        &self,
        session: &AuthState<C>,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, Fault> {
        let operation = self
            .registry
            .resolve(method)
            .ok_or_else(|| Fault::MethodNotFound(method.to_string()))?;
        let collaborator = session.current();

        let outcome = tokio::task::spawn_blocking(move || {
            operation.call(&collaborator, params)
        })
        .await;

        match outcome {
            Ok(result) => result.map_err(Fault::from),
            Err(e) => Err(Fault::Internal(format!(
                "operation {method} did not complete: {e}"
            ))),
        }
    }
}

/// Handles the `authenticate` pseudo-method.
fn authenticate<C: Collaborator>(
    session: &mut AuthState<C>,
    params: &[Value],
) -> Result<Value, Fault> {
    let credentials = Credentials::from_params(params)?;
    let set = session.authenticate(&credentials)?;
    credential_result(&set)
}

/// Installs the credentials a successful phone login returned and builds
/// the push announcing them.
///
/// Returns `None` (leaving the session alone) unless `result` has an
/// `auth_token`, a `user_profile.user_id`, and the current session has a
/// device id.
fn reauthenticate<C: Collaborator>(
    session: &mut AuthState<C>,
    result: &Value,
) -> Option<RpcResponse> {
    let token = result.get("auth_token")?;

    let user_id = result
        .get("user_profile")
        .and_then(|profile| profile.get("user_id"))
        .and_then(CredentialValue::from_json);
    let user_token = CredentialValue::from_json(token);
    let user_device = session
        .current()
        .headers()
        .get_present(DEVICE_ID_HEADER)
        .cloned();

    let (Some(user_id), Some(user_token), Some(user_device)) =
        (user_id, user_token, user_device)
    else {
        tracing::warn!(
            "phone login returned a token without usable credentials; \
             keeping current session"
        );
        return None;
    };

    let set = CredentialSet {
        user_id,
        user_token,
        user_device,
    };
    session.reauthenticate(&set);

    match credential_result(&set) {
        Ok(result) => Some(RpcResponse::auth(result)),
        Err(fault) => {
            tracing::error!(error = %fault, "could not encode credentials");
            None
        }
    }
}

/// Builds the failure reply, logging and applying the fault's side effects.
fn fail<C: Collaborator>(
    session: &mut AuthState<C>,
    id: Value,
    method: &str,
    fault: Fault,
) -> RpcResponse {
    match &fault {
        Fault::Internal(detail) => {
            tracing::error!(%id, method, %detail, "request failed");
        }
        Fault::NotAuthenticated(reason) => {
            tracing::warn!(%id, method, %reason, "not authenticated");
        }
        other => {
            tracing::debug!(%id, method, error = %other, "request rejected");
        }
    }
    if fault.resets_session() {
        session.logout();
    }
    RpcResponse::failure(id, fault.to_error_object())
}

fn credential_result(set: &CredentialSet) -> Result<Value, Fault> {
    serde_json::to_value(set).map_err(|e| Fault::Internal(e.to_string()))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Dispatcher tests against an in-process fake collaborator. No network
    //! is involved; each test feeds raw frames to `dispatch` and inspects
    //! the replies and the session afterwards.

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use clubgate_protocol::codes;
    use clubgate_session::{CallError, Headers};
    use serde_json::json;

    use super::*;

    static NEXT_DEVICE: AtomicU64 = AtomicU64::new(1);

    /// Minimal collaborator: anonymous sessions get a fresh device id, and
    /// `whoami` needs credentials.
    struct FakeClub {
        headers: Headers,
    }

    impl Collaborator for FakeClub {
        fn with_credentials(credentials: &Credentials) -> Self {
            let mut headers = Headers::from_credentials(credentials);
            if credentials.user_device.is_none() {
                let n = NEXT_DEVICE.fetch_add(1, Ordering::Relaxed);
                headers.insert(DEVICE_ID_HEADER, format!("device-{n}"));
            }
            Self { headers }
        }

        fn headers(&self) -> &Headers {
            &self.headers
        }
    }

    impl FakeClub {
        fn whoami(&self) -> Result<CredentialValue, CallError> {
            self.credentials().map(|set| set.user_id)
        }
    }

    fn dispatcher() -> Dispatcher<FakeClub> {
        let registry = MethodRegistry::new()
            .with("echo", |_: &FakeClub, (text,): (String,)| Ok(text))
            .with("nothing", |_: &FakeClub, (): ()| Ok(()))
            .with("whoami", |club: &FakeClub, (): ()| club.whoami())
            .with("explode", |_: &FakeClub, (): ()| -> Result<(), CallError> {
                Err(CallError::Remote("upstream said 500".into()))
            })
            .with("panic", |_: &FakeClub, (): ()| -> Result<(), CallError> {
                panic!("collaborator bug")
            })
            .with(
                COMPLETE_PHONE_AUTH_METHOD,
                |_: &FakeClub, (_phone, code): (String, String)| {
                    if code == "0000" {
                        return Ok(json!({"success": false}));
                    }
                    Ok(json!({
                        "success": true,
                        "auth_token": format!("tok-{code}"),
                        "user_profile": {"user_id": 77, "name": "Ada"},
                    }))
                },
            );
        Dispatcher::new(registry, JsonCodec)
    }

    fn frame(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn request(id: Value, method: &str, params: Value) -> Vec<u8> {
        frame(json!({
            "id": id, "method": method, "params": params, "jsonrpc": "2.0",
        }))
    }

    fn error_code(reply: &RpcResponse) -> i64 {
        reply.error.as_ref().expect("should be an error").code
    }

    async fn login(d: &Dispatcher<FakeClub>, s: &mut AuthState<FakeClub>) {
        let replies = d
            .dispatch(s, &request(json!(1), "authenticate", json!(["5", "tok", "dev"])))
            .await;
        assert!(!replies[0].is_error(), "login should succeed");
    }

    // =====================================================================
    // Envelope validation
    // =====================================================================

    #[tokio::test]
    async fn test_missing_field_returns_invalid_envelope_with_id() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &frame(json!({"id": 4, "method": "echo", "params": []})))
            .await;

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, json!(4));
        assert_eq!(error_code(&replies[0]), codes::INVALID_ENVELOPE);
        assert_eq!(
            replies[0].error.as_ref().unwrap().message,
            "Invalid rpc 2.0 structure"
        );
        assert!(replies[0].result.is_null());
    }

    #[tokio::test]
    async fn test_missing_id_and_garbage_use_zero() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &frame(json!({"method": "echo", "params": [], "jsonrpc": "2.0"})))
            .await;
        assert_eq!(replies[0].id, json!(0));

        let replies = d.dispatch(&mut s, b"{{{ not json").await;
        assert_eq!(replies[0].id, json!(0));
        assert_eq!(error_code(&replies[0]), codes::INVALID_ENVELOPE);
    }

    #[tokio::test]
    async fn test_wrongly_typed_method_or_params_is_invalid_envelope() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        login(&d, &mut s).await;

        let replies = d
            .dispatch(
                &mut s,
                &frame(json!({"id": 5, "method": 7, "params": [], "jsonrpc": "2.0"})),
            )
            .await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, json!(5));
        assert_eq!(error_code(&replies[0]), codes::INVALID_ENVELOPE);

        let replies = d
            .dispatch(
                &mut s,
                &frame(json!({"id": 6, "method": "echo", "params": "x", "jsonrpc": "2.0"})),
            )
            .await;
        assert_eq!(replies[0].id, json!(6));
        assert_eq!(error_code(&replies[0]), codes::INVALID_ENVELOPE);

        // A malformed envelope never touches the session.
        assert!(s.is_authenticated());
    }

    #[tokio::test]
    async fn test_invalid_envelope_is_repeatable() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        let bad = frame(json!({"id": "x", "jsonrpc": "2.0"}));

        let first = d.dispatch(&mut s, &bad).await;
        let second = d.dispatch(&mut s, &bad).await;

        assert_eq!(first, second);
    }

    // =====================================================================
    // Operation invocation
    // =====================================================================

    #[tokio::test]
    async fn test_success_echoes_id_and_result() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!("r1"), "echo", json!(["hi"])))
            .await;

        assert_eq!(replies, vec![RpcResponse::success(json!("r1"), json!("hi"))]);
    }

    #[tokio::test]
    async fn test_success_with_unit_result_is_null() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(2), "nothing", json!([])))
            .await;

        assert!(replies[0].result.is_null());
        assert!(replies[0].error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_keeps_session() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        login(&d, &mut s).await;
        let before = s.current();

        let replies = d
            .dispatch(&mut s, &request(json!(3), "fly_to_moon", json!([])))
            .await;

        assert_eq!(error_code(&replies[0]), codes::METHOD_NOT_FOUND);
        assert_eq!(replies[0].error.as_ref().unwrap().message, "Method not found");
        assert!(Arc::ptr_eq(&before, &s.current()));
    }

    #[tokio::test]
    async fn test_bad_arguments_forward_message_and_keep_session() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        login(&d, &mut s).await;
        let before = s.current();

        let replies = d
            .dispatch(&mut s, &request(json!(3), "echo", json!(["a", "b"])))
            .await;

        let error = replies[0].error.as_ref().unwrap();
        assert_eq!(error.code, codes::INVALID_ARGUMENTS);
        assert_eq!(error.message, "expected at most 1 arguments but 2 were given");
        assert!(Arc::ptr_eq(&before, &s.current()));
    }

    #[tokio::test]
    async fn test_remote_failure_is_internal_and_hides_detail() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(8), "explode", json!([])))
            .await;

        let error = replies[0].error.as_ref().unwrap();
        assert_eq!(error.code, codes::INTERNAL_ERROR);
        assert_eq!(error.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_panicking_operation_is_internal() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(9), "panic", json!([])))
            .await;
        assert_eq!(error_code(&replies[0]), codes::INTERNAL_ERROR);

        // The dispatcher keeps working afterwards.
        let replies = d
            .dispatch(&mut s, &request(json!(10), "echo", json!(["ok"])))
            .await;
        assert_eq!(replies[0].result, json!("ok"));
    }

    // =====================================================================
    // Authentication
    // =====================================================================

    #[tokio::test]
    async fn test_authenticate_replies_with_credential_set() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(1), "authenticate", json!([5, "tok", "dev"])))
            .await;

        assert_eq!(
            replies,
            vec![RpcResponse::auth(json!({
                "user_id": 5, "user_token": "tok", "user_device": "dev",
            }))]
        );

        // Later calls run against the new collaborator.
        let replies = d
            .dispatch(&mut s, &request(json!(2), "whoami", json!([])))
            .await;
        assert_eq!(replies[0].result, json!(5));
    }

    #[tokio::test]
    async fn test_authenticate_incomplete_resets_to_anonymous() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        login(&d, &mut s).await;

        let replies = d
            .dispatch(&mut s, &request(json!(7), "authenticate", json!(["5"])))
            .await;

        assert_eq!(replies[0].id, json!(7));
        assert_eq!(error_code(&replies[0]), codes::NOT_AUTHENTICATED);
        assert!(!s.is_authenticated());
    }

    #[tokio::test]
    async fn test_authenticate_with_bad_params_is_invalid_arguments() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(7), "authenticate", json!([1, 2, 3, 4])))
            .await;

        assert_eq!(error_code(&replies[0]), codes::INVALID_ARGUMENTS);
    }

    #[tokio::test]
    async fn test_not_authenticated_operation_logs_out() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();

        let replies = d
            .dispatch(&mut s, &request(json!(4), "whoami", json!([])))
            .await;

        assert_eq!(error_code(&replies[0]), codes::NOT_AUTHENTICATED);
        assert_eq!(replies[0].error.as_ref().unwrap().message, "Not Authenticated");
        assert!(!s.is_authenticated());
    }

    // =====================================================================
    // Re-authentication push
    // =====================================================================

    #[tokio::test]
    async fn test_phone_login_pushes_new_credentials() {
        let d = dispatcher();
        let mut s: AuthState<FakeClub> = AuthState::anonymous();
        let device = s
            .current()
            .headers()
            .get(DEVICE_ID_HEADER)
            .unwrap()
            .to_string();

        let replies = d
            .dispatch(
                &mut s,
                &request(json!(11), COMPLETE_PHONE_AUTH_METHOD, json!(["+100", "1234"])),
            )
            .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].id, json!(11));
        assert_eq!(replies[0].result["auth_token"], json!("tok-1234"));
        assert_eq!(
            replies[1].result["user_id"],
            replies[0].result["user_profile"]["user_id"]
        );
        assert_eq!(
            replies[1],
            RpcResponse::auth(json!({
                "user_id": 77,
                "user_token": "tok-1234",
                "user_device": device,
            }))
        );

        let creds = s.credentials().expect("session should be authenticated");
        assert_eq!(creds.user_id, CredentialValue::from(77u64));
        assert_eq!(creds.user_device, device.as_str());
    }

    #[tokio::test]
    async fn test_phone_login_without_token_sends_one_reply() {
        let d = dispatcher();
        let mut s = AuthState::anonymous();
        let before = s.current();

        let replies = d
            .dispatch(
                &mut s,
                &request(json!(12), COMPLETE_PHONE_AUTH_METHOD, json!(["+100", "0000"])),
            )
            .await;

        assert_eq!(replies.len(), 1);
        assert!(Arc::ptr_eq(&before, &s.current()));
    }
}
