//! Credentials going into a collaborator and coming back out of one.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{
    CallError, Headers, AUTHORIZATION_HEADER, DEVICE_ID_HEADER,
    USER_ID_HEADER,
};

/// Field names in positional order, used in argument error messages.
const PARAM_NAMES: [&str; 3] = ["user_id", "user_token", "user_device"];

/// One credential field, kept with the JSON type the client or the remote
/// service gave it.
///
/// A numeric user id stays a number when it is echoed back. The text form
/// ([`Display`](fmt::Display)) is what goes into the upstream header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialValue {
    /// A JSON number.
    Number(Number),
    /// A JSON string.
    Text(String),
}

impl CredentialValue {
    /// Reads a string or number. `null`, `""`, and every other JSON type
    /// give `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.is_empty() => {
                Some(Self::Text(text.clone()))
            }
            Value::Number(number) => Some(Self::Number(number.clone())),
            _ => None,
        }
    }

    /// Returns `true` for the empty string.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CredentialValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CredentialValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<u64> for CredentialValue {
    fn from(number: u64) -> Self {
        Self::Number(number.into())
    }
}

impl PartialEq<str> for CredentialValue {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::Text(text) if text == other)
    }
}

impl PartialEq<&str> for CredentialValue {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Construction input for a collaborator.
///
/// Every field is optional: an anonymous session has none, a fresh phone
/// login has only a device id, a full login has all three.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Remote account id.
    pub user_id: Option<CredentialValue>,
    /// Auth token issued by the remote service.
    pub user_token: Option<CredentialValue>,
    /// Device id the session is bound to.
    pub user_device: Option<CredentialValue>,
}

impl Credentials {
    /// Reads `(user_id, user_token, user_device)` from positional params.
    ///
    /// Fewer than three params is fine; the rest count as not supplied, as
    /// do `null` and `""`. Numbers are accepted and stay numbers.
    ///
    /// # Errors
    /// [`CallError::BadArguments`] for more than three params or a value
    /// that is neither a string nor a number.
    pub fn from_params(params: &[Value]) -> Result<Self, CallError> {
        if params.len() > PARAM_NAMES.len() {
            return Err(CallError::BadArguments(format!(
                "authenticate takes at most {} arguments but {} were given",
                PARAM_NAMES.len(),
                params.len()
            )));
        }

        let mut fields: [Option<CredentialValue>; 3] = Default::default();
        for (index, value) in params.iter().enumerate() {
            fields[index] = match value {
                Value::Null | Value::String(_) | Value::Number(_) => {
                    CredentialValue::from_json(value)
                }
                _ => {
                    return Err(CallError::BadArguments(format!(
                        "argument {} ({}) must be a string or a number",
                        index + 1,
                        PARAM_NAMES[index]
                    )));
                }
            };
        }

        let [user_id, user_token, user_device] = fields;
        Ok(Self {
            user_id,
            user_token,
            user_device,
        })
    }
}

impl From<CredentialSet> for Credentials {
    fn from(set: CredentialSet) -> Self {
        Self {
            user_id: Some(set.user_id),
            user_token: Some(set.user_token),
            user_device: Some(set.user_device),
        }
    }
}

/// A complete set of credentials, as echoed to the client on login.
///
/// Serializes as `{"user_id": .., "user_token": .., "user_device": ..}`,
/// each field with the JSON type it arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Remote account id.
    pub user_id: CredentialValue,
    /// Auth token.
    pub user_token: CredentialValue,
    /// Device id.
    pub user_device: CredentialValue,
}

impl CredentialSet {
    /// Reads the credential headers of a collaborator.
    ///
    /// # Errors
    /// [`CallError::NotAuthenticated`] if any of the three headers is
    /// missing or empty.
    pub fn from_headers(headers: &Headers) -> Result<Self, CallError> {
        let field = |name: &str| {
            headers.get_present(name).cloned().ok_or_else(|| {
                CallError::NotAuthenticated(format!("missing {name} header"))
            })
        };
        Ok(Self {
            user_id: field(USER_ID_HEADER)?,
            user_token: field(AUTHORIZATION_HEADER)?,
            user_device: field(DEVICE_ID_HEADER)?,
        })
    }
}
