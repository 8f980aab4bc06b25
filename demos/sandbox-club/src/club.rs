//! An in-memory stand-in for the remote social-audio service.
//!
//! Every phone number is a valid account; the verification code is always
//! [`SANDBOX_CODE`]. Nothing is persisted, so a token is only meaningful
//! to the sandbox that issued it, and the sandbox accepts any token.

use clubgate::prelude::*;
use rand::Rng;
use serde_json::{json, Value};

/// The only verification code the sandbox accepts.
pub const SANDBOX_CODE: &str = "1234";

struct Channel {
    name: &'static str,
    topic: &'static str,
}

static CHANNELS: [Channel; 3] = [
    Channel {
        name: "rust-hallway",
        topic: "Borrowing, lending, and other social contracts",
    },
    Channel {
        name: "late-night-jazz",
        topic: "Open mic",
    },
    Channel {
        name: "founders-circle",
        topic: "Pitch practice",
    },
];

/// One sandbox session, identified by its request headers.
pub struct SandboxClub {
    headers: Headers,
}

impl Collaborator for SandboxClub {
    fn with_credentials(credentials: &Credentials) -> Self {
        let mut headers = Headers::from_credentials(credentials);
        if credentials.user_device.is_none() {
            headers.insert(DEVICE_ID_HEADER, generate_device_id());
        }
        Self { headers }
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }
}

impl SandboxClub {
    /// Pretends to text a verification code to `phone_number`.
    pub fn start_phone_number_auth(
        &self,
        phone_number: &str,
    ) -> Result<Value, CallError> {
        user_id_for(phone_number)?;
        tracing::debug!(phone_number, "sandbox verification code sent");
        Ok(json!({"success": true, "error_message": null}))
    }

    /// Checks the verification code and issues a fresh auth token.
    pub fn complete_phone_number_auth(
        &self,
        phone_number: &str,
        verification_code: &str,
    ) -> Result<Value, CallError> {
        let user_id = user_id_for(phone_number)?;
        if verification_code != SANDBOX_CODE {
            return Ok(json!({
                "success": false,
                "error_message": "Incorrect verification code",
            }));
        }
        Ok(json!({
            "success": true,
            "is_waitlisted": false,
            "auth_token": generate_token(),
            "user_profile": profile(user_id),
        }))
    }

    /// The signed-in user's profile.
    pub fn me(&self) -> Result<Value, CallError> {
        let credentials = self.credentials()?;
        let user_id = credentials.user_id.to_string().parse().map_err(|_| {
            CallError::Remote(format!(
                "sandbox user id {} is not numeric",
                credentials.user_id
            ))
        })?;
        Ok(json!({"success": true, "user_profile": profile(user_id)}))
    }

    /// Any user's profile.
    pub fn get_profile(&self, user_id: u64) -> Result<Value, CallError> {
        self.credentials()?;
        Ok(json!({"success": true, "user_profile": profile(user_id)}))
    }

    /// The channels currently live.
    pub fn get_channels(&self) -> Result<Value, CallError> {
        self.credentials()?;
        let channels: Vec<Value> = CHANNELS
            .iter()
            .map(|c| json!({"channel": c.name, "topic": c.topic}))
            .collect();
        Ok(json!({"success": true, "channels": channels}))
    }

    /// Joins a live channel.
    pub fn join_channel(&self, channel: &str) -> Result<Value, CallError> {
        let credentials = self.credentials()?;
        let Some(found) = CHANNELS.iter().find(|c| c.name == channel) else {
            return Ok(json!({
                "success": false,
                "error_message": "That room is no longer available",
            }));
        };
        tracing::info!(user_id = %credentials.user_id, channel, "joined channel");
        Ok(json!({
            "success": true,
            "channel": found.name,
            "topic": found.topic,
        }))
    }
}

/// Derives a stable account id from an E.164 phone number.
fn user_id_for(phone_number: &str) -> Result<u64, CallError> {
    let digits = phone_number.strip_prefix('+').unwrap_or(phone_number);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CallError::BadArguments(format!(
            "{phone_number:?} is not a phone number"
        )));
    }
    let id = digits
        .bytes()
        .fold(0u64, |acc, b| (acc * 10 + u64::from(b - b'0')) % 1_000_000_007);
    Ok(id + 1)
}

fn profile(user_id: u64) -> Value {
    json!({
        "user_id": user_id,
        "name": format!("Sandbox User {user_id}"),
        "username": format!("sandbox{user_id}"),
    })
}

fn generate_device_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}

fn generate_token() -> String {
    let bytes: [u8; 20] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> SandboxClub {
        SandboxClub::with_credentials(&Credentials {
            user_id: Some("42".into()),
            user_token: Some("tok".into()),
            user_device: Some("dev".into()),
        })
    }

    #[test]
    fn test_anonymous_session_has_random_device() {
        let a = SandboxClub::anonymous();
        let b = SandboxClub::anonymous();
        let device_a = a.headers().get(DEVICE_ID_HEADER).unwrap();
        let device_b = b.headers().get(DEVICE_ID_HEADER).unwrap();
        assert_eq!(device_a.to_string().len(), 36);
        assert_ne!(device_a, device_b);
        assert!(a.credentials().is_err());
    }

    #[test]
    fn test_phone_login_with_right_code_issues_token() {
        let club = SandboxClub::anonymous();
        let result = club
            .complete_phone_number_auth("+15550100", SANDBOX_CODE)
            .unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["auth_token"].as_str().unwrap().len(), 40);
        assert_eq!(
            result["user_profile"]["user_id"],
            json!(user_id_for("+15550100").unwrap())
        );
    }

    #[test]
    fn test_phone_login_with_wrong_code_has_no_token() {
        let club = SandboxClub::anonymous();
        let result = club.complete_phone_number_auth("+15550100", "0000").unwrap();
        assert_eq!(result["success"], json!(false));
        assert!(result.get("auth_token").is_none());
    }

    #[test]
    fn test_bad_phone_number_is_bad_arguments() {
        let club = SandboxClub::anonymous();
        assert!(matches!(
            club.start_phone_number_auth("call me"),
            Err(CallError::BadArguments(_))
        ));
    }

    #[test]
    fn test_user_ids_are_stable() {
        assert_eq!(user_id_for("+100").unwrap(), user_id_for("100").unwrap());
        assert_ne!(user_id_for("+100").unwrap(), user_id_for("+101").unwrap());
    }

    #[test]
    fn test_signed_out_operations_need_credentials() {
        let club = SandboxClub::anonymous();
        assert!(matches!(club.me(), Err(CallError::NotAuthenticated(_))));
        assert!(matches!(club.get_channels(), Err(CallError::NotAuthenticated(_))));
        assert!(matches!(
            club.join_channel("rust-hallway"),
            Err(CallError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn test_signed_in_operations() {
        let club = signed_in();
        assert_eq!(club.me().unwrap()["user_profile"]["user_id"], json!(42));
        assert_eq!(club.get_profile(7).unwrap()["user_profile"]["user_id"], json!(7));
        assert_eq!(
            club.get_channels().unwrap()["channels"].as_array().unwrap().len(),
            CHANNELS.len()
        );
        assert_eq!(club.join_channel("late-night-jazz").unwrap()["success"], json!(true));
        assert_eq!(club.join_channel("nowhere").unwrap()["success"], json!(false));
    }
}
