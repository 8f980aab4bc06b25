//! Runs a clubgate gateway in front of an in-memory sandbox service.
//!
//! ```text
//! RUST_LOG=debug CLUBGATE_ADDR=0.0.0.0:8080 cargo run -p sandbox-club
//! ```

mod club;

use clubgate::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::club::SandboxClub;

fn registry() -> MethodRegistry<SandboxClub> {
    MethodRegistry::new()
        .with("start_phone_number_auth", |club: &SandboxClub, (phone,): (String,)| {
            club.start_phone_number_auth(&phone)
        })
        .with(
            "complete_phone_number_auth",
            |club: &SandboxClub, (phone, code): (String, String)| {
                club.complete_phone_number_auth(&phone, &code)
            },
        )
        .with("me", |club: &SandboxClub, (): ()| club.me())
        .with("get_profile", |club: &SandboxClub, (user_id,): (u64,)| {
            club.get_profile(user_id)
        })
        .with("get_channels", |club: &SandboxClub, (): ()| club.get_channels())
        .with("join_channel", |club: &SandboxClub, (channel,): (String,)| {
            club.join_channel(&channel)
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = GatewayConfig::from_env()?;
    let server = GatewayServerBuilder::new()
        .config(config)
        .build::<SandboxClub>(registry())
        .await?;
    tracing::info!(
        addr = %server.local_addr()?,
        path = %server.config().path,
        "sandbox gateway listening"
    );

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
