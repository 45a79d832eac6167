//! Inbound OAuth 2.0 support
//!
//! Authorization codes and bearer tokens for callers of the HTTP transport. Independent of
//! the upstream controller credential.

mod error;
pub mod pkce;
mod store;

pub use error::{OAuthError, OAuthErrorBody};
pub use pkce::{PkceChallenge, PkceMethod};
pub use store::{AuthCode, IssuedToken, OAuthStore, SweepStats, CODE_TTL, TOKEN_TTL};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Interval between expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run `sweep_expired` every `interval` until `shutdown` fires
pub fn spawn_sweeper(
    store: Arc<OAuthStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("OAuth sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    store.sweep_expired();
                }
            }
        }
    })
}
