use crate::credentials::CredentialStore;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{info, instrument, warn};

/// Periodically force-refresh the connection config and hand the new
/// credentials to the pool. New connections pick them up; open ones finish
/// with the old credentials.
///
/// A failed refresh is logged and the pool keeps its current credentials.
#[instrument(skip(store, pool))]
pub fn spawn_rotation(store: Arc<CredentialStore>, pool: PgPool, every: Duration) -> JoinHandle<()> {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::spawn(async move {
        // first tick fires immediately, the startup fetch already covered it
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.get_connection_config(true).await {
                Ok(config) => {
                    pool.set_connect_options(config.connect_options());
                    info!(
                        "database credentials refreshed, next refresh in {} seconds",
                        every.as_secs()
                    );
                }
                Err(err) => {
                    warn!(error = %err, "failed to refresh database credentials");
                }
            }
        }
    })
}
