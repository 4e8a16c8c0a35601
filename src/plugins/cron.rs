use tokio::time::MissedTickBehavior;

use crate::{prelude::*, state::AppState};

/// Periodically revokes premium whose expiry has passed.
pub struct ExpirySweep;

#[async_trait]
impl super::Plugin for ExpirySweep {
  fn name(&self) -> &'static str {
    "expiry-sweep"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.sweep_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      interval.tick().await;

      match app.sv().access.sweep_expired().await {
        Ok(0) => debug!("Expiry sweep: nothing to revoke"),
        Ok(revoked) => info!(revoked, "Expiry sweep revoked premium"),
        Err(err) => warn!("Expiry sweep failed: {err}"),
      }
    }
  }
}
