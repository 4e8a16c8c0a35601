pub mod cron;
pub mod telegram;

use tokio::{
  task::{AbortHandle, JoinSet},
  time::Instant,
};

use crate::{prelude::*, state::AppState};

const MIN_BACKOFF: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(300);
/// A run at least this long counts as healthy and resets the backoff.
const HEALTHY_RUN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Supervises long-running services, restarting any that stop.
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

/// Supervisor tasks of a started `App`.
pub struct Running {
  tasks: JoinSet<()>,
}

impl Running {
  /// Stops supervising. Services are not restarted after this.
  pub async fn shutdown(mut self) {
    self.tasks.shutdown().await;
    info!("SYSTEM: All services stopped");
  }
}

/// Delay before the next restart. Grows while the service keeps crashing
/// quickly.
fn restart_delay(backoff: Duration, ran_for: Duration) -> Duration {
  if ran_for >= HEALTHY_RUN { MIN_BACKOFF } else { backoff }
}

fn grow(delay: Duration) -> Duration {
  (delay * 2).min(MAX_BACKOFF)
}

/// Takes the service task down with its supervisor.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
  fn drop(&mut self) {
    self.0.abort();
  }
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn run(self, app: Arc<AppState>) -> Running {
    let mut tasks = JoinSet::new();
    for plugin in self.plugins {
      tasks.spawn(supervise(plugin, app.clone()));
    }
    Running { tasks }
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  info!("SYSTEM: Service `{name}` initialized");

  let mut backoff = MIN_BACKOFF;
  let mut restarts = 0u32;

  loop {
    let started = Instant::now();
    let app = app.clone();
    let plugin = plugin.clone();

    let handle = tokio::spawn(async move { plugin.start(app).await });
    let _guard = AbortOnDrop(handle.abort_handle());

    match handle.await {
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly (Ok)."),
      Ok(Err(err)) => error!("Service `{name}` crashed with error: {err:#}."),
      Err(join_err) if join_err.is_cancelled() => {
        info!("Service `{name}` shutdown.");
        break;
      }
      Err(_) => error!("Service `{name}` PANICKED!"),
    }

    let delay = restart_delay(backoff, started.elapsed());
    backoff = grow(delay);
    restarts += 1;

    time::sleep(delay).await;
    info!(restarts, "SYSTEM: Restarting service `{name}` after {delay:?}...");
  }
}
