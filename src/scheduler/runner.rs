use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use tokio::task::JoinHandle;

use crate::alert::AlertRenderer;
use crate::config::Config;
use crate::pipeline::{self, PipelineError};
use crate::predict::{Observer, PassEvent};
use crate::scheduler::trigger::TriggerEngine;

const TICK_SECONDS: u64 = 1;
/// A missing pass cache forces a recompute, retried at most this often.
const FORCED_RETRY_SECONDS: i64 = 60;

/// The monitoring loop. Each one-second tick is a cheap lookup against the
/// in-memory event list; the expensive recompute runs off the tick task and
/// communicates back through the persisted pass cache and its mtime, never
/// through shared mutable state. At most one recompute is in flight.
pub struct Runner {
    config: Arc<Config>,
    observer: Observer,
    renderer: Box<dyn AlertRenderer>,
    engine: TriggerEngine,
    events: Vec<PassEvent>,
    cache_mtime: Option<SystemTime>,
    next_refresh: DateTime<Utc>,
    next_reload: DateTime<Utc>,
    next_forced: DateTime<Utc>,
    recompute: Option<JoinHandle<Result<Vec<PassEvent>, PipelineError>>>,
}

impl Runner {
    pub fn new(config: Config, observer: Observer, renderer: Box<dyn AlertRenderer>) -> Self {
        let now = Utc::now();
        Self {
            config: Arc::new(config),
            observer,
            renderer,
            engine: TriggerEngine::new(),
            events: Vec::new(),
            cache_mtime: None,
            next_refresh: now,
            next_reload: now,
            next_forced: now,
            recompute: None,
        }
    }

    pub async fn run(mut self) {
        self.startup().await;

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(TICK_SECONDS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.step(Utc::now()).await;
        }
    }

    /// Initial load: serve the cached envelope if fresh, recompute otherwise.
    async fn startup(&mut self) {
        let config = Arc::clone(&self.config);
        let observer = self.observer;
        let loaded = tokio::task::spawn_blocking(move || {
            pipeline::get_events(&config, &observer, Utc::now(), false)
        })
        .await;

        match loaded {
            Ok(Ok(events)) => {
                info!("monitoring {} upcoming pass events", events.len());
                self.events = events;
            }
            Ok(Err(e)) => warn!("initial pass load failed, starting empty: {}", e),
            Err(e) => error!("initial pass load panicked: {}", e),
        }

        let now = Utc::now();
        self.cache_mtime = pipeline::pass_cache(&self.config).modified();
        self.next_refresh = now + self.config.scheduler.refresh_interval;
        self.next_reload = now + self.config.scheduler.reload_interval;
        self.next_forced = now + Duration::seconds(FORCED_RETRY_SECONDS);
    }

    async fn step(&mut self, now: DateTime<Utc>) {
        self.reap_recompute().await;
        self.reload_if_file_changed();
        self.maybe_start_recompute(now);

        if now >= self.next_reload {
            self.reload_events();
            self.next_reload = now + self.config.scheduler.reload_interval;
        }

        let alerts = self.engine.tick(now, &self.events);
        if !alerts.is_empty() {
            self.renderer.render_batch(&alerts);
        }
    }

    /// Collect a finished recompute. Failures are logged and retried at the
    /// next scheduled refresh; they never stop the loop.
    async fn reap_recompute(&mut self) {
        let finished = matches!(&self.recompute, Some(handle) if handle.is_finished());
        if !finished {
            return;
        }
        let Some(handle) = self.recompute.take() else {
            return;
        };
        match handle.await {
            Ok(Ok(events)) => {
                info!("recompute finished: {} pass events", events.len());
                self.events = events;
                self.cache_mtime = pipeline::pass_cache(&self.config).modified();
            }
            Ok(Err(e)) => warn!("recompute failed, will retry next refresh: {}", e),
            Err(e) => error!("recompute task panicked: {}", e),
        }
    }

    fn maybe_start_recompute(&mut self, now: DateTime<Utc>) {
        if self.recompute.is_some() {
            return;
        }

        let missing = !pipeline::pass_cache(&self.config).exists();
        let due = now >= self.next_refresh;
        let forced = missing && now >= self.next_forced;
        if !due && !forced {
            return;
        }

        if forced {
            info!("pass cache file missing, forcing recompute");
        } else {
            info!("scheduled refresh starting");
        }

        let config = Arc::clone(&self.config);
        let observer = self.observer;
        self.recompute = Some(tokio::task::spawn_blocking(move || {
            pipeline::refresh_passes(&config, &observer, Utc::now(), false)
        }));
        self.next_refresh = now + self.config.scheduler.refresh_interval;
        self.next_forced = now + Duration::seconds(FORCED_RETRY_SECONDS);
    }

    /// Pick up envelopes written by another process (or an editor) by
    /// watching the cache file's modification time.
    fn reload_if_file_changed(&mut self) {
        let mtime = pipeline::pass_cache(&self.config).modified();
        if mtime != self.cache_mtime {
            self.cache_mtime = mtime;
            self.reload_events();
        }
    }

    /// Re-read the pass envelope regardless of freshness; the scheduler
    /// trusts whatever the acquisition side last persisted.
    fn reload_events(&mut self) {
        if let Some(envelope) = pipeline::pass_cache(&self.config).load() {
            info!("reloaded pass cache: {} events", envelope.data.len());
            self.events = envelope.data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;
    use crate::catalog::RcsClass;
    use chrono::TimeZone;

    struct NullRenderer;
    impl AlertRenderer for NullRenderer {
        fn render(&mut self, _alert: &Alert) {}
    }

    fn runner_with_cache(dir: &std::path::Path) -> Runner {
        let config: Config = serde_yaml::from_str(&format!(
            "station:\n  name: null\n  coordinates: \"29.76, -95.36\"\ncatalog:\n  credentials_file: {creds}\npasses:\n  cache_file: {cache}\n",
            creds = dir.join("credentials.yaml").display(),
            cache = dir.join("debris_data.json").display(),
        ))
        .unwrap();
        let observer = config.observer().unwrap();
        Runner::new(config, observer, Box::new(NullRenderer))
    }

    #[test]
    fn mtime_change_reloads_the_event_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner_with_cache(dir.path());

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let events = vec![PassEvent {
            object_id: "X".to_string(),
            object_name: "X DEB".to_string(),
            rcs: RcsClass::Small,
            culmination_time: now,
            altitude_km: 700.0,
            distance_km: 90.0,
        }];
        pipeline::pass_cache(&runner.config).store(&events, now).unwrap();

        assert!(runner.events.is_empty());
        runner.reload_if_file_changed();
        assert_eq!(runner.events, events);

        // No further change, reload is a no-op (mtime matches)
        let before = runner.cache_mtime;
        runner.reload_if_file_changed();
        assert_eq!(runner.cache_mtime, before);
    }

    #[tokio::test]
    async fn missing_cache_file_forces_a_recompute_before_the_refresh_is_due() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner_with_cache(dir.path());

        let now = Utc::now();
        runner.next_refresh = now + Duration::days(1);
        runner.next_forced = now;

        runner.maybe_start_recompute(now);
        assert!(
            runner.recompute.is_some(),
            "missing cache file must start a recompute"
        );
        let armed = runner.next_forced;
        assert!(armed > now, "forced retry must be rearmed");

        // One in flight: a later tick starts nothing and leaves timers alone
        runner.maybe_start_recompute(now + Duration::seconds(30));
        assert_eq!(runner.next_forced, armed);
        assert_eq!(runner.next_refresh, now + Duration::days(1));
    }

    #[tokio::test]
    async fn present_cache_file_waits_for_the_scheduled_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner_with_cache(dir.path());

        let now = Utc::now();
        pipeline::pass_cache(&runner.config)
            .store(&Vec::new(), now)
            .unwrap();
        runner.next_refresh = now + Duration::days(1);
        runner.next_forced = now;

        runner.maybe_start_recompute(now);
        assert!(
            runner.recompute.is_none(),
            "an existing cache file must not force a recompute"
        );
    }
}
