//! Sensor feed: a shared reading refreshed with a random value on a fixed
//! interval until shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use bimstore_core::config::SensorConfig;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// The latest reading, served by `GET /sensordata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor name.
    pub name: String,
    /// Last generated value.
    pub value: u32,
    /// RFC 3339 time of the last refresh.
    pub timestamp: String,
}

impl SensorReading {
    fn initial(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Periodically refreshed sensor reading.
#[derive(Debug, Clone)]
pub struct SensorFeed {
    config: SensorConfig,
    reading: Arc<RwLock<SensorReading>>,
}

impl SensorFeed {
    /// Create a feed holding an initial zero reading.
    pub fn new(config: SensorConfig) -> Self {
        let reading = Arc::new(RwLock::new(SensorReading::initial(&config.name)));
        Self { config, reading }
    }

    /// Shared handle on the reading, for readers such as HTTP handlers.
    pub fn reading(&self) -> Arc<RwLock<SensorReading>> {
        Arc::clone(&self.reading)
    }

    /// Copy of the current reading.
    pub async fn current(&self) -> SensorReading {
        self.reading.read().await.clone()
    }

    /// Generate a fresh reading and store it.
    pub async fn refresh(&self) {
        let (low, high) = bounds(&self.config);
        let next = SensorReading {
            name: self.config.name.clone(),
            value: rand::random_range(low..=high),
            timestamp: Utc::now().to_rfc3339(),
        };
        *self.reading.write().await = next;
    }

    /// Spawn the refresh loop. The first refresh happens immediately.
    pub fn start(self) -> SensorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reading = self.reading();
        let task = tokio::spawn(self.run(shutdown_rx));
        SensorHandle {
            shutdown: shutdown_tx,
            task,
            reading,
        }
    }

    async fn run(self, mut cancel: watch::Receiver<bool>) {
        let period = Duration::from_millis(self.config.interval_ms.max(1));
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            name = %self.config.name,
            interval_ms = self.config.interval_ms,
            "Sensor feed started"
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                    tracing::trace!("Sensor reading refreshed");
                }
            }
        }

        tracing::info!(name = %self.config.name, "Sensor feed stopped");
    }
}

/// Tolerate a misconfigured range instead of panicking in the generator.
fn bounds(config: &SensorConfig) -> (u32, u32) {
    if config.min_value <= config.max_value {
        (config.min_value, config.max_value)
    } else {
        (config.max_value, config.min_value)
    }
}

/// Running sensor feed.
#[derive(Debug)]
pub struct SensorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    reading: Arc<RwLock<SensorReading>>,
}

impl SensorHandle {
    /// Shared handle on the reading.
    pub fn reading(&self) -> Arc<RwLock<SensorReading>> {
        Arc::clone(&self.reading)
    }

    /// Signal the loop to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Sensor feed task ended abnormally");
        }
    }
}
