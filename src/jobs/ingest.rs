use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::detector::{AlarmPublisher, Detector};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid reading envelope: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("topic {0} is not a device measurement topic")]
    Topic(String),
}

#[derive(Debug, Deserialize)]
struct ReadingEnvelope {
    topic: String,
    payload: Value,
}

#[derive(Debug, Clone)]
pub struct IncomingReading {
    pub device_id: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

/// `<prefix><device_id>/m/<group>` -> `device_id`.
pub fn device_id_from_topic<'a>(prefix: &str, topic: &'a str) -> Option<&'a str> {
    let rest = topic.strip_prefix(prefix)?;
    let mut segments = rest.split('/');
    let device_id = segments.next().filter(|segment| !segment.is_empty())?;
    match segments.next() {
        Some("m") => Some(device_id),
        _ => None,
    }
}

pub fn decode_line(
    prefix: &str,
    line: &str,
    received_at: DateTime<Utc>,
) -> Result<IncomingReading, EnvelopeError> {
    let envelope: ReadingEnvelope = serde_json::from_str(line)?;
    let device_id = device_id_from_topic(prefix, &envelope.topic)
        .ok_or_else(|| EnvelopeError::Topic(envelope.topic.clone()))?
        .to_string();

    Ok(IncomingReading {
        device_id,
        payload: envelope.payload,
        received_at,
    })
}

/// One bounded queue and worker task per device: a device's readings are
/// processed in arrival order, different devices run in parallel.
pub struct DeviceDispatcher<P> {
    detector: Arc<Detector<P>>,
    workers: HashMap<String, mpsc::Sender<IncomingReading>>,
    tasks: JoinSet<()>,
    queue_depth: usize,
}

impl<P: AlarmPublisher + 'static> DeviceDispatcher<P> {
    pub fn new(detector: Arc<Detector<P>>, queue_depth: usize) -> Self {
        Self {
            detector,
            workers: HashMap::new(),
            tasks: JoinSet::new(),
            queue_depth: queue_depth.max(1),
        }
    }

    pub async fn dispatch(&mut self, incoming: IncomingReading) {
        let sender = match self.workers.get(&incoming.device_id) {
            Some(sender) => sender.clone(),
            None => self.spawn_worker(&incoming.device_id),
        };

        let device_id = incoming.device_id.clone();
        if sender.send(incoming).await.is_err() {
            log::error!("device_worker_gone device_id={}", device_id);
            self.workers.remove(&device_id);
        }
    }

    fn spawn_worker(&mut self, device_id: &str) -> mpsc::Sender<IncomingReading> {
        let (sender, mut receiver) = mpsc::channel::<IncomingReading>(self.queue_depth);
        let detector = Arc::clone(&self.detector);

        self.tasks.spawn(async move {
            while let Some(incoming) = receiver.recv().await {
                // Malformed readings are already logged and counted by the detector.
                let _ = detector
                    .on_reading(&incoming.device_id, &incoming.payload, incoming.received_at)
                    .await;
            }
        });

        log::info!("device_worker_started device_id={}", device_id);
        self.workers.insert(device_id.to_string(), sender.clone());
        sender
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Closes every queue and waits for workers to drain.
    pub async fn shutdown(mut self) {
        self.workers.clear();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(error) = result {
                log::error!("device_worker_failed error={}", error);
            }
        }
    }
}

/// Reads lines on a dedicated OS thread and hands them over a bounded channel.
/// A read parked on an idle terminal then never holds up runtime shutdown.
pub fn spawn_line_reader<R>(reader: R, capacity: usize) -> std::io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(capacity.max(1));

    std::thread::Builder::new()
        .name("ingest-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if sender.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        log::error!("ingest_read_failed error={}", error);
                        break;
                    }
                }
            }
        })?;

    Ok(receiver)
}

/// Feeds newline-delimited envelopes to the dispatcher until the reader closes.
/// Bad lines are skipped.
pub async fn ingest_lines<P>(
    mut lines: mpsc::Receiver<String>,
    prefix: &str,
    dispatcher: &mut DeviceDispatcher<P>,
) -> u64
where
    P: AlarmPublisher + 'static,
{
    let mut accepted = 0;

    while let Some(line) = lines.recv().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match decode_line(prefix, line, Utc::now()) {
            Ok(incoming) => {
                dispatcher.dispatch(incoming).await;
                accepted += 1;
            }
            Err(error) => log::warn!("envelope_skipped reason={}", error),
        }
    }

    accepted
}
