use std::io::BufReader;

use tokio::task::JoinHandle;

use crate::app_context::AppContext;

mod ingest;

pub use ingest::{
    DeviceDispatcher, EnvelopeError, IncomingReading, decode_line, device_id_from_topic,
    ingest_lines, spawn_line_reader,
};

/// Reads envelopes from stdin until EOF or Ctrl-C, then drains the device workers.
pub fn start_ingest_job(app_context: AppContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut dispatcher = DeviceDispatcher::new(
            app_context.detector.clone(),
            app_context.config.ingest.worker_queue,
        );
        let prefix = app_context.config.ingest.topic_prefix.clone();

        match spawn_line_reader(
            BufReader::new(std::io::stdin()),
            app_context.config.ingest.worker_queue,
        ) {
            Ok(lines) => {
                tokio::select! {
                    accepted = ingest_lines(lines, &prefix, &mut dispatcher) => {
                        log::info!("ingest_eof accepted={}", accepted)
                    }
                    _ = tokio::signal::ctrl_c() => log::info!("ingest_interrupted"),
                }
            }
            Err(error) => log::error!("ingest_reader_spawn_failed error={}", error),
        }

        dispatcher.shutdown().await;

        let snapshot = app_context.detector.snapshot().await;
        log::info!(
            "detector_stopped devices={} readings={} published={} suppressed={} malformed={}",
            snapshot.devices,
            snapshot.readings_seen,
            snapshot.alarms_published,
            snapshot.alarms_suppressed,
            snapshot.malformed_readings
        );
    })
}
