use super::super::publisher::AlarmPublisher;
use super::pipeline::Detector;

#[derive(Debug, Default)]
pub(crate) struct DetectorCounters {
    pub(crate) readings_seen: u64,
    pub(crate) alarms_published: u64,
    pub(crate) alarms_suppressed: u64,
    pub(crate) malformed_readings: u64,
}

/// Read-only view of detector state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorSnapshot {
    pub devices: usize,
    pub readings_seen: u64,
    pub alarms_published: u64,
    pub alarms_suppressed: u64,
    pub malformed_readings: u64,
}

impl<P: AlarmPublisher> Detector<P> {
    pub async fn snapshot(&self) -> DetectorSnapshot {
        let devices = self.history.device_count().await;
        let counters = self.counters.lock().await;
        DetectorSnapshot {
            devices,
            readings_seen: counters.readings_seen,
            alarms_published: counters.alarms_published,
            alarms_suppressed: counters.alarms_suppressed,
            malformed_readings: counters.malformed_readings,
        }
    }
}
