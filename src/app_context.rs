use std::sync::Arc;

use crate::{
    config::Config,
    detector::{ActivePublisher, Detector},
};

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub detector: Arc<Detector<ActivePublisher>>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let publisher = ActivePublisher::from_config(&config.publisher);
        let detector = Arc::new(Detector::from_config(&config, publisher));
        Self { config, detector }
    }
}
