use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    middleware::rate_limit::RateLimiter,
    realtime::hub::RoomHub,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub hub: Arc<RoomHub>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);
        Self {
            orm,
            config: Arc::new(config),
            hub: Arc::new(RoomHub::new()),
            limiter: Arc::new(limiter),
        }
    }
}
