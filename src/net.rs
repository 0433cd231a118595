use crate::Registry;
use std::sync::Arc;

pub mod api;
pub mod http;
pub mod output;
pub mod play;
pub mod sink;

#[derive(Clone)]
pub struct AppCtx {
    pub registry: Arc<Registry>,
}
