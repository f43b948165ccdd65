use std::sync::Arc;

use crate::capabilities::Capabilities;

pub type SharedCapabilities = Arc<dyn Capabilities>;

#[derive(Clone)]
pub struct AppState {
    pub caps: SharedCapabilities,
}

impl AppState {
    pub fn new(caps: SharedCapabilities) -> Self {
        Self { caps }
    }
}
