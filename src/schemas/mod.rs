use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod admin;
pub(crate) mod ai;
pub(crate) mod exam;
pub(crate) mod speaking;
pub(crate) mod user;
pub(crate) mod writing;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}
