use serde::{Deserialize, Serialize};
use std::fmt;

// Fields every lifecycle callback from the media server carries. Missing
// fields decode as empty strings; extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct CommonRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub vhost: String,
    #[serde(default)]
    pub app: String,
}

impl fmt::Display for CommonRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action={}, client_id={}, ip={}, vhost={}",
            self.action, self.client_id, self.ip, self.vhost
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    #[serde(flatten)]
    pub common: CommonRequest,
    #[serde(default)]
    pub stream: String,
    #[serde(default)]
    pub param: String,
}

impl StreamRequest {
    pub fn is_publish(&self) -> bool {
        self.common.action == "on_publish"
    }

    pub fn is_unpublish(&self) -> bool {
        self.common.action == "on_unpublish"
    }
}

impl fmt::Display for StreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.common)?;
        // Stream coordinates are only meaningful for recognized actions.
        if self.is_publish() || self.is_unpublish() {
            write!(f, ", stream={}, param={}", self.stream, self.param)?;
        }
        Ok(())
    }
}

// Acknowledgement envelope the media server keys its accept/reject on.
// code 0 means success; data stays null on the current success path.
#[derive(Debug, Serialize)]
pub struct CommonResponse {
    pub code: i32,
    pub data: Option<serde_json::Value>,
}
