use serde::{Deserialize, Serialize};

/// Event name that marks a user as upgraded.
pub const USER_UPGRADED: &str = "user.upgraded";

/// Payment-provider webhook body.
///
/// The event name stays a plain string so unknown events still decode and can
/// be acknowledged without effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: u64,
}

impl WebhookEvent {
    pub fn is_user_upgraded(&self) -> bool {
        self.event == USER_UPGRADED
    }
}
