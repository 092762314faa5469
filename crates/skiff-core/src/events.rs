//! Browser-wide notifications for the UI layer

use serde::{Deserialize, Serialize};
use skiff_privacy::DataCategory;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BrowserEvent {
    /// The tab tray entered or left edit mode
    SwitchEditMode(bool),
    PrivateDataCleared(Vec<DataCategory>),
    TabsRestored { count: usize },
}

pub struct EventBus {
    sender: broadcast::Sender<BrowserEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrowserEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event
    pub fn publish(&self, event: BrowserEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "No subscribers for event");
                0
            }
        }
    }
}
