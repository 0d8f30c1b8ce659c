use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notification::Notifier;

/// Keeps every (title, body) it is asked to send.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) {
        self.messages
            .lock()
            .push((title.to_string(), body.to_string()));
    }
}
