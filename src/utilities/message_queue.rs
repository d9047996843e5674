use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tdlib::types::{UpdateMessageSendFailed, UpdateMessageSendSucceeded};

use crate::bot::{TdError, TdResult};

/// Results nobody picked up are dropped after this long.
const UNCLAIMED_TTL: Duration = Duration::from_secs(600);

enum Entry {
    Waiting(oneshot::Sender<TdResult<i64>>),
    Done(TdResult<i64>, Instant),
}

/// Routes TDLib's send results back to the task that sent the message.
///
/// Messages are delivered in the background; the temporary message returned
/// by `send_message` only becomes final once TDLib reports a success or
/// failure for its id. That report may arrive before the sender starts
/// waiting, in which case it is kept until claimed.
#[derive(Default)]
pub struct MessageQueue {
    queue: Mutex<HashMap<i64, Entry>>,
}

impl MessageQueue {
    /// Waits for the final id of the message sent with the temporary `message_id`.
    pub async fn wait_for_message(&self, message_id: i64) -> TdResult<i64> {
        let rx = {
            let mut queue = self.lock();
            if let Some(Entry::Done(result, _)) = queue.remove(&message_id) {
                return result;
            }
            let (tx, rx) = oneshot::channel();
            queue.insert(message_id, Entry::Waiting(tx));
            rx
        };

        rx.await.unwrap_or_else(|_| {
            Err(TdError { code: 500, message: "message queue was dropped".into() })
        })
    }

    pub fn message_sent(
        &self,
        result: Result<UpdateMessageSendSucceeded, UpdateMessageSendFailed>,
    ) {
        let (old_message_id, result) = match result {
            Ok(update) => (update.old_message_id, Ok(update.message.id)),
            Err(update) => (
                update.old_message_id,
                Err(TdError { code: update.error_code, message: update.error_message }),
            ),
        };

        self.resolve(old_message_id, result);
    }

    fn resolve(&self, old_message_id: i64, result: TdResult<i64>) {
        let mut queue = self.lock();
        queue.retain(|_, entry| match entry {
            Entry::Waiting(_) => true,
            Entry::Done(_, at) => at.elapsed() < UNCLAIMED_TTL,
        });

        match queue.remove(&old_message_id) {
            Some(Entry::Waiting(tx)) => {
                if tx.send(result).is_err() {
                    log::debug!("nobody was waiting for message {old_message_id} anymore");
                }
            }
            Some(Entry::Done(..)) | None => {
                queue.insert(old_message_id, Entry::Done(result, Instant::now()));
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, Entry>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
