use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use tdlib::enums::{AuthorizationState, MessageContent, OptionValue, Update};
use tdlib::functions;
use tdlib::types::{
    Message, OptionValueString, UpdateAuthorizationState, UpdateConnectionState,
    UpdateMessageSendFailed, UpdateMessageSendSucceeded, UpdateNewMessage, UpdateOption,
};
use tokio::signal;
use tokio::task::JoinHandle;

use crate::apis::huggingface::HuggingFaceClient;
use crate::relay::Relay;
use crate::utilities::config::Config;
use crate::utilities::message_queue::MessageQueue;
use crate::utilities::telegram_chat::TelegramChat;
use crate::utilities::transient_store::TransientStore;

pub type TdError = tdlib::types::Error;
pub type TdResult<T> = Result<T, TdError>;

#[derive(Clone, Copy)]
enum BotStatus {
    Running,
    WaitingToClose,
    Closing,
    Closed,
}

pub struct Bot {
    client_id: i32,
    config: Config,
    status: Arc<Mutex<BotStatus>>,
    message_queue: Arc<MessageQueue>,
    relay: Arc<Relay>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bot {
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let client_id = tdlib::create_client();
        let message_queue = Arc::new(MessageQueue::default());

        let mut http_client = Client::builder();

        if let Some(user_agent) = &config.user_agent {
            http_client = http_client.user_agent(user_agent);
        }

        if let Some(timeout) = config.provider_timeout {
            http_client = http_client.timeout(timeout);
        }

        let relay = Relay::new(
            Arc::new(TelegramChat::new(client_id, message_queue.clone())),
            Arc::new(HuggingFaceClient::new(
                http_client.build()?,
                config.provider_url.clone(),
                config.provider_api_key.clone(),
            )),
            TransientStore::new(config.image_dir.clone()),
        );

        Ok(Self {
            client_id,
            config,
            status: Arc::new(Mutex::new(BotStatus::Closed)),
            message_queue,
            relay: Arc::new(relay),
            tasks: Vec::new(),
        })
    }

    pub async fn run(&mut self) {
        self.set_status(BotStatus::Running);
        let client_id = self.client_id;
        self.run_task(async move {
            if let Err(err) = functions::set_log_verbosity_level(1, client_id).await {
                log::warn!("failed to set TDLib log verbosity: {}", err.message);
            }
        });

        let status = self.status.clone();
        self.run_task(async move {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("failed to listen for Ctrl+C: {err}");
                return;
            }
            log::warn!("Ctrl+C received");
            *status.lock().unwrap_or_else(PoisonError::into_inner) = BotStatus::WaitingToClose;
        });

        let mut last_task_count = 0;
        loop {
            if let Some((update, _)) = tdlib::receive() {
                self.on_update(update);
            }
            self.tasks.retain(|t| !t.is_finished());
            match self.status() {
                BotStatus::WaitingToClose => {
                    if self.tasks.is_empty() {
                        self.close();
                    } else {
                        let task_count = self.tasks.len();
                        if task_count != last_task_count {
                            log::info!("waiting for {task_count} task(s) to finish…");
                            last_task_count = task_count;
                        }
                    }
                }
                BotStatus::Closed => break,
                BotStatus::Running | BotStatus::Closing => (),
            }
        }
    }

    fn status(&self) -> BotStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: BotStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn close(&mut self) {
        self.set_status(BotStatus::Closing);
        let client_id = self.client_id;
        self.run_task(async move {
            if let Err(err) = functions::close(client_id).await {
                log::error!("failed to close TDLib: {}: {}", err.code, err.message);
            }
        });
    }

    fn run_task<T: Future<Output = ()> + Send + 'static>(&mut self, future: T) {
        self.tasks.push(tokio::spawn(future));
    }

    fn on_update(&mut self, update: Update) {
        match update {
            Update::AuthorizationState(update) => self.on_authorization_state(update),
            Update::NewMessage(update) => self.on_new_message(update),
            Update::MessageSendSucceeded(update) => self.on_message_send_succeeded(update),
            Update::MessageSendFailed(update) => self.on_message_send_failed(update),
            Update::Option(update) => Self::on_option(update),
            Update::ConnectionState(update) => Self::on_connection_state(&update),
            _ => (),
        }
    }

    fn on_authorization_state(&mut self, update: UpdateAuthorizationState) {
        let authorization_state = update.authorization_state;
        log::info!("authorization: {authorization_state:?}");
        match authorization_state {
            AuthorizationState::WaitTdlibParameters => {
                let client_id = self.client_id;
                let api_id = self.config.api_id.parse().unwrap_or_else(|err| {
                    log::error!("API_ID is not a number: {err}");
                    0
                });
                let api_hash = self.config.api_hash.clone();
                let db_encryption_key = self.config.db_encryption_key.clone();
                self.run_task(async move {
                    if let Err(err) = functions::set_tdlib_parameters(
                        false,
                        ".data".into(),
                        String::new(),
                        db_encryption_key,
                        true,
                        true,
                        false,
                        false,
                        api_id,
                        api_hash,
                        "en".into(),
                        env!("CARGO_PKG_NAME").into(),
                        String::new(),
                        env!("CARGO_PKG_VERSION").into(),
                        true,
                        true,
                        client_id,
                    )
                    .await
                    {
                        log::error!("failed to set TDLib parameters: {}: {}", err.code, err.message);
                    }
                });
            }
            AuthorizationState::WaitPhoneNumber => {
                let client_id = self.client_id;
                let token = self.config.telegram_token.clone();
                self.run_task(async move {
                    if let Err(err) = functions::check_authentication_bot_token(token, client_id).await
                    {
                        log::error!("bot token was rejected: {}: {}", err.code, err.message);
                    }
                });
            }
            AuthorizationState::Closed => self.set_status(BotStatus::Closed),
            _ => (),
        }
    }

    fn on_new_message(&mut self, update: UpdateNewMessage) {
        let Some((chat_id, prompt)) = prompt(update.message) else {
            return;
        };

        let relay = self.relay.clone();
        self.run_task(async move { relay.handle_message(chat_id, prompt).await });
    }

    fn on_message_send_succeeded(&mut self, update: UpdateMessageSendSucceeded) {
        self.message_queue.message_sent(Ok(update));
    }

    fn on_message_send_failed(&mut self, update: UpdateMessageSendFailed) {
        self.message_queue.message_sent(Err(update));
    }

    fn on_option(update: UpdateOption) {
        if update.name == "version" {
            if let OptionValue::String(OptionValueString { value }) = update.value {
                log::info!("running on TDLib {value}");
            }
        }
    }

    fn on_connection_state(update: &UpdateConnectionState) {
        log::info!("connection: {:?}", update.state);
    }
}

/// The chat and prompt of a message worth relaying.
fn prompt(message: Message) -> Option<(i64, String)> {
    incoming_text(message.is_outgoing, message.content).map(|text| (message.chat_id, text))
}

fn incoming_text(is_outgoing: bool, content: MessageContent) -> Option<String> {
    if is_outgoing {
        return None; // ignore our own messages
    }
    let MessageContent::MessageText(content) = content else {
        return None; // ignore messages without text
    };

    Some(content.text.text)
}
