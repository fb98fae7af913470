use std::sync::Arc;

use teloxide::{dispatching::Dispatcher as UpdateDispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use inspire_core::{config::Config, dispatcher::Dispatcher, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
    pub dispatch_lock: Arc<DispatchLock>,
}

/// Serializes command handling across all chats.
///
/// Store updates such as "find user, then write" are not atomic, so only one
/// command may be in flight at a time.
#[derive(Default)]
pub struct DispatchLock {
    inner: Mutex<()>,
}

impl DispatchLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

pub async fn run_polling(cfg: Arc<Config>, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "inspire started"),
        Err(e) => warn!(error = %e, "get_me failed"),
    }
    info!(
        prefix = dispatcher.schema().prefix(),
        commands = dispatcher.schema().commands().len(),
        data_dir = %cfg.data_dir.display(),
        "serving commands"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_message_limit,
    ));

    let state = Arc::new(AppState {
        dispatcher,
        messenger,
        dispatch_lock: Arc::new(DispatchLock::default()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    UpdateDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn dispatch_lock_is_exclusive() {
        let lock = Arc::new(DispatchLock::default());
        let guard = lock.acquire().await;

        let other = lock.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire().await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }
}
