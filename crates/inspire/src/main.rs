use std::sync::Arc;

use inspire_core::{
    config::Config,
    dispatcher::Dispatcher,
    domain::UserId,
    schema::CommandSchema,
    store::{DocumentStore, JsonFileStore},
    users::UserRegistry,
};

#[tokio::main]
async fn main() -> Result<(), inspire_core::Error> {
    inspire_core::logging::init("inspire")?;

    let cfg = Arc::new(Config::load()?);
    let schema = Arc::new(CommandSchema::load(&cfg.command_schema_path)?);
    let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::open(&cfg.data_dir)?);

    let users = UserRegistry::new(store.clone());
    for &id in &cfg.admin_users {
        users.ensure_admin(UserId(id)).await?;
    }
    tracing::info!(admins = cfg.admin_users.len(), "admin users seeded");

    let dispatcher = Arc::new(Dispatcher::new(schema, store));

    inspire_telegram::router::run_polling(cfg, dispatcher)
        .await
        .map_err(|e| inspire_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
