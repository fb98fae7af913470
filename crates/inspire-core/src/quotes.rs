use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    commands::CommandContext,
    domain::UserId,
    formatting::literal_block,
    schema::MessageKey,
    store::{from_document, to_document, DocumentStore, Lookup, QUOTES},
    Result,
};

/// Reply when there is nothing to sample.
pub const NO_QUOTES: &str = "There are no documents stored, try storing some : )";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_text: String,
    pub quote_author: String,
    pub time_quoted: DateTime<Utc>,
    pub inserted_by: UserId,
}

impl QuoteRecord {
    pub fn render(&self) -> String {
        literal_block([
            format!("\"{}\"", self.quote_text),
            format!("    - {}", self.quote_author),
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteInsert {
    Inserted,
    Duplicate,
}

/// The `quotes` collection. Quote text is unique, compared exactly.
#[derive(Clone)]
pub struct QuoteStore {
    store: Arc<dyn DocumentStore>,
}

impl QuoteStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, quote_text: &str) -> Result<Option<QuoteRecord>> {
        self.store
            .find_one(QUOTES, &Lookup::field("quote_text", quote_text))
            .await?
            .map(from_document::<QuoteRecord>)
            .transpose()
    }

    /// Insert unless the exact text is already stored.
    ///
    /// The existence check and the insert are separate store calls.
    pub async fn add(
        &self,
        quote_text: &str,
        quote_author: &str,
        inserted_by: UserId,
    ) -> Result<QuoteInsert> {
        if self.find(quote_text).await?.is_some() {
            return Ok(QuoteInsert::Duplicate);
        }
        let record = QuoteRecord {
            quote_text: quote_text.to_string(),
            quote_author: quote_author.to_string(),
            time_quoted: Utc::now(),
            inserted_by,
        };
        self.store.insert(QUOTES, to_document(&record)?).await?;
        Ok(QuoteInsert::Inserted)
    }

    pub async fn random(&self) -> Result<Option<QuoteRecord>> {
        self.store
            .find_random(QUOTES)
            .await?
            .map(from_document::<QuoteRecord>)
            .transpose()
    }
}

/// `quote "text" "author"`: store a quote. Moderators and admins only.
pub async fn add_quote(
    ctx: &CommandContext<'_>,
    requester: UserId,
    tokens: &[String],
) -> Result<Option<String>> {
    match ctx.is_authorized(requester).await {
        Ok(true) => {}
        Ok(false) => return Ok(ctx.reply(MessageKey::NoPrivileges)),
        Err(e) => {
            warn!(user_id = requester.0, error = %e, "privilege lookup failed");
            return Ok(ctx.reply(MessageKey::FailedQuote));
        }
    }

    let args = tokens.get(1..).unwrap_or_default();
    let [quote_text, quote_author, ..] = args else {
        return Ok(ctx.reply(MessageKey::FailedQuote));
    };
    if let Some(max) = ctx.spec.max_arguments {
        if args.len() > max {
            return Ok(ctx.reply(MessageKey::TooManyParameters));
        }
    }

    match ctx.quotes.add(quote_text, quote_author, requester).await {
        Ok(QuoteInsert::Inserted) => {
            info!(user_id = requester.0, author = %quote_author, "quote stored");
            Ok(ctx.reply(MessageKey::SuccessfulQuoteInsert))
        }
        Ok(QuoteInsert::Duplicate) => Ok(ctx.reply(MessageKey::AlreadyQuoted)),
        Err(e) => {
            warn!(user_id = requester.0, error = %e, "failed to store quote");
            Ok(ctx.reply(MessageKey::FailedQuote))
        }
    }
}

/// Sample one quote, or the fixed fallback when none are stored.
pub async fn random_quote(quotes: &QuoteStore) -> Result<String> {
    Ok(quotes
        .random()
        .await?
        .map(|q| q.render())
        .unwrap_or_else(|| NO_QUOTES.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::CommandKind,
        schema::tests::sample,
        store::{testing::FaultyStore, MemoryStore},
        users::UserRegistry,
    };

    fn quotes() -> (Arc<MemoryStore>, QuoteStore) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), QuoteStore::new(store))
    }

    #[tokio::test]
    async fn duplicate_text_is_never_stored_twice() {
        let (store, quotes) = quotes();
        assert_eq!(
            quotes.add("live fast", "nietzsche", UserId(1)).await.unwrap(),
            QuoteInsert::Inserted
        );
        assert_eq!(
            quotes.add("live fast", "someone else", UserId(2)).await.unwrap(),
            QuoteInsert::Duplicate
        );
        assert_eq!(store.len(QUOTES).await, 1);
    }

    #[tokio::test]
    async fn duplicate_check_is_case_sensitive() {
        let (store, quotes) = quotes();
        quotes.add("live fast", "a", UserId(1)).await.unwrap();
        quotes.add("Live fast", "a", UserId(1)).await.unwrap();
        assert_eq!(store.len(QUOTES).await, 2);
    }

    #[tokio::test]
    async fn empty_collection_falls_back() {
        let (_store, quotes) = quotes();
        assert_eq!(random_quote(&quotes).await.unwrap(), NO_QUOTES);
    }

    #[tokio::test]
    async fn only_quote_round_trips() {
        let (_store, quotes) = quotes();
        quotes.add("live fast", "nietzsche", UserId(1)).await.unwrap();

        let rendered = random_quote(&quotes).await.unwrap();
        assert!(rendered.contains("\"live fast\""));
        assert!(rendered.contains("nietzsche"));
        assert!(rendered.starts_with("```"));

        let stored = quotes.random().await.unwrap().unwrap();
        assert_eq!(stored.inserted_by, UserId(1));
    }

    #[tokio::test]
    async fn privilege_lookup_failure_is_a_failed_quote() {
        let schema = sample();
        let users = UserRegistry::new(Arc::new(FaultyStore::failing(&["find_one"])));
        let (store, quotes) = quotes();
        let ctx = CommandContext {
            schema: &schema,
            users: &users,
            quotes: &quotes,
            kind: CommandKind::AddQuote,
            spec: schema.command("quote").unwrap(),
        };

        let tokens = ["quote", "live fast", "nietzsche"].map(String::from);
        assert_eq!(
            add_quote(&ctx, UserId(2), &tokens).await.unwrap(),
            Some(schema.message(MessageKey::FailedQuote))
        );
        assert_eq!(store.len(QUOTES).await, 0);
    }
}
