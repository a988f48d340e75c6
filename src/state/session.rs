//! Selection and chat state for the page session
//!
//! `PickerSession` owns the two collections the picker works with: the
//! ordered product selection (persisted after every change) and the chat
//! transcript of the current routine session (kept in memory only). It also
//! remembers the current category filter and the products rendered for it,
//! which is where newly selected records are taken from.
//!
//! Only one completion request may be outstanding at a time. A request takes
//! a [`CompletionTicket`] under the session lock, calls the endpoint with the
//! lock released, then hands the ticket back through
//! [`PickerSession::finish_completion`].

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::{filter_by_category, Product, ProductId};
use crate::config::prompts::{builtin, routine_request};
use crate::conversation::{Message, Transcript};
use crate::providers::{CompletionClient, CompletionError};

use super::store::SelectionStore;

pub type SharedSession = Arc<Mutex<PickerSession>>;

/// Errors from session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No products selected")]
    EmptySelection,

    #[error("Message is empty")]
    EmptyInput,

    #[error("A response is already being generated")]
    Busy,

    #[error("Unknown product: {0}")]
    UnknownProduct(String),
}

/// Permission to run one completion request against a transcript snapshot
#[derive(Debug)]
pub struct CompletionTicket {
    messages: Vec<Message>,
}

impl CompletionTicket {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Result of a completion request
#[derive(Debug)]
pub enum CompletionOutcome {
    /// The reply was appended to the transcript
    Replied(String),
    /// Nothing was appended
    Failed(CompletionError),
}

pub struct PickerSession {
    id: Uuid,
    store: Arc<SelectionStore>,
    selection: Vec<Arc<Product>>,
    transcript: Transcript,
    category: String,
    visible: Vec<Arc<Product>>,
    in_flight: bool,
}

impl PickerSession {
    /// Start a session with the selection restored from `store`.
    pub async fn restore(store: Arc<SelectionStore>) -> Self {
        let selection = store.load_selection().await;
        let id = Uuid::new_v4();
        tracing::info!(session = %id, restored = selection.len(), "Picker session started");

        Self {
            id,
            store,
            selection,
            transcript: Transcript::new(),
            category: String::new(),
            visible: Vec::new(),
            in_flight: false,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    // ========== Catalog view ==========

    /// Record a new category filter and the products it shows.
    pub fn show_category(&mut self, category: &str, catalog: &[Arc<Product>]) {
        self.category = category.to_string();
        self.visible = filter_by_category(catalog, category);
        tracing::debug!(category, shown = self.visible.len(), "Category filter applied");
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn visible_products(&self) -> &[Arc<Product>] {
        &self.visible
    }

    // ========== Selection ==========

    pub fn selection(&self) -> &[Arc<Product>] {
        &self.selection
    }

    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.selection.iter().any(|p| &p.id == id)
    }

    /// Remove the product if selected, otherwise append the rendered record.
    pub async fn toggle_selection(&mut self, product_id: &str) -> Result<(), SessionError> {
        if let Some(index) = self.selection.iter().position(|p| p.id.matches(product_id)) {
            self.selection.remove(index);
        } else {
            let product = self
                .visible
                .iter()
                .find(|p| p.id.matches(product_id))
                .cloned()
                .ok_or_else(|| SessionError::UnknownProduct(product_id.to_string()))?;
            self.selection.push(product);
        }

        tracing::debug!(product_id, selected = self.selection.len(), "Selection toggled");
        self.persist().await;
        Ok(())
    }

    /// Remove the product if selected.
    pub async fn remove_selection(&mut self, product_id: &str) {
        let before = self.selection.len();
        self.selection.retain(|p| !p.id.matches(product_id));
        if self.selection.len() != before {
            tracing::debug!(product_id, selected = self.selection.len(), "Selection removed");
        }
        self.persist().await;
    }

    pub async fn clear_selection(&mut self) {
        self.selection.clear();
        tracing::debug!("Selection cleared");
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save_selection(&self.selection).await {
            tracing::warn!(session = %self.id, "Failed to save selection: {}", e);
        }
    }

    // ========== Transcript ==========

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight
    }

    /// Reset the transcript to the opening turns of a routine request for
    /// the current selection.
    pub fn begin_routine_session(&mut self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        self.transcript.reset(vec![
            Message::system(builtin::BEAUTY_ADVISOR),
            Message::user(routine_request(&self.selection)),
        ]);
        tracing::debug!(products = self.selection.len(), "Routine session started");
        Ok(())
    }

    /// Append a follow-up question.
    pub fn append_user_turn(&mut self, text: &str) -> Result<&Transcript, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.in_flight {
            return Err(SessionError::Busy);
        }

        self.transcript.push(Message::user(text));
        Ok(&self.transcript)
    }

    /// Claim the in-flight slot and snapshot the transcript to send.
    pub fn begin_completion(&mut self) -> Result<CompletionTicket, SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.in_flight = true;

        Ok(CompletionTicket {
            messages: self.transcript.messages().to_vec(),
        })
    }

    /// Release the in-flight slot and record the reply, if there is one.
    pub fn finish_completion(
        &mut self,
        _ticket: CompletionTicket,
        result: Result<String, CompletionError>,
    ) -> CompletionOutcome {
        self.in_flight = false;

        match result {
            Ok(reply) => {
                self.transcript.push(Message::assistant(reply.clone()));
                tracing::debug!(turns = self.transcript.len(), "Assistant reply appended");
                CompletionOutcome::Replied(reply)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, "Completion failed: {}", e);
                CompletionOutcome::Failed(e)
            }
        }
    }
}

/// Send the ticket's transcript to `client` and record the result.
///
/// The call runs on its own task so that a dropped HTTP request cannot leave
/// the in-flight slot taken.
pub async fn request_completion(
    session: &SharedSession,
    client: Arc<dyn CompletionClient>,
    ticket: CompletionTicket,
) -> CompletionOutcome {
    let task_session = Arc::clone(session);
    let handle = tokio::spawn(async move {
        let result = client.complete(ticket.messages()).await;
        task_session.lock().await.finish_completion(ticket, result)
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Completion task failed: {}", e);
            session.lock().await.in_flight = false;
            CompletionOutcome::Failed(CompletionError::Malformed(format!(
                "completion task failed: {}",
                e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    /// Replies with fixed text, or fails when `reply` is `None`.
    struct ScriptedClient {
        reply: Option<String>,
        calls: AtomicUsize,
        release: Option<Arc<Notify>>,
    }

    impl ScriptedClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
                release: None,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
                release: None,
            })
        }

        fn gated(text: &str, release: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
                release: Some(release),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(release) = &self.release {
                release.notified().await;
            }
            self.reply
                .clone()
                .ok_or_else(|| CompletionError::Malformed("no choices".into()))
        }
    }

    fn product(id: i64, category: &str) -> Arc<Product> {
        Arc::new(Product {
            id: ProductId::Number(id),
            name: format!("Product {}", id),
            brand: "Brand".into(),
            category: category.into(),
            image: String::new(),
            description: "First. Second. Third.".into(),
        })
    }

    fn catalog() -> Vec<Arc<Product>> {
        vec![
            product(1, "skincare"),
            product(2, "skincare"),
            product(3, "skincare"),
            product(4, "makeup"),
        ]
    }

    async fn session() -> (PickerSession, Arc<SelectionStore>) {
        let store = Arc::new(SelectionStore::new_in_memory_async().await.unwrap());
        let mut session = PickerSession::restore(Arc::clone(&store)).await;
        session.show_category("skincare", &catalog());
        (session, store)
    }

    fn ids(session: &PickerSession) -> Vec<String> {
        session.selection().iter().map(|p| p.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_toggle_keeps_odd_counts_in_first_toggle_order() {
        let (mut session, _) = session().await;

        // 2 once, 1 three times, 3 three times
        for id in ["2", "1", "3", "1", "3", "1", "3"] {
            assert_ok!(session.toggle_selection(id).await);
        }

        // 3 was dropped and re-added, so it now sits after 1
        assert_eq!(ids(&session), vec!["2", "1", "3"]);
        assert!(session.is_selected(&ProductId::Number(1)));
        assert!(!session.is_selected(&ProductId::Number(4)));
    }

    #[tokio::test]
    async fn test_toggle_shares_rendered_record() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        assert!(Arc::ptr_eq(&session.selection()[0], &session.visible_products()[0]));
    }

    #[tokio::test]
    async fn test_toggle_unknown_product_rejected() {
        let (mut session, store) = session().await;

        // Product 4 exists but is not in the rendered category
        let err = session.toggle_selection("4").await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownProduct(ref id) if id == "4"));
        assert!(session.selection().is_empty());
        assert!(store.get(crate::state::store::SELECTION_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_selected_product_can_be_toggled_off_from_another_category() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();

        session.show_category("makeup", &catalog());
        session.toggle_selection("1").await.unwrap();

        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let (mut session, store) = session().await;

        session.toggle_selection("2").await.unwrap();
        session.toggle_selection("1").await.unwrap();
        let restored = PickerSession::restore(Arc::clone(&store)).await;
        assert_eq!(ids(&restored), vec!["2", "1"]);

        session.remove_selection("2").await;
        let restored = PickerSession::restore(Arc::clone(&store)).await;
        assert_eq!(ids(&restored), vec!["1"]);

        session.clear_selection().await;
        let restored = PickerSession::restore(Arc::clone(&store)).await;
        assert!(restored.selection().is_empty());
    }

    #[tokio::test]
    async fn test_restored_repeats_collapse_so_one_toggle_deselects() {
        let store = Arc::new(SelectionStore::new_in_memory_async().await.unwrap());
        store
            .set(crate::state::store::SELECTION_KEY, r#"[{"id":1},{"id":1}]"#)
            .await
            .unwrap();

        let mut session = PickerSession::restore(Arc::clone(&store)).await;
        assert_eq!(ids(&session), vec!["1"]);

        session.toggle_selection("1").await.unwrap();
        assert!(!session.is_selected(&ProductId::Number(1)));
        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        session.remove_selection("99").await;
        assert_eq!(ids(&session), vec!["1"]);
    }

    #[tokio::test]
    async fn test_begin_routine_session_requires_selection() {
        let (mut session, _) = session().await;
        session.transcript.push(Message::user("earlier"));

        assert!(matches!(
            session.begin_routine_session(),
            Err(SessionError::EmptySelection)
        ));
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_begin_routine_session_seeds_two_turns() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        session.toggle_selection("3").await.unwrap();
        session.transcript.push(Message::user("stale follow-up"));

        assert_ok!(session.begin_routine_session());

        let turns = session.transcript().messages();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, builtin::BEAUTY_ADVISOR);
        assert_eq!(turns[1].role, Role::User);
        assert!(turns[1].content.contains("Product 1"));
        assert!(turns[1].content.contains("Product 3"));
        assert!(turns[1].content.contains("First. Second."));
        assert!(!turns[1].content.contains("Third."));
    }

    #[tokio::test]
    async fn test_append_user_turn_ignores_blank_input() {
        let (mut session, _) = session().await;

        assert!(matches!(
            session.append_user_turn("   \n\t"),
            Err(SessionError::EmptyInput)
        ));
        assert!(session.transcript().is_empty());

        let transcript = session.append_user_turn("  Is this okay at night?  ").unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, "Is this okay at night?");
    }

    #[tokio::test]
    async fn test_successful_completion_appends_one_turn() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        session.begin_routine_session().unwrap();
        let ticket = session.begin_completion().unwrap();
        assert_eq!(ticket.messages().len(), 2);

        let shared = session.into_shared();
        let client = ScriptedClient::replying("Morning: cleanse.");
        let outcome = request_completion(&shared, client.clone(), ticket).await;

        assert!(matches!(outcome, CompletionOutcome::Replied(ref r) if r == "Morning: cleanse."));
        let session = shared.lock().await;
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript().messages()[2], Message::assistant("Morning: cleanse."));
        assert!(!session.is_generating());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_completion_leaves_transcript_unchanged() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        session.begin_routine_session().unwrap();
        session.append_user_turn("What about SPF?").unwrap();
        let ticket = session.begin_completion().unwrap();

        let shared = session.into_shared();
        let outcome = request_completion(&shared, ScriptedClient::failing(), ticket).await;

        assert!(matches!(outcome, CompletionOutcome::Failed(_)));
        let session = shared.lock().await;
        assert_eq!(session.transcript().len(), 3);
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn test_second_request_rejected_while_in_flight() {
        let (mut session, _) = session().await;
        session.toggle_selection("1").await.unwrap();
        session.begin_routine_session().unwrap();
        let ticket = session.begin_completion().unwrap();

        let shared = session.into_shared();
        let release = Arc::new(Notify::new());
        let client = ScriptedClient::gated("Routine", Arc::clone(&release));

        let pending = {
            let shared = Arc::clone(&shared);
            let client = client.clone();
            tokio::spawn(async move { request_completion(&shared, client, ticket).await })
        };

        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        {
            let mut session = shared.lock().await;
            assert!(session.is_generating());
            assert!(matches!(session.begin_routine_session(), Err(SessionError::Busy)));
            assert!(matches!(session.append_user_turn("again?"), Err(SessionError::Busy)));
            assert_err!(session.begin_completion());
            assert_eq!(session.transcript().len(), 2);
        }

        release.notify_one();
        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, CompletionOutcome::Replied(_)));

        let mut session = shared.lock().await;
        assert!(!session.is_generating());
        assert_ok!(session.begin_completion());
    }
}
