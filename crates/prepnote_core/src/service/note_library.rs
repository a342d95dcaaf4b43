//! Note library use-cases for the signed-in user.
//!
//! # Responsibility
//! - Gate every store call on an active user.
//! - Validate names and stamp records before they reach the store.
//! - Bridge editor sessions and saved records.
//!
//! # Invariants
//! - Without a signed-in user every operation fails with `Unauthenticated`
//!   and the store is never called.
//! - User-made records never carry format, theme or topic.

use crate::editor::session::EditorSession;
use crate::model::saved::{
    normalize_document_name, Collection, NoteMetadata, SavedDocument, UserId,
};
use crate::store::{NoteStore, StoreError, StoreResult};
use log::{info, warn};

/// Saved-note operations scoped to the active user.
pub struct NoteLibrary<S: NoteStore> {
    store: S,
    user: Option<UserId>,
}

impl<S: NoteStore> NoteLibrary<S> {
    /// Library with no user signed in.
    pub fn new(store: S) -> Self {
        Self { store, user: None }
    }

    pub fn with_user(store: S, user: UserId) -> Self {
        Self {
            store,
            user: Some(user),
        }
    }

    pub fn sign_in(&mut self, user: UserId) {
        info!("event=library_sign_in module=service status=ok user_id={user}");
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!("event=library_sign_out module=service status=ok user_id={user}");
        }
    }

    pub fn active_user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Saves `content` under `name`, overwriting any record with that name.
    ///
    /// # Errors
    /// - `Unauthenticated` without an active user.
    /// - `InvalidName` for blank, over-long or `/`-containing names.
    /// - `Write` when the store rejects the record.
    pub fn save(
        &self,
        collection: Collection,
        name: &str,
        content: impl Into<String>,
        metadata: NoteMetadata,
    ) -> StoreResult<SavedDocument> {
        let user = self.require_user("save")?;
        let name = self.checked_name("save", name)?;
        let metadata = match collection {
            Collection::UserMade => NoteMetadata::default(),
            Collection::AiNotes => metadata,
        };
        let document = SavedDocument::new(name, content, metadata);

        self.log_result(
            "save",
            collection,
            self.store.save(user, collection, &document),
        )?;
        info!(
            "event=note_save module=service status=ok collection={} name_len={} content_len={}",
            collection.as_str(),
            document.name.chars().count(),
            document.content.len()
        );
        Ok(document)
    }

    /// Saves the session's current document into the session's collection.
    pub fn save_session(
        &self,
        name: &str,
        session: &EditorSession,
        metadata: NoteMetadata,
    ) -> StoreResult<SavedDocument> {
        self.save(session.surface().collection(), name, session.to_html(), metadata)
    }

    /// Records in `collection`, newest first.
    pub fn list(&self, collection: Collection) -> StoreResult<Vec<SavedDocument>> {
        let user = self.require_user("list")?;
        let documents = self.log_result("list", collection, self.store.list(user, collection))?;
        info!(
            "event=note_list module=service status=ok collection={} count={}",
            collection.as_str(),
            documents.len()
        );
        Ok(documents)
    }

    pub fn load(&self, collection: Collection, name: &str) -> StoreResult<Option<SavedDocument>> {
        let user = self.require_user("load")?;
        let name = self.checked_name("load", name)?;
        self.log_result("load", collection, self.store.get(user, collection, &name))
    }

    /// Loads the named record into `session`, resetting its history.
    ///
    /// Returns `false` and leaves the session alone when no such record exists.
    pub fn open_in(
        &self,
        session: &mut EditorSession,
        name: &str,
    ) -> StoreResult<bool> {
        match self.load(session.surface().collection(), name)? {
            Some(document) => {
                session.load_html(&document.content);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes the named record; deleting a missing name succeeds.
    ///
    /// Returns whether a record was removed.
    pub fn delete(&self, collection: Collection, name: &str) -> StoreResult<bool> {
        let user = self.require_user("delete")?;
        let name = self.checked_name("delete", name)?;
        let removed =
            self.log_result("delete", collection, self.store.delete(user, collection, &name))?;
        info!(
            "event=note_delete module=service status=ok collection={} removed={}",
            collection.as_str(),
            removed
        );
        Ok(removed)
    }

    fn require_user(&self, op: &'static str) -> StoreResult<&UserId> {
        self.user.as_ref().ok_or_else(|| {
            warn!("event=note_{op} module=service status=error error_code=unauthenticated");
            StoreError::Unauthenticated
        })
    }

    fn checked_name(&self, op: &'static str, name: &str) -> StoreResult<String> {
        normalize_document_name(name).map_err(|err| {
            warn!("event=note_{op} module=service status=error error_code=invalid_name");
            StoreError::from(err)
        })
    }

    fn log_result<T>(
        &self,
        op: &'static str,
        collection: Collection,
        result: StoreResult<T>,
    ) -> StoreResult<T> {
        if let Err(err) = &result {
            warn!(
                "event=note_{op} module=service status=error collection={} error_code={} error={}",
                collection.as_str(),
                err.code(),
                err
            );
        }
        result
    }
}
