//! # SessionManager: the authenticated-identity lifecycle
//!
//! ```text
//!             restore()                  begin_sign_in()
//!   Unknown ───────────► Anonymous ─────────────────────► Authenticating
//!      │                    ▲  ▲                                │
//!      │ restore()          │  └──── failure / cancel / reject ─┤
//!      ▼                    │                                   ▼
//!   Authenticated ◄─────────┴── sign_out() / invalidation ── Authenticated
//! ```
//!
//! Every identity passes through [`admit`](SessionManager::admit) before the
//! manager reports it: the allow-list check runs first, a rejected identity is
//! signed out at the provider, and a permitted one has its profile upserted.
//! Only then do subscribers see [`Session::Authenticated`].
//!
//! One sign-in attempt runs at a time. [`begin_sign_in`](SessionManager::begin_sign_in)
//! and [`restore`](SessionManager::restore) share the in-flight attempt, so a
//! second call while one is pending awaits the same result instead of opening
//! another provider flow.
//!
//! Every attempt belongs to the epoch it started in. Sign-out and provider
//! invalidation start a new epoch, and an attempt from an older epoch can no
//! longer commit: its identity is signed out again and the caller gets
//! [`AuthError::SignInCancelled`].

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use store::{LocalCache, Record, RecordStore, StoreError, WriteOptions};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::allow_list::AllowList;
use super::config::{ProviderConfig, ProviderKind};
use super::handle::validate_handle;
use super::provider::IdentityProvider;
use super::subscription::{Hub, SessionCallback, SessionSubscription};
use crate::error::AuthError;
use crate::models::{
    next_write_time, timestamp_value, Identity, Profile, Session, FIELD_AVATAR_URL,
    FIELD_DISPLAY_NAME, FIELD_EMAIL, FIELD_IS_ACTIVE, FIELD_LINKED_HANDLE, FIELD_UPDATED_AT,
};
use crate::settings::Settings;

type PendingSignIn = Shared<BoxFuture<'static, Result<Session, AuthError>>>;

#[derive(Default)]
struct State {
    session: Session,
    /// Profile of the authenticated identity, if any.
    profile: Option<Profile>,
    epoch: u64,
}

struct InFlight {
    epoch: u64,
    pending: PendingSignIn,
}

pub struct SessionManager<P, S> {
    provider: P,
    store: S,
    provider_config: ProviderConfig,
    allow_list: AllowList,
    collection: String,
    cache: Option<Arc<dyn LocalCache>>,
    state: Mutex<State>,
    hub: Arc<Hub>,
    in_flight: Mutex<Option<InFlight>>,
}

impl<P: IdentityProvider, S: RecordStore> SessionManager<P, S> {
    pub fn new(provider: P, store: S, provider_config: ProviderConfig, settings: &Settings) -> Self {
        Self {
            provider,
            store,
            provider_config,
            allow_list: AllowList::new(&settings.auth.allowed_domain),
            collection: settings.store.profile_collection.clone(),
            cache: None,
            state: Mutex::new(State::default()),
            hub: Arc::new(Hub::default()),
            in_flight: Mutex::new(None),
        }
    }

    /// Client-side data to wipe on sign-out.
    pub fn with_local_cache(mut self, cache: Arc<dyn LocalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn session(&self) -> Session {
        self.state.lock().session.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.lock().profile.clone()
    }

    /// Whether the one-time linked-handle prompt should be shown.
    pub fn needs_linked_handle(&self) -> bool {
        let state = self.state.lock();
        state.session.is_authenticated()
            && !state.profile.as_ref().is_some_and(Profile::has_linked_handle)
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider_config.kind
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    /// Deliver the current session to `callback` now and after every transition.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> SessionSubscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let callback: SessionCallback = Arc::new(callback);
        let (id, needs_link) = self.hub.register(callback.clone());
        if needs_link {
            let manager = Arc::downgrade(self);
            let link = self
                .provider
                .subscribe_session_changes(Box::new(move |identity| {
                    if let Some(manager) = manager.upgrade() {
                        manager.on_provider_change(identity);
                    }
                }));
            self.hub.attach(link);
        }
        callback(&self.session());
        SessionSubscription::new(&self.hub, id)
    }

    /// Resolve the provider's persisted session. Transitions out of
    /// [`Session::Unknown`] once; later calls return the current session.
    pub async fn restore(self: &Arc<Self>) -> Result<Session, AuthError> {
        match self.session() {
            Session::Unknown | Session::Authenticating => {}
            session => return Ok(session),
        }
        self.attempt(false, |this, epoch| async move {
            match this.provider.restore_session().await? {
                Some(identity) => this.admit(identity, epoch).await,
                None => {
                    this.commit_at(Some(epoch), Session::Anonymous, None);
                    Ok(Session::Anonymous)
                }
            }
        })
        .await
    }

    /// Sign in through the provider. Joins the pending sign-in if one is in
    /// flight. A session that is still [`Session::Unknown`] is restored first,
    /// so a pending restore is awaited rather than taken as the sign-in result.
    pub async fn begin_sign_in(self: &Arc<Self>) -> Result<Session, AuthError> {
        if self.session() == Session::Unknown {
            if let Err(err) = self.restore().await {
                debug!(error = %err, "restore before sign-in failed");
            }
        }
        if let session @ Session::Authenticated(_) = self.session() {
            return Ok(session);
        }
        self.attempt(true, |this, epoch| async move {
            let identity = this.provider.sign_in(&this.provider_config).await?;
            this.admit(identity, epoch).await
        })
        .await
    }

    /// Sign out at the provider and clear all local state. Provider and cache
    /// failures are logged, never returned.
    pub async fn sign_out(&self) {
        self.invalidate();
        self.force_provider_sign_out().await;
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.clear() {
                warn!(error = %err, "failed to clear local cache on sign-out");
            }
        }
        self.commit(Session::Anonymous, None);
        info!("signed out");
    }

    /// Read a profile. A missing profile is `Ok(None)`.
    pub async fn load_profile(&self, identity_id: &str) -> Result<Option<Profile>, AuthError> {
        let record = self
            .store
            .get(&self.collection, identity_id)
            .await
            .map_err(read_error)?;
        record.map(Profile::from_record).transpose().map_err(read_error)
    }

    /// Create the identity's profile, or mark an existing one active. An existing
    /// linked handle is never touched.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, AuthError> {
        match self.load_profile(&identity.id).await? {
            None => {
                let mut profile = Profile::for_identity(identity, Utc::now());
                profile.linked_handle = identity
                    .provider_username()
                    .and_then(|name| validate_handle(name).ok())
                    .map(str::to_string);
                let record = profile.to_record().map_err(write_error)?;
                self.store
                    .upsert(&self.collection, &identity.id, record, WriteOptions::replace())
                    .await
                    .map_err(write_error)?;
                info!(identity = %identity.id, "created profile");
                Ok(profile)
            }
            Some(mut profile) => {
                let updated_at = next_write_time(profile.updated_at);
                let mut fields = Record::new();
                fields.insert(FIELD_IS_ACTIVE.into(), Value::Bool(true));
                fields.insert(FIELD_DISPLAY_NAME.into(), identity.display_name().into());
                fields.insert(FIELD_EMAIL.into(), identity.email.clone().into());
                fields.insert(FIELD_AVATAR_URL.into(), identity.avatar_url.clone().into());
                fields.insert(FIELD_UPDATED_AT.into(), timestamp_value(updated_at));
                self.store
                    .update(&self.collection, &identity.id, fields)
                    .await
                    .map_err(write_error)?;

                profile.is_active = true;
                profile.display_name = identity.display_name().to_string();
                profile.email = identity.email.clone();
                profile.avatar_url = identity.avatar_url.clone();
                profile.updated_at = updated_at;
                debug!(identity = %identity.id, "refreshed profile");
                Ok(profile)
            }
        }
    }

    /// Validate and save the user's linked handle, creating the profile if needed.
    ///
    /// A profile created here for an identity other than the signed-in one has
    /// an empty email and display name. The next sign-in of that identity fills
    /// them in.
    pub async fn submit_linked_handle(
        &self,
        identity_id: &str,
        handle: &str,
    ) -> Result<Profile, AuthError> {
        let handle = validate_handle(handle)?.to_string();

        let profile = match self.load_profile(identity_id).await? {
            Some(mut profile) => {
                let updated_at = next_write_time(profile.updated_at);
                let mut fields = Record::new();
                fields.insert(FIELD_LINKED_HANDLE.into(), handle.clone().into());
                fields.insert(FIELD_UPDATED_AT.into(), timestamp_value(updated_at));
                self.store
                    .update(&self.collection, identity_id, fields)
                    .await
                    .map_err(write_error)?;
                profile.linked_handle = Some(handle);
                profile.updated_at = updated_at;
                profile
            }
            None => {
                let identity = self
                    .session()
                    .identity()
                    .filter(|identity| identity.id == identity_id)
                    .cloned()
                    .unwrap_or_else(|| Identity::new(identity_id, ""));
                let mut profile = Profile::for_identity(&identity, Utc::now());
                profile.linked_handle = Some(handle);
                let record = profile.to_record().map_err(write_error)?;
                self.store
                    .upsert(&self.collection, identity_id, record, WriteOptions::merge())
                    .await
                    .map_err(write_error)?;
                profile
            }
        };

        {
            let mut state = self.state.lock();
            if state
                .session
                .identity()
                .is_some_and(|identity| identity.id == identity_id)
            {
                state.profile = Some(profile.clone());
            }
        }
        info!(identity = identity_id, handle = ?profile.linked_handle, "linked handle saved");
        Ok(profile)
    }

    /// Vet an identity the provider vouched for and commit it, unless the
    /// attempt's epoch has ended in the meantime.
    async fn admit(&self, identity: Identity, epoch: u64) -> Result<Session, AuthError> {
        if let Err(err) = self.allow_list.check(&identity) {
            warn!(
                identity = %identity.id,
                domain = identity.email_domain(),
                allowed = self.allow_list.domain(),
                "identity outside the allowed domain, signing out"
            );
            self.force_provider_sign_out().await;
            return Err(err);
        }

        if self.state.lock().epoch != epoch {
            return self.abandon(&identity).await;
        }
        let profile = match self.ensure_profile(&identity).await {
            Ok(profile) => profile,
            Err(err) => {
                self.force_provider_sign_out().await;
                return Err(err);
            }
        };

        let session = Session::Authenticated(identity.clone());
        if !self.commit_at(Some(epoch), session.clone(), Some(profile)) {
            return self.abandon(&identity).await;
        }
        Ok(session)
    }

    /// Drop an identity whose attempt was overtaken by a sign-out.
    async fn abandon(&self, identity: &Identity) -> Result<Session, AuthError> {
        info!(identity = %identity.id, "signed out while signing in, discarding identity");
        // A newer attempt may already own the provider session.
        if !self.session().is_authenticated() {
            self.force_provider_sign_out().await;
        }
        Err(AuthError::SignInCancelled)
    }

    /// Start a new epoch and forget the in-flight attempt.
    fn invalidate(&self) {
        self.state.lock().epoch += 1;
        self.in_flight.lock().take();
    }

    /// Start a sign-in attempt, or return the one already in flight.
    fn attempt<F, Fut>(self: &Arc<Self>, announce: bool, run: F) -> PendingSignIn
    where
        F: FnOnce(Arc<Self>, u64) -> Fut,
        Fut: Future<Output = Result<Session, AuthError>> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock();
        if let Some(attempt) = in_flight.as_ref() {
            debug!("sign-in already in flight");
            return attempt.pending.clone();
        }

        let epoch = self.state.lock().epoch;
        let this = Arc::clone(self);
        let work = run(Arc::clone(self), epoch);
        let pending = async move {
            if announce {
                this.commit_at(Some(epoch), Session::Authenticating, None);
            }
            let result = work.await;
            {
                let mut in_flight = this.in_flight.lock();
                if in_flight.as_ref().is_some_and(|attempt| attempt.epoch == epoch) {
                    in_flight.take();
                }
            }
            if let Err(err) = &result {
                warn!(error = %err, "sign-in did not complete");
                this.commit_at(Some(epoch), Session::Anonymous, None);
            }
            result
        }
        .boxed()
        .shared();

        *in_flight = Some(InFlight {
            epoch,
            pending: pending.clone(),
        });
        pending
    }

    fn on_provider_change(self: &Arc<Self>, identity: Option<Identity>) {
        match (self.session(), identity) {
            (Session::Authenticated(current), None) => {
                info!(identity = %current.id, "provider session ended");
                self.invalidate();
                self.commit(Session::Anonymous, None);
            }
            (Session::Authenticated(current), Some(next)) if current.id == next.id => {}
            (Session::Anonymous | Session::Authenticated(_), Some(next)) => self.adopt(next),
            // Unknown and Authenticating settle through their own attempt.
            _ => {}
        }
    }

    /// Vet a sign-in that happened outside this manager (another tab).
    fn adopt(self: &Arc<Self>, identity: Identity) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(identity = %identity.id, "no async runtime to vet an external sign-in, ignoring it");
            return;
        };
        let this = Arc::clone(self);
        runtime.spawn(async move {
            // The provider may have moved on before this task ran.
            let current = this.provider.current_identity();
            if current.as_ref().map(|current| &current.id) != Some(&identity.id) {
                debug!(identity = %identity.id, "external sign-in no longer current, ignoring it");
                return;
            }
            let pending = this.attempt(true, move |this, epoch| async move {
                this.admit(identity, epoch).await
            });
            let _ = pending.await;
        });
    }

    async fn force_provider_sign_out(&self) {
        if let Err(err) = self.provider.sign_out().await {
            warn!(error = %err, "provider sign-out failed, clearing local session anyway");
        }
    }

    fn commit(&self, session: Session, profile: Option<Profile>) {
        self.commit_at(None, session, profile);
    }

    /// Commit unless `epoch` is given and no longer current. Returns whether
    /// the state was written.
    fn commit_at(&self, epoch: Option<u64>, session: Session, profile: Option<Profile>) -> bool {
        {
            let mut state = self.state.lock();
            if epoch.is_some_and(|epoch| epoch != state.epoch) {
                return false;
            }
            state.profile = profile;
            if state.session == session {
                return true;
            }
            info!(from = ?state.session.status(), to = ?session.status(), "session transition");
            state.session = session.clone();
        }
        for callback in self.hub.callbacks() {
            callback(&session);
        }
        true
    }
}

fn read_error(err: StoreError) -> AuthError {
    AuthError::ProfileRead(err.to_string())
}

fn write_error(err: StoreError) -> AuthError {
    AuthError::ProfileWrite(err.to_string())
}
