//! Client state machine.
//!
//! The `Client` composes the session, the two resource controllers and the
//! dialog slot. It performs no I/O: requests are queued and handed out by
//! [`Client::take_outgoing`], and their results come back as
//! [`ClientEvent::Response`].

use std::collections::{HashMap, VecDeque};

use postboard_proto::{Credentials, Endpoint, LoginResponse, Payload, Post, Request, User};

use crate::{
    claims::BearerToken,
    classify::{ClassifiedError, ErrorKind, classify, messages},
    config::ClientConfig,
    controller::{Mutation, Outcome, ResourceController},
    error::{ClientError, ModalError},
    event::{
        CallResult, ClientAction, ClientEvent, FollowUp, Operation, Outbound, Presentation,
        RequestId, RequestIds, Scope,
    },
    modal::{MessageKind, ModalCoordinator, ModalId, ModalRequest, ModalResolution, Resolved},
    resource::{Resource, can_modify, with_payload},
    session::{AuthSession, Restored},
};

const CONFIRM_DELETE_POST: &str = "Are you sure you want to delete this post?";
const REGISTERED: &str = "Registration successful! Please log in.";
const PASSWORD_MISMATCH: &str = "Passwords do not match!";
const MISSING_CREDENTIALS: &str = "Username and password are required.";

/// Work resumed when the open dialog is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Delete a post once confirmed.
    DeletePost {
        /// Post identifier
        id: String,
    },
    /// Delete a user once confirmed.
    DeleteUser {
        /// User identifier
        id: String,
        /// Username, for the result dialog
        username: String,
    },
    /// Navigation to run when a message dialog closes.
    FollowUp(FollowUp),
}

impl Continuation {
    fn scope(&self) -> Scope {
        match self {
            Self::DeletePost { .. } => Scope::Posts,
            Self::DeleteUser { .. } => Scope::Users,
            Self::FollowUp(_) => Scope::Session,
        }
    }
}

/// What a request id is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Login { username: String },
    Register,
    Posts,
    Users,
    DeleteUser { username: String },
}

impl Route {
    fn scope(&self) -> Scope {
        match self {
            Self::Login { .. } | Self::Register => Scope::Session,
            Self::Posts => Scope::Posts,
            Self::Users | Self::DeleteUser { .. } => Scope::Users,
        }
    }
}

/// Session and collection state machine for the microblog backend.
pub struct Client {
    config: ClientConfig,
    session: AuthSession,
    posts: ResourceController<Post>,
    users: ResourceController<User>,
    modal: ModalCoordinator<Continuation>,
    ids: RequestIds,
    /// Requests issued and not yet answered, by id.
    routes: HashMap<RequestId, Route>,
    /// Requests issued but not yet handed to the transport.
    outgoing: VecDeque<(RequestId, Request)>,
}

impl Client {
    /// Create a logged-out client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            posts: ResourceController::new(config.sync_policy),
            users: ResourceController::new(config.sync_policy),
            config,
            session: AuthSession::new(),
            modal: ModalCoordinator::new(),
            ids: RequestIds::default(),
            routes: HashMap::new(),
            outgoing: VecDeque::new(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current session.
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Post collection.
    pub fn posts(&self) -> &ResourceController<Post> {
        &self.posts
    }

    /// User collection (admin only).
    pub fn users(&self) -> &ResourceController<User> {
        &self.users
    }

    /// The open dialog, if any.
    pub fn modal(&self) -> Option<&ModalRequest> {
        self.modal.active()
    }

    /// Number of requests issued and not yet answered or abandoned.
    pub fn in_flight(&self) -> usize {
        self.routes.len()
    }

    /// Whether edit/delete controls should be offered for an item.
    pub fn can_modify<R: Resource>(&self, item: &R) -> bool {
        can_modify(item, &self.session, &self.config.sentinel_admin)
    }

    /// Hand queued requests to the transport.
    ///
    /// The credential header is resolved here, from the session as it is now.
    pub fn take_outgoing(&mut self) -> Vec<Outbound> {
        self.outgoing
            .drain(..)
            .map(|(id, request)| {
                let request = self.session.authorize(request);
                tracing::debug!(%id, endpoint = %request.request.endpoint(), "request handed off");
                Outbound { id, request }
            })
            .collect()
    }

    /// Process an event and return resulting actions.
    ///
    /// Errors are rejections detected before any request is queued; nothing
    /// changes when one is returned. User-facing ones convert to a
    /// [`ClassifiedError`] via [`ClientError::classified`].
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Initialize { persisted_token } => Ok(self.handle_initialize(persisted_token)),
            ClientEvent::Login { username, password } => self.handle_login(username, password),
            ClientEvent::Register { username, password, confirm_password } => {
                self.handle_register(username, password, &confirm_password)
            },
            ClientEvent::Logout => Ok(self.handle_logout()),
            ClientEvent::FetchPosts => {
                let issued = self.posts.fetch_all(&mut self.ids)?;
                self.queue(Route::Posts, issued);
                Ok(Vec::new())
            },
            ClientEvent::CreatePost { content } => {
                let issued = self.posts.create(&mut self.ids, &content)?;
                self.queue(Route::Posts, issued);
                Ok(Vec::new())
            },
            ClientEvent::UpdatePost { id, content } => {
                let issued = self.posts.update(&mut self.ids, &id, &content)?;
                self.queue(Route::Posts, issued);
                Ok(Vec::new())
            },
            ClientEvent::DeletePost { id } => self.handle_delete_post(id),
            ClientEvent::FetchUsers => self.handle_fetch_users(),
            ClientEvent::DeleteUser { id } => self.handle_delete_user(&id),
            ClientEvent::ResolveModal { modal_id, resolution } => {
                self.handle_resolve_modal(modal_id, resolution)
            },
            ClientEvent::Response { request_id, result } => {
                Ok(self.handle_response(request_id, &result))
            },
            ClientEvent::CloseScope(scope) => Ok(self.close_scope(scope)),
        }
    }

    fn queue(&mut self, route: Route, (id, request): (RequestId, Request)) {
        tracing::debug!(%id, endpoint = %request.endpoint(), scope = ?route.scope(), "request queued");
        self.routes.insert(id, route);
        self.outgoing.push_back((id, request));
    }

    fn handle_initialize(&mut self, persisted_token: Option<String>) -> Vec<ClientAction> {
        match self.session.initialize(persisted_token) {
            Restored::Anonymous => vec![ClientAction::SessionChanged { claims: None }],
            Restored::Authenticated(claims) => {
                vec![ClientAction::SessionChanged { claims: Some(claims) }]
            },
            Restored::Discarded => vec![
                ClientAction::ClearPersistedToken,
                ClientAction::SessionChanged { claims: None },
            ],
        }
    }

    fn handle_login(
        &mut self,
        username: String,
        password: String,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let request = credentials_request(Endpoint::Login, username.clone(), password)?;
        let id = self.ids.allocate();
        self.queue(Route::Login { username }, (id, request));
        Ok(Vec::new())
    }

    fn handle_register(
        &mut self,
        username: String,
        password: String,
        confirm_password: &str,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if password != confirm_password {
            return Err(ClientError::Validation(PASSWORD_MISMATCH.to_string()));
        }
        let request = credentials_request(Endpoint::Register, username, password)?;
        let id = self.ids.allocate();
        self.queue(Route::Register, (id, request));
        Ok(Vec::new())
    }

    fn handle_logout(&mut self) -> Vec<ClientAction> {
        let was_active = self.session.logout();
        if was_active {
            tracing::info!("session ended");
        }

        // The user list is admin data; nothing of it survives the session.
        let mut actions = self.close_scope(Scope::Users);
        self.users.reset();

        actions.push(ClientAction::ClearPersistedToken);
        actions.push(ClientAction::SessionChanged { claims: None });
        actions
    }

    fn handle_delete_post(&mut self, id: String) -> Result<Vec<ClientAction>, ClientError> {
        if self.modal.is_open() {
            return Err(ModalError::Busy.into());
        }
        self.posts.request_delete(&id, &self.config.sentinel_admin)?;

        match self.modal.confirm(CONFIRM_DELETE_POST, Continuation::DeletePost { id: id.clone() }) {
            Ok(request) => Ok(vec![ClientAction::ShowModal(request)]),
            Err(e) => {
                self.posts.cancel_delete(&id);
                Err(e.into())
            },
        }
    }

    fn handle_fetch_users(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if !self.session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        let issued = self.users.fetch_all(&mut self.ids)?;
        self.queue(Route::Users, issued);
        Ok(Vec::new())
    }

    fn handle_delete_user(&mut self, id: &str) -> Result<Vec<ClientAction>, ClientError> {
        if !self.session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        if self.modal.is_open() {
            return Err(ModalError::Busy.into());
        }

        let user = match self.users.request_delete(id, &self.config.sentinel_admin) {
            Ok(user) => user,
            Err(e @ ClientError::ProtectedAccount { .. }) => {
                tracing::warn!(user_id = %id, "refusing to delete protected account");
                let request = self.modal.message(e.classified().message, MessageKind::Error, None)?;
                return Ok(vec![ClientAction::ShowModal(request)]);
            },
            Err(e) => return Err(e),
        };

        let message = format!("Are you sure you want to delete user \"{}\"?", user.username);
        let continuation =
            Continuation::DeleteUser { id: id.to_string(), username: user.username.clone() };
        match self.modal.confirm(message, continuation) {
            Ok(request) => Ok(vec![ClientAction::ShowModal(request)]),
            Err(e) => {
                self.users.cancel_delete(id);
                Err(e.into())
            },
        }
    }

    fn handle_resolve_modal(
        &mut self,
        modal_id: ModalId,
        resolution: ModalResolution,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let resolved = self.modal.resolve(modal_id, resolution)?;
        let mut actions = vec![ClientAction::CloseModal(modal_id)];

        // The dialog is gone from here on; failures are reported as actions.
        match resolved {
            Resolved::Confirmed(Continuation::DeletePost { id }) => {
                match self.posts.confirm_delete(&mut self.ids, &id) {
                    Ok(issued) => self.queue(Route::Posts, issued),
                    Err(e) => actions.push(unconfirmed(Operation::DeletePost, &e)),
                }
            },
            Resolved::Confirmed(Continuation::DeleteUser { id, username }) => {
                match self.users.confirm_delete(&mut self.ids, &id) {
                    Ok(issued) => self.queue(Route::DeleteUser { username }, issued),
                    Err(e) => actions.push(unconfirmed(Operation::DeleteUser, &e)),
                }
            },
            Resolved::Cancelled(Continuation::DeletePost { id }) => {
                self.posts.cancel_delete(&id);
            },
            Resolved::Cancelled(Continuation::DeleteUser { id, .. }) => {
                self.users.cancel_delete(&id);
            },
            Resolved::Closed(Some(Continuation::FollowUp(follow_up))) => {
                actions.push(ClientAction::FollowUp(follow_up));
            },
            Resolved::Confirmed(Continuation::FollowUp(_))
            | Resolved::Cancelled(Continuation::FollowUp(_))
            | Resolved::Closed(_) => {},
        }

        Ok(actions)
    }

    fn handle_response(&mut self, request_id: RequestId, result: &CallResult) -> Vec<ClientAction> {
        let Some(route) = self.routes.remove(&request_id) else {
            tracing::debug!(%request_id, "ignoring response for unknown or abandoned request");
            return Vec::new();
        };

        match route {
            Route::Login { username } => self.complete_login(&username, result),
            Route::Register => self.complete_register(result),
            Route::Posts => {
                let outcome = self.posts.handle_response(request_id, result);
                self.apply_outcome::<Post>(outcome, None)
            },
            Route::Users => {
                let outcome = self.users.handle_response(request_id, result);
                self.apply_outcome::<User>(outcome, None)
            },
            Route::DeleteUser { username } => {
                let outcome = self.users.handle_response(request_id, result);
                self.apply_outcome::<User>(outcome, Some(username))
            },
        }
    }

    fn complete_login(&mut self, username: &str, result: &CallResult) -> Vec<ClientAction> {
        let response = match result {
            Ok(response) if response.is_success() => response,
            _ => return self.present_failure(Operation::Login, classify(Operation::Login, result)),
        };

        let established = response
            .decode::<LoginResponse>("login response")
            .map_err(ClientError::from)
            .and_then(|body| {
                let claims = self.session.establish(BearerToken::new(body.access_token.clone()))?;
                if claims.subject != body.username || claims.is_admin != body.is_admin {
                    tracing::warn!(
                        claimed = %claims.subject,
                        reported = %body.username,
                        "login response disagrees with token claims"
                    );
                }
                Ok((BearerToken::new(body.access_token), claims))
            });

        match established {
            Ok((token, claims)) => {
                tracing::info!(user = %claims.subject, requested = %username, "session started");
                vec![
                    ClientAction::PersistToken(token),
                    ClientAction::SessionChanged { claims: Some(claims) },
                    ClientAction::Completed { operation: Operation::Login },
                ]
            },
            Err(e) => {
                tracing::warn!(error = %e, "login succeeded but token is unusable");
                let error = ClassifiedError {
                    kind: ErrorKind::Unknown,
                    message: messages(Operation::Login).base.to_string(),
                };
                self.present_failure(Operation::Login, error)
            },
        }
    }

    fn complete_register(&mut self, result: &CallResult) -> Vec<ClientAction> {
        match result {
            Ok(response) if response.is_success() => {},
            _ => {
                return self
                    .present_failure(Operation::Register, classify(Operation::Register, result));
            },
        }

        let mut actions = Vec::new();
        let follow_up = Continuation::FollowUp(FollowUp::NavigateToLogin);
        match self.modal.message(REGISTERED, MessageKind::Success, Some(follow_up)) {
            Ok(request) => actions.push(ClientAction::ShowModal(request)),
            Err(e) => {
                tracing::warn!(error = %e, "registration dialog skipped");
                actions.push(ClientAction::FollowUp(FollowUp::NavigateToLogin));
            },
        }
        actions.push(ClientAction::Completed { operation: Operation::Register });
        actions
    }

    fn apply_outcome<R: Resource>(
        &mut self,
        outcome: Option<Outcome>,
        deleted_user: Option<String>,
    ) -> Vec<ClientAction> {
        let Some(outcome) = outcome else {
            return Vec::new();
        };

        match outcome {
            Outcome::Replaced { len } => vec![
                ClientAction::CollectionReplaced { scope: R::SCOPE, len },
                ClientAction::Completed { operation: R::FETCH },
            ],
            Outcome::Stale => Vec::new(),
            Outcome::FetchFailed(error) => self.present_failure(R::FETCH, error),
            Outcome::Mutated { operation, mutation } => {
                let mut actions = self.refetch(R::SCOPE);
                if let (Mutation::Delete { .. }, Some(username)) = (&mutation, deleted_user) {
                    let text = format!("User \"{username}\" deleted successfully.");
                    match self.modal.message(text, MessageKind::Success, None) {
                        Ok(request) => actions.push(ClientAction::ShowModal(request)),
                        Err(e) => tracing::warn!(error = %e, "deletion dialog skipped"),
                    }
                }
                actions.push(ClientAction::Completed { operation });
                actions
            },
            Outcome::MutationFailed { operation, error, .. } => self.present_failure(operation, error),
        }
    }

    /// Reload a collection after a successful mutation.
    fn refetch(&mut self, scope: Scope) -> Vec<ClientAction> {
        let issued = match scope {
            Scope::Posts => self.posts.fetch_all(&mut self.ids).map(|i| (Route::Posts, i)),
            Scope::Users => self.users.fetch_all(&mut self.ids).map(|i| (Route::Users, i)),
            Scope::Session => return Vec::new(),
        };

        match issued {
            Ok((route, issued)) => {
                self.queue(route, issued);
                Vec::new()
            },
            Err(e) => {
                let operation = if scope == Scope::Users { User::FETCH } else { Post::FETCH };
                vec![ClientAction::Failed { operation, error: e.classified() }]
            },
        }
    }

    /// Surface a failure inline or through an error dialog.
    fn present_failure(&mut self, operation: Operation, error: ClassifiedError) -> Vec<ClientAction> {
        if operation.presentation() == Presentation::Dialog {
            match self.modal.message(error.message.clone(), MessageKind::Error, None) {
                Ok(request) => return vec![ClientAction::ShowModal(request)],
                Err(ModalError::Busy) => {
                    tracing::warn!(?operation, "dialog slot busy, reporting failure inline");
                },
                Err(e) => tracing::warn!(?operation, error = %e, "failure dialog not shown"),
            }
        }
        vec![ClientAction::Failed { operation, error }]
    }

    /// Abandon every request issued under a scope.
    ///
    /// Requests still queued are dropped silently; those already handed off
    /// are reported as [`ClientAction::Cancel`].
    fn close_scope(&mut self, scope: Scope) -> Vec<ClientAction> {
        let mut abandoned: Vec<RequestId> =
            self.routes.iter().filter(|(_, r)| r.scope() == scope).map(|(id, _)| *id).collect();
        abandoned.sort();

        let mut actions = Vec::new();
        for id in abandoned {
            self.routes.remove(&id);
            self.posts.abandon(id);
            self.users.abandon(id);

            let queued = self.outgoing.len();
            self.outgoing.retain(|(queued_id, _)| *queued_id != id);
            if self.outgoing.len() == queued {
                actions.push(ClientAction::Cancel(id));
            }
        }

        match scope {
            Scope::Posts => self.posts.clear_confirmation(),
            Scope::Users => self.users.clear_confirmation(),
            Scope::Session => {},
        }

        if self.modal.continuation().is_some_and(|c| c.scope() == scope)
            && let Some((modal_id, _)) = self.modal.dismiss()
        {
            actions.push(ClientAction::CloseModal(modal_id));
        }

        if !actions.is_empty() {
            tracing::debug!(?scope, cancelled = actions.len(), "scope closed");
        }
        actions
    }
}

fn unconfirmed(operation: Operation, error: &ClientError) -> ClientAction {
    tracing::warn!(?operation, %error, "confirmed delete could not be issued");
    ClientAction::Failed { operation, error: error.classified() }
}

fn credentials_request(
    endpoint: Endpoint,
    username: String,
    password: String,
) -> Result<Request, ClientError> {
    if username.is_empty() || password.is_empty() {
        return Err(ClientError::Validation(MISSING_CREDENTIALS.to_string()));
    }
    with_payload(endpoint, Payload::Credentials(Credentials { username, password }))
}
