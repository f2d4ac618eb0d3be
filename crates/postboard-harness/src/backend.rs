//! In-memory backend implementing the REST contract.
//!
//! `SimBackend` answers [`AuthorizedRequest`]s synchronously with the same
//! statuses and error bodies as the production server, including its
//! authorization rules:
//!
//! - Post list is public; every other post call needs a token.
//! - Posts can be edited or deleted by their author or any admin.
//! - User list and user delete need an admin token.
//! - An admin cannot delete their own account.
//!
//! Time is a counter, so post ordering is deterministic.

use postboard_client::decode_claims;
use postboard_proto::{
    AuthorizedRequest, Credentials, Endpoint, ErrorBody, LoginResponse, Payload, Post, Response,
    User,
};
use serde_json::json;

use crate::token::{SIM_SIGNATURE, mint_token};

struct Account {
    id: String,
    username: String,
    password: String,
    is_admin: bool,
}

struct StoredPost {
    post: Post,
    /// Creation order; higher is newer.
    seq: u64,
}

/// Identity of an authenticated caller.
struct Caller {
    username: String,
    is_admin: bool,
}

/// Deterministic stand-in for the microblog server.
#[derive(Default)]
pub struct SimBackend {
    accounts: Vec<Account>,
    posts: Vec<StoredPost>,
    next_id: u64,
    clock: u64,
    handled: usize,
}

impl SimBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a default admin account, as the server seeds on startup.
    pub fn with_admin(username: &str, password: &str) -> Self {
        let mut backend = Self::new();
        backend.add_account(username, password, true);
        backend
    }

    /// Create an account directly. Returns its identifier.
    pub fn add_account(&mut self, username: &str, password: &str, is_admin: bool) -> String {
        let id = self.allocate_id();
        self.accounts.push(Account {
            id: id.clone(),
            username: username.to_string(),
            password: password.to_string(),
            is_admin,
        });
        id
    }

    /// Create a post directly. Returns its identifier.
    pub fn add_post(&mut self, author: &str, content: &str) -> String {
        let post = self.insert_post(author, content);
        post.id
    }

    /// Identifier of an account.
    pub fn account_id(&self, username: &str) -> Option<&str> {
        self.accounts.iter().find(|a| a.username == username).map(|a| a.id.as_str())
    }

    /// Posts in list order (newest first).
    pub fn posts(&self) -> Vec<Post> {
        let mut stored: Vec<&StoredPost> = self.posts.iter().collect();
        stored.sort_by(|a, b| b.seq.cmp(&a.seq));
        stored.into_iter().map(|s| s.post.clone()).collect()
    }

    /// Accounts without passwords, in creation order.
    pub fn users(&self) -> Vec<User> {
        self.accounts
            .iter()
            .map(|a| User { id: a.id.clone(), username: a.username.clone(), is_admin: a.is_admin })
            .collect()
    }

    /// Number of requests answered so far.
    pub fn handled(&self) -> usize {
        self.handled
    }

    /// Answer a request.
    pub fn handle(&mut self, request: &AuthorizedRequest) -> Response {
        self.handled += 1;
        let endpoint = request.request.endpoint().clone();
        let payload = request.request.payload();

        let response = match endpoint {
            Endpoint::ListPosts => Response::json(200, &self.posts()),
            Endpoint::Register => self.register(payload),
            Endpoint::Login => self.login(payload),
            Endpoint::CreatePost => self.with_caller(request, |b, caller| b.create_post(caller, payload)),
            Endpoint::UpdatePost { id } => {
                self.with_caller(request, |b, caller| b.update_post(caller, &id, payload))
            },
            Endpoint::DeletePost { id } => self.with_caller(request, |b, caller| b.delete_post(caller, &id)),
            Endpoint::ListUsers => self.with_caller(request, |b, caller| {
                if !caller.is_admin {
                    return admin_required();
                }
                Response::json(200, &b.users())
            }),
            Endpoint::DeleteUser { id } => self.with_caller(request, |b, caller| b.delete_user(caller, &id)),
        };

        tracing::debug!(endpoint = %request.request.endpoint(), status = response.status, "sim backend answered");
        response
    }

    fn with_caller(
        &mut self,
        request: &AuthorizedRequest,
        f: impl FnOnce(&mut Self, Caller) -> Response,
    ) -> Response {
        let Some(header) = request.authorization.as_deref() else {
            return Response::json(401, &ErrorBody::msg("Missing Authorization Header"));
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            return Response::json(401, &ErrorBody::msg("Missing 'Bearer' type in 'Authorization' header"));
        };
        if token.rsplit('.').next() != Some(SIM_SIGNATURE) {
            return Response::json(422, &ErrorBody::msg("Signature verification failed"));
        }
        match decode_claims(token) {
            Ok(claims) => f(self, Caller { username: claims.subject, is_admin: claims.is_admin }),
            Err(_) => Response::json(422, &ErrorBody::msg("Not enough segments")),
        }
    }

    fn register(&mut self, payload: Option<&Payload>) -> Response {
        let Some(Credentials { username, password }) = credentials(payload) else {
            return missing_credentials();
        };
        if username.is_empty() || password.is_empty() {
            return missing_credentials();
        }
        if self.account_id(username).is_some() {
            return Response::json(409, &ErrorBody::msg("Username already exists"));
        }
        self.add_account(username, password, false);
        Response::json(201, &json!({ "msg": "User registered successfully" }))
    }

    fn login(&mut self, payload: Option<&Payload>) -> Response {
        let Some(Credentials { username, password }) = credentials(payload) else {
            return missing_credentials();
        };
        if username.is_empty() || password.is_empty() {
            return missing_credentials();
        }
        match self.accounts.iter().find(|a| &a.username == username && &a.password == password) {
            Some(account) => Response::json(
                200,
                &LoginResponse {
                    access_token: mint_token(&account.username, account.is_admin),
                    username: account.username.clone(),
                    is_admin: account.is_admin,
                },
            ),
            None => Response::json(401, &ErrorBody::msg("Bad username or password")),
        }
    }

    fn create_post(&mut self, caller: Caller, payload: Option<&Payload>) -> Response {
        match content(payload) {
            Some(content) if !content.trim().is_empty() => {
                let post = self.insert_post(&caller.username, content);
                Response::json(201, &post)
            },
            _ => Response::json(400, &ErrorBody::error("Post content could not be empty!")),
        }
    }

    fn update_post(&mut self, caller: Caller, id: &str, payload: Option<&Payload>) -> Response {
        if !is_object_id(id) {
            return Response::json(400, &ErrorBody::error("Invalid Post ID format"));
        }
        let content = match content(payload) {
            Some(content) if !content.trim().is_empty() => content.to_string(),
            _ => return Response::json(400, &ErrorBody::error("Content cannot be empty for update")),
        };
        let Some(stored) = self.posts.iter_mut().find(|s| s.post.id == id) else {
            return Response::json(404, &ErrorBody::error("Post not found"));
        };
        if !caller.is_admin && stored.post.author != caller.username {
            return Response::json(403, &ErrorBody::msg("Unauthorized to edit this post"));
        }
        if stored.post.content == content {
            return Response::json(200, &json!({ "message": "No changes detected for post" }));
        }
        stored.post.content = content;
        Response::json(200, &stored.post)
    }

    fn delete_post(&mut self, caller: Caller, id: &str) -> Response {
        if !is_object_id(id) {
            return Response::json(400, &ErrorBody::error("Invalid Post ID"));
        }
        let Some(index) = self.posts.iter().position(|s| s.post.id == id) else {
            return Response::json(404, &ErrorBody::error("Post not found"));
        };
        if !caller.is_admin && self.posts[index].post.author != caller.username {
            return Response::json(403, &ErrorBody::msg("Unauthorized to delete this post"));
        }
        self.posts.remove(index);
        Response::json(200, &json!({ "message": "Post deleted successfully" }))
    }

    fn delete_user(&mut self, caller: Caller, id: &str) -> Response {
        if !caller.is_admin {
            return admin_required();
        }
        if self.account_id(&caller.username) == Some(id) {
            return Response::json(403, &ErrorBody::msg("Cannot delete your own account"));
        }
        match self.accounts.iter().position(|a| a.id == id) {
            Some(index) => {
                self.accounts.remove(index);
                Response::json(200, &json!({ "message": "User deleted successfully" }))
            },
            None => Response::json(404, &ErrorBody::error("User not found or failed to delete")),
        }
    }

    fn insert_post(&mut self, author: &str, content: &str) -> Post {
        let id = self.allocate_id();
        self.clock += 1;
        let post = Post {
            id,
            author: author.to_string(),
            content: content.to_string(),
            timestamp: format!("2024-01-01T{:02}:{:02}:{:02}", self.clock / 3600, self.clock / 60 % 60, self.clock % 60),
            date: Some("2024-01-01".to_string()),
        };
        self.posts.push(StoredPost { post: post.clone(), seq: self.clock });
        post
    }

    /// Object-id shaped identifier (24 hex digits).
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }
}

fn credentials(payload: Option<&Payload>) -> Option<&Credentials> {
    match payload {
        Some(Payload::Credentials(credentials)) => Some(credentials),
        _ => None,
    }
}

fn content(payload: Option<&Payload>) -> Option<&str> {
    match payload {
        Some(Payload::PostContent(body)) => Some(&body.content),
        _ => None,
    }
}

fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}

fn missing_credentials() -> Response {
    Response::json(400, &ErrorBody::msg("Missing username or password"))
}

fn admin_required() -> Response {
    Response::json(403, &ErrorBody::msg("Admin access required"))
}
