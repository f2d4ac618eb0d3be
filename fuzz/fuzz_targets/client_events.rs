//! Fuzz target for the client state machine
//!
//! Drive a `Client` with arbitrary user intents and arbitrary responses,
//! delivered in any order, including for requests that were abandoned.
//!
//! # Invariants
//!
//! - NEVER panic, whatever the event order
//! - At most one dialog is open
//! - A response for an unknown request produces no actions
//! - After closing a scope, no request of that scope is in flight
//! - Logout leaves no session and no user data

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use postboard_client::{
    ClientAction, ClientConfig, ClientEvent, Client, ModalResolution, NoResponse, Outbound,
    RequestId, Scope, SyncPolicy,
};
use postboard_harness::mint_token;
use postboard_proto::{ErrorBody, LoginResponse, Post, Response, User};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Restore { name: Name, is_admin: bool },
    Login { name: Name, password: bool },
    Logout,
    FetchPosts,
    CreatePost { content: String },
    UpdatePost { index: u8, content: String },
    DeletePost { index: u8 },
    FetchUsers,
    DeleteUser { index: u8 },
    Resolve { resolution: Resolution, stale: bool },
    Send,
    Respond { index: u8, reply: Reply },
    Forged { id: u64 },
    CloseScope { scope: ScopeChoice },
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Name {
    Alice,
    Bob,
    Admin,
}

impl Name {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alice => "alice",
            Self::Bob => "bob",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Resolution {
    Confirm,
    Cancel,
    Acknowledge,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum ScopeChoice {
    Session,
    Posts,
    Users,
}

#[derive(Debug, Clone, Arbitrary)]
enum Reply {
    Posts { authors: Vec<Name> },
    Users { names: Vec<Name> },
    Login { name: Name, is_admin: bool, corrupt: bool },
    Error { status: u16, detail: Option<String> },
    Empty { status: u16 },
    Garbage { status: u16, body: Vec<u8> },
    Lost { detail: String },
}

#[derive(Debug, Arbitrary)]
struct Input {
    last_arrival: bool,
    ops: Vec<Op>,
}

fn reply(reply: Reply) -> Result<Response, NoResponse> {
    let response = match reply {
        Reply::Posts { authors } => {
            let posts: Vec<Post> = authors
                .into_iter()
                .enumerate()
                .map(|(i, author)| Post {
                    id: format!("{i:024x}"),
                    author: author.as_str().to_string(),
                    content: format!("post {i}"),
                    timestamp: "2024-01-01T00:00:00".to_string(),
                    date: None,
                })
                .collect();
            Response::json(200, &posts)
        },
        Reply::Users { names } => {
            let users: Vec<User> = names
                .into_iter()
                .enumerate()
                .map(|(i, name)| User {
                    id: format!("{i:024x}"),
                    username: name.as_str().to_string(),
                    is_admin: matches!(name, Name::Admin),
                })
                .collect();
            Response::json(200, &users)
        },
        Reply::Login { name, is_admin, corrupt } => {
            let access_token =
                if corrupt { "x.y".to_string() } else { mint_token(name.as_str(), is_admin) };
            let body =
                LoginResponse { access_token, username: name.as_str().to_string(), is_admin };
            Response::json(200, &body)
        },
        Reply::Error { status, detail } => match detail {
            Some(detail) => Response::json(status, &ErrorBody::error(detail)),
            None => Response::empty(status),
        },
        Reply::Empty { status } => Response::empty(status),
        Reply::Garbage { status, body } => Response { status, body },
        Reply::Lost { detail } => return Err(NoResponse { detail }),
    };
    Ok(response)
}

fn pick(len: usize, index: u8) -> Option<usize> {
    (len > 0).then(|| usize::from(index) % len)
}

fuzz_target!(|input: Input| {
    let sync_policy =
        if input.last_arrival { SyncPolicy::LastArrival } else { SyncPolicy::LatestIssued };
    let mut client = Client::new(ClientConfig { sync_policy, ..ClientConfig::default() });
    let mut sent: Vec<Outbound> = Vec::new();
    let mut last_modal = None;

    for op in input.ops {
        let event = match op {
            Op::Restore { name, is_admin } => ClientEvent::Initialize {
                persisted_token: Some(mint_token(name.as_str(), is_admin)),
            },
            Op::Login { name, password } => ClientEvent::Login {
                username: name.as_str().to_string(),
                password: if password { "pw".to_string() } else { String::new() },
            },
            Op::Logout => ClientEvent::Logout,
            Op::FetchPosts => ClientEvent::FetchPosts,
            Op::CreatePost { content } => ClientEvent::CreatePost { content },
            Op::UpdatePost { index, content } => {
                let Some(i) = pick(client.posts().items().len(), index) else { continue };
                ClientEvent::UpdatePost { id: client.posts().items()[i].id.clone(), content }
            },
            Op::DeletePost { index } => {
                let Some(i) = pick(client.posts().items().len(), index) else { continue };
                ClientEvent::DeletePost { id: client.posts().items()[i].id.clone() }
            },
            Op::FetchUsers => ClientEvent::FetchUsers,
            Op::DeleteUser { index } => {
                let Some(i) = pick(client.users().items().len(), index) else { continue };
                ClientEvent::DeleteUser { id: client.users().items()[i].id.clone() }
            },
            Op::Resolve { resolution, stale } => {
                let modal_id = if stale {
                    match last_modal {
                        Some(id) => id,
                        None => continue,
                    }
                } else {
                    match client.modal() {
                        Some(request) => request.id,
                        None => continue,
                    }
                };
                let resolution = match resolution {
                    Resolution::Confirm => ModalResolution::Confirm,
                    Resolution::Cancel => ModalResolution::Cancel,
                    Resolution::Acknowledge => ModalResolution::Acknowledge,
                };
                ClientEvent::ResolveModal { modal_id, resolution }
            },
            Op::Send => {
                sent.extend(client.take_outgoing());
                continue;
            },
            Op::Respond { index, reply: r } => {
                let Some(i) = pick(sent.len(), index) else { continue };
                let outbound = sent.swap_remove(i);
                ClientEvent::Response { request_id: outbound.id, result: reply(r) }
            },
            Op::Forged { id } => {
                let actions = client
                    .handle(ClientEvent::Response {
                        request_id: RequestId(id | 1 << 63),
                        result: Ok(Response::empty(200)),
                    })
                    .expect("responses are never rejected");
                assert!(actions.is_empty(), "unknown request produced {actions:?}");
                continue;
            },
            Op::CloseScope { scope } => ClientEvent::CloseScope(match scope {
                ScopeChoice::Session => Scope::Session,
                ScopeChoice::Posts => Scope::Posts,
                ScopeChoice::Users => Scope::Users,
            }),
        };

        let closed_scope = match &event {
            ClientEvent::CloseScope(scope) => Some(*scope),
            _ => None,
        };
        let logout = matches!(event, ClientEvent::Logout);

        if let Ok(actions) = client.handle(event) {
            let shown = actions.iter().filter(|a| matches!(a, ClientAction::ShowModal(_))).count();
            assert!(shown <= 1, "several dialogs opened at once: {actions:?}");
        }

        if let Some(request) = client.modal() {
            last_modal = Some(request.id);
        }

        match closed_scope {
            Some(Scope::Posts) => assert_eq!(client.posts().in_flight(), 0),
            Some(Scope::Users) => assert_eq!(client.users().in_flight(), 0),
            Some(Scope::Session) | None => {},
        }
        if logout {
            assert!(!client.session().is_authenticated());
            assert!(client.users().items().is_empty());
            assert_eq!(client.users().in_flight(), 0);
        }
    }
});
