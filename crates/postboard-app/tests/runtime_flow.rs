//! Runtime flows over the simulated transport.

use postboard_app::{MemoryTokenStore, Runtime, RuntimeError, TokenStore};
use postboard_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, ModalResolution, Operation,
    Scope, SyncPolicy,
};
use postboard_harness::{SimBackend, SimTransport, corrupt_token, mint_token};
use postboard_proto::Endpoint;

fn runtime(
    backend: SimBackend,
    store: MemoryTokenStore,
) -> (Runtime<SimTransport, MemoryTokenStore>, SimTransport) {
    let transport = SimTransport::new(backend);
    let runtime = Runtime::new(Client::new(ClientConfig::default()), transport.clone(), store);
    (runtime, transport)
}

#[tokio::test]
async fn login_persists_token_and_authorizes_later_calls() {
    let mut backend = SimBackend::new();
    backend.add_account("alice", "pw", false);
    let store = MemoryTokenStore::new();
    let (mut rt, transport) = runtime(backend, store.clone());
    rt.start().unwrap();

    rt.submit(ClientEvent::Login { username: "alice".into(), password: "pw".into() }).unwrap();
    let actions = rt.settle().await.unwrap();

    assert!(actions.contains(&ClientAction::Completed { operation: Operation::Login }));
    let token = store.get().unwrap();

    rt.submit(ClientEvent::CreatePost { content: "hello".into() }).unwrap();
    rt.settle().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[1].authorization, Some(format!("Bearer {token}")));
    assert_eq!(transport.count(&Endpoint::ListPosts), 1);
    assert_eq!(rt.client().posts().items().len(), 1);
    assert_eq!(rt.pending(), 0);
}

#[tokio::test]
async fn corrupt_stored_token_is_cleared_on_start() {
    let store = MemoryTokenStore::with_token(corrupt_token());
    let (mut rt, transport) = runtime(SimBackend::new(), store.clone());

    rt.start().unwrap();

    assert_eq!(store.get(), None);
    assert!(!rt.client().session().is_authenticated());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn logout_clears_store() {
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut rt, _) = runtime(SimBackend::new(), store.clone());
    rt.start().unwrap();
    assert!(rt.client().session().is_authenticated());

    rt.submit(ClientEvent::Logout).unwrap();

    assert_eq!(rt.store().load().unwrap(), None);
}

#[tokio::test]
async fn validation_error_surfaces_without_calls() {
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut rt, transport) = runtime(SimBackend::new(), store);
    rt.start().unwrap();

    let result = rt.submit(ClientEvent::CreatePost { content: "  ".into() });

    assert!(matches!(result, Err(RuntimeError::Client(ClientError::Validation(_)))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn network_failure_is_classified() {
    let (mut rt, transport) = runtime(SimBackend::new(), MemoryTokenStore::new());
    rt.start().unwrap();
    transport.fail_next("connection refused");

    rt.submit(ClientEvent::FetchPosts).unwrap();
    let actions = rt.settle().await.unwrap();

    let [ClientAction::Failed { error, .. }] = actions.as_slice() else {
        panic!("expected failure, got {actions:?}");
    };
    assert_eq!(error.message, "Failed to load posts. Network error: connection refused");
}

#[tokio::test]
async fn overlapping_reloads_keep_newest_issued() {
    let mut backend = SimBackend::new();
    backend.add_post("alice", "first");
    let (mut rt, transport) = runtime(backend, MemoryTokenStore::new());
    rt.start().unwrap();
    transport.hold(true);

    rt.submit(ClientEvent::FetchPosts).unwrap();
    transport.with_backend(|b| b.add_post("alice", "second"));
    rt.submit(ClientEvent::FetchPosts).unwrap();
    assert_eq!(transport.parked().len(), 2);

    // Older reload arrives last and is dropped even though it carries more.
    transport.release(1);
    rt.next_completion().await.unwrap().unwrap();
    transport.with_backend(|b| b.add_post("alice", "third"));
    transport.release(0);
    rt.next_completion().await.unwrap().unwrap();

    assert_eq!(rt.client().posts().items().len(), 2);
    assert_eq!(rt.client().config().sync_policy, SyncPolicy::LatestIssued);
}

#[tokio::test]
async fn closing_scope_aborts_call() {
    let (mut rt, transport) = runtime(SimBackend::new(), MemoryTokenStore::new());
    rt.start().unwrap();
    transport.hold(true);

    rt.submit(ClientEvent::FetchPosts).unwrap();
    assert_eq!(rt.pending(), 1);

    let actions = rt.submit(ClientEvent::CloseScope(Scope::Posts)).unwrap();
    assert!(matches!(actions.as_slice(), [ClientAction::Cancel(_)]));

    transport.release_all();
    assert!(rt.settle().await.unwrap().is_empty());
    assert_eq!(rt.pending(), 0);
    assert!(rt.client().posts().items().is_empty());
}

#[tokio::test]
async fn admin_user_delete_round_trip() {
    let mut backend = SimBackend::with_admin("admin", "pw");
    let bob = backend.add_account("bob", "pw", false);
    let store = MemoryTokenStore::with_token(mint_token("admin", true));
    let (mut rt, transport) = runtime(backend, store);
    rt.start().unwrap();

    rt.submit(ClientEvent::FetchUsers).unwrap();
    rt.settle().await.unwrap();

    let actions = rt.submit(ClientEvent::DeleteUser { id: bob }).unwrap();
    let [ClientAction::ShowModal(confirm)] = actions.as_slice() else {
        panic!("expected confirmation, got {actions:?}");
    };
    rt.submit(ClientEvent::ResolveModal {
        modal_id: confirm.id,
        resolution: ModalResolution::Confirm,
    })
    .unwrap();
    rt.settle().await.unwrap();

    assert_eq!(rt.client().users().items().len(), 1);
    assert_eq!(transport.count(&Endpoint::ListUsers), 2);
    assert_eq!(
        rt.client().modal().map(|m| m.message.as_str()),
        Some("User \"bob\" deleted successfully.")
    );
}
