//! Collection synchronization against the simulated backend.
//!
//! Each test ends with assertions over observable state: the local
//! collection, the recorded outward calls and the dialog slot.

use postboard_client::{
    ClientAction, ClientConfig, ClientError, ClientEvent, ErrorKind, ModalKind, ModalRequest,
    ModalResolution, MessageKind, Operation, Scope, SyncPolicy,
};
use postboard_harness::{SimBackend, SimDriver, mint_token};
use postboard_proto::Endpoint;

fn signed_in(username: &str, is_admin: bool, backend: SimBackend) -> SimDriver {
    signed_in_with(ClientConfig::default(), username, is_admin, backend)
}

fn signed_in_with(
    config: ClientConfig,
    username: &str,
    is_admin: bool,
    backend: SimBackend,
) -> SimDriver {
    let mut sim = SimDriver::new(config, backend);
    sim.set_stored_token(Some(mint_token(username, is_admin)));
    sim.start().unwrap();
    sim
}

fn shown_modal(actions: &[ClientAction]) -> ModalRequest {
    actions
        .iter()
        .find_map(|a| match a {
            ClientAction::ShowModal(request) => Some(request.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no dialog in {actions:?}"))
}

fn resolve(modal: &ModalRequest, resolution: ModalResolution) -> ClientEvent {
    ClientEvent::ResolveModal { modal_id: modal.id, resolution }
}

#[test]
fn blank_content_fails_validation_without_calls() {
    let mut sim = signed_in("alice", false, SimBackend::new());

    for content in ["", "   "] {
        let result = sim.step(ClientEvent::CreatePost { content: content.into() });
        assert_eq!(result, Err(ClientError::Validation("Post content cannot be empty!".into())));
    }

    assert!(sim.calls().is_empty());
    assert_eq!(sim.client().in_flight(), 0);
}

#[test]
fn create_refetches_in_server_order() {
    let mut backend = SimBackend::new();
    backend.add_post("bob", "older");
    let mut sim = signed_in("alice", false, backend);

    let actions = sim.step(ClientEvent::CreatePost { content: "newer".into() }).unwrap();

    assert!(actions.contains(&ClientAction::Completed { operation: Operation::CreatePost }));
    assert_eq!(sim.count(&Endpoint::ListPosts), 1);
    let contents: Vec<&str> =
        sim.client().posts().items().iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, ["newer", "older"]);
}

#[test]
fn update_triggers_exactly_one_refetch() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "old text");
    let mut sim = signed_in("alice", false, backend);
    sim.step(ClientEvent::FetchPosts).unwrap();
    let before = sim.count(&Endpoint::ListPosts);

    let actions =
        sim.step(ClientEvent::UpdatePost { id: id.clone(), content: "new text".into() }).unwrap();

    assert!(actions.contains(&ClientAction::Completed { operation: Operation::UpdatePost }));
    assert_eq!(sim.count(&Endpoint::UpdatePost { id }), 1);
    assert_eq!(sim.count(&Endpoint::ListPosts), before + 1);
    assert_eq!(sim.client().posts().items()[0].content, "new text");
    assert_eq!(sim.client().modal(), None);
}

#[test]
fn rejected_update_is_forbidden_and_not_refetched() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("bob", "bob's");
    let mut sim = signed_in("alice", false, backend);
    sim.step(ClientEvent::FetchPosts).unwrap();

    assert!(!sim.client().can_modify(&sim.client().posts().items()[0]));

    let actions = sim.step(ClientEvent::UpdatePost { id, content: "mine now".into() }).unwrap();

    let [ClientAction::Failed { operation: Operation::UpdatePost, error }] = actions.as_slice()
    else {
        panic!("expected inline failure, got {actions:?}");
    };
    assert_eq!(error.kind, ErrorKind::Forbidden);
    assert_eq!(error.message, "You are not authorized to edit this post.");
    assert_eq!(sim.count(&Endpoint::ListPosts), 1);
    assert_eq!(sim.client().posts().items()[0].content, "bob's");
}

#[test]
fn cancelled_delete_leaves_everything_unchanged() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "keep me");
    let mut sim = signed_in("alice", false, backend);
    sim.step(ClientEvent::FetchPosts).unwrap();
    let calls = sim.calls().len();

    let dialog = shown_modal(&sim.submit(ClientEvent::DeletePost { id }).unwrap());
    assert_eq!(dialog.kind, ModalKind::Confirm);
    assert_eq!(dialog.message, "Are you sure you want to delete this post?");

    let actions = sim.submit(resolve(&dialog, ModalResolution::Cancel)).unwrap();
    sim.run_until_idle().unwrap();

    assert_eq!(actions, vec![ClientAction::CloseModal(dialog.id)]);
    assert_eq!(sim.calls().len(), calls);
    assert_eq!(sim.client().posts().items().len(), 1);
    assert_eq!(sim.client().modal(), None);
}

#[test]
fn confirmed_delete_removes_and_refetches() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "bye");
    let mut sim = signed_in("alice", false, backend);
    sim.step(ClientEvent::FetchPosts).unwrap();

    let dialog = shown_modal(&sim.submit(ClientEvent::DeletePost { id: id.clone() }).unwrap());
    sim.submit(resolve(&dialog, ModalResolution::Confirm)).unwrap();
    let actions = sim.run_until_idle().unwrap();

    assert!(actions.contains(&ClientAction::Completed { operation: Operation::DeletePost }));
    assert_eq!(sim.count(&Endpoint::DeletePost { id }), 1);
    assert_eq!(sim.count(&Endpoint::ListPosts), 2);
    assert!(sim.client().posts().items().is_empty());
}

#[test]
fn sentinel_account_is_never_deleted() {
    for caller in ["root", "admin"] {
        let backend = SimBackend::with_admin("admin", "pw");
        let sentinel_id = backend.account_id("admin").unwrap().to_string();
        let mut sim = signed_in(caller, true, backend);
        sim.step(ClientEvent::FetchUsers).unwrap();
        let calls = sim.calls().len();

        let dialog = shown_modal(&sim.submit(ClientEvent::DeleteUser { id: sentinel_id }).unwrap());
        sim.run_until_idle().unwrap();

        assert_eq!(dialog.kind, ModalKind::Message(MessageKind::Error));
        assert_eq!(dialog.message, "Cannot delete the default 'admin' account.");
        assert_eq!(sim.calls().len(), calls);
        assert!(sim.backend().account_id("admin").is_some());
    }
}

#[test]
fn admin_deletes_user_after_confirmation() {
    let mut backend = SimBackend::with_admin("admin", "pw");
    let bob = backend.add_account("bob", "pw", false);
    let mut sim = signed_in("admin", true, backend);
    sim.step(ClientEvent::FetchUsers).unwrap();
    assert!(sim.client().can_modify(&sim.client().users().items()[1]));

    let confirm = shown_modal(&sim.submit(ClientEvent::DeleteUser { id: bob.clone() }).unwrap());
    assert_eq!(confirm.message, "Are you sure you want to delete user \"bob\"?");
    sim.submit(resolve(&confirm, ModalResolution::Confirm)).unwrap();
    let actions = sim.run_until_idle().unwrap();

    let done = shown_modal(&actions);
    assert_eq!(done.kind, ModalKind::Message(MessageKind::Success));
    assert_eq!(done.message, "User \"bob\" deleted successfully.");
    assert_eq!(sim.count(&Endpoint::DeleteUser { id: bob }), 1);
    assert_eq!(sim.count(&Endpoint::ListUsers), 2);
    assert_eq!(sim.client().users().items().len(), 1);

    sim.submit(resolve(&done, ModalResolution::Acknowledge)).unwrap();
    assert_eq!(sim.client().modal(), None);
}

#[test]
fn non_admin_cannot_open_user_list() {
    let mut sim = signed_in("alice", false, SimBackend::new());

    assert_eq!(sim.step(ClientEvent::FetchUsers), Err(ClientError::AdminRequired));
    assert!(sim.calls().is_empty());
}

#[test]
fn network_failure_composes_detail() {
    let mut sim = signed_in("alice", false, SimBackend::new());
    sim.submit(ClientEvent::FetchPosts).unwrap();
    let out = sim.send();

    let actions = sim.fail(&out[0], "connection refused").unwrap();

    let [ClientAction::Failed { error, .. }] = actions.as_slice() else {
        panic!("expected inline failure, got {actions:?}");
    };
    assert_eq!(error.kind, ErrorKind::NetworkFailure("connection refused".into()));
    assert_eq!(error.message, "Failed to load posts. Network error: connection refused");
    assert_eq!(sim.client().posts().error(), Some(error));
}

/// Stage two overlapping reloads and deliver the older one last.
///
/// Returns the number of posts held afterwards.
fn overlapping_reloads(policy: SyncPolicy) -> usize {
    let mut backend = SimBackend::new();
    backend.add_post("alice", "first");
    let config = ClientConfig { sync_policy: policy, ..ClientConfig::default() };
    let mut sim = signed_in_with(config, "alice", false, backend);

    sim.submit(ClientEvent::FetchPosts).unwrap();
    let slow = sim.send();
    let slow_response = sim.backend().handle(&slow[0].request);

    sim.backend().add_post("alice", "second");
    sim.submit(ClientEvent::FetchPosts).unwrap();
    let fast = sim.send();
    sim.answer(&fast[0]).unwrap();
    assert_eq!(sim.client().posts().items().len(), 2);

    sim.deliver(&slow[0], Ok(slow_response)).unwrap();
    sim.client().posts().items().len()
}

#[test]
fn stale_reload_is_discarded_under_latest_issued() {
    assert_eq!(overlapping_reloads(SyncPolicy::LatestIssued), 2);
}

#[test]
fn stale_reload_wins_under_last_arrival() {
    assert_eq!(overlapping_reloads(SyncPolicy::LastArrival), 1);
}

#[test]
fn closed_scope_ignores_late_response() {
    let mut backend = SimBackend::new();
    backend.add_post("alice", "late");
    let mut sim = signed_in("alice", false, backend);
    sim.submit(ClientEvent::FetchPosts).unwrap();
    let out = sim.send();

    let actions = sim.submit(ClientEvent::CloseScope(Scope::Posts)).unwrap();
    assert_eq!(actions, vec![ClientAction::Cancel(out[0].id)]);

    assert!(sim.answer(&out[0]).unwrap().is_empty());
    assert!(sim.client().posts().items().is_empty());
    assert_eq!(sim.client().in_flight(), 0);
}

#[test]
fn closing_scope_dismisses_its_dialog() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "x");
    let mut sim = signed_in("alice", false, backend);
    sim.step(ClientEvent::FetchPosts).unwrap();
    let dialog = shown_modal(&sim.submit(ClientEvent::DeletePost { id }).unwrap());

    let actions = sim.submit(ClientEvent::CloseScope(Scope::Posts)).unwrap();

    assert_eq!(actions, vec![ClientAction::CloseModal(dialog.id)]);
    assert_eq!(sim.client().modal(), None);
    assert!(sim.submit(resolve(&dialog, ModalResolution::Confirm)).is_err());
}
