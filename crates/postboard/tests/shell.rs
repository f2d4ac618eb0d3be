//! Commands end to end over the simulated transport.

use postboard::{CliError, Command, Console, PostsCommand, Shell, UsersCommand};
use postboard_app::{MemoryTokenStore, Runtime};
use postboard_client::{Client, ClientConfig};
use postboard_harness::{SimBackend, SimTransport, mint_token};
use postboard_proto::Endpoint;

type TestShell<'a> = Shell<SimTransport, MemoryTokenStore, &'a [u8], Vec<u8>>;

fn shell<'a>(
    backend: SimBackend,
    store: MemoryTokenStore,
    input: &'a str,
) -> (TestShell<'a>, SimTransport) {
    let transport = SimTransport::new(backend);
    let runtime = Runtime::new(Client::new(ClientConfig::default()), transport.clone(), store);
    (Shell::new(runtime, Console::new(input.as_bytes(), Vec::new())), transport)
}

fn output(shell: &TestShell<'_>) -> String {
    String::from_utf8_lossy(shell.console().output()).into_owned()
}

#[tokio::test]
async fn login_prompts_for_password_and_stores_token() {
    let mut backend = SimBackend::new();
    backend.add_account("alice", "pw", false);
    let store = MemoryTokenStore::new();
    let (mut sh, _) = shell(backend, store.clone(), "pw\n");

    sh.run(Command::Login { username: "alice".into(), password: None }).await.unwrap();

    assert!(store.get().is_some());
    assert_eq!(output(&sh), "Password: Logged in as alice\n");
}

#[tokio::test]
async fn failed_login_reports_composed_message() {
    let mut backend = SimBackend::new();
    backend.add_account("alice", "pw", false);
    let store = MemoryTokenStore::new();
    let (mut sh, _) = shell(backend, store.clone(), "");

    let err = sh
        .run(Command::Login { username: "alice".into(), password: Some("nope".into()) })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Login failed. Please check your credentials. Server says: Bad username or password"
    );
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn register_mismatch_is_rejected_locally() {
    let (mut sh, transport) = shell(SimBackend::new(), MemoryTokenStore::new(), "a\nb\n");

    let err =
        sh.run(Command::Register { username: "bob".into(), password: None }).await.unwrap_err();

    assert_eq!(err.to_string(), "Passwords do not match!");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn register_prints_success_and_next_step() {
    let (mut sh, transport) = shell(SimBackend::new(), MemoryTokenStore::new(), "pw\npw\n");

    sh.run(Command::Register { username: "bob".into(), password: None }).await.unwrap();

    assert!(output(&sh).ends_with(
        "Registration successful! Please log in.\nSign in with: postboard login bob\n"
    ));
    assert!(transport.with_backend(|b| b.account_id("bob").is_some()));
}

#[tokio::test]
async fn whoami_reflects_stored_token() {
    let store = MemoryTokenStore::with_token(mint_token("root", true));
    let (mut sh, _) = shell(SimBackend::new(), store, "");

    sh.run(Command::Whoami).await.unwrap();

    assert_eq!(output(&sh), "Logged in as root (admin)\n");
}

#[tokio::test]
async fn logout_clears_store() {
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut sh, _) = shell(SimBackend::new(), store.clone(), "");

    sh.run(Command::Logout).await.unwrap();

    assert_eq!(store.get(), None);
    assert_eq!(output(&sh), "Logged out.\n");
}

#[tokio::test]
async fn list_marks_own_posts() {
    let mut backend = SimBackend::new();
    backend.add_post("bob", "from bob");
    backend.add_post("alice", "from alice");
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut sh, _) = shell(backend, store, "");

    sh.run(Command::Posts(PostsCommand::List)).await.unwrap();

    let out = output(&sh);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("* ") && lines[0].contains("alice"));
    assert_eq!(lines[1], "    from alice");
    assert!(lines[2].starts_with("  ") && lines[2].contains("bob"));
}

#[tokio::test]
async fn empty_post_is_rejected() {
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut sh, transport) = shell(SimBackend::new(), store, "");

    let err = sh.run(Command::Posts(PostsCommand::Add { content: " ".into() })).await.unwrap_err();

    assert!(matches!(err, CliError::Failed(_)));
    assert_eq!(err.to_string(), "Post content cannot be empty!");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn declined_delete_keeps_post() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "keep");
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut sh, transport) = shell(backend, store, "n\n");

    sh.run(Command::Posts(PostsCommand::Delete { id: id.clone() })).await.unwrap();

    assert!(output(&sh).ends_with("Are you sure you want to delete this post? [y/N] Cancelled.\n"));
    assert_eq!(transport.count(&Endpoint::DeletePost { id }), 0);
}

#[tokio::test]
async fn confirmed_delete_removes_post() {
    let mut backend = SimBackend::new();
    let id = backend.add_post("alice", "bye");
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (sh, transport) = shell(backend, store, "");
    let mut sh = sh.assume_yes(true);

    sh.run(Command::Posts(PostsCommand::Delete { id: id.clone() })).await.unwrap();

    assert_eq!(output(&sh), "Post deleted.\n");
    assert_eq!(transport.count(&Endpoint::DeletePost { id }), 1);
    assert!(sh.runtime().client().posts().items().is_empty());
}

#[tokio::test]
async fn protected_account_reports_dialog_error() {
    let backend = SimBackend::with_admin("admin", "pw");
    let id = backend.account_id("admin").unwrap().to_string();
    let store = MemoryTokenStore::with_token(mint_token("admin", true));
    let (sh, transport) = shell(backend, store, "");
    let mut sh = sh.assume_yes(true);

    let err = sh.run(Command::Users(UsersCommand::Delete { id: id.clone() })).await.unwrap_err();

    assert!(matches!(err, CliError::Dialog(_)));
    assert_eq!(err.to_string(), "Cannot delete the default 'admin' account.");
    assert_eq!(transport.count(&Endpoint::DeleteUser { id }), 0);
}

#[tokio::test]
async fn admin_deletes_user() {
    let mut backend = SimBackend::with_admin("admin", "pw");
    let bob = backend.add_account("bob", "pw", false);
    let store = MemoryTokenStore::with_token(mint_token("admin", true));
    let (mut sh, _) = shell(backend, store, "yes\n");

    sh.run(Command::Users(UsersCommand::Delete { id: bob })).await.unwrap();

    assert_eq!(
        output(&sh),
        "Are you sure you want to delete user \"bob\"? [y/N] User \"bob\" deleted successfully.\n"
    );
    assert_eq!(sh.runtime().client().users().items().len(), 1);
}

#[tokio::test]
async fn user_list_requires_admin() {
    let store = MemoryTokenStore::with_token(mint_token("alice", false));
    let (mut sh, transport) = shell(SimBackend::new(), store, "");

    let err = sh.run(Command::Users(UsersCommand::List)).await.unwrap_err();

    assert_eq!(err.to_string(), "You do not have permission to view this page.");
    assert_eq!(transport.call_count(), 0);
}
