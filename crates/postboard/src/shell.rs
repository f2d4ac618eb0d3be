//! Command execution.
//!
//! A [`Shell`] owns the runtime and the console for one invocation. Commands
//! are submitted as client events; the shell then waits for the calls they
//! queue and answers every dialog the client opens until nothing is pending.

use std::io::{BufRead, Write};

use postboard_app::{Runtime, TokenStore, Transport};
use postboard_client::{
    ClientAction, ClientEvent, FollowUp, MessageKind, ModalKind, ModalRequest, ModalResolution,
    Operation,
};

use crate::{
    CliError, Console,
    cli::{Command, PostsCommand, UsersCommand},
};

/// Runs commands against a runtime, talking to the user through a console.
pub struct Shell<T: Transport, S: TokenStore, R, W> {
    runtime: Runtime<T, S>,
    console: Console<R, W>,
    assume_yes: bool,
}

impl<T, S, R, W> Shell<T, S, R, W>
where
    T: Transport,
    S: TokenStore,
    R: BufRead,
    W: Write,
{
    /// Shell over a runtime that has not been started yet.
    pub fn new(runtime: Runtime<T, S>, console: Console<R, W>) -> Self {
        Self { runtime, console, assume_yes: false }
    }

    /// Answer every confirmation with yes.
    #[must_use]
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// The runtime.
    pub fn runtime(&self) -> &Runtime<T, S> {
        &self.runtime
    }

    /// The console.
    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Restore the session, then run `command`.
    pub async fn run(&mut self, command: Command) -> Result<(), CliError> {
        self.runtime.start()?;

        match command {
            Command::Login { username, password } => self.login(username, password).await,
            Command::Register { username, password } => self.register(username, password).await,
            Command::Logout => self.logout(),
            Command::Whoami => self.whoami(),
            Command::Posts(command) => self.posts(command).await,
            Command::Users(command) => self.users(command).await,
        }
    }

    async fn login(&mut self, username: String, password: Option<String>) -> Result<(), CliError> {
        let password = match password {
            Some(password) => password,
            None => self.console.ask("Password: ")?,
        };

        self.step(ClientEvent::Login { username, password }).await?;
        self.whoami()
    }

    async fn register(
        &mut self,
        username: String,
        password: Option<String>,
    ) -> Result<(), CliError> {
        let (password, confirm_password) = match password {
            Some(password) => (password.clone(), password),
            None => (self.console.ask("Password: ")?, self.console.ask("Confirm password: ")?),
        };

        let actions = self
            .step(ClientEvent::Register { username: username.clone(), password, confirm_password })
            .await?;

        if actions.contains(&ClientAction::FollowUp(FollowUp::NavigateToLogin)) {
            self.console.line(format_args!("Sign in with: postboard login {username}"))?;
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<(), CliError> {
        self.runtime.submit(ClientEvent::Logout)?;
        self.console.line("Logged out.")
    }

    fn whoami(&mut self) -> Result<(), CliError> {
        match self.runtime.client().session().claims() {
            Some(claims) if claims.is_admin => {
                self.console.line(format_args!("Logged in as {} (admin)", claims.subject))
            },
            Some(claims) => self.console.line(format_args!("Logged in as {}", claims.subject)),
            None => self.console.line("Not logged in."),
        }
    }

    async fn posts(&mut self, command: PostsCommand) -> Result<(), CliError> {
        match command {
            PostsCommand::List => {
                self.step(ClientEvent::FetchPosts).await?;
                self.list_posts()
            },
            PostsCommand::Add { content } => {
                self.step(ClientEvent::CreatePost { content }).await?;
                self.console.line("Post published.")
            },
            PostsCommand::Edit { id, content } => {
                self.step(ClientEvent::UpdatePost { id, content }).await?;
                self.console.line("Post updated.")
            },
            PostsCommand::Delete { id } => {
                self.step(ClientEvent::FetchPosts).await?;
                let actions = self.step(ClientEvent::DeletePost { id }).await?;
                if completed(&actions, Operation::DeletePost) {
                    self.console.line("Post deleted.")
                } else {
                    self.console.line("Cancelled.")
                }
            },
        }
    }

    async fn users(&mut self, command: UsersCommand) -> Result<(), CliError> {
        self.step(ClientEvent::FetchUsers).await?;

        match command {
            UsersCommand::List => self.list_users(),
            UsersCommand::Delete { id } => {
                let actions = self.step(ClientEvent::DeleteUser { id }).await?;
                if !completed(&actions, Operation::DeleteUser) {
                    self.console.line("Cancelled.")?;
                }
                Ok(())
            },
        }
    }

    fn list_posts(&mut self) -> Result<(), CliError> {
        let client = self.runtime.client();
        if client.posts().items().is_empty() {
            return self.console.line("No posts yet.");
        }

        let lines: Vec<String> = client
            .posts()
            .items()
            .iter()
            .map(|post| {
                let mark = if client.can_modify(post) { "*" } else { " " };
                let header = format!("{mark} {}  {}  {}", post.id, post.author, post.timestamp);
                format!("{header}\n    {}", post.content)
            })
            .collect();
        for line in lines {
            self.console.line(line)?;
        }
        Ok(())
    }

    fn list_users(&mut self) -> Result<(), CliError> {
        let client = self.runtime.client();
        let lines: Vec<String> = client
            .users()
            .items()
            .iter()
            .map(|user| {
                let mark = if client.can_modify(user) { "*" } else { " " };
                let role = if user.is_admin { "admin" } else { "user" };
                format!("{mark} {}  {}  {role}", user.id, user.username)
            })
            .collect();
        for line in lines {
            self.console.line(line)?;
        }
        Ok(())
    }

    /// Submit `event` and drive it to completion.
    ///
    /// Fails with the first inline failure or error dialog among the
    /// resulting actions.
    async fn step(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, CliError> {
        let mut actions = self.runtime.submit(event)?;
        let mut dialog_error = None;

        loop {
            actions.extend(self.runtime.settle().await?);

            let Some(dialog) = self.runtime.client().modal().cloned() else {
                break;
            };
            if let ModalKind::Message(MessageKind::Error) = dialog.kind {
                dialog_error = Some(dialog.message.clone());
            }
            let resolution = self.answer(&dialog)?;
            actions.extend(
                self.runtime
                    .submit(ClientEvent::ResolveModal { modal_id: dialog.id, resolution })?,
            );
        }

        if let Some(error) = actions.iter().find_map(|action| match action {
            ClientAction::Failed { error, .. } => Some(error.clone()),
            _ => None,
        }) {
            return Err(CliError::Failed(error));
        }
        match dialog_error {
            Some(message) => Err(CliError::Dialog(message)),
            None => Ok(actions),
        }
    }

    fn answer(&mut self, dialog: &ModalRequest) -> Result<ModalResolution, CliError> {
        tracing::debug!(modal = %dialog.id, kind = ?dialog.kind, "answering dialog");

        match dialog.kind {
            ModalKind::Confirm => {
                if self.assume_yes || self.console.confirm(&dialog.message)? {
                    Ok(ModalResolution::Confirm)
                } else {
                    Ok(ModalResolution::Cancel)
                }
            },
            // Error text is reported by the caller
            ModalKind::Message(MessageKind::Error) => Ok(ModalResolution::Acknowledge),
            ModalKind::Message(MessageKind::Info | MessageKind::Success) => {
                self.console.line(&dialog.message)?;
                Ok(ModalResolution::Acknowledge)
            },
        }
    }
}

fn completed(actions: &[ClientAction], operation: Operation) -> bool {
    actions.contains(&ClientAction::Completed { operation })
}
