//! Interactive chat client for the ThreadWeaver backend.
//!
//! This binary signs the user in (when an auth provider is configured),
//! restores their current session and then runs a REPL over it.
//!
//! # Usage
//!
//! ```bash
//! # Local backend, no sign-in, unsaved conversation
//! threadweaver-chat
//!
//! # Restore a known user's session without signing in
//! threadweaver-chat --user-id 3f0c... --api-url http://localhost:8000/
//!
//! # Sign in against a Supabase project
//! threadweaver-chat --auth-url https://project.supabase.co --auth-key $ANON_KEY
//!
//! # Settings from a file, with one override
//! threadweaver-chat --config threadweaver.yaml --max-retries 2
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/history` - Show the conversation so far
//! - `/session` - Show the session id
//! - `/stats` - Show conversation statistics
//! - `/search <query>` - Search uploaded documents
//! - `/upload <file.txt>` - Upload a text file for search
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use threadweaver::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
    read_password,
};
use threadweaver::{
    AuthSession, BackendClient, ConversationController, LoginFlow, LoginMode, LoginOutcome,
    SearchResponse, SessionInit, StderrLogger, SubmitOutcome, SupabaseAuth,
};

/// Main entry point for the threadweaver-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("threadweaver-chat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;
    let use_color = config.use_color;

    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;
    let mut backend = BackendClient::from_config(&config.client)?;
    let mut user_id = config.user_id.clone();

    if config.client.auth_enabled() {
        let auth = SupabaseAuth::from_config(&config.client)?;
        let mut flow = LoginFlow::new(Arc::new(auth));
        if config.sign_up {
            flow.set_mode(LoginMode::SignUp);
        }
        let Some(session) = login(&mut flow, &mut rl, &mut renderer, config.email.as_deref()).await
        else {
            println!("\nGoodbye!");
            return Ok(());
        };
        backend = backend.with_access_token(&session.access_token)?;
        user_id = Some(session.user.id);
    }

    let backend = Arc::new(backend);
    let mut controller = ConversationController::with_backend(Arc::clone(&backend));
    if config.verbose {
        controller = controller.with_logger(Arc::new(StderrLogger::new()));
    }

    println!("ThreadWeaver Chat ({})", config.client.api_url);
    match user_id.as_deref() {
        Some(user_id) => match controller.initialize_session(user_id).await {
            SessionInit::Restored {
                session_id,
                restored,
            } => {
                renderer.print_info(&format!(
                    "Session {session_id} ({restored} earlier messages)"
                ));
                renderer.print_history(controller.history());
            }
            SessionInit::AlreadyInitialized => {}
            SessionInit::Unsaved { error } => {
                renderer.print_failure(
                    "Could not restore session, conversation will not be saved",
                    &error,
                );
            }
        },
        None => renderer.print_info("No user given; conversation will not be saved."),
    }
    println!("Type /help for commands, /quit to exit\n");

    // Show a pending indicator while a reply is outstanding.
    let mut updates = controller.subscribe();
    let indicator = tokio::spawn(async move {
        let mut renderer = PlainTextRenderer::with_color(use_color);
        while updates.changed().await.is_ok() {
            if updates.borrow_and_update().pending {
                renderer.print_pending();
            }
        }
    });

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                if let Some(cmd) = parse_command(&line) {
                    let _ = rl.add_history_entry(line.trim());
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => {
                            if controller.history().is_empty() {
                                renderer.print_info("No messages yet.");
                            } else {
                                renderer.print_history(controller.history());
                            }
                        }
                        ChatCommand::Session => match controller.session_id() {
                            Some(session_id) => {
                                renderer.print_info(&format!("Session: {session_id}"))
                            }
                            None => renderer.print_info("Session: (unsaved)"),
                        },
                        ChatCommand::Stats => print_stats(&controller),
                        ChatCommand::Search(query) => match backend.search(&query).await {
                            Ok(response) => print_search(&mut renderer, &response),
                            Err(error) => renderer.print_failure("Search failed", &error),
                        },
                        ChatCommand::Upload(path) => match backend.upload_document(&path).await {
                            Ok(uploaded) => renderer.print_info(&format!(
                                "Uploaded {path} as document {} ({} chunks)",
                                uploaded.document_id, uploaded.chunks_created
                            )),
                            Err(error) => renderer.print_failure("Upload failed", &error),
                        },
                        ChatCommand::Invalid(message) => renderer.print_error(&message),
                    }
                    continue;
                }

                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                controller.update_draft(line);
                match controller.submit_draft().await {
                    SubmitOutcome::Skipped => {}
                    SubmitOutcome::Replied(reply) => renderer.print_message(&reply),
                    SubmitOutcome::Failed(error) => renderer.print_failure("No reply", &error),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    drop(controller);
    let _ = indicator.await;
    Ok(())
}

/// Prompts until the provider accepts the credentials or input ends.
async fn login(
    flow: &mut LoginFlow,
    rl: &mut DefaultEditor,
    renderer: &mut impl Renderer,
    email: Option<&str>,
) -> Option<AuthSession> {
    let mut email = email.unwrap_or_default().to_string();
    loop {
        renderer.print_info(&format!("Please {} to continue.", flow.mode()));
        email = rl.readline_with_initial("Email: ", (email.as_str(), "")).ok()?;
        let password = read_password("Password: ").ok()?;
        flow.update_email(email.trim());
        flow.update_password(password);

        match flow.submit().await {
            LoginOutcome::Authenticated => return flow.session().cloned(),
            LoginOutcome::Invalid(reason) => renderer.print_error(&reason),
            LoginOutcome::Rejected(error) => renderer.print_failure("Sign-in failed", &error),
        }
    }
}

fn print_search(renderer: &mut impl Renderer, response: &SearchResponse) {
    if response.is_empty() {
        renderer.print_info("No matching documents.");
        return;
    }
    for (rank, result) in response.results.iter().enumerate() {
        renderer.print_info(&format!(
            "{}. [document {} chunk {}] {}",
            rank + 1,
            result.document_id,
            result.chunk_index,
            result.chunk_text.trim()
        ));
    }
}

fn print_stats(controller: &ConversationController) {
    let stats = controller.stats();
    println!("    Conversation Statistics:");
    match controller.session_id() {
        Some(session_id) => println!("      Session: {}", session_id),
        None => println!("      Session: (unsaved)"),
    }
    println!("      Messages: {}", stats.message_count);
    println!("      Sent: {}", stats.submissions);
    println!("      Replies: {}", stats.replies);
    println!("      Failed: {}", stats.failures);
}
