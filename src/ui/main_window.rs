use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::backend::Backend;
use crate::api::models::Session;
use crate::app::AppConfig;
use crate::chat::controller::{ChatController, Notice};
use crate::chat::export::{default_file_name, DateRange};
use crate::error::Result;
use crate::storage::SessionStore;
use crate::ui::chat_view::ChatView;
use crate::ui::sidebar::Sidebar;
use crate::ui::{is_eof, print_prompt, Console};

const HELP: &str = "\
Type a message and press Enter to send it to the open chat.
  /contacts             show the contact list
  /open <n|chat id>     open a chat
  /search <text>        filter contacts (empty clears)
  /new <user>[, ...]    start a chat with usernames or emails
  /leave                leave the open chat
  /profile              show your profile
  /username <name>      change your username
  /password             change your password
  /export <from> <to> [file]   save the open chat (dates YYYY-MM-DD, to may be 'current')
  /refresh              reload contacts
  /ping                 check the server
  /logout               sign out
  /quit                 exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Logout,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Contacts,
    Open(String),
    Search(String),
    New(String),
    Leave,
    Profile,
    Username(String),
    Password,
    Export { from: String, to: String, path: Option<String> },
    Refresh,
    Ping,
    Logout,
    Quit,
    Help,
    Unknown(String),
}

/// Anything not starting with `/` is a message; `//` escapes a leading slash.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };
    if rest.starts_with('/') {
        return Command::Send(rest.to_string());
    }
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name.to_lowercase().as_str() {
        "contacts" => Command::Contacts,
        "open" => Command::Open(arg.to_string()),
        "search" => Command::Search(arg.to_string()),
        "new" => Command::New(arg.to_string()),
        "leave" | "delete" => Command::Leave,
        "profile" => Command::Profile,
        "username" => Command::Username(arg.to_string()),
        "password" => Command::Password,
        "export" | "download" => {
            let mut parts = arg.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(from), Some(to)) => Command::Export {
                    from: from.to_string(),
                    to: to.to_string(),
                    path: parts.next().map(str::to_string),
                },
                _ => Command::Unknown(line.to_string()),
            }
        }
        "refresh" => Command::Refresh,
        "ping" => Command::Ping,
        "logout" => Command::Logout,
        "quit" | "exit" => Command::Quit,
        "help" | "?" => Command::Help,
        _ => Command::Unknown(line.to_string()),
    }
}

fn show_thread(controller: &ChatController) {
    println!(
        "{}",
        ChatView::render(
            controller.selected_contact(),
            controller.messages(),
            controller.is_loading(),
            |m| controller.is_own(m),
        )
    );
}

fn report(controller: &ChatController, notice: Notice) {
    match notice {
        Notice::ThreadLoaded { .. } => show_thread(controller),
        Notice::ThreadFailed { message, .. } => println!("Could not load messages: {}", message),
        Notice::Discarded { chat_id } => debug!("ignored late messages for {}", chat_id),
        Notice::Sent { .. } => {}
        Notice::SendFailed { message, .. } => println!("Message not sent: {}", message),
    }
}

/// Messaging view: sidebar plus thread, driven by typed commands and by
/// background load/send completions.
pub async fn show_main_window(
    console: &mut Console,
    config: &AppConfig,
    store: &SessionStore,
    backend: Arc<dyn Backend>,
    session: Session,
) -> Result<Exit> {
    let (mut controller, mut events) =
        ChatController::new(backend, store.clone(), session, config.default_profile_photo.clone());
    controller.mount().await;

    let mut sidebar = Sidebar::new();
    sidebar.set_items(controller.contacts().to_vec());
    println!("{}", sidebar.render(controller.selected()));
    println!("Type /help for commands.");

    loop {
        print_prompt(&format!("{}> ", controller.session().username));
        tokio::select! {
            line = console.next_line() => {
                let Some(line) = line? else {
                    return Ok(Exit::Quit);
                };
                match parse_command(&line) {
                    Command::Send(text) => match controller.send(&text) {
                        Ok(()) => {
                            if let Some(last) = controller.messages().last() {
                                println!("{}", ChatView::line(last, true));
                            }
                        }
                        Err(err) => println!("{}", err.user_message()),
                    },
                    Command::Contacts => println!("{}", sidebar.render(controller.selected())),
                    Command::Search(query) => {
                        sidebar.set_query(&query);
                        println!("{}", sidebar.render(controller.selected()));
                    }
                    Command::Open(arg) => match sidebar.resolve(&arg) {
                        Some(chat_id) => {
                            controller.select(&chat_id);
                            show_thread(&controller);
                        }
                        None => println!("No contact {:?}.", arg),
                    },
                    Command::New(targets) => match controller.create_chat(&targets).await {
                        Ok(created_with) => {
                            println!("Chat created with {}.", created_with.join(", "));
                            sidebar.set_items(controller.contacts().to_vec());
                            println!("{}", sidebar.render(controller.selected()));
                        }
                        Err(err) => println!("Could not create chat: {}", err.user_message()),
                    },
                    Command::Leave => {
                        let Some(chat_id) = controller.selected().map(str::to_string) else {
                            println!("Select a chat first.");
                            continue;
                        };
                        let answer = match console.ask("Are you sure you want to delete this chat? [y/N] ").await {
                            Ok(answer) => answer,
                            Err(err) if is_eof(&err) => return Ok(Exit::Quit),
                            Err(err) => return Err(err),
                        };
                        if !answer.trim().eq_ignore_ascii_case("y") {
                            continue;
                        }
                        match controller.leave_chat(&chat_id).await {
                            Ok(message) => {
                                println!("{}", message);
                                sidebar.set_items(controller.contacts().to_vec());
                                println!("{}", sidebar.render(controller.selected()));
                            }
                            Err(err) => println!("Could not delete chat: {}", err.user_message()),
                        }
                    }
                    Command::Profile => match controller.profile().await {
                        Ok(profile) => println!(
                            "{} [{}]",
                            profile.username,
                            profile.profile_photo.unwrap_or_default()
                        ),
                        Err(err) => println!("Could not load profile: {}", err.user_message()),
                    },
                    Command::Username(name) => match controller.update_username(&name).await {
                        Ok(message) => println!("{}", message),
                        Err(err) => println!("Could not update username: {}", err.user_message()),
                    },
                    Command::Password => {
                        let pair = match console.ask("New password: ").await {
                            Ok(new) => console.ask("Confirm password: ").await.map(|confirm| (new, confirm)),
                            Err(err) => Err(err),
                        };
                        let (new, confirm) = match pair {
                            Ok(pair) => pair,
                            Err(err) if is_eof(&err) => return Ok(Exit::Quit),
                            Err(err) => return Err(err),
                        };
                        match controller.update_password(&new, &confirm).await {
                            Ok(message) => println!("{}", message),
                            Err(err) => println!("Could not update password: {}", err.user_message()),
                        }
                    }
                    Command::Export { from, to, path } => {
                        let result = DateRange::parse(&from, &to).and_then(|range| {
                            let path = path.map(PathBuf::from).unwrap_or_else(|| {
                                PathBuf::from(default_file_name(controller.selected().unwrap_or("none")))
                            });
                            controller.export(&range, &path).map(|n| (n, path))
                        });
                        match result {
                            Ok((n, path)) => println!("Saved {} messages to {}.", n, path.display()),
                            Err(err) => println!("Could not export: {}", err.user_message()),
                        }
                    }
                    Command::Refresh => match controller.refresh_contacts().await {
                        Ok(()) => {
                            sidebar.set_items(controller.contacts().to_vec());
                            println!("{}", sidebar.render(controller.selected()));
                        }
                        Err(err) => println!("Could not refresh contacts: {}", err.user_message()),
                    },
                    Command::Ping => match controller.ping().await {
                        Ok(rtt) => println!("Server reachable ({} ms).", rtt.as_millis()),
                        Err(err) => println!("Server unreachable: {}", err.user_message()),
                    },
                    Command::Logout => {
                        controller.logout()?;
                        println!("Logged out.");
                        return Ok(Exit::Logout);
                    }
                    Command::Quit => return Ok(Exit::Quit),
                    Command::Help => println!("{}", HELP),
                    Command::Unknown(text) => println!("Unknown command {:?}. Type /help.", text),
                }
            }
            Some(event) = events.recv() => {
                let notice = controller.handle(event);
                report(&controller, notice);
            }
        }
    }
}
