use crate::api::backend::Backend;
use crate::api::models::Session;
use crate::auth::{self, SignupForm};
use crate::error::Result;
use crate::storage::SessionStore;
use crate::ui::{is_eof, Console};

const BANNER: &str = "\
Carrier Messenger
  - Fast and secure messaging
  - Customize your user profile
";

/// Landing page. Returns the new session, or `None` when the user quits.
pub async fn show_login_window(
    console: &mut Console,
    backend: &dyn Backend,
    store: &SessionStore,
) -> Result<Option<Session>> {
    println!("{}", BANNER);
    loop {
        let outcome = match console.ask("[l]ogin, [s]ign up or [q]uit > ").await {
            Ok(choice) => match choice.trim().to_lowercase().as_str() {
                "l" | "login" => login(console, backend, store).await,
                "s" | "signup" | "sign up" => signup(console, backend, store).await,
                "q" | "quit" => return Ok(None),
                "" => continue,
                other => {
                    println!("Unknown choice {:?}.", other);
                    continue;
                }
            },
            Err(err) => Err(err),
        };
        match outcome {
            Ok(Some(session)) => {
                println!("Welcome, {}!", session.username);
                return Ok(Some(session));
            }
            Ok(None) => {}
            Err(err) if is_eof(&err) => return Ok(None),
            Err(err) => return Err(err),
        }
    }
}

/// `Ok(None)` means the attempt was rejected and the user may try again.
async fn login(console: &mut Console, backend: &dyn Backend, store: &SessionStore) -> Result<Option<Session>> {
    let username = console.ask("Username: ").await?;
    let password = console.ask("Password: ").await?;
    match auth::login(backend, store, &username, &password).await {
        Ok(session) => Ok(Some(session)),
        Err(err) => {
            println!("Login failed: {}", err.user_message());
            Ok(None)
        }
    }
}

async fn signup(console: &mut Console, backend: &dyn Backend, store: &SessionStore) -> Result<Option<Session>> {
    let form = SignupForm {
        username: console.ask("Username: ").await?,
        email: console.ask("Email: ").await?,
        password: console.ask("Password: ").await?,
        confirm_password: console.ask("Confirm password: ").await?,
    };
    match auth::signup(backend, store, &form).await {
        Ok(session) => Ok(Some(session)),
        Err(err) => {
            println!("Sign up failed: {}", err.user_message());
            Ok(None)
        }
    }
}
