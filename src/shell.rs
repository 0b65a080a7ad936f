// Line-oriented front end: each command fills the page the way a user would
// fill the form, then fires the matching event and redraws.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::app::{App, UiEvent};
use crate::error::Result;
use crate::ui::{render, AuthForm, ElementId, ViewState};

/// Printed when a login or signup is typed while the dashboard is shown
pub const ALREADY_SIGNED_IN: &str = "Olet jo kirjautunut sisään. Kirjaudu ensin ulos: logout";

pub const HELP: &str = "\
Komennot:
  login <email> <salasana>     kirjaudu sisään
  signup <email> <salasana>    luo tili
  show-login | show-signup     vaihda lomaketta
  toggle-password login|signup näytä tai piilota salasana
  transcript <url> [nimi]      lataa transkriptio tiedostoon <nimi>.sbv
  logout                       kirjaudu ulos
  help                         tämä ohje
  quit                         lopeta
  (tyhjä rivi piirtää sivun uudelleen)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Signup { email: String, password: String },
    ShowLogin,
    ShowSignup,
    TogglePassword(AuthForm),
    Transcript { url: String, basename: Option<String> },
    Logout,
    Refresh,
    Help,
    Quit,
}

/// Parse one input line. The error is a usage hint for the user.
pub fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim_start();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match name {
        "" => Ok(Command::Refresh),
        "login" | "signup" => {
            // the password is everything after the separator, exactly as typed
            let Some((email, password)) = rest.trim_start().split_once(char::is_whitespace) else {
                return Err(format!("Käyttö: {} <email> <salasana>", name));
            };
            let email = email.to_string();
            let password = password.to_string();
            Ok(if name == "login" {
                Command::Login { email, password }
            } else {
                Command::Signup { email, password }
            })
        }
        "show-login" => Ok(Command::ShowLogin),
        "show-signup" => Ok(Command::ShowSignup),
        "toggle-password" => match rest.trim() {
            "login" => Ok(Command::TogglePassword(AuthForm::Login)),
            "signup" => Ok(Command::TogglePassword(AuthForm::Signup)),
            _ => Err("Käyttö: toggle-password login|signup".to_string()),
        },
        "transcript" => {
            let mut parts = rest.split_whitespace();
            let Some(url) = parts.next() else {
                return Err("Käyttö: transcript <url> [nimi]".to_string());
            };
            Ok(Command::Transcript {
                url: url.to_string(),
                basename: parts.next().map(str::to_string),
            })
        }
        "logout" => Ok(Command::Logout),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Tuntematon komento '{}'. Kirjoita help.", other)),
    }
}

/// Read commands until end of input or `quit`, redrawing the page after each one.
pub async fn run<R, W>(app: &App, input: R, mut out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{}", render(&app.view().snapshot()))?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                writeln!(out, "{}", HELP)?;
                writeln!(out, "Palvelu: {}", app.transcript_endpoint())?;
            }
            Ok(command) => {
                if let Some(notice) = execute(app, command).await {
                    writeln!(out, "{}", notice)?;
                }
                write!(out, "{}", render(&app.view().snapshot()))?;
            }
            Err(usage) => writeln!(out, "{}", usage)?,
        }
    }

    debug!("Shell finished");
    Ok(())
}

/// Run one command. Returns a notice when the command was refused.
async fn execute(app: &App, command: Command) -> Option<&'static str> {
    let view = app.view();
    match command {
        Command::Login { email, password } => {
            if view.state() == ViewState::LoggedIn {
                return Some(ALREADY_SIGNED_IN);
            }
            // errors land on the login form, so it has to be the one shown
            app.dispatch(UiEvent::ShowLogin).await;
            view.set_value(ElementId::LoginEmail, &email);
            view.set_value(ElementId::LoginPassword, &password);
            app.dispatch(UiEvent::SubmitLogin).await;
            app.settle().await;
        }
        Command::Signup { email, password } => {
            if view.state() == ViewState::LoggedIn {
                return Some(ALREADY_SIGNED_IN);
            }
            app.dispatch(UiEvent::ShowSignup).await;
            view.set_value(ElementId::SignupEmail, &email);
            view.set_value(ElementId::SignupPassword, &password);
            app.dispatch(UiEvent::SubmitSignup).await;
            app.settle().await;
        }
        Command::ShowLogin => app.dispatch(UiEvent::ShowLogin).await,
        Command::ShowSignup => app.dispatch(UiEvent::ShowSignup).await,
        Command::TogglePassword(form) => app.dispatch(UiEvent::TogglePassword(form)).await,
        Command::Transcript { url, basename } => {
            view.set_value(ElementId::YoutubeUrl, &url);
            if let Some(basename) = basename {
                view.set_value(ElementId::OutputBasename, &basename);
            }
            let spinner = spinner("Luodaan transkriptiota...");
            app.dispatch(UiEvent::SubmitTranscript).await;
            spinner.finish_and_clear();
        }
        Command::Logout => {
            app.dispatch(UiEvent::Logout).await;
            app.settle().await;
        }
        Command::Refresh | Command::Help | Command::Quit => {}
    }
    None
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::NOT_SIGNED_IN_MESSAGE;
    use crate::config::{FirebaseConfig, Settings};
    use crate::identity::{AuthError, MockIdentityProvider, SessionChannel, User};
    use crate::ui::{Page, ViewController};
    use std::sync::Arc;

    #[test]
    fn test_parse_auth_commands() {
        assert_eq!(
            parse_command("login a@example.com salainen sana"),
            Ok(Command::Login {
                email: "a@example.com".to_string(),
                password: "salainen sana".to_string(),
            })
        );
        assert_eq!(
            parse_command("  signup b@example.com pw"),
            Ok(Command::Signup {
                email: "b@example.com".to_string(),
                password: "pw".to_string(),
            })
        );
        assert_eq!(
            parse_command("login a@example.com   välilyönnit ympärillä  "),
            Ok(Command::Login {
                email: "a@example.com".to_string(),
                password: "  välilyönnit ympärillä  ".to_string(),
            })
        );
        assert!(parse_command("login a@example.com").is_err());
    }

    #[test]
    fn test_parse_transcript() {
        assert_eq!(
            parse_command("transcript https://youtu.be/abc"),
            Ok(Command::Transcript {
                url: "https://youtu.be/abc".to_string(),
                basename: None,
            })
        );
        assert_eq!(
            parse_command("transcript https://youtu.be/abc luento"),
            Ok(Command::Transcript {
                url: "https://youtu.be/abc".to_string(),
                basename: Some("luento".to_string()),
            })
        );
        assert!(parse_command("transcript").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command(""), Ok(Command::Refresh));
        assert_eq!(parse_command("show-signup"), Ok(Command::ShowSignup));
        assert_eq!(
            parse_command("toggle-password signup"),
            Ok(Command::TogglePassword(AuthForm::Signup))
        );
        assert!(parse_command("toggle-password dashboard").is_err());
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert!(parse_command("dance").unwrap_err().contains("dance"));
    }

    fn app_with(channel: &SessionChannel, mut mock: MockIdentityProvider) -> App {
        let mut listener = Some(channel.subscribe());
        mock.expect_subscribe()
            .returning(move || listener.take().unwrap_or_else(|| SessionChannel::new().subscribe()));

        let config = FirebaseConfig {
            api_key: "k".to_string(),
            auth_domain: String::new(),
            project_id: "demo".to_string(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            measurement_id: None,
            cloud_function_region: "us-central1".to_string(),
            cloud_function_project: "demo".to_string(),
        };
        let view = ViewController::bind(Page::standard()).unwrap();
        App::with_identity(&config, &Settings::default(), Arc::new(mock), view).unwrap()
    }

    fn signed_out() -> MockIdentityProvider {
        let mut mock = MockIdentityProvider::new();
        mock.expect_current_user().returning(|| None);
        mock
    }

    async fn run_lines(app: &App, input: &'static str) -> String {
        let mut out = Vec::new();
        run(app, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_run_switches_forms_and_stops_at_quit() {
        let channel = SessionChannel::new();
        let app = app_with(&channel, signed_out());

        let out = run_lines(&app, "show-signup\nbogus\nquit\nshow-login\n").await;

        assert!(out.contains("== Kirjaudu sisään =="));
        assert!(out.contains("== Luo tili =="));
        assert!(out.contains("Tuntematon komento 'bogus'"));
        // nothing after quit runs
        assert_eq!(out.matches("== Kirjaudu sisään ==").count(), 1);
    }

    #[tokio::test]
    async fn test_signed_out_transcript_shows_banner() {
        let channel = SessionChannel::new();
        let mut mock = signed_out();
        mock.expect_id_token().times(0);
        let app = app_with(&channel, mock);

        let out = run_lines(&app, "transcript https://youtu.be/abc\n").await;

        assert!(out.contains(NOT_SIGNED_IN_MESSAGE));
        assert!(!out.contains("== Transkriptio =="));
    }

    #[tokio::test]
    async fn test_login_error_is_shown_from_signup_form() {
        let channel = SessionChannel::new();
        let mut mock = signed_out();
        mock.expect_sign_in()
            .withf(|email, password| email == "a@example.com" && password == " pw")
            .times(1)
            .returning(|_, _| Err(AuthError::new("auth/wrong-password").into()));
        let app = app_with(&channel, mock);

        let out = run_lines(&app, "show-signup\nlogin a@example.com  pw\n").await;

        let after_login = out.rsplit("== Luo tili ==").next().unwrap_or_default();
        assert!(after_login.contains("== Kirjaudu sisään =="));
        assert!(after_login.contains("! Väärä salasana"));
    }

    #[tokio::test]
    async fn test_login_refused_while_signed_in() {
        let channel = SessionChannel::new();
        let user = User {
            uid: "uid-1".to_string(),
            email: Some("a@example.com".to_string()),
        };
        channel.publish(Some(user.clone()));
        let mut mock = MockIdentityProvider::new();
        mock.expect_current_user().returning(move || Some(user.clone()));
        mock.expect_sign_in().times(0);
        let app = app_with(&channel, mock);
        app.settle().await;

        let out = run_lines(&app, "login b@example.com pw\n").await;

        assert!(out.contains(ALREADY_SIGNED_IN));
        assert!(out.contains("Kirjautunut: a@example.com"));
    }

    #[tokio::test]
    async fn test_help_names_endpoint() {
        let channel = SessionChannel::new();
        let app = app_with(&channel, signed_out());

        let out = run_lines(&app, "help\n").await;

        assert!(out.contains("transcript <url> [nimi]"));
        assert!(out.contains("Palvelu: https://us-central1-demo.cloudfunctions.net/runTranscript"));
    }
}
