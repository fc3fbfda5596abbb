//! Auth commands - login, logout, session status.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use envmon_client::{Error, SessionStatus};
use serde::Serialize;

use super::{Context, print_field, print_header, print_success};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username (defaults to the remembered one)
    pub username: Option<String>,

    /// Read the password from this environment variable instead of prompting
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Remember the username for the next login
    #[arg(long)]
    pub remember: bool,

    /// Forget any remembered username
    #[arg(long, conflicts_with = "remember")]
    pub forget: bool,
}

/// Session state for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    status: &'static str,
    username: Option<String>,
    remembered_username: Option<String>,
    persistent: bool,
    server_url: String,
}

/// Log in and store the session.
pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let session = ctx.client.session();

    let username = match args.username.or_else(|| session.remembered_username()) {
        Some(username) => username,
        None => anyhow::bail!("No username given and none remembered"),
    };

    let password = match &args.password_env {
        Some(var) => std::env::var(var)
            .with_context(|| format!("Environment variable {} is not set", var))?,
        None => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
    };

    if ctx.verbose {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to(format!("Server: {}", ctx.client.base_url())));
    }

    let auth = match ctx.client.auth().login(&username, &password).await {
        Ok(auth) => auth,
        Err(Error::InvalidCredentials) => {
            anyhow::bail!("Invalid username or password");
        }
        Err(e) => return Err(e.into()),
    };

    if args.remember {
        session.set_remembered_username(Some(&username));
    } else if args.forget {
        session.set_remembered_username(None);
    }

    if ctx.emit_json(&auth.user)? {
        return Ok(());
    }

    print_success(format!("Logged in as {}", style(&auth.user.username).bold()));
    if !session.is_persistent() {
        let yellow = Style::new().yellow();
        eprintln!(
            "{} Session storage is unavailable; this login lasts for this run only.",
            yellow.apply_to("!")
        );
    }
    Ok(())
}

/// Discard the stored session.
pub fn logout(ctx: &Context) -> Result<()> {
    let was_logged_in = ctx.client.session().status() != SessionStatus::Unauthenticated;
    ctx.client.auth().logout();

    if ctx.json_output {
        println!("{}", serde_json::json!({ "logged_out": was_logged_in }));
    } else if was_logged_in {
        print_success("Logged out");
    } else {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to("Not logged in"));
    }
    Ok(())
}

/// Show the local session state without contacting the server.
pub fn status(ctx: &Context) -> Result<()> {
    let session = ctx.client.session();
    let state = session.status();
    let user = session.current_user();

    let output = StatusOutput {
        status: match state {
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Recoverable => "recoverable",
            SessionStatus::Unauthenticated => "unauthenticated",
        },
        username: user.as_ref().map(|u| u.username.clone()),
        remembered_username: session.remembered_username(),
        persistent: session.is_persistent(),
        server_url: ctx.client.base_url().to_string(),
    };

    if ctx.emit_json(&output)? {
        return Ok(());
    }

    let green = Style::new().green();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    print_header("Session Status");
    match state {
        SessionStatus::Authenticated => {
            print_field("Status", green.apply_to("● logged in"));
        }
        SessionStatus::Recoverable => {
            print_field("Status", yellow.apply_to("● token will be refreshed"));
        }
        SessionStatus::Unauthenticated => {
            print_field("Status", dim.apply_to("○ Not logged in"));
        }
    }
    if let Some(user) = &output.username {
        print_field("User", user);
    }
    if let Some(remembered) = &output.remembered_username {
        print_field("Remembered", remembered);
    }
    print_field("Server", &output.server_url);
    println!();
    Ok(())
}

/// Show the authenticated user as reported by the server.
pub async fn whoami(ctx: &Context) -> Result<()> {
    let user = ctx.client.auth().current_user().await?;
    ctx.client.session().set_current_user(&user);

    if ctx.emit_json(&user)? {
        return Ok(());
    }

    print_header("Current User");
    print_field("ID", user.id);
    print_field("Username", &user.username);
    let full_name = format!("{} {}", user.first_name, user.last_name);
    if !full_name.trim().is_empty() {
        print_field("Name", full_name.trim());
    }
    if !user.email.is_empty() {
        print_field("Email", &user.email);
    }
    if let Some(registered) = &user.registered_at {
        print_field("Registered", registered);
    }
    println!();
    Ok(())
}
