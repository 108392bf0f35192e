//! Account commands: login, logout, whoami and register.

use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::Args;
use leadgenie_client::{AuthService, ErrorKind, OtpFlow};
use leadgenie_core::types::{PendingRegistration, UserRole};
use tokio::time::Instant;

use super::{Context, Prompt};
use crate::TRACING_TARGET_COMMAND;

const VERIFY_FAILED_MESSAGE: &str = "The code could not be verified";

/// Arguments of `leadgenie register`.
#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    /// Email to register; the verification code is sent here.
    #[arg(short, long)]
    pub email: String,

    /// Full name shown in the app.
    #[arg(short, long)]
    pub name: String,

    /// Role within the organization.
    #[arg(long, default_value = "sales_rep")]
    pub role: UserRole,

    /// Password for the new account. Read from stdin when omitted.
    #[arg(long, env = "LEADGENIE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub(super) async fn login(
    ctx: &Context,
    prompt: &mut Prompt,
    email: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt.required("Password: ").await?,
    };

    let user = ctx
        .session
        .login(email, password)
        .await
        .context("failed to sign in")?;

    println!("Signed in as {} ({})", user.label(), user.role);
    Ok(())
}

pub(super) async fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.session.logout().await;
    println!("Signed out");
    Ok(())
}

pub(super) async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    if let Err(e) = ctx.session.restore().await {
        tracing::warn!(target: TRACING_TARGET_COMMAND, error = %e, "Ignoring unreadable saved session");
    }

    let session = ctx.session.initialize().await;
    match session.user().filter(|_| session.is_authenticated()) {
        Some(user) => {
            println!("{}", user.label());
            println!("  email: {}", user.email);
            println!("  role:  {}", user.role);
            println!("  id:    {}", user.id);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Sends a code, then reads codes from stdin until one is accepted.
///
/// An empty line asks for a new code once the resend cooldown has passed.
pub(super) async fn register(
    ctx: &Context,
    prompt: &mut Prompt,
    args: RegisterArgs,
) -> anyhow::Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => prompt.required("Choose a password: ").await?,
    };

    let draft = PendingRegistration::new(args.email, password, args.name).with_role(args.role);
    let flow = OtpFlow::new(AuthService::new(ctx.client.clone()));

    let dispatch = flow
        .send_code(draft)
        .await
        .context("failed to send the verification code")?;
    match dispatch.expires_in_minutes {
        Some(minutes) => println!("Code sent to {}, valid for {minutes} minutes", dispatch_email(&flow)),
        None => println!("Code sent to {}", dispatch_email(&flow)),
    }

    let mut last_tick = Instant::now();
    loop {
        let Some(line) = prompt
            .line("Verification code (empty line to resend): ")
            .await?
        else {
            bail!("registration aborted before the code was confirmed");
        };

        let elapsed = last_tick.elapsed().as_secs();
        if elapsed > 0 {
            flow.tick(u32::try_from(elapsed).unwrap_or(u32::MAX));
            last_tick += Duration::from_secs(elapsed);
        }

        if line.is_empty() {
            match flow.resend().await {
                Ok(true) => println!("A new code is on its way"),
                Ok(false) => println!(
                    "You can request a new code in {}s",
                    flow.snapshot().cooldown
                ),
                Err(e) => eprintln!("{}", e.user_message("Failed to resend the code")),
            }
            continue;
        }

        flow.paste(&line);
        match flow.verify_input().await {
            Ok(user) => {
                println!("Account created for {}", user.label());
                println!("Sign in with: leadgenie login --email {}", user.email);
                return Ok(());
            }
            Err(e) if matches!(e.kind, ErrorKind::InvalidInput | ErrorKind::Validation) => {
                eprintln!("{}", e.user_message(VERIFY_FAILED_MESSAGE));
                flow.clear_error();
            }
            Err(e) => return Err(e).context("registration failed"),
        }
    }
}

fn dispatch_email(flow: &OtpFlow) -> String {
    flow.snapshot().email.unwrap_or_default()
}
