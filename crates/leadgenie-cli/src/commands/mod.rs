//! Subcommands and the state they share.

mod auth;
mod leads;
mod prompt;

use clap::Subcommand;
use leadgenie_client::{ApiClient, SessionManager};

use self::auth::RegisterArgs;
pub use self::leads::LeadsCommand;
use self::prompt::Prompt;

/// Client and session shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: ApiClient,
    pub session: SessionManager,
}

/// What the CLI should do.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Account password. Read from stdin when omitted.
        #[arg(long, env = "LEADGENIE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Create an account, confirming the email with a one-time code.
    Register(RegisterArgs),

    /// Work with leads.
    Leads {
        #[command(subcommand)]
        command: LeadsCommand,
    },
}

impl Command {
    /// Runs the command to completion.
    pub async fn execute(self, ctx: &Context) -> anyhow::Result<()> {
        let mut prompt = Prompt::stdin();

        let result = match self {
            Self::Login { email, password } => {
                auth::login(ctx, &mut prompt, email, password).await
            }
            Self::Logout => auth::logout(ctx).await,
            Self::Whoami => auth::whoami(ctx).await,
            Self::Register(args) => auth::register(ctx, &mut prompt, args).await,
            Self::Leads { command } => leads::execute(ctx, command).await,
        };

        ctx.session.dispose().await;
        result
    }
}
