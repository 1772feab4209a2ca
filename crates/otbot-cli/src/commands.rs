//! The session workflow behind the command-line flags.

use std::io::Write;

use anyhow::{Context, Result};
use otbot_core::{CredentialVault, LoginOutcome, NotificationChannel, RoomLister, SessionManager};
use tracing::info;

use crate::cli::Action;

/// Run one invocation: logout and stop, or log in (once) and then list
/// rooms or open the notification channel. Progress lines go to `out`.
pub async fn execute<V, C, W>(
    sessions: &SessionManager<V>,
    channel: &mut C,
    action: Action,
    out: &mut W,
) -> Result<()>
where
    V: CredentialVault,
    C: NotificationChannel,
    W: Write,
{
    writeln!(out, "user {}", sessions.user_id())?;

    if action == Action::Logout {
        sessions.logout().context("Failed to clear session")?;
        writeln!(out, "Logged out")?;
        return Ok(());
    }

    if !sessions.is_authenticated()? {
        writeln!(out, "Logging in...")?;
    }
    match sessions.login().await? {
        LoginOutcome::AlreadyAuthenticated => {
            writeln!(out, "Already logged in: skipping auth request")?
        }
        LoginOutcome::LoggedIn => writeln!(out, "Login successful!")?,
    }

    match action {
        Action::ListRooms => {
            let api = sessions.api_client()?;
            let rooms = RoomLister::new(&api).list(out).await?;
            info!(count = rooms.len(), "Rooms listed");
        }
        Action::Notify(room_id) => {
            channel.open(&room_id)?;
            writeln!(out, "Opening websocket {}", room_id.trim())?;
        }
        Action::Logout => {}
    }

    Ok(())
}
