use anyhow::Result;
use shared::models::ChangePasswordRequest;

use super::AppContext;
use crate::console::{prompt_secret, surface};

pub async fn change(ctx: &AppContext) -> Result<()> {
    ctx.require_session().await?;
    let request = ChangePasswordRequest {
        old_password: prompt_secret("Current password: ")?,
        new_password: prompt_secret("New password: ")?,
        new_password_confirmation: prompt_secret("Confirm new password: ")?,
    };
    let message = ctx
        .actions
        .change_password(&request)
        .await
        .map_err(surface)?;
    println!("{message}");
    Ok(())
}
