use anyhow::{Result, bail};
use clap::Args;
use client::Shell;
use shared::models::Profile;

use super::AppContext;
use crate::console::{prompt, prompt_secret, surface};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// SAM id or registered mobile number; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,
}

pub async fn login(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = prompt_secret("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    ctx.actions
        .login(username.trim(), &password)
        .await
        .map_err(surface)?;

    println!("Logged in as {}", username.trim());
    match ctx.actions.fetch_profile().await {
        Ok(profile) => print_profile(&profile),
        Err(err) => eprintln!("warning: {}", err.user_message()),
    }
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.actions.logout();
    println!("Logged out.");
    Ok(())
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    let report = ctx.bootstrap().await;
    let session = ctx.session().snapshot();
    match session.shell() {
        Shell::Authenticated => {
            println!("Session: active");
            if let Some(profile) = session.profile() {
                print_profile(profile);
            } else if report.token_found {
                println!("Profile could not be loaded.");
            }
        }
        Shell::Unauthenticated | Shell::Loading => {
            println!("Session: none");
            println!("Run `referraldesk login` to sign in.");
        }
    }
    Ok(())
}

pub(crate) fn print_profile(profile: &Profile) {
    println!("  Name:      {}", profile.name);
    println!("  SAM id:    {}", profile.username);
    if let Some(mobile) = &profile.mobile {
        println!("  Mobile:    {mobile}");
    }
    if let Some(email) = &profile.email {
        println!("  Email:     {email}");
    }
    println!("  KYC:       {}", profile.kyc_status);
    if let Some(reason) = &profile.kyc_rejection {
        println!("  Rejection: {reason}");
    }
    println!("  Earnings:  {:.2}", profile.referral_amount);
}
