use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use client::boundary::{FileAttachmentSource, GrantAll};
use shared::models::ProfileUpdateRequest;

use super::{AppContext, session::print_profile};
use crate::console::surface;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Print the member profile (default)
    Show,
    /// Edit profile fields; omitted fields keep their current values
    Update(UpdateArgs),
    /// Upload a new profile picture
    Image {
        /// Image file to upload
        path: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub father: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub state: Option<u64>,
    #[arg(long)]
    pub district: Option<u64>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub pincode: Option<String>,
    #[arg(long)]
    pub occupation: Option<String>,
    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    pub dob: Option<String>,
}

impl UpdateArgs {
    fn apply(self, request: &mut ProfileUpdateRequest) {
        let text = |target: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *target = value;
            }
        };
        text(&mut request.name, self.name);
        text(&mut request.father, self.father);
        text(&mut request.gender, self.gender);
        text(&mut request.mobile, self.mobile);
        text(&mut request.emailid, self.email);
        text(&mut request.address, self.address);
        text(&mut request.pincode, self.pincode);
        text(&mut request.occupation, self.occupation);
        text(&mut request.dob, self.dob);
        if self.state.is_some() && self.state != request.state {
            request.state = self.state;
            request.district = None;
        }
        if self.district.is_some() {
            request.district = self.district;
        }
    }
}

pub async fn run(ctx: &AppContext, args: ProfileArgs) -> Result<()> {
    ctx.require_session().await?;
    match args.command.unwrap_or(ProfileCommand::Show) {
        ProfileCommand::Show => {
            print_profile(&ctx.profile().await?);
        }
        ProfileCommand::Update(update) => {
            let mut request = ProfileUpdateRequest::from_profile(&ctx.profile().await?);
            update.apply(&mut request);
            let message = ctx
                .actions
                .update_profile(&request)
                .await
                .map_err(surface)?;
            println!("{message}");
        }
        ProfileCommand::Image { path } => {
            let source = FileAttachmentSource::new(path);
            let message = ctx
                .actions
                .upload_profile_image(&GrantAll, &source)
                .await
                .map_err(surface)?;
            println!("{message}");
        }
    }
    Ok(())
}
