use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use client::{KycDocument, KycSubmission, boundary::Attachment};

use super::AppContext;
use crate::console::surface;

/// Documents already on file are resubmitted unless replaced here.
#[derive(Args, Debug)]
pub struct KycArgs {
    /// 12-digit Aadhaar number
    #[arg(long)]
    pub aadhaar: Option<String>,
    /// PAN, e.g. ABCDE1234F
    #[arg(long)]
    pub pan: Option<String>,
    #[arg(long, value_name = "PATH")]
    pub aadhaar_front: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub aadhaar_back: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub pan_image: Option<PathBuf>,
    /// Cancelled cheque or passbook image
    #[arg(long, value_name = "PATH")]
    pub cheque: Option<PathBuf>,
}

async fn replace(slot: &mut Option<KycDocument>, path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = path {
        let attachment = Attachment::from_path(&path).await.map_err(surface)?;
        *slot = Some(KycDocument::Upload(attachment));
    }
    Ok(())
}

pub async fn submit(ctx: &AppContext, args: KycArgs) -> Result<()> {
    ctx.require_session().await?;
    let profile = ctx.profile().await?;
    let mut submission = KycSubmission::from_profile(&profile);

    if let Some(aadhaar) = args.aadhaar {
        submission.aadhaar = aadhaar;
    }
    if let Some(pan) = args.pan {
        submission.pan = pan.trim().to_ascii_uppercase();
    }
    replace(&mut submission.aadhaar_img, args.aadhaar_front).await?;
    replace(&mut submission.aadhaar_back_img, args.aadhaar_back).await?;
    replace(&mut submission.pan_img, args.pan_image).await?;
    replace(&mut submission.checkbook_img, args.cheque).await?;

    let message = ctx.actions.update_kyc(submission).await.map_err(surface)?;
    println!("{message}");
    if let Some(profile) = ctx.session().snapshot().profile() {
        println!("KYC status: {}", profile.kyc_status);
    }
    Ok(())
}
