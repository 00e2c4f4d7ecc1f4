use anyhow::Result;
use clap::Args;

use super::AppContext;
use crate::console::surface;

#[derive(Args, Debug)]
pub struct NomineeArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub relationship: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

pub async fn update(ctx: &AppContext, args: NomineeArgs) -> Result<()> {
    ctx.require_session().await?;
    let mut nominee = ctx.profile().await?.nominee;

    if let Some(name) = args.name {
        nominee.nominee_name = name;
    }
    if let Some(relationship) = args.relationship {
        nominee.relationship = relationship;
    }
    if let Some(mobile) = args.mobile {
        nominee.nominee_mobile = mobile;
    }
    if let Some(address) = args.address {
        nominee.nominee_address = address;
    }

    let message = ctx
        .actions
        .update_nominee(&nominee)
        .await
        .map_err(surface)?;
    println!("{message}");
    Ok(())
}
