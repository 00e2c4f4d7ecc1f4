use anyhow::Result;
use clap::Args;

use super::AppContext;
use crate::console::surface;

#[derive(Args, Debug)]
pub struct ReferralsArgs {
    /// Show income per level instead of the member list
    #[arg(long, requires_all = ["month", "year"])]
    pub income: bool,

    /// Month, 1 to 12
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long)]
    pub year: Option<i32>,
}

pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    ctx.require_session().await?;
    let summary = ctx.actions.fetch_dashboard().await.map_err(surface)?;
    println!("Total referrals: {}", summary.total_referral);
    println!("Total earnings:  {:.2}", summary.total_amount);
    Ok(())
}

pub async fn run(ctx: &AppContext, args: ReferralsArgs) -> Result<()> {
    ctx.require_session().await?;
    match (args.income, args.month, args.year) {
        (true, Some(month), Some(year)) => income(ctx, month, year).await,
        _ => list(ctx).await,
    }
}

async fn list(ctx: &AppContext) -> Result<()> {
    let summary = ctx.actions.fetch_referrals().await.map_err(surface)?;
    println!(
        "Members: {}  active: {}  pending: {}  rejected: {}",
        summary.total, summary.active, summary.pending, summary.rejected
    );
    for member in &summary.members {
        println!(
            "  {:<24} {:<12} {}",
            member.name,
            member.username.as_deref().unwrap_or("-"),
            member.status
        );
    }
    Ok(())
}

async fn income(ctx: &AppContext, month: u32, year: i32) -> Result<()> {
    let income = ctx
        .actions
        .fetch_referral_income(month, year)
        .await
        .map_err(surface)?;
    println!("Income for {month:02}/{year}");
    println!("  {:<8} {:>8} {:>12} {:>8} {:>12}", "Level", "Team", "Earned", "Month", "Month amt");
    for (label, level) in income.levels() {
        println!(
            "  {label:<8} {:>8} {:>12.2} {:>8} {:>12.2}",
            level.count, level.amount, level.current_count, level.current_amount
        );
    }
    Ok(())
}
