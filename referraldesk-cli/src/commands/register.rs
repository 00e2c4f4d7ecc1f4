use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use client::{FieldEdit, RegistrationWizard, Step, boundary::Attachment};
use shared::models::ReferenceItem;
use tracing::debug;

use super::AppContext;
use crate::console::{print_field_errors, surface};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// SAM number of the referring member, if any
    #[arg(long)]
    pub sam_no: Option<String>,

    #[arg(long)]
    pub mobile: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Full name as on the PAN card
    #[arg(long)]
    pub name: Option<String>,

    /// State id (see --list-states)
    #[arg(long)]
    pub state: Option<u64>,

    /// District id (see --list-districts)
    #[arg(long)]
    pub district: Option<u64>,

    /// Image of the payment slip
    #[arg(long)]
    pub payment_slip: Option<PathBuf>,

    /// Amount paid; defaults to the current registration fee
    #[arg(long)]
    pub amount: Option<String>,

    /// Accept the terms and conditions
    #[arg(long)]
    pub agree_terms: bool,

    /// Print the selectable states and exit
    #[arg(long, conflicts_with = "list_districts")]
    pub list_states: bool,

    /// Print the districts of the given state id and exit
    #[arg(long, value_name = "STATE_ID")]
    pub list_districts: Option<u64>,
}

fn print_items(items: &[ReferenceItem]) {
    for item in items {
        println!("{:>6}  {}", item.id, item.name);
    }
}

const fn section_label(step: &Step) -> &'static str {
    match step {
        Step::SectionA => "contact details",
        Step::SectionB => "personal details",
        Step::SectionC => "payment details",
        Step::Confirmed { .. } => "confirmation",
    }
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    if args.list_states {
        print_items(&ctx.actions.fetch_states().await.map_err(surface)?);
        return Ok(());
    }
    if let Some(state_id) = args.list_districts {
        print_items(
            &ctx.actions
                .fetch_districts(state_id)
                .await
                .map_err(surface)?,
        );
        return Ok(());
    }

    let mut wizard = RegistrationWizard::new();

    if let Some(sam_no) = args.sam_no {
        wizard.set_field(FieldEdit::HasSamNo(true));
        wizard.set_field(FieldEdit::SamNo(sam_no));
        match ctx.actions.lookup_guide(&wizard.form().sam_no).await {
            Ok(Some(guide)) => println!("Guide: {guide}"),
            Ok(None) => println!("Guide: not found"),
            Err(err) => eprintln!("warning: {}", err.user_message()),
        }
    }
    if let Some(mobile) = args.mobile {
        wizard.set_field(FieldEdit::Mobile(mobile));
    }
    if let Some(email) = args.email {
        wizard.set_field(FieldEdit::Email(email));
    }
    if let Some(name) = args.name {
        wizard.set_field(FieldEdit::FullName(name));
    }
    if args.state.is_some() {
        wizard.set_field(FieldEdit::State(args.state));
    }
    if args.district.is_some() {
        wizard.set_field(FieldEdit::District(args.district));
    }
    if let Some(path) = args.payment_slip {
        let slip = Attachment::from_path(&path).await.map_err(surface)?;
        wizard.set_field(FieldEdit::PaymentSlip(Some(slip)));
    }
    match args.amount {
        Some(amount) => wizard.set_field(FieldEdit::AmountPaid(amount)),
        None => match ctx.actions.fetch_registration_amount().await {
            Ok(amount) => wizard.apply_registration_amount(amount),
            Err(err) => debug!(error = %err, "registration amount unavailable"),
        },
    }
    wizard.set_field(FieldEdit::AgreeTerms(args.agree_terms));

    while !wizard.can_submit() {
        let label = section_label(wizard.step());
        if !wizard.next() {
            print_field_errors(wizard.errors());
            bail!("Please complete the {label}");
        }
    }

    wizard.submit(&ctx.actions).await.map_err(surface)?;
    if let Step::Confirmed { message } = wizard.step() {
        println!("{message}");
    }
    Ok(())
}
