//! Three-section registration wizard.
//!
//! Sections are visited in order: contact (A), personal (B), payment (C).
//! Moving forward requires the current section to validate; moving back
//! never does. A failed submission keeps the member on section C with every
//! field intact so the payment proof does not have to be entered again.

use reqwest::multipart::Form;
use tracing::{debug, info, warn};

use crate::{
    actions::Actions,
    boundary::Attachment,
    error::{ActionError, ApiError},
    validation::{self, Rule, ValidationErrors, digits, email, filled},
};

const SAM_PREFIX: &str = "SAM";

/// Accumulated registration data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationForm {
    pub has_sam_no: bool,
    pub sam_no: String,
    pub mobile: String,
    pub email: String,
    pub full_name: String,
    pub state: Option<u64>,
    pub district: Option<u64>,
    pub payment_slip: Option<Attachment>,
    pub amount_paid: String,
    pub agree_terms: bool,
}

impl RegistrationForm {
    fn amount(&self) -> Option<f64> {
        self.amount_paid
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| *amount > 0.0)
    }

    /// Builds the multipart body posted to `register`.
    ///
    /// # Errors
    /// Returns [`ApiError::Request`] if the payment slip cannot be encoded.
    pub fn to_multipart(&self) -> Result<Form, ApiError> {
        let id = |value: Option<u64>| value.map(|id| id.to_string()).unwrap_or_default();
        let mut form = Form::new()
            .text("has_sam_no", if self.has_sam_no { "1" } else { "0" })
            .text("mobile", self.mobile.trim().to_string())
            .text("email", self.email.trim().to_string())
            .text("name", self.full_name.trim().to_string())
            .text("state", id(self.state))
            .text("district", id(self.district))
            .text("amount", self.amount_paid.trim().to_string());
        if self.has_sam_no {
            form = form.text("sam_no", self.sam_no.clone());
        }
        if let Some(slip) = &self.payment_slip {
            form = form.part("payment_slip", slip.clone().into_part()?);
        }
        Ok(form)
    }
}

pub static SECTION_A_RULES: &[Rule<RegistrationForm>] = &[
    Rule::new(
        "sam_no",
        |f| !f.has_sam_no || filled(&f.sam_no),
        "SAM Number is required",
    ),
    Rule::new(
        "sam_no",
        |f| !f.has_sam_no || f.sam_no.trim().len() >= 3,
        "SAM Number must be at least 3 characters",
    ),
    Rule::new("mobile", |f| filled(&f.mobile), "Mobile number is required"),
    Rule::new("mobile", |f| digits(&f.mobile, 10), "Invalid mobile number"),
    Rule::new("email", |f| filled(&f.email), "Email is required"),
    Rule::new("email", |f| email(&f.email), "Invalid email format"),
];

pub static SECTION_B_RULES: &[Rule<RegistrationForm>] = &[
    Rule::new("full_name", |f| filled(&f.full_name), "Full name is required"),
    Rule::new("state", |f| f.state.is_some(), "State is required"),
    Rule::new("district", |f| f.district.is_some(), "District is required"),
];

pub static SECTION_C_RULES: &[Rule<RegistrationForm>] = &[
    Rule::new(
        "payment_slip",
        |f| f.payment_slip.is_some(),
        "Payment slip is required",
    ),
    Rule::new(
        "amount_paid",
        |f| f.amount().is_some(),
        "Valid amount is required",
    ),
    Rule::new(
        "agree_terms",
        |f| f.agree_terms,
        "You must agree to the terms",
    ),
];

/// Wizard position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SectionA,
    SectionB,
    SectionC,
    /// Terminal: the server accepted the registration.
    Confirmed { message: String },
}

impl Step {
    #[must_use]
    pub fn rules(&self) -> &'static [Rule<RegistrationForm>] {
        match self {
            Self::SectionA => SECTION_A_RULES,
            Self::SectionB => SECTION_B_RULES,
            Self::SectionC => SECTION_C_RULES,
            Self::Confirmed { .. } => &[],
        }
    }
}

/// A single field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    HasSamNo(bool),
    SamNo(String),
    Mobile(String),
    Email(String),
    FullName(String),
    State(Option<u64>),
    District(Option<u64>),
    PaymentSlip(Option<Attachment>),
    AmountPaid(String),
    AgreeTerms(bool),
}

impl FieldEdit {
    /// Key under which this field's validation error is reported.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::HasSamNo(_) | Self::SamNo(_) => "sam_no",
            Self::Mobile(_) => "mobile",
            Self::Email(_) => "email",
            Self::FullName(_) => "full_name",
            Self::State(_) => "state",
            Self::District(_) => "district",
            Self::PaymentSlip(_) => "payment_slip",
            Self::AmountPaid(_) => "amount_paid",
            Self::AgreeTerms(_) => "agree_terms",
        }
    }
}

/// Upper-cases a SAM number and makes sure it carries the prefix.
#[must_use]
pub fn normalize_sam_no(value: &str) -> String {
    let value = value.trim().to_uppercase();
    if value.is_empty() || value.starts_with(SAM_PREFIX) {
        value
    } else {
        format!("{SAM_PREFIX}{value}")
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    step: Step,
    form: RegistrationForm,
    errors: ValidationErrors,
    last_error: Option<String>,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: Step::SectionA,
            form: RegistrationForm::default(),
            errors: ValidationErrors::default(),
            last_error: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &Step {
        &self.step
    }

    #[must_use]
    pub const fn form(&self) -> &RegistrationForm {
        &self.form
    }

    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Message of the last failed submission, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies one edit, clearing that field's error.
    pub fn set_field(&mut self, edit: FieldEdit) {
        self.errors.clear(edit.field());
        let form = &mut self.form;
        match edit {
            FieldEdit::HasSamNo(has) => {
                form.has_sam_no = has;
                form.sam_no = if has { SAM_PREFIX.to_string() } else { String::new() };
            }
            FieldEdit::SamNo(value) => form.sam_no = normalize_sam_no(&value),
            FieldEdit::Mobile(value) => form.mobile = value,
            FieldEdit::Email(value) => form.email = value,
            FieldEdit::FullName(value) => form.full_name = value,
            FieldEdit::State(state) => {
                if form.state != state {
                    form.district = None;
                }
                form.state = state;
            }
            FieldEdit::District(district) => form.district = district,
            FieldEdit::PaymentSlip(slip) => form.payment_slip = slip,
            FieldEdit::AmountPaid(value) => form.amount_paid = value,
            FieldEdit::AgreeTerms(agreed) => form.agree_terms = agreed,
        }
    }

    /// Prefills the amount with the configured registration fee.
    pub fn apply_registration_amount(&mut self, amount: f64) {
        if amount > 0.0 {
            self.form.amount_paid = amount.to_string();
        }
    }

    fn check_current(&mut self) -> bool {
        match validation::validate(self.step.rules(), &self.form) {
            Ok(()) => {
                self.errors = ValidationErrors::default();
                true
            }
            Err(errors) => {
                debug!(step = ?self.step, invalid = errors.len(), "section incomplete");
                self.errors = errors;
                false
            }
        }
    }

    /// Advances one section if the current one validates. Returns whether
    /// the wizard moved.
    pub fn next(&mut self) -> bool {
        let next = match self.step {
            Step::SectionA => Step::SectionB,
            Step::SectionB => Step::SectionC,
            Step::SectionC | Step::Confirmed { .. } => return false,
        };
        if !self.check_current() {
            return false;
        }
        self.step = next;
        true
    }

    /// Goes back one section without validating.
    pub fn previous(&mut self) -> bool {
        let previous = match self.step {
            Step::SectionB => Step::SectionA,
            Step::SectionC => Step::SectionB,
            Step::SectionA | Step::Confirmed { .. } => return false,
        };
        self.step = previous;
        true
    }

    /// Whether the submit control should be enabled. `submit` borrows the
    /// wizard mutably, so no second submission can start while one runs.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.step == Step::SectionC
    }

    /// Validates section C and posts the registration. Outside section C
    /// this does nothing.
    ///
    /// # Errors
    /// Validation or request failures; the wizard stays on section C with
    /// all fields retained.
    pub async fn submit(&mut self, actions: &Actions) -> Result<(), ActionError> {
        if !self.can_submit() {
            return Ok(());
        }
        if !self.check_current() {
            return Err(ActionError::Validation(self.errors.clone()));
        }
        self.last_error = None;
        match actions.submit_registration(&self.form).await {
            Ok(message) => {
                info!("registration submitted");
                self.step = Step::Confirmed { message };
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.last_error = Some(err.user_message());
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_section_a(wizard: &mut RegistrationWizard) {
        wizard.set_field(FieldEdit::Mobile("9876543210".into()));
        wizard.set_field(FieldEdit::Email("asha@example.com".into()));
    }

    fn fill_section_b(wizard: &mut RegistrationWizard) {
        wizard.set_field(FieldEdit::FullName("Asha Rao".into()));
        wizard.set_field(FieldEdit::State(Some(29)));
        wizard.set_field(FieldEdit::District(Some(4)));
    }

    #[test]
    fn test_next_blocked_by_empty_required_field() {
        let mut wizard = RegistrationWizard::new();
        wizard.set_field(FieldEdit::Email("asha@example.com".into()));

        assert!(!wizard.next());
        assert_eq!(wizard.step(), &Step::SectionA);
        assert_eq!(wizard.errors().get("mobile"), Some("Mobile number is required"));
        assert_eq!(wizard.errors().get("email"), None);
    }

    #[test]
    fn test_linear_navigation() {
        let mut wizard = RegistrationWizard::new();
        fill_section_a(&mut wizard);
        assert!(wizard.next());
        assert_eq!(wizard.step(), &Step::SectionB);

        assert!(!wizard.next());
        assert_eq!(wizard.errors().get("full_name"), Some("Full name is required"));

        fill_section_b(&mut wizard);
        assert!(wizard.next());
        assert_eq!(wizard.step(), &Step::SectionC);
        assert!(wizard.can_submit());
        assert!(!wizard.next());
    }

    #[test]
    fn test_previous_skips_validation() {
        let mut wizard = RegistrationWizard::new();
        fill_section_a(&mut wizard);
        wizard.next();
        wizard.set_field(FieldEdit::Mobile(String::new()));

        assert!(wizard.previous());
        assert_eq!(wizard.step(), &Step::SectionA);
        assert!(!wizard.previous());
    }

    #[test]
    fn test_sam_number_rules() {
        let mut wizard = RegistrationWizard::new();
        fill_section_a(&mut wizard);
        wizard.set_field(FieldEdit::HasSamNo(true));
        assert_eq!(wizard.form().sam_no, "SAM");

        wizard.set_field(FieldEdit::SamNo("1024".into()));
        assert_eq!(wizard.form().sam_no, "SAM1024");
        wizard.set_field(FieldEdit::SamNo("sam77".into()));
        assert_eq!(wizard.form().sam_no, "SAM77");

        wizard.set_field(FieldEdit::SamNo(String::new()));
        assert!(!wizard.next());
        assert_eq!(wizard.errors().get("sam_no"), Some("SAM Number is required"));

        wizard.set_field(FieldEdit::HasSamNo(false));
        assert_eq!(wizard.form().sam_no, "");
        assert!(wizard.next());
    }

    #[test]
    fn test_state_change_resets_district() {
        let mut wizard = RegistrationWizard::new();
        fill_section_b(&mut wizard);
        wizard.set_field(FieldEdit::State(Some(29)));
        assert_eq!(wizard.form().district, Some(4));

        wizard.set_field(FieldEdit::State(Some(32)));
        assert_eq!(wizard.form().district, None);
    }

    #[test]
    fn test_edit_clears_field_error() {
        let mut wizard = RegistrationWizard::new();
        assert!(!wizard.next());
        assert!(wizard.errors().get("email").is_some());

        wizard.set_field(FieldEdit::Email("a".into()));
        assert_eq!(wizard.errors().get("email"), None);
        assert!(wizard.errors().get("mobile").is_some());
    }

    #[test]
    fn test_section_c_amount_rules() {
        let mut form = RegistrationForm {
            payment_slip: Some(Attachment::new("slip.jpg", "image/jpeg", vec![1])),
            agree_terms: true,
            amount_paid: "0".into(),
            ..RegistrationForm::default()
        };
        let errors = validation::validate(SECTION_C_RULES, &form).unwrap_err();
        assert_eq!(errors.get("amount_paid"), Some("Valid amount is required"));

        form.amount_paid = "abc".into();
        assert!(validation::validate(SECTION_C_RULES, &form).is_err());

        form.amount_paid = " 500 ".into();
        assert!(validation::validate(SECTION_C_RULES, &form).is_ok());
    }

    #[test]
    fn test_registration_amount_prefill() {
        let mut wizard = RegistrationWizard::new();
        wizard.apply_registration_amount(0.0);
        assert_eq!(wizard.form().amount_paid, "");
        wizard.apply_registration_amount(500.0);
        assert_eq!(wizard.form().amount_paid, "500");
    }

    #[test]
    fn test_normalize_sam_no() {
        assert_eq!(normalize_sam_no(""), "");
        assert_eq!(normalize_sam_no("  sam12 "), "SAM12");
        assert_eq!(normalize_sam_no("42"), "SAM42");
    }
}
