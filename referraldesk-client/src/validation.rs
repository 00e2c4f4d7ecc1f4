//! Declarative form validation.
//!
//! Each form is checked against a table of [`Rule`]s. Rules for the same
//! field are tried in order and the first failing one wins, so a "required"
//! rule placed before a "format" rule reports the more basic problem.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use shared::models::{ChangePasswordRequest, NomineeDetails, ProfileUpdateRequest};
use thiserror::Error;

use crate::actions::KycSubmission;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));
static PAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN pattern compiles"));

/// One check: `field` is invalid with `message` when `check` returns false.
pub struct Rule<F> {
    pub field: &'static str,
    pub check: fn(&F) -> bool,
    pub message: &'static str,
}

impl<F> Rule<F> {
    pub const fn new(field: &'static str, check: fn(&F) -> bool, message: &'static str) -> Self {
        Self {
            field,
            check,
            message,
        }
    }
}

impl<F> std::fmt::Debug for Rule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("field", &self.field)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Field name to message, for every field that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) need attention", .0.len())]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Drops the error recorded for `field`, if any.
    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Runs `rules` over `form`.
///
/// # Errors
/// Returns every failing field with the message of its first failing rule.
pub fn validate<F>(rules: &[Rule<F>], form: &F) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for rule in rules {
        if errors.get(rule.field).is_some() {
            continue;
        }
        if !(rule.check)(form) {
            errors.insert(rule.field, rule.message);
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[must_use]
pub fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

#[must_use]
pub fn digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

#[must_use]
pub fn email(value: &str) -> bool {
    EMAIL.is_match(value)
}

#[must_use]
pub fn pan(value: &str) -> bool {
    PAN.is_match(value)
}

pub static CHANGE_PASSWORD_RULES: &[Rule<ChangePasswordRequest>] = &[
    Rule::new(
        "old_password",
        |f| filled(&f.old_password),
        "Current password is required",
    ),
    Rule::new(
        "new_password",
        |f| filled(&f.new_password),
        "New password is required",
    ),
    Rule::new(
        "new_password",
        |f| f.new_password.chars().count() >= 6,
        "Password must be at least 6 characters long",
    ),
    Rule::new(
        "new_password_confirmation",
        |f| filled(&f.new_password_confirmation),
        "Please confirm your new password",
    ),
    Rule::new(
        "new_password_confirmation",
        |f| f.new_password == f.new_password_confirmation,
        "Passwords do not match",
    ),
];

pub static NOMINEE_RULES: &[Rule<NomineeDetails>] = &[
    Rule::new(
        "nominee_name",
        |f| filled(&f.nominee_name),
        "Nominee name is required",
    ),
    Rule::new(
        "relationship",
        |f| filled(&f.relationship),
        "Relationship is required",
    ),
    Rule::new(
        "nominee_mobile",
        |f| filled(&f.nominee_mobile),
        "Mobile number is required",
    ),
    Rule::new(
        "nominee_mobile",
        |f| digits(&f.nominee_mobile, 10),
        "Please enter a valid 10-digit mobile number",
    ),
    Rule::new(
        "nominee_address",
        |f| filled(&f.nominee_address),
        "Address is required",
    ),
];

pub static PROFILE_RULES: &[Rule<ProfileUpdateRequest>] = &[
    Rule::new("name", |f| filled(&f.name), "Name is required"),
    Rule::new("mobile", |f| filled(&f.mobile), "Mobile number is required"),
    Rule::new(
        "mobile",
        |f| digits(&f.mobile, 10),
        "Please enter a valid 10-digit mobile number",
    ),
    Rule::new("emailid", |f| filled(&f.emailid), "Email is required"),
    Rule::new(
        "emailid",
        |f| email(&f.emailid),
        "Please enter a valid email address",
    ),
    Rule::new("father", |f| filled(&f.father), "Father's name is required"),
    Rule::new("dob", |f| filled(&f.dob), "Date of birth is required"),
    Rule::new("gender", |f| filled(&f.gender), "Gender is required"),
    Rule::new("address", |f| filled(&f.address), "Address is required"),
    Rule::new("pincode", |f| filled(&f.pincode), "Pincode is required"),
    Rule::new(
        "pincode",
        |f| digits(&f.pincode, 6),
        "Please enter a valid 6-digit pincode",
    ),
    Rule::new("state", |f| f.state.is_some(), "State is required"),
    Rule::new("district", |f| f.district.is_some(), "District is required"),
    Rule::new(
        "occupation",
        |f| filled(&f.occupation),
        "Occupation is required",
    ),
];

pub static KYC_RULES: &[Rule<KycSubmission>] = &[
    Rule::new(
        "aadhaar",
        |f| filled(&f.aadhaar),
        "Aadhaar number is required",
    ),
    Rule::new(
        "aadhaar",
        |f| digits(&f.aadhaar, 12),
        "Please enter a valid 12-digit Aadhaar number",
    ),
    Rule::new("pan", |f| filled(&f.pan), "PAN number is required"),
    Rule::new("pan", |f| pan(&f.pan), "Please enter a valid PAN number"),
    Rule::new(
        "aadhaar_img",
        |f| f.aadhaar_img.is_some(),
        "Aadhaar front image is required",
    ),
    Rule::new(
        "aadhaar_back_img",
        |f| f.aadhaar_back_img.is_some(),
        "Aadhaar back image is required",
    ),
    Rule::new("pan_img", |f| f.pan_img.is_some(), "PAN image is required"),
    Rule::new(
        "checkbook_img",
        |f| f.checkbook_img.is_some(),
        "Cheque image is required",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::KycDocument;

    #[test]
    fn test_patterns_compile() {
        assert!(EMAIL.is_match("asha@example.com"));
        assert!(!EMAIL.is_match("asha@example"));
        assert!(PAN.is_match("ABCDE1234F"));
        assert!(!PAN.is_match("abcde1234f"));
    }

    fn password(old: &str, new: &str, confirm: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            old_password: old.into(),
            new_password: new.into(),
            new_password_confirmation: confirm.into(),
        }
    }

    #[test]
    fn test_predicates() {
        assert!(filled(" a "));
        assert!(!filled("   "));
        assert!(digits("9876543210", 10));
        assert!(!digits("98765 4321", 10));
        assert!(!digits("987654321", 10));
        assert!(email("asha@example.com"));
        assert!(!email("asha@example"));
        assert!(!email("asha @example.com"));
        assert!(pan("ABCDE1234F"));
        assert!(!pan("abcde1234f"));
        assert!(!pan("ABCDE12345"));
    }

    #[test]
    fn test_change_password_first_failure_wins() {
        let errors = validate(CHANGE_PASSWORD_RULES, &password("", "", "")).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("new_password"), Some("New password is required"));

        let errors = validate(CHANGE_PASSWORD_RULES, &password("old", "abc", "abd")).unwrap_err();
        assert_eq!(
            errors.get("new_password"),
            Some("Password must be at least 6 characters long")
        );
        assert_eq!(
            errors.get("new_password_confirmation"),
            Some("Passwords do not match")
        );
        assert_eq!(errors.get("old_password"), None);
    }

    #[test]
    fn test_change_password_valid() {
        assert!(validate(CHANGE_PASSWORD_RULES, &password("old", "secret1", "secret1")).is_ok());
    }

    #[test]
    fn test_nominee_mobile_format() {
        let nominee = NomineeDetails {
            nominee_name: "Ravi".into(),
            relationship: "Brother".into(),
            nominee_mobile: "12345".into(),
            nominee_address: "Bengaluru".into(),
        };
        let errors = validate(NOMINEE_RULES, &nominee).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("nominee_mobile"),
            Some("Please enter a valid 10-digit mobile number")
        );
    }

    #[test]
    fn test_profile_rules() {
        let mut request = ProfileUpdateRequest {
            name: "Asha".into(),
            father: "Mohan".into(),
            gender: "Female".into(),
            mobile: "9876543210".into(),
            emailid: "asha@example.com".into(),
            state: Some(29),
            district: Some(4),
            address: "MG Road".into(),
            pincode: "560001".into(),
            occupation: "Teacher".into(),
            dob: "1990-01-01".into(),
        };
        assert!(validate(PROFILE_RULES, &request).is_ok());

        request.pincode = "5600".into();
        request.district = None;
        let errors = validate(PROFILE_RULES, &request).unwrap_err();
        assert_eq!(
            errors.get("pincode"),
            Some("Please enter a valid 6-digit pincode")
        );
        assert_eq!(errors.get("district"), Some("District is required"));
    }

    #[test]
    fn test_kyc_rules() {
        let mut submission = KycSubmission {
            aadhaar: "123412341234".into(),
            pan: "ABCDE1234F".into(),
            aadhaar_img: Some(KycDocument::Existing("a.jpg".into())),
            aadhaar_back_img: Some(KycDocument::Existing("b.jpg".into())),
            pan_img: Some(KycDocument::Existing("p.jpg".into())),
            checkbook_img: None,
        };
        let errors = validate(KYC_RULES, &submission).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("checkbook_img"), Some("Cheque image is required"));

        submission.aadhaar = "1234".into();
        submission.checkbook_img = Some(KycDocument::Existing("c.jpg".into()));
        let errors = validate(KYC_RULES, &submission).unwrap_err();
        assert_eq!(
            errors.get("aadhaar"),
            Some("Please enter a valid 12-digit Aadhaar number")
        );
    }

    #[test]
    fn test_errors_clear_and_display() {
        let mut errors = validate(CHANGE_PASSWORD_RULES, &password("", "secret1", "secret1")).unwrap_err();
        assert_eq!(errors.to_string(), "1 field(s) need attention");
        errors.clear("old_password");
        assert!(errors.is_empty());
    }
}
