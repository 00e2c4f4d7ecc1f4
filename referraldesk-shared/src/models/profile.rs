use serde::{Deserialize, Serialize};
use std::fmt;

use super::lenient;

/// KYC verification state reported on the member profile.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KycStatus {
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[default]
    #[serde(rename = "NOT VERIFIED", other)]
    NotVerified,
}

impl KycStatus {
    /// Return the label the server uses for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Pending => "PENDING",
            Self::Rejected => "REJECTED",
            Self::NotVerified => "NOT VERIFIED",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn kyc_status_or_default<'de, D>(deserializer: D) -> Result<KycStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<KycStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Nominee details, both as stored on the profile and as posted to
/// `update-nominee-details`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NomineeDetails {
    pub nominee_name: String,
    pub relationship: String,
    pub nominee_mobile: String,
    pub nominee_address: String,
}

/// Member profile as returned by the `profile` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    /// SAM id assigned to the member.
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "phone", deserialize_with = "lenient::opt_text")]
    pub mobile: Option<String>,
    #[serde(default, rename = "emailid", alias = "email")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "kyc_status_or_default")]
    pub kyc_status: KycStatus,
    #[serde(default)]
    pub kyc_rejection: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub referral_amount: f64,
    /// Server-side reference to the profile picture.
    #[serde(default)]
    pub profile_img: Option<String>,

    #[serde(default)]
    pub father: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub state_id: Option<u64>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub district_id: Option<u64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub pincode: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub aadhaar: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub aadhaar_img: Option<String>,
    #[serde(default)]
    pub aadhaar_back_img: Option<String>,
    #[serde(default)]
    pub pan_img: Option<String>,
    #[serde(default)]
    pub checkbook_img: Option<String>,

    #[serde(flatten)]
    pub nominee: NomineeDetails,
}

/// Envelope payload of the `profile` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub member: Profile,
}

/// Body of the `update-profile` endpoint. State and district travel as ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdateRequest {
    pub name: String,
    pub father: String,
    pub gender: String,
    pub mobile: String,
    pub emailid: String,
    pub state: Option<u64>,
    pub district: Option<u64>,
    pub address: String,
    pub pincode: String,
    pub occupation: String,
    pub dob: String,
}

impl ProfileUpdateRequest {
    /// Seeds an update request from the currently loaded profile.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: profile.name.clone(),
            father: text(&profile.father),
            gender: text(&profile.gender),
            mobile: text(&profile.mobile),
            emailid: text(&profile.email),
            state: profile.state_id,
            district: profile.district_id,
            address: text(&profile.address),
            pincode: text(&profile.pincode),
            occupation: text(&profile.occupation),
            dob: text(&profile.dob),
        }
    }
}
