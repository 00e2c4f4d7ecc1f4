//! Domain operations, one per server endpoint.
//!
//! Every action goes through the shared [`ApiClient`] and, on success,
//! dispatches the matching [`Action`] into the session. Callers surface the
//! returned error through a [`crate::notify::Notifier`]; nothing here shows
//! anything to the user.

use reqwest::multipart::Form;
use shared::models::{
    ChangePasswordRequest, DashboardSummary, Envelope, GuideDetailsResponse, LoginRequest,
    LoginResponse, NomineeDetails, Profile, ProfileResponse, ProfileUpdateRequest, ReferenceItem,
    ReferenceListResponse, ReferralIncome, ReferralIncomeRequest, ReferralIncomeResponse,
    ReferralListResponse, ReferralSummary, RegistrationAmountResponse,
};
use tracing::{debug, warn};

use crate::{
    api::{Access, ApiClient},
    boundary::{Attachment, AttachmentSource, Permission, PermissionGate, require_permission},
    error::{ActionError, ApiError},
    registration::RegistrationForm,
    session::{Action, ReferenceList},
    validation::{self, CHANGE_PASSWORD_RULES, KYC_RULES, NOMINEE_RULES, PROFILE_RULES},
};

/// Shortest SAM number worth looking up.
pub const MIN_SAM_LEN: usize = 3;

/// A KYC document image: either the one already on file or a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KycDocument {
    /// Server-side reference of an image uploaded earlier.
    Existing(String),
    Upload(Attachment),
}

impl KycDocument {
    fn append_to(self, form: Form, name: &'static str) -> Result<Form, ApiError> {
        Ok(match self {
            Self::Existing(reference) => form.text(name, reference),
            Self::Upload(attachment) => form.part(name, attachment.into_part()?),
        })
    }
}

/// Everything the `update-kyc` endpoint accepts, submitted as one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KycSubmission {
    pub aadhaar: String,
    pub pan: String,
    pub aadhaar_img: Option<KycDocument>,
    pub aadhaar_back_img: Option<KycDocument>,
    pub pan_img: Option<KycDocument>,
    pub checkbook_img: Option<KycDocument>,
}

impl KycSubmission {
    /// Prefills the submission with what the server already has on file.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let existing = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|reference| !reference.is_empty())
                .map(|reference| KycDocument::Existing(reference.to_string()))
        };
        Self {
            aadhaar: profile.aadhaar.clone().unwrap_or_default(),
            pan: profile.pan.clone().unwrap_or_default(),
            aadhaar_img: existing(&profile.aadhaar_img),
            aadhaar_back_img: existing(&profile.aadhaar_back_img),
            pan_img: existing(&profile.pan_img),
            checkbook_img: existing(&profile.checkbook_img),
        }
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new().text("aadhaar", self.aadhaar).text("pan", self.pan);
        for (name, document) in [
            ("aadhaar_img", self.aadhaar_img),
            ("aadhaar_back_img", self.aadhaar_back_img),
            ("pan_img", self.pan_img),
            ("checkbook_img", self.checkbook_img),
        ] {
            if let Some(document) = document {
                form = document.append_to(form, name)?;
            }
        }
        Ok(form)
    }
}

/// Handle bundling the API client with the session it feeds.
#[derive(Debug, Clone)]
pub struct Actions {
    api: ApiClient,
}

impl Actions {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchanges credentials for a token, commits it to the session and
    /// persists it. A persistence failure only costs the next restart.
    ///
    /// # Errors
    /// Rejected credentials surface as [`ApiError::Domain`].
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.api.post_json("login", Access::Public, &request).await?;
        self.api
            .session()
            .dispatch(Action::Authenticate(response.data.clone()));
        if let Err(err) = self.api.credentials().set(&response.data) {
            warn!(error = %err, "failed to persist credential");
        }
        Ok(())
    }

    /// Clears the session and the stored credential. Safe to repeat.
    pub fn logout(&self) {
        self.api.session().dispatch(Action::Logout);
        if let Err(err) = self.api.credentials().remove() {
            warn!(error = %err, "failed to remove credential");
        }
    }

    /// Fetches the member profile. Overlapping calls share one request.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let sent = self.api.bearer(Access::Authenticated);
        let response: ProfileResponse = self
            .api
            .get_as("profile", Access::Authenticated, sent.clone())
            .await?;
        // A reply for a token that was logged out or replaced is not this
        // session's profile.
        if sent.is_some() && self.api.session().token() == sent {
            self.api
                .session()
                .dispatch(Action::SetProfile(response.member.clone()));
        }
        Ok(response.member)
    }

    async fn refresh_profile(&self) {
        if let Err(err) = self.fetch_profile().await {
            warn!(error = %err, "profile refresh failed");
        }
    }

    /// # Errors
    /// Validation failures are returned before any request is sent.
    pub async fn update_profile(&self, request: &ProfileUpdateRequest) -> Result<String, ActionError> {
        validation::validate(PROFILE_RULES, request)?;
        let envelope: Envelope = self
            .api
            .post_json("update-profile", Access::Authenticated, request)
            .await?;
        self.refresh_profile().await;
        Ok(message_or(&envelope, "Profile updated successfully"))
    }

    /// Asks for photo access, lets the user pick an image and uploads it.
    ///
    /// # Errors
    /// A denied permission or cancelled pick aborts before any request.
    pub async fn upload_profile_image(
        &self,
        gate: &dyn PermissionGate,
        source: &dyn AttachmentSource,
    ) -> Result<String, ActionError> {
        require_permission(gate, Permission::PhotoLibrary).await?;
        let attachment = source.pick().await?;
        let form = Form::new().part("profile_img", attachment.into_part()?);
        let envelope: Envelope = self
            .api
            .post_multipart("update-profile-img", Access::Authenticated, form)
            .await?;
        self.refresh_profile().await;
        Ok(message_or(&envelope, "Profile image updated successfully"))
    }

    /// # Errors
    /// Validation failures are returned before any request is sent.
    pub async fn update_kyc(&self, submission: KycSubmission) -> Result<String, ActionError> {
        validation::validate(KYC_RULES, &submission)?;
        let envelope: Envelope = self
            .api
            .post_multipart("update-kyc", Access::Authenticated, submission.into_form()?)
            .await?;
        self.refresh_profile().await;
        Ok(message_or(&envelope, "KYC updated successfully"))
    }

    /// # Errors
    /// Validation failures are returned before any request is sent.
    pub async fn update_nominee(&self, nominee: &NomineeDetails) -> Result<String, ActionError> {
        validation::validate(NOMINEE_RULES, nominee)?;
        let envelope: Envelope = self
            .api
            .post_json("update-nominee-details", Access::Authenticated, nominee)
            .await?;
        self.refresh_profile().await;
        Ok(message_or(&envelope, "Nominee details updated successfully"))
    }

    /// # Errors
    /// Validation failures are returned before any request is sent.
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<String, ActionError> {
        validation::validate(CHANGE_PASSWORD_RULES, request)?;
        let envelope: Envelope = self
            .api
            .post_json("change-password", Access::Authenticated, request)
            .await?;
        Ok(message_or(&envelope, "Password changed successfully"))
    }

    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_states(&self) -> Result<Vec<ReferenceItem>, ApiError> {
        let response: ReferenceListResponse = self.api.get("states", Access::Public).await?;
        self.api
            .session()
            .dispatch(Action::SetReferenceList(ReferenceList::States(
                response.data.clone(),
            )));
        Ok(response.data)
    }

    /// Selects a state and loads its districts. The previous district list
    /// is invalidated immediately.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] of the district fetch.
    pub async fn select_state(&self, state_id: Option<u64>) -> Result<Vec<ReferenceItem>, ApiError> {
        self.api.session().dispatch(Action::SelectState(state_id));
        match state_id {
            Some(state_id) => self.fetch_districts(state_id).await,
            None => Ok(Vec::new()),
        }
    }

    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_districts(&self, state_id: u64) -> Result<Vec<ReferenceItem>, ApiError> {
        let path = format!("districts/{state_id}");
        let response: ReferenceListResponse = self.api.get(&path, Access::Public).await?;
        self.api
            .session()
            .dispatch(Action::SetReferenceList(ReferenceList::Districts {
                state_id,
                items: response.data.clone(),
            }));
        Ok(response.data)
    }

    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_registration_amount(&self) -> Result<f64, ApiError> {
        let response: RegistrationAmountResponse =
            self.api.get("register-amount", Access::Public).await?;
        self.api
            .session()
            .dispatch(Action::SetRegistrationAmount(response.amount));
        Ok(response.amount)
    }

    /// Resolves the guide (referrer) name for a SAM number. Numbers too short
    /// to look up, or containing anything but ASCII letters and digits,
    /// resolve to `None` without a request.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn lookup_guide(&self, sam_no: &str) -> Result<Option<String>, ApiError> {
        let sam_no = sam_no.trim();
        if sam_no.len() < MIN_SAM_LEN || !sam_no.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Ok(None);
        }
        let path = format!("get-guide-details/{sam_no}");
        let response: GuideDetailsResponse = self.api.get(&path, Access::Public).await?;
        debug!(sam_no, guide = %response.name, "guide resolved");
        Ok(Some(response.name).filter(|name| !name.trim().is_empty()))
    }

    /// Posts a completed registration. Returns the server's confirmation.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`]; the form is left untouched.
    pub async fn submit_registration(&self, form: &RegistrationForm) -> Result<String, ApiError> {
        let envelope: Envelope = self
            .api
            .post_multipart("register", Access::Public, form.to_multipart()?)
            .await?;
        Ok(message_or(&envelope, "Registration submitted successfully!"))
    }

    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_dashboard(&self) -> Result<DashboardSummary, ApiError> {
        let summary: DashboardSummary = self.api.get("dashboard-data", Access::Authenticated).await?;
        self.api
            .session()
            .dispatch(Action::SetDashboard(summary.clone()));
        Ok(summary)
    }

    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_referrals(&self) -> Result<ReferralSummary, ApiError> {
        let response: ReferralListResponse =
            self.api.get("referral-list", Access::Authenticated).await?;
        let summary = ReferralSummary::from(response);
        self.api
            .session()
            .dispatch(Action::SetReferrals(summary.clone()));
        Ok(summary)
    }

    /// Income per referral level for one month.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_referral_income(&self, month: u32, year: i32) -> Result<ReferralIncome, ApiError> {
        let request = ReferralIncomeRequest { month, year };
        let response: ReferralIncomeResponse = self
            .api
            .post_json("referral-income-list", Access::Authenticated, &request)
            .await?;
        self.api
            .session()
            .dispatch(Action::SetReferralIncome(response.income));
        Ok(response.income)
    }
}

fn message_or(envelope: &Envelope, fallback: &str) -> String {
    envelope.message().unwrap_or(fallback).to_string()
}
