pub mod auth;
pub mod envelope;
pub mod lenient;
pub mod profile;
pub mod reference;
pub mod referral;

pub use auth::{ChangePasswordRequest, LoginRequest, LoginResponse};
pub use envelope::Envelope;
pub use profile::{
    KycStatus, NomineeDetails, Profile, ProfileResponse, ProfileUpdateRequest,
};
pub use reference::{
    GuideDetailsResponse, ReferenceItem, ReferenceListResponse, RegistrationAmountResponse,
};
pub use referral::{
    DashboardSummary, IncomeLevel, ReferralIncome, ReferralIncomeRequest, ReferralIncomeResponse,
    ReferralListResponse, ReferralMember, ReferralSummary,
};
