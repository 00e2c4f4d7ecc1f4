use serde::{Deserialize, Serialize};

use super::lenient;

/// Totals shown on the home screen, from `dashboard-data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_referral: u64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_amount: f64,
}

/// One referred member.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralMember {
    #[serde(default)]
    pub name: String,
    /// `Active`, `Pending` or `Rejected`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub mobile: Option<String>,
}

impl ReferralMember {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Envelope payload of `referral-list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralListResponse {
    #[serde(default)]
    pub referrals: Vec<ReferralMember>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_mem: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_pending_mem: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_active_mem: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_rejected_mem: u64,
}

/// Referral list and counters as kept in session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferralSummary {
    pub members: Vec<ReferralMember>,
    pub total: u64,
    pub pending: u64,
    pub active: u64,
    pub rejected: u64,
}

impl From<ReferralListResponse> for ReferralSummary {
    fn from(response: ReferralListResponse) -> Self {
        Self {
            members: response.referrals,
            total: response.total_mem,
            pending: response.total_pending_mem,
            active: response.total_active_mem,
            rejected: response.total_rejected_mem,
        }
    }
}

/// Body of `referral-income-list`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralIncomeRequest {
    /// Calendar month, 1 to 12.
    pub month: u32,
    pub year: i32,
}

/// Team size and earnings for one referral level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IncomeLevel {
    #[serde(deserialize_with = "lenient::count")]
    pub count: u64,
    #[serde(deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub current_count: u64,
    #[serde(deserialize_with = "lenient::amount")]
    pub current_amount: f64,
}

/// Income broken down by level: direct referrals, then SHG levels 1 to 4.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferralIncome {
    pub direct: IncomeLevel,
    pub level1: IncomeLevel,
    pub level2: IncomeLevel,
    pub level3: IncomeLevel,
    pub level4: IncomeLevel,
}

impl ReferralIncome {
    /// Levels paired with their display labels, in display order.
    #[must_use]
    pub fn levels(&self) -> [(&'static str, IncomeLevel); 5] {
        [
            ("Direct", self.direct),
            ("SHG-1", self.level1),
            ("SHG-2", self.level2),
            ("SHG-3", self.level3),
            ("SHG-4", self.level4),
        ]
    }
}

/// Envelope payload of `referral-income-list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralIncomeResponse {
    #[serde(default)]
    pub income: ReferralIncome,
}
