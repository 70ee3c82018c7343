use std::fmt::Display;

use cpg_common::Paise;
use registration_engine::{
    db_types::{CandidateCategory, PaymentStatus},
    NewRegistration,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The registration submission as the checkout front end posts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Fee in minor units (paise), exactly what the gateway order will carry.
    pub amount: i64,
    pub form_data: RegistrationForm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub category: CandidateCategory,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl RegistrationRequest {
    pub fn into_registration(self) -> NewRegistration {
        NewRegistration {
            name: self.form_data.name,
            email: self.form_data.email,
            whatsapp_number: self.form_data.whatsapp_number,
            category: self.form_data.category,
            college: self.form_data.college,
            company: self.form_data.company,
            amount: Paise::from(self.amount),
        }
    }
}

/// The client verification callback, with the gateway's detached signature over `order|payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub whatsapp_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSendRequest {
    #[serde(default)]
    pub candidate_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateIdRequest {
    pub candidate_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}
