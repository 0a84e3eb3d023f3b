//! Auth DTOs - Data Transfer Objects for the phone/OTP sign-in

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct OtpRequestDTO {
    pub phone: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OtpVerifyDTO {
    pub phone: String,
    pub code: String,
    /// Used only when the profile is provisioned by this sign-in
    #[serde(default)]
    pub name: Option<String>,
}
