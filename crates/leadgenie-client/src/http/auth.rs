//! [`AuthProvider`] over the HTTP client.

use leadgenie_core::OtpCode;
use leadgenie_core::types::{
    LoginCredentials, OtpDispatch, OtpReceipt, PendingRegistration, TokenGrant, UserProfile,
    VerifyOtpBody,
};

use super::{ApiClient, ApiRequest, routes};
use crate::Result;
use crate::provider::AuthProvider;

#[async_trait::async_trait]
impl AuthProvider for ApiClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant> {
        let request = ApiRequest::post(routes::LOGIN)
            .public()
            .form(credentials.form_fields());
        self.send(request).await
    }

    async fn current_user(&self) -> Result<UserProfile> {
        self.send(ApiRequest::get(routes::CURRENT_USER)).await
    }

    async fn register(&self, draft: &PendingRegistration) -> Result<UserProfile> {
        let request = ApiRequest::post(routes::REGISTER)
            .public()
            .json(&draft.registration_body())?;
        self.send(request).await
    }

    async fn send_otp(&self, draft: &PendingRegistration) -> Result<OtpDispatch> {
        let request = ApiRequest::post(routes::SEND_OTP)
            .public()
            .json(&draft.send_otp_body())?;
        self.send_or_default(request).await
    }

    async fn verify_otp(&self, email: &str, code: &OtpCode) -> Result<OtpReceipt> {
        let body = VerifyOtpBody {
            email,
            otp_code: code.as_str(),
        };
        let request = ApiRequest::post(routes::VERIFY_OTP).public().json(&body)?;
        self.send_or_default(request).await
    }

    async fn register_with_otp(
        &self,
        draft: &PendingRegistration,
        code: &OtpCode,
    ) -> Result<UserProfile> {
        let request = ApiRequest::post(routes::REGISTER_WITH_OTP)
            .public()
            .json(&draft.register_with_otp_body(code))?;
        self.send(request).await
    }
}
