use std::boxed::Box;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::result::Result;

use actix_http::{Payload, StatusCode};
use actix_web::error::{Error as ActixError, ResponseError};
use actix_web::{FromRequest, HttpRequest};

// The API gateway authenticates end users and forwards the verified
// identity in the headers below, this service only runs inside the
// private network area behind that gateway.
const HEADER_NAME_ACTOR_PROFILE: &str = "x-actor-profile";
const HEADER_NAME_ACTOR_ROLE: &str = "x-actor-role";

#[derive(Debug, Clone)]
pub enum AuthIdentityError {
    MissingProfile,
    CorruptedProfile(String),
    UnknownRole(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppActorRole {
    User,
    Admin,
}

#[derive(Debug, Clone)]
pub struct AppActorIdentity {
    pub profile: u32,
    pub role: AppActorRole,
}

impl AppActorIdentity {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, AppActorRole::Admin)
    }
}

impl TryFrom<&HttpRequest> for AppActorIdentity {
    type Error = AuthIdentityError;
    fn try_from(req: &HttpRequest) -> Result<Self, Self::Error> {
        let profile_serial = req
            .headers()
            .get(HEADER_NAME_ACTOR_PROFILE)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthIdentityError::MissingProfile)?;
        let profile = profile_serial
            .parse::<u32>()
            .map_err(|_e| AuthIdentityError::CorruptedProfile(profile_serial.to_string()))?;
        let role_serial = req
            .headers()
            .get(HEADER_NAME_ACTOR_ROLE)
            .and_then(|v| v.to_str().ok());
        let role = match role_serial {
            Some("admin") => AppActorRole::Admin,
            Some("user") | None => AppActorRole::User,
            Some(other) => return Err(AuthIdentityError::UnknownRole(other.to_string())),
        };
        Ok(Self { profile, role })
    }
}

impl FromRequest for AppActorIdentity {
    type Error = ActixError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = Self::try_from(req).map_err(ActixError::from);
        Box::pin(async move { result })
    }
}

impl Display for AuthIdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl ResponseError for AuthIdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingProfile => StatusCode::UNAUTHORIZED,
            Self::CorruptedProfile(_d) | Self::UnknownRole(_d) => StatusCode::BAD_REQUEST,
        }
    }
}
