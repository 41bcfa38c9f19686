use mongodb::bson::doc;
use rocket::{http::CookieJar, serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::auth::{AuthToken, CandidateCredentials, AUTH_TOKEN_COOKIE},
    db::candidate::{Candidate, CandidateRegistration, NewCandidate},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout]
}

#[post("/candidates", data = "<registration>", format = "json")]
async fn register(
    registration: Json<CandidateRegistration>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
) -> Result<()> {
    if registration.name.trim().is_empty() || registration.email.trim().is_empty() {
        return Err(Error::bad_request("Name and email are required"));
    }
    if registration.password.len() < 8 {
        return Err(Error::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    // Check email uniqueness up front for a friendly error; the unique
    // index still backstops races.
    let existing = candidates
        .find_one(doc! { "email": &registration.email }, None)
        .await?;
    if existing.is_some() {
        return Err(Error::bad_request(format!(
            "Email already registered: {}",
            registration.email
        )));
    }

    let candidate: NewCandidate = registration.0.into();
    new_candidates.insert_one(candidate, None).await?;
    Ok(())
}

#[post("/auth/login", data = "<credentials>", format = "json")]
async fn login(
    credentials: Json<CandidateCredentials>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
) -> Result<()> {
    let candidate = candidates
        .find_one(doc! { "email": &credentials.email }, None)
        .await?
        .filter(|candidate| candidate.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Status(
                rocket::http::Status::Unauthorized,
                "Invalid email or password".to_string(),
            )
        })?;

    let token = AuthToken::new(&candidate);
    cookies.add(token.into_cookie(config));
    Ok(())
}

#[post("/auth/logout")]
async fn logout(_token: AuthToken, cookies: &CookieJar<'_>) -> Result<()> {
    cookies.remove(rocket::http::Cookie::named(AUTH_TOKEN_COOKIE));
    Ok(())
}
