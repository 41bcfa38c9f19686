use std::ops::{Deref, DerefMut};

use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCore {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Premium insight tiers are gated on this flag; activation itself
    /// (payment) happens outside this service.
    pub active_membership: bool,
}

impl CandidateCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create a CandidateCore is via
        // From<CandidateRegistration>, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// A candidate without an ID, ready for insertion.
pub type NewCandidate = CandidateCore;

/// Raw registration data, received from a user. Never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct CandidateRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<CandidateRegistration> for CandidateCore {
    /// Convert a registration into a storable candidate by hashing the password.
    fn from(reg: CandidateRegistration) -> Self {
        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(reg.password.as_bytes(), &salt, &Config::default())
                .unwrap(); // Safe because the default `Config` is valid.
        Self {
            name: reg.name,
            email: reg.email,
            password_hash,
            active_membership: false,
        }
    }
}

/// A candidate from the database, with their unique ID.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_hashes_password() {
        let core: CandidateCore = CandidateRegistration {
            name: "Ayesha Khan".to_string(),
            email: "ayesha@example.com".to_string(),
            password: "correct horse".to_string(),
        }
        .into();

        assert_ne!(core.password_hash, "correct horse");
        assert!(core.verify_password("correct horse"));
        assert!(!core.verify_password("wrong horse"));
        assert!(!core.active_membership);
    }
}
