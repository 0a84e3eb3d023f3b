//! OTP Store - One time codes for the phone sign-in
//!
//! Codes live in memory only: a restart invalidates every pending sign-in.

use dashmap::DashMap;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

pub const CODE_DIGITS: usize = 6;
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Invalid,
    /// Expired, never issued, or discarded after too many attempts
    Missing,
}

struct PendingCode {
    code: String,
    expires_at: Instant,
    attempts: u32,
}

pub struct OtpStore {
    pending: DashMap<String, PendingCode>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    /// Issues a fresh code for a normalized phone, replacing any pending one
    #[instrument(skip(self))]
    pub fn issue(&self, phone: &str) -> String {
        let code = format!("{:0width$}", rand::thread_rng().gen_range(0..1_000_000u32), width = CODE_DIGITS);
        self.pending.insert(
            phone.to_string(),
            PendingCode {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
                attempts: 0,
            },
        );
        debug!("OTP issued");
        code
    }

    /// Checks a code, a valid code is consumed
    #[instrument(skip(self, code))]
    pub fn verify(&self, phone: &str, code: &str) -> OtpCheck {
        let outcome = match self.pending.get_mut(phone) {
            None => return OtpCheck::Missing,
            Some(mut entry) => {
                if entry.expires_at <= Instant::now() {
                    OtpCheck::Missing
                } else if entry.code == code.trim() {
                    OtpCheck::Valid
                } else {
                    entry.attempts += 1;
                    if entry.attempts >= MAX_ATTEMPTS {
                        warn!("Too many wrong OTP attempts, discarding code");
                        OtpCheck::Missing
                    } else {
                        return OtpCheck::Invalid;
                    }
                }
            }
        };

        // the guard above is dropped here, removing while holding it would deadlock
        self.pending.remove(phone);
        outcome
    }

    /// Drops every expired code
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.pending.retain(|_, pending| pending.expires_at > now);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
