//! Guest validation - Identity checks and de-duplication for RSVP guests
//!
//! Everything in here is pure: the callers load the snapshot of the event
//! (who already responded, which contacts are already on the guest list) and
//! hand it over together with the candidates. Nothing is read or written.
//!
//! Rules applied to every guest, first failure wins:
//! 1. name has at least 2 characters and at least one letter
//! 2. at least one of email / phone is present
//! 3. email matches a basic pattern and its domain is allowed by the [`EmailPolicy`]
//! 4. phone has exactly 10 digits once every non digit is stripped
//! 5. a non primary guest can not reuse the contact of the authenticated user
//! 6. a guest can not reuse the contact of a guest staged earlier in the same submission
//!
//! At event scope a submission is then rejected when the user already responded,
//! or when any guest reuses the contact of a guest already on the event guest list.

use crate::dtos::GuestInput;
use crate::entities::{Gender, RsvpGuest, User};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

pub const PHONE_DIGITS: usize = 10;
pub const MIN_NAME_CHARS: usize = 2;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile");
}

/// Keeps only the ASCII digits of a phone number
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns `None` for missing or blank values
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Email,
    Phone,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactField::Email => write!(f, "email"),
            ContactField::Phone => write!(f, "phone number"),
        }
    }
}

/// Normalized contact information used for identity matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Contact {
    pub fn new(email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            email: present(email).map(normalize_email),
            phone: present(phone)
                .map(normalize_phone)
                .filter(|p| !p.is_empty()),
        }
    }

    pub fn of_user(user: &User) -> Self {
        Self::new(user.email.as_deref(), Some(&user.phone))
    }

    pub fn of_guest(guest: &RsvpGuest) -> Self {
        Self::new(guest.email.as_deref(), guest.phone.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }

    /// First field both contacts have in common, email checked before phone
    pub fn shared_field(&self, other: &Contact) -> Option<ContactField> {
        let same = |a: &Option<String>, b: &Option<String>| matches!((a, b), (Some(a), Some(b)) if a == b);

        if same(&self.email, &other.email) {
            Some(ContactField::Email)
        } else if same(&self.phone, &other.phone) {
            Some(ContactField::Phone)
        } else {
            None
        }
    }
}

/// Which email domains are accepted for guests
///
/// An empty list accepts every domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPolicy {
    allowed_domains: Vec<String>,
}

impl EmailPolicy {
    pub fn any() -> Self {
        Self {
            allowed_domains: Vec::new(),
        }
    }

    pub fn only<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_start_matches('@').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Parses a comma separated list, `*` meaning any domain
    pub fn parse(value: &str) -> Self {
        if value.split(',').any(|d| d.trim() == "*") {
            return Self::any();
        }
        Self::only(value.split(','))
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Expects an already normalized address
    pub fn permits(&self, email: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        match email.rsplit_once('@') {
            Some((_, domain)) => self.allowed_domains.iter().any(|d| d == domain),
            None => false,
        }
    }

    fn describe(&self) -> String {
        self.allowed_domains.join(", ")
    }
}

impl Default for EmailPolicy {
    fn default() -> Self {
        Self::only(["gmail.com"])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuestRejection {
    #[error("Name must be at least 2 characters long")]
    NameTooShort,
    #[error("Name must contain at least one letter")]
    NameWithoutLetters,
    #[error("Provide at least an email or a phone number")]
    MissingContact,
    #[error("Email address is not valid")]
    InvalidEmail,
    #[error("Only {allowed} email addresses are accepted")]
    EmailDomainNotAllowed { allowed: String },
    #[error("Phone number must have exactly 10 digits")]
    InvalidPhone,
    #[error("This {0} is yours, you are already the primary guest")]
    MatchesPrimaryUser(ContactField),
    #[error("This {field} is already used by guest #{guest_number}")]
    DuplicateInSubmission {
        field: ContactField,
        guest_number: usize,
    },
    #[error("A guest with this {0} is already on the guest list")]
    AlreadyOnGuestList(ContactField),
}

/// Rejection of a single guest, `index` is its position in the submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIssue {
    pub index: usize,
    pub reason: GuestRejection,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionRejection {
    #[error("At least one guest is required")]
    Empty,
    #[error("One or more guests are invalid")]
    InvalidGuests(Vec<GuestIssue>),
    #[error("You have already responded to this event")]
    AlreadyResponded,
    #[error("One or more guests are already on the guest list")]
    DuplicateGuests(Vec<GuestIssue>),
}

/// A guest that passed the checks, with trimmed name and normalized contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidGuest {
    pub position: usize,
    pub name: String,
    pub contact: Contact,
    pub gender: Gender,
    pub is_primary: bool,
}

/// Field level rules (1 to 4): name, presence of a contact, email and phone format
pub fn check_fields(input: &GuestInput, policy: &EmailPolicy) -> Result<(String, Contact), GuestRejection> {
    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(GuestRejection::NameTooShort);
    }
    if !name.chars().any(char::is_alphabetic) {
        return Err(GuestRejection::NameWithoutLetters);
    }

    let email = present(input.email.as_deref());
    let phone = present(input.phone.as_deref());
    if email.is_none() && phone.is_none() {
        return Err(GuestRejection::MissingContact);
    }

    let email = match email {
        Some(raw) => {
            let email = normalize_email(raw);
            if !EMAIL_PATTERN.is_match(&email) {
                return Err(GuestRejection::InvalidEmail);
            }
            if !policy.permits(&email) {
                return Err(GuestRejection::EmailDomainNotAllowed {
                    allowed: policy.describe(),
                });
            }
            Some(email)
        }
        None => None,
    };

    let phone = match phone {
        Some(raw) => {
            let phone = normalize_phone(raw);
            if phone.len() != PHONE_DIGITS {
                return Err(GuestRejection::InvalidPhone);
            }
            Some(phone)
        }
        None => None,
    };

    Ok((name.to_string(), Contact { email, phone }))
}

/// Validates one guest against the authenticated user and the guests staged
/// before it in the same submission (rules 1 to 6)
pub fn validate_guest(
    input: &GuestInput,
    position: usize,
    is_primary: bool,
    user: &Contact,
    staged: &[ValidGuest],
    policy: &EmailPolicy,
) -> Result<ValidGuest, GuestRejection> {
    let (name, contact) = check_fields(input, policy)?;

    if !is_primary {
        if let Some(field) = contact.shared_field(user) {
            return Err(GuestRejection::MatchesPrimaryUser(field));
        }
    }

    if let Some((field, other)) = staged
        .iter()
        .find_map(|other| contact.shared_field(&other.contact).map(|f| (f, other)))
    {
        return Err(GuestRejection::DuplicateInSubmission {
            field,
            guest_number: other.position + 1,
        });
    }

    Ok(ValidGuest {
        position,
        name,
        contact,
        gender: input.gender,
        is_primary,
    })
}

/// Rejects a guest whose contact is already on the event guest list
pub fn check_against_event(guest: &ValidGuest, existing: &[Contact]) -> Result<(), GuestRejection> {
    match existing.iter().find_map(|c| guest.contact.shared_field(c)) {
        Some(field) => Err(GuestRejection::AlreadyOnGuestList(field)),
        None => Ok(()),
    }
}

/// Snapshot of everything a submission is checked against
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    /// Contact of the authenticated user
    pub user: &'a Contact,
    /// Whether the user already holds a confirmed rsvp for the event
    pub user_has_rsvp: bool,
    /// Contacts of every guest of the confirmed rsvps of the event
    pub existing: &'a [Contact],
    pub policy: &'a EmailPolicy,
}

/// Validates a whole submission. The first guest is the primary one.
///
/// Every guest is checked and all the failures are reported together, the
/// event scope checks only run once every guest is individually valid.
pub fn validate_submission(
    inputs: &[GuestInput],
    ctx: &SubmissionContext<'_>,
) -> Result<Vec<ValidGuest>, SubmissionRejection> {
    if inputs.is_empty() {
        return Err(SubmissionRejection::Empty);
    }

    let mut staged: Vec<ValidGuest> = Vec::with_capacity(inputs.len());
    let mut issues = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        match validate_guest(input, index, index == 0, ctx.user, &staged, ctx.policy) {
            Ok(guest) => staged.push(guest),
            Err(reason) => issues.push(GuestIssue { index, reason }),
        }
    }

    if !issues.is_empty() {
        return Err(SubmissionRejection::InvalidGuests(issues));
    }

    if ctx.user_has_rsvp {
        return Err(SubmissionRejection::AlreadyResponded);
    }

    let duplicates: Vec<GuestIssue> = staged
        .iter()
        .filter_map(|guest| {
            check_against_event(guest, ctx.existing)
                .err()
                .map(|reason| GuestIssue {
                    index: guest.position,
                    reason,
                })
        })
        .collect();

    if !duplicates.is_empty() {
        return Err(SubmissionRejection::DuplicateGuests(duplicates));
    }

    Ok(staged)
}
