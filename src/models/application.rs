//! Application record model and the input/patch types used to mutate it.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Channel through which an application was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    LinkedIn,
    Internshala,
    Indeed,
    CompanySite,
    Referral,
    Other,
    /// A label the store holds that is not one of the known channels.
    Unlisted(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Internshala => "Internshala",
            Platform::Indeed => "Indeed",
            Platform::CompanySite => "Company Site",
            Platform::Referral => "Referral",
            Platform::Other => "Other",
            Platform::Unlisted(label) => label,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "LinkedIn" => Platform::LinkedIn,
            "Internshala" => Platform::Internshala,
            "Indeed" => Platform::Indeed,
            "Company Site" => Platform::CompanySite,
            "Referral" => Platform::Referral,
            "Other" => Platform::Other,
            _ => Platform::Unlisted(s.to_string()),
        }
    }

    /// Read a platform off a store value. Null means the default channel.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Platform::default(),
            Value::String(label) => Platform::parse(&label),
            other => Platform::Unlisted(other.to_string()),
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, Platform::Unlisted(_))
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Platform::from_value)
    }
}

/// Lifecycle state of an application.
///
/// Only the four canonical states are counted by the stats aggregator. A value
/// outside that set is kept verbatim in `Unrecognized` so it survives a round
/// trip through the store without being promoted to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Applied,
    Interviewing,
    Accepted,
    Rejected,
    Unrecognized(String),
}

impl Status {
    pub const CANONICAL: [Status; 4] = [
        Status::Applied,
        Status::Interviewing,
        Status::Accepted,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Status::Applied => "Applied",
            Status::Interviewing => "Interviewing",
            Status::Accepted => "Accepted",
            Status::Rejected => "Rejected",
            Status::Unrecognized(raw) => raw,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Applied" => Status::Applied,
            "Interviewing" => Status::Interviewing,
            "Accepted" => Status::Accepted,
            "Rejected" => Status::Rejected,
            _ => Status::Unrecognized(s.to_string()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Status::default(),
            Value::String(raw) => Status::parse(&raw),
            other => Status::Unrecognized(other.to_string()),
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Status::Unrecognized(_))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Status::from_value)
    }
}

/// Application date as the store holds it.
///
/// Anything that is not an ISO calendar date is kept verbatim in `Unparsed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateApplied {
    On(NaiveDate),
    Unparsed(Value),
}

impl DateApplied {
    pub fn from_value(value: Value) -> Self {
        if let Value::String(raw) = &value {
            if let Ok(date) = raw.parse() {
                return DateApplied::On(date);
            }
        }
        DateApplied::Unparsed(value)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateApplied::On(date) => Some(*date),
            DateApplied::Unparsed(_) => None,
        }
    }
}

impl From<NaiveDate> for DateApplied {
    fn from(date: NaiveDate) -> Self {
        DateApplied::On(date)
    }
}

impl Serialize for DateApplied {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateApplied::On(date) => date.serialize(serializer),
            DateApplied::Unparsed(raw) => raw.serialize(serializer),
        }
    }
}

/// Text column as stored. Numbers are kept in their JSON spelling, which covers
/// PostgREST tables with integer ids.
fn text_from_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_text_from_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(text_from_value(other)),
    }
}

/// A tracked internship application in canonical shape.
///
/// Keys match the store's columns except `dateApplied`, which the store spells
/// `dateapplied`; `user_id` and `created_at` keep the store spelling. Columns this
/// service does not know about are kept in `extra`.
///
/// Reading a record never fails. Missing or mistyped fields fall back to empty
/// text, the default platform and status, or an unparsed date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner_id: String,
    pub company: String,
    pub role: String,
    pub platform: Platform,
    pub status: Status,
    #[serde(rename = "dateApplied")]
    pub date_applied: DateApplied,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ApplicationRecord {
    fn from(mut row: Map<String, Value>) -> Self {
        let mut take = |key: &str| row.remove(key).unwrap_or(Value::Null);

        let id = text_from_value(take("id"));
        let owner_id = text_from_value(take("user_id"));
        let company = text_from_value(take("company"));
        let role = text_from_value(take("role"));
        let platform = Platform::from_value(take("platform"));
        let status = Status::from_value(take("status"));
        let date_applied = DateApplied::from_value(take("dateApplied"));
        let location = optional_text_from_value(take("location"));
        let notes = optional_text_from_value(take("notes"));
        let created_at = text_from_value(take("created_at"));

        Self {
            id,
            owner_id,
            company,
            role,
            platform,
            status,
            date_applied,
            location,
            notes,
            created_at,
            extra: row,
        }
    }
}

impl<'de> Deserialize<'de> for ApplicationRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from)
    }
}

impl ApplicationRecord {
    /// Case-insensitive substring match against company or role.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.company.to_lowercase().contains(&term)
            || self.role.to_lowercase().contains(&term)
    }
}

/// Candidate for a new application, as submitted by the form layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationInput {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub status: Status,
    #[serde(
        rename = "dateApplied",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_applied: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApplicationInput {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("company", &self.company)?;
        require_text("role", &self.role)?;
        require_listed(&self.platform)?;
        require_canonical(&self.status)
    }

    /// Fill in the application date when the caller left it unset.
    pub fn with_defaults(mut self, today: NaiveDate) -> Self {
        self.date_applied.get_or_insert(today);
        self
    }
}

/// Partial update of an application. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        rename = "dateApplied",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_applied: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApplicationPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(company) = &self.company {
            require_text("company", company)?;
        }
        if let Some(role) = &self.role {
            require_text("role", role)?;
        }
        if let Some(platform) = &self.platform {
            require_listed(platform)?;
        }
        if let Some(status) = &self.status {
            require_canonical(status)?;
        }
        Ok(())
    }

    /// Shallow overlay of the set fields onto `record`.
    pub fn apply_to(&self, record: &mut ApplicationRecord) {
        if let Some(company) = &self.company {
            record.company = company.clone();
        }
        if let Some(role) = &self.role {
            record.role = role.clone();
        }
        if let Some(platform) = &self.platform {
            record.platform = platform.clone();
        }
        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(date) = self.date_applied {
            record.date_applied = DateApplied::On(date);
        }
        if let Some(location) = &self.location {
            record.location = Some(location.clone());
        }
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

fn require_listed(platform: &Platform) -> Result<(), String> {
    if platform.is_listed() {
        Ok(())
    } else {
        Err(format!("unknown platform: {}", platform.as_str()))
    }
}

fn require_canonical(status: &Status) -> Result<(), String> {
    if status.is_canonical() {
        Ok(())
    } else {
        Err(format!("unknown status: {}", status.as_str()))
    }
}
