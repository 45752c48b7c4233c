//! Inbound payloads
//!
//! `RawPayload` mirrors the loose JSON body accepted by the frame image
//! route: every field is optional and numbers may arrive as strings. It is
//! validated exactly once into the strict [`Payload`] enum, and everything
//! downstream (scene building, rendering) trusts that shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{Error, Result};

/// Choice markers, one per supported choice.
pub const CHOICE_MARKERS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Fieldless discriminator of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Question,
    Results,
    Error,
    Info,
    Preview,
    VoteCast,
    AlreadyVoted,
    NotEligible,
    Unknown,
}

impl PayloadKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" => PayloadKind::Question,
            "results" => PayloadKind::Results,
            "error" => PayloadKind::Error,
            "info" => PayloadKind::Info,
            "preview" => PayloadKind::Preview,
            "votecast" | "vote-cast" | "vote_cast" => PayloadKind::VoteCast,
            "alreadyvoted" | "already-voted" | "already_voted" => PayloadKind::AlreadyVoted,
            "noteligible" | "not-eligible" | "not_eligible" => PayloadKind::NotEligible,
            _ => PayloadKind::Unknown,
        }
    }
}

/// A number that may have been sent as a JSON number or a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(u64),
    Text(String),
    /// Negative, fractional or non-scalar values; rejected by `parse`
    Other(serde_json::Value),
}

impl Count {
    fn parse(&self, field: &str) -> Result<u64> {
        match self {
            Count::Number(n) => Ok(*n),
            Count::Text(s) if s.trim().is_empty() => Ok(0),
            Count::Text(s) => s.trim().parse::<u64>().map_err(|_| {
                Error::InvalidPayload(format!("{} is not a non-negative integer: {:?}", field, s))
            }),
            Count::Other(v) => Err(Error::InvalidPayload(format!(
                "{} is not a non-negative integer: {}",
                field, v
            ))),
        }
    }
}

/// Poll end time: a date string or unix seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EndTime {
    Seconds(i64),
    Text(String),
    Other(serde_json::Value),
}

impl EndTime {
    fn parse(&self) -> Result<DateTime<Utc>> {
        match self {
            EndTime::Seconds(secs) => DateTime::from_timestamp(*secs, 0).ok_or_else(|| {
                Error::InvalidPayload(format!("ends is out of range: {}", secs))
            }),
            EndTime::Text(s) => parse_date(s.trim()).ok_or_else(|| {
                Error::InvalidPayload(format!("ends is not a date: {:?}", s))
            }),
            EndTime::Other(v) => Err(Error::InvalidPayload(format!("ends is not a date: {}", v))),
        }
    }
}

/// RFC 3339 timestamps, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Loose request body, as decoded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub question: String,
    #[serde(alias = "choice")]
    pub choices: Vec<String>,
    #[serde(alias = "result")]
    pub results: Vec<Count>,
    pub vote_count: Option<Count>,
    pub turnout: Option<f64>,
    pub participation: Option<f64>,
    pub error: String,
    pub info: Vec<String>,
    pub title: Option<String>,
    pub ends: Option<EndTime>,
    pub ended: bool,
}

impl RawPayload {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Results-view input.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPayload {
    pub question: String,
    pub choices: Vec<String>,
    /// Raw vote counts, same length as `choices` when present
    pub tallies: Option<Vec<u64>>,
    pub vote_count: u64,
    pub turnout: Option<f64>,
    pub participation: Option<f64>,
}

/// Validated payload, one variant per frame image.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Question { question: String, choices: Vec<String> },
    Results(ResultsPayload),
    Error { message: String },
    Info { lines: Vec<String> },
    Preview { title: String, ends_at: DateTime<Utc>, ended: bool },
    VoteCast { title: Option<String> },
    AlreadyVoted { title: Option<String> },
    NotEligible { title: Option<String> },
    Unknown,
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Question { .. } => PayloadKind::Question,
            Payload::Results(_) => PayloadKind::Results,
            Payload::Error { .. } => PayloadKind::Error,
            Payload::Info { .. } => PayloadKind::Info,
            Payload::Preview { .. } => PayloadKind::Preview,
            Payload::VoteCast { .. } => PayloadKind::VoteCast,
            Payload::AlreadyVoted { .. } => PayloadKind::AlreadyVoted,
            Payload::NotEligible { .. } => PayloadKind::NotEligible,
            Payload::Unknown => PayloadKind::Unknown,
        }
    }

    /// Decode and validate a JSON body in one step.
    pub fn from_json(data: &str) -> Result<Self> {
        Payload::try_from(RawPayload::from_json(data)?)
    }
}

fn check_choices(choices: &[String]) -> Result<()> {
    if choices.is_empty() {
        return Err(Error::InvalidPayload("at least one choice is required".into()));
    }
    if choices.len() > CHOICE_MARKERS.len() {
        return Err(Error::InvalidPayload(format!(
            "at most {} choices are supported, got {}",
            CHOICE_MARKERS.len(),
            choices.len()
        )));
    }
    Ok(())
}

fn check_percent(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(Error::InvalidPayload(format!(
            "{} must be within [0, 100], got {}",
            field, v
        ))),
        other => Ok(other),
    }
}

fn non_empty(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}

impl TryFrom<RawPayload> for Payload {
    type Error = Error;

    fn try_from(raw: RawPayload) -> Result<Self> {
        let kind = raw.kind.as_deref().map(PayloadKind::parse).unwrap_or(PayloadKind::Unknown);

        let payload = match kind {
            PayloadKind::Question => {
                check_choices(&raw.choices)?;
                Payload::Question { question: raw.question, choices: raw.choices }
            }
            PayloadKind::Results => {
                check_choices(&raw.choices)?;
                let tallies = if raw.results.is_empty() {
                    None
                } else {
                    if raw.results.len() != raw.choices.len() {
                        return Err(Error::InvalidPayload(format!(
                            "{} results for {} choices",
                            raw.results.len(),
                            raw.choices.len()
                        )));
                    }
                    let parsed = raw
                        .results
                        .iter()
                        .map(|c| c.parse("result"))
                        .collect::<Result<Vec<u64>>>()?;
                    Some(parsed)
                };
                let vote_count = match &raw.vote_count {
                    Some(c) => c.parse("voteCount")?,
                    None => 0,
                };
                Payload::Results(ResultsPayload {
                    question: raw.question,
                    choices: raw.choices,
                    tallies,
                    vote_count,
                    turnout: check_percent("turnout", raw.turnout)?,
                    participation: check_percent("participation", raw.participation)?,
                })
            }
            PayloadKind::Error => Payload::Error { message: raw.error },
            PayloadKind::Info => Payload::Info { lines: raw.info },
            PayloadKind::Preview => {
                let ends_at = raw
                    .ends
                    .as_ref()
                    .ok_or_else(|| Error::InvalidPayload("preview requires `ends`".into()))?
                    .parse()?;
                let title = non_empty(raw.title).unwrap_or(raw.question);
                Payload::Preview { title, ends_at, ended: raw.ended }
            }
            PayloadKind::VoteCast => Payload::VoteCast { title: non_empty(raw.title) },
            PayloadKind::AlreadyVoted => Payload::AlreadyVoted { title: non_empty(raw.title) },
            PayloadKind::NotEligible => Payload::NotEligible { title: non_empty(raw.title) },
            PayloadKind::Unknown => Payload::Unknown,
        };

        Ok(payload)
    }
}
