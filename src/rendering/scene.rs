//! Scene tree and the builder that composes it from a validated payload.
//!
//! Building a scene is pure: no I/O, no asset lookups. Fonts and emoji are
//! resolved later by the renderer through the asset loader it is handed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{Payload, ResultsPayload, CHOICE_MARKERS};
use crate::rendering::fit::{text_length, SizeEnvelope};
use crate::rendering::tally::{transform, BarSpec};
use crate::{Error, RenderConfig, Result};

pub const NO_RESULTS_TEXT: &str = "No results yet 😢";
pub const FOOTER_TEXT: &str = "Votes secured with";
pub const FOOTER_BRAND: &str = "Vocdoni Protocol";
pub const UNKNOWN_KIND_TEXT: &str = "You forgot to specify the type, or specified an invalid one";
pub const INFO_HEADING: &str = "Vocdoni secured poll";

// Fixed sizes for cards whose text is not fitted.
const HEADING_SIZE: u32 = 60;
const LARGE_SIZE: u32 = 72;
const BODY_SIZE: u32 = 48;
const NOTICE_SIZE: u32 = 36;

/// Envelope presets, one per independently sized region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeTable {
    /// Question title, sized as a single block of text
    pub question_title: SizeEnvelope,
    /// Choice labels, sized by the total length of all labels
    pub choice_list: SizeEnvelope,
    /// Results title keyed by number of choices
    pub results_title: BTreeMap<usize, SizeEnvelope>,
    /// Results title for choice counts missing from `results_title`
    pub results_title_default: SizeEnvelope,
}

impl Default for EnvelopeTable {
    fn default() -> Self {
        let mut results_title = BTreeMap::new();
        results_title.insert(2, SizeEnvelope { min_size: 28.0, max_size: 52.0, max_length: 200 });
        results_title.insert(3, SizeEnvelope { min_size: 24.0, max_size: 44.0, max_length: 200 });
        results_title.insert(4, SizeEnvelope { min_size: 20.0, max_size: 36.0, max_length: 200 });
        Self {
            question_title: SizeEnvelope { min_size: 32.0, max_size: 56.0, max_length: 250 },
            choice_list: SizeEnvelope { min_size: 22.0, max_size: 40.0, max_length: 240 },
            results_title,
            results_title_default: SizeEnvelope { min_size: 20.0, max_size: 32.0, max_length: 200 },
        }
    }
}

impl EnvelopeTable {
    pub fn results_title_for(&self, choice_count: usize) -> &SizeEnvelope {
        self.results_title
            .get(&choice_count)
            .unwrap_or(&self.results_title_default)
    }

    pub fn validate(&self) -> Result<()> {
        self.question_title.validate()?;
        self.choice_list.validate()?;
        self.results_title_default.validate()?;
        for (count, env) in &self.results_title {
            env.validate()
                .map_err(|e| Error::ConfigError(format!("results_title[{}]: {}", count, e)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Column,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Normal,
    Bold,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Default,
    Positive,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Gradient,
    Picture { asset: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceItem {
    pub marker: char,
    pub label: String,
}

/// A typed layout node. Nodes own their children; there are no back-references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneNode {
    Stack {
        axis: Axis,
        children: Vec<SceneNode>,
    },
    Text {
        text: String,
        size: u32,
        weight: Weight,
        tone: Tone,
    },
    List {
        size: u32,
        items: Vec<ChoiceItem>,
    },
    BarRow {
        marker: char,
        label: String,
        percent: f64,
        size: u32,
        bar: BarSpec,
    },
    Stat {
        caption: String,
        value: String,
        detail: Option<String>,
    },
    Badge {
        text: String,
        tone: Tone,
    },
    NoResults {
        text: String,
    },
    Footer {
        text: String,
        brand: String,
    },
}

impl SceneNode {
    fn text(text: impl Into<String>, size: u32, weight: Weight) -> Self {
        SceneNode::Text { text: text.into(), size, weight, tone: Tone::Default }
    }

    fn column(children: Vec<SceneNode>) -> Self {
        SceneNode::Stack { axis: Axis::Column, children }
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a SceneNode>) {
        out.push(self);
        if let SceneNode::Stack { children, .. } = self {
            for child in children {
                child.walk(out);
            }
        }
    }
}

/// A layout-ready frame image description, consumed once by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub root: SceneNode,
}

impl Scene {
    pub fn nodes(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        self.root.walk(&mut out);
        out
    }

    pub fn bar_rows(&self) -> Vec<&SceneNode> {
        self.nodes()
            .into_iter()
            .filter(|n| matches!(n, SceneNode::BarRow { .. }))
            .collect()
    }

    pub fn has_no_results(&self) -> bool {
        self.nodes().iter().any(|n| matches!(n, SceneNode::NoResults { .. }))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format a value with at most `places` decimals, dropping trailing zeros.
pub fn format_decimal(value: f64, places: usize) -> String {
    let s = format!("{:.*}", places, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn truncate_two_places(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

fn marker(i: usize) -> char {
    CHOICE_MARKERS.get(i).copied().unwrap_or('?')
}

/// Composes fitted text and tally charts into scenes.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    envelopes: EnvelopeTable,
    bar_steps: u32,
    width: u32,
    height: u32,
    now: DateTime<Utc>,
}

impl SceneBuilder {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            envelopes: config.envelopes.clone(),
            bar_steps: config.bar_steps,
            width: config.width,
            height: config.height,
            now: Utc::now(),
        }
    }

    /// Pin the clock used for preview countdowns.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn envelopes(&self) -> &EnvelopeTable {
        &self.envelopes
    }

    /// Build the scene for any payload kind.
    pub fn build(&self, payload: &Payload) -> Scene {
        match payload {
            Payload::Question { question, choices } => self.question(question, choices),
            Payload::Results(results) => self.results(results),
            Payload::Error { message } => self.error(message),
            Payload::Info { lines } => self.info(lines),
            Payload::Preview { title, ends_at, ended } => self.preview(title, *ends_at, *ended),
            Payload::VoteCast { title } => self.status(
                "images/success.png",
                title.as_deref().unwrap_or("Your vote has been cast!"),
            ),
            Payload::AlreadyVoted { title } => self.status(
                "images/alreadyvoted.png",
                title.as_deref().unwrap_or("You already voted!"),
            ),
            Payload::NotEligible { title } => self.status(
                "images/noteligible.png",
                title.as_deref().unwrap_or("Sorry, you're not eligible to vote"),
            ),
            Payload::Unknown => self.frame(
                Background::Gradient,
                vec![SceneNode::text(UNKNOWN_KIND_TEXT, NOTICE_SIZE, Weight::Normal)],
            ),
        }
    }

    /// Question view: fitted title over the lettered choice list.
    pub fn question(&self, question: &str, choices: &[String]) -> Scene {
        let title_size = self.envelopes.question_title.fit(text_length(question));
        let total: usize = choices.iter().map(|c| text_length(c)).sum();
        let list_size = self.envelopes.choice_list.fit(total);

        let items = choices
            .iter()
            .enumerate()
            .map(|(i, label)| ChoiceItem { marker: marker(i), label: label.clone() })
            .collect();

        self.frame(
            Background::Gradient,
            vec![
                SceneNode::text(question, title_size, Weight::Bold),
                SceneNode::List { size: list_size, items },
            ],
        )
    }

    /// Results view: title sized by choice count, participation stats, and
    /// either one bar row per choice or the "no results yet" notice.
    pub fn results(&self, results: &ResultsPayload) -> Scene {
        let count = results.choices.len();
        let title_size = self.envelopes.results_title_for(count).fit(text_length(&results.question));

        let tallies = results.tallies.as_deref().unwrap_or(&[]);
        let summary = transform(tallies);

        let mut header = vec![SceneNode::text(&results.question, title_size, Weight::Bold)];
        if let Some(stats) = participation(results, summary.weight) {
            header.push(stats);
        }

        let body = if summary.has_results() {
            let total: usize = results.choices.iter().map(|c| text_length(c)).sum();
            let size = self.envelopes.choice_list.fit(total);
            let rows = results
                .choices
                .iter()
                .zip(&summary.percentages)
                .enumerate()
                .map(|(i, (label, percent))| SceneNode::BarRow {
                    marker: marker(i),
                    label: format!("{}%: {}", format_decimal(*percent, 1), label),
                    percent: *percent,
                    size,
                    bar: BarSpec::new(*percent, self.bar_steps),
                })
                .collect();
            SceneNode::column(rows)
        } else {
            SceneNode::NoResults { text: NO_RESULTS_TEXT.to_string() }
        };

        self.frame(Background::Gradient, vec![SceneNode::column(header), body])
    }

    fn error(&self, message: &str) -> Scene {
        self.frame(
            Background::Picture { asset: "images/error.png".into() },
            vec![SceneNode::Text {
                text: message.to_string(),
                size: NOTICE_SIZE,
                weight: Weight::Normal,
                tone: Tone::Danger,
            }],
        )
    }

    fn info(&self, lines: &[String]) -> Scene {
        let mut children = vec![SceneNode::text(INFO_HEADING, HEADING_SIZE, Weight::Normal)];
        children.extend(lines.iter().map(|l| SceneNode::text(l, BODY_SIZE, Weight::Normal)));
        self.frame(Background::Gradient, children)
    }

    fn preview(&self, title: &str, ends_at: DateTime<Utc>, ended: bool) -> Scene {
        let badge = if ended {
            let hours = (self.now - ends_at).num_hours().max(0);
            SceneNode::Badge { text: format!("Ended {}h ago", hours), tone: Tone::Danger }
        } else {
            let hours = (ends_at - self.now).num_hours().max(0);
            SceneNode::Badge { text: format!("Ends in {}h", hours), tone: Tone::Positive }
        };
        self.frame(
            Background::Gradient,
            vec![SceneNode::text(title, BODY_SIZE, Weight::Black), badge],
        )
    }

    fn status(&self, picture: &str, heading: &str) -> Scene {
        let size = if heading.chars().count() > 40 { HEADING_SIZE } else { LARGE_SIZE };
        self.frame(
            Background::Picture { asset: picture.to_string() },
            vec![SceneNode::text(heading, size, Weight::Bold)],
        )
    }

    fn frame(&self, background: Background, mut children: Vec<SceneNode>) -> Scene {
        children.push(SceneNode::Footer {
            text: FOOTER_TEXT.to_string(),
            brand: FOOTER_BRAND.to_string(),
        });
        Scene {
            width: self.width,
            height: self.height,
            background,
            root: SceneNode::column(children),
        }
    }
}

fn participation(results: &ResultsPayload, weight: u64) -> Option<SceneNode> {
    let participation = results.participation.filter(|p| *p > 0.0);
    let turnout = results.turnout.filter(|t| *t > 0.0);
    if results.vote_count == 0 && participation.is_none() && turnout.is_none() {
        return None;
    }

    let votes = SceneNode::Stat {
        caption: "Votes".into(),
        value: results.vote_count.to_string(),
        detail: participation.map(|p| format!("({}%)", format_decimal(truncate_two_places(p), 2))),
    };
    let weight = SceneNode::Stat {
        caption: "Weight".into(),
        value: weight.to_string(),
        detail: turnout.map(|t| format!("({}%)", format_decimal(truncate_two_places(t), 2))),
    };

    Some(SceneNode::Stack { axis: Axis::Row, children: vec![votes, weight] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn builder() -> SceneBuilder {
        SceneBuilder::new(&RenderConfig::default()).at(now())
    }

    fn badge(scene: &Scene) -> Option<String> {
        scene.nodes().into_iter().find_map(|n| match n {
            SceneNode::Badge { text, .. } => Some(text.clone()),
            _ => None,
        })
    }

    fn results(tallies: Option<Vec<u64>>) -> ResultsPayload {
        ResultsPayload {
            question: "Best colour?".into(),
            choices: vec!["Red".into(), "Blue".into()],
            tallies,
            vote_count: 0,
            turnout: None,
            participation: None,
        }
    }

    #[test]
    fn results_rows_carry_percent_and_bar() {
        let scene = builder().results(&results(Some(vec![3, 1])));
        let rows = scene.bar_rows();
        assert_eq!(rows.len(), 2);
        match rows[0] {
            SceneNode::BarRow { marker, label, percent, bar, .. } => {
                assert_eq!(*marker, 'A');
                assert_eq!(label, "75%: Red");
                assert_eq!(*percent, 75.0);
                assert_eq!(bar.total_steps, 20);
                assert_eq!(bar.filled_count(), 15);
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert!(!scene.has_no_results());
    }

    #[test]
    fn zero_weight_renders_notice_instead_of_chart() {
        let scene = builder().results(&results(Some(vec![0, 0])));
        assert!(scene.has_no_results());
        assert!(scene.bar_rows().is_empty());

        let scene = builder().results(&results(None));
        assert!(scene.has_no_results());
    }

    #[test]
    fn results_title_shrinks_with_choice_count() {
        let b = builder();
        let question = "x".repeat(120);
        let sizes: Vec<u32> = (2..=4)
            .map(|n| b.envelopes().results_title_for(n).fit(question.len()))
            .collect();
        assert!(sizes[0] > sizes[1] && sizes[1] > sizes[2], "{:?}", sizes);
        assert_eq!(b.envelopes().results_title_for(7), &b.envelopes().results_title_default);
    }

    #[test]
    fn participation_stats_truncate_to_two_places() {
        let mut r = results(Some(vec![1, 1]));
        r.vote_count = 2;
        r.participation = Some(12.3456);
        r.turnout = Some(50.0);
        let scene = builder().results(&r);
        let stats: Vec<_> = scene
            .nodes()
            .into_iter()
            .filter_map(|n| match n {
                SceneNode::Stat { caption, value, detail } => Some((caption.clone(), value.clone(), detail.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            stats,
            vec![
                ("Votes".to_string(), "2".to_string(), Some("(12.34%)".to_string())),
                ("Weight".to_string(), "2".to_string(), Some("(50%)".to_string())),
            ]
        );
    }

    #[test]
    fn no_participation_block_without_data() {
        let scene = builder().results(&results(Some(vec![1, 0])));
        assert!(!scene.nodes().iter().any(|n| matches!(n, SceneNode::Stat { .. })));
    }

    #[test]
    fn question_scene_letters_choices() {
        let scene = builder().question("Lunch?", &["Pizza".to_string(), "Sushi".to_string()]);
        let list = scene
            .nodes()
            .into_iter()
            .find_map(|n| match n {
                SceneNode::List { items, size } => Some((items.clone(), *size)),
                _ => None,
            })
            .expect("choice list");
        assert_eq!(list.0.iter().map(|i| i.marker).collect::<String>(), "AB");
        assert_eq!(list.1, builder().envelopes().choice_list.fit(10));
    }

    #[test]
    fn every_scene_has_footer() {
        let b = builder();
        for payload in [
            Payload::Unknown,
            Payload::Error { message: "boom".into() },
            Payload::Info { lines: vec!["a".into()] },
            Payload::VoteCast { title: None },
        ] {
            let scene = b.build(&payload);
            assert!(matches!(scene.nodes().last(), Some(SceneNode::Footer { .. })));
        }
    }

    #[test]
    fn preview_counts_whole_hours() {
        let b = builder();
        let ends_at = now() + Duration::hours(5) + Duration::minutes(59);
        let open = b.build(&Payload::Preview { title: "T".into(), ends_at, ended: false });
        assert_eq!(badge(&open).as_deref(), Some("Ends in 5h"));

        let ends_at = now() - Duration::hours(2) - Duration::seconds(30);
        let closed = b.build(&Payload::Preview { title: "T".into(), ends_at, ended: true });
        assert_eq!(badge(&closed).as_deref(), Some("Ended 2h ago"));
    }

    #[test]
    fn preview_from_date_string_payload() {
        let payload =
            Payload::from_json(r#"{"type":"preview","title":"T","ends":"2024-05-02T00:00:00Z"}"#).unwrap();
        assert_eq!(badge(&builder().build(&payload)).as_deref(), Some("Ends in 12h"));

        let payload = Payload::from_json(
            r#"{"type":"preview","title":"T","ends":"2024-04-30T12:00:00+00:00","ended":true}"#,
        )
        .unwrap();
        assert_eq!(badge(&builder().build(&payload)).as_deref(), Some("Ended 24h ago"));
    }

    #[test]
    fn preview_on_the_wrong_side_of_now_clamps_to_zero() {
        let ends_at = now() - Duration::hours(3);
        let scene = builder().build(&Payload::Preview { title: "T".into(), ends_at, ended: false });
        assert_eq!(badge(&scene).as_deref(), Some("Ends in 0h"));
    }

    #[test]
    fn status_cards_use_default_titles() {
        let scene = builder().build(&Payload::NotEligible { title: None });
        assert!(matches!(scene.background, Background::Picture { ref asset } if asset == "images/noteligible.png"));
        assert!(scene.nodes().iter().any(
            |n| matches!(n, SceneNode::Text { text, .. } if text == "Sorry, you're not eligible to vote")
        ));
    }

    #[test]
    fn decimals_are_trimmed() {
        assert_eq!(format_decimal(75.0, 1), "75");
        assert_eq!(format_decimal(33.3, 1), "33.3");
        assert_eq!(format_decimal(12.5, 2), "12.5");
        assert_eq!(format_decimal(0.0, 2), "0");
    }

    #[test]
    fn default_envelopes_are_valid() {
        assert!(EnvelopeTable::default().validate().is_ok());
    }
}
