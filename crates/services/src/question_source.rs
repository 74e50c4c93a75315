use std::env;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Url};
use serde::Deserialize;

use quiz_core::entities::decode;
use quiz_core::model::{Question, QuestionId};

use crate::error::QuestionSourceError;

pub const DEFAULT_ENDPOINT: &str = "https://opentdb.com/api.php";

/// Question format requested from the bank (`type` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionKind {
    #[default]
    Multiple,
    Boolean,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multiple => "multiple",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQuestionKindError(String);

impl fmt::Display for ParseQuestionKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown question type: {}", self.0)
    }
}

impl std::error::Error for ParseQuestionKindError {}

impl FromStr for QuestionKind {
    type Err = ParseQuestionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiple" => Ok(Self::Multiple),
            "boolean" => Ok(Self::Boolean),
            _ => Err(ParseQuestionKindError(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct QuestionSourceConfig {
    pub endpoint: Url,
}

impl QuestionSourceConfig {
    /// Build a config for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::InvalidEndpoint` if `endpoint` is not an absolute URL.
    pub fn new(endpoint: &str) -> Result<Self, QuestionSourceError> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|err| QuestionSourceError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        Ok(Self { endpoint })
    }

    /// Read `QUIZ_API_URL`, falling back to the public Open Trivia DB endpoint.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::InvalidEndpoint` if the variable is not a URL.
    pub fn from_env() -> Result<Self, QuestionSourceError> {
        let endpoint = env::var("QUIZ_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into());
        Self::new(&endpoint)
    }
}

/// Supplier of question sets for a quiz.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch `amount` questions of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` on transport, status or decoding failures.
    async fn fetch_questions(
        &self,
        amount: u32,
        kind: QuestionKind,
    ) -> Result<Vec<Question>, QuestionSourceError>;
}

/// Best-effort fetch: any failure is logged and reported as an empty set.
pub async fn fetch_or_empty(
    source: &dyn QuestionSource,
    amount: u32,
    kind: QuestionKind,
) -> Vec<Question> {
    match source.fetch_questions(amount, kind).await {
        Ok(questions) => questions,
        Err(err) => {
            log::error!("failed to fetch quiz questions: {err}");
            Vec::new()
        }
    }
}

/// HTTP client for the Open Trivia DB `api.php` endpoint.
#[derive(Clone)]
pub struct OpenTdbSource {
    client: Client,
    config: QuestionSourceConfig,
}

impl OpenTdbSource {
    #[must_use]
    pub fn new(config: QuestionSourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }
}

#[async_trait]
impl QuestionSource for OpenTdbSource {
    async fn fetch_questions(
        &self,
        amount: u32,
        kind: QuestionKind,
    ) -> Result<Vec<Question>, QuestionSourceError> {
        let response = self
            .client
            .get(self.config.endpoint.clone())
            .query(&[("amount", amount.to_string()), ("type", kind.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuestionSourceError::HttpStatus(response.status()));
        }

        let body: TriviaResponse = response.json().await?;
        if let Some(code) = body.response_code.filter(|code| *code != 0) {
            log::warn!("question bank answered with response_code {code}");
        }

        let mut rng = rand::rng();
        Ok(normalize_results(body.results, &mut rng))
    }
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    #[serde(default)]
    response_code: Option<u32>,
    results: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawQuestion {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

/// Decode entities, shuffle the choices and assign ids by position.
///
/// Results that do not form a valid question are skipped.
pub(crate) fn normalize_results(raw: Vec<RawQuestion>, rng: &mut impl Rng) -> Vec<Question> {
    let mut questions = Vec::with_capacity(raw.len());
    for (index, item) in raw.into_iter().enumerate() {
        let prompt = decode(&item.question);
        let correct = decode(&item.correct_answer);
        let mut choices: Vec<String> = item
            .incorrect_answers
            .iter()
            .map(|answer| decode(answer))
            .collect();
        choices.push(correct.clone());
        shuffle(&mut choices, rng);

        match Question::new(QuestionId::new(index as u64), prompt, correct, choices) {
            Ok(question) => questions.push(question),
            Err(err) => log::warn!("skipping question {index}: {err}"),
        }
    }
    questions
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
