use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use thiserror::Error;

static PACK_DIR: Dir = include_dir!("src/packs");

/// One question/answer pair served to the player. Pack text is plain,
/// already free of markup or entity escaping.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("question pack `{0}` not found")]
    PackNotFound(String),
    #[error("malformed question pack: {0}")]
    Malformed(String),
    #[error("question source unavailable: {0}")]
    Unavailable(String),
}

/// Where a session gets its questions from. Fetch failures and empty results
/// both send the session back to the start screen.
pub trait PromptSource {
    fn fetch_prompts(&self) -> Result<Vec<Prompt>, PromptError>;
}

/// Question packs embedded in the binary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum QuestionPack {
    General,
    Science,
    History,
}

impl QuestionPack {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "general" => Some(Self::General),
            "science" => Some(Self::Science),
            "history" => Some(Self::History),
            _ => None,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.to_string().to_lowercase())
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Debug)]
struct PackFile {
    name: String,
    questions: Vec<Prompt>,
}

fn read_pack(pack: QuestionPack) -> Result<PackFile, PromptError> {
    let file = PACK_DIR
        .get_file(pack.file_name())
        .ok_or_else(|| PromptError::PackNotFound(pack.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| PromptError::Malformed(format!("pack `{pack}` is not valid utf-8")))?;

    from_str(contents).map_err(|e| PromptError::Malformed(e.to_string()))
}

/// Samples a handful of questions from an embedded pack for each session.
#[derive(Debug, Clone)]
pub struct BundledPromptSource {
    pack: QuestionPack,
    count: usize,
}

impl BundledPromptSource {
    pub fn new(pack: QuestionPack, count: usize) -> Self {
        Self { pack, count }
    }
}

impl PromptSource for BundledPromptSource {
    fn fetch_prompts(&self) -> Result<Vec<Prompt>, PromptError> {
        let pack = read_pack(self.pack)?;
        let mut rng = rand::thread_rng();
        Ok(pack
            .questions
            .choose_multiple(&mut rng, self.count)
            .cloned()
            .collect())
    }
}

/// Fixed question list, for tests and scripted runs.
#[derive(Debug, Clone)]
pub struct StaticPromptSource(pub Vec<Prompt>);

impl PromptSource for StaticPromptSource {
    fn fetch_prompts(&self) -> Result<Vec<Prompt>, PromptError> {
        Ok(self.0.clone())
    }
}

/// Always fails; exercises the load-failure path.
#[derive(Debug, Clone, Copy)]
pub struct FailingPromptSource;

impl PromptSource for FailingPromptSource {
    fn fetch_prompts(&self) -> Result<Vec<Prompt>, PromptError> {
        Err(PromptError::Unavailable("question source offline".into()))
    }
}
