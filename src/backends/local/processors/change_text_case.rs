// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use super::input_text;
use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Which case conversion to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Upper,
    Lower,
    /// First letter of each word capitalized
    Proper,
    /// Like proper, but short articles and prepositions stay lowercase after the first word
    Title,
}

const TITLE_SMALL_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Change Text Case processor - converts text to different cases
pub struct ChangeTextCaseProcessor {
    case: TextCase,
}

impl ChangeTextCaseProcessor {
    pub fn new(case: TextCase) -> Self {
        Self { case }
    }

    pub fn upper() -> Self {
        Self::new(TextCase::Upper)
    }

    pub fn lower() -> Self {
        Self::new(TextCase::Lower)
    }

    pub fn proper() -> Self {
        Self::new(TextCase::Proper)
    }

    pub fn title() -> Self {
        Self::new(TextCase::Title)
    }

    pub fn case(&self) -> TextCase {
        self.case
    }

    fn convert(&self, input: &str) -> String {
        match self.case {
            TextCase::Upper => input.to_uppercase(),
            TextCase::Lower => input.to_lowercase(),
            TextCase::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            TextCase::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower = word.to_lowercase();
                    if i > 0 && TITLE_SMALL_WORDS.contains(&lower.as_str()) {
                        lower
                    } else {
                        capitalize(word)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

#[async_trait]
impl Processor for ChangeTextCaseProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        let input = input_text(&req)?;
        Ok(Some(self.convert(&input)))
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}
