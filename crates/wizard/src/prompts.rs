//! Terminal prompts for wizard choices.

use anyhow::Result;
use std::io::{self, Write};

/// Seam for user input so the pipeline is testable without a terminal.
pub trait Prompter {
    /// Ask for a line of input; returns the trimmed answer.
    fn line(&mut self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let suffix = if default { "[Y/n]" } else { "[y/N]" };
        let answer = self.line(&format!("{} {}: ", prompt, suffix))?;
        Ok(match answer.to_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}

/// Reads answers from stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn line(&mut self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
pub(crate) struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn line(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("prompt with no scripted answer: {}", prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_default_on_empty() {
        let mut prompter = ScriptedPrompter::new(&["", "n", "yes"]);
        assert!(prompter.confirm("Continue?", true).unwrap());
        assert!(!prompter.confirm("Continue?", true).unwrap());
        assert!(prompter.confirm("Continue?", false).unwrap());
    }
}
