//! Line-oriented input from the terminal.

use anyhow::anyhow;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Reads answers from stdin, writing prompts to stderr.
#[derive(Debug)]
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Shows `label` and reads one trimmed line. Returns `None` at end of input.
    pub async fn line(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(label.as_bytes()).await?;
        stderr.flush().await?;

        let line = self.lines.next_line().await?;
        Ok(line.map(|line| line.trim().to_owned()))
    }

    /// Like [`Prompt::line`], but end of input is an error.
    pub async fn required(&mut self, label: &str) -> anyhow::Result<String> {
        self.line(label)
            .await?
            .ok_or_else(|| anyhow!("stdin closed before an answer was given"))
    }
}
