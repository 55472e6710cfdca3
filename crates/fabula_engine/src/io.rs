//! The I/O sink contract and an in-memory implementation.

use std::collections::VecDeque;

/// Where narration goes and where input comes from.
pub trait Io {
    /// Writes fragments as one line, separated by spaces.
    fn write(&mut self, fragments: &[&str]);

    /// Blocks for one line of input. `None` means input has ended.
    fn get_input(&mut self, prompt: Option<&str>) -> Option<String>;
}

/// Scripted input and captured output.
#[derive(Clone, Debug, Default)]
pub struct ScriptedIo {
    inputs: VecDeque<String>,
    output: Vec<String>,
    echo: bool,
}

impl ScriptedIo {
    /// Creates a sink that will answer input requests from `inputs`.
    #[must_use]
    pub fn new<S: Into<String>>(inputs: impl IntoIterator<Item = S>) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: Vec::new(),
            echo: false,
        }
    }

    /// Also records each consumed input line, prefixed with its prompt.
    #[must_use]
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Queues another input line.
    pub fn push_input(&mut self, line: impl Into<String>) {
        self.inputs.push_back(line.into());
    }

    /// Lines written so far.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Everything written so far, one line per write.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.output.join("\n")
    }

    /// Drains and returns the written lines.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Input lines not yet consumed.
    #[must_use]
    pub fn remaining_input(&self) -> usize {
        self.inputs.len()
    }
}

impl Io for ScriptedIo {
    fn write(&mut self, fragments: &[&str]) {
        self.output.push(fragments.join(" "));
    }

    fn get_input(&mut self, prompt: Option<&str>) -> Option<String> {
        let line = self.inputs.pop_front()?;
        if self.echo {
            let prompt = prompt.map(|p| format!("{p} ")).unwrap_or_default();
            self.output.push(format!("{prompt}{line}"));
        }
        Some(line)
    }
}
