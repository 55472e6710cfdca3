//! Configuration for turn processing.

/// Limits and prompts used by the pipeline and the turn loop.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Deepest allowed nesting of do-first sub-actions.
    pub max_action_depth: u32,

    /// Longest allowed chain of do-instead substitutions in one run.
    pub max_redirects: u32,

    /// Input that dumps the world instead of being parsed.
    pub dump_command: String,

    /// Prompt for ordinary input.
    pub prompt: String,

    /// Prompt for disambiguation follow-ups.
    pub disambiguation_prompt: String,

    /// Whether `save <path>` and `restore <path>` are recognized.
    pub meta_commands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_action_depth: 16,
            max_redirects: 8,
            dump_command: "dump".to_string(),
            prompt: ">".to_string(),
            disambiguation_prompt: ">>>".to_string(),
            meta_commands: true,
        }
    }
}

impl EngineConfig {
    /// Shallow limits and no meta commands, for tests and scripted play.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_action_depth: 4,
            max_redirects: 2,
            meta_commands: false,
            ..Self::default()
        }
    }

    /// Builder method to set the do-first depth limit.
    #[must_use]
    pub fn with_max_action_depth(mut self, depth: u32) -> Self {
        self.max_action_depth = depth;
        self
    }

    /// Builder method to set the redirect limit.
    #[must_use]
    pub fn with_max_redirects(mut self, redirects: u32) -> Self {
        self.max_redirects = redirects;
        self
    }

    /// Builder method to set the dump command.
    #[must_use]
    pub fn with_dump_command(mut self, command: impl Into<String>) -> Self {
        self.dump_command = command.into();
        self
    }

    /// Builder method to set the main prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Builder method to set the disambiguation prompt.
    #[must_use]
    pub fn with_disambiguation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.disambiguation_prompt = prompt.into();
        self
    }

    /// Builder method to enable or disable save/restore commands.
    #[must_use]
    pub fn with_meta_commands(mut self, enabled: bool) -> Self {
        self.meta_commands = enabled;
        self
    }
}
