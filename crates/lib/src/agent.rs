//! Chat session: discover tools, ask the model, optionally run one tool, ask again for a summary.
//!
//! Per user turn: ask the model; if the reply parses as a tool invocation, run it (or explain that the
//! tool does not exist), send the result back as a system entry and record the follow-up reply.
//! Tool problems become conversation text; only provider startup and completion failures are errors.

use std::io::{BufRead, Write};

use crate::llm::{CompletionBackend, LlmError};
use crate::prompt::system_prompt;
use crate::tools::{parse_reply, ParsedReply, ToolCallError, ToolDescriptor, ToolProvider, ToolValue};
use crate::transcript::{RetentionPolicy, Role, Transcript, TranscriptEntry};

/// Line that ends the interactive session (case-insensitive).
pub const EXIT_COMMAND: &str = "/bye";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("tool provider unavailable: {0}")]
    Provider(#[from] ToolCallError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Model identifier sent to the completion endpoint.
    pub model: String,
    pub retention: RetentionPolicy,
}

/// What happened when a model reply was checked for a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Not a tool call; the reply is the final answer.
    PlainText(String),
    /// Well-formed invocation naming a tool the provider does not expose. The provider was not called.
    UnknownTool(String),
    Executed { name: String, value: ToolValue },
    Failed { name: String, error: ToolCallError },
}

impl ToolOutcome {
    /// Text for the conversation: the reply itself, or a description of the tool step.
    pub fn text(&self) -> String {
        match self {
            ToolOutcome::PlainText(reply) => reply.clone(),
            ToolOutcome::UnknownTool(name) => format!("No tool found with name: {}", name),
            ToolOutcome::Executed { value, .. } => format!("Tool execution result: {}", value),
            ToolOutcome::Failed { error, .. } => format!("Error executing tool: {}", error),
        }
    }

    pub fn is_tool_path(&self) -> bool {
        !matches!(self, ToolOutcome::PlainText(_))
    }
}

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    /// First model reply (tool JSON on the tool path).
    pub raw: String,
    pub outcome: ToolOutcome,
    /// Reply shown to the user: the follow-up on the tool path, otherwise `raw`.
    pub final_reply: String,
}

pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// One conversation with a completion backend and a tool provider. Owns the transcript.
pub struct ChatSession<B, P> {
    backend: B,
    provider: P,
    model: String,
    retention: RetentionPolicy,
    tools: Vec<ToolDescriptor>,
    transcript: Transcript,
}

impl<B: CompletionBackend, P: ToolProvider> ChatSession<B, P> {
    /// Discover the provider's tools and seed the transcript with the system prompt.
    pub async fn connect(backend: B, provider: P, options: SessionOptions) -> Result<Self, SessionError> {
        let tools = provider.list_tools().await?;
        log::info!(
            "agent: discovered tools: {:?}",
            tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
        let model = options.model.trim().to_string();
        if model.is_empty() {
            log::warn!("agent: configured model was empty");
        }
        let mut transcript = Transcript::new();
        transcript.push(TranscriptEntry::system(system_prompt(&tools)));
        Ok(Self {
            backend,
            provider,
            model,
            retention: options.retention,
            tools,
            transcript,
        })
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Give back the backend and provider (e.g. to shut the provider down).
    pub fn into_parts(self) -> (B, P) {
        (self.backend, self.provider)
    }

    /// Append `text` with `role`, send the whole transcript, return the raw reply. The reply is not recorded.
    pub async fn ask(&mut self, text: &str, role: Role) -> Result<String, LlmError> {
        self.transcript.push(TranscriptEntry::new(role, text));
        log::debug!(
            "agent: asking {} with {} entries",
            self.model,
            self.transcript.len()
        );
        self.backend
            .complete(&self.model, self.transcript.entries())
            .await
    }

    /// Run the tool named by `reply`, if it is a valid invocation of a discovered tool.
    pub async fn try_execute_tool(&self, reply: &str) -> ToolOutcome {
        let invocation = match parse_reply(reply) {
            ParsedReply::PlainText => return ToolOutcome::PlainText(reply.to_string()),
            ParsedReply::Invocation(inv) => inv,
        };
        if !self.tools.iter().any(|t| t.name == invocation.name) {
            log::warn!("agent: model requested unknown tool {}", invocation.name);
            return ToolOutcome::UnknownTool(invocation.name);
        }
        log::info!("agent: executing tool {}", invocation.name);
        match self
            .provider
            .call_tool(&invocation.name, invocation.arguments)
            .await
        {
            Ok(value) => ToolOutcome::Executed {
                name: invocation.name,
                value,
            },
            Err(error) => {
                log::warn!("agent: tool {} failed: {}", invocation.name, error);
                ToolOutcome::Failed {
                    name: invocation.name,
                    error,
                }
            }
        }
    }

    /// One user turn. Records one assistant entry on the direct path, one or two on the tool path
    /// depending on the retention policy.
    pub async fn turn(&mut self, input: &str) -> Result<TurnReply, LlmError> {
        let (raw, outcome) = self.ask_and_dispatch(input).await?;
        let final_reply = if outcome.is_tool_path() {
            self.follow_up(&outcome).await?
        } else {
            raw.clone()
        };
        Ok(TurnReply {
            raw,
            outcome,
            final_reply,
        })
    }

    /// First half of a turn: ask with the user's text and run the tool the reply names, if any.
    async fn ask_and_dispatch(&mut self, input: &str) -> Result<(String, ToolOutcome), LlmError> {
        let raw = self.ask(input, Role::User).await?;
        let outcome = self.try_execute_tool(&raw).await;
        if !outcome.is_tool_path() || self.retention == RetentionPolicy::KeepToolRequest {
            self.transcript.push(TranscriptEntry::assistant(raw.clone()));
        }
        Ok((raw, outcome))
    }

    /// Second half of a tool turn: report the outcome as a system entry and record the reply.
    async fn follow_up(&mut self, outcome: &ToolOutcome) -> Result<String, LlmError> {
        let reply = self.ask(&outcome.text(), Role::System).await?;
        self.transcript.push(TranscriptEntry::assistant(reply.clone()));
        Ok(reply)
    }

    /// Interactive loop: read lines until `/bye` or end of input. A completion failure ends the session.
    /// Each step of a turn is printed as soon as it is known.
    pub async fn run_session<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), SessionError> {
        writeln!(output, "Type {} to quit.", EXIT_COMMAND)?;
        loop {
            write!(output, ">>> ")?;
            output.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let prompt = line.trim();
            if prompt.is_empty() {
                continue;
            }
            if is_exit_command(prompt) {
                break;
            }

            let (raw, outcome) = self.ask_and_dispatch(prompt).await?;
            writeln!(output, "{}", raw.trim())?;
            if !outcome.is_tool_path() {
                continue;
            }
            if let ToolOutcome::Executed { value, .. } = &outcome {
                if let Some(progress) = value.progress_line() {
                    writeln!(output, "{}", progress)?;
                }
            }
            writeln!(output, "[tool] {}", outcome.text())?;
            output.flush()?;
            let final_reply = self.follow_up(&outcome).await?;
            writeln!(output, "{}", final_reply.trim())?;
        }
        Ok(())
    }
}
