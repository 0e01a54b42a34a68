//! Interactive chat loop around an orchestrator
//!
//! The "model" here is a stand-in that echoes the message back with a few
//! policy-derived hints, so every pipeline step can be exercised without a
//! network call.

use anchorline_core::{FeedbackContext, HumanOption, InterventionPolicy, LabeledOutput, Rating};
use anchorline_session::Orchestrator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Stand-in for a language model
#[derive(Debug, Clone, Default)]
pub struct EchoModel;

impl EchoModel {
    pub fn respond(&self, message: &str, policy: &InterventionPolicy) -> String {
        let mut reply = format!("You said: \"{}\".", message.trim());

        if policy.trigger_reflection {
            reply.push_str(" It might help to pause and reflect on what you want from this conversation.");
        }
        if policy.escalate_to_human {
            reply.push_str(" It sounds like you are going through a lot. Talking to a person could help.");
        }

        reply
    }
}

/// Everything produced for one message
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub policy: InterventionPolicy,
    pub output: LabeledOutput,
    pub human_options: Vec<HumanOption>,
}

/// Run the full pipeline for one user message.
///
/// Labelling or counter-balancing failures degrade to the raw reply.
pub async fn run_turn(orch: &mut Orchestrator, model: &EchoModel, message: &str) -> TurnReport {
    orch.count_prompt();
    let policy = orch.get_interventions(message);

    let reply = model.respond(message, &policy);

    let output = match orch.label_claims(&reply).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Claim labelling failed, using raw reply");
            LabeledOutput::unlabeled(reply)
        }
    };

    let output = match orch.counter_balance_if_needed(output.clone()).await {
        Ok(balanced) => balanced,
        Err(e) => {
            warn!(error = %e, "Counter-balancing failed, skipping");
            output
        }
    };

    let output = orch.apply_cadence_styles(output);

    let human_options = if policy.escalate_to_human {
        orch.human_options()
    } else {
        Vec::new()
    };

    TurnReport {
        policy,
        output,
        human_options,
    }
}

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Message(String),
    Feedback {
        rating: Rating,
        context: FeedbackContext,
        reason: String,
    },
    Reset,
    Stats,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Message(line.to_string());
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        let command = parts.next().unwrap_or_default();

        match command {
            "/up" | "/down" => {
                let rating = if command == "/up" { Rating::Up } else { Rating::Down };
                let mut context = FeedbackContext::General;
                let mut reason = Vec::new();
                for (i, part) in parts.enumerate() {
                    match (i, parse_context(part)) {
                        (0, Some(parsed)) => context = parsed,
                        _ => reason.push(part),
                    }
                }
                Self::Feedback {
                    rating,
                    context,
                    reason: reason.join(" ").trim().to_string(),
                }
            }
            "/reset" => Self::Reset,
            "/stats" => Self::Stats,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

fn parse_context(word: &str) -> Option<FeedbackContext> {
    match word.to_ascii_lowercase().as_str() {
        "cadence" => Some(FeedbackContext::Cadence),
        "stance" => Some(FeedbackContext::Stance),
        "claims" => Some(FeedbackContext::Claims),
        "emotion" => Some(FeedbackContext::Emotion),
        "general" => Some(FeedbackContext::General),
        _ => None,
    }
}

const HELP: &str = "\
Commands:
  /up [cadence|stance|claims|emotion|general] [reason]    thumbs up
  /down [cadence|stance|claims|emotion|general] [reason]  thumbs down
  /reset   start a new session
  /stats   show session and trust-delta state
  /quit    exit
";

/// Read lines from `input` until EOF or `/quit`, writing replies to `output`
pub async fn run_chat<R, W>(orch: &mut Orchestrator, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let model = EchoModel;
    let mut lines = input.lines();

    output.write_all(b"anchorline chat. Type /help for commands.\n").await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = match Input::parse(&line) {
            Input::Message(message) => render_turn(&run_turn(orch, &model, &message).await),
            Input::Feedback {
                rating,
                context,
                reason,
            } => {
                orch.submit_feedback(rating, reason, context);
                format!(
                    "Feedback recorded ({}). Recommended cadence interval: {}\n",
                    context.label(),
                    orch.recommended_cadence_interval()
                )
            }
            Input::Reset => {
                orch.reset_session();
                format!("New session {}\n", orch.session().id)
            }
            Input::Stats => render_stats(orch),
            Input::Help => HELP.to_string(),
            Input::Quit => break,
            Input::Empty => continue,
            Input::Unknown(command) => format!("Unknown command {command}. Type /help.\n"),
        };

        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(())
}

pub fn render_turn(report: &TurnReport) -> String {
    let mut text = format!("\n{}\n", report.output.annotated);

    if !report.human_options.is_empty() {
        text.push_str("\nIf you need someone to talk to:\n");
        for option in &report.human_options {
            text.push_str(&format!("  - {}: {}\n", option.label, option.value));
        }
    }

    text.push('\n');
    text
}

fn render_stats(orch: &Orchestrator) -> String {
    let session = orch.session();
    let trust = orch.trust_delta();
    format!(
        "session {}\n  prompts: {}\n  stance: {:.2}\n  intervention density: {:.2}\n  \
         cadence sensitivity: {:.2}\n  stance sensitivity: {:.2}\n  confidence: {:.2}\n",
        session.id,
        session.prompt_count,
        session.current_stance,
        session.intervention_density(),
        trust.cadence_sensitivity,
        trust.stance_sensitivity,
        trust.confidence,
    )
}
