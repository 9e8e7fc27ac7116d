//! Overthinkr CLI: the terminal front end.
//!
//! A thin shim over the library: maps flags to a `Submission`, drives the
//! pipeline once, and renders the session. Icons, colours and clipboard
//! live here; the library only ever hands out reply `type` strings.

use clap::{Parser, Subcommand};
use overthinkr_lib::llm::build_prompt;
use overthinkr_lib::{
    config, AnalysisResult, CanonicalText, Phase, Pipeline, Rejected, ReplyKind, ReplyOption,
    SessionHandle, Settings, Submission,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "overthinkr", version, about = "Decode the subtext. Is that period aggressive or just grammar?")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a message: typed text, "-" for stdin, or --image for a screenshot
    Analyze {
        #[arg(conflicts_with = "image")]
        text: Option<String>,

        /// Screenshot to read with OCR instead of typed text
        #[arg(long, short)]
        image: Option<PathBuf>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,

        /// Copy reply N (1-based) to the clipboard
        #[arg(long, value_name = "N")]
        copy: Option<usize>,
    },
    /// Read a screenshot with OCR and print the text, without analyzing it
    Scan { path: PathBuf },
    /// Print the prompt that would be sent for TEXT
    Prompt { text: String },
    /// Manage the Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store the key in the OS keychain
    Set { key: String },
    /// Report whether a key is available
    Status,
}

// ── ANSI colour helpers ──────────────────────────────────────────────

fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn orange(s: &str) -> String {
    format!("\x1b[38;5;208m{s}\x1b[0m")
}

// ── Presentation ─────────────────────────────────────────────────────

fn reply_icon(reply: &ReplyOption) -> &'static str {
    match reply.known_kind() {
        Some(ReplyKind::Confident) => "🛡",
        Some(ReplyKind::Calm) => "⚡",
        Some(ReplyKind::Witty) => "✨",
        None => "💬",
    }
}

fn render(result: &AnalysisResult) {
    let tension = format!("{}/10 ⚠", result.score);
    let tension = if result.is_tense() {
        orange(&tension)
    } else {
        green(&tension)
    };

    println!("{}  {}", dim("TONE"), bold(&result.tone));
    println!("{}  {}", dim("TENSION"), tension);
    println!("{}  {}%", dim("CONFIDENCE"), result.confidence);
    println!();
    println!("{}", bold("The Verdict"));
    println!("  \"{}\"", result.explanation);
    println!();
    println!("{}", dim("SMART REPLIES"));
    for (i, reply) in result.replies.iter().enumerate() {
        println!(
            "  {}. {} {}  \"{}\"",
            i + 1,
            reply_icon(reply),
            dim(&reply.kind.to_uppercase()),
            reply.msg
        );
    }
}

fn copy_reply(result: &AnalysisResult, n: usize) -> Result<(), String> {
    let reply = n
        .checked_sub(1)
        .and_then(|i| result.replies.get(i))
        .ok_or_else(|| format!("No reply #{} (have {})", n, result.replies.len()))?;
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(&reply.msg).map_err(|e| e.to_string())?;
    log::info!("[ACTION] Copied {} chars to clipboard", reply.msg.len());
    Ok(())
}

fn read_stdin() -> Result<String, String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    Ok(buf)
}

fn fail(message: &str) -> ExitCode {
    eprintln!("{}", red(message));
    ExitCode::FAILURE
}

// ── Commands ─────────────────────────────────────────────────────────

async fn analyze(
    settings: &Settings,
    text: Option<String>,
    image: Option<PathBuf>,
    json: bool,
    copy: Option<usize>,
) -> ExitCode {
    let submission = match (text, image) {
        (_, Some(path)) => Submission::Image(path),
        (Some(t), None) if t == "-" => match read_stdin() {
            Ok(buf) => Submission::Text(buf),
            Err(e) => return fail(&e),
        },
        (Some(t), None) => Submission::Text(t),
        (None, None) => return fail("Paste some text, pass \"-\" for stdin, or use --image."),
    };

    let pipeline = match Pipeline::from_settings(settings) {
        Ok(p) => p,
        Err(e) => return fail(&e.to_string()),
    };
    let session = SessionHandle::new();

    let phase = match pipeline.submit(&session, submission).await {
        Ok(phase) => phase,
        Err(Rejected::EmptyInput) => return fail("Paste or type some text first."),
        Err(e) => return fail(&e.to_string()),
    };

    match phase {
        Phase::Success(result) => {
            if json {
                match serde_json::to_string_pretty(&result) {
                    Ok(s) => println!("{}", s),
                    Err(e) => return fail(&e.to_string()),
                }
            } else {
                render(&result);
            }
            if let Some(n) = copy {
                match copy_reply(&result, n) {
                    Ok(()) => eprintln!("{}", dim(&format!("Copied reply #{} to clipboard", n))),
                    Err(e) => return fail(&e),
                }
            }
            ExitCode::SUCCESS
        }
        Phase::Failure(error) => {
            log::debug!("[CLI] Failure detail: {}", error);
            fail(&error.user_message())
        }
        other => fail(&format!("Analysis ended in unexpected phase: {}", other.name())),
    }
}

async fn scan(settings: &Settings, path: PathBuf) -> ExitCode {
    let pipeline = match Pipeline::from_settings(settings) {
        Ok(p) => p,
        Err(e) => return fail(&e.to_string()),
    };
    let session = SessionHandle::new();
    match pipeline.scan(&session, path).await {
        Ok(Phase::Failure(error)) => fail(&error.user_message()),
        Ok(_) => match session.snapshot().input_text() {
            Some(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            None => fail("No text recognized."),
        },
        Err(e) => fail(&e.to_string()),
    }
}

fn key(action: KeyAction) -> ExitCode {
    match action {
        KeyAction::Set { key } => match config::save_api_key(&key) {
            Ok(()) => {
                println!("{}", green("Gemini API key saved."));
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e.to_string()),
        },
        KeyAction::Status => {
            if config::resolve_api_key().is_some() {
                println!("{}", green("Gemini API key: configured"));
                ExitCode::SUCCESS
            } else {
                fail("Gemini API key: missing (set GEMINI_API_KEY or run `overthinkr key set <KEY>`)")
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    overthinkr_lib::init();
    let cli = Cli::parse();
    let settings = Settings::load();
    log::debug!("[CLI] Settings: {:?}", settings);

    match cli.command {
        Command::Analyze {
            text,
            image,
            json,
            copy,
        } => analyze(&settings, text, image, json, copy).await,
        Command::Scan { path } => scan(&settings, path).await,
        Command::Prompt { text } => match CanonicalText::new(&text) {
            Ok(text) => {
                println!("{}", build_prompt(&text));
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e.user_message()),
        },
        Command::Key { action } => key(action),
    }
}
