//! REPL session management

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::document::{DocumentEditor, ListField, TextField, export_to, render_markdown};
use crate::domain::{ExperienceLevel, Phase, Role};
use crate::interview::{InterviewController, View};
use crate::llm::{StopReason, StreamChunk};
use crate::timer::InterviewTimer;

/// Landing answers, any of which may come from the command line
#[derive(Debug, Clone, Default)]
pub struct Landing {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub idea: Option<String>,
    pub level: Option<ExperienceLevel>,
}

/// Interactive interview session
pub struct ReplSession {
    controller: InterviewController,
    timer: Option<InterviewTimer>,
    editor: Option<DocumentEditor>,
    duration_secs: u64,
    output_dir: PathBuf,
    finish_announced: bool,
}

/// What the outer loop does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Restart,
    Quit,
}

impl ReplSession {
    pub fn new(controller: InterviewController, duration_secs: u64, output_dir: PathBuf) -> Self {
        debug!(%duration_secs, ?output_dir, "ReplSession::new: called");
        Self {
            controller,
            timer: None,
            editor: None,
            duration_secs,
            output_dir,
            finish_announced: false,
        }
    }

    /// Run landing, interview and document view until the user quits
    pub async fn run(&mut self, landing: Landing) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        let mut landing = landing;

        loop {
            let Some((user_id, email, idea, level)) = prompt_landing(&mut rl, &landing)? else {
                break;
            };
            self.begin(&user_id, &email, &idea, level).await?;

            match self.interview_loop(&mut rl).await? {
                Flow::Restart => {
                    self.reset();
                    landing = Landing::default();
                }
                Flow::Quit | Flow::Continue => break,
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "specforge".bright_cyan().bold());
        println!(
            "A {}-minute interview that turns your app idea into a product spec.",
            self.duration_secs.div_ceil(60)
        );
        println!();
    }

    fn reset(&mut self) {
        self.controller.restart();
        self.timer = None;
        self.editor = None;
        self.finish_announced = false;
    }

    async fn begin(&mut self, user_id: &str, email: &str, idea: &str, level: ExperienceLevel) -> Result<()> {
        info!(%user_id, %level, "Beginning interview");
        println!();
        println!("{}", "Connecting...".dimmed());

        // the countdown runs from the moment the interview opens, kickoff included
        self.timer = Some(InterviewTimer::start(self.duration_secs));

        let (tx, printer) = spawn_printer();
        // a rejected start never happens from Landing; the printer still needs closing
        let started = self.controller.start(user_id, email, idea, level, Some(tx)).await;
        let streamed = printer.await.unwrap_or_default();
        if let Err(e) = started {
            println!("{} {}", "Error:".red(), e);
        }
        self.print_reply_tail(&streamed);

        self.print_status();
        println!("Type {} for commands", "/help".yellow());
        Ok(())
    }

    async fn interview_loop(&mut self, rl: &mut DefaultEditor) -> Result<Flow> {
        loop {
            self.announce_finish_if_due();
            let prompt = format!("{} {} ", self.clock(), ">".bright_green());
            let input = match rl.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Flow::Quit);
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(input);

            let flow = if input.starts_with('/') {
                self.handle_interview_command(rl, input).await?
            } else {
                self.send(input).await;
                Flow::Continue
            };

            if flow != Flow::Continue {
                return Ok(flow);
            }
        }
    }

    async fn handle_interview_command(&mut self, rl: &mut DefaultEditor, input: &str) -> Result<Flow> {
        let cmd = input.split_whitespace().next().unwrap_or("");
        debug!(%cmd, "handle_interview_command: called");

        match cmd {
            "/help" | "/h" => self.print_interview_help(),
            "/quit" | "/q" | "/exit" => return Ok(Flow::Quit),
            "/skip" | "/s" => {
                if let Err(e) = self.controller.skip().await {
                    println!("{} {}", "Error:".red(), e);
                }
                self.print_reply_tail("");
                self.after_exchange();
            }
            "/finish" | "/f" => return self.finish(rl).await,
            "/phase" | "/p" => self.print_phases(),
            "/history" => self.print_history(),
            "/time" | "/t" => println!("{} remaining", self.clock()),
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Ok(Flow::Continue)
    }

    async fn send(&mut self, input: &str) {
        let (tx, printer) = spawn_printer();
        let sent = self.controller.send_streaming(input, Some(tx)).await;
        let streamed = printer.await.unwrap_or_default();

        match sent {
            Ok(()) => {
                self.print_reply_tail(&streamed);
                self.after_exchange();
            }
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    async fn finish(&mut self, rl: &mut DefaultEditor) -> Result<Flow> {
        println!("{}", "Generating your spec...".bright_cyan());

        let document = match self.controller.finish().await {
            Ok(Some(doc)) => doc.clone(),
            Ok(None) => {
                self.print_reply_tail("");
                return Ok(Flow::Continue);
            }
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                return Ok(Flow::Continue);
            }
        };

        self.timer = None;
        self.editor = Some(DocumentEditor::new(document));
        self.print_document();
        println!(
            "Edit with {} or {}, save with {}. Type {} for all commands.",
            "/title".yellow(),
            "/summary".yellow(),
            "/export".yellow(),
            "/help".yellow()
        );
        self.document_loop(rl).await
    }

    async fn document_loop(&mut self, rl: &mut DefaultEditor) -> Result<Flow> {
        debug_assert_eq!(self.controller.view(), View::Document);
        loop {
            let input = match rl.readline(&format!("{} ", "spec>".bright_green())) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Flow::Quit);
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(input);

            let flow = self.handle_document_command(input);
            if flow != Flow::Continue {
                return Ok(flow);
            }
        }
    }

    fn handle_document_command(&mut self, input: &str) -> Flow {
        let (cmd, rest) = split_command(input);
        debug!(%cmd, "handle_document_command: called");
        let Some(editor) = self.editor.as_mut() else {
            return Flow::Restart;
        };

        match cmd {
            "/help" | "/h" => self.print_document_help(),
            "/quit" | "/q" | "/exit" => return Flow::Quit,
            "/restart" => return Flow::Restart,
            "/show" => self.print_document(),
            "/title" | "/summary" if rest.is_empty() => {
                println!("{} Usage: {} <text>", "?".yellow(), cmd);
            }
            "/title" => {
                editor.set_text(TextField::Title, rest);
                println!("{}", "Title updated.".dimmed());
            }
            "/summary" => {
                editor.set_text(TextField::Summary, rest);
                println!("{}", "Summary updated.".dimmed());
            }
            "/add" => match parse_list_arg(rest) {
                Some((field, item)) if !item.is_empty() => {
                    editor.push_item(field, item);
                    println!("{}", format!("Added to {}.", field).dimmed());
                }
                _ => println!("{} Usage: /add <users|features|stories|notes> <text>", "?".yellow()),
            },
            "/remove" => match parse_list_arg(rest) {
                Some((field, n)) => match n.parse::<usize>().ok().filter(|n| *n > 0) {
                    Some(n) => match editor.remove_item(field, n - 1) {
                        Some(item) => println!("{} {}", "Removed:".dimmed(), item),
                        None => println!("{} No item {} in {}", "?".yellow(), n, field),
                    },
                    None => println!("{} Usage: /remove <list> <number>", "?".yellow()),
                },
                None => println!("{} Usage: /remove <list> <number>", "?".yellow()),
            },
            "/list" => match rest.parse::<ListField>() {
                Ok(field) => print_list(field, editor.items(field)),
                Err(_) => println!("{} Usage: /list <users|features|stories|notes>", "?".yellow()),
            },
            "/set" => match parse_list_arg(rest) {
                Some((field, value)) => {
                    let items = split_items(value);
                    let count = items.len();
                    editor.set_items(field, items);
                    println!("{}", format!("{} now has {} item(s).", field, count).dimmed());
                }
                None => println!("{} Usage: /set <list> <item>; <item>; ...", "?".yellow()),
            },
            "/export" => {
                let dir = if rest.is_empty() {
                    self.output_dir.clone()
                } else {
                    PathBuf::from(rest)
                };
                match export_to(&dir, editor.document()) {
                    Ok(path) => println!("{} {}", "Saved".bright_green(), path.display()),
                    Err(e) => println!("{} {:#}", "Export failed:".red(), e),
                }
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Flow::Continue
    }

    fn after_exchange(&mut self) {
        self.print_status();
        self.announce_finish_if_due();
    }

    /// True exactly once, the first time finishing becomes available
    fn finish_notice_due(&mut self) -> bool {
        let expired = self.timer.as_ref().is_some_and(|t| t.expired());
        if self.finish_announced || !self.controller.finish_available(expired) {
            return false;
        }
        self.finish_announced = true;
        true
    }

    fn announce_finish_if_due(&mut self) {
        if self.finish_notice_due() {
            println!(
                "{} Type {} to generate your spec, or keep chatting.",
                "Time to wrap up!".bright_yellow().bold(),
                "/finish".yellow()
            );
        }
    }

    fn clock(&self) -> String {
        match &self.timer {
            Some(timer) if timer.is_late() => timer.display().red().bold().to_string(),
            Some(timer) => timer.display().dimmed().to_string(),
            None => String::new(),
        }
    }

    fn print_status(&self) {
        println!("{}", status_line(self.controller.phase()).dimmed());
    }

    /// Print the latest assistant message unless it already streamed
    fn print_reply_tail(&self, streamed: &str) {
        let Some(last) = self.controller.session().messages().last() else {
            return;
        };
        if last.role != Role::Assistant {
            return;
        }
        if streamed.trim() != last.text.trim() {
            if streamed.is_empty() {
                println!("{} {}", "Guide:".bright_blue(), last.text);
            } else {
                println!();
                println!("{}", last.text);
            }
        } else {
            println!();
        }
        println!();
    }

    fn print_phases(&self) {
        let current = self.controller.phase();
        println!();
        for phase in Phase::ALL {
            let marker = if phase < current {
                "✓".bright_green()
            } else if phase == current {
                "●".bright_cyan()
            } else {
                "○".dimmed()
            };
            println!("  {} {:14} {}", marker, phase.label(), phase.duration_hint().dimmed());
        }
        println!();
    }

    fn print_history(&self) {
        let messages = self.controller.session().messages();
        if messages.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in messages.iter().enumerate() {
            let role = match msg.role {
                Role::User => "You".bright_green(),
                Role::Assistant => "Guide".bright_blue(),
            };
            let preview: String = msg.text.chars().take(60).collect();
            let preview = if msg.text.chars().count() > 60 {
                format!("{}...", preview)
            } else {
                preview
            };
            println!("  {}. {}: {}", i + 1, role, preview);
        }
        println!();
    }

    fn print_document(&self) {
        if let Some(editor) = &self.editor {
            println!();
            println!("{}", render_markdown(editor.document()));
            println!();
        }
    }

    fn print_interview_help(&self) {
        println!();
        println!("{}", "Interview Commands:".bright_cyan());
        println!("  {:14} Skip the current question", "/skip".yellow());
        println!("  {:14} Generate the spec now", "/finish".yellow());
        println!("  {:14} Show interview progress", "/phase".yellow());
        println!("  {:14} Show conversation history", "/history".yellow());
        println!("  {:14} Show time remaining", "/time".yellow());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!();
    }

    fn print_document_help(&self) {
        println!();
        println!("{}", "Document Commands:".bright_cyan());
        println!("  {:22} Show the spec", "/show".yellow());
        println!("  {:22} Change the title", "/title <text>".yellow());
        println!("  {:22} Change the summary", "/summary <text>".yellow());
        println!("  {:22} Add a bullet to a list", "/add <list> <text>".yellow());
        println!("  {:22} Remove a bullet by number", "/remove <list> <n>".yellow());
        println!("  {:22} Replace a list, items split on ';'", "/set <list> <items>".yellow());
        println!("  {:22} Show one list, numbered", "/list <list>".yellow());
        println!("  {:22} Save as Markdown", "/export [dir]".yellow());
        println!("  {:22} Start a new session", "/restart".yellow());
        println!("  {:22} Exit", "/quit".yellow());
        println!("Lists: {}", ListField::ALL.map(|f| f.as_str()).join(", "));
        println!();
    }
}

/// Ask for whatever the command line did not supply; `None` on EOF
fn prompt_landing(
    rl: &mut DefaultEditor,
    landing: &Landing,
) -> Result<Option<(String, String, String, ExperienceLevel)>> {
    debug!(?landing, "prompt_landing: called");
    let fields = [
        ("User ID", landing.user_id.clone()),
        ("Email", landing.email.clone()),
        ("What's your app idea?", landing.idea.clone()),
    ];

    let mut answers = Vec::with_capacity(fields.len());
    for (label, given) in fields {
        let answer = match given.filter(|v| !v.trim().is_empty()) {
            Some(value) => value,
            None => match ask_required(rl, label)? {
                Some(value) => value,
                None => return Ok(None),
            },
        };
        answers.push(answer);
    }

    let level = match landing.level {
        Some(level) => level,
        None => loop {
            let prompt = format!("{} ", "Experience (beginner/intermediate/expert) [intermediate]:".bright_cyan());
            match read_line(rl, &prompt)? {
                None => return Ok(None),
                Some(line) if line.is_empty() => break ExperienceLevel::default(),
                Some(line) => match line.parse::<ExperienceLevel>() {
                    Ok(level) => break level,
                    Err(e) => println!("{} {}", "?".yellow(), e),
                },
            }
        },
    };

    let mut answers = answers.into_iter();
    let (Some(user_id), Some(email), Some(idea)) = (answers.next(), answers.next(), answers.next()) else {
        return Ok(None);
    };
    Ok(Some((user_id, email, idea, level)))
}

fn ask_required(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    loop {
        match read_line(rl, &format!("{} ", format!("{}:", label).bright_cyan()))? {
            None => return Ok(None),
            Some(line) if line.is_empty() => println!("{}", "This field is required.".yellow()),
            Some(line) => return Ok(Some(line)),
        }
    }
}

/// Trimmed line, `None` on EOF or Ctrl+C
fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
    }
}

/// Print streamed reply text as it arrives; resolves to the full text
fn spawn_printer() -> (mpsc::Sender<StreamChunk>, JoinHandle<String>) {
    let (tx, mut rx) = mpsc::channel::<StreamChunk>(100);
    let handle = tokio::spawn(async move {
        let mut text = String::new();
        let mut labelled = false;
        while let Some(chunk) = rx.recv().await {
            match chunk {
                StreamChunk::TextDelta(delta) => {
                    if !labelled {
                        print!("{} ", "Guide:".bright_blue());
                        labelled = true;
                    }
                    print!("{}", delta);
                    let _ = io::stdout().flush();
                    text.push_str(&delta);
                }
                StreamChunk::MessageDone { stop_reason, usage } => {
                    debug!(?stop_reason, output_tokens = %usage.output_tokens, "spawn_printer: message done");
                    if stop_reason == StopReason::MaxTokens {
                        print!("{}", "\n[Response truncated - max tokens reached]".yellow());
                    }
                }
                StreamChunk::Error(err) => {
                    debug!(%err, "spawn_printer: stream error");
                }
            }
        }
        text
    });
    (tx, handle)
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    }
}

fn parse_list_arg(rest: &str) -> Option<(ListField, &str)> {
    let (name, value) = split_command(rest);
    let field = name.parse::<ListField>().ok()?;
    Some((field, value))
}

/// `a; b;; c ` becomes `[a, b, c]`; an empty value clears the list
fn split_items(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn print_list(field: ListField, items: &[String]) {
    println!();
    println!("{}", field.to_string().bright_cyan());
    if items.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
    println!();
}

/// `[2/4] Users & Value ~45s`
fn status_line(phase: Phase) -> String {
    format!(
        "[{}/{}] {} {}",
        phase.index() + 1,
        Phase::ALL.len(),
        phase.label(),
        phase.duration_hint()
    )
}
