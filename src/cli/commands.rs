use std::time::Duration;

use airline_sentiment::pipelines::sentiment_analysis::{
    SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder, SentimentClassifierModel,
};
use airline_sentiment::{
    format_confidence, AnalysisRecord, AnalysisSession, LabelMap, ModelSource, Settings,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use super::format;

type Pipeline = SentimentAnalysisPipeline<SentimentClassifierModel>;

const ABOUT: &str = "Classifies the sentiment of airline-related tweets using a fine-tuned \
transformer model. Enter a tweet or pick one of the examples below.";

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze(String),
    /// Zero-based index into the examples.
    Example(usize),
    Examples,
    History,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// A single `/word` or `/<n>` is a command; anything else is a tweet, so
    /// text like `/r/airlines lost my bag` is still analysed.
    pub fn parse(line: &str, example_count: usize) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Command::Analyze(line.to_string());
        };
        if command.is_empty() || command.contains(|c: char| c.is_whitespace() || c == '/') {
            return Command::Analyze(line.to_string());
        }

        match command.to_ascii_lowercase().as_str() {
            "examples" | "e" => Command::Examples,
            "history" | "h" => Command::History,
            "clear" | "c" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if (1..=example_count).contains(&n) => Command::Example(n - 1),
                Ok(_) => Command::Unknown(trimmed.to_string()),
                Err(_) => Command::Analyze(line.to_string()),
            },
        }
    }
}

pub async fn handle_interactive(settings: &Settings) -> Result<()> {
    println!("{}", style("✈️  Airline Tweet Sentiment Classifier").bold().cyan());
    println!("{ABOUT}\n");
    print_examples(settings);
    print_help();

    let mut session = load_session(settings).await;
    let mut prefill: Option<String> = None;

    loop {
        let mut input = Input::<String>::new().with_prompt("✍️  Tweet").allow_empty(true);
        if let Some(text) = prefill.take() {
            input = input.with_initial_text(text);
        }

        let line = match input.interact_text() {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "input closed");
                break;
            }
        };

        match Command::parse(&line, settings.examples.len()) {
            Command::Analyze(text) => {
                if analyze(&mut session, &text).is_some() {
                    print_history(&session);
                }
            }
            Command::Example(index) => prefill = Some(settings.examples[index].clone()),
            Command::Examples => print_examples(settings),
            Command::History => print_history(&session),
            Command::Clear => {
                session.clear_history();
                println!("{}", format::success("History cleared."));
            }
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(command) => println!(
                "{}",
                format::warn(&format!("Unknown command {command}. Type /help for commands."))
            ),
        }
    }

    Ok(())
}

pub async fn handle_predict(settings: &Settings, text: &str, json: bool) -> Result<()> {
    let pipeline = build_pipeline(settings).await?;
    let labels = LabelMap::with_overrides(&settings.labels);
    let mut session = AnalysisSession::new(Some(pipeline), labels);

    let record = session.analyze(text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_record(record);
    }
    Ok(())
}

pub fn handle_examples(settings: &Settings) -> Result<()> {
    print_examples(settings);
    Ok(())
}

async fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    let source: ModelSource = settings.model.parse()?;

    let spinner = spinner(format!("Loading model from {source}..."));
    let pipeline = SentimentAnalysisPipelineBuilder::fine_tuned(source.clone())
        .max_length(settings.max_length)
        .device_setting(settings.device)
        .build()
        .await
        .with_context(|| format!("Error loading model {source}"));
    spinner.finish_and_clear();

    pipeline
}

/// A load failure is reported here and the session runs without a model.
async fn load_session(settings: &Settings) -> AnalysisSession<Pipeline> {
    let labels = LabelMap::with_overrides(&settings.labels);
    match build_pipeline(settings).await {
        Ok(pipeline) => AnalysisSession::new(Some(pipeline), labels),
        Err(e) => {
            tracing::debug!(error = %e, "model load failed");
            eprintln!("{}", format::error(&format!("{e:#}")));
            AnalysisSession::new(None, labels)
        }
    }
}

fn analyze<'s>(
    session: &'s mut AnalysisSession<Pipeline>,
    text: &str,
) -> Option<&'s AnalysisRecord> {
    let spinner = spinner("Analyzing sentiment...");
    let outcome = session.analyze(text);
    spinner.finish_and_clear();

    match outcome {
        Ok(record) => {
            print_record(record);
            Some(record)
        }
        Err(e) if e.is_warning() => {
            println!("{}", format::warn(&e.to_string()));
            None
        }
        Err(e) => {
            eprintln!("{}", format::error(&e.to_string()));
            None
        }
    }
}

fn print_record(record: &AnalysisRecord) {
    println!("{} {}", style("Sentiment:").bold(), format::sentiment(&record.sentiment));
    println!("{} {}", style("Confidence:").bold(), format_confidence(record.confidence));
}

fn print_history(session: &AnalysisSession<Pipeline>) {
    match session.history().render_table() {
        Some(table) => {
            println!("\n{}", style("Recent Analyses").bold());
            println!("{table}");
        }
        None => println!("{}", style("No analyses yet.").dim()),
    }
}

fn print_examples(settings: &Settings) {
    println!("{}", style("Example tweets").bold());
    for (i, example) in settings.examples.iter().enumerate() {
        println!("  /{} {example}", i + 1);
    }
    println!();
}

fn print_help() {
    println!(
        "{}",
        style("Commands: /<n> use example n, /examples, /history, /clear, /help, /quit").dim()
    );
}

fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner().with_message(message);
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn plain_text_is_a_tweet() {
        assert_eq!(
            Command::parse("Flight delayed /again", 3),
            Command::Analyze("Flight delayed /again".into())
        );
        assert_eq!(Command::parse("", 3), Command::Analyze(String::new()));
    }

    #[test]
    fn numbered_commands_pick_examples() {
        assert_eq!(Command::parse("/1", 3), Command::Example(0));
        assert_eq!(Command::parse(" /3 ", 3), Command::Example(2));
        assert_eq!(Command::parse("/4", 3), Command::Unknown("/4".into()));
        assert_eq!(Command::parse("/0", 3), Command::Unknown("/0".into()));
    }

    #[test]
    fn named_commands() {
        assert_eq!(Command::parse("/history", 3), Command::History);
        assert_eq!(Command::parse("/CLEAR", 3), Command::Clear);
        assert_eq!(Command::parse("/q", 3), Command::Quit);
        assert_eq!(Command::parse("/examples", 3), Command::Examples);
        assert_eq!(Command::parse("/help", 3), Command::Help);
        assert_eq!(Command::parse("/bogus", 3), Command::Analyze("/bogus".into()));
    }

    #[test]
    fn slash_led_tweets_are_analysed() {
        for tweet in ["/r/airlines lost my bag", "/ delayed again", "/", "/united why"] {
            assert_eq!(Command::parse(tweet, 3), Command::Analyze(tweet.into()));
        }
    }

    #[tokio::test]
    async fn load_failure_is_reported_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            model: dir.path().join("absent").display().to_string(),
            ..Settings::default()
        };

        let session = load_session(&settings).await;
        assert!(!session.is_ready());
        assert!(captured.0.lock().unwrap().is_empty());
    }
}
