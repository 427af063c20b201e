use agrogpt_client::store::CREDENTIAL_KEY;
use agrogpt_client::{
    load_session_config, CaptureDeviceFactory, ChatBackend, Config, HttpBackend,
    InteractionStatus, Language, LocalStore, Role, SessionController, SessionError, SessionEvent,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agrogpt", version, about = "Terminal client for the AgroGPT farming assistant")]
struct Cli {
    /// Config file (TOML, YAML or JSON; extension optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Reply language (English, Hindi, Gujarati, Bengali, Kannada, Punjabi)
    #[arg(short, long)]
    language: Option<String>,

    /// WAV file to use as the microphone for /record
    #[arg(long)]
    audio_file: Option<PathBuf>,

    /// Save this API key before starting
    #[arg(long)]
    api_key: Option<String>,

    /// Store file holding the API key and session id
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    SendInput,
    Record,
    Stop,
    Language(String),
    Key(String),
    Translate { from: String, to: String, text: String },
    History,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::SendInput;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "record" | "rec" => Command::Record,
        "stop" => Command::Stop,
        "lang" | "language" => Command::Language(args.to_string()),
        "key" => Command::Key(args.to_string()),
        "translate" => {
            let mut parts = args.splitn(3, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(from), Some(to), Some(text)) if !text.trim().is_empty() => Command::Translate {
                    from: from.to_string(),
                    to: to.to_string(),
                    text: text.trim().to_string(),
                },
                _ => Command::Unknown(line.to_string()),
            }
        }
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

const HELP: &str = "\
Type a question and press Enter to ask.
  /record              start recording from the configured audio input
  /stop                stop recording and transcribe into the input
  (empty line)         send the transcribed input
  /lang <name>         switch language
  /key <api key>       save and use a new API key
  /translate <from> <to> <text>
  /history             show the conversation
  /quit";

fn report(err: &SessionError) {
    if err.is_silent() {
        debug!("Ignored: {}", err);
    } else {
        eprintln!("! {}", err);
    }
}

/// Switch the controller to `key`, saving it only if the controller took it
///
/// A busy session keeps its current key, so the store must not change either.
async fn change_key(
    controller: &mut SessionController,
    store: &mut LocalStore,
    key: String,
) -> Result<(), SessionError> {
    let applied = controller.set_credential(key.clone()).await;
    if matches!(applied, Err(SessionError::Busy(_))) {
        return applied;
    }

    if let Err(e) = store.persist(CREDENTIAL_KEY, &key) {
        eprintln!("! Could not save the API key: {:#}", e);
    }
    applied
}

/// Key for calls made outside the controller, held to the controller's rules
fn credential_for(controller: &SessionController) -> Result<String, SessionError> {
    if !controller.config().has_credential() {
        return Err(SessionError::MissingCredential);
    }
    Ok(controller.config().credential.clone())
}

/// Print session events as they happen
async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::MessageAppended(message)) => match message.role {
                Role::User => println!("you> {}", message.content),
                Role::Assistant => println!("agrogpt> {}\n", message.content),
            },
            Ok(SessionEvent::TranscriptReplaced(count)) => {
                println!("({} earlier messages restored, /history to show)", count)
            }
            Ok(SessionEvent::StatusChanged(status)) => match status {
                InteractionStatus::AwaitingReply => println!("AgroGPT is thinking..."),
                InteractionStatus::Recording => println!("Listening... (/stop when done)"),
                InteractionStatus::AwaitingTranscription => println!("Transcribing..."),
                _ => {}
            },
            Ok(SessionEvent::InputChanged(text)) if !text.is_empty() => {
                println!("heard> {}\n(press Enter to send it, or type a new message)", text)
            }
            Ok(SessionEvent::LanguageChanged(language)) => println!("Language: {}", language),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Event printer skipped {} events", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let language: Language = match &cli.language {
        Some(name) => name.parse()?,
        None => cfg.language()?,
    };

    let store_path = match cli.store.clone().or_else(|| cfg.store.path.clone()) {
        Some(path) => path,
        None => LocalStore::default_path()?,
    };
    let mut store = LocalStore::open(&store_path)?;
    if let Some(key) = &cli.api_key {
        store.persist(CREDENTIAL_KEY, key)?;
    }
    let session = load_session_config(&mut store, language)?;

    let backend = Arc::new(
        HttpBackend::new(&cfg.backend.base_url, cfg.request_timeout())
            .context("Failed to create backend client")?,
    );

    let source = match cli.audio_file {
        Some(path) => agrogpt_client::CaptureSource::File(path),
        None => cfg.capture_source(),
    };
    let device = CaptureDeviceFactory::create(source, cfg.capture.frame_ms);

    info!("AgroGPT client v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", backend.base_url());
    info!("Store: {}", store.path().display());
    info!("Session: {}", session.session_id);

    let mut controller = SessionController::new(session, backend.clone(), device);
    let printer = tokio::spawn(print_events(controller.subscribe()));

    println!("AgroGPT Assistant | Language: {}", controller.language());
    println!("Ask anything about farming in {}... (/help for commands)", controller.language());

    match controller.initialize().await {
        Err(SessionError::MissingCredential) => {
            println!("No API key saved yet. Use /key <api key> to set one.")
        }
        Err(e) => report(&e),
        Ok(()) => {}
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Send(text) => {
                if let Err(e) = controller.submit_text(&text).await {
                    report(&e);
                }
            }
            Command::SendInput => {
                if let Err(e) = controller.submit_input().await {
                    report(&e);
                }
            }
            Command::Record => {
                if let Err(e) = controller.start_recording().await {
                    report(&e);
                }
            }
            Command::Stop => {
                if let Err(e) = controller.stop_recording().await {
                    report(&e);
                }
            }
            Command::Language(name) => match name.parse::<Language>() {
                Ok(language) => controller.set_language(language),
                Err(e) => eprintln!("! {}", e),
            },
            Command::Key(key) => {
                if let Err(e) = change_key(&mut controller, &mut store, key).await {
                    report(&e);
                }
            }
            Command::Translate { from, to, text } => {
                let (source, target) = match (from.parse::<Language>(), to.parse::<Language>()) {
                    (Ok(source), Ok(target)) => (source, target),
                    (Err(e), _) | (_, Err(e)) => {
                        eprintln!("! {}", e);
                        continue;
                    }
                };
                let credential = match credential_for(&controller) {
                    Ok(credential) => credential,
                    Err(e) => {
                        report(&e);
                        continue;
                    }
                };
                match backend.translate(&text, source, target, &credential).await {
                    Ok(translated) => println!("{}> {}", target, translated),
                    Err(e) => eprintln!("! Translation failed: {}", e),
                }
            }
            Command::History => {
                for message in controller.transcript() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "agrogpt",
                    };
                    println!("{}> {}", who, message.content);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(line) => eprintln!("! Unknown command: {} (/help)", line),
        }
    }

    controller.shutdown().await;
    drop(controller);
    let _ = printer.await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrogpt_client::{SessionConfig, WavFileDevice};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_wav(dir: &Path) -> PathBuf {
        let path = dir.join("question.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..1600 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    async fn offline_controller(dir: &Path, credential: &str) -> SessionController {
        // Nothing listens here, so history fetches fail and are skipped
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = Arc::new(HttpBackend::new(&format!("http://{}/api/v1", addr), None).unwrap());
        let device = Box::new(WavFileDevice::new(write_wav(dir), 100));
        SessionController::new(SessionConfig::new("s1", credential), backend, device)
    }

    #[tokio::test]
    async fn test_blank_key_is_missing_for_translate() {
        let temp_dir = TempDir::new().unwrap();

        let blank = offline_controller(temp_dir.path(), "   ").await;
        assert!(matches!(credential_for(&blank), Err(SessionError::MissingCredential)));

        let set = offline_controller(temp_dir.path(), "abc123").await;
        assert_eq!(credential_for(&set).unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_key_is_saved_when_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = LocalStore::open(temp_dir.path().join("store.json")).unwrap();
        let mut controller = offline_controller(temp_dir.path(), "old-key").await;

        change_key(&mut controller, &mut store, "new-key".to_string())
            .await
            .unwrap();

        assert_eq!(controller.config().credential, "new-key");
        assert_eq!(store.get(CREDENTIAL_KEY), Some("new-key"));
    }

    #[tokio::test]
    async fn test_key_is_not_saved_while_recording() {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("store.json");
        let mut store = LocalStore::open(&store_path).unwrap();
        store.persist(CREDENTIAL_KEY, "old-key").unwrap();
        let mut controller = offline_controller(temp_dir.path(), "old-key").await;

        controller.start_recording().await.unwrap();
        let err = change_key(&mut controller, &mut store, "new-key".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Busy(InteractionStatus::Recording)));
        assert_eq!(controller.config().credential, "old-key");
        assert_eq!(store.get(CREDENTIAL_KEY), Some("old-key"));
        let reopened = LocalStore::open(&store_path).unwrap();
        assert_eq!(reopened.get(CREDENTIAL_KEY), Some("old-key"));

        controller.shutdown().await;
    }

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse_command("  When should I plant wheat? "),
            Command::Send("When should I plant wheat?".to_string())
        );
    }

    #[test]
    fn test_empty_line_sends_input() {
        assert_eq!(parse_command("   "), Command::SendInput);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse_command("/lang Hindi"), Command::Language("Hindi".to_string()));
        assert_eq!(parse_command("/key abc123"), Command::Key("abc123".to_string()));
        assert_eq!(parse_command("/record"), Command::Record);
        assert_eq!(parse_command("/stop"), Command::Stop);
    }

    #[test]
    fn test_translate_keeps_text_spaces() {
        assert_eq!(
            parse_command("/translate English Hindi rice needs water"),
            Command::Translate {
                from: "English".to_string(),
                to: "Hindi".to_string(),
                text: "rice needs water".to_string(),
            }
        );
        assert!(matches!(parse_command("/translate English"), Command::Unknown(_)));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_command("/dance"), Command::Unknown("/dance".to_string()));
    }
}
