use alias_client::{ClientConfig, Command, GameSession, GeminiWordGenerator, WsChannel};
use alias_core::{Room, RoomEvent, RoomEventHandler, RoomSettings, generate_session_id};
use alias_types::{Difficulty, Language, SCORE_OPTIONS};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "alias-client")]
#[command(about = "Play Alias with friends over a relay", long_about = None)]
struct Args {
    /// Name shown to the other players
    #[arg(short, long)]
    name: String,

    /// Relay websocket URL, overrides RELAY_URL
    #[arg(short = 'u', long)]
    url: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Create a new room and host it
    Create {
        #[arg(short, long, value_enum, default_value_t = LanguageArg::Ua)]
        language: LanguageArg,

        /// Points needed to win (10, 25, 50 or 100)
        #[arg(short, long, default_value_t = alias_types::DEFAULT_TARGET_SCORE, value_parser = parse_target_score)]
        target_score: u32,

        #[arg(short, long, value_enum, default_value_t = DifficultyArg::Medium)]
        difficulty: DifficultyArg,

        /// Ask the word generation service for a fresh batch on start
        #[arg(long)]
        ai: bool,
    },
    /// Join an existing room by its code
    Join { code: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LanguageArg {
    Ua,
    En,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Ua => Language::Ua,
            LanguageArg::En => Language::En,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Prints room changes for a terminal player.
struct ConsoleView {
    me: String,
}

impl RoomEventHandler for ConsoleView {
    fn handle_event(&mut self, event: &RoomEvent) {
        match event {
            RoomEvent::RoomCreated { room_id } => {
                println!("Room {} created. Share the code with your friends.", room_id)
            }
            RoomEvent::JoinedRoom { room_id } => println!("Joining room {}...", room_id),
            RoomEvent::RosterChanged { players } => {
                let names: Vec<String> = players
                    .iter()
                    .map(|p| {
                        if p.is_host {
                            format!("{} (host)", p.name)
                        } else {
                            p.name.clone()
                        }
                    })
                    .collect();
                println!("Players: {}", names.join(", "));
            }
            RoomEvent::RoleChanged { role } => println!("You are now {:?}", role),
            RoomEvent::GameStarted { .. } => println!("Game started!"),
            RoomEvent::TurnChanged {
                player_id,
                round_number,
            } => {
                if *player_id == self.me {
                    println!("Round {}: your turn to explain", round_number);
                } else {
                    println!("Round {}: {} explains", round_number, player_id);
                }
            }
            RoomEvent::WordChanged { word } => println!("Word: {}", word),
            RoomEvent::ScoreChanged { player_id, score } => {
                println!("{} now has {} points", player_id, score)
            }
            RoomEvent::Countdown { seconds } => {
                if *seconds <= 10 || seconds % 15 == 0 {
                    println!("{}s left", seconds);
                }
            }
            RoomEvent::GameOver { leaderboard } => {
                println!("Game over!");
                for (place, player) in leaderboard.iter().enumerate() {
                    println!("{}. {} - {}", place + 1, player.name, player.score);
                }
            }
            RoomEvent::RoomReset => println!("Left the room."),
        }
    }
}

fn setup_logger(default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "alias_client={},alias_core={}",
                    default_log_level, default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_target_score(value: &str) -> Result<u32, String> {
    let score: u32 = value.parse().map_err(|e| format!("{}", e))?;
    if SCORE_OPTIONS.contains(&score) {
        Ok(score)
    } else {
        Err(format!("must be one of {:?}", SCORE_OPTIONS))
    }
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "start" | "s" => Some(Command::Start),
        "correct" | "c" | "+" => Some(Command::Correct),
        "skip" | "x" | "-" => Some(Command::Skip),
        "quit" | "q" | "leave" => Some(Command::Leave),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logger("info");

    let args = Args::parse();
    let config = ClientConfig::from_env()?;
    let relay_url = args.url.unwrap_or_else(|| config.relay_url.clone());

    let mut rng = StdRng::from_entropy();
    let me = generate_session_id(&mut rng);
    let room = match args.action {
        Action::Create {
            language,
            target_score,
            difficulty,
            ai,
        } => {
            let settings = RoomSettings {
                language: language.into(),
                target_score,
                difficulty: difficulty.into(),
                use_ai: ai,
            };
            Room::create(me.clone(), &args.name, settings, &mut rng)?
        }
        Action::Join { code } => Room::join(me.clone(), &args.name, &code)?,
    };

    let generator = GeminiWordGenerator::from_config(&config)?;
    let mut session = GameSession::new(room, WsChannel::new(relay_url.clone()), generator);
    session.add_handler(Box::new(ConsoleView { me: me.clone() }));
    session
        .connect()
        .await
        .with_context(|| format!("could not reach relay at {}", relay_url))?;
    info!("Session {} connected", me);

    println!("Room code: {}", session.room().room_id());
    println!("Commands: start, correct (+), skip (-), quit");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() || command == Command::Leave {
                        break;
                    }
                }
                None => println!("Unknown command: {}", line.trim()),
            }
        }
    });

    tokio::select! {
        result = session.run(rx) => result?,
        _ = tokio::signal::ctrl_c() => session.leave().await,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_score_must_be_offered() {
        assert_eq!(parse_target_score("50"), Ok(50));
        assert!(parse_target_score("7").is_err());
        assert!(parse_target_score("ten").is_err());
    }

    #[test]
    fn test_parse_command_aliases() {
        assert_eq!(parse_command(" + "), Some(Command::Correct));
        assert_eq!(parse_command("skip"), Some(Command::Skip));
        assert_eq!(parse_command("q"), Some(Command::Leave));
        assert_eq!(parse_command("dance"), None);
    }
}
