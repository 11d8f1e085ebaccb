use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prepdeck::config;
use prepdeck::models::JsonOutput;
use prepdeck::{
    mastery_color, mastery_label, CardKey, CardStore, Difficulty, DueFilter, JsonFileStore,
    ReviewCard, Scheduler, SqliteStore, Srs,
};

#[derive(Parser)]
#[command(name = "prepdeck")]
#[command(about = "Spaced-repetition scheduler for interview-prep question cards")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Treat this RFC 3339 instant as the current time
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    /// Storage backend
    #[arg(long, global = true, value_enum, default_value_t = Backend::Sqlite)]
    store: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Sqlite,
    Json,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Question ID
    question: String,

    /// Channel the question belongs to
    #[arg(long, short)]
    channel: String,

    /// beginner, intermediate or advanced
    #[arg(long, short, value_parser = parse_difficulty)]
    difficulty: Difficulty,
}

impl KeyArgs {
    fn key(&self) -> CardKey {
        CardKey::new(self.question.clone(), self.channel.clone(), self.difficulty)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the card store
    Init,

    /// Start tracking a question (no-op if already tracked)
    Add(KeyArgs),

    /// Record a confidence rating for a question
    Review {
        #[command(flatten)]
        key: KeyArgs,

        /// Rating: again/hard/good/easy (or 1-4)
        #[arg(long, short)]
        rating: String,
    },

    /// List cards due for review, most overdue first
    Due {
        /// Filter by channel
        #[arg(long, short)]
        channel: Option<String>,

        /// Filter by difficulty
        #[arg(long, short, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,

        /// Maximum number of cards
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show one card
    Show(KeyArgs),

    /// List every tracked card
    List,

    /// Stop tracking a question
    Remove(KeyArgs),

    /// Show review statistics
    Stats,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::parse(s).map_err(|e| e.to_string())
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prepdeck=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            let out = JsonOutput::<()>::err(e.to_string());
            println!("{}", serde_json::to_string(&out).unwrap_or_default());
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path();
    let scheduler = Scheduler::new(config::load_scheduler_config(&config_path)?)?;

    match cli.store {
        Backend::Sqlite => {
            let path = config::db_path();
            let store = SqliteStore::open(&path)?;
            store.init()?;
            execute(&cli, Srs::new(store, scheduler), &path.display().to_string())
        }
        Backend::Json => {
            let path = config::json_path();
            let store = JsonFileStore::open(&path)?;
            execute(&cli, Srs::new(store, scheduler), &path.display().to_string())
        }
    }
}

fn execute<S: CardStore>(
    cli: &Cli,
    mut srs: Srs<S>,
    location: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = cli.now.unwrap_or_else(Utc::now);

    match &cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Card store initialized at: {}", location);
            }
        }

        Commands::Add(args) => {
            let key = args.key();
            let existed = srs.card(&key)?.is_some();
            let card = srs.add_to_srs(&key, now)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&card))?);
            } else if existed {
                println!("Already tracking '{}'.", key);
            } else {
                println!("Added '{}'. Due now.", key);
            }
        }

        Commands::Review { key, rating } => {
            let key = key.key();
            let card = srs.record_review_str(&key, rating, now)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&card))?);
            } else {
                println!("Review recorded for '{}'.", key);
                println!(
                    "Mastery: {} (level {})",
                    mastery_label(card.mastery_level),
                    card.mastery_level
                );
                println!(
                    "Next review in {} day(s): {}",
                    card.interval_days,
                    card.due_date.to_rfc3339()
                );
            }
        }

        Commands::Due {
            channel,
            difficulty,
            limit,
        } => {
            let filter = DueFilter {
                channel: channel.clone(),
                difficulty: *difficulty,
                limit: *limit,
            };
            let cards = srs.due_cards_filtered(now, &filter)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&cards))?);
            } else if cards.is_empty() {
                println!("Nothing due. Come back later!");
            } else {
                print_card_table(&cards);
                println!();
                println!("After reviewing, record a rating with:");
                println!("  prepdeck review <question> -c <channel> -d <difficulty> --rating <again|hard|good|easy>");
            }
        }

        Commands::Show(args) => {
            let card = srs.require_card(&args.key())?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "card": card,
                        "mastery_label": mastery_label(card.mastery_level),
                        "mastery_color": mastery_color(card.mastery_level),
                        "due": card.is_due(now),
                    })))?
                );
            } else {
                print_card_detail(&card, now);
            }
        }

        Commands::List => {
            let cards = srs.cards()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&cards))?);
            } else if cards.is_empty() {
                println!("No cards tracked.");
            } else {
                print_card_table(&cards);
            }
        }

        Commands::Remove(args) => {
            let key = args.key();
            if srs.remove(&key)? {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                } else {
                    println!("Removed '{}'.", key);
                }
            } else if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("Card not found"))?
                );
            } else {
                println!("Card not found.");
            }
        }

        Commands::Stats => {
            let stats = srs.stats(now)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== Review Statistics ===");
                println!("Total cards: {}", stats.total_cards);
                println!("Total reviews: {}", stats.total_reviews);
                println!("Lapses: {}", stats.total_lapses);
                println!("Proficient or better (level 4+): {}", stats.proficient);
                println!("Due for review: {}", stats.due_now);
                println!("Average mastery: {:.1}/5", stats.avg_mastery);
                println!("Average ease: {:.2}", stats.avg_ease);
                if let Some(next) = stats.next_due {
                    println!("Next card due: {}", next.to_rfc3339());
                }
            }
        }
    }

    Ok(())
}

fn print_card_table(cards: &[ReviewCard]) {
    println!(
        "{:<30} {:<16} {:<13} {:<12} {:>5} {:>5}  DUE",
        "QUESTION", "CHANNEL", "DIFFICULTY", "MASTERY", "INT", "EASE"
    );
    println!("{}", "-".repeat(105));
    for card in cards {
        println!(
            "{:<30} {:<16} {:<13} {:<12} {:>5} {:>5.2}  {}",
            truncate(&card.question_id, 28),
            truncate(&card.channel, 14),
            card.difficulty,
            mastery_label(card.mastery_level),
            card.interval_days,
            card.ease_factor,
            card.due_date.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_card_detail(card: &ReviewCard, now: DateTime<Utc>) {
    println!("Question: {}", card.question_id);
    println!("Channel: {}", card.channel);
    println!("Difficulty: {}", card.difficulty);
    println!("Added: {}", card.created_at.to_rfc3339());
    println!();
    println!("--- Progress ---");
    println!(
        "Mastery: {} (level {}, {})",
        mastery_label(card.mastery_level),
        card.mastery_level,
        mastery_color(card.mastery_level).as_str()
    );
    println!("Ease factor: {:.2}", card.ease_factor);
    println!("Repetitions: {}", card.repetitions);
    println!("Interval: {} day(s)", card.interval_days);
    println!(
        "Reviews: {} ({:.0}% passed, {} lapses)",
        card.total_reviews,
        card.success_rate(),
        card.lapses
    );
    if let Some(last) = &card.last_reviewed_at {
        println!("Last reviewed: {}", last.to_rfc3339());
    }
    let status = if card.is_due(now) { " (due now)" } else { "" };
    println!("Next review: {}{}", card.due_date.to_rfc3339(), status);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("héllo wörld", 8), "héllo...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["prepdeck", "init"]).unwrap();
            assert!(!cli.json);
            assert!(cli.now.is_none());
            assert_eq!(cli.store, Backend::Sqlite);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_add_command() {
            let cli = Cli::try_parse_from([
                "prepdeck",
                "add",
                "two-sum",
                "--channel",
                "algorithms",
                "--difficulty",
                "beginner",
            ])
            .unwrap();
            match cli.command {
                Commands::Add(args) => {
                    assert_eq!(
                        args.key(),
                        CardKey::new("two-sum", "algorithms", Difficulty::Beginner)
                    );
                }
                _ => panic!("Expected Add command"),
            }
        }

        #[test]
        fn parse_review_short_flags() {
            let cli = Cli::try_parse_from([
                "prepdeck", "review", "q7", "-c", "react", "-d", "advanced", "-r", "hard",
            ])
            .unwrap();
            match cli.command {
                Commands::Review { key, rating } => {
                    assert_eq!(key.question, "q7");
                    assert_eq!(key.channel, "react");
                    assert_eq!(key.difficulty, Difficulty::Advanced);
                    assert_eq!(rating, "hard");
                }
                _ => panic!("Expected Review command"),
            }
        }

        #[test]
        fn parse_due_with_filters() {
            let cli = Cli::try_parse_from([
                "prepdeck",
                "due",
                "--channel",
                "sql",
                "--difficulty",
                "intermediate",
                "--limit",
                "10",
            ])
            .unwrap();
            match cli.command {
                Commands::Due {
                    channel,
                    difficulty,
                    limit,
                } => {
                    assert_eq!(channel, Some("sql".to_string()));
                    assert_eq!(difficulty, Some(Difficulty::Intermediate));
                    assert_eq!(limit, Some(10));
                }
                _ => panic!("Expected Due command"),
            }
        }

        #[test]
        fn parse_global_flags() {
            let cli = Cli::try_parse_from([
                "prepdeck",
                "stats",
                "--json",
                "--store",
                "json",
                "--now",
                "2024-05-01T10:00:00Z",
            ])
            .unwrap();
            assert!(cli.json);
            assert_eq!(cli.store, Backend::Json);
            assert_eq!(
                cli.now,
                Some(parse_now("2024-05-01T10:00:00+00:00").unwrap())
            );
            assert!(matches!(cli.command, Commands::Stats));
        }

        #[test]
        fn parse_now_converts_offset_to_utc() {
            let now = parse_now("2024-05-01T12:00:00+02:00").unwrap();
            assert_eq!(now.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        }

        #[test]
        fn parse_bad_now_fails() {
            let result = Cli::try_parse_from(["prepdeck", "--now", "tomorrow", "stats"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_bad_difficulty_fails() {
            let result =
                Cli::try_parse_from(["prepdeck", "add", "q", "-c", "x", "-d", "expert"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            let result = Cli::try_parse_from(["prepdeck", "add", "q"]);
            assert!(result.is_err());

            let result = Cli::try_parse_from(["prepdeck", "review", "q", "-c", "x", "-d", "beginner"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_invalid_command_fails() {
            let result = Cli::try_parse_from(["prepdeck", "invalid"]);
            assert!(result.is_err());
        }
    }
}
