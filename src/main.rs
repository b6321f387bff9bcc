mod analytics;
mod db;
mod error;
mod models;
mod schedule;
mod session;
mod srs;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chrono::Utc;
use db::{Database, TopicUpdate};
use models::{format_study_time, Difficulty, JsonOutput, Priority, Topic, QUALITY_SCALE};

const DEFAULT_DB_NAME: &str = "revise.db";

#[derive(Parser)]
#[command(name = "revise")]
#[command(about = "A spaced-repetition study scheduler for the terminal")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage topics
    #[command(subcommand)]
    Topic(TopicCommands),

    /// List all tags
    Tags,

    /// Record a study session, rated against a topic or free-form
    Study {
        /// Topic ID (omit for free study with no rating)
        id: Option<i64>,

        /// Recall quality 0-5 (required with a topic ID)
        #[arg(long, short)]
        quality: Option<u8>,

        /// Session length in minutes
        #[arg(long, short, default_value_t = 25)]
        minutes: i64,
    },

    /// List recorded sessions, newest first
    Sessions {
        /// Show at most this many
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show upcoming reviews bucketed by urgency
    Schedule,

    /// Pick a topic to study now (weighted by priority and overdue time)
    Next,

    /// Show study statistics
    Stats,

    /// Show the 0-5 recall quality scale
    Scale,

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum TopicCommands {
    /// List all topics
    List {
        /// Filter by subject
        #[arg(long, short)]
        subject: Option<String>,

        /// Filter by tag
        #[arg(long, short)]
        tag: Option<String>,
    },

    /// Add a new topic
    Add {
        /// Topic title
        title: String,

        /// Subject the topic belongs to
        #[arg(long, short)]
        subject: String,

        /// Difficulty: easy/medium/hard
        #[arg(long, short, value_parser = parse_difficulty, default_value = "medium")]
        difficulty: Difficulty,

        /// Priority: low/medium/high
        #[arg(long, short, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,

        /// Comma-separated tags
        #[arg(long, short)]
        tags: Option<String>,

        /// Free-form notes
        #[arg(long, short)]
        notes: Option<String>,
    },

    /// Show topic details and per-topic statistics
    Show {
        /// Topic ID
        id: i64,
    },

    /// Edit a topic's descriptive fields
    Edit {
        /// Topic ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New subject
        #[arg(long, short)]
        subject: Option<String>,

        /// New difficulty: easy/medium/hard
        #[arg(long, short, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,

        /// New priority: low/medium/high
        #[arg(long, short, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Comma-separated tags (replaces existing)
        #[arg(long, short)]
        tags: Option<String>,

        /// New notes
        #[arg(long, short)]
        notes: Option<String>,
    },

    /// Delete a topic and its sessions
    Delete {
        /// Topic ID
        id: i64,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("expected easy, medium or hard, got '{}'", s))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s).ok_or_else(|| format!("expected low, medium or high, got '{}'", s))
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("REVISE_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("revise");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;
    let now = Utc::now();

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Topic(topic_cmd) => match topic_cmd {
            TopicCommands::List { subject, tag } => {
                let topics = db.list_topics(subject.as_deref(), tag.as_deref())?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&topics))?);
                } else if topics.is_empty() {
                    println!("No topics found.");
                } else {
                    println!(
                        "{:<5} {:<32} {:<16} {:<8} {:<16} TAGS",
                        "ID", "TITLE", "SUBJECT", "PRIO", "NEXT REVIEW"
                    );
                    println!("{}", "-".repeat(92));
                    for topic in topics {
                        let tags = if topic.tags.is_empty() {
                            String::from("-")
                        } else {
                            topic.tags.join(", ")
                        };
                        let due = if topic.completed {
                            "mastered".to_string()
                        } else {
                            schedule::relative_due_label(&topic, now)
                        };
                        println!(
                            "{:<5} {:<32} {:<16} {:<8} {:<16} {}",
                            topic.id,
                            truncate(&topic.title, 30),
                            truncate(&topic.subject, 14),
                            topic.priority.as_str(),
                            due,
                            tags
                        );
                    }
                }
            }

            TopicCommands::Add {
                title,
                subject,
                difficulty,
                priority,
                tags,
                notes,
            } => {
                let tag_list = split_tags(tags);
                let id = db.add_topic(
                    &title,
                    &subject,
                    difficulty,
                    priority,
                    &tag_list,
                    notes.as_deref().unwrap_or(""),
                    now,
                )?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "title": title
                        })))?
                    );
                } else {
                    println!("Added topic '{}' with ID: {}", title, id);
                }
            }

            TopicCommands::Show { id } => {
                if let Some(topic) = db.get_topic(id)? {
                    let sessions = db.sessions_for_topic(id)?;
                    let retention = analytics::retention_rate(&topic, &sessions);
                    let strength = analytics::knowledge_strength(&topic, now);

                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "topic": topic,
                                "retention_rate": retention,
                                "knowledge_strength": strength,
                                "session_count": sessions.len()
                            })))?
                        );
                    } else {
                        print_topic_detail(&topic, retention, strength, sessions.len(), now);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err(format!(
                            "topic {} not found",
                            id
                        )))?
                    );
                } else {
                    println!("Topic {} not found.", id);
                }
            }

            TopicCommands::Edit {
                id,
                title,
                subject,
                difficulty,
                priority,
                tags,
                notes,
            } => {
                let tag_list = tags.map(split_tags_owned);
                let topic = db.update_topic(
                    id,
                    TopicUpdate {
                        title: title.as_deref(),
                        subject: subject.as_deref(),
                        difficulty,
                        priority,
                        notes: notes.as_deref(),
                        tags: tag_list.as_deref(),
                    },
                )?;

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&topic))?);
                } else {
                    println!("Updated topic '{}' (ID: {})", topic.title, topic.id);
                }
            }

            TopicCommands::Delete { id } => {
                db.delete_topic(id)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                } else {
                    println!("Deleted topic {} and its sessions.", id);
                }
            }
        },

        Commands::Tags => {
            let tags = db.list_tags()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&tags))?);
            } else if tags.is_empty() {
                println!("No tags yet.");
            } else {
                println!("{:<5} {:<24} TOPICS", "ID", "TAG");
                println!("{}", "-".repeat(40));
                for tag in tags {
                    println!("{:<5} {:<24} {}", tag.id, tag.name, tag.topic_count);
                }
            }
        }

        Commands::Study { id, quality, minutes } => {
            let seconds = minutes * 60;
            match id {
                Some(topic_id) => {
                    let quality = quality
                        .ok_or("a rating is required when studying a topic; pass --quality 0-5")?;
                    let (topic, _) = db.record_review(topic_id, quality, seconds, now)?;

                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&topic))?);
                    } else {
                        println!(
                            "Recorded {} ({}) for '{}'.",
                            quality,
                            models::quality_label(quality).unwrap_or("?"),
                            topic.title
                        );
                        if topic.completed {
                            println!("Topic mastered. It is off the schedule.");
                        } else {
                            println!(
                                "Next review: {} ({})",
                                topic
                                    .next_review
                                    .map(|d| d.format("%Y-%m-%d").to_string())
                                    .unwrap_or_else(|| "-".to_string()),
                                schedule::relative_due_label(&topic, now)
                            );
                        }
                    }
                }
                None => {
                    if quality.is_some() {
                        return Err("a quality rating needs a topic ID to rate".into());
                    }
                    let session = db.record_free_session(seconds, now)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&session))?);
                    } else {
                        println!(
                            "Recorded {} of free study.",
                            format_study_time(session.duration)
                        );
                    }
                }
            }
        }

        Commands::Sessions { limit } => {
            let sessions = db.list_sessions(limit)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&sessions))?);
            } else if sessions.is_empty() {
                println!("No sessions recorded.");
            } else {
                println!(
                    "{:<5} {:<18} {:<8} {:<8} {:<8} QUALITY",
                    "ID", "WHEN", "TOPIC", "KIND", "TIME"
                );
                println!("{}", "-".repeat(60));
                for s in sessions {
                    let topic = s
                        .topic_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let quality = s
                        .quality
                        .map(|q| q.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<5} {:<18} {:<8} {:<8} {:<8} {}",
                        s.id,
                        s.completed_at.format("%Y-%m-%d %H:%M"),
                        topic,
                        s.kind.as_str(),
                        format_study_time(s.duration),
                        quality
                    );
                }
            }
        }

        Commands::Schedule => {
            let buckets = db.schedule(now)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&buckets))?);
            } else if buckets.total() == 0 {
                println!("Nothing scheduled. Add topics or enjoy the day off.");
            } else {
                print_bucket("OVERDUE", &buckets.overdue, now);
                print_bucket("TODAY", &buckets.today, now);
                print_bucket("TOMORROW", &buckets.tomorrow, now);
                print_bucket("THIS WEEK", &buckets.this_week, now);
                print_bucket("LATER", &buckets.later, now);
            }
        }

        Commands::Next => {
            let next = db.next_topic(now)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&next))?);
            } else {
                match next {
                    Some(topic) => {
                        println!(
                            "Study next: '{}' [{}] (ID: {}, {})",
                            topic.title,
                            topic.subject,
                            topic.id,
                            schedule::relative_due_label(&topic, now)
                        );
                        println!("When done: revise study {} --quality <0-5>", topic.id);
                    }
                    None => println!("Nothing is due right now."),
                }
            }
        }

        Commands::Stats => {
            let report = db.report(now)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&report))?);
            } else {
                println!("Study streak:    {} day(s)", report.streak);
                println!("Total sessions:  {}", report.total_sessions);
                println!(
                    "Total time:      {}",
                    format_study_time(report.total_study_time)
                );
                println!(
                    "Topics:          {} tracked, {} mastered",
                    report.topics_tracked, report.topics_completed
                );
                println!(
                    "Average score:   {}",
                    report
                        .performance
                        .average_score
                        .map(|s| format!("{}%", s))
                        .unwrap_or_else(|| "N/A".to_string())
                );
                println!(
                    "Completion rate: {}",
                    report
                        .performance
                        .completion_rate
                        .map(|r| format!("{}%", r))
                        .unwrap_or_else(|| "N/A".to_string())
                );
                println!(
                    "Daily average:   {}",
                    report
                        .performance
                        .daily_average
                        .map(|a| format!("{} session(s)", a))
                        .unwrap_or_else(|| "N/A".to_string())
                );
                println!();
                println!("Last {} days:", analytics::DAILY_WINDOW);
                println!("{:<12} {:<10} {:<10} TOPICS", "DAY", "SESSIONS", "TIME");
                println!("{}", "-".repeat(42));
                for day in &report.daily {
                    println!(
                        "{:<12} {:<10} {:<10} {}",
                        day.day.format("%Y-%m-%d"),
                        day.sessions,
                        format_study_time(day.study_time),
                        day.topics
                    );
                }
            }
        }

        Commands::Scale => {
            if cli.json {
                let scale: Vec<serde_json::Value> = QUALITY_SCALE
                    .iter()
                    .map(|(q, label)| serde_json::json!({ "quality": q, "label": label }))
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(scale))?);
            } else {
                for (q, label) in QUALITY_SCALE {
                    println!("{}  {}", q, label);
                }
            }
        }

        Commands::Tui => {
            db.init()?;
            tui::run(db)?;
        }
    }

    Ok(())
}

fn split_tags_owned(tags: String) -> Vec<String> {
    split_tags(Some(tags))
}

fn print_topic_detail(topic: &Topic, retention: i64, strength: i64, session_count: usize, now: chrono::DateTime<Utc>) {
    println!("Topic: {}", topic.title);
    println!("ID: {}", topic.id);
    println!("Subject: {}", topic.subject);
    println!(
        "Difficulty: {}  Priority: {}",
        topic.difficulty.label(),
        topic.priority.label()
    );
    println!(
        "Tags: {}",
        if topic.tags.is_empty() {
            "-".to_string()
        } else {
            topic.tags.join(", ")
        }
    );
    if !topic.notes.is_empty() {
        println!("Notes: {}", topic.notes);
    }
    println!();
    println!(
        "Status: {}",
        if topic.completed { "mastered" } else { "active" }
    );
    println!(
        "Next review: {}",
        if topic.completed {
            "-".to_string()
        } else {
            schedule::relative_due_label(topic, now)
        }
    );
    println!(
        "Repetitions: {}  Interval: {} day(s)  Easiness: {:.2}",
        topic.repetitions, topic.interval, topic.easiness_factor
    );
    println!(
        "Success rate: {}",
        topic
            .success_rate
            .map(|r| format!("{}%", r))
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!("Retention: {}%", retention);
    println!("Knowledge strength: {}/100", strength);
    println!(
        "Sessions: {}  Study time: {}",
        session_count,
        format_study_time(topic.study_time)
    );
    println!("Created: {}", topic.created_at.format("%Y-%m-%d"));
}

fn print_bucket(label: &str, topics: &[Topic], now: chrono::DateTime<Utc>) {
    if topics.is_empty() {
        return;
    }
    println!("{} ({})", label, topics.len());
    for topic in topics {
        println!(
            "  [{:>3}] {} [{}] ({})",
            topic.id,
            topic.title,
            topic.subject,
            schedule::relative_due_label(topic, now)
        );
    }
    println!();
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
