//! Terminal front end for the quiz engine. Renders session state to stdout
//! and reads one option choice per question from stdin; all game logic lives
//! in the library.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use impulso_escolar::config::BackendConfig;
use impulso_escolar::session::{FailurePolicy, Grade, QuizSession};
use impulso_escolar::sources::{
    AiSource, ArithmeticSource, EncyclopediaSource, QuestionSource, TriviaSource,
};
use impulso_escolar::{Level, Question};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Generative AI backend (needs OPENROUTER_API_KEY)
    Ai,
    /// Public trivia database, translated to pt-BR
    Trivia,
    /// Fill-in-the-blank questions from random encyclopedia articles
    Wiki,
    /// Locally generated arithmetic questions (no network)
    Math,
}

#[derive(Debug, Parser)]
#[command(name = "impulso", about = "Quiz adaptativo de múltipla escolha")]
struct Args {
    /// Question source
    #[arg(long, value_enum, default_value = "math")]
    source: SourceKind,
    /// Topic for the AI source (e.g. "ciências")
    #[arg(long)]
    topic: Option<String>,
    /// Starting level, 1-10
    #[arg(long, default_value_t = 1)]
    level: u8,
    /// Stop after this many questions (default: play forever)
    #[arg(long)]
    questions: Option<usize>,
    /// Surface source errors instead of falling back to arithmetic
    #[arg(long)]
    no_fallback: bool,
}

/// Seconds the feedback stays on screen before the next question. Purely
/// cosmetic.
const FEEDBACK_DELAY: Duration = Duration::from_secs(2);

fn build_source(args: &Args) -> Result<Box<dyn QuestionSource>> {
    Ok(match args.source {
        SourceKind::Ai => {
            let Some(config) = BackendConfig::from_env() else {
                bail!("the AI source needs OPENROUTER_API_KEY (environment or .env)");
            };
            let mut source = AiSource::new(config);
            if let Some(topic) = &args.topic {
                source = source.with_topic(topic.clone());
            }
            Box::new(source)
        }
        SourceKind::Trivia => Box::new(TriviaSource::new()),
        SourceKind::Wiki => Box::new(EncyclopediaSource::new()),
        SourceKind::Math => Box::new(ArithmeticSource::new()),
    })
}

fn render_question(question: &Question, level: Level) {
    println!();
    println!("── Nível {level} ──────────────────────────");
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn render_feedback(question: &Question, grade: &Grade) {
    if grade.correct {
        println!("✔ Correto! Avançando para o nível {}.", grade.level_after);
    } else {
        println!(
            "✘ Incorreto! A resposta certa era \"{}\". Voltando para o nível {}.",
            question.options()[grade.correct_index],
            grade.level_after
        );
    }
}

/// Read one option choice (1-4) from stdin. `q` quits.
fn read_choice() -> Result<Option<usize>> {
    loop {
        print!("Sua resposta (1-4): ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None); // EOF
        }
        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match input.parse::<usize>() {
            Ok(n @ 1..=4) => return Ok(Some(n - 1)),
            _ => println!("Digite um número de 1 a 4 (ou q para sair)."),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let source = build_source(&args)?;

    let mut session = QuizSession::new(source).with_level(Level::new(args.level));
    if args.no_fallback {
        session = session.with_policy(FailurePolicy::Surface);
    }

    println!("Impulso Escolar - quiz adaptativo (q para sair)");

    let mut played = 0usize;
    loop {
        if let Some(limit) = args.questions {
            if played >= limit {
                break;
            }
        }

        let question = match session.load_next().await {
            Ok(question) => question,
            Err(error) => {
                eprintln!("Não foi possível carregar a pergunta: {error}");
                eprintln!("Tentando novamente...");
                tokio::time::sleep(FEEDBACK_DELAY).await;
                continue;
            }
        };
        render_question(&question, session.level());

        let Some(picked) = read_choice()? else {
            break;
        };
        if let Some(grade) = session.submit(picked) {
            render_feedback(&question, &grade);
            played += 1;
            tokio::time::sleep(FEEDBACK_DELAY).await;
        }
    }

    println!("Até a próxima! Nível final: {}", session.level());
    Ok(())
}
