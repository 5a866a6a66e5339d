use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::app::status::render_progress;
use crate::app::tutor::Tutor;
use crate::chat::ChatSession;
use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::Config;
use crate::memory::{chunk, sanitize_document_text};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Ask {
            docs,
            collection,
            system,
            progress: show_progress,
            question,
        } => {
            let tutor = Tutor::from_config(&config);
            ingest_all(&tutor, &collection, &docs).await?;

            let mut session = tutor.session(system.as_deref(), &collection);
            ask(&mut session, tutor.locale(), &question).await;
            if show_progress && let Some(progress) = session.progress() {
                println!("\n{}", render_progress(&progress, tutor.locale()));
            }
            Ok(())
        }

        Commands::Chat {
            docs,
            collection,
            system,
        } => {
            let tutor = Tutor::from_config(&config);
            ingest_all(&tutor, &collection, &docs).await?;

            let session = tutor.session(system.as_deref(), &collection);
            run_interactive(session, tutor.locale()).await
        }

        Commands::Chunk { max_len, file } => {
            let max_len = max_len.unwrap_or(config.ingestion.max_chunk_chars);
            print_chunks(&file, max_len).await
        }

        Commands::Config { config_command } => match config_command {
            ConfigCommands::Show => {
                print!("{}", config.redacted_toml()?);
                Ok(())
            }
            ConfigCommands::Path => {
                println!("{}", config.config_path.display());
                Ok(())
            }
        },
    }
}

async fn ingest_all(tutor: &Tutor, collection: &str, docs: &[PathBuf]) -> Result<()> {
    for path in docs {
        let chunks = tutor.ingest_file(collection, path).await?;
        info!(collection, file = %path.display(), chunks, "document ingested");
        println!(
            "{}",
            t!(
                "status.ingested",
                locale = tutor.locale(),
                chunks = chunks,
                file = path.display()
            )
        );
    }
    Ok(())
}

/// One turn. Failures are shown as the localized user-facing message.
async fn ask(session: &mut ChatSession, locale: &str, question: &str) {
    match session.send(question).await {
        Ok(reply) => {
            info!(
                tokens_used = reply.tokens_used,
                context_chunks = reply.context_chunks,
                "turn complete"
            );
            println!("{}", reply.text);
        }
        Err(error) => {
            tracing::error!(error = %error, "chat turn failed");
            eprintln!("{}", error.user_message(locale));
        }
    }
}

async fn run_interactive(mut session: ChatSession, locale: &str) -> Result<()> {
    println!("{}", t!("status.session_hint", locale = locale));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let question = line.trim();
        if question.is_empty() {
            break;
        }
        ask(&mut session, locale, question).await;
    }

    if let Some(progress) = session.progress() {
        println!("\n{}", render_progress(&progress, locale));
    }
    Ok(())
}

async fn print_chunks(file: &Path, max_len: usize) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let text = sanitize_document_text(&text);

    for (index, piece) in chunk(&text, max_len).enumerate() {
        println!("[{index}] ({} chars) {piece}", piece.chars().count());
    }
    Ok(())
}
