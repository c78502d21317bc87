use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use docchat::{Container, ContainerConfig, DocumentChunk, SearchQuery};

mod cli;

use cli::ingest::ingest_path;
use cli::{ChatProviderArg, Commands};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.docchat")]
    data_dir: String,

    /// Owner of everything ingested and searched in this run
    #[arg(short, long, global = true, default_value = "local")]
    user: String,

    /// Use deterministic offline embedding and chat providers
    #[arg(long, global = true)]
    mock: bool,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[arg(long, global = true, value_enum, default_value = "openai")]
    chat_provider: ChatProviderArg,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let mut config = ContainerConfig::new(data_dir).with_env_overrides()?;
    config.mock_providers = cli.mock;
    config.memory_storage = cli.memory_storage;
    config.chat_provider = cli.chat_provider.into();

    let container = Container::new(config).await?;
    info!(
        "Using embeddings from {} and answers from {}",
        container.embedding_model(),
        container.chat_model()
    );

    let user = cli.user.as_str();

    match cli.command {
        Commands::Ingest { path, file_type } => {
            let use_case = container.ingest_use_case()?;
            let summary =
                ingest_path(&use_case, Path::new(&path), user, file_type.as_deref()).await?;
            println!(
                "Ingested {} documents ({} chunks, {} embedded, {} failed)",
                summary.documents, summary.chunks, summary.embedded, summary.failed
            );
        }

        Commands::Ask { query, document } => {
            let use_case = container.rag_use_case();
            let answer = match document {
                Some(document_id) => {
                    use_case
                        .answer_for_document(&query, &document_id, user)
                        .await?
                }
                None => use_case.answer(&query, user).await?,
            };

            println!("{}\n", answer.response);
            if answer.has_sources() {
                println!("Sources:");
                for (i, source) in answer.sources.iter().enumerate() {
                    println!(
                        "  [Source {}] {}#{}",
                        i + 1,
                        source.document_id,
                        source.chunk_index
                    );
                    println!("    {}", source.content_preview.replace('\n', " "));
                }
            } else {
                println!("No matching passages in your documents.");
            }
        }

        Commands::Chat { message, system } => {
            let use_case = container.general_chat_use_case();
            let reply = match system {
                Some(prompt) => use_case.respond_with_system_prompt(&message, &prompt).await?,
                None => use_case.respond(&message).await?,
            };
            println!("{}", reply);
        }

        Commands::Search {
            query,
            num,
            hybrid,
            min_score,
            max_score,
        } => {
            let vector_store = container.vector_store();
            let mut search_query = SearchQuery::new(&query)
                .with_limit(num)
                .with_min_score(min_score.unwrap_or(vector_store.retrieval().min_score))
                .with_hybrid(hybrid);
            if let Some(max) = max_score {
                search_query = search_query.with_max_score(max);
            }
            let results = vector_store.search_scored(&search_query, user).await?;

            if results.is_empty() {
                println!("No results found.");
            } else {
                println!("Found {} results:\n", results.len());
                for (i, result) in results.iter().enumerate() {
                    println!(
                        "{}. {} (score: {:.3})",
                        i + 1,
                        result.chunk().location(),
                        result.score()
                    );
                    println!("   | {}", result.chunk().preview(300).replace('\n', " "));
                    println!();
                }
            }
        }

        Commands::List => {
            let documents = container.list_use_case().list(user).await?;

            if documents.is_empty() {
                println!("No documents ingested.");
            } else {
                println!("Documents:\n");
                for document in documents {
                    println!("  {} ({})", document.original_name(), document.id());
                    println!(
                        "    Type: {}, Size: {} bytes",
                        document.file_type(),
                        document.file_size()
                    );
                    println!();
                }
            }
        }

        Commands::Chunks { document_id } => {
            let chunks = container
                .list_use_case()
                .chunks(&document_id, user)
                .await?;
            print_chunks(&chunks);
        }

        Commands::Delete { document_id } => {
            container
                .delete_use_case()
                .execute(&document_id, user)
                .await?;
            println!("Document deleted successfully.");
        }

        Commands::Reembed { document_id } => {
            container.list_use_case().get(&document_id, user).await?;
            let report = container
                .vector_store()
                .generate_embeddings_for_document(&document_id, user)
                .await?;
            println!(
                "Embedded {}/{} chunks.",
                report.processed_chunks, report.total_chunks
            );
        }

        Commands::Forget { document_id } => {
            container.list_use_case().get(&document_id, user).await?;
            let cleared = container
                .vector_store()
                .delete_embeddings_for_document(&document_id, user)
                .await?;
            println!("Cleared {} embeddings.", cleared);
        }
    }

    Ok(())
}

fn print_chunks(chunks: &[DocumentChunk]) {
    if chunks.is_empty() {
        println!("No chunks found.");
        return;
    }
    for chunk in chunks {
        let marker = if chunk.has_embedding() { "*" } else { " " };
        println!(
            "{} {} {}",
            marker,
            chunk.location(),
            chunk.preview(120).replace('\n', " ")
        );
    }
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn max_score_requires_min_score() {
        let res = Cli::try_parse_from(["docchat", "search", "cats", "--max-score", "0.9"]);
        assert!(res.is_err());
    }

    #[test]
    fn chat_provider_parses() {
        let cli = Cli::try_parse_from(["docchat", "--chat-provider", "anthropic", "list"]).unwrap();
        assert_eq!(cli.chat_provider, ChatProviderArg::Anthropic);
        assert_eq!(cli.user, "local");
    }

    #[test]
    fn chat_accepts_custom_system_prompt() {
        let cli =
            Cli::try_parse_from(["docchat", "chat", "hello", "--system", "Be brief."]).unwrap();
        match cli.command {
            Commands::Chat { message, system } => {
                assert_eq!(message, "hello");
                assert_eq!(system.as_deref(), Some("Be brief."));
            }
            _ => panic!("expected chat command"),
        }
    }
}
