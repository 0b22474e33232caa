use crate::cli::commands::{Cli, Commands, SessionCommands};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tastekit::Config;
use tastekit::core::taste::{
    BeliefState, CatalogScorer, ElicitationEngine, JsonCatalog, ProfileTextualizer, TasteSchema,
    beliefs_from_json, create_embedding_provider,
};
use tastekit::sessions::{SessionManager, SqliteSessionStore};

use super::quiz;
use super::render;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let schema = Arc::new(
        TasteSchema::resolve(&config.elicitation.bank)
            .with_context(|| format!("failed to load question bank {}", config.elicitation.bank))?,
    );
    tracing::debug!(bank = %schema.name, axes = schema.space().len(), "question bank loaded");

    match cli.command {
        Commands::Quiz {
            catalog,
            top_k,
            resume,
        } => {
            let manager = session_manager(&config, &schema)?;
            let beliefs = quiz::run(&manager, resume.as_deref())?;
            match config.catalog_path(catalog.as_deref()) {
                Some(path) => {
                    let scorer = scorer(&config, &schema, path);
                    let top_k = top_k.unwrap_or(config.scoring.top_k);
                    let ranking = scorer.rank(&beliefs, top_k).await;
                    print!("{}", render::ranking(&ranking));
                }
                None => println!("{}", t!("quiz.no_catalog")),
            }
            Ok(())
        }

        Commands::Questions => {
            print!("{}", render::questions(&schema));
            Ok(())
        }

        Commands::Keywords { profile } => {
            let beliefs = load_profile(&profile, &config, &schema)?;
            let query = ProfileTextualizer::new(&schema).textualize(&beliefs);
            println!("{}", query.text());
            Ok(())
        }

        Commands::Rank {
            profile,
            catalog,
            top_k,
            json,
        } => {
            let beliefs = load_profile(&profile, &config, &schema)?;
            let Some(path) = config.catalog_path(catalog.as_deref()) else {
                bail!("{}", t!("rank.no_catalog"));
            };
            let scorer = scorer(&config, &schema, path);
            let ranking = scorer
                .rank(&beliefs, top_k.unwrap_or(config.scoring.top_k))
                .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&ranking)?);
            } else {
                print!("{}", render::ranking(&ranking));
            }
            Ok(())
        }

        Commands::Sessions { session_command } => {
            let manager = session_manager(&config, &schema)?;
            match session_command {
                SessionCommands::List => {
                    print!("{}", render::sessions(&manager.stored()?));
                }
                SessionCommands::Show { id } => {
                    let snapshot = manager.snapshot(&id)?;
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                SessionCommands::Delete { id } => {
                    if manager.delete(&id)? {
                        println!("{}", t!("sessions.deleted", id = id));
                    } else {
                        bail!("{}", t!("sessions.not_found", id = id));
                    }
                }
            }
            Ok(())
        }
    }
}

fn session_manager(config: &Config, schema: &Arc<TasteSchema>) -> Result<SessionManager> {
    let engine = Arc::new(ElicitationEngine::new(
        Arc::clone(schema),
        config.elicitation.clone(),
    ));
    if !config.sessions.persist {
        return Ok(SessionManager::new(engine));
    }
    let store = SqliteSessionStore::new(&config.sessions_db_path())?;
    Ok(SessionManager::with_store(engine, Arc::new(store)))
}

fn scorer(config: &Config, schema: &Arc<TasteSchema>, catalog: PathBuf) -> CatalogScorer {
    let embedder = create_embedding_provider(&config.embedding);
    tracing::debug!(
        provider = embedder.name(),
        catalog = %catalog.display(),
        "building scorer"
    );
    CatalogScorer::new(
        Arc::clone(schema),
        Arc::new(JsonCatalog::new(catalog)),
        Arc::from(embedder),
        config.scoring.clone(),
    )
}

fn load_profile(path: &Path, config: &Config, schema: &TasteSchema) -> Result<BeliefState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse profile {}", path.display()))?;
    beliefs_from_json(
        &value,
        schema.space(),
        config.elicitation.sigma_min,
        config.elicitation.sigma_max,
    )
}
