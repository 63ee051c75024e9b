//! Answers questions over a small synthetic manual, end to end.
//!
//! Requires a running Ollama instance and a deployed rerank endpoint:
//!
//! ```bash
//! OLLAMA_BASE_URL=http://localhost:11434 \
//! RERANK_URL=http://localhost:8080/rerank \
//! cargo run --example manual_qa
//! ```
//!
//! The corpus is ingested into `manual_chunks.sqlite` on first run;
//! subsequent runs reuse the populated index.

use std::sync::Arc;

use contextsmith::config::{PipelineConfig, ServiceSettings};
use contextsmith::embeddings::OllamaEmbeddings;
use contextsmith::extract::{
    BoundingBox, ElementContent, RawItem, RawPage, StaticDocumentLoader,
};
use contextsmith::generation::OllamaGenerator;
use contextsmith::ingest::IngestionPipeline;
use contextsmith::retrieval::rerank::TeiReranker;
use contextsmith::stores::SqliteVectorIndex;
use contextsmith::QueryEngine;

fn line(text: &str, y0: f32) -> Result<RawItem, contextsmith::extract::ElementError> {
    Ok(RawItem {
        content: ElementContent::Text(text.to_string()),
        bbox: BoundingBox::new(40.0, y0, 560.0, y0 + 12.0),
    })
}

fn sample_manual() -> StaticDocumentLoader {
    StaticDocumentLoader::new(
        "owner-manual.pdf",
        vec![
            RawPage {
                number: 1,
                width: 600.0,
                height: 800.0,
                items: vec![
                    line("Charging the high-voltage battery", 40.0),
                    line("Always use the supplied charging cable.", 56.0),
                    line("Charging from a household socket takes about 9 hours.", 72.0),
                    // Separate section, far below.
                    line("Winter storage", 420.0),
                    line("Keep the state of charge between 40% and 60%.", 436.0),
                ],
            },
            RawPage {
                number: 2,
                width: 600.0,
                height: 800.0,
                items: vec![
                    line("Tire pressure", 40.0),
                    line("Check tire pressure monthly when the tires are cold.", 56.0),
                    line("The recommended pressure is printed on the door jamb.", 72.0),
                ],
            },
        ],
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = ServiceSettings::from_env();
    let Some(rerank_url) = settings.rerank_url.clone() else {
        eprintln!("RERANK_URL is not set; a pairwise scoring endpoint is required.");
        std::process::exit(1);
    };

    let config = PipelineConfig::new(700, 100, 50.0, 10, 3)?;
    let index = Arc::new(SqliteVectorIndex::open("manual_chunks.sqlite").await?);
    let embedder = Arc::new(OllamaEmbeddings::new(
        &settings.base_url,
        settings.embedding_model.clone(),
    )?);

    let ingestion = IngestionPipeline::new(index.clone(), embedder.clone(), config.clone());
    let report = ingestion.ingest(&mut sample_manual()).await?;
    println!(
        "ingest: {} written, {} skipped, already populated: {}",
        report.chunks_written, report.chunks_skipped, report.already_populated
    );

    let engine = QueryEngine::new(
        index,
        embedder,
        Arc::new(TeiReranker::new(&rerank_url)?),
        Arc::new(OllamaGenerator::new(
            &settings.base_url,
            settings.generation_model.clone(),
        )?),
        config,
    );

    let question = "How long does charging from a household socket take?";
    let answer = engine.ask(question).await?;

    println!("\nQ: {}", answer.question);
    println!("A: {}", answer.answer);
    if answer.citations.is_empty() {
        println!("(no sources found)");
    } else {
        println!("Sources:");
        for citation in &answer.citations {
            println!("  - {citation}");
        }
    }
    Ok(())
}
