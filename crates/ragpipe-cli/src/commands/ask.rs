//! Ask command

use super::{load_snapshot, snapshot_path};
use crate::app::{AskArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use ragpipe_core::llm::{Generator, LlmPlanner, PassthroughPlanner, Planner};
use ragpipe_core::{
    Config, HttpEmbedder, HttpGenerator, Orchestrator, OrchestratorOptions, QueryStage, Retriever,
};
use std::sync::Arc;

pub async fn run(args: AskArgs, config: &Config, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.join(" ");

    let mut options = OrchestratorOptions::from_config(config)?;
    if let Some(k) = args.k {
        options.k = k;
    }
    if let Some(mode) = args.mode {
        options.aggregation = mode.into();
    }
    let k = options.k;

    let index = load_snapshot(&snapshot_path(args.snapshot))?;
    let embedder = HttpEmbedder::from_config(config.llm_service.clone())?;
    let retriever = Retriever::new(Arc::new(embedder), Arc::new(index))
        .with_retry(options.retry.clone());

    let generator: Arc<dyn Generator> =
        Arc::new(HttpGenerator::from_config(config.llm_service.clone())?);
    let planner: Arc<dyn Planner> = if args.no_plan {
        Arc::new(PassthroughPlanner)
    } else {
        Arc::new(LlmPlanner::new(generator.clone()))
    };

    let mut orchestrator =
        Orchestrator::new(planner, Arc::new(retriever), generator).with_options(options);
    if verbose {
        orchestrator = orchestrator.with_observer(print_stage);
    }

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let report = orchestrator.answer_until(&question, k, shutdown).await?;

    output::print_report(&report, format)?;
    Ok(())
}

fn print_stage(stage: &QueryStage) {
    match stage {
        QueryStage::Decomposed {
            sub_questions,
            fallback,
        } => {
            if *fallback {
                eprintln!("[decomposed] no sub-questions, answering directly");
            } else {
                eprintln!("[decomposed] {} sub-questions", sub_questions.len());
                for (i, q) in sub_questions.iter().enumerate() {
                    eprintln!("  {}. {}", i + 1, q);
                }
            }
        }
        QueryStage::Retrieving {
            position,
            sub_question,
        } => eprintln!("[retrieving] #{} {}", position + 1, sub_question),
        QueryStage::Answering { position } => eprintln!("[answering] #{}", position + 1),
        QueryStage::Failed { error } => eprintln!("[failed] {}", error),
        other => eprintln!("[{}]", other.name()),
    }
}
