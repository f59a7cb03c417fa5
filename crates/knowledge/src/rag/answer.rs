//! Question answering over the published snapshot.

use crate::highlight::Highlighter;
use crate::rag::synthesizer::Synthesizer;
use crate::rag::types::{AnswerResponse, AskRequest, SourceRef};
use crate::retriever::{RetrieveOptions, Retriever};
use folio_core::AppResult;

/// Answer `request` from the retriever's snapshot.
///
/// Retrieves the best passages, asks the synthesizer for an answer grounded
/// in them and attributes it to each passage with a highlighted snippet.
/// When no passage is retrieved the synthesizer is not called.
pub async fn answer(
    retriever: &Retriever,
    synthesizer: &Synthesizer,
    highlighter: &Highlighter,
    request: &AskRequest,
) -> AppResult<AnswerResponse> {
    tracing::info!("Answering: {}", request.query);

    let options = RetrieveOptions {
        top_k: request.top_k,
        document_ids: request.document_ids.clone(),
    };
    let retrieved = retriever.retrieve(&request.query, &options).await?;
    let snapshot_version = retriever.snapshot_version();

    if retrieved.is_empty() {
        tracing::info!("No passages matched the query");
        return Ok(AnswerResponse::no_information(
            &request.query,
            snapshot_version,
        ));
    }

    let answer = synthesizer.synthesize(&request.query, &retrieved).await?;

    let sources = retrieved
        .iter()
        .map(|r| {
            Ok(SourceRef {
                source_name: r.chunk.source_name.clone(),
                page_number: r.chunk.page_number,
                snippet: highlighter.snippet(
                    &r.chunk.text,
                    &request.query,
                    request.snippet.max_chars,
                    request.snippet.policy,
                )?,
                score: r.score,
                rank: r.rank,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::info!(
        "Answered from {} passage(s) of snapshot v{} via {}",
        sources.len(),
        snapshot_version,
        synthesizer.provider_name()
    );

    Ok(AnswerResponse {
        answer,
        sources,
        snapshot_version,
    })
}
