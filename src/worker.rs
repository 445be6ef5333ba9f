//! Async worker request/response contract (spec.md §6): the shape a
//! background-executor transport wraps around the orchestrator. Transport
//! mechanics themselves are out of scope (spec.md §1); only the envelope
//! is specified here.

use rayon::prelude::*;
use uuid::Uuid;

use crate::config::ParseOptions;
use crate::error::BeatParserError;
use crate::orchestrator::{BeatParser, Stage, StreamProgress};
use crate::types::ParseResult;

/// One worker request. `correlation_id` ties a response (and any progress
/// messages) back to this request.
pub enum WorkerRequest {
    ParseBuffer {
        correlation_id: Uuid,
        samples: Vec<f32>,
        options: ParseOptions,
        timeout_ms: Option<u64>,
    },
    ParseStream {
        correlation_id: Uuid,
        chunks: tokio::sync::mpsc::Receiver<Vec<f32>>,
        options: ParseOptions,
        timeout_ms: Option<u64>,
    },
    ParseBatch {
        correlation_id: Uuid,
        buffers: Vec<Vec<f32>>,
        options: ParseOptions,
        timeout_ms: Option<u64>,
    },
}

#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&BeatParserError> for ErrorInfo {
    fn from(err: &BeatParserError) -> Self {
        Self {
            code: error_code(err).to_string(),
            message: err.user_message(),
        }
    }
}

fn error_code(err: &BeatParserError) -> &'static str {
    match err {
        BeatParserError::Audio(_) => "invalid_audio",
        BeatParserError::Config(_) => "invalid_config",
        BeatParserError::Format(_) => "invalid_format",
        BeatParserError::DecoderFailure(_) => "decoder_failure",
        BeatParserError::PluginFailure { .. } => "plugin_failure",
        BeatParserError::StreamAborted(_) => "stream_aborted",
        BeatParserError::ComputationFailure { .. } => "computation_failure",
        BeatParserError::FileNotFound(_) => "file_not_found",
        BeatParserError::Io(_) => "io_error",
        BeatParserError::Generic(_) => "generic_error",
    }
}

pub enum WorkerOutcome {
    Result(ParseResult),
    Error(ErrorInfo),
    /// Per-buffer outcomes of a `ParseBatch` request, in input order.
    BatchResult(Vec<Result<ParseResult, ErrorInfo>>),
}

pub struct WorkerResponse {
    pub correlation_id: Uuid,
    pub outcome: WorkerOutcome,
}

/// A worker progress message, carrying the same correlation id as its
/// request.
pub struct ProgressMessage {
    pub correlation_id: Uuid,
    pub percentage: f32,
    pub stage: Stage,
}

/// Handle a single request against `parser`, honoring its optional
/// timeout (spec.md §5 "Cancellation and timeouts": expiry discards
/// partial state, no checkpointing).
pub async fn handle_request(
    parser: &BeatParser,
    request: WorkerRequest,
    progress_tx: Option<tokio::sync::mpsc::Sender<ProgressMessage>>,
) -> WorkerResponse {
    match request {
        WorkerRequest::ParseBuffer {
            correlation_id,
            samples,
            options,
            timeout_ms,
        } => {
            let outcome = run_with_timeout(timeout_ms, parser.parse_buffer(&samples, &options)).await;
            respond(correlation_id, outcome)
        }
        WorkerRequest::ParseStream {
            correlation_id,
            chunks,
            options,
            timeout_ms,
        } => {
            let stream_progress = progress_tx.map(|tx| {
                let (inner_tx, mut inner_rx) = tokio::sync::mpsc::channel::<StreamProgress>(16);
                tokio::spawn(async move {
                    while let Some(p) = inner_rx.recv().await {
                        let _ = tx
                            .send(ProgressMessage {
                                correlation_id,
                                percentage: 0.0,
                                stage: p.stage,
                            })
                            .await;
                    }
                });
                inner_tx
            });

            let outcome = run_with_timeout(
                timeout_ms,
                parser.parse_stream(chunks, &options, stream_progress),
            )
            .await;
            respond(correlation_id, outcome)
        }
        WorkerRequest::ParseBatch {
            correlation_id,
            buffers,
            options,
            timeout_ms: _,
        } => {
            let results = parse_batch(parser, &buffers, &options).await;
            let mapped: Vec<Result<ParseResult, ErrorInfo>> = results
                .into_iter()
                .map(|r| r.map_err(|e| ErrorInfo::from(&e)))
                .collect();
            WorkerResponse {
                correlation_id,
                outcome: WorkerOutcome::BatchResult(mapped),
            }
        }
    }
}

async fn run_with_timeout<F>(
    timeout_ms: Option<u64>,
    future: F,
) -> Result<ParseResult, BeatParserError>
where
    F: std::future::Future<Output = Result<ParseResult, BeatParserError>>,
{
    match timeout_ms {
        Some(ms) => tokio::time::timeout(std::time::Duration::from_millis(ms), future)
            .await
            .unwrap_or_else(|_| Err(BeatParserError::StreamAborted("timed out".into()))),
        None => future.await,
    }
}

fn respond(correlation_id: Uuid, outcome: Result<ParseResult, BeatParserError>) -> WorkerResponse {
    WorkerResponse {
        correlation_id,
        outcome: match outcome {
            Ok(result) => WorkerOutcome::Result(result),
            Err(err) => WorkerOutcome::Error(ErrorInfo::from(&err)),
        },
    }
}

/// Fan independent buffers out across a `rayon` thread pool (spec.md §5:
/// across distinct parses there is no ordering relation, so a batch may
/// process concurrently even though within one parse nothing does).
async fn parse_batch(
    parser: &BeatParser,
    buffers: &[Vec<f32>],
    options: &ParseOptions,
) -> Vec<Result<ParseResult, BeatParserError>> {
    let handle = tokio::runtime::Handle::current();

    tokio::task::block_in_place(|| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_cpus::get())
            .build()
            .expect("failed to build batch worker pool");

        pool.install(|| {
            buffers
                .par_iter()
                .map(|buf| handle.block_on(parser.parse_buffer(buf, options)))
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;

    #[tokio::test]
    async fn parse_buffer_request_round_trips_correlation_id() {
        let parser = BeatParser::new(ParseConfig::default()).unwrap();
        let id = Uuid::new_v4();
        let request = WorkerRequest::ParseBuffer {
            correlation_id: id,
            samples: vec![0.0; 4096],
            options: ParseOptions::default(),
            timeout_ms: None,
        };
        let response = handle_request(&parser, request, None).await;
        assert_eq!(response.correlation_id, id);
        assert!(matches!(response.outcome, WorkerOutcome::Result(_)));
    }

    #[tokio::test]
    async fn error_info_carries_a_message() {
        let err = BeatParserError::Audio(crate::error::AudioError::Empty);
        let info = ErrorInfo::from(&err);
        assert_eq!(info.code, "invalid_audio");
        assert!(!info.message.is_empty());
    }

    #[tokio::test]
    async fn parse_batch_returns_each_buffers_own_result() {
        let parser = BeatParser::new(ParseConfig::default()).unwrap();
        let id = Uuid::new_v4();
        let request = WorkerRequest::ParseBatch {
            correlation_id: id,
            buffers: vec![vec![0.1; 4096], vec![], vec![0.2; 8192]],
            options: ParseOptions::default(),
            timeout_ms: None,
        };
        let response = handle_request(&parser, request, None).await;
        assert_eq!(response.correlation_id, id);
        match response.outcome {
            WorkerOutcome::BatchResult(results) => {
                assert_eq!(results.len(), 3);
                assert!(results[0].is_ok());
                assert!(results[1].is_err());
                assert!(results[2].is_ok());
                assert_ne!(
                    results[0].as_ref().unwrap().metadata.samples_processed,
                    0
                );
            }
            _ => panic!("expected WorkerOutcome::BatchResult"),
        }
    }
}
