use moodreel_core::pipeline::{AnalysisError, BuildError};
use moodreel_core::{Analyzer, AnalyzerConfig, AttributeResult};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Adapter availability fixed at startup, reported by the health endpoint.
#[derive(Clone, Copy)]
pub struct EngineStatus {
    pub emotion_model: bool,
    pub age_gender_model: bool,
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Analyze {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Result<AttributeResult, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Run the attribute pipeline on raw uploaded image bytes.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<AttributeResult, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Analyze {
                bytes,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the inference engine on a dedicated OS thread.
///
/// Builds the analyzer synchronously (fail-fast for the cascade model and
/// for schema mismatches; degraded mode for absent classifiers), then
/// enters a request loop. The thread owns both ONNX sessions, so model
/// access is serialized without locks. If a caller gave up waiting, the
/// reply send fails and the result is dropped.
pub fn spawn_engine(config: &AnalyzerConfig) -> Result<(EngineHandle, EngineStatus), BuildError> {
    let mut analyzer = Analyzer::new(config)?;
    let status = EngineStatus {
        emotion_model: analyzer.emotion_available(),
        age_gender_model: analyzer.age_gender_available(),
    };

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("moodreel-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Analyze { bytes, reply } => {
                        let result = analyzer.analyze_bytes(&bytes).map_err(EngineError::from);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok((EngineHandle { tx }, status))
}
