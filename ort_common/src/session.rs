use std::path::Path;

use ort::execution_providers::CPUExecutionProvider;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::builder::SessionBuilder;

/// Registers the execution provider with the global ort environment.
/// Returns the provider's name for logging.
pub fn init_runtime(cuda: bool) -> anyhow::Result<&'static str> {
    let (ep, ep_name) = if cuda {
        (CUDAExecutionProvider::default().build(), "cuda")
    } else {
        (CPUExecutionProvider::default().build(), "cpu")
    };
    // NB: cuda may silently fall back to cpu when the provider can't be loaded.
    ort::init().with_execution_providers([ep]).commit()?;
    Ok(ep_name)
}

pub fn load_session(model: &Path) -> anyhow::Result<Session> {
    let session = SessionBuilder::new()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(model)?;
    log::debug!("{session:?}");
    Ok(session)
}
