use std::path::{Path, PathBuf};

use config::{Config, ConfigError};
use ort_common::ModelConfig;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "SMARTEYE";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, videos included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Run inference on every n-th decoded frame.
    pub sample_every: u64,
    /// Where uploads are staged while they decode; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            sample_every: inference_common::sampler::DEFAULT_SAMPLE_EVERY,
            scratch_dir: None,
        }
    }
}

impl AppConfig {
    /// Defaults, overridden by the optional file at `path`, overridden by
    /// `SMARTEYE__<SECTION>__<KEY>` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ort_common::ModelKind;

    #[test]
    fn defaults_bind_all_interfaces_on_5000() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.video.sample_every, 5);
        assert_eq!(config.model.kind, ModelKind::Yolov3Tiny);
        assert_eq!(config.model.confidence_threshold, 0.5);
        assert_eq!(config.model.nms_threshold, 0.3);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smarteye.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[model]
kind = "yolov5n"
path = "models/yolov5n.onnx"

[video]
sample_every = 10
scratch_dir = "/var/tmp/smarteye"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.kind, ModelKind::Yolov5n);
        assert_eq!(config.model.path, Path::new("models/yolov5n.onnx"));
        assert_eq!(config.model.confidence_threshold, 0.5);
        assert_eq!(config.video.sample_every, 10);
        assert_eq!(
            config.video.scratch_dir.as_deref(),
            Some(Path::new("/var/tmp/smarteye"))
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.server.port, AppConfig::default().server.port);
    }
}
