//! Class label lists. `NAMES` is the 80-class COCO list both model generations ship with.

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorbike",
    "aeroplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "sofa",
    "pottedplant",
    "bed",
    "diningtable",
    "toilet",
    "tvmonitor",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Reported for class ids the label list doesn't cover.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum LabelsError {
    #[error("failed to read label file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label file {0:?} contains no labels")]
    Empty(PathBuf),
}

/// Ordered class names, indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Arc<[String]>);

impl Labels {
    pub fn coco() -> Self {
        Self(NAMES.iter().map(|s| s.to_string()).collect())
    }

    /// Parses a newline separated list, one label per line.
    pub fn parse(text: &str) -> Self {
        Self(
            text.trim()
                .lines()
                .map(|line| line.trim_end().to_string())
                .collect(),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, LabelsError> {
        let text = std::fs::read_to_string(path).map_err(|source| LabelsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let labels = Self::parse(&text);
        if labels.is_empty() {
            return Err(LabelsError::Empty(path.to_path_buf()));
        }
        log::info!("Loaded {} labels from {path:?}", labels.len());
        Ok(labels)
    }

    pub fn get(&self, class_idx: usize) -> &str {
        self.0.get(class_idx).map(String::as_str).unwrap_or(UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_trims_crlf_and_trailing_blank_lines() {
        let labels = Labels::parse("person\r\nbicycle\r\ncar\n\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(1), "bicycle");
        assert_eq!(labels.get(2), "car");
    }

    #[test]
    fn out_of_range_class_is_unknown() {
        let labels = Labels::parse("person");
        assert_eq!(labels.get(7), UNKNOWN);
    }

    #[test]
    fn coco_has_eighty_classes() {
        let labels = Labels::coco();
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.get(0), "person");
        assert_eq!(labels.get(79), "toothbrush");
    }

    #[test]
    fn from_file_reads_labels() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat\ndog").unwrap();
        let labels = Labels::from_file(file.path()).unwrap();
        assert_eq!(labels.get(0), "cat");
        assert_eq!(labels.get(1), "dog");
    }

    #[test]
    fn from_file_rejects_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("coco.names");
        assert!(matches!(
            Labels::from_file(&missing),
            Err(LabelsError::Read { .. })
        ));

        let empty = dir.path().join("empty.names");
        std::fs::write(&empty, "\n\n").unwrap();
        assert!(matches!(Labels::from_file(&empty), Err(LabelsError::Empty(_))));
    }
}
