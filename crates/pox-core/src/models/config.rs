//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the pox pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoxConfig {
    /// Text source configuration.
    pub source: SourceConfig,

    /// OCR model configuration.
    pub ocr: OcrConfig,

    /// Block segmentation configuration.
    pub segmentation: SegmentationConfig,

    /// Line-item extraction configuration.
    pub line_items: LineItemConfig,

    /// Annotation configuration.
    pub annotation: AnnotationConfig,

    /// Artifact output configuration.
    pub output: OutputConfig,
}

/// Text source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Fall back to OCR when the text layer is empty.
    pub enable_ocr: bool,

    /// Minimum non-whitespace characters for the text layer to be used.
    /// The default of 1 means "empty or whitespace-only triggers OCR".
    pub min_text_chars: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enable_ocr: true,
            min_text_chars: 1,
        }
    }
}

/// OCR model files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with a space.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Full path to the detection model.
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    /// Full path to the recognition model.
    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_model)
    }

    /// Full path to the character dictionary.
    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary)
    }

    /// Whether all model files are present on disk.
    pub fn models_present(&self) -> bool {
        self.detection_path().exists()
            && self.recognition_path().exists()
            && self.dictionary_path().exists()
    }
}

/// How block boundaries are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMode {
    /// Split before every occurrence of the marker, anywhere in the text.
    #[default]
    Inline,
    /// Split only before lines that start with the marker.
    LineStart,
}

/// Block segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Boundary detection mode.
    pub mode: SegmentMode,

    /// Marker phrase, matched case-insensitively.
    pub marker: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            mode: SegmentMode::Inline,
            marker: "Purchase Order".to_string(),
        }
    }
}

/// Line-item pattern family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// `<desc> - Qty: <n> - Unit Price: <amount>`
    Labeled,
    /// `<desc> <qty> <amount>`
    Tabular,
    /// `<desc> | <qty> | <amount>` (pipes or tabs)
    Delimited,
}

/// Line-item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemConfig {
    /// Join wrapped item rows before matching.
    pub merge_wrapped_lines: bool,

    /// Maximum continuation lines appended to one item row.
    pub max_continuation_lines: usize,

    /// Matchers in priority order; the first match wins per line.
    pub matchers: Vec<MatcherKind>,
}

impl Default for LineItemConfig {
    fn default() -> Self {
        Self {
            merge_wrapped_lines: true,
            max_continuation_lines: 2,
            matchers: vec![
                MatcherKind::Labeled,
                MatcherKind::Tabular,
                MatcherKind::Delimited,
            ],
        }
    }
}

/// Annotation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Produce an annotated copy at all.
    pub enabled: bool,

    /// Only the first block's record is annotated. Other values are ignored.
    pub first_block_only: bool,

    /// RGB color of header-field highlights (0.0 - 1.0).
    pub highlight_color: [f32; 3],

    /// RGB color of line-item description outlines (0.0 - 1.0).
    pub outline_color: [f32; 3],
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            first_block_only: true,
            highlight_color: [1.0, 1.0, 0.0],
            outline_color: [1.0, 0.0, 0.0],
        }
    }
}

/// Table artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    #[default]
    Xlsx,
    Csv,
}

impl TableFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Xlsx => "xlsx",
            TableFormat::Csv => "csv",
        }
    }
}

/// Artifact output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format of the two table artifacts.
    pub table_format: TableFormat,

    /// File name of the zip bundle.
    pub bundle_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_format: TableFormat::Xlsx,
            bundle_name: "PO_Extraction_Outputs.zip".to_string(),
        }
    }
}

impl PoxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PoxConfig =
            serde_json::from_str(r#"{"segmentation": {"mode": "line_start"}}"#).unwrap();

        assert_eq!(config.segmentation.mode, SegmentMode::LineStart);
        assert_eq!(config.segmentation.marker, "Purchase Order");
        assert!(config.source.enable_ocr);
        assert_eq!(config.line_items.matchers.len(), 3);
        assert_eq!(config.output.table_format, TableFormat::Xlsx);
    }

    #[test]
    fn test_matcher_order_round_trips_through_json() {
        let json = r#"{"line_items": {"matchers": ["tabular", "labeled"]}}"#;
        let config: PoxConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.line_items.matchers,
            vec![MatcherKind::Tabular, MatcherKind::Labeled]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("pox-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = PoxConfig::default();
        config.output.table_format = TableFormat::Csv;
        config.save(&path).unwrap();

        let loaded = PoxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.output.table_format, TableFormat::Csv);

        std::fs::remove_dir_all(&dir).ok();
    }
}
