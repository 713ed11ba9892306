//! File type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Broad content category of a stored file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_category", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FileCategory {
    /// PDF documents.
    Pdf,
    /// Word-processor documents.
    Word,
    /// Raster and vector images.
    Image,
    /// Plain-text formats.
    Text,
    /// Everything else, including files without an extension.
    Other,
}

impl FileCategory {
    /// Classify a file name by its extension.
    ///
    /// The extension is lower-cased before the table lookup; unknown or
    /// missing extensions map to [`FileCategory::Other`].
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = name.rsplit('.').next().filter(|e| *e != name) else {
            return Self::Other;
        };

        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Word,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => Self::Image,
            "txt" | "md" | "csv" | "log" => Self::Text,
            _ => Self::Other,
        }
    }

    /// Return the category as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "WORD",
            Self::Image => "IMAGE",
            Self::Text => "TEXT",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = stratus_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PDF" => Ok(Self::Pdf),
            "WORD" => Ok(Self::Word),
            "IMAGE" => Ok(Self::Image),
            "TEXT" => Ok(Self::Text),
            "OTHER" => Ok(Self::Other),
            _ => Err(stratus_core::AppError::validation(format!(
                "Invalid file category: '{s}'. Expected one of: PDF, WORD, IMAGE, TEXT, OTHER"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(FileCategory::from_name("a.PDF"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_name("a.pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_name("report.TXT"), FileCategory::Text);
    }

    #[test]
    fn test_unknown_and_missing_extensions() {
        assert_eq!(FileCategory::from_name("a.unknownext"), FileCategory::Other);
        assert_eq!(FileCategory::from_name("noext"), FileCategory::Other);
        assert_eq!(FileCategory::from_name(".hidden"), FileCategory::Other);
    }

    #[test]
    fn test_table() {
        assert_eq!(FileCategory::from_name("memo.docx"), FileCategory::Word);
        assert_eq!(FileCategory::from_name("photo.jpeg"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("notes.md"), FileCategory::Text);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("pdf".parse::<FileCategory>().unwrap(), FileCategory::Pdf);
        assert!("archive".parse::<FileCategory>().is_err());
    }
}
