use serde::de::DeserializeOwned;
use thiserror::Error;

/// A document that failed to deserialize, with the JSON path of the offending node.
#[derive(Debug, Error)]
#[error("at JSON path {path} → {message}")]
pub struct DocumentError {
    pub path: String,
    pub message: String,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_document_error)
}

fn into_document_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> DocumentError {
    let path = err.path().to_string();
    DocumentError { path, message: err.into_inner().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModelDocument;

    #[test]
    fn error_names_the_failing_path() {
        let src = r#"{
            "roots": {"A": {"type": "array", "element": {"type": "primitive", "kind": "text"}}},
            "dependencies": {}
        }"#;
        let err = from_str_with_path::<ModelDocument>(src).unwrap_err();
        assert!(err.path.starts_with("roots.A"), "path was {}", err.path);
    }
}
