use serde::Serialize;

/// Index and document type a request for a model is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTarget {
    pub index: String,
    /// Serialized as `type`, the name the engine's request bodies use.
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl SearchTarget {
    /// Address `model` in `index`, falling back to `default_type` when no
    /// model (or an empty one) is given.
    pub fn resolve(index: &str, default_type: &str, model: Option<&str>) -> Self {
        let doc_type = model.filter(|m| !m.is_empty()).unwrap_or(default_type);
        Self {
            index: index.to_owned(),
            doc_type: doc_type.to_owned(),
        }
    }
}
