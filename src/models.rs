use serde::{Deserialize, Serialize};

/// One row of a DKPro-style annotation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRow {
    #[serde(rename = "ParagraphId")]
    pub paragraph_id: usize,
    #[serde(rename = "TokenId")]
    pub token_id: usize,
    #[serde(rename = "Lemma")]
    pub lemma: String,
    #[serde(rename = "CPOS")]
    pub cpos: String,
    #[serde(rename = "NamedEntity")]
    pub named_entity: String,
}

/// A document's text together with the label it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDocument {
    pub label: String,
    pub text: String,
}

impl LabeledDocument {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        LabeledDocument {
            label: label.into(),
            text: text.into(),
        }
    }
}
