use crate::Formula;

/// `premise ⇒ conclusion` with a confidence in `[0, 1]` and a provenance tag
/// (§4.3). Rule names are unique within a [`crate::LogicEngine`]; re-adding a
/// name replaces the existing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicationRule {
    pub name: String,
    pub premise: Formula,
    pub conclusion: Formula,
    pub confidence: f32,
    pub source: String,
}

impl ImplicationRule {
    pub fn new(name: impl Into<String>, premise: Formula, conclusion: Formula, confidence: f32, source: impl Into<String>) -> Self {
        ImplicationRule {
            name: name.into(),
            premise,
            conclusion,
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
        }
    }
}
