//! Garment identification facets and label selection.
//!
//! The backend returns ranked candidates per facet. The session keeps those
//! candidates next to the currently selected value, which starts out as the
//! top-ranked suggestion and may be overridden before saving.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel used when the backend offers no candidate for a facet.
pub const UNKNOWN_LABEL: &str = "unknown";

/// One independent classification dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    ClothingType,
    Colour,
    Pattern,
    Style,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::ClothingType => "clothing_type",
            Facet::Colour => "colour",
            Facet::Pattern => "pattern",
            Facet::Style => "style",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A suggested label with the backend's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub confidence: f32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Ranked candidates for all four facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FacetCandidates {
    #[serde(default)]
    pub clothing_type: Vec<Candidate>,
    #[serde(default)]
    pub colors: Vec<Candidate>,
    #[serde(default)]
    pub pattern: Vec<Candidate>,
    #[serde(default)]
    pub style: Vec<Candidate>,
}

impl FacetCandidates {
    /// Drop blank labels and order each facet by descending confidence.
    ///
    /// Ties keep the backend's order.
    pub fn ranked(mut self) -> Self {
        for list in [
            &mut self.clothing_type,
            &mut self.colors,
            &mut self.pattern,
            &mut self.style,
        ] {
            list.retain(|c| !c.label.trim().is_empty());
            list.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            });
        }
        self
    }

    pub fn get(&self, facet: Facet) -> &[Candidate] {
        match facet {
            Facet::ClothingType => &self.clothing_type,
            Facet::Colour => &self.colors,
            Facet::Pattern => &self.pattern,
            Facet::Style => &self.style,
        }
    }
}

/// How many top candidates are preselected per facet.
///
/// Single-valued facets always take the top candidate; the colour facet is
/// multi-valued and takes up to `colour_top_n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreselectPolicy {
    pub colour_top_n: usize,
}

impl Default for PreselectPolicy {
    fn default() -> Self {
        Self { colour_top_n: 1 }
    }
}

impl PreselectPolicy {
    fn top(candidates: &[Candidate]) -> String {
        candidates
            .first()
            .map(|c| c.label.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    fn top_colours(&self, candidates: &[Candidate]) -> Vec<String> {
        let picked: Vec<String> = candidates
            .iter()
            .take(self.colour_top_n.max(1))
            .map(|c| c.label.clone())
            .collect();
        if picked.is_empty() {
            vec![UNKNOWN_LABEL.to_string()]
        } else {
            picked
        }
    }
}

/// Label vocabularies offered by the backend for each facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FashionOptions {
    #[serde(default)]
    pub clothing_types: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
}

impl FashionOptions {
    pub fn labels(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::ClothingType => &self.clothing_types,
            Facet::Colour => &self.colors,
            Facet::Pattern => &self.patterns,
            Facet::Style => &self.styles,
        }
    }

    /// Whether `label` may be chosen for `facet`. An empty vocabulary
    /// accepts anything.
    pub fn offers(&self, facet: Facet, label: &str) -> bool {
        let labels = self.labels(facet);
        labels.is_empty() || labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// User overrides for one or more facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl LabelUpdate {
    pub fn is_empty(&self) -> bool {
        self.clothing_type.is_none()
            && self.colors.is_none()
            && self.pattern.is_none()
            && self.style.is_none()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{label}' is not an offered {facet} label")]
pub struct LabelError {
    pub facet: Facet,
    pub label: String,
}

/// Candidates plus the currently selected value per facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    pub candidates: FacetCandidates,
    pub clothing_type: String,
    pub colors: Vec<String>,
    pub pattern: String,
    pub style: String,
}

impl IdentificationResult {
    /// Rank the candidates and preselect per `policy`.
    pub fn from_candidates(candidates: FacetCandidates, policy: &PreselectPolicy) -> Self {
        let candidates = candidates.ranked();
        Self {
            clothing_type: PreselectPolicy::top(&candidates.clothing_type),
            colors: policy.top_colours(&candidates.colors),
            pattern: PreselectPolicy::top(&candidates.pattern),
            style: PreselectPolicy::top(&candidates.style),
            candidates,
        }
    }

    /// Facets whose selected value is empty.
    pub fn missing_facets(&self) -> Vec<Facet> {
        let mut missing = Vec::new();
        if self.clothing_type.trim().is_empty() {
            missing.push(Facet::ClothingType);
        }
        if self.colors.iter().all(|c| c.trim().is_empty()) {
            missing.push(Facet::Colour);
        }
        if self.pattern.trim().is_empty() {
            missing.push(Facet::Pattern);
        }
        if self.style.trim().is_empty() {
            missing.push(Facet::Style);
        }
        missing
    }

    /// All four facets resolved.
    pub fn is_complete(&self) -> bool {
        self.missing_facets().is_empty()
    }

    /// Apply user overrides. Nothing changes if any override is rejected.
    pub fn apply(
        &mut self,
        update: LabelUpdate,
        options: Option<&FashionOptions>,
    ) -> Result<(), LabelError> {
        let check = |facet: Facet, label: &str| -> Result<(), LabelError> {
            match options {
                Some(opts) if !label.trim().is_empty() && !opts.offers(facet, label) => {
                    Err(LabelError {
                        facet,
                        label: label.to_string(),
                    })
                }
                _ => Ok(()),
            }
        };

        if let Some(ref t) = update.clothing_type {
            check(Facet::ClothingType, t)?;
        }
        if let Some(ref colours) = update.colors {
            for c in colours {
                check(Facet::Colour, c)?;
            }
        }
        if let Some(ref p) = update.pattern {
            check(Facet::Pattern, p)?;
        }
        if let Some(ref s) = update.style {
            check(Facet::Style, s)?;
        }

        if let Some(t) = update.clothing_type {
            self.clothing_type = t.trim().to_string();
        }
        if let Some(colours) = update.colors {
            let mut deduped: Vec<String> = Vec::with_capacity(colours.len());
            for c in colours.into_iter().map(|c| c.trim().to_string()) {
                if !c.is_empty() && !deduped.contains(&c) {
                    deduped.push(c);
                }
            }
            self.colors = deduped;
        }
        if let Some(p) = update.pattern {
            self.pattern = p.trim().to_string();
        }
        if let Some(s) = update.style {
            self.style = s.trim().to_string();
        }
        Ok(())
    }
}
