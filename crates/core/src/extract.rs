//! Heuristic body extraction.
//!
//! Scores candidate elements (tag type, class/id hints, text density, link
//! density), propagates scores to ancestor containers, and returns the best
//! candidate plus qualifying siblings. This is the generic first stage of
//! body selection; the Article-specific fallback lives in [`crate::metadata`].

use std::collections::{HashMap, HashSet};

use ego_tree::NodeId;

use crate::parse::{Document, Element};
use crate::scoring::{ScoreConfig, ScoreResult, calculate_score};
use crate::{KobopressError, Result};

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum score threshold for top candidate
    pub min_score_threshold: f64,
    /// Maximum number of top candidates to track
    pub max_top_candidates: usize,
    /// Minimum character threshold for content
    pub char_threshold: usize,
    /// Maximum elements to consider
    pub max_elements: usize,
    /// Sibling score threshold (multiplier of top score)
    pub sibling_threshold: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 10.0,
            max_top_candidates: 5,
            char_threshold: 500,
            max_elements: 1000,
            sibling_threshold: 0.2,
        }
    }
}

/// A candidate element with its score
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// The element itself
    pub element: Element<'a>,
    /// The calculated score result
    pub score_result: ScoreResult,
}

impl<'a> Candidate<'a> {
    fn new(element: Element<'a>, score_result: ScoreResult) -> Self {
        Self { element, score_result }
    }

    fn score(&self) -> f64 {
        self.score_result.final_score
    }
}

/// The result of content extraction
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// The extracted HTML markup
    pub content: String,
    /// The top candidate score
    pub top_score: f64,
    /// Number of elements extracted
    pub element_count: usize,
}

/// Tags that are considered potential content containers
const CANDIDATE_TAGS: &[&str] = &["div", "article", "section", "main", "p", "td", "pre", "blockquote"];

/// Identify all candidate elements from the document
fn identify_candidates<'a>(
    doc: &'a Document, config: &ExtractConfig, score_config: &ScoreConfig,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();
    let max_elements = if config.max_elements == 0 { usize::MAX } else { config.max_elements };
    let mut scanned = 0usize;

    for tag in CANDIDATE_TAGS {
        if let Ok(elements) = doc.select(tag) {
            for element in elements {
                if scanned >= max_elements {
                    return candidates;
                }
                scanned += 1;
                let tag_name = element.tag_name();
                let text = element.text();
                if !matches!(tag_name.as_str(), "article" | "section" | "main")
                    && text.chars().count() < config.char_threshold / 10
                {
                    continue;
                }

                let score_result = calculate_score(&element, score_config);
                candidates.push(Candidate::new(element, score_result));
            }
        }
    }

    candidates
}

/// Tags whose scores propagate upward to their containers
const PARAGRAPH_TAGS: &[&str] = &["p", "td", "pre", "blockquote"];

/// Propagate scores from paragraph-like candidates to their ancestors
///
/// Each positively scored paragraph, table cell, pre block, or blockquote
/// contributes candidate_score / 2 to its parent and candidate_score / 3 to
/// its grandparent, accumulated across all such candidates. The distance
/// decay makes the nearest container of the text win over page-level
/// wrappers, and the accumulation surfaces that container even when it
/// carries no class or id hints, which is the normal shape of
/// script-rendered pages where every class is a style hash. Ancestors not
/// already in the candidate list are scored and appended.
fn propagate_scores<'a>(candidates: &mut Vec<Candidate<'a>>, score_config: &ScoreConfig) {
    let seen: HashSet<NodeId> = candidates.iter().map(|c| c.element.node_id()).collect();
    let mut boosts: HashMap<NodeId, f64> = HashMap::new();
    let mut discovered: HashMap<NodeId, Element<'a>> = HashMap::new();

    for candidate in candidates.iter() {
        let candidate_score = candidate.score();
        if candidate_score <= 0.0 || !PARAGRAPH_TAGS.contains(&candidate.element.tag_name().as_str()) {
            continue;
        }

        let mut ancestor = candidate.element.parent_element();
        let mut divisor = 2.0;
        while let Some(parent) = ancestor {
            if divisor > 3.0 {
                break;
            }
            let id = parent.node_id();
            *boosts.entry(id).or_insert(0.0) += candidate_score / divisor;
            if !seen.contains(&id) {
                discovered.entry(id).or_insert_with(|| parent.clone());
            }
            ancestor = parent.parent_element();
            divisor += 1.0;
        }
    }

    for candidate in candidates.iter_mut() {
        if let Some(boost) = boosts.get(&candidate.element.node_id()) {
            candidate.score_result.final_score += boost;
        }
    }

    for (id, element) in discovered {
        let mut score_result = calculate_score(&element, score_config);
        if let Some(boost) = boosts.get(&id) {
            score_result.final_score += boost;
        }
        candidates.push(Candidate::new(element, score_result));
    }
}

/// Select the top candidate from the list
///
/// Returns the highest scoring candidate if it meets the minimum threshold,
/// otherwise returns a NotReadable error.
fn select_top_candidate<'a>(candidates: &'a [Candidate<'a>], config: &ExtractConfig) -> Result<&'a Candidate<'a>> {
    if candidates.is_empty() {
        return Err(KobopressError::NoContent);
    }

    let top_candidate = candidates
        .iter()
        .max_by(|a, b| compare_candidates(a, b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap();

    if top_candidate.score() < config.min_score_threshold {
        return Err(KobopressError::NotReadable { score: top_candidate.score(), threshold: config.min_score_threshold });
    }

    Ok(top_candidate)
}

/// Select siblings that should be included with the top candidate
///
/// Siblings are included if:
/// - They share the same parent as the top candidate
/// - Their score is >= top_score * sibling_threshold
/// - For P tags: link_density < 0.25 and text_length > 80 chars
fn select_siblings<'a>(
    top_candidate: &Candidate<'a>, candidates: &[Candidate<'a>], config: &ExtractConfig,
) -> Vec<Element<'a>> {
    let mut siblings = Vec::new();
    let top_score = top_candidate.score();
    let top_id = top_candidate.element.node_id();
    let top_parent = match top_candidate.element.parent_element() {
        Some(parent) => parent.node_id(),
        None => return siblings,
    };

    let mut included: HashSet<NodeId> = HashSet::new();
    for candidate in candidates {
        let id = candidate.element.node_id();
        if id == top_id || included.contains(&id) {
            continue;
        }
        if candidate.score() < top_score * config.sibling_threshold {
            continue;
        }
        let same_parent =
            candidate.element.parent_element().is_some_and(|parent| parent.node_id() == top_parent);
        if !same_parent {
            continue;
        }

        if candidate.element.tag_name() == "p" {
            let text = candidate.element.text();
            if text.chars().count() > 80 && crate::scoring::link_density(&candidate.element) < 0.25 {
                included.insert(id);
                siblings.push(candidate.element.clone());
            }
        } else {
            included.insert(id);
            siblings.push(candidate.element.clone());
        }
    }

    siblings
}

/// Extract the main content from a document
///
/// This is the main entry point for heuristic extraction. It:
/// 1. Identifies candidate elements
/// 2. Propagates scores to ancestor containers
/// 3. Selects the top candidate
/// 4. Includes qualifying siblings
///
/// # Errors
///
/// Returns [`KobopressError::NoContent`] when the document yields no
/// candidates at all, and [`KobopressError::NotReadable`] when the best
/// candidate scores below `config.min_score_threshold`. Both are soft
/// failures that callers answer with the fallback container lookup.
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    let score_config = ScoreConfig::default();

    let mut candidates = identify_candidates(doc, config, &score_config);
    propagate_scores(&mut candidates, &score_config);

    candidates.sort_by(|a, b| compare_candidates(b, a).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(config.max_top_candidates);

    let top_candidate = select_top_candidate(&candidates, config)?;
    let siblings = select_siblings(top_candidate, &candidates, config);

    let mut content = String::new();
    content.push_str(&top_candidate.element.outer_html());

    for sibling in &siblings {
        content.push('\n');
        content.push_str(&sibling.outer_html());
    }

    let element_count = 1 + siblings.len();

    Ok(ExtractedContent { content, top_score: top_candidate.score(), element_count })
}

fn compare_candidates<'a>(a: &Candidate<'a>, b: &Candidate<'a>) -> Option<std::cmp::Ordering> {
    let score_order = a.score().partial_cmp(&b.score())?;
    if score_order != std::cmp::Ordering::Equal {
        return Some(score_order);
    }

    let a_tag = a.element.tag_name();
    let b_tag = b.element.tag_name();
    let tag_order = candidate_priority(&a_tag).cmp(&candidate_priority(&b_tag));
    if tag_order != std::cmp::Ordering::Equal {
        return Some(tag_order);
    }

    let a_len = a.element.text().chars().count();
    let b_len = b.element.text().chars().count();
    Some(a_len.cmp(&b_len))
}

fn candidate_priority(tag_name: &str) -> u8 {
    match tag_name {
        "article" | "main" | "section" => 3,
        "div" => 2,
        _ => 1,
    }
}
