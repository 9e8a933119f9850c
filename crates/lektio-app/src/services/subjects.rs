//! Subject resolution against the caller-supplied catalog.
//!
//! The catalog is authoritative: whenever any entry scores positively against
//! the document, its name wins over whatever free text the extractor guessed.
//! The pipeline would rather ask the user to pick a real subject than invent
//! a new one silently.

use serde::{Deserialize, Serialize};

/// A subject already known to the user. Supplied fresh per extraction call
/// and never owned or cached by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Score weights. Name/code literal presence in the document is strong
/// evidence; agreement with the extractor's own guess is stronger still.
const NAME_IN_TEXT_SCORE: usize = 100;
const CODE_IN_TEXT_SCORE: usize = 80;
const GUESS_MATCH_SCORE: usize = 120;

/// Picks the best-matching catalog subject for a document.
///
/// Every entry is scored against the document text and the extracted guess;
/// the top positive scorer's name is adopted (ties keep catalog order). With
/// no positive scorer the guess is returned unchanged, or `None` when there
/// was no guess either. Scoring is deterministic.
pub fn resolve_subject(
    text: &str,
    guess: Option<&str>,
    catalog: &[SubjectCatalogEntry],
) -> Option<String> {
    let text_lower = text.to_lowercase();
    let guess_lower = guess.map(str::to_lowercase);

    let mut scored: Vec<(usize, &SubjectCatalogEntry)> = catalog
        .iter()
        .filter_map(|entry| {
            let score = score_entry(entry, &text_lower, guess_lower.as_deref());
            (score > 0).then_some((score, entry))
        })
        .collect();

    // Stable sort: equal scores keep catalog order, so the first entry wins.
    scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

    match scored.first() {
        Some((_, entry)) => Some(entry.name.clone()),
        None => guess.map(str::to_string),
    }
}

/// Looser bidirectional test deciding whether a candidate subject string
/// corresponds to a known catalog entry at all.
pub fn subject_is_known(candidate: &str, catalog: &[SubjectCatalogEntry]) -> bool {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return false;
    }

    catalog.iter().any(|entry| {
        let name = entry.name.to_lowercase();
        if name.contains(&candidate) || candidate.contains(&name) {
            return true;
        }
        entry.code.as_deref().is_some_and(|code| {
            let code = code.to_lowercase();
            !code.is_empty() && (code.contains(&candidate) || candidate.contains(&code))
        })
    })
}

fn score_entry(entry: &SubjectCatalogEntry, text_lower: &str, guess_lower: Option<&str>) -> usize {
    let name_lower = entry.name.to_lowercase();
    let code_lower = entry
        .code
        .as_deref()
        .map(str::to_lowercase)
        .filter(|code| !code.is_empty());

    let mut score = 0;

    if !name_lower.is_empty() && text_lower.contains(&name_lower) {
        score += NAME_IN_TEXT_SCORE + entry.name.len();
    }

    if let Some(code) = &code_lower {
        if text_lower.contains(code.as_str()) {
            score += CODE_IN_TEXT_SCORE + code.len();
        }
    }

    if let Some(guess) = guess_lower {
        if !guess.is_empty() {
            let matches_name =
                name_lower.contains(guess) || guess.contains(name_lower.as_str());
            let matches_code = code_lower
                .as_deref()
                .is_some_and(|code| code.contains(guess) || guess.contains(code));
            if matches_name || matches_code {
                score += GUESS_MATCH_SCORE;
            }
        }
    }

    score
}
