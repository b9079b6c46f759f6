// Candidate → concrete occurrences in a fresh listing
//
// Stored occurrences are tried first. Candidates without usable stored occurrences fall
// back to a fixed chain of progressively looser lookups; the first that finds anything
// wins.

use std::collections::BTreeSet;
use std::fmt;

use crate::analysis::UnwantedElementCandidate;
use crate::analysis::signature::{UNKNOWN_PREFIX, image_prefix, prefix_from_signature};
use crate::diagnostics::Diagnostics;
use crate::listing::{Occurrence, OccurrenceTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Occurrences recorded at analysis time, still present in the listing.
    StoredOccurrences,
    /// Every occurrence whose id equals the representative id.
    ExactId,
    /// Every occurrence whose id carries the candidate's prefix.
    Prefix,
    /// Prefix recovered from the signature, matched case-insensitively.
    SignaturePrefix,
    /// The representative itself, located by object or id on its page.
    SingleOccurrence,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::StoredOccurrences => "stored occurrences",
            Strategy::ExactId => "exact id",
            Strategy::Prefix => "prefix",
            Strategy::SignaturePrefix => "signature prefix",
            Strategy::SingleOccurrence => "single occurrence",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub strategy: Strategy,
    pub occurrences: Vec<Occurrence>,
}

/// What the fallback chain knows about a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionHints {
    pub image_id: String,
    pub prefix: String,
    pub signature: String,
    pub object: String,
    pub page: u32,
}

impl From<&UnwantedElementCandidate> for ResolutionHints {
    fn from(candidate: &UnwantedElementCandidate) -> Self {
        let rep = candidate.detail.representative();
        ResolutionHints {
            image_id: rep.image_id.clone(),
            prefix: candidate.detail.prefix().to_string(),
            signature: candidate.detail.signature().to_string(),
            object: rep.object.clone(),
            page: rep.page,
        }
    }
}

/// Resolve one candidate against `table`.
pub fn resolve_candidate(
    candidate: &UnwantedElementCandidate,
    table: &OccurrenceTable,
    diags: &mut Diagnostics,
) -> Option<Resolution> {
    if !candidate.occurrences.is_empty() {
        let present: Vec<Occurrence> = candidate
            .occurrences
            .iter()
            .filter(|occ| table.contains(occ))
            .cloned()
            .collect();
        if !present.is_empty() {
            if present.len() < candidate.occurrences.len() {
                diags.warn(format!(
                    "Candidate {}: {} of {} stored occurrences are no longer listed",
                    candidate.id,
                    candidate.occurrences.len() - present.len(),
                    candidate.occurrences.len()
                ));
            }
            return Some(Resolution {
                strategy: Strategy::StoredOccurrences,
                occurrences: present,
            });
        }
        diags.warn(format!(
            "Candidate {}: no stored occurrence is listed any more; falling back to id lookup",
            candidate.id
        ));
    }

    resolve_by_hints(&ResolutionHints::from(candidate), table)
}

/// The fallback chain: exact id, prefix, signature prefix, single occurrence.
pub fn resolve_by_hints(hints: &ResolutionHints, table: &OccurrenceTable) -> Option<Resolution> {
    let found = |strategy, occurrences: Vec<Occurrence>| {
        (!occurrences.is_empty()).then_some(Resolution {
            strategy,
            occurrences,
        })
    };

    if !hints.image_id.is_empty() {
        if let Some(r) = found(Strategy::ExactId, table.with_id(&hints.image_id).to_vec()) {
            return Some(r);
        }
    }

    if usable_prefix(&hints.prefix) {
        let matched = filter(table, |id| matches_prefix(id, &hints.prefix));
        if let Some(r) = found(Strategy::Prefix, matched) {
            return Some(r);
        }
    }

    let derived = prefix_from_signature(&hints.signature).unwrap_or(&hints.prefix);
    if usable_prefix(derived) {
        let matched = filter(table, |id| matches_prefix_ignore_case(id, derived));
        if let Some(r) = found(Strategy::SignaturePrefix, matched) {
            return Some(r);
        }
    }

    if !hints.object.is_empty() && hints.page > 0 {
        let single = table
            .all()
            .iter()
            .find(|o| o.page == hints.page && o.object == hints.object)
            .or_else(|| {
                table
                    .all()
                    .iter()
                    .find(|o| o.page == hints.page && o.image_id == hints.image_id)
            });
        if let Some(occ) = single {
            return found(Strategy::SingleOccurrence, vec![occ.clone()]);
        }
    }

    None
}

/// Resolve every selected candidate and merge the results.
///
/// Ids missing from `candidates` and candidates that resolve to nothing are reported as
/// warnings. An occurrence shared by several candidates is kept once, at its first
/// position.
pub fn plan_removals(
    candidates: &[UnwantedElementCandidate],
    selected_ids: &[String],
    table: &OccurrenceTable,
    diags: &mut Diagnostics,
) -> Vec<Occurrence> {
    let mut plan = Vec::new();
    let mut seen = BTreeSet::new();

    for id in selected_ids {
        let Some(candidate) = candidates.iter().find(|c| &c.id == id) else {
            diags.warn(format!("Candidate {id} not found in analysis"));
            continue;
        };

        match resolve_candidate(candidate, table, diags) {
            Some(resolution) => {
                diags.debug(format!(
                    "Candidate {id}: {} occurrences via {}",
                    resolution.occurrences.len(),
                    resolution.strategy
                ));
                for occ in resolution.occurrences {
                    if seen.insert(occ.clone()) {
                        plan.push(occ);
                    }
                }
            }
            None => diags.warn(format!(
                "Candidate {id}: cannot find any matching image in the document"
            )),
        }
    }

    plan
}

fn usable_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix != UNKNOWN_PREFIX
}

fn filter(table: &OccurrenceTable, keep: impl Fn(&str) -> bool) -> Vec<Occurrence> {
    table
        .all()
        .iter()
        .filter(|o| keep(&o.image_id))
        .cloned()
        .collect()
}

/// `prefix`, `prefix-…`, `prefix_…`, or an id whose own derived prefix is `prefix`.
fn matches_prefix(id: &str, prefix: &str) -> bool {
    id.starts_with(prefix) || image_prefix(id) == prefix
}

/// Case-folded [`matches_prefix`]; covers lower, upper and title-case spellings.
fn matches_prefix_ignore_case(id: &str, prefix: &str) -> bool {
    let id = id.to_lowercase();
    let prefix = prefix.to_lowercase();
    id.starts_with(&prefix) || image_prefix(&id).to_lowercase() == prefix
}
