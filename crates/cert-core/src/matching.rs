//! Employee name matching
//!
//! One matcher, two policies. Historically the codebase grew two divergent
//! heuristics (a strict exact-match lookup and a tie-breaking fallback used
//! by certificate auto-fill and bulk import); both now live behind
//! [`TieBreakPolicy`] so every call site picks its behavior explicitly.

use crate::model::Employee;

/// Tokenized free-text full name: surname, given name, optional patronymic.
/// Tokens past the third are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    pub surname: String,
    pub given_name: String,
    pub patronymic: Option<String>,
}

impl NameQuery {
    /// Parse a free-text name. Whitespace runs collapse; fewer than two
    /// tokens is not a usable query.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let surname = parts.next()?.to_string();
        let given_name = parts.next()?.to_string();
        let patronymic = parts.next().map(str::to_string);
        Some(Self {
            surname,
            given_name,
            patronymic,
        })
    }
}

/// How patronymic ties are broken among surname+given-name candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreakPolicy {
    /// Exactly one candidate must survive the patronymic filter; zero is
    /// NotFound, several are Ambiguous.
    Strict,
    /// Always produce a match when any candidate exists: exact patronymic
    /// first, then an empty-patronymic candidate, then the first candidate.
    PreferEmptyPatronymic,
}

/// Result of resolving a name; never partially filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(Employee),
    NotFound,
    Ambiguous,
}

impl MatchOutcome {
    pub fn into_employee(self) -> Option<Employee> {
        match self {
            MatchOutcome::Matched(e) => Some(e),
            _ => None,
        }
    }
}

/// Resolve a query against candidates already filtered to case-insensitive
/// surname + given-name matches by the directory.
pub fn resolve(
    query: &NameQuery,
    candidates: &[Employee],
    policy: TieBreakPolicy,
) -> MatchOutcome {
    match policy {
        TieBreakPolicy::Strict => resolve_strict(query, candidates),
        TieBreakPolicy::PreferEmptyPatronymic => resolve_preferring(query, candidates),
    }
}

fn resolve_strict(query: &NameQuery, candidates: &[Employee]) -> MatchOutcome {
    let filtered: Vec<&Employee> = match &query.patronymic {
        Some(patronymic) => candidates
            .iter()
            .filter(|e| eq_fold(&e.middle_name, patronymic))
            .collect(),
        None => candidates
            .iter()
            .filter(|e| e.middle_name.is_empty())
            .collect(),
    };

    match filtered.as_slice() {
        [single] => MatchOutcome::Matched((*single).clone()),
        [] => MatchOutcome::NotFound,
        _ => MatchOutcome::Ambiguous,
    }
}

fn resolve_preferring(query: &NameQuery, candidates: &[Employee]) -> MatchOutcome {
    let Some(first) = candidates.first() else {
        return MatchOutcome::NotFound;
    };

    let preferred = match &query.patronymic {
        Some(patronymic) => candidates
            .iter()
            .find(|e| eq_fold(&e.middle_name, patronymic)),
        None => candidates.iter().find(|e| e.middle_name.is_empty()),
    };

    MatchOutcome::Matched(preferred.unwrap_or(first).clone())
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
