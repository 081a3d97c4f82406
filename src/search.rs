use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domain::DomainConfig,
    record::{DocumentRecord, ScoredRecord},
    taxonomy::normalize_segment,
};

/// Every constant the lexical scorer adds or subtracts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Full query found in name + text.
    pub exact_in_text: f32,
    /// Full query found in the file name.
    pub exact_in_name: f32,
    /// Query word found in name + text.
    pub word_in_text: f32,
    /// Query word found in the file name.
    pub word_in_name: f32,
    pub location_in_path: f32,
    pub category_in_path: f32,
    /// Both a location and a category were requested and both matched.
    pub location_and_category: f32,
    /// Both were requested but only one matched. Usually negative.
    pub partial_location_category: f32,
    /// Only a category was requested and it matched.
    pub category_only: f32,
    pub category_in_name: f32,
    pub practice_area: f32,
    pub matter: f32,
    pub time_period: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_in_text: 10.0,
            exact_in_name: 5.0,
            word_in_text: 2.0,
            word_in_name: 3.0,
            location_in_path: 10.0,
            category_in_path: 10.0,
            location_and_category: 15.0,
            partial_location_category: -5.0,
            category_only: 15.0,
            category_in_name: 5.0,
            practice_area: 20.0,
            matter: 25.0,
            time_period: 3.0,
        }
    }
}

/// Structured hints read out of a query by the active domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryHints {
    pub location: Option<&'static str>,
    pub category: Option<&'static str>,
    pub practice_area: Option<&'static str>,
    pub matter: Option<&'static str>,
}

impl QueryHints {
    /// `query` must already be lowercase; `words` are its whitespace
    /// separated words.
    pub fn parse(
        query: &str,
        words: &[&str],
        domain: &dyn DomainConfig,
    ) -> Self {
        Self {
            location: domain.resolve_location(words),
            category: domain.resolve_category(words),
            practice_area: domain.resolve_practice_area(query),
            matter: domain.resolve_matter(query),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-call options of [`score`].
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    pub limit: usize,
    /// Labels of the selected taxonomy nodes. Records outside those
    /// folders are dropped unless that would drop everything.
    pub context_folders: &'a [String],
    /// Only keep records whose path contains this substring.
    pub industry_filter: Option<&'a str>,
}

impl Default for SearchParams<'_> {
    fn default() -> Self {
        Self {
            limit: 5,
            context_folders: &[],
            industry_filter: None,
        }
    }
}

/// Rank `records` against `query`.
///
/// Returns at most `params.limit` scored copies, sorted by descending score.
/// Ties keep the order of `records`. Records scoring zero or less are
/// dropped. An empty or whitespace-only query yields nothing.
pub fn score(
    query: &str,
    records: &[DocumentRecord],
    params: &SearchParams<'_>,
    domain: &dyn DomainConfig,
    weights: &ScoringWeights,
) -> Vec<ScoredRecord> {
    // Surrounding whitespace is not part of the exact-substring match.
    let query = query.trim().to_lowercase();
    if query.is_empty() || params.limit == 0 {
        return Vec::new();
    }

    let candidates = filter_candidates(records, params);

    let words = query_words(&query);
    let hints = QueryHints::parse(&query, &words, domain);
    if !hints.is_empty() {
        debug!(?hints, "resolved query hints");
    }

    let mut scored: Vec<ScoredRecord> = candidates
        .into_iter()
        .filter_map(|record| {
            let s =
                score_record(&query, &words, &hints, record, domain, weights);
            (s > 0.0).then(|| ScoredRecord::new(record, s))
        })
        .collect();

    // sort_by is stable, so equal scores keep corpus order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(params.limit);
    scored
}

fn filter_candidates<'r>(
    records: &'r [DocumentRecord],
    params: &SearchParams<'_>,
) -> Vec<&'r DocumentRecord> {
    let mut candidates: Vec<&DocumentRecord> = match params.industry_filter {
        Some(filter) if !filter.is_empty() => {
            let filter = filter.to_lowercase();
            records
                .iter()
                .filter(|r| r.normalized_path().contains(&filter))
                .collect()
        }
        _ => records.iter().collect(),
    };

    let labels: Vec<String> = params
        .context_folders
        .iter()
        .map(|l| fold_label(l))
        .filter(|l| !l.is_empty())
        .collect();
    if !labels.is_empty() {
        let restricted: Vec<&DocumentRecord> = candidates
            .iter()
            .copied()
            .filter(|r| {
                let path = fold_label(&r.path);
                labels.iter().any(|l| path.contains(l.as_str()))
            })
            .collect();
        if restricted.is_empty() {
            debug!("context folders matched no records, ignoring them");
        } else {
            candidates = restricted;
        }
    }

    candidates
}

/// Lowercase and drop word and path separators, so `West_Group/Accounting`
/// and `westgroupaccounting` compare equal.
fn fold_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '/' | '\\'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whitespace separated words, first occurrence only.
fn query_words(query: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    query
        .split_whitespace()
        .filter(|w| seen.insert(*w))
        .collect()
}

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Quarter labels, month names and four digit years from 1900 to 2099.
pub fn is_time_token(word: &str) -> bool {
    if matches!(word, "q1" | "q2" | "q3" | "q4") || MONTHS.contains(&word) {
        return true;
    }
    word.len() == 4
        && word.bytes().all(|b| b.is_ascii_digit())
        && (word.starts_with("19") || word.starts_with("20"))
}

fn score_record(
    query: &str,
    words: &[&str],
    hints: &QueryHints,
    record: &DocumentRecord,
    domain: &dyn DomainConfig,
    w: &ScoringWeights,
) -> f32 {
    let name = record.name.to_lowercase();
    let haystack = format!("{name} {}", record.text.to_lowercase());
    let mut total = 0.0;

    if haystack.contains(query) {
        total += w.exact_in_text;
    }
    if name.contains(query) {
        total += w.exact_in_name;
    }

    for word in words.iter().filter(|word| word.chars().count() > 2) {
        if haystack.contains(word) {
            total += w.word_in_text;
        }
        if name.contains(word) {
            total += w.word_in_name;
        }
    }

    total += path_score(&record.normalized_path(), &name, hints, domain, w);

    for word in words.iter().filter(|word| is_time_token(word)) {
        if haystack.contains(word) {
            total += w.time_period;
        }
    }

    total
}

fn path_score(
    path: &str,
    name: &str,
    hints: &QueryHints,
    domain: &dyn DomainConfig,
    w: &ScoringWeights,
) -> f32 {
    let mut total = 0.0;

    let location_hit = hints.location.map(|loc| path.contains(loc));
    let category_hit = hints.category.map(|cat| path.contains(cat));

    if location_hit == Some(true) {
        total += w.location_in_path;
    }
    if category_hit == Some(true) {
        total += w.category_in_path;
    }
    match (location_hit, category_hit) {
        (Some(true), Some(true)) => total += w.location_and_category,
        (Some(a), Some(b)) if a != b => total += w.partial_location_category,
        (None, Some(true)) => total += w.category_only,
        _ => {}
    }

    if let Some(category) = hints.category
        && domain.category_in_name(category, name)
    {
        total += w.category_in_name;
    }

    if hints.practice_area.is_some() || hints.matter.is_some() {
        let folded = normalize_segment(path);
        if let Some(practice) = hints.practice_area
            && folded.contains(practice)
        {
            total += w.practice_area;
        }
        if let Some(matter) = hints.matter
            && folded.contains(matter)
        {
            total += w.matter;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn rec(path: &str, text: &str) -> DocumentRecord {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_lowercase())
            .unwrap_or_default();
        DocumentRecord {
            path: path.to_string(),
            name,
            extension,
            text: text.to_string(),
        }
    }

    fn run(
        query: &str,
        records: &[DocumentRecord],
        domain: Domain,
    ) -> Vec<ScoredRecord> {
        let config = domain.config().unwrap();
        score(
            query,
            records,
            &SearchParams {
                limit: 10,
                ..Default::default()
            },
            config.as_ref(),
            &ScoringWeights::default(),
        )
    }

    #[test]
    fn empty_query_returns_nothing() {
        let records = vec![rec("d/East_Group/Expenses/a.txt", "anything")];
        assert!(run("", &records, Domain::Fnb).is_empty());
        assert!(run("   ", &records, Domain::Fnb).is_empty());
    }

    #[test]
    fn no_match_returns_nothing() {
        let records = vec![rec("d/notes.txt", "fryer oil")];
        assert!(run("zzzz", &records, Domain::Fnb).is_empty());
    }

    #[test]
    fn exact_and_word_scores_add_up() {
        let records = vec![rec("d/oil.txt", "fryer oil order")];
        let results = run("fryer oil", &records, Domain::Fnb);
        // exact in text 10, "fryer" in text 2, "oil" in text 2 and name 3
        assert_eq!(results[0].score, 17.0);
    }

    #[test]
    fn short_words_only_count_through_exact_and_path() {
        let records = vec![
            rec("d/East_Group/Legal/ok.txt", "ok"),
            rec("d/ok.txt", "nothing"),
        ];
        let results = run("ok", &records, Domain::Fnb);
        assert_eq!(results.len(), 2);
        // exact in text + exact in name
        assert_eq!(results[0].score, 15.0);
    }

    #[test]
    fn location_and_category_outranks_category_alone() {
        let records = vec![
            rec("d/Central_Group/Accounting/expenses_report.txt", "totals"),
            rec("d/East_Group/Expenses/summary.txt", "Q3 spend"),
        ];
        let results = run("east expenses q3", &records, Domain::Fnb);
        assert_eq!(results[0].record.name, "summary.txt");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn partial_match_is_penalised() {
        let records = vec![rec("d/West_Group/Accounting/ledger.txt", "x")];
        // location west misses, category accounting hits: 10 - 5
        let results = run("east accounting", &records, Domain::Fnb);
        assert_eq!(results[0].score, 5.0);
    }

    #[test]
    fn category_only_bonus() {
        let records = vec![rec("d/West_Group/Permits/health.txt", "x")];
        // category in path 10 + category-only 15
        let results = run("permit", &records, Domain::Fnb);
        assert_eq!(results[0].score, 25.0);
    }

    #[test]
    fn category_alias_in_file_name() {
        let records = vec![rec("d/payroll_2024.csv", "x")];
        let results = run("payroll", &records, Domain::Fnb);
        // word in text 2 + word in name 3 + exact 10 + exact name 5
        // + category alias in name 5
        assert_eq!(results[0].score, 25.0);
    }

    #[test]
    fn time_tokens_need_both_query_and_text() {
        let with = rec("d/a.txt", "march 2024 close");
        let without = rec("d/b.txt", "close");
        let results = run("close march", &[with, without], Domain::Fnb);
        assert_eq!(results[0].record.name, "a.txt");
        // "close" 2 + "march" 2 + time 3
        assert_eq!(results[0].score, 7.0);
        assert_eq!(results[1].score, 2.0);
    }

    #[test]
    fn time_token_vocabulary() {
        for t in ["q1", "q4", "may", "december", "1999", "2024"] {
            assert!(is_time_token(t), "{t}");
        }
        for t in ["q5", "mayday", "1850", "20245", "x"] {
            assert!(!is_time_token(t), "{t}");
        }
    }

    #[test]
    fn surrounding_whitespace_does_not_change_scores() {
        let records = vec![rec("d/menu/specials.txt", "fryer oil specials")];
        let plain = run("fryer oil", &records, Domain::Fnb);
        let padded = run("  Fryer Oil \t", &records, Domain::Fnb);
        assert_eq!(plain.len(), 1);
        assert_eq!(plain, padded);
        assert!(run(" \t ", &records, Domain::Fnb).is_empty());
    }

    #[test]
    fn megacorp_matter_outranks_generic_litigation() {
        let records = vec![
            rec("firm/Litigation/Jones_Contract_Dispute/brief.txt", "brief"),
            rec("firm/Litigation/Smith_v_MegaCorp/brief.txt", "brief"),
        ];
        let results = run("megacorp brief", &records, Domain::Legal);
        assert_eq!(results.len(), 2);
        assert!(results[0].record.path.contains("Smith_v_MegaCorp"));
        assert!(results[0].score >= results[1].score + 25.0);
    }

    #[test]
    fn practice_area_boost() {
        let records = vec![
            rec("firm/Corporate/Acme_Merger/memo.txt", "memo"),
            rec("firm/Litigation/Jones_Contract_Dispute/memo.txt", "memo"),
        ];
        let results = run("lawsuit memo", &records, Domain::Legal);
        assert!(results[0].record.path.contains("Litigation"));
        assert_eq!(results[0].score - results[1].score, 20.0);
    }

    #[test]
    fn industry_filter_drops_other_paths() {
        let records = vec![
            rec("corp/fnb/East_Group/Legal/lease.txt", "lease"),
            rec("corp/retail/lease.txt", "lease"),
        ];
        let config = Domain::Fnb.config().unwrap();
        let results = score(
            "lease",
            &records,
            &SearchParams {
                limit: 10,
                industry_filter: Some("FNB"),
                ..Default::default()
            },
            config.as_ref(),
            &ScoringWeights::default(),
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].record.path.contains("/fnb/"));
    }

    #[test]
    fn context_folders_restrict_or_fall_back() {
        let records = vec![
            rec("d/West_Group/Accounting/q1.txt", "report"),
            rec("d/East_Group/Accounting/q1.txt", "report"),
        ];
        let config = Domain::Fnb.config().unwrap();
        let weights = ScoringWeights::default();

        let west = vec!["West_Group".to_string()];
        let params = SearchParams {
            limit: 10,
            context_folders: &west,
            industry_filter: None,
        };
        let results =
            score("report", &records, &params, config.as_ref(), &weights);
        assert_eq!(results.len(), 1);
        assert!(results[0].record.path.contains("West_Group"));

        let bogus = vec!["North_Group".to_string()];
        let params = SearchParams {
            limit: 10,
            context_folders: &bogus,
            industry_filter: None,
        };
        let results =
            score("report", &records, &params, config.as_ref(), &weights);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn limit_truncates_and_ties_keep_order() {
        let records: Vec<_> = (0..6)
            .map(|i| rec(&format!("d/file{i}.txt"), "same words"))
            .collect();
        let config = Domain::Fnb.config().unwrap();
        let results = score(
            "words",
            &records,
            &SearchParams {
                limit: 3,
                ..Default::default()
            },
            config.as_ref(),
            &ScoringWeights::default(),
        );
        let names: Vec<_> =
            results.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["file0.txt", "file1.txt", "file2.txt"]);
    }

    #[test]
    fn records_are_not_mutated() {
        let records = vec![rec("d/East_Group/Expenses/a.txt", "q3 expenses")];
        let before = records.clone();
        let _ = run("east expenses", &records, Domain::Fnb);
        assert_eq!(records, before);
    }

    #[test]
    fn weights_roundtrip_with_partial_json() {
        let w: ScoringWeights =
            serde_json::from_str(r#"{"matter": 40.0}"#).unwrap();
        assert_eq!(w.matter, 40.0);
        assert_eq!(w.exact_in_text, 10.0);
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        const VOCAB: &[&str] = &[
            "east", "west", "expenses", "q3", "oil", "permit", "tax",
            "lease", "march", "2024", "fryer",
        ];

        fn words() -> impl Strategy<Value = String> {
            proptest::collection::vec(0..VOCAB.len(), 1..5).prop_map(|idx| {
                idx.iter().map(|i| VOCAB[*i]).collect::<Vec<_>>().join(" ")
            })
        }

        proptest! {
            #[test]
            fn results_are_sorted_and_stable(
                query in words(),
                texts in proptest::collection::vec(words(), 0..20),
            ) {
                let records: Vec<_> = texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let group = if i % 2 == 0 {
                            "East_Group"
                        } else {
                            "West_Group"
                        };
                        rec(&format!("d/{group}/Expenses/doc{i}.txt"), t)
                    })
                    .collect();
                let position = |path: &str| {
                    records.iter().position(|r| r.path == path).unwrap()
                };

                let results = run(&query, &records, Domain::Fnb);
                prop_assert!(results.len() <= 10);
                for r in &results {
                    prop_assert!(r.score > 0.0);
                }
                for pair in results.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                    if pair[0].score == pair[1].score {
                        prop_assert!(
                            position(&pair[0].record.path)
                                < position(&pair[1].record.path)
                        );
                    }
                }
            }
        }
    }
}
