//! Frequency ranking of collected tokens into top-N keyword lists.

use std::collections::{BTreeSet, HashMap};

use crate::model::Keyword;

/// One rankable occurrence. Built from a bare token (count 1) or from an
/// existing keyword entry carrying a count and document set.
pub struct RankItem {
    pub word: String,
    pub count: u64,
    pub documents: Option<BTreeSet<String>>,
}

impl From<String> for RankItem {
    fn from(word: String) -> Self {
        Self {
            word,
            count: 1,
            documents: None,
        }
    }
}

impl From<&str> for RankItem {
    fn from(word: &str) -> Self {
        word.to_string().into()
    }
}

impl From<Keyword> for RankItem {
    fn from(kw: Keyword) -> Self {
        Self {
            word: kw.word,
            count: kw.count,
            documents: kw.documents,
        }
    }
}

/// Fold identical words (case-insensitively) into single entries, summing
/// counts and unioning document sets, then return the `top_n` by descending
/// count. The sort is stable, so equal counts keep first-seen order. Items
/// with an empty word are skipped.
pub fn rank_by_count<I>(items: I, top_n: usize) -> Vec<Keyword>
where
    I: IntoIterator,
    I::Item: Into<RankItem>,
{
    let mut entries: Vec<Keyword> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let item: RankItem = item.into();
        let word = item.word.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        match index.get(&word) {
            Some(&i) => {
                entries[i].count += item.count;
                if let Some(docs) = item.documents {
                    entries[i]
                        .documents
                        .get_or_insert_with(BTreeSet::new)
                        .extend(docs);
                }
            }
            None => {
                index.insert(word.clone(), entries.len());
                entries.push(Keyword {
                    word,
                    count: item.count,
                    score: None,
                    documents: item.documents,
                });
            }
        }
    }

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(top_n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_duplicates_and_keeps_first_seen_order_on_ties() {
        let items = ["a", "b", "a", "c", "b", "d"];
        let ranked = rank_by_count(items, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].word.as_str(), ranked[0].count), ("a", 2));
        assert_eq!((ranked[1].word.as_str(), ranked[1].count), ("b", 2));
    }

    #[test]
    fn folds_case_insensitively() {
        let ranked = rank_by_count(["Climate", "climate", "CLIMATE"], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].word, "climate");
        assert_eq!(ranked[0].count, 3);
    }

    #[test]
    fn skips_empty_words() {
        let ranked = rank_by_count(["", "  ", "real"], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].word, "real");
    }

    #[test]
    fn output_is_bounded_sorted_and_count_preserving() {
        let items = ["x", "y", "x", "z", "x", "y", "w", "v"];
        let input_total = items.len() as u64;
        let ranked = rank_by_count(items, 3);

        assert!(ranked.len() <= 3);
        for pair in ranked.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
        let output_total: u64 = ranked.iter().map(|k| k.count).sum();
        assert!(output_total <= input_total);
    }

    #[test]
    fn unions_document_sets_when_folding_keywords() {
        let mut a = Keyword::new("reuters.com/a", 2);
        a.documents = Some(BTreeSet::from(["d1".to_string(), "d2".to_string()]));
        let mut b = Keyword::new("Reuters.com/a", 3);
        b.documents = Some(BTreeSet::from(["d2".to_string(), "d3".to_string()]));

        let ranked = rank_by_count([a, b], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].count, 5);
        let docs = ranked[0].documents.as_ref().unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[test]
    fn top_n_zero_yields_empty() {
        assert!(rank_by_count(["a", "b"], 0).is_empty());
    }
}
