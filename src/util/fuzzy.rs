/// Subsequence match of `query` in `target`, case-insensitive.
/// Returns a score (higher is better) or None when `query` is not a
/// subsequence of `target`.
pub fn fuzzy_score(query: &str, target: &str) -> Option<i32> {
    if query.is_empty() {
        return Some(0);
    }

    let query: Vec<char> = query.chars().flat_map(|c| c.to_lowercase()).collect();
    let chars: Vec<char> = target.chars().collect();
    let lower: Vec<char> = target.chars().flat_map(|c| c.to_lowercase()).collect();

    let mut hits = Vec::with_capacity(query.len());
    let mut from = 0;
    for &qc in &query {
        let pos = lower.get(from..)?.iter().position(|&tc| tc == qc)?;
        hits.push(from + pos);
        from += pos + 1;
    }

    let mut score = 0;
    let half = chars.len() / 2;
    for (i, &idx) in hits.iter().enumerate() {
        let word_start =
            idx == 0 || matches!(chars.get(idx.wrapping_sub(1)), Some(' ' | '-' | '/' | '('));
        if word_start {
            score += 10;
        }
        if idx < half {
            score += 3;
        }
        if i > 0 {
            let prev = hits[i - 1];
            if idx == prev + 1 {
                score += 5;
            }
            score -= idx.saturating_sub(prev + 1) as i32;
        }
    }
    Some(score)
}

/// Indices of `labels` matching `query`, best first. Ties keep input order.
pub fn rank<'a>(query: &str, labels: impl IntoIterator<Item = &'a str>) -> Vec<usize> {
    let mut scored: Vec<(usize, i32)> = labels
        .into_iter()
        .enumerate()
        .filter_map(|(i, label)| fuzzy_score(query, label).map(|s| (i, s)))
        .collect();
    if !query.is_empty() {
        scored.sort_by(|a, b| b.1.cmp(&a.1));
    }
    scored.into_iter().map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsequence_required() {
        assert!(fuzzy_score("dw", "Deep Work").is_some());
        assert!(fuzzy_score("xyz", "Deep Work").is_none());
        assert_eq!(fuzzy_score("", "anything"), Some(0));
    }

    #[test]
    fn word_starts_rank_higher() {
        let labels = ["Admin", "Meeting"];
        // "m" starts "Meeting" but sits mid-word in "Admin"
        assert_eq!(rank("m", labels), vec![1, 0]);
    }

    #[test]
    fn empty_query_keeps_order() {
        assert_eq!(rank("", ["b", "a", "c"]), vec![0, 1, 2]);
    }
}
