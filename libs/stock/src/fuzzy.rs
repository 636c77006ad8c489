//! Weighted fuzzy string similarity.
//!
//! Scores are integers in `0..=100`. `weighted_ratio` blends a plain
//! indel ratio with partial (substring) and token-based variants so that
//! "reliance" still scores high against "reliance industries limited".

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.90;
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// Lowercase, replace anything that is not alphanumeric with a space and
/// collapse runs of whitespace.
pub fn process(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

fn raw_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    100.0 * (2 * lcs_len(a, b)) as f64 / total as f64
}

fn raw_partial_ratio(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }
    if short.len() == long.len() {
        return raw_ratio(short, long);
    }

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        let score = raw_ratio(short, window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Indel similarity of two strings, as-is.
pub fn ratio(a: &str, b: &str) -> u8 {
    raw_ratio(&chars(a), &chars(b)).round() as u8
}

/// Best [`ratio`] of the shorter string against any equally long window
/// of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    raw_partial_ratio(&chars(a), &chars(b)).round() as u8
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort(a: &str, b: &str, partial: bool) -> f64 {
    let a = chars(&sorted_tokens(&process(a)));
    let b = chars(&sorted_tokens(&process(b)));
    if partial {
        raw_partial_ratio(&a, &b)
    } else {
        raw_ratio(&a, &b)
    }
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

fn token_set(a: &str, b: &str, partial: bool) -> f64 {
    let a = process(a);
    let b = process(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let sect = tokens_a
        .intersection(&tokens_b)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let diff_ab = tokens_a
        .difference(&tokens_b)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let diff_ba = tokens_b
        .difference(&tokens_a)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let combined_ab = join_nonempty(&sect, &diff_ab);
    let combined_ba = join_nonempty(&sect, &diff_ba);

    let score = |x: &str, y: &str| {
        if partial {
            raw_partial_ratio(&chars(x), &chars(y))
        } else {
            raw_ratio(&chars(x), &chars(y))
        }
    };

    score(&sect, &combined_ab)
        .max(score(&sect, &combined_ba))
        .max(score(&combined_ab, &combined_ba))
}

pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    token_sort(a, b, false).round() as u8
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> u8 {
    token_sort(a, b, true).round() as u8
}

pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set(a, b, false).round() as u8
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> u8 {
    token_set(a, b, true).round() as u8
}

/// Blended similarity used for symbol resolution.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let p1 = process(a);
    let p2 = process(b);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let len1 = p1.chars().count() as f64;
    let len2 = p2.chars().count() as f64;
    let len_ratio = len1.max(len2) / len1.min(len2);

    let base = ratio(&p1, &p2) as f64;

    if len_ratio < 1.5 {
        let tsor = token_sort_ratio(&p1, &p2) as f64 * UNBASE_SCALE;
        let tser = token_set_ratio(&p1, &p2) as f64 * UNBASE_SCALE;
        return base.max(tsor).max(tser).round() as u8;
    }

    let partial_scale = if len_ratio > 8.0 {
        LONG_PARTIAL_SCALE
    } else {
        PARTIAL_SCALE
    };

    let partial = partial_ratio(&p1, &p2) as f64 * partial_scale;
    let ptsor = partial_token_sort_ratio(&p1, &p2) as f64 * UNBASE_SCALE * partial_scale;
    let ptser = partial_token_set_ratio(&p1, &p2) as f64 * UNBASE_SCALE * partial_scale;

    base.max(partial).max(ptsor).max(ptser).round() as u8
}

/// Highest scoring key for `query`.
///
/// Ties keep the key that comes first in iteration order.
pub fn best_match<'a, I>(query: &str, keys: I) -> Option<(&'a str, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;

    for key in keys {
        let score = weighted_ratio(query, key);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((key, score)),
        }
        if score == 100 {
            break;
        }
    }

    best
}
