//! Rewriting of the Unicode logic operators into allow-listed calls.
//!
//! `a → b` becomes `implies(a, b)`. Each operand is the maximal run of
//! non-whitespace characters next to the operator; the left operand extends
//! as far right as still leaves an operator to match, so `p→q→r` rewrites
//! its last arrow first.

/// Applied one operator at a time, in this order.
pub const OPERATORS: [(char, &str); 5] = [
    ('→', "implies"),
    ('↔', "iff"),
    ('⊕', "xor"),
    ('↑', "nand"),
    ('↓', "nor"),
];

pub fn rewrite_operators(text: &str) -> String {
    OPERATORS
        .iter()
        .fold(text.to_string(), |acc, (op, function)| {
            rewrite_operator(&acc, *op, function)
        })
}

fn rewrite_operator(text: &str, op: char, function: &str) -> String {
    if !text.contains(op) {
        return text.to_string();
    }
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(text.len());

    let mut out = String::with_capacity(text.len() + 16);
    let mut copied = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i].1.is_whitespace() {
            i += 1;
            continue;
        }
        let run_end = run_end(&chars, i);
        match match_from(&chars, i, run_end, op) {
            Some(m) => {
                out.push_str(&text[byte_at(copied)..byte_at(i)]);
                out.push_str(function);
                out.push('(');
                out.push_str(&text[byte_at(i)..byte_at(m.left_end)]);
                out.push_str(", ");
                out.push_str(&text[byte_at(m.right_start)..byte_at(m.right_end)]);
                out.push(')');
                copied = m.right_end;
                i = m.right_end;
            }
            None => i = run_end,
        }
    }
    out.push_str(&text[byte_at(copied)..]);
    out
}

struct OperatorMatch {
    left_end: usize,
    right_start: usize,
    right_end: usize,
}

fn run_end(chars: &[(usize, char)], from: usize) -> usize {
    (from..chars.len())
        .find(|&j| chars[j].1.is_whitespace())
        .unwrap_or(chars.len())
}

fn skip_whitespace(chars: &[(usize, char)], mut i: usize) -> usize {
    while i < chars.len() && chars[i].1.is_whitespace() {
        i += 1;
    }
    i
}

/// Longest left operand starting at `start` that is followed by `op` and a
/// non-empty right operand.
fn match_from(chars: &[(usize, char)], start: usize, run_end_at: usize, op: char) -> Option<OperatorMatch> {
    (start + 1..=run_end_at).rev().find_map(|left_end| {
        let op_at = skip_whitespace(chars, left_end);
        if op_at >= chars.len() || chars[op_at].1 != op {
            return None;
        }
        let right_start = skip_whitespace(chars, op_at + 1);
        if right_start >= chars.len() {
            return None;
        }
        Some(OperatorMatch {
            left_end,
            right_start,
            right_end: run_end(chars, right_start),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implies_with_spaces() {
        assert_eq!(rewrite_operators("a → b"), "implies(a, b)");
    }

    #[test]
    fn operator_without_spaces() {
        assert_eq!(rewrite_operators("a↔b"), "iff(a, b)");
    }

    #[test]
    fn every_operator_has_a_function() {
        assert_eq!(rewrite_operators("a ⊕ b"), "xor(a, b)");
        assert_eq!(rewrite_operators("a ↑ b"), "nand(a, b)");
        assert_eq!(rewrite_operators("a ↓ b"), "nor(a, b)");
    }

    #[test]
    fn surrounding_text_is_kept() {
        assert_eq!(rewrite_operators("x and a → b"), "x and implies(a, b)");
        assert_eq!(rewrite_operators("a → b or y"), "implies(a, b) or y");
    }

    #[test]
    fn left_operand_is_greedy() {
        assert_eq!(rewrite_operators("p→q→r"), "implies(p→q, r)");
    }

    #[test]
    fn operators_applied_in_order() {
        assert_eq!(
            rewrite_operators("a ↔ b and c → d"),
            "iff(a, b) and implies(c, d)"
        );
        // a later pass only sees the run next to its operator, here "b)"
        assert_eq!(rewrite_operators("a → b ↔ c"), "implies(a, iff(b), c)");
    }

    #[test]
    fn several_matches_of_one_operator() {
        assert_eq!(
            rewrite_operators("a → b and c → d"),
            "implies(a, b) and implies(c, d)"
        );
    }

    #[test]
    fn dangling_operator_left_in_place() {
        assert_eq!(rewrite_operators("→ b"), "→ b");
        assert_eq!(rewrite_operators("a →"), "a →");
    }

    #[test]
    fn text_without_operators_unchanged() {
        assert_eq!(rewrite_operators("x > 0"), "x > 0");
    }
}
