//! Arithmetic anti-spam challenge solver.
//!
//! Sites pose questions of the form `<int><op><int>` where the operator is
//! `+` or the Unicode minus sign `−` (U+2212). One solve per edit attempt;
//! the resubmission policy lives in the orchestrator.

/// Solve a posed challenge question. Returns `None` when the question is
/// not in the recognized shape.
pub fn solve(question: &str) -> Option<i64> {
    if let Some((lhs, rhs)) = split_operands(question, '+') {
        return Some(lhs + rhs);
    }
    if let Some((lhs, rhs)) = split_operands(question, '−') {
        return Some(lhs - rhs);
    }
    None
}

fn split_operands(question: &str, op: char) -> Option<(i64, i64)> {
    let (lhs, rhs) = question.split_once(op)?;
    let lhs = lhs.trim().parse().ok()?;
    let rhs = rhs.trim().parse().ok()?;
    Some((lhs, rhs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("3+4", 7)]
    #[case("12 + 30", 42)]
    #[case("10−4", 6)]
    #[case("4−10", -6)]
    #[case(" 7 − 2 ", 5)]
    fn solves_recognized_shapes(#[case] question: &str, #[case] expected: i64) {
        assert_eq!(solve(question), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("3*4")]
    #[case("3-4")] // ASCII hyphen is not the posed operator
    #[case("what is 3+4?")]
    #[case("+4")]
    fn rejects_unrecognized_shapes(#[case] question: &str) {
        assert_eq!(solve(question), None);
    }
}
