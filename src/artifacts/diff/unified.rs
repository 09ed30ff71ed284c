//! Unified diff rendering
//!
//! Output follows `diff -u` with timestamps suppressed:
//!
//! ```text
//! --- <from label>
//! +++ <to label>
//! @@ -1,3 +1,3 @@
//!  context
//! -deleted
//! +inserted
//! ```

use crate::artifacts::diff::myers::{Edit, MyersDiff};

const CONTEXT_LINES: usize = 3;
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

#[derive(Debug)]
struct Line<'d> {
    edit: Edit<&'d str>,
    // lines of each side consumed before this one
    a_pos: usize,
    b_pos: usize,
}

#[derive(Debug)]
struct Hunk<'h, 'd> {
    lines: &'h [Line<'d>],
}

impl Hunk<'_, '_> {
    fn header(&self) -> String {
        let (a_pos, b_pos) = self
            .lines
            .first()
            .map(|line| (line.a_pos, line.b_pos))
            .unwrap_or_default();
        let a_len = self
            .lines
            .iter()
            .filter(|line| !matches!(line.edit, Edit::Insert { .. }))
            .count();
        let b_len = self
            .lines
            .iter()
            .filter(|line| !matches!(line.edit, Edit::Delete { .. }))
            .count();

        format!(
            "@@ -{} +{} @@",
            format_range(a_pos, a_len),
            format_range(b_pos, b_len)
        )
    }
}

fn format_range(pos: usize, len: usize) -> String {
    match len {
        0 => format!("{pos},0"),
        1 => format!("{}", pos + 1),
        _ => format!("{},{}", pos + 1, len),
    }
}

/// Split into lines, keeping each terminator
fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

fn annotate<'d>(edits: Vec<Edit<&'d str>>) -> Vec<Line<'d>> {
    let (mut a_pos, mut b_pos) = (0, 0);

    edits
        .into_iter()
        .map(|edit| {
            let line = Line { edit, a_pos, b_pos };
            match line.edit {
                Edit::Delete { .. } => a_pos += 1,
                Edit::Insert { .. } => b_pos += 1,
                Edit::Equal { .. } => {
                    a_pos += 1;
                    b_pos += 1;
                }
            }
            line
        })
        .collect()
}

/// Group changes whose gap is at most twice the context into hunks
fn hunks<'h, 'd>(lines: &'h [Line<'d>]) -> Vec<Hunk<'h, 'd>> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for (idx, _) in lines.iter().enumerate().filter(|(_, l)| l.edit.is_change()) {
        let start = idx.saturating_sub(CONTEXT_LINES);
        let end = (idx + CONTEXT_LINES + 1).min(lines.len());

        match ranges.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| Hunk {
            lines: &lines[start..end],
        })
        .collect()
}

/// Unified diff of two contents, or an empty string when they are equal
///
/// Contents that are not UTF-8 are compared as a whole and reported on a single
/// `Binary files ... differ` line.
pub fn unified_diff(from: &[u8], to: &[u8], from_label: &str, to_label: &str) -> String {
    if from == to {
        return String::new();
    }
    let (Ok(from), Ok(to)) = (std::str::from_utf8(from), std::str::from_utf8(to)) else {
        return format!("Binary files {from_label} and {to_label} differ\n");
    };
    let (a, b) = (split_lines(from), split_lines(to));

    let lines = annotate(MyersDiff::new(&a, &b).diff());
    let hunks = hunks(&lines);
    if hunks.is_empty() {
        return String::new();
    }

    let mut output = format!("--- {from_label}\n+++ {to_label}\n");
    for hunk in hunks {
        output.push_str(&hunk.header());
        output.push('\n');

        for line in hunk.lines {
            let text = line.edit.value();
            output.push(line.edit.marker());
            output.push_str(text);
            if !text.ends_with('\n') {
                output.push('\n');
                output.push_str(NO_NEWLINE_MARKER);
                output.push('\n');
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn numbered(range: std::ops::RangeInclusive<usize>) -> String {
        range.map(|n| format!("{n}\n")).collect()
    }

    #[test]
    fn equal_contents_have_no_diff() {
        assert_eq!(unified_diff(b"a\nb\n", b"a\nb\n", "from", "to"), "");
        assert_eq!(unified_diff(b"", b"", "from", "to"), "");
    }

    #[test]
    fn single_changed_line_with_context() {
        let diff = unified_diff(b"a\nb\nc\n", b"a\nB\nc\n", "from", "to");

        assert_eq!(
            diff,
            "--- from\n+++ to\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn distant_changes_produce_separate_hunks() {
        let from = numbered(1..=20);
        let to = from
            .lines()
            .map(|line| match line {
                "2" => "two\n".to_string(),
                "19" => "nineteen\n".to_string(),
                other => format!("{other}\n"),
            })
            .collect::<String>();

        let diff = unified_diff(from.as_bytes(), to.as_bytes(), "from", "to");

        assert_eq!(
            diff,
            "--- from\n+++ to\n\
             @@ -1,5 +1,5 @@\n 1\n-2\n+two\n 3\n 4\n 5\n\
             @@ -16,5 +16,5 @@\n 16\n 17\n 18\n-19\n+nineteen\n 20\n"
        );
    }

    #[test]
    fn close_changes_share_a_hunk() {
        let from = numbered(1..=10);
        let to = from.replace("3\n", "three\n").replace("8\n", "eight\n");

        let diff = unified_diff(from.as_bytes(), to.as_bytes(), "from", "to");

        assert_eq!(diff.matches("@@ -").count(), 1);
        assert!(diff.contains("@@ -1,10 +1,10 @@\n"));
    }

    #[rstest]
    #[case::created(b"".as_slice(), b"x\ny\n".as_slice(), "@@ -0,0 +1,2 @@\n+x\n+y\n")]
    #[case::emptied(b"x\n".as_slice(), b"".as_slice(), "@@ -1 +0,0 @@\n-x\n")]
    fn empty_ranges_point_before_the_hunk(
        #[case] from: &[u8],
        #[case] to: &[u8],
        #[case] expected_body: &str,
    ) {
        let diff = unified_diff(from, to, "from", "to");

        assert_eq!(diff, format!("--- from\n+++ to\n{expected_body}"));
    }

    #[test]
    fn missing_trailing_newline_is_marked() {
        let diff = unified_diff(b"a\nb", b"a\nb\n", "from", "to");

        assert_eq!(
            diff,
            "--- from\n+++ to\n@@ -1,2 +1,2 @@\n a\n-b\n\\ No newline at end of file\n+b\n"
        );
    }

    #[rstest]
    #[case::binary_source(b"\x89PNG\r\n\xff\x00".as_slice(), b"text\n".as_slice())]
    #[case::binary_target(b"text\n".as_slice(), b"\xfe\xff\x00\x01".as_slice())]
    fn binary_contents_are_not_diffed_line_by_line(#[case] from: &[u8], #[case] to: &[u8]) {
        assert_eq!(
            unified_diff(from, to, "from.bin", "to.bin"),
            "Binary files from.bin and to.bin differ\n"
        );
    }

    #[test]
    fn identical_binary_contents_have_no_diff() {
        assert_eq!(unified_diff(b"\xff\x00", b"\xff\x00", "from", "to"), "");
    }

    #[test]
    fn labels_are_used_verbatim() {
        let diff = unified_diff(b"a\n", b"b\n", "sha256:aa  x.proto", "sha256:bb  x.proto");

        assert!(diff.starts_with("--- sha256:aa  x.proto\n+++ sha256:bb  x.proto\n"));
    }
}
