use crate::artifacts::pr::StateTransition;
use crate::artifacts::state::module_state::ModuleState;
use tracing::debug;

/// Number of references the head state appends to the base state
pub fn appended_count(base: &ModuleState, head: &ModuleState) -> usize {
    head.references()
        .len()
        .saturating_sub(base.references().len())
}

/// Head line numbers of the `"digest"` entries added by a `git diff -U0` of a state file
///
/// The n-th added digest line is assigned to the n-th appended reference; references
/// without one get 0.
pub fn digest_line_numbers(diff_output: &str, expected_count: usize) -> Vec<usize> {
    let mut line_numbers = vec![0; expected_count];
    let mut next_reference = 0;
    let mut current_line = 0;
    let mut in_hunk = false;

    for line in diff_output.lines() {
        if line.starts_with("@@") {
            // @@ -275,0 +276,12 @@
            if let Some(new_range) = line.split(' ').nth(2) {
                if let Some(start) = new_range
                    .trim_start_matches('+')
                    .split(',')
                    .next()
                    .and_then(|start| start.parse().ok())
                {
                    current_line = start;
                }
                in_hunk = true;
                continue;
            }
        }

        if !in_hunk || !line.starts_with('+') || line.starts_with("+++") {
            continue;
        }

        if line.contains(r#""digest""#) && next_reference < line_numbers.len() {
            line_numbers[next_reference] = current_line;
            next_reference += 1;
        }
        current_line += 1;
    }

    line_numbers
}

/// Digest transitions introduced by the references appended to a module state file
///
/// The running digest starts at the last base reference, or at the first appended one
/// when the base state is empty. `line_numbers` is indexed like the appended references.
pub fn detect_transitions(
    file_path: &str,
    base: &ModuleState,
    head: &ModuleState,
    line_numbers: &[usize],
) -> Vec<StateTransition> {
    let base_count = base.references().len();
    let appended = head.references().get(base_count..).unwrap_or_default();

    let (mut current, skip) = match base.last() {
        Some(last) => (last, 0),
        None => match appended.first() {
            Some(first) => (first, 1),
            None => return Vec::new(),
        },
    };
    let module_path = file_path
        .rsplit_once('/')
        .map_or(".", |(dir, _)| dir)
        .to_string();

    let mut transitions = Vec::new();
    let mut current_digest = current.digest();
    for (index, reference) in appended.iter().enumerate().skip(skip) {
        if reference.digest() != current_digest {
            let line_number = line_numbers.get(index).copied().unwrap_or(0);
            debug!(
                file_path,
                from = current.name(),
                to = reference.name(),
                line_number,
                "digest transition"
            );
            transitions.push(StateTransition::new(
                module_path.clone(),
                file_path.to_string(),
                current.name().to_string(),
                reference.name().to_string(),
                current_digest.to_string(),
                reference.digest().to_string(),
                line_number,
            ));
            current_digest = reference.digest();
        }
        current = reference;
    }

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::state::module_state::ModuleReference;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const FILE: &str = "modules/sync/bufbuild/protovalidate/state.json";

    fn state(references: &[(&str, &str)]) -> ModuleState {
        ModuleState::new(
            references
                .iter()
                .map(|(name, digest)| ModuleReference::new(name.to_string(), digest.to_string()))
                .collect(),
        )
    }

    fn transition(from: (&str, &str), to: (&str, &str), line_number: usize) -> StateTransition {
        StateTransition::new(
            "modules/sync/bufbuild/protovalidate".to_string(),
            FILE.to_string(),
            from.0.to_string(),
            to.0.to_string(),
            from.1.to_string(),
            to.1.to_string(),
            line_number,
        )
    }

    #[rstest]
    #[case::single_digest_change(
        r#"@@ -275,0 +276,6 @@
+    },
+    {
+      "name": "v1.1.0",
+      "digest": "35b3d88f6b0fbf159d9eedfc2fbfa976490e6bca1d98914c1c71f29bfe2da6261fca56c057975b3e5c022b3234a0f2eea8e2d1b599a937c6c5d63d21201a9bc3"
+    }
+  ]"#,
        1,
        vec![279]
    )]
    #[case::multiple_digest_changes(
        r#"@@ -100,0 +101,12 @@
+    },
+    {
+      "name": "v1.1.0",
+      "digest": "aaa"
+    },
+    {
+      "name": "v1.2.0",
+      "digest": "bbb"
+    },
+    {
+      "name": "v1.3.0",
+      "digest": "ccc""#,
        3,
        vec![104, 108, 112]
    )]
    #[case::multiple_hunks(
        r#"@@ -50,0 +51,4 @@
+    {
+      "name": "v2.0.0",
+      "digest": "xxx"
+    }
@@ -100,0 +105,4 @@
+    {
+      "name": "v3.0.0",
+      "digest": "yyy"
+    }"#,
        2,
        vec![53, 107]
    )]
    #[case::no_digest_lines(
        r#"@@ -10,0 +11,4 @@
+    {
+      "name": "v1.0.0",
+      "other": "field"
+    }"#,
        1,
        vec![0]
    )]
    #[case::empty_diff("", 1, vec![0])]
    #[case::file_headers_are_ignored(
        r#"diff --git a/state.json b/state.json
--- a/state.json
+++ b/state.json
@@ -200,0 +201,8 @@
+    {
+      "name": "v0.1.0",
+      "digest": "abc123"
+    },
+    {
+      "name": "v0.2.0",
+      "digest": "def456"
+    }"#,
        2,
        vec![203, 207]
    )]
    fn line_numbers_of_appended_digests(
        #[case] diff_output: &str,
        #[case] expected_count: usize,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(digest_line_numbers(diff_output, expected_count), expected);
    }

    #[test]
    fn extra_digest_lines_are_dropped() {
        let diff_output = "@@ -1,0 +2,2 @@\n+ \"digest\": \"a\"\n+ \"digest\": \"b\"\n";

        assert_eq!(digest_line_numbers(diff_output, 1), vec![2]);
    }

    #[test]
    fn transitions_start_from_the_last_base_reference() {
        let base = state(&[("v0.9.0", "aaa"), ("v1.0.0", "aaa")]);
        let head = state(&[
            ("v0.9.0", "aaa"),
            ("v1.0.0", "aaa"),
            ("v1.1.0", "aaa"),
            ("v1.2.0", "bbb"),
            ("v1.3.0", "ccc"),
        ]);

        let transitions = detect_transitions(FILE, &base, &head, &[10, 14, 18]);

        assert_eq!(appended_count(&base, &head), 3);
        assert_eq!(
            transitions,
            vec![
                transition(("v1.1.0", "aaa"), ("v1.2.0", "bbb"), 14),
                transition(("v1.2.0", "bbb"), ("v1.3.0", "ccc"), 18),
            ]
        );
    }

    #[test]
    fn empty_base_uses_first_appended_reference_as_baseline() {
        let base = state(&[]);
        let head = state(&[("v1.0.0", "aaa"), ("v1.1.0", "bbb")]);

        let transitions = detect_transitions(FILE, &base, &head, &[4, 8]);

        assert_eq!(
            transitions,
            vec![transition(("v1.0.0", "aaa"), ("v1.1.0", "bbb"), 8)]
        );
    }

    #[test]
    fn unchanged_digests_and_missing_line_numbers() {
        let base = state(&[("v1.0.0", "aaa")]);
        let same = state(&[("v1.0.0", "aaa"), ("v1.0.1", "aaa")]);
        let changed = state(&[("v1.0.0", "aaa"), ("v1.0.1", "bbb")]);

        assert!(detect_transitions(FILE, &base, &same, &[3]).is_empty());
        assert_eq!(
            detect_transitions(FILE, &base, &changed, &[]),
            vec![transition(("v1.0.0", "aaa"), ("v1.0.1", "bbb"), 0)]
        );
    }

    #[test]
    fn shrinking_or_empty_histories_have_no_transitions() {
        let base = state(&[("v1.0.0", "aaa"), ("v1.1.0", "bbb")]);
        let head = state(&[("v1.0.0", "aaa")]);

        assert_eq!(appended_count(&base, &head), 0);
        assert!(detect_transitions(FILE, &base, &head, &[]).is_empty());
        assert!(detect_transitions(FILE, &state(&[]), &state(&[]), &[]).is_empty());
    }
}
