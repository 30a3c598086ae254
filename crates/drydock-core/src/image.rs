//! Deterministic image tag derivation.
//!
//! Tags are a pure function of the repository name, commit, and branch so
//! that rebuilding the same commit always produces the same references.

/// Maximum length Docker accepts for a tag.
const MAX_TAG_LEN: usize = 128;

/// Derive the image tags for a build: `name:<short-sha>` plus
/// `name:<branch>` when the branch yields a usable tag.
pub fn derive_tags(repo_name: &str, commit_sha: &str, branch: &str) -> Vec<String> {
    let short_sha: String = commit_sha.chars().take(12).collect();
    let mut tags = vec![format!("{}:{}", repo_name, short_sha)];

    let branch_tag = sanitize_tag(branch);
    if !branch_tag.is_empty() && branch_tag != short_sha {
        tags.push(format!("{}:{}", repo_name, branch_tag));
    }
    tags
}

/// Map a branch name onto the tag grammar: lowercase alphanumerics plus
/// `_`, `.` and `-`, not starting with a separator.
fn sanitize_tag(name: &str) -> String {
    let mut tag: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '.' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect();
    while tag.starts_with(['-', '.', '_']) {
        tag.remove(0);
    }
    tag.truncate(MAX_TAG_LEN);
    tag
}
