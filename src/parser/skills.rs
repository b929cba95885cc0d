//! Skill tag cleanup for the token run between the fixed header and trailer
//! lines of a posting.

/// Truncation link shown after a collapsed skill list.
const MORE: &str = "more";

/// Control labels and badges that land in the skill run.
const NOISE: &[&str] = &[
    "Next skills. Update list",
    "Skip skills",
    "  Payment verified",
    "  Payment unverified",
];

/// Remove pagination controls and badges from a skill token run.
///
/// The first `"more"` is removed together with the token right before it:
/// that token is the truncation marker the "more" link hangs off, not a
/// skill. All other noise tokens are dropped wherever they appear.
pub fn sanitize<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut out: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();

    if let Some(pos) = out.iter().position(|t| t == MORE) {
        out.remove(pos);
        if pos > 0 {
            out.remove(pos - 1);
        }
    }

    out.retain(|t| !NOISE.contains(&t.as_str()));
    out
}
