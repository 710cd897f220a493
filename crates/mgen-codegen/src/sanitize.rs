//! Post-processing of raw model output.

use mgen_models::TargetProfile;
use mgen_script::has_library_import;

/// Remove markdown code fences (```` ```python ````, ```` ``` ````) from model output.
///
/// When the response wraps code in a fenced block with prose around it, only
/// the first fenced block is kept.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }

    let mut body = Vec::new();
    let mut inside = false;

    for line in trimmed.lines() {
        let is_fence = line.trim_start().starts_with("```");
        match (inside, is_fence) {
            (false, true) => inside = true,
            (true, true) => break,
            (true, false) => body.push(line),
            (false, false) => {}
        }
    }

    if body.is_empty() {
        // Fences without content between them; drop the markers only.
        return trimmed
            .lines()
            .filter(|l| !l.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
    }

    body.join("\n").trim().to_string()
}

/// Prepend the profile's default import when the script has none.
pub fn ensure_import(source: &str, profile: &TargetProfile) -> String {
    if has_library_import(source, profile) {
        source.to_string()
    } else {
        format!("{}\n\n{}", profile.default_import, source)
    }
}

/// Full sanitize pass: strip fences, then ensure an import line.
pub fn sanitize(raw: &str, profile: &TargetProfile) -> String {
    ensure_import(&strip_code_fences(raw), profile)
}
