//! Prompt construction for scene-script generation.

use std::fmt::Write;

use mgen_models::{GenerationRequest, TargetProfile};

/// Build the fixed system instruction for a target profile.
pub fn system_prompt(profile: &TargetProfile) -> String {
    let mut prompt = format!(
        r#"You are an expert in creating mathematical animations using {library}.
Given a description, generate Python code that creates the described animation.
Only output valid, executable Python code without any explanations.

The code should:
1. Start with `{import}`
2. Define exactly one class that inherits from Scene
3. Implement the `{method}(self)` method on that class
4. Include appropriate animations and mathematical objects

Important notes:
"#,
        library = profile.library,
        import = profile.default_import,
        method = profile.build_method,
    );

    for banned in &profile.banned_symbols {
        let _ = writeln!(
            prompt,
            "- Use {} instead of {}; {} is deprecated",
            banned.replacement, banned.symbol, banned.symbol
        );
    }
    for line in &profile.guidance {
        let _ = writeln!(prompt, "- {}", line);
    }

    prompt.push_str("\nOutput ONLY the Python code with no additional text.\n");
    prompt
}

/// Build the user message, appending failure feedback on regeneration.
pub fn user_prompt(request: &GenerationRequest, profile: &TargetProfile) -> String {
    let mut prompt = format!(
        "Create an animation for the following description:\n\n{}\n\nReturn only the Python code.",
        request.prompt.trim()
    );

    if let Some(error) = &request.last_error {
        let _ = write!(
            prompt,
            "\n\nThe previous code you generated resulted in the following error:\n{}\n\n\
             Please fix the code to avoid this error. Common fixes:\n",
            error.trim()
        );
        for banned in &profile.banned_symbols {
            let _ = writeln!(
                prompt,
                "- If \"{} not defined\": use {} instead",
                banned.symbol, banned.replacement
            );
        }
        let _ = writeln!(
            prompt,
            "- Make sure every class you use is imported via `{}`",
            profile.default_import
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_banned_symbols() {
        let profile = TargetProfile::manim_community();
        let prompt = system_prompt(&profile);
        assert!(prompt.contains("Use Create() instead of ShowCreation"));
        assert!(prompt.contains("Use Text() instead of TextMobject"));
        assert!(prompt.contains("from manim import *"));
        assert!(prompt.contains("construct(self)"));
    }

    #[test]
    fn test_user_prompt_feedback_only_on_regeneration() {
        let profile = TargetProfile::manim_community();
        let first = GenerationRequest::new("draw a circle");
        let prompt = user_prompt(&first, &profile);
        assert!(prompt.contains("draw a circle"));
        assert!(!prompt.contains("previous code"));

        let retry = first.regenerate("NameError: name 'Foo' is not defined");
        let prompt = user_prompt(&retry, &profile);
        assert!(prompt.contains("draw a circle"));
        assert!(prompt.contains("NameError: name 'Foo' is not defined"));
        assert!(prompt.contains("use Create() instead"));
    }
}
