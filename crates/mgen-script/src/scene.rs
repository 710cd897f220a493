//! Entry-scene discovery and import detection.

use mgen_models::TargetProfile;
use tracing::debug;

use crate::error::ScriptResult;
use crate::parser::{first_node, node_text, parse};

/// Find the first class deriving from one of the profile's scene base types.
///
/// Classes are visited in source order. Returns `Ok(None)` when the script
/// declares no scene-like class.
pub fn find_entry_scene(source: &str, profile: &TargetProfile) -> ScriptResult<Option<String>> {
    let tree = parse(source)?;
    let root = tree.root_node();

    let class = first_node(root, |node| {
        node.kind() == "class_definition" && derives_from_scene(node, source, profile)
    });

    let scene = class
        .and_then(|c| c.child_by_field_name("name"))
        .and_then(|n| node_text(&n, source))
        .map(str::to_string);

    debug!(scene = ?scene, "Entry scene lookup");
    Ok(scene)
}

fn derives_from_scene(class: &tree_sitter::Node, source: &str, profile: &TargetProfile) -> bool {
    let Some(bases) = class.child_by_field_name("superclasses") else {
        return false;
    };

    let mut cursor = bases.walk();
    let found = bases.named_children(&mut cursor).any(|base| {
        matches!(base.kind(), "identifier" | "attribute")
            && node_text(&base, source).is_some_and(|name| profile.is_scene_base(name))
    });
    found
}

/// Whether any line of `source` already imports the target library.
pub fn has_library_import(source: &str, profile: &TargetProfile) -> bool {
    source.lines().map(str::trim_start).any(|line| {
        profile
            .import_markers
            .iter()
            .any(|marker| line.starts_with(marker.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TargetProfile {
        TargetProfile::manim_community()
    }

    #[test]
    fn test_finds_first_scene_class() {
        let source = r#"from manim import *

class Helper:
    pass

class DrawCircle(Scene):
    def construct(self):
        self.play(Create(Circle()))

class Second(Scene):
    def construct(self):
        pass
"#;
        let scene = find_entry_scene(source, &profile()).unwrap();
        assert_eq!(scene.as_deref(), Some("DrawCircle"));
    }

    #[test]
    fn test_qualified_and_custom_bases() {
        let source = "import manim\n\nclass Orbit(manim.ThreeDScene):\n    def construct(self):\n        pass\n";
        assert_eq!(
            find_entry_scene(source, &profile()).unwrap().as_deref(),
            Some("Orbit")
        );

        let source = "class Graph(MyBaseScene, metaclass=Meta):\n    pass\n";
        assert_eq!(
            find_entry_scene(source, &profile()).unwrap().as_deref(),
            Some("Graph")
        );
    }

    #[test]
    fn test_no_scene_class() {
        let source = "from manim import *\n\nclass Shape(VGroup):\n    pass\n\ndef main():\n    pass\n";
        assert_eq!(find_entry_scene(source, &profile()).unwrap(), None);
    }

    #[test]
    fn test_scene_word_in_comment_is_ignored() {
        let source = "# class Fake(Scene): not real\nx = 'class Also(Scene):'\n";
        assert_eq!(find_entry_scene(source, &profile()).unwrap(), None);
    }

    #[test]
    fn test_import_detection() {
        let p = profile();
        assert!(has_library_import("from manim import *\n", &p));
        assert!(has_library_import("  import manim\n", &p));
        assert!(has_library_import("from manimlib import *\n", &p));
        assert!(!has_library_import("import numpy as np\nclass A(Scene): pass\n", &p));
    }
}
