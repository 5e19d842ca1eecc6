//! File extension to language mapping.

use std::collections::HashMap;
use std::sync::LazyLock;

static EXTENSION_TO_LANGUAGE: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("js", "JavaScript"),
        ("jsx", "JavaScript"),
        ("mjs", "JavaScript"),
        ("ts", "TypeScript"),
        ("tsx", "TypeScript"),
        ("py", "Python"),
        ("rb", "Ruby"),
        ("rs", "Rust"),
        ("go", "Go"),
        ("java", "Java"),
        ("kt", "Kotlin"),
        ("swift", "Swift"),
        ("c", "C"),
        ("h", "C"),
        ("cpp", "C++"),
        ("cc", "C++"),
        ("hpp", "C++"),
        ("cs", "C#"),
        ("php", "PHP"),
        ("scala", "Scala"),
        ("dart", "Dart"),
        ("lua", "Lua"),
        ("r", "R"),
        ("html", "HTML"),
        ("css", "CSS"),
        ("scss", "SCSS"),
        ("vue", "Vue"),
        ("svelte", "Svelte"),
        ("md", "Markdown"),
        ("json", "JSON"),
        ("yml", "YAML"),
        ("yaml", "YAML"),
        ("toml", "TOML"),
        ("xml", "XML"),
        ("sql", "SQL"),
        ("sh", "Shell"),
        ("bash", "Shell"),
        ("txt", "Text"),
    ])
});

/// Language for a file name, derived from the text after its last `.`.
///
/// A name without a dot is looked up whole. Lookup is exact, so `README` or
/// `Main.RS` map to nothing.
pub fn language_for_filename(filename: &str) -> Option<&'static str> {
    let extension = filename.rsplit('.').next().unwrap_or(filename);
    EXTENSION_TO_LANGUAGE.get(extension).copied()
}
