//! Built-in defaults, seeded into the default tier of the store.

use super::key_path::KeyPath;
use super::store::ConfigStore;
use serde_json::{Value, json};

/// Environment label used when none is given.
pub const ENVIRONMENT_PRODUCTION: &str = "production";

pub const ENVIRONMENT_DEVELOPMENT: &str = "development";

/// Markdown renderer defaults.
fn markdown_defaults() -> Value {
    json!({
        "smartypants": true,
        "angledquotes": false,
        "smartypantsquotesnbsp": false,
        "fractions": true,
        "hreftargetblank": false,
        "nofollowlinks": false,
        "noreferrerlinks": false,
        "smartdashes": true,
        "latexdashes": true,
        "plainidanchors": true,
        "tasklists": true,
        "skiphtml": false
    })
}

/// All built-in `(key, value)` defaults.
pub fn builtin_defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("cleanDestinationDir", json!(false)),
        ("watch", json!(false)),
        ("metaDataFormat", json!("toml")),
        ("contentDir", json!("content")),
        ("layoutDir", json!("layouts")),
        ("assetDir", json!("assets")),
        ("staticDir", json!("static")),
        ("resourceDir", json!("resources")),
        ("archetypeDir", json!("archetypes")),
        ("publishDir", json!("public")),
        ("dataDir", json!("data")),
        ("i18nDir", json!("i18n")),
        ("themesDir", json!("themes")),
        ("buildDrafts", json!(false)),
        ("buildFuture", json!(false)),
        ("buildExpired", json!(false)),
        ("environment", json!(ENVIRONMENT_PRODUCTION)),
        ("uglyURLs", json!(false)),
        ("verbose", json!(false)),
        ("ignoreCache", json!(false)),
        ("canonifyURLs", json!(false)),
        ("relativeURLs", json!(false)),
        ("removePathAccents", json!(false)),
        ("titleCaseStyle", json!("AP")),
        ("taxonomies", json!({"tag": "tags", "category": "categories"})),
        ("permalinks", json!({})),
        ("sitemap", json!({"priority": -1, "filename": "sitemap.xml"})),
        ("pygmentsStyle", json!("monokai")),
        ("pygmentsUseClasses", json!(false)),
        ("pygmentsCodeFences", json!(false)),
        ("pygmentsUseClassic", json!(false)),
        ("pygmentsOptions", json!("")),
        ("disableLiveReload", json!(false)),
        ("pluralizeListTitles", json!(true)),
        ("forceSyncStatic", json!(false)),
        ("footnoteAnchorPrefix", json!("")),
        ("footnoteReturnLinkContents", json!("")),
        ("newContentEditor", json!("")),
        ("paginate", json!(10)),
        ("paginatePath", json!("page")),
        ("summaryLength", json!(70)),
        ("blackfriday", markdown_defaults()),
        ("rssLimit", json!(-1)),
        ("sectionPagesMenu", json!("")),
        ("disablePathToLower", json!(false)),
        ("hasCJKLanguage", json!(false)),
        ("enableEmoji", json!(false)),
        ("pygmentsCodeFencesGuessSyntax", json!(false)),
        ("defaultContentLanguage", json!("en")),
        ("defaultContentLanguageInSubdir", json!(false)),
        ("enableMissingTranslationPlaceholders", json!(false)),
        ("enableGitInfo", json!(false)),
        ("ignoreFiles", json!([])),
        ("disableAliases", json!(false)),
        ("debug", json!(false)),
        ("disableFastRender", json!(false)),
        ("timeout", json!(10000)), // 10 seconds
        ("enableInlineShortcodes", json!(false)),
        ("modProxy", json!("direct")),
    ]
}

/// Register key aliases and seed every built-in default into the default
/// tier. Explicit values already in the store keep precedence.
pub fn load_default_settings(store: &mut ConfigStore) {
    store.register_alias("indexes", "taxonomies");
    for (key, value) in builtin_defaults() {
        store.set_default(&KeyPath::parse(key), value);
    }
}
