use sm_highlight::theme::{
    list_available_themes, load_theme, Color, FontStyle, Theme, ThemeSource, BUILTIN_THEMES,
    GITHUB_DARK_YAML, GITHUB_LIGHT_YAML,
};

fn scopes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_color_from_hex_6() {
    let color = Color::from_hex("#1E1E1E").unwrap();
    assert_eq!(color.r, 0x1E);
    assert_eq!(color.g, 0x1E);
    assert_eq!(color.b, 0x1E);
    assert_eq!(color.a, 255);
}

#[test]
fn test_color_from_hex_8() {
    let color = Color::from_hex("#1E1E1E80").unwrap();
    assert_eq!(color.a, 0x80);
    assert_eq!(color.to_css(), "#1e1e1e80");
}

#[test]
fn test_color_from_hex_invalid() {
    assert!(Color::from_hex("#12345").is_err());
    assert!(Color::from_hex("#gggggg").is_err());
    assert!(Color::from_hex("#ééé").is_err());
}

#[test]
fn test_parse_github_dark() {
    let theme = Theme::from_yaml("github-dark", GITHUB_DARK_YAML).unwrap();
    assert_eq!(theme.name, "GitHub Dark");
    assert_eq!(theme.background, Color::rgb(0x24, 0x29, 0x2e));
}

#[test]
fn test_parse_github_light() {
    let theme = Theme::from_yaml("github-light", GITHUB_LIGHT_YAML).unwrap();
    assert_eq!(theme.name, "GitHub Light");
    assert_eq!(theme.background, Color::rgb(0xff, 0xff, 0xff));
}

#[test]
fn test_all_builtin_themes_parse() {
    for builtin in BUILTIN_THEMES {
        let theme = Theme::from_builtin(builtin.id)
            .unwrap_or_else(|e| panic!("{} failed: {}", builtin.id, e));
        assert_eq!(theme.id, builtin.id);
        assert!(!theme.rules.is_empty());
    }
}

#[test]
fn test_load_theme_falls_back_to_builtin() {
    let theme = load_theme("github-dark").unwrap();
    assert_eq!(theme.id, "github-dark");
    assert!(load_theme("does-not-exist").is_err());
}

#[test]
fn test_list_includes_builtins() {
    let themes = list_available_themes();
    for id in ["github-dark", "github-light"] {
        assert!(
            themes.iter().any(|t| t.id == id),
            "{} missing from theme list",
            id
        );
    }
    assert!(themes
        .iter()
        .any(|t| t.source == ThemeSource::Builtin));
}

#[test]
fn test_samarium_scopes_resolve() {
    let theme = Theme::from_builtin("github-dark").unwrap();

    let number = theme.style_for(&scopes(&["source.samarium", "constant.numeric.samarium"]));
    assert_eq!(number.foreground.to_css(), "#79b8ff");

    let op = theme.style_for(&scopes(&["source.samarium", "keyword.operator.samarium"]));
    assert_eq!(op.foreground.to_css(), "#f97583");

    let comment = theme.style_for(&scopes(&[
        "source.samarium",
        "comment.line.double-equals.samarium",
    ]));
    assert_eq!(comment.foreground.to_css(), "#6a737d");

    let plain = theme.style_for(&scopes(&["source.samarium"]));
    assert_eq!(plain, theme.default_style());
}

#[test]
fn test_escape_is_bold() {
    let theme = Theme::from_builtin("github-dark").unwrap();
    let style = theme.style_for(&scopes(&[
        "source.samarium",
        "string.quoted.double.samarium",
        "constant.character.escape.samarium",
    ]));
    assert_eq!(
        style.font_style,
        FontStyle {
            bold: true,
            ..FontStyle::default()
        }
    );
}

#[test]
fn test_invalid_yaml() {
    assert!(Theme::from_yaml("broken", "name: [").is_err());
}
