//! End-to-end scans over parsed style sheets.

use sprig_css::parse_stylesheet;
use sprig_diagnostics::DiagnosticSink;
use sprig_source::SourceMap;
use sprig_sprite::{scan, ImageOutcome, ScanError, ScanResult, ScanSettings};
use std::path::PathBuf;

const SHEET: &str = "/site/css/main.css";

fn scan_css(css: &str, settings: &ScanSettings) -> Result<ScanResult, ScanError> {
    let mut sources = SourceMap::new();
    let id = sources.add(SHEET, css.to_string());
    let sink = DiagnosticSink::new();
    let sheet = parse_stylesheet(id, &sources, &sink);
    assert!(
        !sink.has_errors(),
        "unexpected parse errors: {:?}",
        sink.take_all()
    );
    scan(&sheet, settings)
}

const FIVE_IMAGES: &str = r#"
.one   { background: url(../i/1.gif) no-repeat 0 0; }
.two   { background-image: url("../i/2.gif"); }
.three { background: url(../i/3.gif) no-repeat 0 -20px; }
@media screen {
  .four { background-image: url('../i/4.gif'); background-repeat: no-repeat; }
}
.five  { background: transparent url(/i/5.gif) no-repeat left top; }
"#;

#[test]
fn five_images_with_two_ignored() {
    let settings = ScanSettings {
        image_root: Some(PathBuf::from("/site")),
        ignore: vec!["/site/i/1.gif".to_string(), "../i/2.gif".to_string()],
    };
    let result = scan_css(FIVE_IMAGES, &settings).unwrap();
    let paths: Vec<_> = result.output.paths().map(|p| p.to_path_buf()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/site/i/3.gif"),
            PathBuf::from("/site/i/4.gif"),
            PathBuf::from("/site/i/5.gif"),
        ]
    );
    let ignored = result
        .log
        .entries
        .iter()
        .filter(|e| matches!(e.outcome, ImageOutcome::Ignored(_)))
        .count();
    assert_eq!(ignored, 2);
}

#[test]
fn all_five_without_ignore_list() {
    let settings = ScanSettings {
        image_root: Some(PathBuf::from("/site")),
        ignore: vec![],
    };
    let result = scan_css(FIVE_IMAGES, &settings).unwrap();
    assert_eq!(result.output.len(), 5);
}

#[test]
fn token_urls_are_never_assembled() {
    let css = ".a { background-image: url(%IMAGES_ROOT%/a.gif); }\n\
               .b { background: url(%SPRITE%) no-repeat; }";
    let settings = ScanSettings {
        image_root: None,
        ignore: vec!["%IMAGES_ROOT%/a.gif".to_string()],
    };
    let result = scan_css(css, &settings).unwrap();
    assert!(result.output.is_empty());
    assert!(result
        .log
        .entries
        .iter()
        .all(|e| e.outcome == ImageOutcome::Token));
    let tokens = &result.output.token_references;
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| t.is_token));
    assert_eq!(tokens[0].absolute_image_path, PathBuf::from("%IMAGES_ROOT%/a.gif"));
}

#[test]
fn token_url_skips_position_checks() {
    let css = ".a { background: url(%SPRITE%) no-repeat 1px 2px 3px; }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert!(result.output.is_empty());
    assert_eq!(result.output.token_references.len(), 1);
}

#[test]
fn token_url_skips_repeated_layout_checks() {
    let css = ".a { background-image: url(%IMG%); background-position: 0 0; background-position: 1px 1px; }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert!(result.output.is_empty());
    assert_eq!(result.log.entries[0].outcome, ImageOutcome::Token);
}

#[test]
fn same_token_with_different_rules_is_accepted() {
    let css = ".a { background: url(%SPRITE%) no-repeat 0 0; }\n\
               .b { background: url(%SPRITE%) repeat-x 0 -16px; }\n\
               .c { background: url(../i/foo.gif) no-repeat 0 0; }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert_eq!(result.output.len(), 1);
    assert_eq!(result.output.token_references.len(), 2);
    assert!(result.output.check_consistency().is_ok());
}

#[test]
fn repeated_background_image_without_url_is_rejected() {
    let css = ".a { background-image: none; background-image: none; }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the property 'background-image' is repeated in the rule set '.a'"
    );
}

#[test]
fn color_fallback_shorthands_may_repeat() {
    let css = ".a { background: #fff; background: rgba(0, 0, 0, 0.5); }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert!(result.output.is_empty());
}

#[test]
fn image_paths_differing_in_case_are_distinct() {
    let css = ".a { background: url(../i/Foo.gif) no-repeat 0 0; }\n\
               .b { background: url(../i/foo.gif) no-repeat 0 -16px; }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert_eq!(result.output.len(), 2);
}

#[test]
fn repeated_background_image_is_rejected() {
    let css = ".logo { background-image: url(a.gif); background-image: url(b.gif); }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the property 'background-image' is repeated in the rule set '.logo'"
    );
}

#[test]
fn three_position_lengths_are_rejected() {
    let css = ".a { background-image: url(a.gif); background-position: 10px 20px 30px; }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    match err {
        ScanError::TooManyLengths { value, selector, .. } => {
            assert_eq!(value, "10px 20px 30px");
            assert_eq!(selector, ".a");
        }
        other => panic!("expected too many lengths, got {other:?}"),
    }
}

#[test]
fn too_many_lengths_fails_before_later_rules() {
    let css = ".a { background: url(a.gif) 1px 2px 3px; }\n\
               .b { background-image: url(b.gif); background-image: url(c.gif); }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    assert!(matches!(err, ScanError::TooManyLengths { .. }));
}

#[test]
fn same_image_different_positions_is_duplicate_rules() {
    let css = ".a { background: url(../i/foo.gif) no-repeat 0 0; }\n\
               .b { background: url(../i/foo.gif) no-repeat 0 -16px; }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    match &err {
        ScanError::DuplicateRules { path, first, second } => {
            assert_eq!(path, &PathBuf::from("/site/i/foo.gif"));
            assert_eq!(first.selector, ".a");
            assert_eq!(second.selector, ".b");
        }
        other => panic!("expected duplicate rules, got {other:?}"),
    }
    assert!(err.to_string().contains("/site/i/foo.gif"));
}

#[test]
fn same_image_same_rules_is_accepted_once() {
    let css = ".a { background: url(../i/foo.gif) no-repeat 0 0; }\n\
               .b, .c { background: url(\"../i/./foo.gif\") no-repeat 0px 0; }";
    let result = scan_css(css, &ScanSettings::default()).unwrap();
    assert_eq!(result.output.len(), 1);
    assert_eq!(result.output.images_to_assemble[0].origin.selector, ".a");
    let group = result
        .output
        .occurrences(&PathBuf::from("/site/i/foo.gif"));
    assert_eq!(group.len(), 2);
    assert_eq!(group[1].origin.selector, ".b, .c");
}

#[test]
fn same_image_literal_and_vendor_is_duplicate_format() {
    let css = ".a { background-image: url(a.png); }\n\
               .b { background-image: -moz-image-set(url(a.png)); }";
    let err = scan_css(css, &ScanSettings::default()).unwrap_err();
    assert!(matches!(err, ScanError::DuplicateFormat { .. }));
    assert!(err.to_string().contains("different background formats"));
}

#[test]
fn diagnostics_point_at_conflicting_rule() {
    let css = ".a { background: url(foo.gif) 0 0; }\n.b { background: url(foo.gif) 0 1px; }";
    let mut sources = SourceMap::new();
    let id = sources.add(SHEET, css.to_string());
    let sink = DiagnosticSink::new();
    let sheet = parse_stylesheet(id, &sources, &sink);
    let err = scan(&sheet, &ScanSettings::default()).unwrap_err();

    let diag = err.to_diagnostic();
    assert_eq!(diag.code.to_string(), "E204");
    let location = sources.locate(diag.primary_span);
    assert_eq!(location.start_line, 2);
}
