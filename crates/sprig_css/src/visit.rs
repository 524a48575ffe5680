//! Depth-first traversal of the rule tree.
//!
//! Implement [`Visitor`] and override the hooks you care about; every hook
//! defaults to the matching `walk_*` function, which recurses into children
//! in document order. An `Err` from any hook stops the traversal.

use crate::ast::*;

/// A fallible visitor over a [`StyleSheet`].
pub trait Visitor {
    /// Error that aborts the traversal.
    type Error;

    /// Called once for the sheet.
    fn visit_stylesheet(&mut self, sheet: &StyleSheet) -> Result<(), Self::Error> {
        walk_stylesheet(self, sheet)
    }

    /// Called for every rule before dispatching on its kind.
    fn visit_rule(&mut self, rule: &Rule) -> Result<(), Self::Error> {
        walk_rule(self, rule)
    }

    /// Called for every rule set, including ones nested in at-rules.
    fn visit_rule_set(&mut self, rule_set: &RuleSet) -> Result<(), Self::Error> {
        walk_rule_set(self, rule_set)
    }

    /// Called for `@media` blocks.
    fn visit_media(&mut self, media: &MediaRule) -> Result<(), Self::Error> {
        walk_media(self, media)
    }

    /// Called for `@import` statements.
    fn visit_import(&mut self, _import: &ImportRule) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for other at-rules.
    fn visit_at_rule(&mut self, at_rule: &AtRule) -> Result<(), Self::Error> {
        walk_at_rule(self, at_rule)
    }

    /// Called for every declaration.
    fn visit_declaration(&mut self, _declaration: &Declaration) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Visits every top-level rule.
pub fn walk_stylesheet<V: Visitor + ?Sized>(
    visitor: &mut V,
    sheet: &StyleSheet,
) -> Result<(), V::Error> {
    for rule in &sheet.rules {
        visitor.visit_rule(rule)?;
    }
    Ok(())
}

/// Dispatches to the hook for the rule's kind.
pub fn walk_rule<V: Visitor + ?Sized>(visitor: &mut V, rule: &Rule) -> Result<(), V::Error> {
    match rule {
        Rule::RuleSet(rs) => visitor.visit_rule_set(rs),
        Rule::Media(m) => visitor.visit_media(m),
        Rule::Import(i) => visitor.visit_import(i),
        Rule::AtRule(a) => visitor.visit_at_rule(a),
    }
}

/// Visits the declarations of a rule set.
pub fn walk_rule_set<V: Visitor + ?Sized>(
    visitor: &mut V,
    rule_set: &RuleSet,
) -> Result<(), V::Error> {
    for decl in &rule_set.declarations {
        visitor.visit_declaration(decl)?;
    }
    Ok(())
}

/// Visits the rules nested in a `@media` block.
pub fn walk_media<V: Visitor + ?Sized>(visitor: &mut V, media: &MediaRule) -> Result<(), V::Error> {
    for rule in &media.rules {
        visitor.visit_rule(rule)?;
    }
    Ok(())
}

/// Visits the body of an at-rule.
pub fn walk_at_rule<V: Visitor + ?Sized>(visitor: &mut V, at_rule: &AtRule) -> Result<(), V::Error> {
    match &at_rule.body {
        AtRuleBody::None => Ok(()),
        AtRuleBody::Declarations(decls) => {
            for decl in decls {
                visitor.visit_declaration(decl)?;
            }
            Ok(())
        }
        AtRuleBody::Rules(rules) => {
            for rule in rules {
                visitor.visit_rule(rule)?;
            }
            Ok(())
        }
    }
}

impl StyleSheet {
    /// Runs `visitor` over this sheet.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_stylesheet(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_source::{SourceId, Span};
    use std::path::PathBuf;

    fn rule_set(selector: &str, props: &[&str]) -> Rule {
        Rule::RuleSet(RuleSet {
            selectors: vec![selector.to_string()],
            declarations: props
                .iter()
                .map(|p| Declaration {
                    property: p.to_string(),
                    value: Value::default(),
                    important: false,
                    span: Span::SYNTHETIC,
                })
                .collect(),
            span: Span::SYNTHETIC,
        })
    }

    fn sheet() -> StyleSheet {
        StyleSheet {
            source: SourceId::from_raw(0),
            path: PathBuf::from("/s/site.css"),
            rules: vec![
                rule_set(".a", &["color"]),
                Rule::Media(MediaRule {
                    query: "print".into(),
                    rules: vec![rule_set(".b", &["background", "margin"])],
                    span: Span::SYNTHETIC,
                }),
                rule_set(".c", &["padding"]),
            ],
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        stop_at: Option<&'static str>,
    }

    impl Visitor for Recorder {
        type Error = String;

        fn visit_rule_set(&mut self, rule_set: &RuleSet) -> Result<(), String> {
            self.seen.push(rule_set.selector_text());
            walk_rule_set(self, rule_set)
        }

        fn visit_declaration(&mut self, decl: &Declaration) -> Result<(), String> {
            if self.stop_at == Some(decl.property.as_str()) {
                return Err(decl.property.clone());
            }
            self.seen.push(decl.property.clone());
            Ok(())
        }
    }

    #[test]
    fn document_order_depth_first() {
        let mut rec = Recorder::default();
        sheet().accept(&mut rec).unwrap();
        assert_eq!(
            rec.seen,
            vec![".a", "color", ".b", "background", "margin", ".c", "padding"]
        );
    }

    #[test]
    fn error_stops_traversal() {
        let mut rec = Recorder {
            stop_at: Some("background"),
            ..Default::default()
        };
        let err = sheet().accept(&mut rec).unwrap_err();
        assert_eq!(err, "background");
        assert_eq!(rec.seen, vec![".a", "color", ".b"]);
    }
}
