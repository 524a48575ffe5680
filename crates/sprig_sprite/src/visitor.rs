//! The image assembly scan.
//!
//! [`ImageAssemblyScanVisitor`] walks a style sheet and, for every rule set
//! with a background image, works out the image path and its layout
//! (position and repeat). Rule-level problems fail as soon as the rule set
//! is visited; conflicts between rule sets that share an image are checked
//! once the whole sheet has been seen.

use crate::analysis::{AnalysisLog, ImageOutcome};
use crate::error::ScanError;
use crate::output::{ImageFormat, ImageReference, RuleOrigin, ScanOutput};
use crate::position::{position_components, BackgroundRepeat, ImagePosition};
use crate::resolve::{is_raster_image, ScanSettings, UrlResolver};
use serde::{Deserialize, Serialize};
use sprig_css::visit::walk_stylesheet;
use sprig_css::{Declaration, RuleSet, StyleSheet, Term, UrlValue, Visitor};
use std::path::PathBuf;
use tracing::debug;

const BACKGROUND: &str = "background";
const BACKGROUND_IMAGE: &str = "background-image";
const BACKGROUND_POSITION: &str = "background-position";
const BACKGROUND_REPEAT: &str = "background-repeat";

/// The result of a successful scan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Images to assemble.
    pub output: ScanOutput,
    /// What happened to every image-bearing declaration.
    pub log: AnalysisLog,
}

/// Scans `sheet` with `settings`.
pub fn scan(sheet: &StyleSheet, settings: &ScanSettings) -> Result<ScanResult, ScanError> {
    let mut visitor = ImageAssemblyScanVisitor::new(sheet, settings);
    sheet.accept(&mut visitor)?;
    Ok(visitor.into_result())
}

/// Where a url sits inside a declaration value.
#[derive(Clone, Debug, PartialEq)]
enum UrlContext {
    Bare,
    Vendor(String),
    Function(String),
}

/// Collects sprite candidates from one style sheet.
pub struct ImageAssemblyScanVisitor {
    resolver: UrlResolver,
    output: ScanOutput,
    log: AnalysisLog,
}

impl ImageAssemblyScanVisitor {
    /// Creates a visitor for `sheet`; relative urls resolve against its directory.
    pub fn new(sheet: &StyleSheet, settings: &ScanSettings) -> Self {
        Self {
            resolver: UrlResolver::new(&sheet.path, settings),
            output: ScanOutput::new(),
            log: AnalysisLog::default(),
        }
    }

    /// Output recorded so far.
    pub fn output(&self) -> &ScanOutput {
        &self.output
    }

    /// Consumes the visitor.
    pub fn into_result(self) -> ScanResult {
        ScanResult {
            output: self.output,
            log: self.log,
        }
    }

    fn scan_rule_set(&mut self, rule_set: &RuleSet) -> Result<(), ScanError> {
        let selector = rule_set.selector_text();
        let image = single(rule_set, BACKGROUND_IMAGE, &selector)?;
        let shorthand = effective_shorthand(rule_set, &selector)?;

        let shorthand_has_url = shorthand.is_some_and(has_url);
        let image_decl = match image.filter(|d| has_url(d)) {
            Some(longhand) if shorthand_has_url => {
                return Err(ScanError::RepeatedProperty {
                    property: BACKGROUND_IMAGE.to_string(),
                    selector,
                    span: longhand.span,
                });
            }
            Some(longhand) => longhand,
            None => match shorthand.filter(|_| shorthand_has_url) {
                Some(decl) => decl,
                None => return Ok(()),
            },
        };
        let span = image_decl.span;

        let mut urls = Vec::new();
        collect_urls(&image_decl.value.terms, &UrlContext::Bare, &mut urls);
        if urls.len() > 1 {
            let written = urls
                .iter()
                .map(|(u, _)| u.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            debug!(selector = %selector, urls = %written, "skipping declaration with multiple images");
            self.log.push(&selector, span, written, ImageOutcome::MultipleImages);
            return Ok(());
        }
        let Some((url, context)) = urls.pop() else {
            return Ok(());
        };

        let origin = RuleOrigin {
            selector: selector.clone(),
            span: rule_set.span,
        };
        if url.is_placeholder() {
            debug!(selector = %selector, url = %url, "skipping tokenized image url");
            self.log.push(&selector, span, url.as_str(), ImageOutcome::Token);
            self.output.record(ImageReference {
                absolute_image_path: PathBuf::from(url.as_str()),
                origin,
                format: context_format(&context),
                position: None,
                repeat: None,
                is_token: true,
            });
            return Ok(());
        }

        let position = single(rule_set, BACKGROUND_POSITION, &selector)?;
        let repeat = single(rule_set, BACKGROUND_REPEAT, &selector)?;

        // Longhands override whatever the shorthand says.
        let mut layout_position = None;
        if let Some(decl) = shorthand {
            layout_position = position_of(decl, &selector)?;
        }
        if let Some(decl) = position {
            layout_position = position_of(decl, &selector)?;
        }
        let layout_repeat = repeat
            .and_then(|d| BackgroundRepeat::from_terms(&d.value.terms))
            .or_else(|| shorthand.and_then(|d| BackgroundRepeat::from_terms(&d.value.terms)));

        let Some(path) = self.resolver.resolve(url.as_str()) else {
            debug!(selector = %selector, url = %url, "skipping external image url");
            self.log.push(&selector, span, url.as_str(), ImageOutcome::External);
            return Ok(());
        };
        if self.resolver.is_ignored(&path) {
            debug!(selector = %selector, path = %path.display(), "image is on the ignore list");
            self.log.push(&selector, span, url.as_str(), ImageOutcome::Ignored(path));
            return Ok(());
        }

        let format = if is_raster_image(&path) {
            context_format(&context)
        } else {
            ImageFormat::Unsupported
        };
        if format == ImageFormat::Unsupported {
            let why = match &context {
                UrlContext::Function(name) => format!("image inside {name}()"),
                _ => "not a raster image".to_string(),
            };
            debug!(selector = %selector, path = %path.display(), reason = %why, "skipping unsupported image");
            self.log
                .push(&selector, span, url.as_str(), ImageOutcome::Unsupported(why));
            return Ok(());
        }

        self.log
            .push(&selector, span, url.as_str(), ImageOutcome::Included(path.clone()));
        self.output.record(ImageReference {
            absolute_image_path: path,
            origin,
            format,
            position: layout_position,
            repeat: layout_repeat,
            is_token: false,
        });
        Ok(())
    }
}

impl Visitor for ImageAssemblyScanVisitor {
    type Error = ScanError;

    fn visit_stylesheet(&mut self, sheet: &StyleSheet) -> Result<(), ScanError> {
        walk_stylesheet(self, sheet)?;
        self.output.check_consistency()
    }

    fn visit_rule_set(&mut self, rule_set: &RuleSet) -> Result<(), ScanError> {
        self.scan_rule_set(rule_set)
    }
}

/// The only declaration of `property`, or a repeated-property error.
fn single<'a>(
    rule_set: &'a RuleSet,
    property: &str,
    selector: &str,
) -> Result<Option<&'a Declaration>, ScanError> {
    let mut found = rule_set.declarations_named(property);
    let first = found.next();
    if let Some(repeated) = found.next() {
        return Err(ScanError::RepeatedProperty {
            property: property.to_string(),
            selector: selector.to_string(),
            span: repeated.span,
        });
    }
    Ok(first)
}

/// The `background` shorthand in effect. It may only repeat while none of
/// the repeats carries a url (color fallbacks); the last one wins.
fn effective_shorthand<'a>(
    rule_set: &'a RuleSet,
    selector: &str,
) -> Result<Option<&'a Declaration>, ScanError> {
    let found: Vec<&Declaration> = rule_set.declarations_named(BACKGROUND).collect();
    if found.len() > 1 && found.iter().any(|d| has_url(d)) {
        return Err(ScanError::RepeatedProperty {
            property: BACKGROUND.to_string(),
            selector: selector.to_string(),
            span: found[1].span,
        });
    }
    Ok(found.last().copied())
}

fn context_format(context: &UrlContext) -> ImageFormat {
    match context {
        UrlContext::Bare => ImageFormat::LiteralUrl,
        UrlContext::Vendor(_) => ImageFormat::VendorSpecific,
        UrlContext::Function(_) => ImageFormat::Unsupported,
    }
}

fn position_of(decl: &Declaration, selector: &str) -> Result<Option<ImagePosition>, ScanError> {
    let components = position_components(&decl.value.terms);
    if components.len() > 2 {
        return Err(ScanError::TooManyLengths {
            value: decl.value.to_string(),
            selector: selector.to_string(),
            span: decl.span,
        });
    }
    Ok(ImagePosition::from_components(&components))
}

fn has_url(decl: &Declaration) -> bool {
    let mut urls = Vec::new();
    collect_urls(&decl.value.terms, &UrlContext::Bare, &mut urls);
    !urls.is_empty()
}

fn collect_urls(terms: &[Term], context: &UrlContext, out: &mut Vec<(UrlValue, UrlContext)>) {
    for term in terms {
        match term {
            Term::Url(url) => out.push((url.clone(), context.clone())),
            Term::Function { name, args } => {
                let inner = if name.is_empty() {
                    context.clone()
                } else if name.starts_with('-') {
                    UrlContext::Vendor(name.clone())
                } else {
                    UrlContext::Function(name.clone())
                };
                collect_urls(args, &inner, out);
            }
            _ => {}
        }
    }
}
