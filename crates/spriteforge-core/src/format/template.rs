use super::record::{SheetContext, xml_escape};
use crate::error::Result;
use handlebars::{Handlebars, handlebars_helper};
use std::sync::OnceLock;

pub(crate) const CSS: &str = include_str!("templates/css.hbs");
pub(crate) const UNITY: &str = include_str!("templates/unity.hbs");
pub(crate) const SPINE: &str = include_str!("templates/spine.hbs");
pub(crate) const STARLING: &str = include_str!("templates/starling.hbs");
pub(crate) const XML: &str = include_str!("templates/xml.hbs");

handlebars_helper!(neg: |v: i64| -v);
handlebars_helper!(xml: |s: str| xml_escape(s));

fn registry() -> &'static Handlebars<'static> {
    static REGISTRY: OnceLock<Handlebars<'static>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut hb = Handlebars::new();
        // values are pre-escaped per format; HTML escaping would corrupt them
        hb.register_escape_fn(handlebars::no_escape);
        hb.set_strict_mode(true);
        hb.register_helper("neg", Box::new(neg));
        hb.register_helper("xml", Box::new(xml));
        hb
    })
}

/// Render an embedded template against the sheet context.
pub fn render(source: &str, ctx: &SheetContext) -> Result<String> {
    Ok(registry().render_template(source, ctx)?)
}
