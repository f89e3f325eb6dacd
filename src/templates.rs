//! Template catalogue backed by a directory of Liquid `*.html` files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use liquid::model::{DisplayCow, KStringCow, State, Value as LiquidValue};
use liquid::{ObjectView, ValueView};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::pdfgen::PdfGenerator;
use crate::{ConversionOptions, PaperboyError, Result};

const TEMPLATE_EXTENSION: &str = "html";

/// Data handed to a template as its Liquid globals.
pub type TemplateData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub content: String,
}

#[derive(Clone)]
pub struct TemplateService {
    templates_dir: PathBuf,
    generator: Option<Arc<dyn PdfGenerator>>,
}

impl fmt::Debug for TemplateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateService")
            .field("templates_dir", &self.templates_dir)
            .field("generator", &self.generator.as_ref().map(|g| g.name()))
            .finish()
    }
}

impl TemplateService {
    /// A service that can list and render HTML but has no PDF backend.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn PdfGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    pub fn generator(&self) -> Option<&Arc<dyn PdfGenerator>> {
        self.generator.as_ref()
    }

    /// Names of all `*.html` files in the template directory, sorted.
    pub async fn list(&self) -> Result<Vec<TemplateSummary>> {
        let mut entries = tokio::fs::read_dir(&self.templates_dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names
            .into_iter()
            .map(|name| TemplateSummary { name })
            .collect())
    }

    pub async fn get(&self, name: &str) -> Result<Template> {
        let content = self.read_template(name).await?;
        Ok(Template {
            name: name.to_string(),
            content,
        })
    }

    #[instrument(skip(self, data))]
    pub async fn render_html(&self, name: &str, data: &TemplateData) -> Result<String> {
        let content = self.read_template(name).await?;
        render_liquid(&content, data)
    }

    /// Validates `options`, renders the template and converts the result.
    #[instrument(skip(self, data, options))]
    pub async fn render_pdf(
        &self,
        name: &str,
        data: &TemplateData,
        options: &ConversionOptions,
    ) -> Result<Vec<u8>> {
        options.validate()?;
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| PaperboyError::Config("no PDF backend configured".into()))?;

        let html = self.render_html(name, data).await?;
        debug!(html_bytes = html.len(), backend = generator.name(), "rendered template");
        generator.generate_pdf(&html, options).await
    }

    async fn read_template(&self, name: &str) -> Result<String> {
        if !is_plain_file_name(name) {
            return Err(PaperboyError::TemplateNotFound(name.to_string()));
        }

        let path = self.templates_dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "template unreadable");
                Err(PaperboyError::TemplateNotFound(name.to_string()))
            }
        }
    }
}

/// Rejects anything that could escape the template directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

fn render_liquid(source: &str, data: &TemplateData) -> Result<String> {
    let parser = liquid::ParserBuilder::with_stdlib().build()?;
    let template = parser.parse(source)?;
    let globals = LenientGlobals::new(liquid::to_object(data)?);
    Ok(template.render(&globals)?)
}

/// Liquid globals where a top-level name absent from the data reads as `nil`,
/// so `{{ missing }}` renders empty instead of failing. Missing fields of a
/// present object are still errors.
#[derive(Debug)]
struct LenientGlobals {
    data: liquid::Object,
    nil: LiquidValue,
}

impl LenientGlobals {
    fn new(data: liquid::Object) -> Self {
        Self {
            data,
            nil: LiquidValue::Nil,
        }
    }
}

impl ValueView for LenientGlobals {
    fn as_debug(&self) -> &dyn fmt::Debug {
        self
    }

    fn render(&self) -> DisplayCow<'_> {
        ValueView::render(&self.data)
    }

    fn source(&self) -> DisplayCow<'_> {
        ValueView::source(&self.data)
    }

    fn type_name(&self) -> &'static str {
        ValueView::type_name(&self.data)
    }

    fn query_state(&self, state: State) -> bool {
        ValueView::query_state(&self.data, state)
    }

    fn to_kstr(&self) -> KStringCow<'_> {
        ValueView::to_kstr(&self.data)
    }

    fn to_value(&self) -> LiquidValue {
        ValueView::to_value(&self.data)
    }

    fn as_object(&self) -> Option<&dyn ObjectView> {
        Some(self)
    }
}

impl ObjectView for LenientGlobals {
    fn as_value(&self) -> &dyn ValueView {
        self
    }

    fn size(&self) -> i64 {
        ObjectView::size(&self.data)
    }

    fn keys<'k>(&'k self) -> Box<dyn Iterator<Item = KStringCow<'k>> + 'k> {
        ObjectView::keys(&self.data)
    }

    fn values<'k>(&'k self) -> Box<dyn Iterator<Item = &'k dyn ValueView> + 'k> {
        ObjectView::values(&self.data)
    }

    fn iter<'k>(&'k self) -> Box<dyn Iterator<Item = (KStringCow<'k>, &'k dyn ValueView)> + 'k> {
        ObjectView::iter(&self.data)
    }

    fn contains_key(&self, _index: &str) -> bool {
        true
    }

    fn get<'s>(&'s self, index: &str) -> Option<&'s dyn ValueView> {
        Some(ObjectView::get(&self.data, index).unwrap_or(&self.nil))
    }
}
