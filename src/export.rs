//! Structured export of records.
//!
//! `ExportEngine` is the call contract the reporting code composes documents
//! through: write a document for a set of objects, merge two documents, and
//! append a named value to every object matching a selector. `XmlExport` is
//! the bundled engine; it produces the object/field XML layout used by the
//! CRM's document templates.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::task::Task;
use crate::worklog::WorkEntry;

pub const TASK_MODEL: &str = "crm.task";
pub const WORK_MODEL: &str = "crm.work";

/// Value written for an absent field.
const NONE_MARKER: &str = "<None></None>";

/// One exported field of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportField {
    pub name: String,
    pub kind: &'static str,
    pub value: Option<String>,
}

/// A record flattened for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportObject {
    pub model: String,
    pub pk: u64,
    pub fields: Vec<ExportField>,
}

impl ExportObject {
    pub fn new(model: &str, pk: u64) -> Self {
        ExportObject {
            model: model.to_string(),
            pk,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, kind: &'static str, value: Option<String>) -> Self {
        self.fields.push(ExportField {
            name: name.to_string(),
            kind,
            value,
        });
        self
    }
}

/// Records that know how to flatten themselves for export.
pub trait Exportable {
    fn export_object(&self) -> ExportObject;
}

impl Exportable for Task {
    fn export_object(&self) -> ExportObject {
        ExportObject::new(TASK_MODEL, self.id)
            .field("title", "CharField", self.title.clone())
            .field("planned_start_date", "DateField", self.planned_start_date.map(|d| d.to_string()))
            .field("planned_end_date", "DateField", self.planned_end_date.map(|d| d.to_string()))
            .field("project", "ForeignKey", Some(self.project.to_string()))
            .field("description", "TextField", self.description.clone())
            .field("status", "ForeignKey", self.status.as_ref().map(|s| s.id.to_string()))
            .field("last_status_change", "DateField", Some(self.last_status_change.to_string()))
    }
}

impl Exportable for WorkEntry {
    fn export_object(&self) -> ExportObject {
        ExportObject::new(WORK_MODEL, self.id)
            .field("employee", "CharField", Some(self.employee.clone()))
            .field("date", "DateField", Some(self.date.to_string()))
            .field("start_time", "DateTimeField", self.start_time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .field("stop_time", "DateTimeField", self.stop_time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .field("short_description", "CharField", self.short_description.clone())
            .field("description", "TextField", self.description.clone())
            .field("task", "ForeignKey", Some(self.task.to_string()))
    }
}

/// Call contract of a document composer.
pub trait ExportEngine {
    type Document;

    fn write_document(&self, objects: &[ExportObject]) -> Self::Document;

    fn merge_documents(&self, a: Self::Document, b: Self::Document) -> Self::Document;

    fn append_field(
        &self,
        doc: Self::Document,
        selector: &str,
        field_name: &str,
        value: &str,
    ) -> Result<Self::Document>;
}

/// Write a single record as its own document.
pub fn serialize_object<E: ExportEngine>(engine: &E, record: &impl Exportable) -> E::Document {
    engine.write_document(&[record.export_object()])
}

/// Object selector of the form `object/[@model='crm.task']`.
///
/// A bare `object` selects every object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    model: Option<String>,
}

impl Selector {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = || Error::InvalidSelector(pattern.to_string());

        let rest = pattern.trim().strip_prefix("object").ok_or_else(invalid)?;
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Selector { model: None });
        }

        let predicate = rest
            .strip_prefix("[@model=")
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(invalid)?;
        let model = predicate
            .strip_prefix('\'')
            .and_then(|r| r.strip_suffix('\''))
            .or_else(|| predicate.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
            .filter(|m| !m.is_empty())
            .ok_or_else(invalid)?;

        Ok(Selector {
            model: Some(model.to_string()),
        })
    }

    pub fn matches(&self, object: &XmlObject) -> bool {
        self.model.as_deref().map_or(true, |m| m == object.model)
    }
}

/// An `<object>` element with its fields and any appended elements.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlObject {
    pub model: String,
    pub pk: u64,
    pub fields: Vec<ExportField>,
    pub appended: Vec<(String, String)>,
}

/// In-memory XML document produced by `XmlExport`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    pub objects: Vec<XmlObject>,
}

impl XmlDocument {
    /// Objects of the given model, in document order.
    pub fn objects_of<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a XmlObject> + 'a {
        self.objects.iter().filter(move |o| o.model == model)
    }

    /// Render the document as XML text.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str("<django-objects version=\"1.0\">\n");
        for object in &self.objects {
            let _ = writeln!(
                out,
                "  <object model=\"{}\" pk=\"{}\">",
                escape_xml(&object.model),
                object.pk
            );
            for field in &object.fields {
                let value = match &field.value {
                    Some(v) => escape_xml(v),
                    None => NONE_MARKER.to_string(),
                };
                let _ = writeln!(
                    out,
                    "    <field name=\"{}\" type=\"{}\">{}</field>",
                    escape_xml(&field.name),
                    field.kind,
                    value
                );
            }
            for (name, value) in &object.appended {
                let _ = writeln!(out, "    <{name}>{}</{name}>", escape_xml(value));
            }
            out.push_str("  </object>\n");
        }
        out.push_str("</django-objects>\n");
        out
    }
}

/// The bundled XML export engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExport;

impl ExportEngine for XmlExport {
    type Document = XmlDocument;

    fn write_document(&self, objects: &[ExportObject]) -> XmlDocument {
        XmlDocument {
            objects: objects
                .iter()
                .map(|o| XmlObject {
                    model: o.model.clone(),
                    pk: o.pk,
                    fields: o.fields.clone(),
                    appended: Vec::new(),
                })
                .collect(),
        }
    }

    fn merge_documents(&self, mut a: XmlDocument, b: XmlDocument) -> XmlDocument {
        a.objects.extend(b.objects);
        a
    }

    fn append_field(
        &self,
        mut doc: XmlDocument,
        selector: &str,
        field_name: &str,
        value: &str,
    ) -> Result<XmlDocument> {
        let selector = Selector::parse(selector)?;
        if !is_element_name(field_name) {
            return Err(Error::InvalidInput(format!(
                "'{field_name}' is not a valid element name"
            )));
        }
        for object in doc.objects.iter_mut().filter(|o| selector.matches(o)) {
            object.appended.push((field_name.to_string(), value.to_string()));
        }
        Ok(doc)
    }
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Escape text for use in element content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
