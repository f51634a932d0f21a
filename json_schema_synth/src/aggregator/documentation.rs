use super::{Element, SchemaAggregator};
use crate::context::SynthesisContext;
use crate::error::JsonSchemaError;
use crate::schema::Schema;
use crate::types::TypeDef;

/// Copies documentation comments into `description`.
pub struct DocumentationAggregator;

impl SchemaAggregator for DocumentationAggregator {
    fn add_info<'a>(
        &self,
        element: &Element<'a>,
        mut schema: Schema,
        _ctx: &mut SynthesisContext<'a>,
    ) -> Result<Schema, JsonSchemaError> {
        match *element {
            Element::Type(type_def) => document_type(type_def, &mut schema),
            Element::Property { property, .. } => {
                if let Some(documentation) = &property.documentation
                    && let Some(summary) = DocComment::parse(documentation).summary
                    && let Some(object) = schema.content_mut()
                {
                    object.description = Some(summary);
                }
            }
            Element::TypeArgument(_) => {}
        }
        Ok(schema)
    }
}

fn document_type(type_def: &TypeDef, schema: &mut Schema) {
    let Some(documentation) = &type_def.documentation else {
        return;
    };
    let Some(object) = schema.content_mut() else {
        return;
    };
    let doc: DocComment = DocComment::parse(documentation);
    if object.description.is_none() {
        object.description = doc.summary;
    }
    if !type_def.is_record() {
        return;
    }
    for (name, text) in doc.params {
        let Some(property) = type_def.properties.iter().find(|p| p.name == name) else {
            continue;
        };
        if let Some(content) = object
            .properties
            .get_mut(property.key())
            .and_then(Schema::content_mut)
            && content.description.is_none()
        {
            content.description = Some(text);
        }
    }
}

/// A documentation comment split into its summary and `@param` blocks.
#[derive(Debug, Default, PartialEq)]
struct DocComment {
    summary: Option<String>,
    params: Vec<(String, String)>,
}

impl DocComment {
    fn parse(documentation: &str) -> Self {
        let mut summary: Vec<&str> = Vec::new();
        let mut params: Vec<(String, String)> = Vec::new();
        // Continuation lines append to the last tag; `None` once a non-param tag starts.
        let mut current: Option<usize> = None;
        let mut in_tags: bool = false;

        for line in documentation.lines().map(str::trim) {
            if let Some(tag) = line.strip_prefix('@') {
                in_tags = true;
                current = None;
                if let Some(rest) = tag.strip_prefix("param")
                    && rest.starts_with(char::is_whitespace)
                {
                    let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
                    if let Some(name) = parts.next().filter(|name| !name.is_empty()) {
                        let text: String = parts.next().unwrap_or_default().trim().to_string();
                        params.push((name.to_string(), text));
                        current = Some(params.len() - 1);
                    }
                }
                continue;
            }
            if !in_tags {
                summary.push(line);
            } else if let Some(index) = current
                && !line.is_empty()
            {
                let text: &mut String = &mut params[index].1;
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(line);
            }
        }

        let summary: String = summary.join("\n").trim().to_string();
        params.retain(|(_, text)| !text.is_empty());
        Self {
            summary: (!summary.is_empty()).then_some(summary),
            params,
        }
    }
}
