//! Output-file writing and the generated header block.

use recast_core::JinjaTemplate;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension appended to converted template names. Include markers emitted
/// by the engine point at this same suffix, so converted templates resolve
/// each other on disk.
pub(crate) const OUTPUT_SUFFIX: &str = ".html.j2";

/// Current time in RFC 3339 for the generated header.
pub(crate) fn timestamp_now() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Renders the comment block stamped at the top of every converted file:
/// conversion timestamp, source template name, and the sorted metadata
/// lists.
pub(crate) fn render_header(template: &JinjaTemplate, timestamp: &str) -> String {
    format!(
        "{{# This file is auto-generated from legacy template on {} #}}\n\
         {{# Original template: {} #}}\n\
         {{# Template variables: [{}] #}}\n\
         {{# Template functions: [{}] #}}\n\
         {{# Template imports: [{}] #}}\n",
        timestamp,
        template.name,
        join_names(&template.variables),
        join_names(&template.functions),
        join_names(&template.imports),
    )
}

fn join_names(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes header plus translated body to `<out_dir>/<name>.html.j2`,
/// creating parent directories as needed. Returns the path written.
pub(crate) fn write_template(out_dir: &Path, template: &JinjaTemplate) -> io::Result<PathBuf> {
    let path = out_dir.join(format!("{}{}", template.name, OUTPUT_SUFFIX));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut contents = render_header(template, &timestamp_now()).into_bytes();
    contents.extend_from_slice(&template.body);
    fs::write(&path, contents)?;
    Ok(path)
}
