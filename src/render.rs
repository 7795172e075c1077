//!
//! pgdoc report renderer
//! ---------------------
//! Turns the entity model into reStructuredText lines: section headings with
//! underlines, grid-style tables with a header row, and the two report
//! fragments (tables, functions) emitted per schema. Rendering triggers lazy
//! reference resolution, so a dangling cross-reference surfaces here as an
//! error rather than as misleading output.

use crate::error::DocResult;
use crate::model::{Database, RelationKind, Schema};

/// Underline characters for the three heading levels.
const UNDERLINES: [char; 3] = ['=', '-', '~'];

/// A title line followed by an underline of repeated punctuation.
pub fn heading(title: &str, level: usize) -> Vec<String> {
    let ch = UNDERLINES[level.min(UNDERLINES.len() - 1)];
    let underline: String = std::iter::repeat(ch).take(display_len(title)).collect();
    vec![title.to_string(), underline]
}

/// Render a grid table with a header row:
///
/// ```text
/// +------+------+
/// | Col  | Type |
/// +======+======+
/// | id   | int  |
/// +------+------+
/// ```
///
/// With no body rows, only the bordered header row is emitted.
pub fn grid_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|c| flatten_cell(c)).collect())
        .collect();

    // Compute widths over header and body cells
    let mut widths: Vec<usize> = headers.iter().map(|h| display_len(h)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(widths.len()) {
            let w = display_len(cell);
            if w > widths[i] {
                widths[i] = w;
            }
        }
    }

    let sep = build_separator(&widths, '-');
    let head_sep = build_separator(&widths, '=');

    let mut out = Vec::with_capacity(rows.len() * 2 + 3);
    out.push(sep.clone());
    let head_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    out.push(build_row(&head_cells, &widths));
    out.push(head_sep);
    for r in &rows {
        out.push(build_row(r, &widths));
        out.push(sep.clone());
    }
    out
}

/// The "tables" fragment for one schema: a subsection per relation, with a
/// column grid for ordinary tables and a bare name heading for every other
/// relation kind.
pub fn tables_fragment(db: &Database, schema: &Schema) -> DocResult<Vec<String>> {
    let mut out = heading("Tables", 1);
    out.push(String::new());

    for relation in db.relations_in(schema.oid) {
        out.extend(heading(&relation.name, 2));
        out.push(String::new());
        match relation.kind {
            RelationKind::Table => {
                if !relation.description().is_empty() {
                    out.push(relation.description().to_string());
                    out.push(String::new());
                }
                let mut rows: Vec<Vec<String>> = Vec::new();
                for attr in db.attributes_of(relation.oid) {
                    if attr.is_system() {
                        continue;
                    }
                    let ty = attr.ty.resolve(db)?.display_name(db)?;
                    rows.push(vec![attr.name.clone(), ty, attr.description().to_string()]);
                }
                out.extend(grid_table(&["Column", "Type", "Description"], &rows));
                out.push(String::new());
            }
            // Views, sequences and other kinds get a name heading only.
            RelationKind::Other => {}
        }
    }
    Ok(out)
}

/// The "functions" fragment for one schema: a summary grid linking to one
/// detailed subsection per function.
pub fn functions_fragment(db: &Database, schema: &Schema) -> DocResult<Vec<String>> {
    let mut out = heading("Functions", 1);
    out.push(String::new());

    let functions = db.functions_in(schema.oid);

    let rows: Vec<Vec<String>> = functions
        .iter()
        .map(|f| vec![format!("`{}`_", f.name), f.result.clone(), f.synopsis().to_string()])
        .collect();
    out.extend(grid_table(&["Function", "Result", "Description"], &rows));
    out.push(String::new());

    for function in functions {
        out.push(format!(".. _{}:", function.name));
        out.push(String::new());
        out.extend(heading(&function.name, 2));
        out.push(String::new());
        out.push(format!("``{}``", function.signature(db)?));
        out.push(String::new());
        if !function.description().is_empty() {
            out.extend(function.description().lines().map(|l| l.to_string()));
            out.push(String::new());
        }
    }
    Ok(out)
}

/// A full schema section: top-level heading, optional description, then the
/// selected fragments.
pub fn schema_section(
    db: &Database,
    schema: &Schema,
    tables: bool,
    functions: bool,
) -> DocResult<Vec<String>> {
    let mut out = heading(&schema.name, 0);
    out.push(String::new());
    if !schema.description().is_empty() {
        out.push(schema.description().to_string());
        out.push(String::new());
    }
    if tables {
        out.extend(tables_fragment(db, schema)?);
    }
    if functions {
        out.extend(functions_fragment(db, schema)?);
    }
    Ok(out)
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}

// Grid cells are single-line; fold embedded newlines into spaces.
fn flatten_cell(s: &str) -> String {
    if s.contains('\n') {
        s.lines().collect::<Vec<_>>().join(" ")
    } else {
        s.to_string()
    }
}

fn build_separator(widths: &[usize], fill: char) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.extend(std::iter::repeat(fill).take(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        s.push(' ');
        s.push_str(&cell);
        let pad = w.saturating_sub(display_len(&cell));
        s.push_str(&" ".repeat(pad));
        s.push(' ');
        s.push('|');
    }
    s
}
