//! LookML text emission.
//!
//! Renders [`View`] and [`Explore`] records into `.lkml` files with a fixed
//! layout: one `<view>.view.lkml` per view and a single `explores.lkml`.

pub mod format;

use std::collections::BTreeMap;

use format::{Indent, IndentWriter};

use super::{Explore, Join, MetricMeasure, View, DIMENSIONS_ONLY_SET};

/// File name holding every explore.
pub const EXPLORES_FILE: &str = "explores.lkml";

/// Configuration for LookML emission.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    pub indent: Indent,
    /// Write a "generated" header comment at the top of each file.
    pub include_header: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            include_header: true,
        }
    }
}

/// Render every output file, keyed by file name.
pub fn render_files(
    views: &[View],
    explores: &[Explore],
    config: &EmitConfig,
) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for view in views {
        files.insert(format!("{}.view.lkml", view.name), emit_view(view, config));
    }
    if !explores.is_empty() {
        files.insert(EXPLORES_FILE.to_string(), emit_explores(explores, config));
    }
    files
}

/// Render one view.
pub fn emit_view(view: &View, config: &EmitConfig) -> String {
    let mut w = IndentWriter::new(config.indent.clone());
    if config.include_header {
        write_header(&mut w);
    }

    w.open_block("view", &view.name);
    if let Some(table) = &view.sql_table_name {
        w.sql_property("sql_table_name", table);
    }
    if let Some(description) = &view.description {
        w.string_property("description", description);
    }

    for dim in &view.dimensions {
        w.blank_line();
        w.open_block("dimension", &dim.name);
        if dim.primary_key {
            w.property("primary_key", "yes");
        }
        if dim.hidden {
            w.property("hidden", "yes");
        }
        if let Some(ty) = &dim.dimension_type {
            w.property("type", ty);
        }
        if let Some(label) = &dim.label {
            w.string_property("label", label);
        }
        if let Some(description) = &dim.description {
            w.string_property("description", description);
        }
        w.sql_property("sql", &dim.sql);
        w.close_block();
    }

    for group in &view.dimension_groups {
        w.blank_line();
        w.open_block("dimension_group", &group.name);
        w.property("type", "time");
        w.list_property("timeframes", &group.timeframes);
        if let Some(label) = &group.label {
            w.string_property("label", label);
        }
        if let Some(description) = &group.description {
            w.string_property("description", description);
        }
        w.sql_property("sql", &group.sql);
        w.close_block();
    }

    for measure in &view.measures {
        w.blank_line();
        w.open_block("measure", &measure.name);
        w.property("type", &measure.measure_type);
        if let Some(label) = &measure.label {
            w.string_property("label", label);
        }
        if let Some(description) = &measure.description {
            w.string_property("description", description);
        }
        if let Some(sql) = &measure.sql {
            w.sql_property("sql", sql);
        }
        w.close_block();
    }

    for measure in &view.metric_measures {
        w.blank_line();
        write_metric_measure(&mut w, measure);
    }

    w.blank_line();
    w.open_block("set", DIMENSIONS_ONLY_SET);
    w.list_property("fields", &view.dimension_fields());
    w.close_block();

    w.close_block();
    w.into_string()
}

fn write_metric_measure(w: &mut IndentWriter, measure: &MetricMeasure) {
    w.open_block("measure", &measure.name);
    w.property("type", &measure.measure_type);
    w.string_property("label", &measure.label);
    if let Some(description) = &measure.description {
        w.string_property("description", description);
    }
    w.sql_property("sql", &measure.sql);
    if !measure.required_fields.is_empty() {
        w.list_property("required_fields", &measure.required_fields);
    }
    if let Some(format) = &measure.value_format_name {
        w.property("value_format_name", format);
    }
    w.close_block();
}

/// Render every explore into one file.
pub fn emit_explores(explores: &[Explore], config: &EmitConfig) -> String {
    let mut w = IndentWriter::new(config.indent.clone());
    if config.include_header {
        write_header(&mut w);
    }
    w.string_property("include", "*.view.lkml");

    for explore in explores {
        w.blank_line();
        write_explore(&mut w, explore);
    }
    w.into_string()
}

fn write_explore(w: &mut IndentWriter, explore: &Explore) {
    w.open_block("explore", &explore.name);
    // `view_name` keeps the base view's own name, which every `sql_on` uses.
    if explore.name != explore.base_view {
        w.property("view_name", &explore.base_view);
    }
    if let Some(label) = &explore.label {
        w.string_property("label", label);
    }
    for join in &explore.joins {
        w.blank_line();
        write_join(w, join);
    }
    w.close_block();
}

fn write_join(w: &mut IndentWriter, join: &Join) {
    w.open_block("join", &join.view);
    w.property("type", &join.join_type);
    w.property("relationship", join.relationship.as_str());
    w.sql_property("sql_on", &join.sql_on);
    w.list_property("fields", &join.fields);
    w.close_block();
}

fn write_header(w: &mut IndentWriter) {
    w.write_comment(&format!(
        "Generated by lookgen {}. Do not edit.",
        env!("CARGO_PKG_VERSION")
    ));
    w.blank_line();
}
