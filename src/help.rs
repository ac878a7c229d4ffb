//! Help renderer.
//!
//! Read-only introspection over the catalog, producing three views
//! depending on how much context is known: the top-level overview, the
//! per-class task table, and the per-task detail. Views render to a
//! `String`; printing is the driver's business.

use crate::app::AppConfig;
use crate::catalog::{Catalog, CatalogError, TaskDef};
use crate::param::ParamDef;
use crate::resolve::HelpTopic;
use tabled::settings::Style;
use tabled::Table;

/// Render the help view matching the known class/task context.
pub fn render(catalog: &Catalog, settings: &AppConfig, topic: &HelpTopic) -> String {
    let mut out = header(settings);

    match (topic.class.as_deref(), topic.task.as_deref()) {
        (Some(class), Some(task)) => out.push_str(&task_detail(catalog, class, task)),
        (Some(class), None) => out.push_str(&class_view(catalog, class)),
        _ => out.push_str(&overview(catalog, settings)),
    }

    out
}

fn header(settings: &AppConfig) -> String {
    let usage = match &settings.usage {
        Some(usage) => usage.clone(),
        None => format!("{} [OPTIONS] API TASK", settings.app_bin),
    };
    format!(
        "{} (Version: {})\n\nUSAGE:\n\n\t{}\n",
        settings.app_name, settings.app_version, usage
    )
}

fn overview(catalog: &Catalog, settings: &AppConfig) -> String {
    let mut out = render_param_list("General parameters", &settings.static_params);
    out.push('\n');
    out.push_str(&class_list(catalog));
    out
}

fn class_list(catalog: &Catalog) -> String {
    let mut out = String::from("Available API classes:\n");
    for name in catalog.class_names() {
        out.push_str(&format!("\t* {}\n", name));
    }
    out
}

/// One row per task in the class; unknown class names degrade to the
/// overview class list after being reported.
fn class_view(catalog: &Catalog, class: &str) -> String {
    let Some(tasks) = catalog.tasks(class) else {
        return format!("Unknown API class: {}\n\n{}", class, class_list(catalog));
    };

    let mut out = format!("Showing API tasks for: {}\n\n", class);
    out.push_str(&task_table(tasks));
    out.push('\n');
    out
}

fn task_table(tasks: &[TaskDef]) -> String {
    let mut rows: Vec<[String; 4]> = Vec::with_capacity(tasks.len() + 1);
    rows.push([
        "Task".to_string(),
        "Method".to_string(),
        "Description".to_string(),
        "Returns".to_string(),
    ]);
    for task in tasks {
        rows.push([
            task.cmd.clone(),
            task.method
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or_else(|| "any".to_string()),
            task.description.clone().unwrap_or_else(|| "-".to_string()),
            task.returns
                .as_ref()
                .and_then(|r| r.type_tag.clone())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    Table::from_iter(rows).with(Style::sharp()).to_string()
}

fn task_detail(catalog: &Catalog, class: &str, task: &str) -> String {
    let definition = match catalog.lookup(class, task) {
        Ok(definition) => definition,
        Err(CatalogError::UnknownClass { .. }) => {
            return format!("Unknown API class: {}\n\n{}", class, class_list(catalog));
        }
        Err(_) => {
            return format!(
                "Unknown API task: {} -> {}\n\n{}",
                class,
                task,
                class_view(catalog, class)
            );
        }
    };

    let mut out = format!("Help for {} -> {}\n", class, task);
    if let Some(description) = &definition.description {
        out.push_str(&format!("\n\t{}\n", description));
    }
    out.push_str(&format!(
        "\tRequest method: {}\n",
        definition.effective_method()
    ));
    if let Some(returns) = &definition.returns {
        out.push_str(&format!(
            "\tReturn {{{}}} {}\n",
            returns.type_tag.as_deref().unwrap_or("-"),
            returns.description.as_deref().unwrap_or("")
        ));
    }
    if !definition.param.is_empty() {
        out.push_str(&render_param_list("Call parameters", &definition.param));
    }
    out
}

/// Render a titled parameter listing, one aligned line per parameter.
/// Hard-required entries are marked with `*` after the name.
pub fn render_param_list(title: &str, params: &[ParamDef]) -> String {
    let labels: Vec<String> = params
        .iter()
        .map(|p| {
            format!(
                "{}{} {{{}}}",
                p.name,
                if p.optional == Some(false) { "*" } else { "" },
                p.kind()
            )
        })
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = format!("\n{}:\n\n", title);
    for (label, param) in labels.iter().zip(params) {
        out.push_str(&format!(
            "\t{:<width$} : {}\n",
            label,
            param.description(),
            width = width
        ));
    }
    out
}
