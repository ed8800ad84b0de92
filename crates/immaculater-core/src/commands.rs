use std::io::Write;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::cli::Command;
use crate::config::{BindingConfig, Config};
use crate::escape::escape;
use crate::fragments;
use crate::view_filter::ViewFilter;

#[derive(Debug, Serialize)]
struct ViewFilterRow {
    name: &'static str,
    label: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
}

#[instrument(skip(out, cfg))]
pub fn dispatch<W: Write>(out: &mut W, cfg: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Escape { text } => {
            writeln!(out, "{}", escape(&text))?;
        }
        Command::ButtonForm {
            servlet,
            csrf,
            uid,
            hidden,
            text,
            label,
        } => {
            let html = fragments::button_form(
                &servlet,
                &csrf,
                uid.as_deref(),
                &hidden,
                &text,
                label.as_deref(),
            );
            writeln!(out, "{html}")?;
        }
        Command::SelectOption {
            value,
            text,
            selected,
        } => {
            writeln!(
                out,
                "{}",
                fragments::option(&value, &text, selected.as_deref())
            )?;
        }
        Command::ViewFilterForm {
            servlet,
            csrf,
            uid,
            selected,
        } => {
            if let Some(name) = selected.as_deref()
                && ViewFilter::from_ui_name(name).is_none()
            {
                debug!(
                    selected = %name,
                    "selected value matches no view filter; no option will be selected"
                );
            }
            let html =
                fragments::view_filter_form(&servlet, &csrf, uid.as_deref(), selected.as_deref());
            writeln!(out, "{html}")?;
        }
        Command::ViewFilters { json } => print_view_filters(out, json)?,
        Command::Bindings { json } => {
            let binding = BindingConfig::from_config(cfg)?;
            print_bindings(out, &binding, json)?;
        }
    }
    Ok(())
}

fn print_view_filters<W: Write>(out: &mut W, json: bool) -> anyhow::Result<()> {
    let rows: Vec<ViewFilterRow> = ViewFilter::ORDERED
        .into_iter()
        .map(|filter| ViewFilterRow {
            name: filter.ui_name(),
            label: filter.label(),
            aliases: filter.aliases(),
            description: filter.description(),
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    let width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "{:width$}  {}  ({})",
            row.name, row.label, row.description
        )?;
    }
    Ok(())
}

fn print_bindings<W: Write>(out: &mut W, binding: &BindingConfig, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, binding)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "pjax.form_class        {}", binding.form_class)?;
    writeln!(out, "pjax.autosubmit_class  {}", binding.autosubmit_class)?;
    writeln!(out, "pjax.container         {}", binding.container)?;
    writeln!(out, "pjax.method            {}", binding.method.as_str())?;
    writeln!(out, "pjax.push              {}", on_off(binding.push))?;
    writeln!(out, "pjax.cache             {}", on_off(binding.cache))?;
    writeln!(out, "tooltip.selector       {}", binding.tooltip_selector)?;
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod commands_tests {
    use super::*;

    fn render(cfg: &Config, command: Command) -> String {
        let mut out = Vec::new();
        dispatch(&mut out, cfg, command).expect("dispatch");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn escape_command_prints_escaped_text() {
        let out = render(
            &Config::default(),
            Command::Escape {
                text: "<b>&".to_string(),
            },
        );
        assert_eq!(out, "&lt;b&gt;&amp;\n");
    }

    #[test]
    fn option_command_marks_selection() {
        let out = render(
            &Config::default(),
            Command::SelectOption {
                value: "all".to_string(),
                text: "All".to_string(),
                selected: Some("all".to_string()),
            },
        );
        assert_eq!(out, "<option value=\"all\" selected=\"selected\">All</option>\n");
    }

    #[test]
    fn view_filters_json_lists_all_six() {
        let out = render(&Config::default(), Command::ViewFilters { json: true });
        let rows: Vec<serde_json::Value> = serde_json::from_str(&out).expect("json");
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["name"], "all");
        assert_eq!(rows[0]["aliases"][1], "default");
        assert_eq!(rows[5]["label"], "Truly all, even deleted");
    }

    #[test]
    fn bindings_reflect_overrides() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("pjax.container".to_string(), "#content".to_string())]);
        let out = render(&cfg, Command::Bindings { json: true });
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["container"], "#content");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["push"], false);
    }
}
