use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use revtrack_tree::TrackingState;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    if !no_color && std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn current_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn render_label(style: OutputStyle, label: &str) -> String {
    match style {
        OutputStyle::Plain => label.to_string(),
        OutputStyle::Rich => colorize(label_style(), label),
    }
}

pub(crate) fn format_status_lines(
    state: &TrackingState,
    versions: &[String],
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} {}",
            render_label(style, "revision:"),
            state.revision.as_deref().unwrap_or("(none)")
        ),
        format!(
            "{} {}",
            render_label(style, "version:"),
            state.mc_version.as_deref().unwrap_or("(none)")
        ),
    ];

    if versions.is_empty() {
        lines.push(format!("{} (none)", render_label(style, "directories:")));
        return lines;
    }

    lines.push(render_label(style, "directories:"));
    for version in versions {
        let is_current = state.mc_version.as_deref() == Some(version.as_str());
        let line = match (is_current, style) {
            (false, _) => format!("  {version}"),
            (true, OutputStyle::Plain) => format!("* {version}"),
            (true, OutputStyle::Rich) => colorize(current_style(), &format!("* {version}")),
        };
        lines.push(line);
    }
    lines
}
