use std::ffi::OsString;

use super::types::{FilterGraph, FilterNode};

/// Characters with a meaning in ffmpeg's filtergraph syntax
const FILTER_SPECIAL_CHARS: &[char] = &['\\', '\'', '[', ']', ',', ';', ':', '='];

fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if FILTER_SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn render_node(node: &FilterNode) -> String {
    let mut rendered: String = node.inputs.iter().map(|input| input.pad()).collect();
    rendered.push_str(&node.name);

    if !node.args.is_empty() {
        let args: Vec<String> = node
            .args
            .iter()
            .map(|(key, value)| format!("{}={}", key, escape_filter_value(&value.to_string())))
            .collect();
        rendered.push('=');
        rendered.push_str(&args.join(":"));
    }

    rendered.push('[');
    rendered.push_str(&node.output);
    rendered.push(']');
    rendered
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

impl FilterGraph {
    /// The `-filter_complex` argument, or `None` when the graph has no filters
    pub fn filter_complex(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        let nodes: Vec<String> = self.filters.iter().map(render_node).collect();
        Some(nodes.join(";"))
    }

    /// Render the graph as ffmpeg arguments, without the program name
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        for input in &self.inputs {
            if let Some(start) = input.start {
                args.push("-ss".into());
                args.push(start.to_string().into());
            }
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }

        if let Some(filter_complex) = self.filter_complex() {
            args.push("-filter_complex".into());
            args.push(filter_complex.into());
        }

        for stream in &self.output.streams {
            args.push("-map".into());
            args.push(stream.map_specifier().into());
        }

        for (key, value) in self.output.options.iter() {
            args.push(format!("-{}", key).into());
            args.push(value.to_string().into());
        }

        args.push(self.output.path.clone().into_os_string());

        if self.overwrite {
            args.push("-y".into());
        }

        args
    }

    /// Shell-like rendering of the full command, for logs and dry runs
    pub fn command_line(&self, program: &str) -> String {
        std::iter::once(shell_quote(program))
            .chain(
                self.to_args()
                    .iter()
                    .map(|arg| shell_quote(&arg.to_string_lossy())),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }
}
