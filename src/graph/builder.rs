use std::path::PathBuf;

use super::types::{FilterGraph, FilterNode, InputSpec, OptionValue, OutputOptions, OutputSpec, StreamRef};

/// Assembles a [`FilterGraph`] one node at a time
///
/// Filter outputs get sequential labels (`s0`, `s1`, ...) so the rendered
/// graph is stable for identical requests.
#[derive(Debug, Default)]
pub struct FilterGraphBuilder {
    inputs: Vec<InputSpec>,
    filters: Vec<FilterNode>,
}

impl FilterGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input and return its index
    pub fn input(&mut self, spec: InputSpec) -> usize {
        self.inputs.push(spec);
        self.inputs.len() - 1
    }

    /// Add a filter node consuming `inputs` and return a reference to its output
    pub fn filter<N, K, V>(&mut self, name: N, inputs: Vec<StreamRef>, args: Vec<(K, V)>) -> StreamRef
    where
        N: Into<String>,
        K: Into<String>,
        V: Into<OptionValue>,
    {
        let output = format!("s{}", self.filters.len());
        self.filters.push(FilterNode {
            name: name.into(),
            inputs,
            args: args.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            output: output.clone(),
        });
        StreamRef::Label(output)
    }

    /// Finish the graph with its single output
    pub fn output<P: Into<PathBuf>>(
        self,
        path: P,
        streams: Vec<StreamRef>,
        options: OutputOptions,
        overwrite: bool,
    ) -> FilterGraph {
        FilterGraph {
            inputs: self.inputs,
            filters: self.filters,
            output: OutputSpec {
                path: path.into(),
                streams,
                options,
            },
            overwrite,
        }
    }
}
