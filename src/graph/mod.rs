//! Cross-file import graph.
//!
//! Vertices are scan-relative file paths; edges are the raw import
//! specifiers recorded in each vertex's [`ImportNode`]. Specifier-to-vertex
//! resolution happens lazily on the consumer's schedule (third-party
//! specifiers resolve to nothing). The graph is built once, in input file
//! order, and is read-only afterwards.

mod extract;

pub use extract::{extract_import_node, ImportNode, DEFAULT_SYMBOL, NAMESPACE_SYMBOL};

use std::collections::{BTreeSet, HashMap};

/// Candidate extensions tried when resolving a specifier, in order.
const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".d.ts", ""];

/// Directed graph of project-local imports.
pub struct ImportGraph {
    nodes: Vec<ImportNode>,
    index: HashMap<String, usize>,
}

impl ImportGraph {
    /// Build the graph from per-file import nodes, preserving input order.
    /// A later duplicate of an already-present path is dropped.
    pub fn build(nodes: Vec<ImportNode>) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(nodes.len()),
            index: HashMap::new(),
        };

        for node in nodes {
            if graph.index.contains_key(&node.file) {
                continue;
            }
            graph.index.insert(node.file.clone(), graph.nodes.len());
            graph.nodes.push(node);
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ImportNode] {
        &self.nodes
    }

    pub fn node(&self, file: &str) -> Option<&ImportNode> {
        self.index.get(file).map(|&i| &self.nodes[i])
    }

    /// Resolve a raw specifier from `from` to a vertex path.
    ///
    /// `@/` resolves against `src/` under the scan root; anything else
    /// resolves relative to the importing file's directory. Candidate
    /// extensions and directory `index.*` files are tried in a fixed order,
    /// and a `.js` suffix is allowed to land on a `.ts`/`.tsx` file with the
    /// same stem.
    pub fn resolve(&self, from: &str, specifier: &str) -> Option<String> {
        let base = if let Some(rest) = specifier.strip_prefix("@/") {
            normalize_path(&format!("src/{}", rest))
        } else {
            let dir = parent_dir(from);
            if dir.is_empty() {
                normalize_path(specifier)
            } else {
                normalize_path(&format!("{}/{}", dir, specifier))
            }
        };

        let mut candidates = Vec::new();
        for ext in RESOLVE_EXTENSIONS {
            candidates.push(format!("{}{}", base, ext));
        }
        if let Some(stem) = base.strip_suffix(".js") {
            candidates.push(format!("{}.ts", stem));
            candidates.push(format!("{}.tsx", stem));
        }
        for ext in RESOLVE_EXTENSIONS {
            if !ext.is_empty() {
                candidates.push(format!("{}/index{}", base, ext));
            }
        }

        candidates
            .into_iter()
            .find(|c| self.index.contains_key(c.as_str()))
    }

    /// Resolved adjacency list, indices into `nodes`, in input order.
    fn resolved_edges(&self) -> Vec<Vec<usize>> {
        self.nodes
            .iter()
            .map(|node| {
                node.imports
                    .iter()
                    .filter_map(|spec| self.resolve(&node.file, spec))
                    .filter_map(|target| self.index.get(&target).copied())
                    .collect()
            })
            .collect()
    }

    /// Strongly connected components of size >= 2, each rotated so its
    /// lexicographically first file leads. Deterministic for a fixed input
    /// order.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let adjacency = self.resolved_edges();
        let sccs = tarjan_sccs(&adjacency);

        let mut cycles = Vec::new();
        for scc in sccs {
            if scc.len() < 2 {
                continue;
            }
            let mut files: Vec<String> = scc.iter().map(|&i| self.nodes[i].file.clone()).collect();
            let anchor = files
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            files.rotate_left(anchor);
            cycles.push(files);
        }

        cycles.sort_by(|a, b| a[0].cmp(&b[0]));
        cycles
    }

    /// Union of imported symbols per resolvable target path, for unused
    /// export analysis. A namespace import marks every export of its target
    /// as used.
    pub fn imported_symbols_by_target(&self) -> HashMap<String, BTreeSet<String>> {
        let mut by_target: HashMap<String, BTreeSet<String>> = HashMap::new();

        for node in &self.nodes {
            for (specifier, symbols) in &node.symbols {
                let Some(target) = self.resolve(&node.file, specifier) else {
                    continue;
                };
                by_target
                    .entry(target)
                    .or_default()
                    .extend(symbols.iter().cloned());
            }
        }

        by_target
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Collapse `.` and `..` segments of a `/`-separated relative path.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Iterative Tarjan. Components come out in reverse topological order; the
/// caller re-sorts for presentation.
fn tarjan_sccs(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy)]
    struct VertexState {
        index: usize,
        lowlink: usize,
        on_stack: bool,
        visited: bool,
    }

    let n = adjacency.len();
    let mut state = vec![
        VertexState {
            index: 0,
            lowlink: 0,
            on_stack: false,
            visited: false,
        };
        n
    ];
    let mut counter = 0;
    let mut stack: Vec<usize> = Vec::new();
    let mut sccs: Vec<Vec<usize>> = Vec::new();

    // (vertex, next edge offset) frames emulate the recursion.
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for start in 0..n {
        if state[start].visited {
            continue;
        }
        frames.push((start, 0));

        while let Some(&(v, edge)) = frames.last() {
            if edge == 0 && !state[v].visited {
                state[v].visited = true;
                state[v].index = counter;
                state[v].lowlink = counter;
                counter += 1;
                stack.push(v);
                state[v].on_stack = true;
            }

            if let Some(&w) = adjacency[v].get(edge) {
                frames.last_mut().expect("frame just read").1 += 1;
                if !state[w].visited {
                    frames.push((w, 0));
                } else if state[w].on_stack {
                    state[v].lowlink = state[v].lowlink.min(state[w].index);
                }
                continue;
            }

            // All edges of v explored.
            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                state[parent].lowlink = state[parent].lowlink.min(state[v].lowlink);
            }

            if state[v].lowlink == state[v].index {
                let mut component = Vec::new();
                loop {
                    let w = stack.pop().expect("tarjan stack underflow");
                    state[w].on_stack = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(component);
            }
        }
    }

    sccs
}
