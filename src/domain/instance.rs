// Coloring instance parser
//
// <node_count> <edge_count>
// <u_1> <v_1>
// ...

use std::str::FromStr;

use super::graph::Graph;
use super::solver_service::{Result, SolverError};

/// Parse the whitespace-delimited coloring format into a graph
pub fn parse_instance(input: &str) -> Result<Graph> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_no, header) = lines
        .next()
        .ok_or_else(|| malformed(1, "missing header line"))?;
    let [node_count, edge_count] = parse_pair(header_no, header)?;

    // the header is untrusted: never size a buffer from it alone
    let mut edges = Vec::with_capacity(edge_count.min(input.len() / 4));
    for (line_no, line) in lines {
        if edges.len() == edge_count {
            return Err(malformed(
                line_no,
                &format!("more edges than the {} announced", edge_count),
            ));
        }
        let [u, v] = parse_pair(line_no, line)?;
        edges.push((u, v));
    }

    if edges.len() < edge_count {
        return Err(malformed(
            header_no,
            &format!("announced {} edges but found {}", edge_count, edges.len()),
        ));
    }

    log::debug!("parsed instance: {} nodes, {} edges", node_count, edge_count);
    Graph::build(node_count, &edges)
}

impl FromStr for Graph {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        parse_instance(s)
    }
}

fn parse_pair(line_no: usize, line: &str) -> Result<[usize; 2]> {
    let mut tokens = line.split_whitespace();
    let mut pair = [0; 2];
    for slot in pair.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(line_no, "expected two integers"))?;
        *slot = token.parse().map_err(|_| {
            malformed(line_no, &format!("'{}' is not a non-negative integer", token))
        })?;
    }
    if let Some(extra) = tokens.next() {
        return Err(malformed(line_no, &format!("unexpected token '{}'", extra)));
    }
    Ok(pair)
}

fn malformed(line_no: usize, what: &str) -> SolverError {
    SolverError::MalformedInstance(format!("line {}: {}", line_no, what))
}
