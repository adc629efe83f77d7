//! Cypher rendering of read plans.
//!
//! Every sub-fetch becomes its own `CALL { ... }` block importing only its
//! parent variable, so sub-fetches never depend on one another. Nested
//! fetches render inside their parent's block.

use super::{Direction, ReadQuery, SubFetch};
use crate::model::RELATIONSHIP_DATA_KEY;

/// Variable bound to the root node.
pub(crate) const ROOT_VARIABLE: &str = "matched_node";

const INDENT: &str = "    ";

pub(crate) fn render(query: &ReadQuery) -> String {
    let mut out = format!(
        "MATCH ({}:{} {{uid: $uid}})\n",
        ROOT_VARIABLE, query.label
    );
    for fetch in &query.fetches {
        render_fetch(&mut out, ROOT_VARIABLE, fetch, 0);
    }
    out.push_str(&format!(
        "RETURN {}{{{}}}",
        ROOT_VARIABLE,
        map_projection(&query.properties, None, query.fetches.iter())
    ));
    out
}

fn render_fetch(out: &mut String, parent: &str, fetch: &SubFetch, depth: usize) {
    let pad = INDENT.repeat(depth);
    let node = fetch.node_variable();
    let relation = fetch.relation_variable();

    let edge = if fetch.edge_properties.is_empty() {
        format!("[:{}]", fetch.label)
    } else {
        format!("[{}:{}]", relation, fetch.label)
    };
    let pattern = match fetch.direction {
        Direction::Outgoing => format!("({})-{}->({})", parent, edge, node),
        Direction::Incoming => format!("({})<-{}-({})", parent, edge, node),
    };

    out.push_str(&format!("{pad}CALL {{\n"));
    out.push_str(&format!("{pad}{INDENT}WITH {parent}\n"));
    out.push_str(&format!("{pad}{INDENT}MATCH {pattern}\n"));
    for nested in &fetch.nested {
        render_fetch(out, &node, nested, depth + 1);
    }

    let item = if fetch.variants.is_empty() {
        let edge_data = (!fetch.edge_properties.is_empty())
            .then(|| (relation.as_str(), fetch.edge_properties.as_slice()));
        format!(
            "{}{{{}}}",
            node,
            map_projection(&fetch.properties, edge_data, fetch.nested.iter())
        )
    } else {
        variant_projection(&node, fetch)
    };
    out.push_str(&format!(
        "{pad}{INDENT}RETURN COLLECT({}) AS {}\n",
        item,
        fetch.alias()
    ));
    out.push_str(&format!("{pad}}}\n"));
}

/// `CASE` over the member labels; a node matching none is left out, since
/// `COLLECT` skips nulls.
fn variant_projection(node: &str, fetch: &SubFetch) -> String {
    let branches: Vec<String> = fetch
        .variants
        .iter()
        .map(|variant| {
            let nested = fetch
                .nested
                .iter()
                .filter(|n| variant.nested.contains(&n.key));
            format!(
                "WHEN {}:{} THEN {}{{{}}}",
                node,
                variant.label,
                node,
                map_projection(&variant.properties, None, nested)
            )
        })
        .collect();
    format!("CASE {} END", branches.join(" "))
}

fn map_projection<'a>(
    properties: &[String],
    edge_data: Option<(&str, &[String])>,
    nested: impl Iterator<Item = &'a SubFetch>,
) -> String {
    let mut entries: Vec<String> = properties.iter().map(|p| format!(".{}", p)).collect();

    if let Some((relation, edge_properties)) = edge_data {
        let edge_entries: Vec<String> = edge_properties.iter().map(|p| format!(".{}", p)).collect();
        entries.push(format!(
            "`{}`: {}{{{}}}",
            RELATIONSHIP_DATA_KEY,
            relation,
            edge_entries.join(", ")
        ));
    }

    entries.extend(nested.map(|n| format!("{}: {}", n.key, n.alias())));
    entries.join(", ")
}
