//! Ancestor ordering for multiple inheritance.
//!
//! Every type's ancestors are ordered by C3 linearization, the same order a
//! method resolution walk produces: nearest first, each base before its own
//! bases, declaration order preserved between siblings.

use super::NodeTypeId;
use crate::model::DeclarationError;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order types so every base precedes its subclasses.
///
/// Fails with the offending path when the base graph has a cycle.
pub(crate) fn topological_order(
    bases: &[Vec<NodeTypeId>],
    names: &[&str],
) -> Result<Vec<NodeTypeId>, DeclarationError> {
    let mut marks = vec![Mark::Unvisited; bases.len()];
    let mut order = Vec::with_capacity(bases.len());
    let mut path = Vec::new();

    for start in 0..bases.len() {
        visit(NodeTypeId(start), bases, names, &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit(
    id: NodeTypeId,
    bases: &[Vec<NodeTypeId>],
    names: &[&str],
    marks: &mut [Mark],
    path: &mut Vec<NodeTypeId>,
    order: &mut Vec<NodeTypeId>,
) -> Result<(), DeclarationError> {
    match marks[id.0] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|p| names[p.0].to_string())
                .collect();
            cycle.push(names[id.0].to_string());
            return Err(DeclarationError::Cycle(cycle));
        }
        Mark::Unvisited => {}
    }

    marks[id.0] = Mark::InProgress;
    path.push(id);
    for base in &bases[id.0] {
        visit(*base, bases, names, marks, path, order)?;
    }
    path.pop();
    marks[id.0] = Mark::Done;
    order.push(id);
    Ok(())
}

/// Compute every type's linearization, excluding the type itself.
///
/// `order` must come from [`topological_order`].
pub(crate) fn linearize_all(
    bases: &[Vec<NodeTypeId>],
    order: &[NodeTypeId],
    names: &[&str],
) -> Result<Vec<Vec<NodeTypeId>>, DeclarationError> {
    let mut linearizations: Vec<Vec<NodeTypeId>> = vec![Vec::new(); bases.len()];

    for &id in order {
        let direct = &bases[id.0];
        let mut sequences: Vec<Vec<NodeTypeId>> = direct
            .iter()
            .map(|base| {
                let mut seq = vec![*base];
                seq.extend(linearizations[base.0].iter().copied());
                seq
            })
            .collect();
        sequences.push(direct.clone());

        linearizations[id.0] = merge(sequences)
            .ok_or_else(|| DeclarationError::InconsistentHierarchy(names[id.0].to_string()))?;
    }

    Ok(linearizations)
}

fn merge(mut sequences: Vec<Vec<NodeTypeId>>) -> Option<Vec<NodeTypeId>> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        let candidate = sequences
            .iter()
            .map(|seq| seq[0])
            .find(|head| !sequences.iter().any(|seq| seq[1..].contains(head)))?;

        result.push(candidate);
        for seq in sequences.iter_mut() {
            if seq[0] == candidate {
                seq.remove(0);
            }
        }
    }
}
