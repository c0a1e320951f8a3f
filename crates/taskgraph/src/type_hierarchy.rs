//! Rank table for ticket types.
//!
//! Every ticket type has a fixed integer rank. A parent must always outrank
//! its child, which also makes parent chains acyclic by construction:
//!
//! | type    | rank |
//! |---------|------|
//! | epic    | 3    |
//! | task    | 2    |
//! | subtask | 1    |
//!
//! The table is a process-wide constant. There is no runtime mutation path.
//!
//! # Examples
//!
//! ```
//! use taskgraph::type_hierarchy::{lookup, rank_of};
//! use taskgraph::TicketType;
//!
//! assert_eq!(lookup("epic"), Some((TicketType::Epic, 3)));
//! assert_eq!(lookup("story"), None);
//! assert!(rank_of(TicketType::Task) > rank_of(TicketType::Subtask));
//! ```

use crate::domain::TicketType;

/// The rank table: label, type and rank, highest rank first.
pub const RANK_TABLE: [(&str, TicketType, u8); 3] = [
    ("epic", TicketType::Epic, 3),
    ("task", TicketType::Task, 2),
    ("subtask", TicketType::Subtask, 1),
];

/// Look up a type label, returning the type and its rank if recognized.
///
/// Labels are matched exactly; `"Epic"` is not a recognized label.
pub fn lookup(label: &str) -> Option<(TicketType, u8)> {
    RANK_TABLE
        .iter()
        .find(|(name, _, _)| *name == label)
        .map(|(_, ticket_type, rank)| (*ticket_type, *rank))
}

/// Rank of an already-resolved ticket type.
pub fn rank_of(ticket_type: TicketType) -> u8 {
    match ticket_type {
        TicketType::Epic => 3,
        TicketType::Task => 2,
        TicketType::Subtask => 1,
    }
}

/// Returns true if a ticket of type `parent` may be the parent of a ticket of
/// type `child`.
pub fn can_parent(parent: TicketType, child: TicketType) -> bool {
    rank_of(parent) > rank_of(child)
}

/// Edit distance between two labels, keeping only the previous row.
fn edit_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=target.len()).collect();

    for (i, left) in a.chars().enumerate() {
        let mut current = Vec::with_capacity(target.len() + 1);
        current.push(i + 1);
        for (j, right) in target.iter().enumerate() {
            let substitution = previous[j] + usize::from(left != *right);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current.push(substitution.min(insertion).min(deletion));
        }
        previous = current;
    }

    previous[target.len()]
}

/// Finds the closest recognized label for an unknown type label.
///
/// Case differences are treated as a match, otherwise the nearest label within
/// an edit distance of 2 is suggested.
///
/// ```
/// use taskgraph::type_hierarchy::suggest_type;
///
/// assert_eq!(suggest_type("taks"), Some("task"));
/// assert_eq!(suggest_type("Epic"), Some("epic"));
/// assert_eq!(suggest_type("milestone"), None);
/// ```
pub fn suggest_type(unknown: &str) -> Option<&'static str> {
    let normalized = unknown.trim().to_lowercase();
    let max_distance = 2;

    RANK_TABLE
        .iter()
        .map(|(name, _, _)| (*name, edit_distance(&normalized, name)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name)
}
