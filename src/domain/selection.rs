use std::collections::HashSet;

use crate::domain::ticket::Ticket;

/// Keys of the tickets the user has picked. Every key belongs to the ticket
/// list it was built against; callers clear it whenever that list is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the key ends up selected. Keys missing from
    /// `tickets` are ignored.
    pub fn toggle(&mut self, key: &str, tickets: &[Ticket]) -> bool {
        if self.keys.remove(key) {
            return false;
        }
        if tickets.iter().any(|ticket| ticket.key == key) {
            self.keys.insert(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn select_all(&mut self, tickets: &[Ticket]) {
        self.keys = tickets.iter().map(|ticket| ticket.key.clone()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.keys.clear();
    }

    pub fn toggle_all(&mut self, tickets: &[Ticket]) {
        if self.all_selected(tickets) {
            self.deselect_all();
        } else {
            self.select_all(tickets);
        }
    }

    pub fn all_selected(&self, tickets: &[Ticket]) -> bool {
        !tickets.is_empty()
            && self.keys.len() == tickets.len()
            && tickets.iter().all(|ticket| self.keys.contains(&ticket.key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Selected tickets in list order.
    pub fn selected_tickets(&self, tickets: &[Ticket]) -> Vec<Ticket> {
        tickets
            .iter()
            .filter(|ticket| self.keys.contains(&ticket.key))
            .cloned()
            .collect()
    }
}
