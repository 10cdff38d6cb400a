//! Fixed-capacity watchpoint pool: persistent expressions re-evaluated after
//! every retired instruction, a change in value halts the machine.

use crate::error::CommandError;
use crate::expr::{self, MemoryRead, RegisterLookup};

pub const CAPACITY: usize = 32;

struct Slot {
    expression: String,
    last_value: u32,
}

/// Free-list pool of watchpoint slots. Slot `id` is its index and is stable
/// for the slot's lifetime; ids are never reused while a slot is live.
pub struct WatchpointPool {
    slots: [Option<Slot>; CAPACITY],
}

/// One watchpoint whose value changed during a [`WatchpointPool::check`] pass.
pub struct Change {
    pub id: usize,
    pub expression: String,
    pub old_value: u32,
    pub new_value: u32,
}

impl WatchpointPool {
    pub fn new() -> Self {
        WatchpointPool {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Evaluate `expression` once to seed its baseline, store it, and return
    /// the assigned id. Fails with [`CommandError::WatchpointFull`] if no
    /// slot is free.
    pub fn add(
        &mut self,
        expression: &str,
        regs: &dyn RegisterLookup,
        mem: &dyn MemoryRead,
    ) -> Result<usize, CommandError> {
        let id = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(CommandError::WatchpointFull)?;
        let last_value = expr::evaluate(expression, regs, mem)?;
        self.slots[id] = Some(Slot {
            expression: expression.to_string(),
            last_value,
        });
        Ok(id)
    }

    /// Return a slot to the free list.
    pub fn remove(&mut self, id: usize) -> Result<(), CommandError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or(CommandError::WatchpointNotFound { id })?;
        if slot.is_none() {
            return Err(CommandError::WatchpointNotFound { id });
        }
        *slot = None;
        Ok(())
    }

    /// Re-evaluate every live watchpoint in ascending id order. Every slot is
    /// evaluated regardless of earlier hits in the same pass; returns every
    /// slot whose value changed, in ascending id order.
    pub fn check(&mut self, regs: &dyn RegisterLookup, mem: &dyn MemoryRead) -> Vec<Change> {
        let mut changes = Vec::new();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            let new_value = match expr::evaluate(&slot.expression, regs, mem) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if new_value != slot.last_value {
                changes.push(Change {
                    id,
                    expression: slot.expression.clone(),
                    old_value: slot.last_value,
                    new_value,
                });
                slot.last_value = new_value;
            }
        }
        changes
    }

    /// List all live watchpoints by id and expression text.
    pub fn display(&self) -> Vec<(usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|s| (id, s.expression.as_str())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
