//! Block allocation: choosing a letter and laying out the numbered lockers.
//!
//! The allocator runs inside the caller's transaction, so a failure at any
//! point leaves neither the block nor any of its lockers behind.

use crate::error::{is_constraint_violation, ApiError};
use common::model::block::CreatedBlock;
use rusqlite::{params, Transaction};
use std::collections::HashSet;

/// Order in which numbers are handed out across the physical grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// Left to right, row after row.
    Horizontal,
    /// Top to bottom, column after column.
    Vertical,
}

impl From<bool> for Numbering {
    fn from(mode: bool) -> Self {
        if mode {
            Numbering::Horizontal
        } else {
            Numbering::Vertical
        }
    }
}

/// Physical shape of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    rows: u32,
    columns: u32,
}

impl GridLayout {
    /// `None` for an empty grid or one whose capacity does not fit in `u32`.
    pub fn new(rows: u32, columns: u32) -> Option<Self> {
        let capacity = rows.checked_mul(columns)?;
        (capacity > 0).then_some(Self { rows, columns })
    }

    pub fn capacity(&self) -> u32 {
        self.rows * self.columns
    }

    /// Locker numbers in physical order (row by row, left to right).
    pub fn numbers(&self, numbering: Numbering) -> Vec<u32> {
        let mut numbers = Vec::with_capacity(self.capacity() as usize);
        for row in 0..self.rows {
            for column in 0..self.columns {
                numbers.push(match numbering {
                    Numbering::Horizontal => row * self.columns + column + 1,
                    Numbering::Vertical => column * self.rows + row + 1,
                });
            }
        }
        numbers
    }
}

pub trait BlockAllocator {
    fn allocate(&self, tx: &Transaction<'_>, numbering: Numbering)
        -> Result<CreatedBlock, ApiError>;
}

/// Computes the numbering in process and inserts the block row plus one row
/// per locker.
pub struct GridAllocator {
    layout: GridLayout,
}

impl GridAllocator {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }
}

impl BlockAllocator for GridAllocator {
    fn allocate(
        &self,
        tx: &Transaction<'_>,
        numbering: Numbering,
    ) -> Result<CreatedBlock, ApiError> {
        let used: HashSet<String> = tx
            .prepare("SELECT letra FROM bloque")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let letter = next_letter(&used).ok_or_else(|| {
            ApiError::Conflict("No se pudo crear el bloque: no quedan letras disponibles".to_string())
        })?;

        tx.execute("INSERT INTO bloque (letra) VALUES (?1)", params![letter])
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    ApiError::Conflict(format!("No se pudo crear el bloque: la letra {} ya existe", letter))
                } else {
                    ApiError::Database(e)
                }
            })?;
        let block_id = tx.last_insert_rowid();

        let mut insert = tx.prepare("INSERT INTO casilleros (bloque, numero) VALUES (?1, ?2)")?;
        let mut locker_ids = Vec::with_capacity(self.layout.capacity() as usize);
        for number in self.layout.numbers(numbering) {
            insert.execute(params![block_id, number])?;
            locker_ids.push(tx.last_insert_rowid());
        }

        Ok(CreatedBlock {
            id: block_id,
            letter,
            locker_ids,
        })
    }
}

/// Lowest letter of `A..=Z` not yet taken.
fn next_letter(used: &HashSet<String>) -> Option<String> {
    ('A'..='Z')
        .map(|c| c.to_string())
        .find(|letter| !used.contains(letter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_numbers_follow_rows() {
        let layout = GridLayout::new(2, 3).unwrap();
        assert_eq!(layout.numbers(Numbering::Horizontal), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn vertical_numbers_follow_columns() {
        let layout = GridLayout::new(2, 3).unwrap();
        // Row 0: columns 0..3 hold 1, 3, 5; row 1 holds 2, 4, 6.
        assert_eq!(layout.numbers(Numbering::Vertical), vec![1, 3, 5, 2, 4, 6]);
    }

    #[test]
    fn both_orders_are_contiguous_and_unique() {
        let layout = GridLayout::new(4, 6).unwrap();
        for numbering in [Numbering::Horizontal, Numbering::Vertical] {
            let mut numbers = layout.numbers(numbering);
            numbers.sort_unstable();
            assert_eq!(numbers, (1..=24).collect::<Vec<_>>());
        }
    }

    #[test]
    fn empty_grids_are_rejected() {
        assert!(GridLayout::new(0, 5).is_none());
        assert!(GridLayout::new(3, 0).is_none());
        assert!(GridLayout::new(u32::MAX, 2).is_none());
    }

    #[test]
    fn next_letter_fills_gaps_first() {
        let used: HashSet<String> = ["A", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(next_letter(&used).as_deref(), Some("B"));

        let all: HashSet<String> = ('A'..='Z').map(|c| c.to_string()).collect();
        assert_eq!(next_letter(&all), None);
    }

    #[test]
    fn mode_flag_maps_to_numbering() {
        assert_eq!(Numbering::from(true), Numbering::Horizontal);
        assert_eq!(Numbering::from(false), Numbering::Vertical);
    }
}
